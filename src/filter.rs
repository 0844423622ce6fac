//! Selecting the subtree of interest.
use std::collections::{BTreeMap, BTreeSet};

/// The expected value of a required attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrMatch {
    /// The attribute must be present, its value does not matter.
    Any,
    /// The attribute must be present with exactly this value.
    Exact(String),
}

impl AttrMatch {
    fn accepts(&self, value: &str) -> bool {
        match self {
            AttrMatch::Any => true,
            AttrMatch::Exact(expected) => expected == value,
        }
    }
}

/// A predicate over a start tag that picks the root of the subtree to build.
///
/// Names are compared exactly. Tokenizers such as html5gum lowercase tag and attribute names, so
/// configure the filter in lowercase.
///
/// ```
/// use htmlement::TagFilter;
///
/// let filter = TagFilter::new("div").require("test", "yes").forbid("src");
///
/// assert!(filter.matches("div", [("test", "yes")]));
/// assert!(!filter.matches("div", [("src", "x.png"), ("test", "yes")]));
/// assert!(!filter.matches("span", [("test", "yes")]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFilter {
    tag: String,
    required: BTreeMap<String, AttrMatch>,
    forbidden: BTreeSet<String>,
}

impl TagFilter {
    /// Match the first element with this tag name.
    pub fn new(tag: impl Into<String>) -> Self {
        TagFilter {
            tag: tag.into(),
            required: BTreeMap::new(),
            forbidden: BTreeSet::new(),
        }
    }

    /// Additionally require `name="value"`.
    #[must_use]
    pub fn require(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.forbidden.remove(&name);
        self.required.insert(name, AttrMatch::Exact(value.into()));
        self
    }

    /// Additionally require the attribute `name` with any value.
    #[must_use]
    pub fn require_any(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.forbidden.remove(&name);
        self.required.insert(name, AttrMatch::Any);
        self
    }

    /// Reject elements that carry the attribute `name`.
    #[must_use]
    pub fn forbid(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.required.remove(&name);
        self.forbidden.insert(name);
        self
    }

    /// The tag name this filter looks for.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The required attributes.
    pub fn required(&self) -> &BTreeMap<String, AttrMatch> {
        &self.required
    }

    /// The forbidden attribute names.
    pub fn forbidden(&self) -> &BTreeSet<String> {
        &self.forbidden
    }

    /// Whether a start tag with these attributes is the subtree root.
    ///
    /// The attributes are scanned once. A forbidden attribute fails the match immediately, and
    /// every required attribute must be satisfied by the end of the scan. Like
    /// [`crate::Element::with_attributes`], only the first occurrence of a name counts.
    pub fn matches<K, V>(&self, tag: &str, attributes: impl IntoIterator<Item = (K, V)>) -> bool
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        if tag != self.tag {
            return false;
        }

        if self.required.is_empty() && self.forbidden.is_empty() {
            return true;
        }

        let mut satisfied = 0;
        let mut seen = BTreeSet::new();
        for (name, value) in attributes {
            let name = name.as_ref();
            if !seen.insert(name.to_owned()) {
                continue;
            }

            if self.forbidden.contains(name) {
                return false;
            }

            if let Some(expected) = self.required.get(name) {
                if expected.accepts(value.as_ref()) {
                    satisfied += 1;
                }
            }
        }

        satisfied == self.required.len()
    }
}

/// How a configured attribute constrains the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum AttrConstraint {
    /// `true` requires the attribute with any value, `false` forbids it.
    Flag(bool),
    /// The attribute must have exactly this value.
    Value(String),
}

/// Construction parameters for a parse request.
///
/// This is the configuration surface `{tag, attrs}`: `tag` absent means whole-document mode,
/// `attrs` maps attribute names to an [`AttrConstraint`].
///
/// With the `serde` feature this can be deserialized, e.g. from
/// `{"tag": "div", "attrs": {"class": "menu", "id": true, "hidden": false}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct FilterConfig {
    /// The subtree root's tag name.
    #[cfg_attr(feature = "serde", serde(default))]
    pub tag: Option<String>,

    /// Attribute constraints on the subtree root.
    #[cfg_attr(feature = "serde", serde(default))]
    pub attrs: BTreeMap<String, AttrConstraint>,
}

impl FilterConfig {
    /// Build the filter, or `None` in whole-document mode.
    ///
    /// Attribute constraints without a tag are ignored.
    pub fn to_filter(&self) -> Option<TagFilter> {
        let tag = self.tag.as_ref()?;
        let mut filter = TagFilter::new(tag.clone());
        for (name, constraint) in &self.attrs {
            filter = match constraint {
                AttrConstraint::Flag(true) => filter.require_any(name.clone()),
                AttrConstraint::Flag(false) => filter.forbid(name.clone()),
                AttrConstraint::Value(value) => filter.require(name.clone(), value.clone()),
            };
        }
        Some(filter)
    }
}
