//! Tag tables and text policy handed to the [`crate::TreeBuilder`] at construction.
use std::collections::BTreeSet;

/// HTML elements that never have content.
///
/// See <https://html.spec.whatwg.org/#void-elements>, plus a few obsolete ones.
const HTML_VOIDS: &[&str] = &[
    "area", "base", "br", "col", "hr", "img", "input", "link", "meta", "param", "embed", "keygen",
    "source", "track", "basefont", "frame", "isindex",
];

/// SVG elements that are practically always written self-closing.
const SVG_VOIDS: &[&str] = &[
    "rect",
    "circle",
    "ellipse",
    "line",
    "polyline",
    "polygon",
    "path",
    "stop",
    "use",
    "image",
    "animatetransform",
];

/// What happens to whitespace around text and comment content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Whitespace {
    /// Strip leading and trailing whitespace. Text that is only whitespace is dropped.
    #[default]
    Trim,
    /// Keep text exactly as the tokenizer delivered it.
    Preserve,
}

impl Whitespace {
    pub(crate) fn apply(self, text: String) -> Option<String> {
        let text = match self {
            Whitespace::Trim if text.trim().len() != text.len() => text.trim().to_owned(),
            _ => text,
        };

        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// An immutable tag profile: which tags are void, how whitespace is treated, and the name of the
/// synthetic root.
///
/// ```
/// use htmlement::TagProfile;
///
/// let profile = TagProfile::html();
/// assert!(profile.is_void("br"));
/// assert!(profile.is_void("path"));
/// assert!(!TagProfile::html_only().is_void("path"));
/// assert!(TagProfile::empty().with_void("x-icon").is_void("x-icon"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagProfile {
    voids: BTreeSet<String>,
    whitespace: Whitespace,
    root_name: String,
}

impl Default for TagProfile {
    fn default() -> Self {
        TagProfile::html()
    }
}

impl TagProfile {
    /// HTML void elements plus common self-closing SVG elements.
    pub fn html() -> Self {
        Self::from_voids(HTML_VOIDS.iter().chain(SVG_VOIDS))
    }

    /// HTML void elements only, for documents where SVG shapes carry content.
    pub fn html_only() -> Self {
        Self::from_voids(HTML_VOIDS)
    }

    /// No void elements at all. Only self-closing syntax keeps an element off the stack.
    pub fn empty() -> Self {
        Self::from_voids(&[] as &[&str])
    }

    fn from_voids<'a>(voids: impl IntoIterator<Item = &'a &'a str>) -> Self {
        TagProfile {
            voids: voids.into_iter().map(|&name| name.to_owned()).collect(),
            whitespace: Whitespace::default(),
            root_name: "html".to_owned(),
        }
    }

    /// Derive a profile that also treats `name` as void.
    #[must_use]
    pub fn with_void(mut self, name: impl Into<String>) -> Self {
        self.voids.insert(name.into());
        self
    }

    /// Derive a profile that does not treat `name` as void.
    #[must_use]
    pub fn without_void(mut self, name: &str) -> Self {
        self.voids.remove(name);
        self
    }

    /// Derive a profile with another whitespace policy.
    #[must_use]
    pub fn with_whitespace(mut self, whitespace: Whitespace) -> Self {
        self.whitespace = whitespace;
        self
    }

    /// Whether `name` is a void element in this profile.
    pub fn is_void(&self, name: &str) -> bool {
        self.voids.contains(name)
    }

    /// The whitespace policy.
    pub fn whitespace(&self) -> Whitespace {
        self.whitespace
    }

    /// The tag name of the synthetic root that wraps the document.
    pub fn root_name(&self) -> &str {
        &self.root_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim() {
        assert_eq!(Whitespace::Trim.apply("  a b \n".into()), Some("a b".into()));
        assert_eq!(Whitespace::Trim.apply(" \n\t".into()), None);
        assert_eq!(Whitespace::Trim.apply("a".into()), Some("a".into()));
    }

    #[test]
    fn test_preserve() {
        assert_eq!(Whitespace::Preserve.apply(" a ".into()), Some(" a ".into()));
        assert_eq!(Whitespace::Preserve.apply("\n".into()), Some("\n".into()));
        assert_eq!(Whitespace::Preserve.apply(String::new()), None);
    }

    #[test]
    fn test_without_void() {
        let profile = TagProfile::html().without_void("image");
        assert!(!profile.is_void("image"));
        assert!(profile.is_void("img"));
    }
}
