//! The document model produced by [`crate::TreeBuilder`].
//!
//! The model follows the text/tail convention of ElementTree:
//!
//! ```html
//! <div>
//!   TEXT           <!-- the div's `text` -->
//!   <span>inner</span>
//!   TAIL           <!-- the span's `tail` -->
//! </div>
//! ```
//!
//! Every element exclusively owns its children. There are no parent pointers, navigation always
//! walks downwards from the element you hold.
use std::collections::{BTreeMap, HashSet};

/// An HTML element such as `<p class="x">`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    /// The tag name, such as `"p"` or `"a"`.
    pub name: String,

    /// The element's attributes. On duplicate attributes the first occurrence wins.
    pub attributes: BTreeMap<String, String>,

    /// Text before the first child, or all of the content if there are no children.
    pub text: Option<String>,

    /// Text after this element's end and before the next sibling or the parent's end.
    pub tail: Option<String>,

    /// Child elements and comments in document order.
    pub children: Vec<Node>,
}

/// An HTML comment, `<!-- text -->`.
///
/// Comments carry no text of their own: text around a comment belongs to the enclosing element
/// or to the preceding sibling element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Comment {
    /// The comment's content.
    pub text: String,
}

/// A child of an [`Element`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A nested element.
    Element(Element),
    /// A comment.
    Comment(Comment),
}

impl Node {
    /// Return the element if this node is one.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Comment(_) => None,
        }
    }

    /// Return the comment if this node is one.
    pub fn as_comment(&self) -> Option<&Comment> {
        match self {
            Node::Element(_) => None,
            Node::Comment(comment) => Some(comment),
        }
    }

    pub(crate) fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Comment(_) => None,
        }
    }

    /// The node's trailing text. Always `None` for comments.
    pub fn tail(&self) -> Option<&str> {
        self.as_element().and_then(|element| element.tail.as_deref())
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl From<Comment> for Node {
    fn from(comment: Comment) -> Self {
        Node::Comment(comment)
    }
}

impl Element {
    /// Create an element without attributes or content.
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Create an element from a tag name and an attribute list.
    ///
    /// Duplicate attribute names keep the first value.
    pub fn with_attributes<K, V>(name: impl Into<String>, attributes: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (key, value) in attributes {
            map.entry(key.into()).or_insert_with(|| value.into());
        }

        Element {
            name: name.into(),
            attributes: map,
            ..Default::default()
        }
    }

    /// Look up an attribute value.
    pub fn get(&self, attribute: &str) -> Option<&str> {
        self.attributes.get(attribute).map(String::as_str)
    }

    /// The element's leading text.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Iterate over the element children, skipping comments.
    pub fn elements(&self) -> impl DoubleEndedIterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Iterate over this element and all of its descendant elements in document order.
    pub fn iter(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Iterate over this element and all descendants with the given tag name.
    pub fn iter_tag<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.iter().filter(move |element| element.name == name)
    }

    /// Iterate over all text inside this element in document order, including the tails of
    /// descendants but not this element's own tail. Comment content is skipped.
    pub fn itertext(&self) -> impl Iterator<Item = &str> {
        let mut out = Vec::new();
        collect_text(self, &mut out);
        out.into_iter()
    }

    /// Find the first element matching `path`. See [`Element::find_all`] for the path syntax.
    pub fn find(&self, path: &str) -> Option<&Element> {
        self.find_all(path).into_iter().next()
    }

    /// Find all elements matching a small subset of ElementTree's path language.
    ///
    /// * `tag` selects child elements by name, `*` selects all child elements.
    /// * `.` selects the current element.
    /// * `a/b` selects `b` children of `a` children.
    /// * `//` selects all descendants, so `.//a` finds every `a` below this element.
    /// * `[@attr]` and `[@attr='value']` filter a step by attribute.
    ///
    /// ```
    /// use htmlement::{Element, Node};
    ///
    /// let mut body = Element::new("body");
    /// body.children.push(Node::Element(Element::with_attributes("a", [("href", "/x")])));
    /// let mut html = Element::new("html");
    /// html.children.push(Node::Element(body));
    ///
    /// assert_eq!(html.find("body/a").and_then(|a| a.get("href")), Some("/x"));
    /// assert_eq!(html.find_all(".//a[@href='/x']").len(), 1);
    /// assert!(html.find("a").is_none());
    /// ```
    pub fn find_all(&self, path: &str) -> Vec<&Element> {
        let mut current = vec![self];
        let mut descend = false;

        for step in path.split('/') {
            if step.is_empty() {
                // the empty step between the slashes of `//`
                descend = true;
                continue;
            }

            let step = Step::parse(step);
            let mut next = Vec::new();
            for element in current {
                if matches!(step.name, StepName::Current) {
                    if descend {
                        next.extend(element.iter());
                    } else {
                        next.push(element);
                    }
                    continue;
                }

                if descend {
                    next.extend(element.iter().skip(1).filter(|e| step.matches(e)));
                } else {
                    next.extend(element.elements().filter(|e| step.matches(e)));
                }
            }

            dedup_by_address(&mut next);
            current = next;
            descend = false;
        }

        current
    }
}

fn collect_text<'a>(element: &'a Element, out: &mut Vec<&'a str>) {
    if let Some(ref text) = element.text {
        out.push(text);
    }

    for child in element.elements() {
        collect_text(child, out);
        if let Some(ref tail) = child.tail {
            out.push(tail);
        }
    }
}

fn dedup_by_address(elements: &mut Vec<&Element>) {
    let mut seen = HashSet::with_capacity(elements.len());
    elements.retain(|element| seen.insert(*element as *const Element));
}

/// Pre-order iterator over an element and its descendant elements, see [`Element::iter`].
#[derive(Debug)]
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let element = self.stack.pop()?;
        self.stack.extend(element.elements().rev());
        Some(element)
    }
}

enum StepName<'a> {
    Current,
    Any,
    Tag(&'a str),
}

struct Step<'a> {
    name: StepName<'a>,
    attribute: Option<(&'a str, Option<&'a str>)>,
}

impl<'a> Step<'a> {
    fn parse(step: &'a str) -> Self {
        let (name, predicate) = match step.find('[') {
            Some(i) => (&step[..i], Some(&step[i..])),
            None => (step, None),
        };

        let name = match name {
            "." => StepName::Current,
            "*" | "" => StepName::Any,
            tag => StepName::Tag(tag),
        };

        let attribute = predicate
            .and_then(|p| p.strip_prefix("[@"))
            .and_then(|p| p.strip_suffix(']'))
            .map(|p| match p.split_once('=') {
                Some((key, value)) => (key, Some(value.trim_matches(|c| c == '\'' || c == '"'))),
                None => (p, None),
            });

        Step { name, attribute }
    }

    fn matches(&self, element: &Element) -> bool {
        let name_ok = match self.name {
            StepName::Current | StepName::Any => true,
            StepName::Tag(tag) => element.name == tag,
        };

        name_ok
            && match self.attribute {
                None => true,
                Some((key, None)) => element.attributes.contains_key(key),
                Some((key, Some(value))) => element.get(key) == Some(value),
            }
    }
}
