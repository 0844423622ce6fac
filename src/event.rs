//! The lexical events a tokenizer hands to the tree builder.
//!
//! Any tokenizer can drive a [`crate::TreeBuilder`]: either call the four [`EventSink`] methods
//! directly, or collect [`Event`] values and pass batches to [`crate::TreeBuilder::feed`]. The
//! tokenizer is responsible for decoding character references before text reaches the builder.

/// A HTML start tag, such as `<p>` or `<img src="a.png" />`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StartTag {
    /// The start tag's name, such as `"p"` or `"a"`.
    pub name: String,

    /// Attributes in source order. Duplicates are allowed here, the builder keeps the first one.
    pub attributes: Vec<(String, String)>,

    /// Whether the tag was written as `<tag/>`. Self-closing elements never receive children.
    pub self_closing: bool,
}

impl StartTag {
    /// A start tag without attributes.
    pub fn new(name: impl Into<String>) -> Self {
        StartTag {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Append an attribute.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Mark the tag as self-closing.
    #[must_use]
    pub fn self_closing(mut self) -> Self {
        self.self_closing = true;
        self
    }
}

/// One lexical event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A start tag.
    StartTag(StartTag),
    /// An end tag with its name, such as `"p"` for `</p>`.
    EndTag(String),
    /// Character data.
    Text(String),
    /// The content of a comment.
    Comment(String),
}

impl Event {
    /// A start tag event without attributes.
    pub fn start(name: impl Into<String>) -> Self {
        Event::StartTag(StartTag::new(name))
    }

    /// An end tag event.
    pub fn end(name: impl Into<String>) -> Self {
        Event::EndTag(name.into())
    }

    /// A text event.
    pub fn text(text: impl Into<String>) -> Self {
        Event::Text(text.into())
    }

    /// A comment event.
    pub fn comment(text: impl Into<String>) -> Self {
        Event::Comment(text.into())
    }

    /// Hand this event to the matching [`EventSink`] method.
    pub fn dispatch<S: EventSink + ?Sized>(self, sink: &mut S) {
        match self {
            Event::StartTag(tag) => sink.start_tag(tag),
            Event::EndTag(name) => sink.end_tag(&name),
            Event::Text(text) => sink.text(&text),
            Event::Comment(text) => sink.comment(&text),
        }
    }
}

impl From<StartTag> for Event {
    fn from(tag: StartTag) -> Self {
        Event::StartTag(tag)
    }
}

/// A consumer of lexical events, called by a tokenizer in document order.
pub trait EventSink {
    /// A start tag was read.
    fn start_tag(&mut self, tag: StartTag);

    /// An end tag was read.
    fn end_tag(&mut self, name: &str);

    /// Character data was read. May be called several times in a row for adjacent text.
    fn text(&mut self, text: &str);

    /// A comment was read.
    fn comment(&mut self, text: &str);
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn start_tag(&mut self, tag: StartTag) {
        (**self).start_tag(tag)
    }

    fn end_tag(&mut self, name: &str) {
        (**self).end_tag(name)
    }

    fn text(&mut self, text: &str) {
        (**self).text(text)
    }

    fn comment(&mut self, text: &str) {
        (**self).comment(text)
    }
}

/// Collecting events, e.g. to replay them into several builders.
impl EventSink for Vec<Event> {
    fn start_tag(&mut self, tag: StartTag) {
        self.push(Event::StartTag(tag));
    }

    fn end_tag(&mut self, name: &str) {
        self.push(Event::end(name));
    }

    fn text(&mut self, text: &str) {
        self.push(Event::text(text));
    }

    fn comment(&mut self, text: &str) {
        self.push(Event::comment(text));
    }
}
