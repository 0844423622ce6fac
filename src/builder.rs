//! The tree builder: a forgiving state machine that turns lexical events into an [`Element`] tree.
use crate::event::{Event, EventSink, StartTag};
use crate::filter::{FilterConfig, TagFilter};
use crate::node::{Comment, Element, Node};
use crate::profile::TagProfile;
use crate::utils::trace_log;
use crate::Error;

/// What the caller should do after feeding events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Keep feeding.
    Continue,
    /// The filtered subtree is complete. Further events are ignored, call
    /// [`TreeBuilder::finish`].
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// A filter is configured and has not matched yet. Nothing is recorded.
    Seeking,
    /// Events are materialized into the tree.
    Recording,
    /// The filtered subtree has been closed.
    Done,
}

/// Where pending text goes when it is flushed, relative to the current element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextTarget {
    /// The current element's `text`: nothing has been appended to it yet.
    Text,
    /// The `tail` of the current element's last child element.
    Tail,
}

/// Builds a tree from a stream of [`Event`]s, recovering from the usual breakage of real-world
/// markup:
///
/// * Void elements like `<br>` never need an end tag, and a stray `</br>` is ignored.
/// * An end tag for the parent of the current element closes both, so one missing end tag is
///   repaired.
/// * End tags that match neither the current element nor its parent are dropped.
///
/// Input may arrive in arbitrary batches; text split across batches is joined before it is
/// attached.
///
/// ```
/// use htmlement::{Event, Status, StartTag, TagFilter, TreeBuilder};
///
/// let mut builder = TreeBuilder::with_filter(TagFilter::new("ul").require("class", "menu"));
/// let status = builder.feed([
///     Event::start("body"),
///     Event::from(StartTag::new("ul").attr("class", "menu")),
///     Event::start("li"),
///     Event::text("Coffee"),
///     Event::end("li"),
///     Event::end("ul"),
///     Event::start("p"),
/// ]);
/// assert_eq!(status, Status::Done);
///
/// let ul = builder.finish().unwrap();
/// assert_eq!(ul.name, "ul");
/// assert_eq!(ul.find("li").and_then(|li| li.text()), Some("Coffee"));
/// ```
#[derive(Debug)]
pub struct TreeBuilder {
    profile: TagProfile,
    filter: Option<TagFilter>,
    state: State,
    /// Synthetic container for documents without a single top-level element.
    root: Element,
    /// Open elements below `root`, outermost first.
    stack: Vec<Element>,
    /// Stack index of the filtered subtree root while it is open.
    subtree_depth: Option<usize>,
    subtree: Option<Element>,
    pending: Vec<String>,
    target: TextTarget,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        TreeBuilder::new()
    }
}

impl TreeBuilder {
    /// Build the whole document.
    pub fn new() -> Self {
        Self::build(None, TagProfile::default())
    }

    /// Build only the subtree of the first element matching `filter`.
    pub fn with_filter(filter: TagFilter) -> Self {
        Self::build(Some(filter), TagProfile::default())
    }

    /// Build according to a [`FilterConfig`].
    pub fn from_config(config: &FilterConfig) -> Self {
        Self::build(config.to_filter(), TagProfile::default())
    }

    /// Replace the tag profile. Call this before feeding any events.
    #[must_use]
    pub fn with_profile(self, profile: TagProfile) -> Self {
        Self::build(self.filter, profile)
    }

    fn build(filter: Option<TagFilter>, profile: TagProfile) -> Self {
        TreeBuilder {
            state: match filter {
                Some(_) => State::Seeking,
                None => State::Recording,
            },
            root: Element::new(profile.root_name()),
            profile,
            filter,
            stack: Vec::new(),
            subtree_depth: None,
            subtree: None,
            pending: Vec::new(),
            target: TextTarget::Text,
        }
    }

    /// The tag profile in use.
    pub fn profile(&self) -> &TagProfile {
        &self.profile
    }

    /// Whether a configured filter has matched. Always `true` without a filter.
    pub fn found(&self) -> bool {
        self.state != State::Seeking
    }

    /// The current status, see [`Status`].
    pub fn status(&self) -> Status {
        match self.state {
            State::Done => Status::Done,
            State::Seeking | State::Recording => Status::Continue,
        }
    }

    /// Names of the currently open elements, outermost first. The synthetic root is not
    /// included.
    pub fn open_elements(&self) -> impl Iterator<Item = &str> {
        self.stack.iter().map(|element| element.name.as_str())
    }

    /// Process a batch of events. Once [`Status::Done`] is returned, further events are
    /// ignored.
    pub fn feed<I: IntoIterator<Item = Event>>(&mut self, events: I) -> Status {
        for event in events {
            if self.state == State::Done {
                break;
            }
            event.dispatch(self);
        }

        self.status()
    }

    /// Close all open elements and return the tree.
    ///
    /// * With a filter, the matched element is returned, or [`Error::FilterNotSatisfied`] if
    ///   nothing matched.
    /// * Without a filter, a top-level `<html>` element is returned if there is one. Otherwise
    ///   the synthetic `html` root is returned, holding whatever top-level nodes were found.
    pub fn finish(mut self) -> Result<Element, Error> {
        self.flush();
        while !self.stack.is_empty() {
            self.pop();
        }

        if let Some(subtree) = self.subtree {
            trace_log!("finish: returning subtree <{}>", subtree.name);
            return Ok(subtree);
        }

        if let Some(filter) = self.filter {
            return Err(Error::FilterNotSatisfied {
                tag: filter.tag().to_owned(),
            });
        }

        let mut root = self.root;
        let document_element = root
            .children
            .iter()
            .position(|child| matches!(child, Node::Element(e) if e.name == root.name));

        if let Some(index) = document_element {
            if let Node::Element(element) = root.children.remove(index) {
                trace_log!("finish: returning document element");
                return Ok(element);
            }
        }

        trace_log!("finish: returning synthetic root with {} children", root.children.len());
        Ok(root)
    }

    fn current(&mut self) -> &mut Element {
        match self.stack.last_mut() {
            Some(element) => element,
            None => &mut self.root,
        }
    }

    /// Attach buffered text to the current text target.
    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }

        let joined = self.pending.concat();
        self.pending.clear();
        let text = match self.profile.whitespace().apply(joined) {
            Some(text) => text,
            None => return,
        };

        let target = self.target;
        let current = self.current();
        let slot = match target {
            TextTarget::Text => &mut current.text,
            TextTarget::Tail => match current.children.iter_mut().rev().find_map(Node::as_element_mut) {
                Some(child) => &mut child.tail,
                None => &mut current.text,
            },
        };

        match slot {
            Some(existing) => existing.push_str(&text),
            None => *slot = Some(text),
        }
    }

    /// Close the current element and attach it to its parent.
    fn pop(&mut self) {
        let element = match self.stack.pop() {
            Some(element) => element,
            None => return,
        };

        if self.subtree_depth == Some(self.stack.len()) {
            trace_log!("closed subtree root <{}>", element.name);
            self.subtree_depth = None;
            self.subtree = Some(element);
            self.state = State::Done;
            return;
        }

        self.current().children.push(element.into());
        self.target = TextTarget::Tail;
    }
}

impl EventSink for TreeBuilder {
    fn start_tag(&mut self, tag: StartTag) {
        if self.state == State::Done {
            return;
        }

        self.flush();

        let mut is_subtree_root = false;
        if self.state == State::Seeking {
            let matched = self.filter.as_ref().map_or(true, |filter| {
                filter.matches(&tag.name, tag.attributes.iter().map(|(k, v)| (k, v)))
            });
            if !matched {
                return;
            }

            trace_log!("filter matched <{}>", tag.name);
            self.state = State::Recording;
            is_subtree_root = true;
        }

        let is_void = tag.self_closing || self.profile.is_void(&tag.name);
        let element = Element::with_attributes(tag.name, tag.attributes);

        if is_void {
            if is_subtree_root {
                // the subtree is complete the moment it opens
                self.subtree = Some(element);
                self.state = State::Done;
                return;
            }

            self.current().children.push(element.into());
            self.target = TextTarget::Tail;
        } else {
            if is_subtree_root {
                self.subtree_depth = Some(self.stack.len());
            }

            self.stack.push(element);
            self.target = TextTarget::Text;
        }
    }

    fn end_tag(&mut self, name: &str) {
        if self.state != State::Recording {
            return;
        }

        self.flush();

        if self.profile.is_void(name) {
            return;
        }

        let depth = self.stack.len();
        if depth >= 1 && self.stack[depth - 1].name == name {
            self.pop();
        } else if depth >= 2 && self.stack[depth - 2].name == name {
            trace_log!(
                "</{}> closes unclosed <{}> as well",
                name,
                self.stack[depth - 1].name
            );
            self.pop();
            if self.state != State::Done {
                self.pop();
            }
        } else {
            trace_log!("ignoring stray </{}>", name);
        }
    }

    fn text(&mut self, text: &str) {
        if self.state == State::Recording && !text.is_empty() {
            self.pending.push(text.to_owned());
        }
    }

    fn comment(&mut self, text: &str) {
        if self.state == State::Done {
            return;
        }

        self.flush();

        if self.state != State::Recording {
            return;
        }

        // the text target is left alone, text after a comment continues the text before it
        if let Some(text) = self.profile.whitespace().apply(text.to_owned()) {
            self.current().children.push(Comment { text }.into());
        }
    }
}
