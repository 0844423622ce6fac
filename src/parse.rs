//! One-call entry points that tokenize with html5gum and return a finished tree.
use std::fmt;
#[cfg(feature = "encoding")]
use std::fs::File;
#[cfg(feature = "encoding")]
use std::io::Read;
#[cfg(feature = "encoding")]
use std::path::Path;

#[cfg(feature = "encoding")]
use crate::encoding::{self, Decoder, Encoding};
use crate::tokenizer::feed_str;
use crate::{Element, Error, FilterConfig, Status, TagFilter, TagProfile, TreeBuilder};

/// The length of the longest named character reference, `&CounterClockwiseContourIntegral;`.
const MAX_CHAR_REF: usize = 32;

/// Where the complete part of `buffer` ends: everything after it is markup that the next chunk
/// may still finish, an open tag, an open comment or a character reference.
fn complete_prefix(buffer: &str) -> usize {
    let mut end = buffer.len();

    if let Some(open) = buffer.rfind('<') {
        if !tag_is_closed(&buffer[open + 1..]) {
            end = open;
        }
    }

    if let Some(open) = buffer.rfind("<!--") {
        if !buffer[open + 4..].contains("-->") {
            end = end.min(open);
        }
    }

    if end == buffer.len() {
        if let Some(amp) = buffer.rfind('&') {
            let reference = &buffer[amp + 1..];
            if reference.len() < MAX_CHAR_REF && reference.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'#') {
                end = amp;
            }
        }
    }

    end
}

/// Whether the tag starting right before `rest` has its closing `>`. A `>` inside a quoted
/// attribute value does not count.
fn tag_is_closed(rest: &str) -> bool {
    let mut quote = None;
    let mut after_equals = false;

    for b in rest.bytes() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'>' => return true,
                b'"' | b'\'' if after_equals => quote = Some(b),
                b'=' => after_equals = true,
                b if b.is_ascii_whitespace() => {}
                _ => after_equals = false,
            },
        }
    }

    false
}

/// An incremental parser over arbitrary chunks of markup.
///
/// Chunks may split a tag, a comment or a character reference anywhere. The incomplete end of
/// a chunk is held back until a later chunk completes it, or until [`HtmlParser::close`].
///
/// ```
/// use htmlement::{HtmlParser, Status, TagFilter};
///
/// let mut parser = HtmlParser::with_filter(TagFilter::new("ul").require("class", "menu"));
/// for chunk in ["<body><ul cla", "ss=menu><li>Coffee</", "li><li>Tea</li></ul>", "<p>unused"] {
///     if parser.feed_str(chunk)? == Status::Done {
///         break;
///     }
/// }
///
/// let menu = parser.close()?;
/// let items: Vec<_> = menu.iter_tag("li").filter_map(|li| li.text()).collect();
/// assert_eq!(items, ["Coffee", "Tea"]);
/// # Ok::<(), htmlement::Error>(())
/// ```
#[derive(Default)]
pub struct HtmlParser {
    builder: TreeBuilder,
    /// Markup not yet handed to the tokenizer.
    buffer: String,
    /// Set by the first byte chunk.
    #[cfg(feature = "encoding")]
    decoder: Option<Decoder>,
}

impl fmt::Debug for HtmlParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("HtmlParser");
        debug.field("builder", &self.builder).field("buffer", &self.buffer);
        #[cfg(feature = "encoding")]
        debug.field("encoding", &self.decoder.as_ref().map(|d| d.encoding().name()));
        debug.finish()
    }
}

impl HtmlParser {
    /// Parse the whole document.
    pub fn new() -> Self {
        HtmlParser::from_builder(TreeBuilder::new())
    }

    /// Parse only the first subtree matching `filter`.
    pub fn with_filter(filter: TagFilter) -> Self {
        HtmlParser::from_builder(TreeBuilder::with_filter(filter))
    }

    /// Wrap a configured builder.
    pub fn from_builder(builder: TreeBuilder) -> Self {
        HtmlParser {
            builder,
            buffer: String::new(),
            #[cfg(feature = "encoding")]
            decoder: None,
        }
    }

    /// Build a chunk of markup into the tree. Does nothing once the filtered subtree is
    /// complete.
    pub fn feed_str(&mut self, html: &str) -> Result<Status, Error> {
        if self.is_done() {
            return Ok(Status::Done);
        }

        self.buffer.push_str(html);
        let end = complete_prefix(&self.buffer);
        if end == 0 {
            return Ok(self.builder.status());
        }

        let rest = self.buffer.split_off(end);
        let ready = std::mem::replace(&mut self.buffer, rest);
        let status = feed_str(&mut self.builder, &ready)?;
        if status == Status::Done {
            self.buffer.clear();
        }
        Ok(status)
    }

    /// Decode a chunk of bytes and feed it.
    ///
    /// The encoding is picked once, from the first chunk, see [`encoding::resolve`]: `encoding`
    /// if given, else a charset declared in the first chunk, else ISO-8859-1. Later values of
    /// `encoding` are ignored. Multi-byte sequences may be split across chunks.
    #[cfg(feature = "encoding")]
    pub fn feed_bytes(&mut self, bytes: &[u8], encoding: Option<&'static Encoding>) -> Result<Status, Error> {
        if self.is_done() {
            return Ok(Status::Done);
        }

        let decoder = self
            .decoder
            .get_or_insert_with(|| encoding::decoder_for(bytes, encoding));
        let text = encoding::decode_chunk(decoder, bytes, false);
        self.feed_str(&text)
    }

    /// Whether the filtered subtree is complete.
    pub fn is_done(&self) -> bool {
        self.builder.status() == Status::Done
    }

    /// Build whatever input is left and return the tree, see [`TreeBuilder::finish`].
    ///
    /// Markup still incomplete at this point is reported as [`Error::MalformedMarkup`].
    pub fn close(mut self) -> Result<Element, Error> {
        #[cfg(feature = "encoding")]
        if let Some(mut decoder) = self.decoder.take() {
            let text = encoding::decode_chunk(&mut decoder, b"", true);
            self.buffer.push_str(&text);
        }

        if !self.is_done() && !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            feed_str(&mut self.builder, &rest)?;
        }

        self.builder.finish()
    }
}

/// Parse a complete document.
///
/// ```
/// let html = htmlement::parse_str("<html><head><title>GitHub</title></head></html>", None)?;
/// assert_eq!(html.find("head/title").and_then(|t| t.text()), Some("GitHub"));
/// # Ok::<(), htmlement::Error>(())
/// ```
pub fn parse_str(html: &str, filter: Option<TagFilter>) -> Result<Element, Error> {
    let mut parser = parser_for(filter);
    parser.feed_str(html)?;
    parser.close()
}

/// Parse a document given as a list of strings, which are concatenated.
pub fn parse_fragments<I, S>(fragments: I, filter: Option<TagFilter>) -> Result<Element, Error>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let html: String = fragments.into_iter().map(|s| s.as_ref().to_owned()).collect();
    parse_str(&html, filter)
}

/// Parse a document as configured by a [`FilterConfig`] and a [`TagProfile`].
pub fn parse_with(html: &str, config: &FilterConfig, profile: TagProfile) -> Result<Element, Error> {
    let mut parser = HtmlParser::from_builder(TreeBuilder::from_config(config).with_profile(profile));
    parser.feed_str(html)?;
    parser.close()
}

/// Parse raw bytes. The encoding is `encoding` if given, else the document's declared charset,
/// else ISO-8859-1.
#[cfg(feature = "encoding")]
pub fn parse_bytes(bytes: &[u8], encoding: Option<&'static Encoding>, filter: Option<TagFilter>) -> Result<Element, Error> {
    let mut parser = parser_for(filter);
    parser.feed_bytes(bytes, encoding)?;
    parser.close()
}

/// Read and parse a whole document from `reader`.
#[cfg(feature = "encoding")]
pub fn parse_reader<R: Read>(
    mut reader: R,
    encoding: Option<&'static Encoding>,
    filter: Option<TagFilter>,
) -> Result<Element, Error> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    parse_bytes(&bytes, encoding, filter)
}

/// Read and parse a document from a file.
#[cfg(feature = "encoding")]
pub fn parse_file(
    path: impl AsRef<Path>,
    encoding: Option<&'static Encoding>,
    filter: Option<TagFilter>,
) -> Result<Element, Error> {
    parse_reader(File::open(path)?, encoding, filter)
}

fn parser_for(filter: Option<TagFilter>) -> HtmlParser {
    match filter {
        Some(filter) => HtmlParser::with_filter(filter),
        None => HtmlParser::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MENU: &str = r#"
    <html>
      <head>
        <title>Coffee shop</title>
      </head>
      <body>
        <ul class="menu">
          <li>Coffee</li>
          <li>Tea</li>
          <li>Milk</li>
        </ul>
        <ul class="extras">
          <li>Sugar</li>
          <li>Cream</li>
        </ul>
      </body>
    </html>
    "#;

    fn items(element: &Element) -> Vec<&str> {
        element.iter_tag("li").filter_map(Element::text).collect()
    }

    #[test]
    fn test_whole_document() {
        let html = parse_str(MENU, None).unwrap();
        assert_eq!(html.name, "html");
        assert_eq!(html.find("head/title").and_then(Element::text), Some("Coffee shop"));
        assert_eq!(items(&html), ["Coffee", "Tea", "Milk", "Sugar", "Cream"]);
    }

    #[test]
    fn test_filtered() {
        let menu = parse_str(MENU, Some(TagFilter::new("ul").require("class", "menu"))).unwrap();
        assert_eq!(items(&menu), ["Coffee", "Tea", "Milk"]);

        let extras = parse_str(MENU, Some(TagFilter::new("ul").forbid("id").require("class", "extras"))).unwrap();
        assert_eq!(items(&extras), ["Sugar", "Cream"]);
    }

    #[test]
    fn test_filter_not_satisfied() {
        assert!(matches!(
            parse_str(MENU, Some(TagFilter::new("ol"))),
            Err(Error::FilterNotSatisfied { .. })
        ));
    }

    #[test]
    fn test_fragments() {
        let html = parse_fragments(["<div><a href=x>li", "nk</a></div>"], None).unwrap();
        assert_eq!(html.find("div/a").and_then(Element::text), Some("link"));
    }

    #[test]
    fn test_parse_with_config() {
        let mut config = FilterConfig {
            tag: Some("svg".into()),
            ..Default::default()
        };
        config.attrs.insert("id".into(), crate::AttrConstraint::Flag(true));

        let html = r#"<svg><path d=1></path></svg><svg id=logo><path d="M0"><title>t</title></path></svg>"#;
        let svg = parse_with(html, &config, TagProfile::html_only()).unwrap();
        assert_eq!(svg.get("id"), Some("logo"));
        assert_eq!(svg.find("path/title").and_then(Element::text), Some("t"));
    }

    #[test]
    fn test_chunks_carry_state() {
        let mut parser = HtmlParser::new();
        parser.feed_str("<div><p>one").unwrap();
        parser.feed_str(" two</p>").unwrap();
        parser.feed_str("</div>").unwrap();
        assert_eq!(parser.close().unwrap().find("div/p").and_then(Element::text), Some("one two"));
    }

    #[test]
    fn test_complete_prefix() {
        assert_eq!(complete_prefix("<p>text"), 7);
        assert_eq!(complete_prefix("<p>text</p"), 7);
        assert_eq!(complete_prefix("<p><div cla"), 3);
        assert_eq!(complete_prefix(r#"<a title="x>y"#), 0);
        assert_eq!(complete_prefix(r#"<a title="x>y">"#), 15);
        assert_eq!(complete_prefix("<p>a<!-- b > c"), 4);
        assert_eq!(complete_prefix("<p>caf&ea"), 6);
        assert_eq!(complete_prefix("<p>fish &amp; chips"), 19);
        assert_eq!(complete_prefix("<p>a &"), 5);
    }

    #[test]
    fn test_chunk_splits_tag() {
        let mut parser = HtmlParser::new();
        assert_eq!(parser.feed_str("<div cla").unwrap(), Status::Continue);
        parser.feed_str("ss=x>text</d").unwrap();
        parser.feed_str("iv>").unwrap();
        let div = parser.close().unwrap();
        let div = div.find("div").unwrap();
        assert_eq!(div.get("class"), Some("x"));
        assert_eq!(div.text(), Some("text"));
    }

    #[test]
    fn test_chunk_splits_quoted_attribute() {
        let mut parser = HtmlParser::new();
        parser.feed_str(r#"<a title="x>"#).unwrap();
        parser.feed_str(r#"y">z</a>"#).unwrap();
        let a = parser.close().unwrap();
        assert_eq!(a.find("a").and_then(|a| a.get("title")), Some("x>y"));
    }

    #[test]
    fn test_chunk_splits_char_ref() {
        let mut parser = HtmlParser::new();
        parser.feed_str("<p>caf&ea").unwrap();
        parser.feed_str("cute;</p>").unwrap();
        assert_eq!(parser.close().unwrap().find("p").and_then(Element::text), Some("caf\u{e9}"));
    }

    #[test]
    fn test_chunk_splits_comment() {
        let mut parser = HtmlParser::new();
        parser.feed_str("<p>a<!-- x > ").unwrap();
        parser.feed_str("y -->b</p>").unwrap();
        let root = parser.close().unwrap();
        let p = root.find("p").unwrap();
        assert_eq!(p.text(), Some("ab"));
        assert_eq!(p.children[0].as_comment().unwrap().text, "x > y");
    }

    #[test]
    fn test_close_with_truncated_tag() {
        let mut parser = HtmlParser::new();
        parser.feed_str("<p>ok</p><div cla").unwrap();
        match parser.close() {
            Err(Error::MalformedMarkup { reason }) => assert_eq!(reason, "eof-in-tag"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_every_split_point() {
        let html = r#"<ul class="menu"><li>caf&eacute;</li><!-- x --><li title='a>b'>Tea</li></ul>"#;
        let whole = parse_str(html, None).unwrap();
        for split in 0..=html.len() {
            let mut parser = HtmlParser::new();
            parser.feed_str(&html[..split]).unwrap();
            parser.feed_str(&html[split..]).unwrap();
            assert_eq!(parser.close().unwrap(), whole, "split at {}", split);
        }
    }

    #[cfg(feature = "encoding")]
    #[test]
    fn test_feed_bytes_keeps_encoding() {
        let mut parser = HtmlParser::new();
        parser
            .feed_bytes(b"<head><meta charset=utf-8></head><p>caf\xc3\xa9 ", None)
            .unwrap();
        parser.feed_bytes(b"cr\xc3", None).unwrap();
        parser.feed_bytes(b"\xa8me</p>", None).unwrap();
        let html = parser.close().unwrap();
        assert_eq!(html.find("p").and_then(Element::text), Some("caf\u{e9} cr\u{e8}me"));
    }

    #[cfg(feature = "encoding")]
    #[test]
    fn test_parse_bytes() {
        let bytes = b"<html><head><meta charset=utf-8></head><body><p>caf\xc3\xa9</p></body></html>";
        let html = parse_bytes(bytes, None, None).unwrap();
        assert_eq!(html.find("body/p").and_then(Element::text), Some("caf\u{e9}"));

        let latin1 = b"<p>caf\xe9</p>";
        let root = parse_bytes(latin1, None, None).unwrap();
        assert_eq!(root.find("p").and_then(Element::text), Some("caf\u{e9}"));
    }

    #[cfg(feature = "encoding")]
    #[test]
    fn test_parse_reader() {
        let html = parse_reader(&b"<b>x</b>"[..], None, Some(TagFilter::new("b"))).unwrap();
        assert_eq!(html.text(), Some("x"));
    }

    #[cfg(feature = "encoding")]
    #[test]
    fn test_parse_missing_file() {
        assert!(matches!(
            parse_file("/nonexistent/htmlement/test.html", None, None),
            Err(Error::Io(_))
        ));
    }
}
