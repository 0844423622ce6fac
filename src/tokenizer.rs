//! Driving an [`EventSink`] with the [html5gum](https://docs.rs/html5gum) tokenizer.
use html5gum::{Error as TokenizerError, Token, Tokenizer};

use crate::event::{EventSink, StartTag};
use crate::utils::trace_log;
use crate::{Error, Status, TreeBuilder};

fn lossy(s: &[u8]) -> String {
    String::from_utf8_lossy(s).into_owned()
}

/// Whether the tokenizer ran out of input in the middle of some markup. Every other tokenizer
/// error is recovered from by the tokenizer itself.
fn is_truncated_markup(error: &TokenizerError) -> bool {
    matches!(
        error,
        TokenizerError::EofInTag
            | TokenizerError::EofBeforeTagName
            | TokenizerError::EofInComment
            | TokenizerError::EofInDoctype
            | TokenizerError::EofInCdata
            | TokenizerError::EofInScriptHtmlCommentLikeText
    )
}

/// Forward one html5gum token to `sink`.
///
/// Doctypes are dropped. Truncated markup is reported as [`Error::MalformedMarkup`], other
/// tokenizer errors are ignored.
pub fn dispatch_token<S: EventSink + ?Sized>(token: Token, sink: &mut S) -> Result<(), Error> {
    match token {
        Token::StartTag(tag) => sink.start_tag(StartTag {
            name: lossy(&tag.name),
            attributes: tag
                .attributes
                .iter()
                .map(|(name, value)| (lossy(name), lossy(value)))
                .collect(),
            self_closing: tag.self_closing,
        }),
        Token::EndTag(tag) => sink.end_tag(&lossy(&tag.name)),
        Token::String(text) => sink.text(&lossy(&text)),
        Token::Comment(text) => sink.comment(&lossy(&text)),
        Token::Doctype(_) => {}
        Token::Error(error) => {
            trace_log!("tokenizer error: {}", error);
            if is_truncated_markup(&error) {
                return Err(Error::malformed(error.to_string()));
            }
        }
    }

    Ok(())
}

/// Tokenize `html` and feed it to `builder`, stopping as soon as the builder is done.
///
/// `html` must be complete markup: a tag cut off at the end is reported as
/// [`Error::MalformedMarkup`].
pub fn feed_str(builder: &mut TreeBuilder, html: &str) -> Result<Status, Error> {
    if builder.status() == Status::Done {
        return Ok(Status::Done);
    }

    for token in Tokenizer::new(html).infallible() {
        dispatch_token(token, &mut *builder)?;
        if builder.status() == Status::Done {
            trace_log!("builder done, not tokenizing the rest");
            break;
        }
    }

    Ok(builder.status())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TagFilter;

    #[test]
    fn test_feed_str() {
        let mut builder = TreeBuilder::new();
        let status = feed_str(&mut builder, "<p class=a CLASS=b>x &amp; y<br>z</P><!-- c -->").unwrap();
        assert_eq!(status, Status::Continue);

        let root = builder.finish().unwrap();
        let p = root.find("p").unwrap();
        assert_eq!(p.get("class"), Some("a"));
        assert_eq!(p.text(), Some("x & y"));
        assert_eq!(p.find("br").unwrap().tail.as_deref(), Some("z"));
        assert_eq!(root.children[1].as_comment().unwrap().text, "c");
    }

    #[test]
    fn test_stops_when_done() {
        let mut builder = TreeBuilder::with_filter(TagFilter::new("b"));
        let status = feed_str(&mut builder, "<p><b>bold</b><i>never seen").unwrap();
        assert_eq!(status, Status::Done);
        assert_eq!(feed_str(&mut builder, "<b>again</b>").unwrap(), Status::Done);
        assert_eq!(builder.finish().unwrap().text(), Some("bold"));
    }

    #[test]
    fn test_truncated_tag() {
        let mut builder = TreeBuilder::new();
        match feed_str(&mut builder, "<p>text</p><div class=") {
            Err(Error::MalformedMarkup { reason }) => assert_eq!(reason, "eof-in-tag"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_recoverable_tokenizer_errors_are_ignored() {
        let mut builder = TreeBuilder::new();
        feed_str(&mut builder, "<p a=1 a=2></p x>").unwrap();
        assert_eq!(builder.finish().unwrap().find("p").and_then(|p| p.get("a")), Some("1"));
    }
}
