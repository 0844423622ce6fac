#![deny(missing_docs)]
// This is an HTML parser. HTML can be untrusted input from the internet.
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

mod builder;
#[cfg(feature = "encoding")]
pub mod encoding;
mod error;
mod event;
mod filter;
mod node;
#[cfg(feature = "html5gum")]
mod parse;
mod profile;
#[doc(hidden)]
pub mod testutils;
#[cfg(feature = "html5gum")]
pub mod tokenizer;
mod utils;

pub use builder::{Status, TreeBuilder};
pub use error::Error;
pub use event::{Event, EventSink, StartTag};
pub use filter::{AttrConstraint, AttrMatch, FilterConfig, TagFilter};
pub use node::{Comment, Descendants, Element, Node};
#[cfg(all(feature = "html5gum", feature = "encoding"))]
pub use parse::{parse_bytes, parse_file, parse_reader};
#[cfg(feature = "html5gum")]
pub use parse::{parse_fragments, parse_str, parse_with, HtmlParser};
pub use profile::{TagProfile, Whitespace};
