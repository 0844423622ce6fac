use std::io;

/// Everything that can make a parse request fail.
///
/// Unclosed elements and stray end tags are not errors, the builder silently recovers from them.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A filter was configured but no start tag in the whole input matched it.
    #[error("no <{tag}> element matched the filter")]
    FilterNotSatisfied {
        /// The tag name the filter was looking for.
        tag: String,
    },

    /// The tokenizer hit markup it cannot recover from, such as a tag cut off by the end of
    /// input. Passed through from the tokenizer unchanged.
    #[error("malformed markup: {reason}")]
    MalformedMarkup {
        /// The tokenizer's description of the problem.
        reason: String,
    },

    /// Reading the input failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Wrap a tokenizer failure.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Error::MalformedMarkup {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let error = Error::FilterNotSatisfied { tag: "ul".into() };
        assert_eq!(error.to_string(), "no <ul> element matched the filter");
        assert_eq!(
            Error::malformed("eof-in-tag").to_string(),
            "malformed markup: eof-in-tag"
        );
    }
}
