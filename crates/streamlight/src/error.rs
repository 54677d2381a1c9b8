use alloc::string::String;
use thiserror::Error;

/// Malformed-encoding taxonomy shared by the decoder chain.
///
/// Every variant is fatal for the current stream: the decoders never emit
/// output past the error point and the caller is expected to abort the
/// render.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// A `%` escape was followed by a character that is not a hex digit.
    #[error("invalid hex digit '{0}' in percent escape")]
    InvalidHexDigit(char),

    /// Percent-decoded bytes do not form a valid UTF-8 sequence.
    #[error("percent-decoded byte 0x{0:02X} is not part of a valid UTF-8 sequence")]
    InvalidUtf8(u8),

    /// The stream ended in the middle of an escape sequence or entity.
    ///
    /// This differs from the other variants in that the data seen so far is
    /// merely incomplete rather than conclusively invalid; it becomes an
    /// error only once the underlying source reports end of stream.
    #[error("truncated escape sequence at end of stream")]
    TruncatedEscape,

    /// A character reference carried no payload (`&;`, `&#;`, `&#x;`).
    #[error("empty character reference")]
    EmptyReference,

    /// A numeric character reference contained a non-digit character.
    #[error("invalid digit '{0}' in numeric character reference")]
    InvalidReferenceDigit(char),

    /// No `;` was found within the maximum scan length of the strategy.
    #[error("character reference exceeds the maximum length of {limit} characters")]
    ReferenceTooLong {
        /// Maximum number of name or digit characters the strategy accepts.
        limit: usize,
    },

    /// A named entity terminated by `;` does not match any registered name.
    #[error("unknown entity name '&{0};'")]
    UnknownEntity(String),

    /// A numeric reference resolved to a value outside the Unicode scalar
    /// range.
    #[error("code point U+{0:X} is not a Unicode scalar value")]
    InvalidCodePoint(u32),
}

/// Errors surfaced by the streaming highlight pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HighlightError {
    /// Bad construction parameters. Raised immediately, never retried.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),

    /// The decoder chain detected data inconsistent with its encoding rules.
    #[error("malformed encoding: {0}")]
    MalformedEncoding(#[from] EncodingError),

    /// An I/O failure reported by the underlying source or sink, propagated
    /// without retry.
    #[error("I/O failure: {0}")]
    Io(String),
}
