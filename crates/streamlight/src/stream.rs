//! Pull-style character sources and push-style character sinks.
//!
//! These traits are the outer seams of the core: arbitrary characters come
//! in through a [`CharSource`], characters plus inserted tag markup go out
//! through a [`CharSink`]. There is no wire format beyond that.

use alloc::{string::String, vec::Vec};

use crate::error::HighlightError;

/// A pull-style character source.
///
/// `read` fills a prefix of `out` and returns the number of characters
/// written; `Ok(0)` signals end of stream. Calling `read` with an empty
/// buffer is a configuration error, never a silent no-op.
pub trait CharSource {
    /// Reads up to `out.len()` characters into `out`.
    fn read(&mut self, out: &mut [char]) -> Result<usize, HighlightError>;

    /// Closes the source, propagating the signal down through any decorated
    /// streams.
    fn close(&mut self) -> Result<(), HighlightError> {
        Ok(())
    }
}

/// A push-style character sink.
pub trait CharSink {
    /// Writes a run of characters.
    fn write(&mut self, run: &[char]) -> Result<(), HighlightError>;

    /// Writes a string slice.
    fn write_str(&mut self, text: &str) -> Result<(), HighlightError>;
}

impl<S: CharSource + ?Sized> CharSource for &mut S {
    fn read(&mut self, out: &mut [char]) -> Result<usize, HighlightError> {
        (**self).read(out)
    }

    fn close(&mut self) -> Result<(), HighlightError> {
        (**self).close()
    }
}

impl<W: CharSink + ?Sized> CharSink for &mut W {
    fn write(&mut self, run: &[char]) -> Result<(), HighlightError> {
        (**self).write(run)
    }

    fn write_str(&mut self, text: &str) -> Result<(), HighlightError> {
        (**self).write_str(text)
    }
}

impl CharSink for String {
    fn write(&mut self, run: &[char]) -> Result<(), HighlightError> {
        self.extend(run.iter().copied());
        Ok(())
    }

    fn write_str(&mut self, text: &str) -> Result<(), HighlightError> {
        self.push_str(text);
        Ok(())
    }
}

/// In-memory [`CharSource`] over a string.
///
/// Used by callers that already hold the whole input and by tests; the
/// pipeline itself never materializes the stream this way.
#[derive(Debug, Clone)]
pub struct StrSource {
    chars: Vec<char>,
    pos: usize,
}

impl StrSource {
    /// Creates a source yielding the characters of `text` in order.
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
        }
    }
}

impl CharSource for StrSource {
    fn read(&mut self, out: &mut [char]) -> Result<usize, HighlightError> {
        if out.is_empty() {
            return Err(HighlightError::InvalidConfiguration(
                "read requested with an empty destination buffer",
            ));
        }
        let n = out.len().min(self.chars.len() - self.pos);
        out[..n].copy_from_slice(&self.chars[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}
