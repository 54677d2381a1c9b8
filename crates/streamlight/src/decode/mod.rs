//! Bounded-lookahead decoding transforms over a character source.
//!
//! Overview
//! - A [`DecodingReader`] decorates a [`CharSource`] and rewrites escape
//!   sequences on the fly. The concrete rewrite rule lives in a
//!   [`DecodeTransform`]; the generic buffering, compaction, and end-of-stream
//!   bookkeeping live here.
//! - Each transform declares the maximum number of raw characters it must see
//!   beyond the current position to resolve one output character (its
//!   *lookahead*, `R`). The reader guarantees the transform a raw cache of at
//!   least `R` characters, so a transform that stops mid-escape is always
//!   able to resume once more input arrives.
//!
//! Buffering
//! - [`DecodeContext`] is a flat cache of raw (not-yet-decoded) characters
//!   with `start`/`end` cursors marking the cached-but-unconsumed region.
//!   It is compacted (cursors reset to zero) whenever fully drained,
//!   defragmented when the free tail is too small for the next refill, and
//!   grown only when a caller's requested length exceeds the available
//!   contiguous free space.
//! - A transform consumes resolved characters by advancing `start` and leaves
//!   unresolved trailing characters (always fewer than `R`) cached for the
//!   next call.
//!
//! End of stream
//! - Once the underlying source reports end of stream the transform is
//!   invoked one final time over the remaining cache. If characters remain
//!   that cannot be resolved without more input, the stream ended in the
//!   middle of an escape: [`EncodingError::TruncatedEscape`].

mod entities;
mod entity;
mod percent;

use alloc::vec;
use alloc::vec::Vec;

pub use entity::EntityDecoder;
pub use percent::{Charset, PercentDecoder};

use crate::error::{EncodingError, HighlightError};
use crate::stream::CharSource;

/// Default raw-cache capacity, in characters.
///
/// The cache may expand at runtime but never beyond the size of the buffer
/// the client hands to [`DecodingReader::read`].
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Raw-character cache shared between a [`DecodingReader`] and its
/// [`DecodeTransform`].
#[derive(Debug)]
pub struct DecodeContext {
    buf: Vec<char>,
    start: usize,
    end: usize,
    at_eof: bool,
}

impl DecodeContext {
    fn new(capacity: usize) -> Self {
        Self {
            buf: vec!['\0'; capacity],
            start: 0,
            end: 0,
            at_eof: false,
        }
    }

    /// The cached-but-unconsumed raw characters.
    #[inline]
    #[must_use]
    pub fn pending(&self) -> &[char] {
        &self.buf[self.start..self.end]
    }

    /// Marks `n` pending characters as consumed.
    #[inline]
    pub fn consume(&mut self, n: usize) {
        debug_assert!(n <= self.end - self.start);
        self.start += n;
        if self.start >= self.end {
            self.start = 0;
            self.end = 0;
        }
    }

    /// Whether the underlying source has reported end of stream.
    #[inline]
    #[must_use]
    pub fn at_eof(&self) -> bool {
        self.at_eof
    }

    #[inline]
    fn is_drained(&self) -> bool {
        self.end <= self.start
    }

    fn cached(&self) -> usize {
        self.end - self.start
    }

    /// Makes room for at least `spare` more raw characters, preferring
    /// defragmentation over growth.
    fn reserve_spare(&mut self, spare: usize) {
        if self.buf.len() - self.end >= spare {
            return;
        }
        let cached = self.cached();
        if cached + spare <= self.buf.len() {
            self.buf.copy_within(self.start..self.end, 0);
        } else {
            let mut grown = vec!['\0'; cached + spare];
            grown[..cached].copy_from_slice(&self.buf[self.start..self.end]);
            self.buf = grown;
        }
        self.start = 0;
        self.end = cached;
    }

    fn free_tail(&mut self) -> &mut [char] {
        &mut self.buf[self.end..]
    }

    fn commit(&mut self, n: usize) {
        debug_assert!(self.end + n <= self.buf.len());
        self.end += n;
    }
}

/// Destination for decoded characters, bounded by the client's buffer.
#[derive(Debug)]
pub struct DecodedRun<'a> {
    buf: &'a mut [char],
    pos: usize,
}

impl DecodedRun<'_> {
    /// Whether no more decoded characters fit.
    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Appends one decoded character. Callers check [`Self::is_full`] first;
    /// a push past the end is a bug in the transform.
    #[inline]
    pub fn push(&mut self, c: char) {
        self.buf[self.pos] = c;
        self.pos += 1;
    }

    fn written(&self) -> usize {
        self.pos
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}

/// One concrete bounded-lookahead rewrite rule.
pub trait DecodeTransform {
    /// Maximum number of raw characters needed to resolve one output
    /// character. Must be positive.
    fn lookahead(&self) -> usize;

    /// Resolves as many pending characters from `ctx` into `out` as possible.
    ///
    /// Stops when `out` is full, when the cache is drained, or when the tail
    /// of the cache is an incomplete escape that needs more input (in which
    /// case the tail stays cached and the call returns `Ok`).
    ///
    /// # Errors
    ///
    /// Returns an [`EncodingError`] when the cached data is conclusively
    /// inconsistent with the encoding rules, regardless of how much more
    /// input might follow.
    fn transform(
        &mut self,
        ctx: &mut DecodeContext,
        out: &mut DecodedRun<'_>,
    ) -> Result<(), EncodingError>;
}

/// [`CharSource`] decorator that applies a [`DecodeTransform`] with bounded
/// lookahead.
#[derive(Debug)]
pub struct DecodingReader<S, T> {
    source: S,
    transform: T,
    ctx: DecodeContext,
}

impl<S: CharSource, T: DecodeTransform> DecodingReader<S, T> {
    /// Decorates `source` with `transform`.
    ///
    /// # Errors
    ///
    /// Returns [`HighlightError::InvalidConfiguration`] if the transform
    /// reports a zero lookahead.
    pub fn new(source: S, transform: T) -> Result<Self, HighlightError> {
        let lookahead = transform.lookahead();
        if lookahead == 0 {
            return Err(HighlightError::InvalidConfiguration(
                "decode transform lookahead must be positive",
            ));
        }
        let capacity = DEFAULT_CACHE_CAPACITY.max(lookahead);
        Ok(Self {
            source,
            transform,
            ctx: DecodeContext::new(capacity),
        })
    }

    /// Reads and decodes a single character.
    ///
    /// # Errors
    ///
    /// Same contract as [`CharSource::read`].
    pub fn read_char(&mut self) -> Result<Option<char>, HighlightError> {
        let mut one = ['\0'];
        Ok(match self.read(&mut one)? {
            0 => None,
            _ => Some(one[0]),
        })
    }
}

impl<S: CharSource, T: DecodeTransform> CharSource for DecodingReader<S, T> {
    fn read(&mut self, out: &mut [char]) -> Result<usize, HighlightError> {
        if out.is_empty() {
            return Err(HighlightError::InvalidConfiguration(
                "read requested with an empty destination buffer",
            ));
        }
        let mut run = DecodedRun { buf: out, pos: 0 };
        loop {
            self.transform.transform(&mut self.ctx, &mut run)?;
            if run.is_full() {
                break;
            }
            if self.ctx.at_eof() {
                if self.ctx.is_drained() {
                    break;
                }
                // The transform kept characters it cannot resolve and no
                // more input will ever arrive.
                return Err(EncodingError::TruncatedEscape.into());
            }
            let spare = run.remaining().max(self.transform.lookahead());
            self.ctx.reserve_spare(spare);
            let n = self.source.read(self.ctx.free_tail())?;
            if n == 0 {
                self.ctx.at_eof = true;
            } else {
                self.ctx.commit(n);
            }
        }
        Ok(run.written())
    }

    fn close(&mut self) -> Result<(), HighlightError> {
        self.source.close()?;
        // Cancellation may leave decoded-but-unread characters behind, but
        // data cached short of a valid escape boundary is an error, not
        // something to discard silently.
        let mut scratch = ['\0'; 8];
        while !self.ctx.is_drained() {
            let before = self.ctx.cached();
            let mut run = DecodedRun {
                buf: &mut scratch,
                pos: 0,
            };
            self.transform.transform(&mut self.ctx, &mut run)?;
            if self.ctx.cached() == before {
                return Err(EncodingError::TruncatedEscape.into());
            }
        }
        Ok(())
    }
}
