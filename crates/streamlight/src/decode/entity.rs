//! HTML character entity and numeric character reference decoder.
//!
//! Decodes `&name;` against the static HTML 4.01 table, `&#NNN;` decimal
//! references, and `&#xHHH;` hex references. Every strategy enforces a
//! maximum scan length: the longest registered name for named entities, the
//! digit width of the largest Unicode scalar value for numeric references.
//! Failing to find `;` within the limit is conclusive evidence of malformed
//! input even if more data is on the way.

use alloc::string::String;

use super::entities;
use super::{DecodeContext, DecodeTransform, DecodedRun};
use crate::error::EncodingError;

/// Decimal digit width of `char::MAX` (1114111).
const MAX_DECIMAL_DIGITS: usize = 7;
/// Hex digit width of `char::MAX` (10FFFF).
const MAX_HEX_DIGITS: usize = 6;

/// [`DecodeTransform`] for HTML-entity-encoded text.
#[derive(Debug, Clone)]
pub struct EntityDecoder {
    max_name_len: usize,
}

impl EntityDecoder {
    /// Creates a decoder over the static entity table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_name_len: entities::max_name_len(),
        }
    }
}

impl Default for EntityDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl DecodeTransform for EntityDecoder {
    fn lookahead(&self) -> usize {
        // The widest forms are `&NAME;` and `&#xHHHHHH;`.
        (self.max_name_len + 2).max(MAX_HEX_DIGITS + 4).max(MAX_DECIMAL_DIGITS + 3)
    }

    fn transform(
        &mut self,
        ctx: &mut DecodeContext,
        out: &mut DecodedRun<'_>,
    ) -> Result<(), EncodingError> {
        let mut consumed = 0;
        let result = self.decode_pending(ctx.pending(), out, &mut consumed);
        ctx.consume(consumed);
        result
    }
}

/// Outcome of attempting to decode one reference at the head of the cache.
enum Step {
    /// The reference resolved to a character spanning `n` raw characters.
    Decoded(char, usize),
    /// The cache ends before the reference does; wait for more input.
    Incomplete,
}

impl EntityDecoder {
    fn decode_pending(
        &self,
        raw: &[char],
        out: &mut DecodedRun<'_>,
        consumed: &mut usize,
    ) -> Result<(), EncodingError> {
        while *consumed < raw.len() && !out.is_full() {
            let c = raw[*consumed];
            if c != '&' {
                out.push(c);
                *consumed += 1;
                continue;
            }
            match self.decode_reference(&raw[*consumed..])? {
                Step::Decoded(decoded, used) => {
                    out.push(decoded);
                    *consumed += used;
                }
                Step::Incomplete => return Ok(()),
            }
        }
        Ok(())
    }

    /// Decodes one reference starting at `reference[0] == '&'`.
    fn decode_reference(&self, reference: &[char]) -> Result<Step, EncodingError> {
        let Some(&second) = reference.get(1) else {
            return Ok(Step::Incomplete);
        };
        if second != '#' {
            return self.decode_named(reference);
        }
        match reference.get(2) {
            None => Ok(Step::Incomplete),
            Some('x' | 'X') => decode_numeric(reference, 3, 16, MAX_HEX_DIGITS),
            Some(_) => decode_numeric(reference, 2, 10, MAX_DECIMAL_DIGITS),
        }
    }

    fn decode_named(&self, reference: &[char]) -> Result<Step, EncodingError> {
        for (i, &c) in reference.iter().enumerate().skip(1) {
            if c == ';' {
                if i == 1 {
                    return Err(EncodingError::EmptyReference);
                }
                let name = &reference[1..i];
                return match entities::lookup(name) {
                    Some(decoded) => Ok(Step::Decoded(decoded, i + 1)),
                    None => Err(EncodingError::UnknownEntity(name.iter().collect::<String>())),
                };
            }
            if i > self.max_name_len {
                return Err(EncodingError::ReferenceTooLong {
                    limit: self.max_name_len,
                });
            }
        }
        Ok(Step::Incomplete)
    }
}

fn decode_numeric(
    reference: &[char],
    digits_at: usize,
    radix: u32,
    limit: usize,
) -> Result<Step, EncodingError> {
    let mut value: u32 = 0;
    for (i, &c) in reference.iter().enumerate().skip(digits_at) {
        if c == ';' {
            if i == digits_at {
                return Err(EncodingError::EmptyReference);
            }
            let decoded =
                char::from_u32(value).ok_or(EncodingError::InvalidCodePoint(value))?;
            return Ok(Step::Decoded(decoded, i + 1));
        }
        if i - digits_at >= limit {
            return Err(EncodingError::ReferenceTooLong { limit });
        }
        let digit = c
            .to_digit(radix)
            .ok_or(EncodingError::InvalidReferenceDigit(c))?;
        value = value * radix + digit;
    }
    Ok(Step::Incomplete)
}
