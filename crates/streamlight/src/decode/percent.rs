//! Percent-encoding decoder (`%XX` escapes and `+` for space).

use super::{DecodeContext, DecodeTransform, DecodedRun};
use crate::error::EncodingError;

/// Byte-to-character mapping applied to percent-decoded bytes.
///
/// The mapping is an explicit configuration parameter, never a locale
/// default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Charset {
    /// Decoded bytes form UTF-8 sequences; a multi-byte character arrives as
    /// consecutive `%XX` triplets (the default).
    #[default]
    Utf8,
    /// Each decoded byte is one character (ISO-8859-1).
    Latin1,
}

impl Charset {
    fn max_bytes_per_char(self) -> usize {
        match self {
            Charset::Utf8 => 4,
            Charset::Latin1 => 1,
        }
    }
}

/// [`DecodeTransform`] for percent-encoded text.
///
/// `+` becomes a space, `%` followed by two hex digits becomes a byte, and
/// everything else passes through unchanged. An incomplete escape at the end
/// of the cache is not an error while the source is still alive; the
/// transform simply waits for more input.
#[derive(Debug, Clone)]
pub struct PercentDecoder {
    charset: Charset,
}

impl PercentDecoder {
    /// Creates a decoder mapping decoded bytes through `charset`.
    #[must_use]
    pub fn new(charset: Charset) -> Self {
        Self { charset }
    }
}

impl Default for PercentDecoder {
    fn default() -> Self {
        Self::new(Charset::default())
    }
}

impl DecodeTransform for PercentDecoder {
    fn lookahead(&self) -> usize {
        // One `%XX` triplet per byte of the longest sequence.
        3 * self.charset.max_bytes_per_char()
    }

    fn transform(
        &mut self,
        ctx: &mut DecodeContext,
        out: &mut DecodedRun<'_>,
    ) -> Result<(), EncodingError> {
        let mut consumed = 0;
        let result = decode_pending(ctx.pending(), self.charset, out, &mut consumed);
        ctx.consume(consumed);
        result
    }
}

fn decode_pending(
    raw: &[char],
    charset: Charset,
    out: &mut DecodedRun<'_>,
    consumed: &mut usize,
) -> Result<(), EncodingError> {
    while *consumed < raw.len() && !out.is_full() {
        match raw[*consumed] {
            '+' => {
                out.push(' ');
                *consumed += 1;
            }
            '%' => {
                let escape = &raw[*consumed..];
                if escape.len() < 3 {
                    // Not enough data to resolve the triplet yet.
                    return Ok(());
                }
                match charset {
                    Charset::Latin1 => {
                        out.push(char::from(hex_pair(escape[1], escape[2])?));
                        *consumed += 3;
                    }
                    Charset::Utf8 => {
                        let Some(used) = decode_utf8_escape(escape, out)? else {
                            return Ok(());
                        };
                        *consumed += used;
                    }
                }
            }
            other => {
                out.push(other);
                *consumed += 1;
            }
        }
    }
    Ok(())
}

/// Decodes a UTF-8 sequence spelled as consecutive `%XX` triplets starting at
/// `escape[0] == '%'`. Returns the number of raw characters consumed, or
/// `None` when the sequence is incomplete and more input is needed.
fn decode_utf8_escape(
    escape: &[char],
    out: &mut DecodedRun<'_>,
) -> Result<Option<usize>, EncodingError> {
    let lead = hex_pair(escape[1], escape[2])?;
    let len = utf8_sequence_len(lead)?;
    if len == 1 {
        out.push(char::from(lead));
        return Ok(Some(3));
    }
    if escape.len() < 3 * len {
        return Ok(None);
    }
    let mut bytes = [0u8; 4];
    bytes[0] = lead;
    for i in 1..len {
        let triplet = &escape[3 * i..];
        if triplet[0] != '%' {
            // A continuation byte must itself arrive percent-encoded.
            return Err(EncodingError::InvalidUtf8(lead));
        }
        bytes[i] = hex_pair(triplet[1], triplet[2])?;
    }
    // `from_utf8` rejects stray continuations, overlong forms and surrogates.
    let decoded = core::str::from_utf8(&bytes[..len])
        .map_err(|_| EncodingError::InvalidUtf8(lead))?;
    for c in decoded.chars() {
        out.push(c);
    }
    Ok(Some(3 * len))
}

fn utf8_sequence_len(lead: u8) -> Result<usize, EncodingError> {
    match lead {
        0x00..=0x7F => Ok(1),
        0xC2..=0xDF => Ok(2),
        0xE0..=0xEF => Ok(3),
        0xF0..=0xF4 => Ok(4),
        _ => Err(EncodingError::InvalidUtf8(lead)),
    }
}

fn hex_pair(high: char, low: char) -> Result<u8, EncodingError> {
    Ok((hex_value(high)? << 4) | hex_value(low)?)
}

fn hex_value(c: char) -> Result<u8, EncodingError> {
    match c {
        '0'..='9' => Ok(c as u8 - b'0'),
        'A'..='F' => Ok(c as u8 - b'A' + 10),
        'a'..='f' => Ok(c as u8 - b'a' + 10),
        _ => Err(EncodingError::InvalidHexDigit(c)),
    }
}
