//! Pipeline glue: decoder chain, window pair, producer, reconciler, writer.

use crate::decode::{Charset, DecodingReader, EntityDecoder, PercentDecoder};
use crate::error::HighlightError;
use crate::markup::{MarkupScheme, OutputWriter};
use crate::producer::TokenProducer;
use crate::reconcile::DualBufferReconciler;
use crate::stream::{CharSink, CharSource};
use crate::token::SpanTracker;
use crate::window::WindowedReader;

/// Configuration for one highlight run.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct HighlightOptions {
    /// Capacity, in characters, of each of the two rolling windows.
    ///
    /// # Default
    ///
    /// `1024`
    pub window_capacity: usize,

    /// Byte-to-character mapping for percent-decoded input.
    ///
    /// # Default
    ///
    /// [`Charset::Utf8`]
    pub charset: Charset,
}

impl Default for HighlightOptions {
    fn default() -> Self {
        Self {
            window_capacity: 1024,
            charset: Charset::default(),
        }
    }
}

/// Renders syntax-highlighted markup for `source`, streaming end to end.
///
/// The raw characters are percent-decoded, then entity-decoded, then pulled
/// through the rolling windows by `producer`; each reported token is
/// reconciled against the windows and written out escaped and wrapped in the
/// markup `scheme` prescribes. Unterminated spans are closed synthetically
/// at end of stream, and trailing untokenized text is still flushed.
///
/// Returns the sink for convenience.
///
/// # Errors
///
/// - [`HighlightError::InvalidConfiguration`] for a zero window capacity.
/// - [`HighlightError::MalformedEncoding`] when the input violates percent
///   or entity encoding rules; no output past the error point is written.
/// - [`HighlightError::Io`] as propagated from `source` or `sink`.
pub fn highlight<S, W>(
    source: S,
    producer: &mut dyn TokenProducer,
    scheme: MarkupScheme,
    options: HighlightOptions,
    sink: W,
) -> Result<W, HighlightError>
where
    S: CharSource,
    W: CharSink,
{
    if options.window_capacity == 0 {
        return Err(HighlightError::InvalidConfiguration(
            "window capacity must be positive",
        ));
    }

    let percent = DecodingReader::new(source, PercentDecoder::new(options.charset))?;
    let mut decoded = DecodingReader::new(percent, EntityDecoder::new())?;

    let writer = OutputWriter::new(sink, scheme);
    let mut reconciler = DualBufferReconciler::new(options.window_capacity, writer);
    let mut tracker = SpanTracker::new();

    loop {
        let token = {
            let mut reader = WindowedReader::new(&mut decoded, &mut reconciler);
            producer.next_token(&mut reader)?
        };
        let Some(info) = token else { break };
        tracker.observe(&info);
        reconciler.handle_token(&info)?;
    }

    let final_offset = reconciler.total_decoded();
    for info in tracker.finish(final_offset) {
        reconciler.handle_token(&info)?;
    }
    reconciler.finish()?;
    decoded.close()?;

    Ok(reconciler.into_sink())
}
