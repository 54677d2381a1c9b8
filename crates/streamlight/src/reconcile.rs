//! Dual rolling-buffer reconciliation of token ranges against raw windows.
//!
//! Tokens arrive with absolute offsets into the decoded stream while the raw
//! characters they cover sit in one of two rolling windows (previous and
//! active). For each token the reconciler walks the windows in order, maps
//! the token onto window-local ranges, and drives flushing of annotated and
//! unannotated runs to the writer.
//!
//! The interesting case is a token whose characters straddle the refill
//! boundary between the two windows: its run is assembled into one
//! contiguous slice (inside the source window's spare capacity when it fits,
//! via a temporary buffer otherwise) so the writer receives exactly one
//! tagged call and the markup tags wrap the token exactly once.
//!
//! Invariant: the concatenation of all runs handed to the writer, in order,
//! equals the decoded input stream exactly — no gaps, no duplicates —
//! regardless of window capacity.

use alloc::vec::Vec;

use crate::error::HighlightError;
use crate::markup::OutputWriter;
use crate::stream::{CharSink, CharSource};
use crate::token::TokenInfo;
use crate::window::WindowPair;

/// Orchestrates the two windows and the escaping writer.
#[derive(Debug)]
pub(crate) struct DualBufferReconciler<W> {
    windows: WindowPair,
    writer: OutputWriter<W>,
}

impl<W: CharSink> DualBufferReconciler<W> {
    pub(crate) fn new(window_capacity: usize, writer: OutputWriter<W>) -> Self {
        Self {
            windows: WindowPair::new(window_capacity),
            writer,
        }
    }

    /// Whether the producer has consumed every character loaded into the
    /// active window.
    pub(crate) fn active_exhausted(&self) -> bool {
        let w = self.windows.active();
        w.read_pos >= w.read_symbols
    }

    /// Serves producer reads from the active window's remaining characters.
    pub(crate) fn serve(&mut self, out: &mut [char]) -> usize {
        let w = self.windows.active_mut();
        let n = out.len().min(w.read_symbols - w.read_pos);
        out[..n].copy_from_slice(&w.buf[w.read_pos..w.read_pos + n]);
        w.read_pos += n;
        n
    }

    /// Total number of decoded characters loaded so far; after end of stream
    /// this is the final absolute offset.
    pub(crate) fn total_decoded(&self) -> usize {
        let w = self.windows.active();
        w.client_shift + w.read_symbols
    }

    /// Recycles the displaced window: flushes its unflushed run untagged,
    /// refills it from the decoder chain, and flips the active index.
    ///
    /// Returns `false` at end of stream, leaving both windows intact so late
    /// tokens and end-of-stream synthesis can still address their data.
    pub(crate) fn recycle<S: CharSource>(
        &mut self,
        source: &mut S,
    ) -> Result<bool, HighlightError> {
        let displaced_index = self.windows.previous_index();
        {
            let Self { windows, writer } = self;
            let displaced = windows.get_mut(displaced_index);
            if !displaced.is_empty() {
                writer.write(&displaced.buf[displaced.start..displaced.end], None)?;
                displaced.start = displaced.end;
            }
        }
        let n = source.read(&mut self.windows.get_mut(displaced_index).buf)?;
        if n == 0 {
            return Ok(false);
        }
        let carried = self.total_decoded();
        let displaced = self.windows.get_mut(displaced_index);
        displaced.read_symbols = n;
        displaced.start = 0;
        displaced.end = n;
        displaced.buffer_shift = 0;
        displaced.read_pos = 0;
        displaced.client_shift = carried;
        self.windows.activate(displaced_index);
        Ok(true)
    }

    /// Applies one token (real or synthetic) to the windows, flushing runs
    /// to the writer as mandated by where the token's range falls.
    #[expect(clippy::cast_sign_loss)]
    pub(crate) fn handle_token(&mut self, info: &TokenInfo) -> Result<(), HighlightError> {
        let order = [self.windows.previous_index(), self.windows.active_index()];
        let mut tagged_written = false;
        let mut idx = 0;
        while idx < order.len() {
            let wi = order[idx];
            if self.windows.get(wi).is_empty() {
                idx += 1;
                continue;
            }
            let (local_start, local_end, w_start, w_end) = {
                let w = self.windows.get(wi);
                (w.local(info.start), w.local(info.end), w.start, w.end)
            };

            // Token entirely precedes this window's pending data.
            if local_end < w_start as isize {
                idx += 1;
                continue;
            }

            // Token (or its tail) covers the window's pending prefix.
            if local_start <= w_start as isize {
                if local_end > w_end as isize
                    && idx + 1 < order.len()
                    && !self.windows.get(order[idx + 1]).is_empty()
                {
                    // Crosses the refill boundary; assemble one contiguous
                    // run so the markup wraps the token exactly once.
                    self.write_straddling(wi, w_start, info)?;
                    return Ok(());
                }
                let flush_end = local_end.clamp(w_start as isize, w_end as isize) as usize;
                self.write_window_run(wi, w_start, flush_end, Some(info))?;
                tagged_written = true;
                self.windows.get_mut(wi).start = flush_end;
                if local_end <= w_end as isize {
                    return Ok(());
                }
                idx += 1;
                continue;
            }

            // Token starts after this window's data.
            if local_start >= w_end as isize {
                self.write_window_run(wi, w_start, w_end, None)?;
                self.windows.get_mut(wi).start = w_end;
                idx += 1;
                continue;
            }

            // Token starts inside this window: flush the untagged prefix.
            let local_start = local_start as usize;
            self.write_window_run(wi, w_start, local_start, None)?;
            self.windows.get_mut(wi).start = local_start;

            if local_end <= w_end as isize {
                let local_end = local_end as usize;
                self.write_window_run(wi, local_start, local_end, Some(info))?;
                self.windows.get_mut(wi).start = local_end;
                return Ok(());
            }

            if idx + 1 >= order.len() {
                // No next window yet: flush what is present as a partial
                // run; the remainder is picked up once more data arrives.
                self.write_window_run(wi, local_start, w_end, Some(info))?;
                self.windows.get_mut(wi).start = w_end;
                return Ok(());
            }

            self.write_straddling(wi, local_start, info)?;
            return Ok(());
        }
        if !tagged_written {
            // The token's characters are already flushed (or it is empty, as
            // the synthesized end-of-stream closes are); still hand it to
            // the writer so span markup stays balanced.
            self.writer.write(&[], Some(info))?;
        }
        Ok(())
    }

    /// Flushes any unflushed remainder of both windows, untagged.
    pub(crate) fn finish(&mut self) -> Result<(), HighlightError> {
        let Self { windows, writer } = self;
        for wi in [windows.previous_index(), windows.active_index()] {
            let w = windows.get_mut(wi);
            if !w.is_empty() {
                writer.write(&w.buf[w.start..w.end], None)?;
                w.start = w.end;
            }
        }
        Ok(())
    }

    pub(crate) fn into_sink(self) -> W {
        self.writer.into_sink()
    }

    fn write_window_run(
        &mut self,
        wi: usize,
        from: usize,
        to: usize,
        token: Option<&TokenInfo>,
    ) -> Result<(), HighlightError> {
        if from >= to && token.is_none() {
            return Ok(());
        }
        let Self { windows, writer } = self;
        writer.write(&windows.get(wi).buf[from..to], token)
    }

    /// Emits a token whose characters start in window `from_index` and
    /// continue into the next window, as one contiguous tagged run.
    #[expect(clippy::cast_sign_loss)]
    fn write_straddling(
        &mut self,
        from_index: usize,
        local_start: usize,
        info: &TokenInfo,
    ) -> Result<(), HighlightError> {
        let Self { windows, writer } = self;
        let (head, tail) = windows.get_pair_mut(from_index);
        let head_len = head.end - local_start;
        let tail_end = tail
            .local(info.end)
            .clamp(tail.start as isize, tail.end as isize) as usize;
        let tail_start = tail.start;
        let tail_len = tail_end - tail_start;
        let total = head_len + tail_len;

        if head.end + tail_len <= head.buf.len() {
            // The continuation fits the head window's spare capacity.
            head.buf[head.end..head.end + tail_len]
                .copy_from_slice(&tail.buf[tail_start..tail_end]);
            writer.write(&head.buf[local_start..local_start + total], Some(info))?;
        } else if total <= head.buf.len() {
            // Compact the head to the front to make room; the head window is
            // drained by this write, so its offset mapping is moot after.
            head.buf.copy_within(local_start..head.end, 0);
            head.buf[head_len..total].copy_from_slice(&tail.buf[tail_start..tail_end]);
            writer.write(&head.buf[..total], Some(info))?;
        } else {
            let mut assembled: Vec<char> = Vec::with_capacity(total);
            assembled.extend_from_slice(&head.buf[local_start..head.end]);
            assembled.extend_from_slice(&tail.buf[tail_start..tail_end]);
            writer.write(&assembled, Some(info))?;
        }

        head.start = head.end;
        tail.start = tail_end;
        Ok(())
    }
}
