//! Rolling character windows and the pull source the token producer reads
//! through.
//!
//! Exactly two windows exist per stream, held in a fixed two-slot arena and
//! addressed by an explicit active index. Roles swap by flipping the index,
//! never by aliasing buffers: one window's content is copied into the other
//! only during boundary-spanning flushes, and the arena keeps those regions
//! disjoint.

use alloc::boxed::Box;
use alloc::vec;

use crate::error::HighlightError;
use crate::reconcile::DualBufferReconciler;
use crate::stream::{CharSink, CharSource};

/// One rolling window of recently decoded characters.
///
/// `buf[start..end]` is the not-yet-flushed region. `read_pos` is the token
/// producer's cursor, which runs ahead of `start`: characters are flushed to
/// output only once tokens (or refills) account for them.
#[derive(Debug)]
pub(crate) struct Window {
    pub(crate) buf: Box<[char]>,
    /// First unflushed character.
    pub(crate) start: usize,
    /// One past the last unflushed character.
    pub(crate) end: usize,
    /// Local offset of `buf[0]` within the window's coordinate space.
    pub(crate) buffer_shift: usize,
    /// Added to local offsets to obtain absolute stream offsets.
    pub(crate) client_shift: usize,
    /// Number of characters loaded by the last refill.
    pub(crate) read_symbols: usize,
    /// Producer cursor into `buf[..read_symbols]`.
    pub(crate) read_pos: usize,
}

impl Window {
    fn new(capacity: usize) -> Self {
        Self {
            buf: vec!['\0'; capacity].into_boxed_slice(),
            start: 0,
            end: 0,
            buffer_shift: 0,
            client_shift: 0,
            read_symbols: 0,
            read_pos: 0,
        }
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Converts an absolute stream offset to an offset local to this window.
    /// Negative results mean the offset precedes the window's data.
    #[expect(clippy::cast_possible_wrap)]
    pub(crate) fn local(&self, absolute: usize) -> isize {
        absolute as isize - self.client_shift as isize + self.buffer_shift as isize
    }
}

/// Fixed arena of the two window slots.
#[derive(Debug)]
pub(crate) struct WindowPair {
    slots: [Window; 2],
    active: usize,
}

impl WindowPair {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            slots: [Window::new(capacity), Window::new(capacity)],
            active: 0,
        }
    }

    pub(crate) fn active(&self) -> &Window {
        &self.slots[self.active]
    }

    pub(crate) fn active_mut(&mut self) -> &mut Window {
        &mut self.slots[self.active]
    }

    pub(crate) fn active_index(&self) -> usize {
        self.active
    }

    pub(crate) fn previous_index(&self) -> usize {
        1 - self.active
    }

    pub(crate) fn get(&self, index: usize) -> &Window {
        &self.slots[index]
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> &mut Window {
        &mut self.slots[index]
    }

    /// Mutable access to two distinct slots at once.
    pub(crate) fn get_pair_mut(&mut self, first: usize) -> (&mut Window, &mut Window) {
        debug_assert!(first < 2);
        let (a, b) = self.slots.split_at_mut(1);
        if first == 0 {
            (&mut a[0], &mut b[0])
        } else {
            (&mut b[0], &mut a[0])
        }
    }

    /// Makes `index` the active slot.
    pub(crate) fn activate(&mut self, index: usize) {
        debug_assert!(index < 2);
        self.active = index;
    }
}

/// Pull source serving the token producer from the active window.
///
/// When the active window is exhausted this synchronously reaches back into
/// the decoder chain through the reconciler to flush the displaced window
/// and refill it. This is the only suspension point of the pipeline.
pub(crate) struct WindowedReader<'a, S: CharSource, W: CharSink> {
    source: &'a mut S,
    reconciler: &'a mut DualBufferReconciler<W>,
}

impl<'a, S: CharSource, W: CharSink> WindowedReader<'a, S, W> {
    pub(crate) fn new(source: &'a mut S, reconciler: &'a mut DualBufferReconciler<W>) -> Self {
        Self { source, reconciler }
    }
}

impl<S: CharSource, W: CharSink> CharSource for WindowedReader<'_, S, W> {
    fn read(&mut self, out: &mut [char]) -> Result<usize, HighlightError> {
        if out.is_empty() {
            return Err(HighlightError::InvalidConfiguration(
                "read requested with an empty destination buffer",
            ));
        }
        if self.reconciler.active_exhausted() && !self.reconciler.recycle(self.source)? {
            return Ok(0);
        }
        Ok(self.reconciler.serve(out))
    }
}
