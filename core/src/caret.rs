//! Deferred caret placement after a commit.
//!
//! The input surface can only move its caret once it has re-rendered the new
//! text, so a commit schedules the placement instead of applying it. Each
//! schedule bumps a generation counter; firing anything but the newest
//! generation is a no-op, which makes back-to-back commits resolve to the
//! last one.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaretPlacement {
    pub generation: Generation,
    pub offset: usize,
}

#[derive(Debug, Default)]
pub struct CaretScheduler {
    latest: u64,
    pending: Option<CaretPlacement>,
}

impl CaretScheduler {
    /// Queue a placement, superseding any that has not fired yet.
    pub fn schedule(&mut self, offset: usize) -> CaretPlacement {
        self.latest += 1;
        let placement = CaretPlacement {
            generation: Generation(self.latest),
            offset,
        };
        if let Some(stale) = self.pending.replace(placement) {
            tracing::trace!(?stale, "superseded pending caret placement");
        }
        placement
    }

    /// Run the placement for `generation`. Returns the offset to apply, or
    /// `None` if that generation is stale or already ran.
    pub fn fire(&mut self, generation: Generation) -> Option<usize> {
        match self.pending {
            Some(placement) if placement.generation == generation => {
                self.pending = None;
                Some(placement.offset)
            }
            _ => None,
        }
    }

    pub fn pending(&self) -> Option<CaretPlacement> {
        self.pending
    }
}
