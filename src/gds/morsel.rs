//! Range morsels over a table's offset space.
//!
//! A dispatcher hands out contiguous `[begin, end)` chunks of `[0, max_offset)` to
//! any number of polling threads. The only shared mutation is a single
//! `fetch_add` on the cursor, so claims never block and every offset is handed
//! out exactly once per `init`.

use core::sync::atomic::{AtomicU64, Ordering};

use crossbeam_utils::CachePadded;

use crate::types::Offset;
use crate::FrontierConfig;

/// Sentinel for "not initialized".
const INVALID_OFFSET: Offset = u64::MAX;

/// A half-open range `[begin, end)` of offsets within one table, owned by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontierMorsel {
    begin: Offset,
    end: Offset,
}

impl FrontierMorsel {
    /// Creates a morsel covering `[begin, end)`.
    #[inline(always)]
    pub const fn new(begin: Offset, end: Offset) -> Self {
        Self { begin, end }
    }

    /// First offset of the morsel.
    #[inline(always)]
    pub const fn begin(&self) -> Offset {
        self.begin
    }

    /// One past the last offset of the morsel.
    #[inline(always)]
    pub const fn end(&self) -> Offset {
        self.end
    }

    /// Number of offsets in the morsel.
    #[inline(always)]
    pub const fn len(&self) -> u64 {
        self.end - self.begin
    }

    /// Returns `true` if the morsel covers no offsets.
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    /// The morsel as a `Range`.
    #[inline(always)]
    pub const fn range(&self) -> core::ops::Range<Offset> {
        self.begin..self.end
    }
}

/// Lock-free static partitioner of `[0, max_offset)` into morsels.
pub struct FrontierMorselDispatcher {
    max_threads: u64,
    min_morsel_size: u64,
    min_number_of_morsels: u64,
    max_offset: AtomicU64,
    morsel_size: AtomicU64,
    next_offset: CachePadded<AtomicU64>,
}

impl FrontierMorselDispatcher {
    /// Creates an uninitialized dispatcher sized for `config.max_threads` workers.
    pub fn new(config: &FrontierConfig) -> Self {
        config.validate();
        Self {
            max_threads: config.max_threads as u64,
            min_morsel_size: config.min_frontier_morsel_size,
            min_number_of_morsels: config.min_number_of_frontier_morsels,
            max_offset: AtomicU64::new(INVALID_OFFSET),
            morsel_size: AtomicU64::new(u64::MAX),
            next_offset: CachePadded::new(AtomicU64::new(INVALID_OFFSET)),
        }
    }

    /// Prepares the dispatcher to hand out morsels over `[0, max_offset)`.
    ///
    /// The ideal is about `max_threads²` morsels so that late threads still find
    /// work; below `min_number_of_frontier_morsels` that target is raised, and the
    /// morsel size never drops below `min_frontier_morsel_size`.
    ///
    /// Must not race with `get_next_range_morsel`.
    ///
    /// # Panics
    /// Panics if `max_offset` is the reserved `u64::MAX`.
    pub fn init(&self, max_offset: Offset) {
        assert!(max_offset != INVALID_OFFSET, "max_offset {max_offset} is reserved");
        let target_morsels = self
            .min_number_of_morsels
            .max(self.max_threads.saturating_mul(self.max_threads));
        let morsel_size = self.min_morsel_size.max(max_offset / target_morsels.max(1));
        self.max_offset.store(max_offset, Ordering::Release);
        self.morsel_size.store(morsel_size, Ordering::Release);
        self.next_offset.store(0, Ordering::Release);
        tracing::debug!(
            max_offset,
            morsel_size,
            threads = self.max_threads,
            "frontier dispatcher initialized"
        );
    }

    /// Claims the next morsel, or returns `None` once `[0, max_offset)` is exhausted.
    ///
    /// Exhaustion has no side effect beyond advancing the cursor, so any thread may
    /// keep polling.
    ///
    /// # Panics
    /// Panics if `init` has not been called.
    #[inline]
    pub fn get_next_range_morsel(&self) -> Option<FrontierMorsel> {
        let max_offset = self.max_offset.load(Ordering::Acquire);
        assert!(max_offset != INVALID_OFFSET, "morsel requested from an uninitialized dispatcher");
        let morsel_size = self.morsel_size.load(Ordering::Acquire);
        let begin = self.next_offset.fetch_add(morsel_size, Ordering::AcqRel);
        if begin >= max_offset {
            return None;
        }
        let end = begin.saturating_add(morsel_size).min(max_offset);
        Some(FrontierMorsel::new(begin, end))
    }

    /// Morsel size computed by the last `init`.
    pub fn morsel_size(&self) -> u64 {
        self.morsel_size.load(Ordering::Acquire)
    }

    /// Upper bound passed to the last `init`, or `None` before the first one.
    pub fn max_offset(&self) -> Option<Offset> {
        match self.max_offset.load(Ordering::Acquire) {
            INVALID_OFFSET => None,
            max => Some(max),
        }
    }
}

impl core::fmt::Debug for FrontierMorselDispatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FrontierMorselDispatcher")
            .field("max_threads", &self.max_threads)
            .field("max_offset", &self.max_offset())
            .field("morsel_size", &self.morsel_size())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(threads: usize, floor: u64, min_morsels: u64) -> FrontierConfig {
        FrontierConfig {
            max_threads: threads,
            min_frontier_morsel_size: floor,
            min_number_of_frontier_morsels: min_morsels,
            ..FrontierConfig::default()
        }
    }

    #[test]
    fn thousand_offsets_four_threads() {
        let d = FrontierMorselDispatcher::new(&FrontierConfig::default().with_threads(4));
        d.init(1000);
        // 1000 / max(128, 16) is far below the 512 floor.
        assert_eq!(d.morsel_size(), 512);
        assert_eq!(d.get_next_range_morsel(), Some(FrontierMorsel::new(0, 512)));
        assert_eq!(d.get_next_range_morsel(), Some(FrontierMorsel::new(512, 1000)));
        assert_eq!(d.get_next_range_morsel(), None);
        assert_eq!(d.get_next_range_morsel(), None);
    }

    #[test]
    fn morsel_size_shrinks_with_threads_down_to_floor() {
        let mut prev = u64::MAX;
        for threads in [1, 2, 4, 8, 16, 64, 1024] {
            let d = FrontierMorselDispatcher::new(&config(threads, 4, 1));
            d.init(10_000);
            let size = d.morsel_size();
            assert!(size >= 4);
            assert!(size <= prev, "{threads} threads grew morsels to {size}");
            prev = size;
        }
        assert_eq!(prev, 4);
    }

    #[test]
    fn reinit_restarts_cursor() {
        let d = FrontierMorselDispatcher::new(&config(1, 10, 1));
        d.init(15);
        assert_eq!(d.get_next_range_morsel().map(|m| m.len()), Some(15));
        assert!(d.get_next_range_morsel().is_none());
        d.init(5);
        assert_eq!(d.get_next_range_morsel(), Some(FrontierMorsel::new(0, 5)));
    }

    #[test]
    fn empty_range_yields_nothing() {
        let d = FrontierMorselDispatcher::new(&config(2, 1, 1));
        d.init(0);
        assert!(d.get_next_range_morsel().is_none());
    }

    #[test]
    #[should_panic(expected = "uninitialized dispatcher")]
    fn uninitialized_dispatcher_fails_fast() {
        let d = FrontierMorselDispatcher::new(&config(2, 1, 1));
        let _ = d.get_next_range_morsel();
    }
}
