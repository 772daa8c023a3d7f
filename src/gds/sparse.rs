//! Set-backed frontier for small active sets.
//!
//! A `SparseFrontier` keeps one offset set per table plus an `enabled` flag. Once
//! the pinned set reaches `sample_size`, or a disabled frontier is merged in, it
//! disables itself for good and callers fall back to the dense representation.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use core::sync::atomic::{AtomicBool, Ordering};

use super::GdsFrontier;
use crate::types::{NodeId, Offset, TableId};
use crate::FrontierConfig;

#[derive(Debug, Default)]
struct SparseState {
    sets: HashMap<TableId, HashSet<Offset>>,
    pinned: Option<TableId>,
}

impl SparseState {
    fn pinned_set(&mut self) -> &mut HashSet<Offset> {
        let Some(table) = self.pinned else {
            panic!("sparse frontier accessed with no table pinned");
        };
        self.sets.entry(table).or_default()
    }
}

/// Per-table sets of active offsets.
///
/// Mutations take a short-held lock, so many workers may add to the same table.
#[derive(Debug)]
pub struct SparseFrontier {
    enabled: AtomicBool,
    sample_size: usize,
    state: Mutex<SparseState>,
}

impl Default for SparseFrontier {
    fn default() -> Self {
        Self::new(FrontierConfig::SPARSE_SAMPLE_SIZE)
    }
}

impl SparseFrontier {
    /// Creates an empty, enabled frontier that disables itself at `sample_size` entries.
    pub fn new(sample_size: usize) -> Self {
        Self {
            enabled: AtomicBool::new(true),
            sample_size,
            state: Mutex::new(SparseState::default()),
        }
    }

    #[inline]
    fn lock(&self) -> MutexGuard<'_, SparseState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether the sparse representation is still tracking nodes.
    #[inline(always)]
    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Stops tracking. There is no way back.
    pub fn disable(&self) {
        if self.enabled.swap(false, Ordering::AcqRel) {
            tracing::debug!(sample_size = self.sample_size, "sparse frontier disabled");
        }
    }

    /// Threshold passed at construction.
    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Makes `table_id`'s set, created if absent, the target of later calls.
    pub fn pin_table_id(&self, table_id: TableId) {
        let mut state = self.lock();
        state.pinned = Some(table_id);
        state.sets.entry(table_id).or_default();
    }

    /// Currently pinned table.
    pub fn pinned_table_id(&self) -> Option<TableId> {
        self.lock().pinned
    }

    /// Inserts `offset` into the pinned set. No-op once disabled.
    ///
    /// # Panics
    /// Panics if no table is pinned.
    pub fn add_node(&self, offset: Offset) {
        if !self.enabled() {
            return;
        }
        self.lock().pinned_set().insert(offset);
    }

    /// Inserts several nodes of the pinned table. No-op once disabled.
    ///
    /// # Panics
    /// Panics if no table is pinned or a node belongs to another table.
    pub fn add_nodes(&self, nodes: &[NodeId]) {
        if !self.enabled() {
            return;
        }
        let mut state = self.lock();
        let pinned = state.pinned;
        let set = state.pinned_set();
        for node in nodes {
            assert!(
                Some(node.table_id) == pinned,
                "node {node} is not in the pinned table {pinned:?}"
            );
            set.insert(node.offset);
        }
    }

    /// Disables the frontier once the pinned set holds `sample_size` offsets.
    pub fn check_sample_size(&self) {
        if !self.enabled() {
            return;
        }
        let len = {
            let mut state = self.lock();
            state.pinned_set().len()
        };
        if len >= self.sample_size {
            self.disable();
        }
    }

    /// Folds a worker-local accumulation into this frontier under one lock hold.
    ///
    /// Every table of `local` is merged, independent of what either side has pinned.
    ///
    /// # Panics
    /// Panics if `local` is disabled or is this frontier.
    pub fn merge_local_frontier(&self, local: &SparseFrontier) {
        assert!(local.enabled(), "merging a disabled local frontier");
        assert!(!core::ptr::eq(self, local), "frontier merged into itself");
        if !self.enabled() {
            return;
        }
        let local_state = local.lock();
        let oversized = self.union_from(&local_state);
        drop(local_state);
        if oversized {
            self.disable();
        }
    }

    /// Merges every table of another shared frontier into this one.
    ///
    /// A disabled `other` disables `self`; a disabled `self` ignores the call.
    ///
    /// # Panics
    /// Panics if `other` is this frontier.
    pub fn merge_sparse_frontier(&self, other: &SparseFrontier) {
        assert!(!core::ptr::eq(self, other), "frontier merged into itself");
        if !self.enabled() {
            return;
        }
        if !other.enabled() {
            self.disable();
            return;
        }
        let other_state = other.lock();
        let oversized = self.union_from(&other_state);
        drop(other_state);
        if oversized {
            self.disable();
        }
    }

    /// Returns `true` if some merged set reached the sample size. Merges disable on
    /// size the same way `check_sample_size` does, for every table they touch.
    fn union_from(&self, other: &SparseState) -> bool {
        let mut state = self.lock();
        let mut oversized = false;
        for (&table_id, offsets) in &other.sets {
            let set = state.sets.entry(table_id).or_default();
            set.extend(offsets.iter().copied());
            oversized |= set.len() >= self.sample_size;
        }
        oversized
    }

    /// Empties every table's set and drops the pin. The enabled flag is kept.
    pub fn reset_state(&self) {
        let mut state = self.lock();
        state.sets.clear();
        state.pinned = None;
    }

    /// Whether `offset` is in the pinned set.
    ///
    /// # Panics
    /// Panics if no table is pinned.
    pub fn contains(&self, offset: Offset) -> bool {
        self.lock().pinned_set().contains(&offset)
    }

    /// Total number of offsets across all tables.
    pub fn len(&self) -> usize {
        self.lock().sets.values().map(HashSet::len).sum()
    }

    /// Returns `true` if no table holds an offset.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted snapshot of one table's offsets.
    pub fn offsets(&self, table_id: TableId) -> Vec<Offset> {
        let mut out: Vec<Offset> = self
            .lock()
            .sets
            .get(&table_id)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default();
        out.sort_unstable();
        out
    }

    /// Tables that have a set, in ascending order.
    pub fn table_ids(&self) -> Vec<TableId> {
        let mut out: Vec<TableId> = self.lock().sets.keys().copied().collect();
        out.sort_unstable();
        out
    }

    /// Calls `f` for each pinned offset in `[begin, end)`, in ascending order.
    ///
    /// The lock is released before `f` runs.
    ///
    /// # Panics
    /// Panics if no table is pinned.
    pub fn for_each_in_range(&self, begin: Offset, end: Offset, mut f: impl FnMut(Offset)) {
        let mut hits: Vec<Offset> = {
            let mut state = self.lock();
            state
                .pinned_set()
                .iter()
                .copied()
                .filter(|o| (begin..end).contains(o))
                .collect()
        };
        hits.sort_unstable();
        for offset in hits {
            f(offset);
        }
    }
}

impl GdsFrontier for SparseFrontier {
    fn pin_table_id(&self, table_id: TableId) {
        SparseFrontier::pin_table_id(self, table_id);
    }

    fn is_active(&self, offset: Offset) -> bool {
        self.contains(offset)
    }

    fn set_active(&self, offset: Offset) {
        self.add_node(offset);
    }
}
