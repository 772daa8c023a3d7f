//! Array-backed frontier storing one `u16` step count per node.
//!
//! # Entry encoding
//!
//! Every table owns a region of `num_nodes` `AtomicU16` entries. `UNVISITED`
//! (`u16::MAX`) is the only "not reached" value; any other value is the iteration
//! at which the node was set active in the next frontier. The current frontier
//! therefore consists of the entries equal to `cur_iter - 1`.
//!
//! The "current" and "next" views are two atomically swapped indices into the
//! per-table region array, so re-pinning never copies data and the hot path never
//! touches a map.

use core::sync::atomic::{AtomicU16, AtomicUsize, Ordering};

use super::compute::{run_vertex_compute, VertexCompute};
use super::GdsFrontier;
use crate::alloc::{AllocError, FrontierAllocator, MemoryBuffer};
use crate::types::{NodeId, NumNodesMap, Offset, TableId};
use crate::FrontierConfig;

const UNPINNED: usize = usize::MAX;

/// Dense per-table frontier with step counts.
pub struct PathLengths {
    num_nodes_map: NumNodesMap,
    // Sorted, parallel to `regions`.
    tables: Vec<TableId>,
    regions: Vec<MemoryBuffer>,
    cur_frontier: AtomicUsize,
    next_frontier: AtomicUsize,
    cur_iter: AtomicU16,
}

impl PathLengths {
    /// Entry value of a node that has not been reached.
    pub const UNVISITED: u16 = u16::MAX;

    /// Allocates one zeroed region per table of `num_nodes_map`.
    ///
    /// Entries start at `0`; use [`PathLengths::get_frontier`] for a frontier whose
    /// entries all hold a chosen initial value.
    ///
    /// # Errors
    /// Returns the allocator's `AllocError` for the first table that cannot be served.
    pub fn new(
        num_nodes_map: NumNodesMap,
        allocator: &(impl FrontierAllocator + ?Sized),
    ) -> Result<Self, AllocError> {
        let entry_width = core::mem::size_of::<AtomicU16>();
        let mut tables = Vec::with_capacity(num_nodes_map.len());
        let mut regions = Vec::with_capacity(num_nodes_map.len());
        for (&table_id, &num_nodes) in &num_nodes_map {
            let size = usize::try_from(num_nodes)
                .ok()
                .and_then(|n| n.checked_mul(entry_width))
                .ok_or(AllocError::new(usize::MAX))?;
            regions.push(allocator.allocate(size)?);
            tables.push(table_id);
        }
        Ok(Self {
            num_nodes_map,
            tables,
            regions,
            cur_frontier: AtomicUsize::new(UNPINNED),
            next_frontier: AtomicUsize::new(UNPINNED),
            cur_iter: AtomicU16::new(0),
        })
    }

    /// Allocates a frontier for `num_nodes_map` and writes `initial_value` into every
    /// entry, using the morsel-parallel vertex-compute driver.
    ///
    /// # Errors
    /// Propagates allocation failure.
    pub fn get_frontier(
        config: &FrontierConfig,
        num_nodes_map: &NumNodesMap,
        allocator: &(impl FrontierAllocator + ?Sized),
        initial_value: u16,
    ) -> Result<Self, AllocError> {
        let path_lengths = Self::new(num_nodes_map.clone(), allocator)?;
        let mut init = PathLengthsInitVertexCompute::new(&path_lengths, initial_value);
        run_vertex_compute(config, num_nodes_map, &mut init);
        Ok(path_lengths)
    }

    /// Per-table node counts this frontier was sized for.
    pub fn num_nodes_map(&self) -> &NumNodesMap {
        &self.num_nodes_map
    }

    fn table_index(&self, table_id: TableId) -> usize {
        match self.tables.binary_search(&table_id) {
            Ok(idx) => idx,
            Err(_) => panic!("table {table_id} has no dense frontier region"),
        }
    }

    /// Points the current view at `table_id`'s region.
    ///
    /// # Panics
    /// Panics if the table is unknown.
    pub fn pin_cur_frontier_table_id(&self, table_id: TableId) {
        self.cur_frontier.store(self.table_index(table_id), Ordering::Release);
    }

    /// Points the next view at `table_id`'s region.
    ///
    /// # Panics
    /// Panics if the table is unknown.
    pub fn pin_next_frontier_table_id(&self, table_id: TableId) {
        self.next_frontier.store(self.table_index(table_id), Ordering::Release);
    }

    /// Table behind the current view.
    pub fn cur_table_id(&self) -> Option<TableId> {
        self.tables.get(self.cur_frontier.load(Ordering::Acquire)).copied()
    }

    /// Table behind the next view.
    pub fn next_table_id(&self) -> Option<TableId> {
        self.tables.get(self.next_frontier.load(Ordering::Acquire)).copied()
    }

    #[inline(always)]
    fn view(&self, slot: &AtomicUsize) -> &[AtomicU16] {
        let idx = slot.load(Ordering::Acquire);
        assert!(idx != UNPINNED, "dense frontier accessed with no table pinned");
        self.regions[idx].as_atomic_u16()
    }

    /// Entries of the table pinned as current.
    ///
    /// # Panics
    /// Panics if no table is pinned as current.
    #[inline(always)]
    pub fn cur_frontier(&self) -> &[AtomicU16] {
        self.view(&self.cur_frontier)
    }

    /// Entries of the table pinned as next.
    ///
    /// # Panics
    /// Panics if no table is pinned as next.
    #[inline(always)]
    pub fn next_frontier(&self) -> &[AtomicU16] {
        self.view(&self.next_frontier)
    }

    /// Iteration value written by `set_active`.
    #[inline(always)]
    pub fn cur_iter(&self) -> u16 {
        self.cur_iter.load(Ordering::Acquire)
    }

    /// Advances the iteration value.
    ///
    /// # Panics
    /// Panics if the counter would collide with `UNVISITED`.
    pub fn increment_cur_iter(&self) {
        let prev = self.cur_iter.fetch_add(1, Ordering::AcqRel);
        assert!(prev + 1 < Self::UNVISITED, "iteration counter exhausted at {prev}");
    }

    /// Whether the current-view entry at `offset` was set in the previous iteration.
    #[inline(always)]
    pub fn is_active(&self, offset: Offset) -> bool {
        let iter = self.cur_iter();
        iter != 0 && self.cur_frontier()[offset as usize].load(Ordering::Relaxed) == iter - 1
    }

    /// Marks `offset` of the next view as reached in this iteration.
    ///
    /// Concurrent writers must target disjoint offsets or write the same value.
    #[inline(always)]
    pub fn set_active(&self, offset: Offset) {
        self.next_frontier()[offset as usize].store(self.cur_iter(), Ordering::Relaxed);
    }

    /// Marks `offset` of the next view only if it is still `UNVISITED`.
    ///
    /// Returns `true` if this call made the transition.
    #[inline(always)]
    pub fn try_set_active(&self, offset: Offset) -> bool {
        self.next_frontier()[offset as usize]
            .compare_exchange(
                Self::UNVISITED,
                self.cur_iter(),
                Ordering::Relaxed,
                Ordering::Relaxed,
            )
            .is_ok()
    }

    fn assert_next_table(&self, node: NodeId) {
        let pinned = self.next_table_id();
        assert!(
            pinned == Some(node.table_id),
            "node {node} is not in the pinned next table {pinned:?}"
        );
    }

    /// Like `set_active`, checking that `node` belongs to the pinned next table.
    ///
    /// # Panics
    /// Panics on a table mismatch.
    pub fn set_active_node(&self, node: NodeId) {
        self.assert_next_table(node);
        self.set_active(node.offset);
    }

    /// `set_active_node` for a batch.
    pub fn set_active_nodes(&self, nodes: &[NodeId]) {
        for &node in nodes {
            self.set_active_node(node);
        }
    }

    /// Like `try_set_active`, checking that `node` belongs to the pinned next table.
    pub fn try_set_active_node(&self, node: NodeId) -> bool {
        self.assert_next_table(node);
        self.try_set_active(node.offset)
    }

    /// Snapshot of one table's entries; `None` for `UNVISITED`.
    ///
    /// Independent of the pinned views.
    pub fn path_lengths(&self, table_id: TableId) -> Vec<Option<u16>> {
        self.regions[self.table_index(table_id)]
            .as_atomic_u16()
            .iter()
            .map(|e| match e.load(Ordering::Relaxed) {
                Self::UNVISITED => None,
                v => Some(v),
            })
            .collect()
    }
}

impl GdsFrontier for PathLengths {
    fn pin_table_id(&self, table_id: TableId) {
        self.pin_cur_frontier_table_id(table_id);
        self.pin_next_frontier_table_id(table_id);
    }

    fn is_active(&self, offset: Offset) -> bool {
        PathLengths::is_active(self, offset)
    }

    fn set_active(&self, offset: Offset) {
        PathLengths::set_active(self, offset);
    }
}

impl core::fmt::Debug for PathLengths {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PathLengths")
            .field("num_nodes_map", &self.num_nodes_map)
            .field("cur_table", &self.cur_table_id())
            .field("next_table", &self.next_table_id())
            .field("cur_iter", &self.cur_iter())
            .finish()
    }
}

/// Vertex compute that writes one value into every entry of a [`PathLengths`].
#[derive(Debug, Clone, Copy)]
pub struct PathLengthsInitVertexCompute<'a> {
    path_lengths: &'a PathLengths,
    val: u16,
}

impl<'a> PathLengthsInitVertexCompute<'a> {
    /// Creates the initializer.
    pub fn new(path_lengths: &'a PathLengths, val: u16) -> Self {
        Self { path_lengths, val }
    }
}

impl VertexCompute for PathLengthsInitVertexCompute<'_> {
    fn begin_on_table(&mut self, table_id: TableId) -> bool {
        self.path_lengths.pin_table_id(table_id);
        true
    }

    fn vertex_compute(&mut self, start: Offset, end: Offset, _table_id: TableId) {
        let frontier = self.path_lengths.cur_frontier();
        for entry in &frontier[start as usize..end as usize] {
            entry.store(self.val, Ordering::Relaxed);
        }
    }

    fn copy(&self) -> Self {
        *self
    }
}
