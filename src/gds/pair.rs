//! Current/next frontier pair driving one iterative graph algorithm.
//!
//! A [`FrontierPair`] owns a dense ground truth ([`PathLengths`], one or two of
//! them depending on the [`DenseBacking`]) plus sparse accelerators describing
//! the same logical sets. Workers share `&FrontierPair` during an iteration and
//! only ever write the *next* frontier. Iteration boundaries take `&mut self`,
//! so the borrow checker guarantees no worker is mid-morsel when frontiers are
//! swapped.
//!
//! ```rust
//! use halo_frontier::gds::{FrontierPair, PathLengths, SinglePathLengths};
//! use halo_frontier::{FrontierConfig, NodeId, NumNodesMap, SystemAllocator};
//!
//! let config = FrontierConfig::default().with_threads(2);
//! let nodes: NumNodesMap = [(0, 3)].into_iter().collect();
//! let pl = PathLengths::get_frontier(&config, &nodes, &SystemAllocator, PathLengths::UNVISITED)
//!     .unwrap();
//! let mut pair = FrontierPair::new(SinglePathLengths::new(pl), &config);
//!
//! pair.init_source(NodeId::new(0, 0));
//! while pair.continue_next_iter(2) {
//!     pair.begin_new_iteration();
//!     pair.begin_frontier_compute_between_tables(0, 0);
//!     let mut writer = pair.next_frontier_writer();
//!     pair.for_each_cur_active(0, 3, |u| writer.add_active(NodeId::new(0, u + 1)));
//! }
//! assert_eq!(pair.current_iter(), 2);
//! ```

use std::sync::{Mutex, PoisonError};

use core::sync::atomic::{AtomicBool, Ordering};

use super::path_lengths::PathLengths;
use super::sparse::SparseFrontier;
use super::GdsFrontier;
use crate::types::{NodeId, Offset, TableId};
use crate::FrontierConfig;

/// How a [`FrontierPair`] stores its dense current and next frontiers.
pub trait DenseBacking: Send + Sync {
    /// Dense frontier read by the current iteration.
    fn cur(&self) -> &PathLengths;
    /// Dense frontier written by the current iteration.
    fn next(&self) -> &PathLengths;
    /// Pins `table_id` for reads from the current frontier.
    fn pin_cur(&self, table_id: TableId);
    /// Pins `table_id` for writes to the next frontier.
    fn pin_next(&self, table_id: TableId);
    /// Representation-specific part of an iteration boundary.
    fn begin_new_iteration(&mut self);
}

/// One [`PathLengths`] serves as both current and next frontier.
///
/// Entries record the step at which each node was first reached, so after the
/// run the backing holds the full path-length result.
#[derive(Debug)]
pub struct SinglePathLengths {
    path_lengths: PathLengths,
}

impl SinglePathLengths {
    /// Wraps an initialized frontier.
    pub fn new(path_lengths: PathLengths) -> Self {
        Self { path_lengths }
    }

    /// The backing frontier.
    pub fn path_lengths(&self) -> &PathLengths {
        &self.path_lengths
    }

    /// Releases the backing frontier.
    pub fn into_inner(self) -> PathLengths {
        self.path_lengths
    }
}

impl DenseBacking for SinglePathLengths {
    fn cur(&self) -> &PathLengths {
        &self.path_lengths
    }

    fn next(&self) -> &PathLengths {
        &self.path_lengths
    }

    fn pin_cur(&self, table_id: TableId) {
        self.path_lengths.pin_cur_frontier_table_id(table_id);
    }

    fn pin_next(&self, table_id: TableId) {
        self.path_lengths.pin_next_frontier_table_id(table_id);
    }

    fn begin_new_iteration(&mut self) {
        self.path_lengths.increment_cur_iter();
    }
}

/// Two [`PathLengths`] that trade the current and next roles every iteration.
///
/// Each array only holds the iterations in which it served as the next frontier,
/// so neither is a visited set. [`NextFrontierWriter::try_add_active`] checks the
/// next array only and can claim a node that was reached two iterations earlier.
/// Algorithms that need each node reached once keep their own visited set.
#[derive(Debug)]
pub struct DoublePathLengths {
    cur: PathLengths,
    next: PathLengths,
}

impl DoublePathLengths {
    /// Wraps two initialized frontiers sized for the same tables.
    ///
    /// # Panics
    /// Panics if the node-count maps differ.
    pub fn new(cur: PathLengths, next: PathLengths) -> Self {
        assert!(
            cur.num_nodes_map() == next.num_nodes_map(),
            "double dense frontiers must cover the same tables"
        );
        Self { cur, next }
    }

    /// Releases the frontiers as `(cur, next)`.
    pub fn into_inner(self) -> (PathLengths, PathLengths) {
        (self.cur, self.next)
    }
}

impl DenseBacking for DoublePathLengths {
    fn cur(&self) -> &PathLengths {
        &self.cur
    }

    fn next(&self) -> &PathLengths {
        &self.next
    }

    fn pin_cur(&self, table_id: TableId) {
        self.cur.pin_table_id(table_id);
    }

    fn pin_next(&self, table_id: TableId) {
        self.next.pin_table_id(table_id);
    }

    fn begin_new_iteration(&mut self) {
        core::mem::swap(&mut self.cur, &mut self.next);
        self.cur.increment_cur_iter();
        self.next.increment_cur_iter();
    }
}

/// Current/next frontiers with a single dense backing.
pub type SinglePathLengthsFrontierPair = FrontierPair<SinglePathLengths>;
/// Current/next frontiers with two alternating dense backings.
pub type DoublePathLengthsFrontierPair = FrontierPair<DoublePathLengths>;

/// Current and next frontier of one algorithm run.
///
/// `merge_lock` makes the enabled checks and the merge in
/// [`FrontierPair::merge_local_frontier`] one step with respect to other workers.
#[derive(Debug)]
pub struct FrontierPair<B: DenseBacking> {
    dense: B,
    cur_sparse: SparseFrontier,
    next_sparse: SparseFrontier,
    vertex_compute_candidates: SparseFrontier,
    sample_size: usize,
    cur_iter: u16,
    has_active_nodes_for_next_iter: AtomicBool,
    merge_lock: Mutex<()>,
}

impl<B: DenseBacking> FrontierPair<B> {
    /// Creates a pair at iteration 0 with empty sparse frontiers.
    pub fn new(dense: B, config: &FrontierConfig) -> Self {
        let sample_size = config.sparse_sample_size;
        Self {
            dense,
            cur_sparse: SparseFrontier::new(sample_size),
            next_sparse: SparseFrontier::new(sample_size),
            vertex_compute_candidates: SparseFrontier::new(sample_size),
            sample_size,
            cur_iter: 0,
            has_active_nodes_for_next_iter: AtomicBool::new(false),
            merge_lock: Mutex::new(()),
        }
    }

    /// Seeds the next frontier with `source` and pins both representations to its table.
    pub fn init_source(&mut self, source: NodeId) {
        self.dense.pin_next(source.table_id);
        self.dense.next().set_active_node(source);
        self.next_sparse.pin_table_id(source.table_id);
        self.next_sparse.add_node(source.offset);
        self.has_active_nodes_for_next_iter.store(true, Ordering::Release);
    }

    /// Moves to the next iteration: the next frontier becomes current and a new,
    /// empty next frontier starts.
    ///
    /// The outgoing next sparse frontier is also folded into the vertex-compute
    /// candidates.
    pub fn begin_new_iteration(&mut self) {
        self.cur_iter += 1;
        self.has_active_nodes_for_next_iter.store(false, Ordering::Release);
        self.vertex_compute_candidates.merge_sparse_frontier(&self.next_sparse);
        core::mem::swap(&mut self.cur_sparse, &mut self.next_sparse);
        self.next_sparse.reset_state();
        self.dense.begin_new_iteration();
        tracing::debug!(
            iteration = self.cur_iter,
            sparse = self.cur_sparse.enabled(),
            "frontier iteration started"
        );
    }

    /// Whether another iteration should run: some node was marked for it and
    /// fewer than `max_iter` iterations have started.
    pub fn continue_next_iter(&self, max_iter: u16) -> bool {
        self.has_active_nodes_for_next_iter.load(Ordering::Acquire) && self.cur_iter < max_iter
    }

    /// Number of iterations started so far.
    pub fn current_iter(&self) -> u16 {
        self.cur_iter
    }

    /// Pins `table_id` for reads from the current frontier, dense and sparse.
    pub fn pin_cur_frontier(&self, table_id: TableId) {
        self.dense.pin_cur(table_id);
        self.cur_sparse.pin_table_id(table_id);
    }

    /// Pins `table_id` for writes to the next frontier, dense and sparse.
    pub fn pin_next_frontier(&self, table_id: TableId) {
        self.dense.pin_next(table_id);
        self.next_sparse.pin_table_id(table_id);
    }

    /// Prepares a scan that reads `cur_table_id` and writes `next_table_id`.
    pub fn begin_frontier_compute_between_tables(
        &self,
        cur_table_id: TableId,
        next_table_id: TableId,
    ) {
        self.pin_cur_frontier(cur_table_id);
        self.pin_next_frontier(next_table_id);
    }

    /// Records that the next iteration has work.
    #[inline]
    pub fn set_active_nodes_for_next_iter(&self) {
        if !self.has_active_nodes_for_next_iter.load(Ordering::Relaxed) {
            self.has_active_nodes_for_next_iter.store(true, Ordering::Release);
        }
    }

    /// Marks `node` active in the next frontier.
    ///
    /// The node is recorded in the next sparse frontier under the merge lock.
    /// Workers adding many nodes should prefer a [`NextFrontierWriter`], which
    /// batches the sparse side.
    ///
    /// # Panics
    /// Panics if `node` is not in the table pinned as next.
    pub fn add_node_to_next_dense_frontier(&self, node: NodeId) {
        self.add_nodes_to_next_dense_frontier(core::slice::from_ref(&node));
    }

    /// Batch form of [`FrontierPair::add_node_to_next_dense_frontier`].
    ///
    /// # Panics
    /// Panics if a node is not in the table pinned as next.
    pub fn add_nodes_to_next_dense_frontier(&self, nodes: &[NodeId]) {
        if nodes.is_empty() {
            return;
        }
        self.dense.next().set_active_nodes(nodes);
        self.set_active_nodes_for_next_iter();
        if !self.next_sparse.enabled() {
            return;
        }
        let local = SparseFrontier::new(self.sample_size);
        local.pin_table_id(nodes[0].table_id);
        local.add_nodes(nodes);
        local.check_sample_size();
        self.merge_local_frontier(&local);
    }

    /// Folds a worker-local sparse accumulation into the next sparse frontier.
    ///
    /// A disabled local frontier disables the next frontier; once the next frontier
    /// is disabled, merges are ignored.
    pub fn merge_local_frontier(&self, local: &SparseFrontier) {
        let _guard = self.merge_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.next_sparse.enabled() {
            return;
        }
        if !local.enabled() {
            self.next_sparse.disable();
            return;
        }
        self.next_sparse.merge_local_frontier(local);
    }

    /// Whether the current frontier is tracked sparsely this iteration.
    pub fn is_cur_frontier_sparse(&self) -> bool {
        self.cur_sparse.enabled()
    }

    /// Whether `offset` of the pinned current table is active. Reads the dense ground truth.
    #[inline]
    pub fn is_active(&self, offset: Offset) -> bool {
        self.dense.cur().is_active(offset)
    }

    /// Calls `f` for every active offset of the pinned current table in `[begin, end)`.
    ///
    /// Walks the sparse set while the current frontier is sparse and scans the
    /// dense entries otherwise. Both yield the same offsets in ascending order.
    pub fn for_each_cur_active(&self, begin: Offset, end: Offset, mut f: impl FnMut(Offset)) {
        if self.is_cur_frontier_sparse() {
            self.cur_sparse.for_each_in_range(begin, end, f);
        } else {
            let cur = self.dense.cur();
            for offset in begin..end {
                if cur.is_active(offset) {
                    f(offset);
                }
            }
        }
    }

    /// A worker-local writer for the next frontier.
    pub fn next_frontier_writer(&self) -> NextFrontierWriter<'_, B> {
        NextFrontierWriter {
            pair: self,
            local: SparseFrontier::new(self.sample_size),
        }
    }

    /// The dense backing.
    pub fn dense(&self) -> &B {
        &self.dense
    }

    /// Releases the dense backing, e.g. to read path lengths after the run.
    pub fn into_dense(self) -> B {
        self.dense
    }

    /// Dense frontier read by the current iteration.
    pub fn cur_dense_frontier(&self) -> &PathLengths {
        self.dense.cur()
    }

    /// Dense frontier written by the current iteration.
    pub fn next_dense_frontier(&self) -> &PathLengths {
        self.dense.next()
    }

    /// Sparse view of the current frontier.
    pub fn cur_sparse_frontier(&self) -> &SparseFrontier {
        &self.cur_sparse
    }

    /// Sparse view of the next frontier.
    pub fn next_sparse_frontier(&self) -> &SparseFrontier {
        &self.next_sparse
    }

    /// Union of every frontier that has become current so far, while it stays sparse.
    ///
    /// Tells algorithms which nodes are worth revisiting without a full table scan.
    pub fn vertex_compute_candidates(&self) -> &SparseFrontier {
        &self.vertex_compute_candidates
    }
}

/// Worker-side writer for the next frontier.
///
/// Dense entries are written immediately. Sparse entries are collected in a
/// local set and merged into the pair once, on [`NextFrontierWriter::flush`] or
/// drop, instead of taking the shared lock per node.
#[derive(Debug)]
pub struct NextFrontierWriter<'a, B: DenseBacking> {
    pair: &'a FrontierPair<B>,
    local: SparseFrontier,
}

impl<B: DenseBacking> NextFrontierWriter<'_, B> {
    fn record_sparse(&mut self, node: NodeId) {
        if !self.local.enabled() {
            return;
        }
        if self.local.pinned_table_id() != Some(node.table_id) {
            self.local.pin_table_id(node.table_id);
        }
        self.local.add_node(node.offset);
        self.local.check_sample_size();
    }

    /// Marks `node` active in the next frontier.
    ///
    /// # Panics
    /// Panics if `node` is not in the table pinned as next.
    pub fn add_active(&mut self, node: NodeId) {
        self.pair.dense.next().set_active_node(node);
        self.pair.set_active_nodes_for_next_iter();
        self.record_sparse(node);
    }

    /// Marks `node` active only if its next-frontier entry is still unvisited.
    ///
    /// Returns `true` if this call claimed the node.
    pub fn try_add_active(&mut self, node: NodeId) -> bool {
        if !self.pair.next_dense_frontier().try_set_active_node(node) {
            return false;
        }
        self.pair.set_active_nodes_for_next_iter();
        self.record_sparse(node);
        true
    }

    /// Merges the local sparse accumulation into the pair and starts over.
    pub fn flush(&mut self) {
        self.pair.merge_local_frontier(&self.local);
        if self.local.enabled() {
            self.local.reset_state();
        }
    }
}

impl<B: DenseBacking> Drop for NextFrontierWriter<'_, B> {
    fn drop(&mut self) {
        self.flush();
    }
}
