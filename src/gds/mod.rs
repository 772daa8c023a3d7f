//! Frontier substrate for iterative graph algorithms (BFS, shortest paths, ...).
//!
//! - [`morsel`]: lock-free partitioning of a table's offsets into worker morsels.
//! - [`sparse`]: set-backed frontier for small active sets.
//! - [`path_lengths`]: array-backed frontier with one step count per node.
//! - [`pair`]: current/next frontier pair and the iteration protocol.
//! - [`compute`]: vertex-compute capability and its parallel driver.
//! - [`mask`]: target node masks.
//! - [`termination`]: shortest-path early termination.

pub mod compute;
pub mod mask;
pub mod morsel;
pub mod pair;
pub mod path_lengths;
pub mod sparse;
pub mod termination;

pub use compute::{run_vertex_compute, VertexCompute};
pub use mask::{NodeMaskMap, NodeOffsetMaskMap, OffsetBitMask, OffsetMask};
pub use morsel::{FrontierMorsel, FrontierMorselDispatcher};
pub use pair::{
    DenseBacking, DoublePathLengths, DoublePathLengthsFrontierPair, FrontierPair,
    NextFrontierWriter, SinglePathLengths, SinglePathLengthsFrontierPair,
};
pub use path_lengths::{PathLengths, PathLengthsInitVertexCompute};
pub use sparse::SparseFrontier;
pub use termination::ShortestPathTermination;

use crate::types::{Offset, TableId};

/// The set of active nodes per table, addressed through a pinned table.
pub trait GdsFrontier: Send + Sync {
    /// Makes `table_id` the target of later calls.
    fn pin_table_id(&self, table_id: TableId);

    /// Whether `offset` of the pinned table is active.
    fn is_active(&self, offset: Offset) -> bool;

    /// Marks `offset` of the pinned table active.
    fn set_active(&self, offset: Offset);
}
