//! Node identifiers for a partitioned node space.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Identifier of a node table.
pub type TableId = u64;

/// Position of a node inside its table.
pub type Offset = u64;

/// Per-table node counts, as reported by the graph once per run.
///
/// Ordered so that per-table scans visit tables deterministically.
pub type NumNodesMap = BTreeMap<TableId, u64>;

/// A node address: the table it lives in plus its offset within that table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId {
    /// Owning table.
    pub table_id: TableId,
    /// Offset within the owning table.
    pub offset: Offset,
}

impl NodeId {
    /// Creates a node id.
    #[inline(always)]
    pub const fn new(table_id: TableId, offset: Offset) -> Self {
        Self { table_id, offset }
    }
}

impl core::fmt::Display for NodeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.table_id, self.offset)
    }
}
