//! Node masks: externally supplied target sets, e.g. shortest-path destinations.

use std::collections::BTreeMap;

use core::sync::atomic::Ordering;

use crate::concurrency::AtomicBitset;
use crate::types::{NodeId, Offset, TableId};

/// Membership test over one table's offsets.
pub trait OffsetMask {
    /// Whether `offset` is part of the mask.
    fn is_masked(&self, offset: Offset) -> bool;
}

/// A set of masked nodes spread over several tables.
pub trait NodeOffsetMaskMap {
    /// Mask type for a single table.
    type Mask: OffsetMask + ?Sized;

    /// Whether the map has a mask for `table_id`.
    fn contains_table_id(&self, table_id: TableId) -> bool;

    /// The mask of `table_id`.
    ///
    /// # Panics
    /// Implementations panic if `contains_table_id(table_id)` is `false`.
    fn offset_mask(&self, table_id: TableId) -> &Self::Mask;

    /// Total number of masked nodes over all tables.
    fn num_masked_nodes(&self) -> u64;
}

/// Bitset-backed [`OffsetMask`].
#[derive(Debug)]
pub struct OffsetBitMask {
    bits: AtomicBitset,
}

impl OffsetBitMask {
    /// Creates an empty mask over `num_nodes` offsets.
    pub fn new(num_nodes: u64) -> Self {
        Self {
            bits: AtomicBitset::new(num_nodes as usize),
        }
    }

    /// Adds `offset` to the mask; returns `true` if it was not masked before.
    pub fn mask(&self, offset: Offset) -> bool {
        self.bits.test_and_set(offset as usize, Ordering::Relaxed)
    }

    /// Number of masked offsets.
    pub fn count(&self) -> u64 {
        self.bits.count_ones() as u64
    }
}

impl OffsetMask for OffsetBitMask {
    fn is_masked(&self, offset: Offset) -> bool {
        self.bits.is_set(offset as usize)
    }
}

/// Per-table bitset masks.
#[derive(Debug, Default)]
pub struct NodeMaskMap {
    masks: BTreeMap<TableId, OffsetBitMask>,
}

impl NodeMaskMap {
    /// Creates a map with no tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an empty mask for `table_id`, replacing any existing one.
    pub fn add_table(&mut self, table_id: TableId, num_nodes: u64) {
        self.masks.insert(table_id, OffsetBitMask::new(num_nodes));
    }

    /// Masks `node`; returns `true` if it was not masked before.
    ///
    /// # Panics
    /// Panics if the node's table was never added or the offset is out of range.
    pub fn mask(&self, node: NodeId) -> bool {
        self.offset_mask(node.table_id).mask(node.offset)
    }
}

impl NodeOffsetMaskMap for NodeMaskMap {
    type Mask = OffsetBitMask;

    fn contains_table_id(&self, table_id: TableId) -> bool {
        self.masks.contains_key(&table_id)
    }

    fn offset_mask(&self, table_id: TableId) -> &OffsetBitMask {
        match self.masks.get(&table_id) {
            Some(mask) => mask,
            None => panic!("no mask for table {table_id}"),
        }
    }

    fn num_masked_nodes(&self) -> u64 {
        self.masks.values().map(OffsetBitMask::count).sum()
    }
}
