//! Early termination for shortest-path style algorithms.

use super::mask::{NodeOffsetMaskMap, OffsetMask};
use super::pair::{DenseBacking, FrontierPair};
use crate::FrontierConfig;

/// Stops a run once every masked target has appeared in a current frontier.
///
/// Each call scans the current dense frontier once and adds the masked nodes it
/// finds to a running total. A node is active in exactly one iteration, so no node
/// is counted twice. Target sets larger than the threshold are never scanned:
/// reaching all of them early is unlikely enough that the scan costs more than it
/// saves.
#[derive(Debug, Clone)]
pub struct ShortestPathTermination {
    threshold: u64,
    num_nodes_reached: u64,
}

impl ShortestPathTermination {
    /// Creates a check that skips target sets larger than `threshold`.
    pub const fn new(threshold: u64) -> Self {
        Self {
            threshold,
            num_nodes_reached: 0,
        }
    }

    /// Creates a check using `config.early_termination_threshold`.
    pub fn from_config(config: &FrontierConfig) -> Self {
        Self::new(config.early_termination_threshold)
    }

    /// Targets found in current frontiers so far.
    pub fn num_nodes_reached(&self) -> u64 {
        self.num_nodes_reached
    }

    /// Returns `true` once all masked targets have been reached.
    ///
    /// Call once per iteration, after its compute phase. Re-pins the current
    /// dense frontier table by table.
    pub fn terminate<B, M>(&mut self, pair: &FrontierPair<B>, mask_map: &M) -> bool
    where
        B: DenseBacking,
        M: NodeOffsetMaskMap,
    {
        let target_num_nodes = mask_map.num_masked_nodes();
        if target_num_nodes > self.threshold {
            return false;
        }
        let frontier = pair.cur_dense_frontier();
        for (&table_id, &num_nodes) in frontier.num_nodes_map() {
            if !mask_map.contains_table_id(table_id) {
                continue;
            }
            frontier.pin_cur_frontier_table_id(table_id);
            let offset_mask = mask_map.offset_mask(table_id);
            self.num_nodes_reached += (0..num_nodes)
                .filter(|&offset| frontier.is_active(offset) && offset_mask.is_masked(offset))
                .count() as u64;
        }
        let done = self.num_nodes_reached == target_num_nodes;
        if done {
            tracing::debug!(
                iteration = pair.current_iter(),
                targets = target_num_nodes,
                "all targets reached, terminating early"
            );
        }
        done
    }
}
