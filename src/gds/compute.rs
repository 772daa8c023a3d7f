//! Vertex-compute capability and its morsel-parallel driver.

use crate::gds::morsel::FrontierMorselDispatcher;
use crate::types::{NumNodesMap, Offset, TableId};
use crate::FrontierConfig;

/// Per-node work that an algorithm runs over every table, one morsel at a time.
///
/// The driver keeps the instance it was handed for `begin_on_table` and gives
/// each worker its own [`VertexCompute::copy`], so worker-local state (scratch
/// buffers, local frontiers) needs no synchronization.
pub trait VertexCompute: Send {
    /// Called once per table before any morsel of it is processed.
    ///
    /// Returning `false` skips the table.
    fn begin_on_table(&mut self, table_id: TableId) -> bool;

    /// Processes offsets `[start, end)` of `table_id`.
    fn vertex_compute(&mut self, start: Offset, end: Offset, table_id: TableId);

    /// Called on a worker's copy after it has drained the dispatcher.
    fn finalize_worker(&mut self) {}

    /// Creates a worker copy.
    fn copy(&self) -> Self
    where
        Self: Sized;
}

/// Runs `vc` over every node of every table in `num_nodes_map`.
///
/// Tables are visited in ascending id order. For each accepted table, a
/// dispatcher is initialized over its node count and `config.max_threads`
/// workers pull morsels until it is exhausted. Returns once all workers of the
/// last table have finished.
pub fn run_vertex_compute<V: VertexCompute>(
    config: &FrontierConfig,
    num_nodes_map: &NumNodesMap,
    vc: &mut V,
) {
    let dispatcher = FrontierMorselDispatcher::new(config);
    for (&table_id, &num_nodes) in num_nodes_map {
        if !vc.begin_on_table(table_id) {
            tracing::trace!(table_id, "vertex compute skipped table");
            continue;
        }
        tracing::trace!(table_id, num_nodes, "vertex compute on table");
        dispatcher.init(num_nodes);
        // Workers own their copies, so `V` need not be `Sync`.
        let locals: Vec<V> = (0..config.max_threads).map(|_| vc.copy()).collect();
        run_workers(locals, &dispatcher, table_id);
    }
}

fn run_worker<V: VertexCompute>(
    mut local: V,
    dispatcher: &FrontierMorselDispatcher,
    table_id: TableId,
) {
    while let Some(morsel) = dispatcher.get_next_range_morsel() {
        local.vertex_compute(morsel.begin(), morsel.end(), table_id);
    }
    local.finalize_worker();
}

#[cfg(not(feature = "parallel"))]
fn run_workers<V: VertexCompute>(
    locals: Vec<V>,
    dispatcher: &FrontierMorselDispatcher,
    table_id: TableId,
) {
    std::thread::scope(|scope| {
        for local in locals {
            scope.spawn(move || run_worker(local, dispatcher, table_id));
        }
    });
}

#[cfg(feature = "parallel")]
fn run_workers<V: VertexCompute>(
    locals: Vec<V>,
    dispatcher: &FrontierMorselDispatcher,
    table_id: TableId,
) {
    rayon::scope(|scope| {
        for local in locals {
            scope.spawn(move |_| run_worker(local, dispatcher, table_id));
        }
    });
}
