#![allow(dead_code)]

use core::sync::atomic::Ordering;

use halo_frontier::concurrency::AtomicBitset;
use halo_frontier::gds::{
    run_vertex_compute, DenseBacking, DoublePathLengths, FrontierPair, NextFrontierWriter,
    PathLengths, SinglePathLengths, VertexCompute,
};
use halo_frontier::{FrontierConfig, NodeId, NumNodesMap, Offset, SystemAllocator, TableId};

pub const TABLE: TableId = 0;

/// Single-table adjacency lists.
pub struct Graph {
    pub adjacency: Vec<Vec<u64>>,
}

impl Graph {
    pub fn line(n: u64) -> Self {
        let adjacency = (0..n)
            .map(|i| if i + 1 < n { vec![i + 1] } else { Vec::new() })
            .collect();
        Self { adjacency }
    }

    /// A ring plus `degree` pseudo-random edges per node.
    pub fn synthetic(n: u64, degree: usize, seed: u64) -> Self {
        let mut x = seed;
        let adjacency = (0..n)
            .map(|i| {
                let mut out = vec![(i + 1) % n];
                for _ in 0..degree {
                    x = x
                        .wrapping_mul(6_364_136_223_846_793_005)
                        .wrapping_add(1_442_695_040_888_963_407);
                    out.push((x >> 33) % n);
                }
                out
            })
            .collect();
        Self { adjacency }
    }

    pub fn len(&self) -> u64 {
        self.adjacency.len() as u64
    }

    pub fn num_nodes_map(&self) -> NumNodesMap {
        [(TABLE, self.len())].into_iter().collect()
    }

    pub fn edges(&self) -> Vec<(u32, u32)> {
        self.adjacency
            .iter()
            .enumerate()
            .flat_map(|(u, vs)| vs.iter().map(move |&v| (u as u32, v as u32)))
            .collect()
    }
}

pub fn config(threads: usize, sample_size: usize) -> FrontierConfig {
    FrontierConfig {
        max_threads: threads,
        min_frontier_morsel_size: 16,
        min_number_of_frontier_morsels: 1,
        sparse_sample_size: sample_size,
        ..FrontierConfig::default()
    }
}

pub fn single_pair(graph: &Graph, config: &FrontierConfig) -> FrontierPair<SinglePathLengths> {
    let pl = PathLengths::get_frontier(
        config,
        &graph.num_nodes_map(),
        &SystemAllocator,
        PathLengths::UNVISITED,
    )
    .unwrap();
    FrontierPair::new(SinglePathLengths::new(pl), config)
}

pub fn double_pair(graph: &Graph, config: &FrontierConfig) -> FrontierPair<DoublePathLengths> {
    let map = graph.num_nodes_map();
    let a = PathLengths::get_frontier(config, &map, &SystemAllocator, PathLengths::UNVISITED)
        .unwrap();
    let b = PathLengths::get_frontier(config, &map, &SystemAllocator, PathLengths::UNVISITED)
        .unwrap();
    FrontierPair::new(DoublePathLengths::new(a, b), config)
}

/// One BFS expansion step: every current-frontier node marks its unvisited neighbors.
pub struct BfsStep<'a, B: DenseBacking> {
    pair: &'a FrontierPair<B>,
    graph: &'a Graph,
    visited: &'a AtomicBitset,
    writer: NextFrontierWriter<'a, B>,
}

impl<'a, B: DenseBacking> BfsStep<'a, B> {
    pub fn new(pair: &'a FrontierPair<B>, graph: &'a Graph, visited: &'a AtomicBitset) -> Self {
        Self {
            pair,
            graph,
            visited,
            writer: pair.next_frontier_writer(),
        }
    }
}

impl<B: DenseBacking> VertexCompute for BfsStep<'_, B> {
    fn begin_on_table(&mut self, table_id: TableId) -> bool {
        self.pair.begin_frontier_compute_between_tables(table_id, table_id);
        true
    }

    fn vertex_compute(&mut self, start: Offset, end: Offset, table_id: TableId) {
        let Self {
            pair,
            graph,
            visited,
            writer,
        } = self;
        pair.for_each_cur_active(start, end, |u| {
            for &v in &graph.adjacency[u as usize] {
                if visited.test_and_set(v as usize, Ordering::Relaxed) {
                    writer.add_active(NodeId::new(table_id, v));
                }
            }
        });
    }

    fn finalize_worker(&mut self) {
        self.writer.flush();
    }

    fn copy(&self) -> Self {
        Self::new(self.pair, self.graph, self.visited)
    }
}

/// Outcome of a BFS driven through a frontier pair.
pub struct BfsRun {
    /// `levels[k]`: sorted offsets of the current frontier in iteration `k + 1`.
    pub levels: Vec<Vec<u64>>,
    /// Iterations whose current frontier was sparse.
    pub sparse_iterations: usize,
}

/// Runs BFS from `source`, checking at every iteration that the sparse set, the
/// dense entries and the policy scan agree on the current frontier.
pub fn run_bfs<B: DenseBacking>(
    pair: &mut FrontierPair<B>,
    graph: &Graph,
    config: &FrontierConfig,
    source: u64,
    max_iter: u16,
) -> BfsRun {
    let n = graph.len();
    let map = graph.num_nodes_map();
    let visited = AtomicBitset::new(n as usize);
    visited.test_and_set(source as usize, Ordering::Relaxed);
    pair.init_source(NodeId::new(TABLE, source));

    let mut levels = Vec::new();
    let mut sparse_iterations = 0;
    while pair.continue_next_iter(max_iter) {
        pair.begin_new_iteration();
        pair.pin_cur_frontier(TABLE);

        let dense: Vec<u64> = (0..n).filter(|&o| pair.is_active(o)).collect();
        if pair.is_cur_frontier_sparse() {
            assert_eq!(
                pair.cur_sparse_frontier().offsets(TABLE),
                dense,
                "sparse and dense disagree at iteration {}",
                pair.current_iter()
            );
            sparse_iterations += 1;
        }
        let mut scanned = Vec::new();
        pair.for_each_cur_active(0, n, |o| scanned.push(o));
        assert_eq!(scanned, dense);
        levels.push(dense);

        let mut step = BfsStep::new(pair, graph, &visited);
        run_vertex_compute(config, &map, &mut step);
    }
    BfsRun {
        levels,
        sparse_iterations,
    }
}

/// BFS levels from petgraph's unit-weight Dijkstra.
pub fn reference_levels(graph: &Graph, source: u64) -> Vec<Vec<u64>> {
    use petgraph::graph::{DiGraph, NodeIndex};

    let g = DiGraph::<(), ()>::from_edges(graph.edges());
    let dist = petgraph::algo::dijkstra(&g, NodeIndex::new(source as usize), None, |_| 1u32);
    let depth = dist.values().copied().max().unwrap_or(0) as usize;
    let mut levels = vec![Vec::new(); depth + 1];
    for (node, d) in dist {
        levels[d as usize].push(node.index() as u64);
    }
    for level in &mut levels {
        level.sort_unstable();
    }
    levels
}
