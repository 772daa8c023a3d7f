//! # `halo-frontier` - Parallel Frontier Management
//!
//! The iteration substrate for node-frontier graph algorithms (breadth-first
//! search, shortest paths and their relatives). It tracks which nodes are active
//! in the current and the next traversal step, splits per-iteration scans into
//! morsels claimed by worker threads, and reconciles worker contributions into
//! the next frontier.
//!
//! ## Architecture
//!
//! Leaf to root:
//!
//! 1. **Morsel dispatch** ([`gds::FrontierMorselDispatcher`]):
//!    - Partitions `[0, N)` into contiguous morsels
//!    - A single `fetch_add` per claim; no locks, no waiting
//!
//! 2. **Sparse frontier** ([`gds::SparseFrontier`]):
//!    - Per-table offset sets behind a short-held lock
//!    - Disables itself for good once a set reaches the sample size
//!
//! 3. **Dense frontier** ([`gds::PathLengths`]):
//!    - One `AtomicU16` step count per node, allocated through [`FrontierAllocator`]
//!    - Current/next views are atomically swapped region indices
//!
//! 4. **Frontier pair** ([`gds::FrontierPair`]):
//!    - Owns the dense and sparse representations of current and next
//!    - Single or double dense backing ([`gds::SinglePathLengths`], [`gds::DoublePathLengths`])
//!    - Iteration boundaries take `&mut self`; compute phases share `&self`
//!
//! ## Concurrency model
//!
//! Workers never block on each other during an iteration. Dense writes are
//! lock-free and rely on the dispatcher handing out disjoint ranges; sparse
//! writes are folded in once per worker. The control thread regains exclusive
//! access between iterations, which is exactly when `begin_new_iteration` may run.
//!
//! ## Example
//!
//! ```rust
//! use halo_frontier::gds::FrontierMorselDispatcher;
//! use halo_frontier::FrontierConfig;
//!
//! let dispatcher = FrontierMorselDispatcher::new(&FrontierConfig::default().with_threads(4));
//! dispatcher.init(1000);
//! let mut claimed = 0;
//! while let Some(morsel) = dispatcher.get_next_range_morsel() {
//!     claimed += morsel.len();
//! }
//! assert_eq!(claimed, 1000);
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]

pub mod alloc;
pub mod concurrency;
pub mod config;
pub mod gds;
pub mod types;

pub use alloc::{AllocError, BudgetAllocator, FrontierAllocator, MemoryBuffer, SystemAllocator};
pub use config::FrontierConfig;
pub use types::{NodeId, NumNodesMap, Offset, TableId};

const _: () = {
    use core::mem;

    // Dense entries are read and written through `AtomicU16` views of raw regions.
    assert!(mem::size_of::<core::sync::atomic::AtomicU16>() == mem::size_of::<u16>());
    assert!(alloc::BUFFER_ALIGN % mem::align_of::<core::sync::atomic::AtomicU16>() == 0);
};
