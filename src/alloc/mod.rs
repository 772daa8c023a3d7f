//! Allocation capability for frontier buffers.
//!
//! Frontiers never allocate their large per-table regions directly; they ask a
//! [`FrontierAllocator`] so that the embedding engine can account for or limit
//! query memory.

pub mod allocator;

pub use allocator::{
    AllocError, BudgetAllocator, FrontierAllocator, MemoryBuffer, SystemAllocator, BUFFER_ALIGN,
};
