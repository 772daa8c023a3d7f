//! Lock-free building blocks shared by frontiers, masks and traversals.

pub mod bitset;

pub use bitset::AtomicBitset;
