//! Block ordering: fractional string keys and the ordered block chain.
//!
//! Keys are generated dense (`generate_between` always finds a key strictly
//! between two neighbors), so inserting a block never renumbers existing
//! siblings. The chain pairs a hash map with doubly-linked neighbor links:
//! O(1) anchored insert/remove, O(n) traversal in key order.

pub mod chain;
pub mod key;

pub use chain::{Chain, ChainError};
pub use key::{
    OrderError, OrderKey, generate_after, generate_before, generate_between, generate_initial,
};
