//! Aggregation query engine.
//!
//! Filtering, grouping, ranking and distribution functions over an
//! immutable slice of sales records.

pub mod aggregator;
pub mod filter;
pub mod stats;

#[cfg(test)]
pub(crate) mod test_support;

pub use aggregator::*;
pub use filter::*;
pub use stats::*;
