//! Analysis modules.
//!
//! Aggregation of feedback records into per-request statistics, plus the
//! fixed vocabularies it matches against.

pub mod aggregator;
pub mod vocabulary;

pub use aggregator::*;
