//! Analysis components.
//!
//! Frequency aggregation, response/cohort grouping and the per-population
//! significance test. Everything here is pure computation over rows handed
//! in by the cohort reader.

pub mod aggregator;
pub mod grouper;
pub mod significance;

pub use aggregator::*;
pub use grouper::*;
pub use significance::*;
