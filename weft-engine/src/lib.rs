//! The Weft weaving pipeline.
//!
//! Walks configured roots, extracts declarations and their markers,
//! computes the delta against the last persisted run, resolves aspect
//! rules into a weave set, and materializes proxy artifacts once per
//! fleet of concurrently booting workers, not once per worker.

pub mod matcher;
pub mod scanner;
pub mod tracker;

pub use scanner::{ScanCoordinator, ScanOutput, ScanStats};
