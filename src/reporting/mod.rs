//! Collation and logging
//!
//! This module turns result lines into per-category report cells and holds
//! the structured logging helpers used across a run.

pub mod collator;
pub mod logging;

// Re-export commonly used items
pub use collator::{Accumulator, Bucket, CollationStats, Collator};
