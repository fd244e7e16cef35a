//! URL probing logic
//!
//! This module turns work batches into probe results: exclusion filtering,
//! the HTTP probe seam, the two-stage prober and failure classification.

pub mod classifier;
pub mod exclusion;
pub mod probe;
pub mod prober;

// Re-export commonly used items
pub use classifier::classify;
pub use exclusion::ExclusionSet;
pub use probe::{HttpProbe, ProbeResponse, ReqwestProbe, TransportFailure};
pub use prober::{BatchStats, Prober};
