//! # urlchecker
//!
//! Probe a large list of catalog URLs in parallel, classify every failure
//! into a stable result code and mail one report per failure category and
//! record type.
//!
//! ## Organization
//!
//! - `core` - constants, error type and data model
//! - `config` - key=value configuration file
//! - `validation` - exclusion filter, HTTP probe, prober and classifier
//! - `pipeline` - partitioning, worker pool, work files and the full run
//! - `reporting` - collation into report cells and logging helpers
//! - `notify` - mailing list, mail transport and notifier
//! - `ui` - command-line parsing

pub mod config;
pub mod core;
pub mod notify;
pub mod pipeline;
pub mod reporting;
pub mod ui;
pub mod validation;

pub use crate::config::Config;
pub use crate::core::{CheckerError, ProbeResult, RecordType, Result, UrlRecord};
pub use crate::pipeline::{Pipeline, RunReport};
