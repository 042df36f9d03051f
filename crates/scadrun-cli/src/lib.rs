//! Scadrun Batch Export Engine
//!
//! This crate provides the execution side of scadrun: the external-tool
//! executor, the sequential/concurrent dispatcher, the batch report, and the
//! CSV/JSON parameter-file converters. The `scadrun` binary is a thin clap
//! layer over [`batch_export`] and the converters.

pub mod convert;
pub mod dispatcher;
pub mod executor;
pub mod report;

pub use dispatcher::{batch_export, BatchConfig, BatchError, BatchRunner, ExportOptions};
pub use executor::{ExportTool, InvocationSpec, OpenScadTool};
pub use report::BatchReport;
