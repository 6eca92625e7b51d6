//! The export pipeline: fetch, decode, normalize, classify, persist.
//!
//! Runs single threaded. Records are processed in the order the repository
//! yields them; aggregates are written once traversal has finished.

pub mod aggregate;
pub mod driver;
pub mod sink;

pub use aggregate::{classify, Aggregator, TYPE_FIELD, UNKNOWN_TYPE};
pub use driver::{DecodePolicy, Pipeline, PipelineOptions, RunReport, Stage};
pub use sink::{aggregate_file_name, FsSink};
