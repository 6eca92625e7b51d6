/// CBOR value model, decoder, encoder and key normalization.
pub mod codec;
/// Layered run settings.
pub mod config;
/// Logging setup (formatting, filters, sinks).
pub mod logging;
/// Export pipeline: driver, aggregation, filesystem sink.
pub mod pipeline;
/// Archive reading: CAR files, commits, Merkle search trees, identities.
pub mod repo;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// Value trees and their conversions.
pub use codec::{decode, encode, normalize, Document, Value};
/// Settings.
pub use config::Settings;
/// Pipeline entry points.
pub use pipeline::{DecodePolicy, Pipeline, PipelineOptions, RunReport};
/// Repository access.
pub use repo::{ArchiveReader, Blockstore, CarReader, Did, Repository, SignedCommit};
/// Error types.
pub use repodump_error::{RepodumpResult, StackError, StatusCode};
