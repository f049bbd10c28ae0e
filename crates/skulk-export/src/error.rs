//! Error and Result types for Skulk export operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A convenience `Result` type for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// The error type for export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The sink rejected a line write. Latched by the encoder.
    #[error("Sink write failed: {0}")]
    SinkWrite(#[source] io::Error),

    /// Flushing the sink on close failed.
    #[error("Flush failed: {0}")]
    Flush(#[source] io::Error),

    /// The sink for a bucket could not be created.
    #[error("Failed to create bucket sink {}: {source}", path.display())]
    SinkCreate {
        /// Path of the sink that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A time range is empty or inverted.
    #[error("Invalid time range: [{start}, {end})")]
    InvalidTimeRange {
        /// Start timestamp (inclusive).
        start: i64,
        /// End timestamp (exclusive).
        end: i64,
    },

    /// A bucket finished with a latched write error.
    #[error("Bucket [{start}, {end}) failed: {reason}")]
    BucketFailed {
        /// Start timestamp of the bucket (inclusive).
        start: i64,
        /// End timestamp of the bucket (exclusive).
        end: i64,
        /// Rendered latched error.
        reason: String,
    },
}

impl ExportError {
    /// Returns true if this error was latched from a sink write.
    pub fn is_sink_write(&self) -> bool {
        matches!(self, Self::SinkWrite(_))
    }
}
