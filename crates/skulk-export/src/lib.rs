//! Skulk Export - line-protocol export for the Alopex Skulk time series engine
//!
//! This crate turns typed value cursors produced by the storage engine into
//! line-protocol text for backup and export tooling.
//!
//! # Components
//!
//! - [`TextWriter`]: the export encoder, in series-key or point-value mode
//! - [`BucketFactory`] / [`BucketWriter`]: contracts for time-bucketed exports
//! - [`FileBucketFactory`]: one output file per time bucket
//! - [`Exporter`]: drives an in-memory [`Dataset`] through a factory
//!
//! # Example
//!
//! ```rust,ignore
//! use skulk_export::cursor::VecCursor;
//! use skulk_export::format::{BucketWriter, Mode, TextWriter};
//! use skulk_export::models::{DataType, Tags};
//!
//! let tags = Tags::from_pairs([("host", "server1")]);
//!
//! // Series keys
//! let mut keys = TextWriter::new(Vec::new(), Mode::Series);
//! keys.begin_series(b"cpu", b"usage_idle", DataType::Float, &tags);
//! keys.end_series();
//! BucketWriter::close(&mut keys)?;
//!
//! // Point values
//! let mut values = TextWriter::new(Vec::new(), Mode::Values);
//! values.begin_series(b"cpu", b"usage_idle", DataType::Float, &tags);
//! values.write_float_cursor(&mut VecCursor::new(vec![(1_000, 98.5)]));
//! values.end_series();
//! BucketWriter::close(&mut values)?;
//!
//! if let Some(err) = values.err() {
//!     eprintln!("export failed: {err}");
//! }
//! ```

#![deny(missing_docs)]

pub mod cursor;
pub mod error;
pub mod escape;
pub mod export;
pub mod format;
pub mod models;

pub use cursor::{ArrayCursor, TimestampArray, TypedCursor, VecCursor};
pub use error::{ExportError, Result};
pub use export::{Dataset, ExportConfig, ExportStats, Exporter, FieldValues, SeriesData};
pub use format::{
    BucketDuration, BucketFactory, BucketLayout, BucketWriter, FileBucketFactory, Mode,
    TextWriter, TextWriterConfig,
};
pub use models::{DataType, Tag, Tags, TimeRange, Timestamp};
