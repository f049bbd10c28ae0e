//! Export output formats and the bucket contracts they implement.
//!
//! An export driver obtains a [`BucketWriter`] for each time bucket from a
//! [`BucketFactory`], then for every series/field pair calls
//! [`BucketWriter::begin_series`], zero or more typed cursor writes, and
//! [`BucketWriter::end_series`]. Write failures are latched by the bucket and
//! surface through [`BucketWriter::err`]; `close` reports flush failures
//! directly.

pub mod layout;
pub mod number;
pub mod text;

use crate::cursor::{ArrayCursor, TypedCursor};
use crate::error::{ExportError, Result};
use crate::models::{DataType, Tags, TimeRange};

pub use layout::{BucketDuration, BucketLayout, Buckets, FileBucketFactory};
pub use text::{TextWriter, TextWriterConfig};

/// Output mode, fixed for the lifetime of an encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Emit one series key line per `begin_series`, no point values.
    #[default]
    Series,
    /// Emit one `<value> <timestamp>` line per point, no series keys.
    Values,
}

/// Sink for the series of one export bucket.
pub trait BucketWriter {
    /// Returns the first latched write error, if any.
    fn err(&self) -> Option<&ExportError>;

    /// Starts a new series/field pair.
    fn begin_series(&mut self, name: &[u8], field: &[u8], typ: DataType, tags: &Tags);

    /// Ends the current series/field pair.
    fn end_series(&mut self);

    /// Drains a signed integer cursor.
    fn write_integer_cursor(&mut self, cursor: &mut dyn ArrayCursor<i64>);

    /// Drains a float cursor.
    fn write_float_cursor(&mut self, cursor: &mut dyn ArrayCursor<f64>);

    /// Drains an unsigned integer cursor.
    fn write_unsigned_cursor(&mut self, cursor: &mut dyn ArrayCursor<u64>);

    /// Drains a boolean cursor.
    fn write_boolean_cursor(&mut self, cursor: &mut dyn ArrayCursor<bool>);

    /// Drains a byte-string cursor.
    fn write_string_cursor(&mut self, cursor: &mut dyn ArrayCursor<Vec<u8>>);

    /// Dispatches a typed cursor to the matching write method.
    fn write_cursor(&mut self, cursor: TypedCursor<'_>) {
        match cursor {
            TypedCursor::Integer(c) => self.write_integer_cursor(c),
            TypedCursor::Float(c) => self.write_float_cursor(c),
            TypedCursor::Unsigned(c) => self.write_unsigned_cursor(c),
            TypedCursor::Boolean(c) => self.write_boolean_cursor(c),
            TypedCursor::String(c) => self.write_string_cursor(c),
        }
    }

    /// Flushes buffered output.
    fn close(&mut self) -> Result<()>;
}

impl<B: BucketWriter + ?Sized> BucketWriter for &mut B {
    fn err(&self) -> Option<&ExportError> {
        (**self).err()
    }

    fn begin_series(&mut self, name: &[u8], field: &[u8], typ: DataType, tags: &Tags) {
        (**self).begin_series(name, field, typ, tags)
    }

    fn end_series(&mut self) {
        (**self).end_series()
    }

    fn write_integer_cursor(&mut self, cursor: &mut dyn ArrayCursor<i64>) {
        (**self).write_integer_cursor(cursor)
    }

    fn write_float_cursor(&mut self, cursor: &mut dyn ArrayCursor<f64>) {
        (**self).write_float_cursor(cursor)
    }

    fn write_unsigned_cursor(&mut self, cursor: &mut dyn ArrayCursor<u64>) {
        (**self).write_unsigned_cursor(cursor)
    }

    fn write_boolean_cursor(&mut self, cursor: &mut dyn ArrayCursor<bool>) {
        (**self).write_boolean_cursor(cursor)
    }

    fn write_string_cursor(&mut self, cursor: &mut dyn ArrayCursor<Vec<u8>>) {
        (**self).write_string_cursor(cursor)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Partitions an export into time-bounded buckets.
///
/// Implementations may hand back the same writer for every bucket or a
/// fresh writer bound to a new sink per bucket. The latter may fail when
/// the sink cannot be created.
pub trait BucketFactory {
    /// Writer handed out for a bucket.
    type Bucket<'a>: BucketWriter
    where
        Self: 'a;

    /// Returns the writer for the bucket covering `range`.
    fn new_bucket(&mut self, range: TimeRange) -> Result<Self::Bucket<'_>>;

    /// Finishes the export, flushing any shared sink.
    fn close(&mut self) -> Result<()>;
}
