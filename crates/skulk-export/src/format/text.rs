//! Line-protocol text encoder.
//!
//! [`TextWriter`] renders typed cursors as line-protocol text in one of two
//! modes:
//!
//! ```text
//! Mode::Series   cpu,host=server1 usage_idle
//! Mode::Values   98.5 1700000000000000000
//! ```
//!
//! The first failed write is latched: every later call becomes a no-op and
//! no further bytes reach the sink. The latched error is available from
//! [`BucketWriter::err`]. Flush errors from `close` are reported directly
//! and never touch the latch.

use crate::cursor::ArrayCursor;
use crate::error::{ExportError, Result};
use crate::escape;
use crate::format::number;
use crate::format::{BucketFactory, BucketWriter, Mode};
use crate::models::{self, DataType, Tags, TimeRange};
use std::io::{self, BufWriter, Write};
use tracing::{debug, warn};

/// Default capacity of the buffered sink in bytes.
pub const DEFAULT_BUFFER_CAPACITY: usize = 4096;

/// Default initial capacity of the scratch buffer in bytes.
pub const DEFAULT_SCRATCH_CAPACITY: usize = 1024;

/// Configuration for a [`TextWriter`].
#[derive(Debug, Clone)]
pub struct TextWriterConfig {
    /// Capacity of the `BufWriter` wrapped around the sink.
    pub buffer_capacity: usize,
    /// Initial capacity of the scratch buffer used for keys and lines.
    pub scratch_capacity: usize,
}

impl Default for TextWriterConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            scratch_capacity: DEFAULT_SCRATCH_CAPACITY,
        }
    }
}

impl TextWriterConfig {
    /// Sets the sink buffer capacity.
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Sets the initial scratch buffer capacity.
    pub fn with_scratch_capacity(mut self, capacity: usize) -> Self {
        self.scratch_capacity = capacity;
        self
    }
}

/// A value that can be rendered as a line-protocol field value.
pub trait LineValue {
    /// Appends the encoded value to `dst`.
    fn append_value(&self, dst: &mut Vec<u8>);
}

impl LineValue for i64 {
    fn append_value(&self, dst: &mut Vec<u8>) {
        number::append_int(dst, *self);
        dst.push(b'i');
    }
}

impl LineValue for u64 {
    fn append_value(&self, dst: &mut Vec<u8>) {
        number::append_uint(dst, *self);
        dst.push(b'u');
    }
}

impl LineValue for f64 {
    fn append_value(&self, dst: &mut Vec<u8>) {
        number::append_float(dst, *self);
    }
}

impl LineValue for bool {
    fn append_value(&self, dst: &mut Vec<u8>) {
        number::append_bool(dst, *self);
    }
}

impl LineValue for Vec<u8> {
    fn append_value(&self, dst: &mut Vec<u8>) {
        dst.push(b'"');
        escape::append_string_field(dst, self);
        dst.push(b'"');
    }
}

/// Line-protocol encoder over a buffered sink.
pub struct TextWriter<W: Write> {
    sink: BufWriter<W>,
    /// Reused for every series key and every value line.
    scratch: Vec<u8>,
    err: Option<ExportError>,
    mode: Mode,
    lines_written: u64,
}

impl<W: Write> TextWriter<W> {
    /// Creates a writer with the default configuration.
    pub fn new(sink: W, mode: Mode) -> Self {
        Self::with_config(sink, mode, TextWriterConfig::default())
    }

    /// Creates a writer with a custom configuration.
    pub fn with_config(sink: W, mode: Mode, config: TextWriterConfig) -> Self {
        Self::from_parts(
            BufWriter::with_capacity(config.buffer_capacity, sink),
            mode,
            config.scratch_capacity,
        )
    }

    /// Creates a writer over an already buffered sink without re-wrapping it.
    pub fn from_buffered(sink: BufWriter<W>, mode: Mode) -> Self {
        Self::from_parts(sink, mode, DEFAULT_SCRATCH_CAPACITY)
    }

    fn from_parts(sink: BufWriter<W>, mode: Mode, scratch_capacity: usize) -> Self {
        Self {
            sink,
            scratch: Vec::with_capacity(scratch_capacity),
            err: None,
            mode,
            lines_written: 0,
        }
    }

    /// Returns the output mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Number of lines accepted by the sink so far.
    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    /// Returns a reference to the underlying sink.
    pub fn get_ref(&self) -> &W {
        self.sink.get_ref()
    }

    /// Flushes and returns the underlying sink.
    pub fn into_inner(self) -> Result<W> {
        self.sink
            .into_inner()
            .map_err(|e| ExportError::Flush(e.into_error()))
    }

    fn latch(&mut self, err: io::Error) {
        warn!(
            lines_written = self.lines_written,
            error = %err,
            "Sink write failed, discarding remaining output"
        );
        self.err = Some(ExportError::SinkWrite(err));
    }

    /// Writes the scratch buffer as one record, latching on failure.
    fn write_scratch(&mut self) -> bool {
        match self.sink.write_all(&self.scratch) {
            Ok(()) => {
                self.lines_written += 1;
                true
            }
            Err(err) => {
                self.latch(err);
                false
            }
        }
    }

    fn drain<T: LineValue>(&mut self, cursor: &mut dyn ArrayCursor<T>) {
        if self.err.is_some() || self.mode == Mode::Series {
            return;
        }

        loop {
            let batch = cursor.next();
            if batch.is_empty() {
                break;
            }
            for (ts, value) in batch.timestamps.iter().zip(&batch.values) {
                self.scratch.clear();
                value.append_value(&mut self.scratch);
                self.scratch.push(b' ');
                number::append_int(&mut self.scratch, *ts);
                self.scratch.push(b'\n');
                if !self.write_scratch() {
                    return;
                }
            }
        }
    }
}

impl<W: Write> BucketWriter for TextWriter<W> {
    fn err(&self) -> Option<&ExportError> {
        self.err.as_ref()
    }

    fn begin_series(&mut self, name: &[u8], field: &[u8], _typ: DataType, tags: &Tags) {
        if self.err.is_some() || self.mode == Mode::Values {
            return;
        }

        self.scratch.clear();
        models::append_series_key(&mut self.scratch, name, tags);
        self.scratch.push(b' ');
        escape::append_field_key(&mut self.scratch, field);
        self.scratch.push(b'\n');
        self.write_scratch();
    }

    fn end_series(&mut self) {}

    fn write_integer_cursor(&mut self, cursor: &mut dyn ArrayCursor<i64>) {
        self.drain(cursor);
    }

    fn write_float_cursor(&mut self, cursor: &mut dyn ArrayCursor<f64>) {
        self.drain(cursor);
    }

    fn write_unsigned_cursor(&mut self, cursor: &mut dyn ArrayCursor<u64>) {
        self.drain(cursor);
    }

    fn write_boolean_cursor(&mut self, cursor: &mut dyn ArrayCursor<bool>) {
        self.drain(cursor);
    }

    fn write_string_cursor(&mut self, cursor: &mut dyn ArrayCursor<Vec<u8>>) {
        self.drain(cursor);
    }

    fn close(&mut self) -> Result<()> {
        debug!(lines_written = self.lines_written, "Closing text writer");
        self.sink.flush().map_err(ExportError::Flush)
    }
}

/// A text writer is its own single bucket; the bounds are ignored.
impl<W: Write> BucketFactory for TextWriter<W> {
    type Bucket<'a> = &'a mut TextWriter<W> where Self: 'a;

    fn new_bucket(&mut self, range: TimeRange) -> Result<Self::Bucket<'_>> {
        debug!(start = range.start, end = range.end, "Reusing text writer for bucket");
        Ok(self)
    }

    fn close(&mut self) -> Result<()> {
        BucketWriter::close(self)
    }
}
