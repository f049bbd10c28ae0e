//! Typed, batch-producing value cursors.
//!
//! A cursor yields [`TimestampArray`] batches for exactly one value type.
//! A batch of length zero signals the end of the stream. Cursors are
//! single-pass and cannot be rewound.

use crate::models::{DataType, Timestamp};

/// Default maximum number of points per batch.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// A batch of parallel timestamp/value sequences.
#[derive(Debug, Clone, PartialEq)]
pub struct TimestampArray<T> {
    /// Timestamps in nanoseconds.
    pub timestamps: Vec<Timestamp>,
    /// Values, one per timestamp.
    pub values: Vec<T>,
}

impl<T> Default for TimestampArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimestampArray<T> {
    /// Creates an empty array.
    pub fn new() -> Self {
        Self {
            timestamps: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Creates an empty array with room for `capacity` points.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            timestamps: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    /// Number of points in the batch.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Returns true if the batch holds no points.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Appends a point.
    pub fn push(&mut self, ts: Timestamp, value: T) {
        self.timestamps.push(ts);
        self.values.push(value);
    }

    /// Removes all points, keeping the allocated capacity.
    pub fn clear(&mut self) {
        self.timestamps.clear();
        self.values.clear();
    }
}

/// Array of signed integer values.
pub type IntegerArray = TimestampArray<i64>;
/// Array of float values.
pub type FloatArray = TimestampArray<f64>;
/// Array of unsigned integer values.
pub type UnsignedArray = TimestampArray<u64>;
/// Array of boolean values.
pub type BooleanArray = TimestampArray<bool>;
/// Array of byte-string values.
pub type StringArray = TimestampArray<Vec<u8>>;

/// A forward-only source of timestamped values of one type.
pub trait ArrayCursor<T> {
    /// Returns the next batch. A zero-length batch ends the stream.
    fn next(&mut self) -> &TimestampArray<T>;
}

/// In-memory cursor over owned points.
///
/// Yields batches of at most `batch_size` points, reusing one batch
/// allocation across calls.
#[derive(Debug)]
pub struct VecCursor<T> {
    timestamps: Vec<Timestamp>,
    values: Vec<T>,
    position: usize,
    batch_size: usize,
    batch: TimestampArray<T>,
}

impl<T: Clone> VecCursor<T> {
    /// Creates a cursor over the given points with the default batch size.
    pub fn new(points: Vec<(Timestamp, T)>) -> Self {
        Self::with_batch_size(points, DEFAULT_BATCH_SIZE)
    }

    /// Creates a cursor yielding at most `batch_size` points per batch.
    ///
    /// A `batch_size` of zero is treated as one.
    pub fn with_batch_size(points: Vec<(Timestamp, T)>, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        let (timestamps, values): (Vec<Timestamp>, Vec<T>) = points.into_iter().unzip();
        let batch = TimestampArray::with_capacity(batch_size.min(timestamps.len()));
        Self {
            timestamps,
            values,
            position: 0,
            batch_size,
            batch,
        }
    }

    /// Number of points not yet returned.
    pub fn remaining(&self) -> usize {
        self.timestamps.len() - self.position
    }
}

impl<T: Clone> ArrayCursor<T> for VecCursor<T> {
    fn next(&mut self) -> &TimestampArray<T> {
        self.batch.clear();
        let end = self.position + self.batch_size.min(self.remaining());
        self.batch
            .timestamps
            .extend_from_slice(&self.timestamps[self.position..end]);
        self.batch
            .values
            .extend_from_slice(&self.values[self.position..end]);
        self.position = end;
        &self.batch
    }
}

/// A borrowed cursor of one of the five supported value kinds.
pub enum TypedCursor<'a> {
    /// Signed integer cursor.
    Integer(&'a mut dyn ArrayCursor<i64>),
    /// Float cursor.
    Float(&'a mut dyn ArrayCursor<f64>),
    /// Unsigned integer cursor.
    Unsigned(&'a mut dyn ArrayCursor<u64>),
    /// Boolean cursor.
    Boolean(&'a mut dyn ArrayCursor<bool>),
    /// Byte-string cursor.
    String(&'a mut dyn ArrayCursor<Vec<u8>>),
}

impl TypedCursor<'_> {
    /// Returns the value type produced by this cursor.
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Integer(_) => DataType::Integer,
            Self::Float(_) => DataType::Float,
            Self::Unsigned(_) => DataType::Unsigned,
            Self::Boolean(_) => DataType::Boolean,
            Self::String(_) => DataType::String,
        }
    }
}
