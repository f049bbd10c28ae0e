//! Export driver.
//!
//! Walks a [`Dataset`] bucket by bucket and feeds each series/field pair
//! through a [`BucketFactory`]:
//!
//! ```text
//! for bucket in range:  new_bucket → (begin_series → write_cursor → end_series)* → close
//! factory.close()
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use skulk_export::export::{Dataset, ExportConfig, Exporter, FieldValues, SeriesData};
//! use skulk_export::format::{Mode, TextWriter};
//! use skulk_export::models::Tags;
//!
//! let mut dataset = Dataset::new();
//! dataset.push(SeriesData::new(
//!     "cpu",
//!     "usage_idle",
//!     Tags::from_pairs([("host", "server1")]),
//!     FieldValues::Float(vec![(1_000, 98.5)]),
//! ));
//!
//! let mut writer = TextWriter::new(std::io::stdout(), Mode::Values);
//! let stats = Exporter::new(ExportConfig::default()).run(&mut writer, &dataset)?;
//! ```

use crate::cursor::{TypedCursor, VecCursor, DEFAULT_BATCH_SIZE};
use crate::error::{ExportError, Result};
use crate::format::{BucketDuration, BucketFactory, BucketWriter};
use crate::models::{DataType, Tags, TimeRange, Timestamp};
use tracing::{debug, info, warn};

/// Configuration for an export run.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Time range to export.
    ///
    /// Default: `None`, the span of the dataset's points.
    pub range: Option<TimeRange>,

    /// Duration of each bucket.
    ///
    /// Default: one day.
    pub bucket_duration: BucketDuration,

    /// Maximum number of points per cursor batch.
    ///
    /// Default: 1000.
    pub batch_size: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            range: None,
            bucket_duration: BucketDuration::default(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl ExportConfig {
    /// Sets the time range to export.
    pub fn with_range(mut self, range: TimeRange) -> Self {
        self.range = Some(range);
        self
    }

    /// Sets the bucket duration.
    pub fn with_bucket_duration(mut self, duration: BucketDuration) -> Self {
        self.bucket_duration = duration;
        self
    }

    /// Sets the cursor batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

/// Points of one field, typed.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValues {
    /// Signed integer points.
    Integer(Vec<(Timestamp, i64)>),
    /// Float points.
    Float(Vec<(Timestamp, f64)>),
    /// Unsigned integer points.
    Unsigned(Vec<(Timestamp, u64)>),
    /// Boolean points.
    Boolean(Vec<(Timestamp, bool)>),
    /// Byte-string points.
    String(Vec<(Timestamp, Vec<u8>)>),
}

impl FieldValues {
    /// Returns the value type of the points.
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Integer(_) => DataType::Integer,
            Self::Float(_) => DataType::Float,
            Self::Unsigned(_) => DataType::Unsigned,
            Self::Boolean(_) => DataType::Boolean,
            Self::String(_) => DataType::String,
        }
    }

    /// Total number of points.
    pub fn len(&self) -> usize {
        match self {
            Self::Integer(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Unsigned(v) => v.len(),
            Self::Boolean(v) => v.len(),
            Self::String(v) => v.len(),
        }
    }

    /// Returns true if there are no points.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the smallest and largest timestamps, if there are points.
    pub fn bounds(&self) -> Option<(Timestamp, Timestamp)> {
        fn bounds_of<T>(points: &[(Timestamp, T)]) -> Option<(Timestamp, Timestamp)> {
            points.iter().fold(None, |acc, (ts, _)| match acc {
                None => Some((*ts, *ts)),
                Some((min, max)) => Some((min.min(*ts), max.max(*ts))),
            })
        }

        match self {
            Self::Integer(v) => bounds_of(v),
            Self::Float(v) => bounds_of(v),
            Self::Unsigned(v) => bounds_of(v),
            Self::Boolean(v) => bounds_of(v),
            Self::String(v) => bounds_of(v),
        }
    }

    /// Builds a cursor over the points that fall within `range`, in
    /// timestamp order. Points sharing a timestamp keep their input order.
    pub fn cursor(&self, range: TimeRange, batch_size: usize) -> FieldCursor {
        self.cursor_over(&self.slots_within(range), batch_size)
    }

    /// Returns `(timestamp, index)` for every point within `range`, sorted
    /// by timestamp.
    fn slots_within(&self, range: TimeRange) -> Vec<Slot> {
        fn slots<T>(points: &[(Timestamp, T)], range: TimeRange) -> Vec<Slot> {
            let mut slots: Vec<Slot> = points
                .iter()
                .enumerate()
                .filter(|(_, (ts, _))| range.contains(*ts))
                .map(|(index, (ts, _))| (*ts, index))
                .collect();
            slots.sort_by_key(|&(ts, _)| ts);
            slots
        }

        match self {
            Self::Integer(v) => slots(v, range),
            Self::Float(v) => slots(v, range),
            Self::Unsigned(v) => slots(v, range),
            Self::Boolean(v) => slots(v, range),
            Self::String(v) => slots(v, range),
        }
    }

    /// Builds a cursor over the points named by `slots`, which must come
    /// from `slots_within` on the same values.
    fn cursor_over(&self, slots: &[Slot], batch_size: usize) -> FieldCursor {
        fn pick<T: Clone>(points: &[(Timestamp, T)], slots: &[Slot]) -> Vec<(Timestamp, T)> {
            slots
                .iter()
                .filter_map(|&(_, index)| points.get(index).cloned())
                .collect()
        }

        match self {
            Self::Integer(v) => {
                FieldCursor::Integer(VecCursor::with_batch_size(pick(v, slots), batch_size))
            }
            Self::Float(v) => {
                FieldCursor::Float(VecCursor::with_batch_size(pick(v, slots), batch_size))
            }
            Self::Unsigned(v) => {
                FieldCursor::Unsigned(VecCursor::with_batch_size(pick(v, slots), batch_size))
            }
            Self::Boolean(v) => {
                FieldCursor::Boolean(VecCursor::with_batch_size(pick(v, slots), batch_size))
            }
            Self::String(v) => {
                FieldCursor::String(VecCursor::with_batch_size(pick(v, slots), batch_size))
            }
        }
    }
}

/// Timestamp and position of one point within its [`FieldValues`].
type Slot = (Timestamp, usize);

/// An owned in-memory cursor of one of the five value kinds.
#[derive(Debug)]
pub enum FieldCursor {
    /// Signed integer cursor.
    Integer(VecCursor<i64>),
    /// Float cursor.
    Float(VecCursor<f64>),
    /// Unsigned integer cursor.
    Unsigned(VecCursor<u64>),
    /// Boolean cursor.
    Boolean(VecCursor<bool>),
    /// Byte-string cursor.
    String(VecCursor<Vec<u8>>),
}

impl FieldCursor {
    /// Number of points not yet returned.
    pub fn remaining(&self) -> usize {
        match self {
            Self::Integer(c) => c.remaining(),
            Self::Float(c) => c.remaining(),
            Self::Unsigned(c) => c.remaining(),
            Self::Boolean(c) => c.remaining(),
            Self::String(c) => c.remaining(),
        }
    }

    /// Borrows the cursor as a [`TypedCursor`].
    pub fn as_typed(&mut self) -> TypedCursor<'_> {
        match self {
            Self::Integer(c) => TypedCursor::Integer(c),
            Self::Float(c) => TypedCursor::Float(c),
            Self::Unsigned(c) => TypedCursor::Unsigned(c),
            Self::Boolean(c) => TypedCursor::Boolean(c),
            Self::String(c) => TypedCursor::String(c),
        }
    }
}

/// One series/field pair with its points.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesData {
    /// Measurement name.
    pub name: Vec<u8>,
    /// Field key.
    pub field: Vec<u8>,
    /// Tag set.
    pub tags: Tags,
    /// Field points.
    pub values: FieldValues,
}

impl SeriesData {
    /// Creates a new series/field pair.
    pub fn new(
        name: impl Into<Vec<u8>>,
        field: impl Into<Vec<u8>>,
        tags: Tags,
        values: FieldValues,
    ) -> Self {
        Self {
            name: name.into(),
            field: field.into(),
            tags,
            values,
        }
    }
}

/// An in-memory collection of series to export.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    series: Vec<SeriesData>,
}

impl Dataset {
    /// Creates an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a series/field pair.
    pub fn push(&mut self, series: SeriesData) {
        self.series.push(series);
    }

    /// Returns the series in insertion order.
    pub fn series(&self) -> &[SeriesData] {
        &self.series
    }

    /// Number of series/field pairs.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Returns true if the dataset holds no series.
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Returns the smallest range covering every point, or `None` when the
    /// dataset holds no points.
    pub fn time_range(&self) -> Option<TimeRange> {
        let (min, max) = self
            .series
            .iter()
            .filter_map(|s| s.values.bounds())
            .reduce(|(a_min, a_max), (b_min, b_max)| (a_min.min(b_min), a_max.max(b_max)))?;
        Some(TimeRange::new(min, max.saturating_add(1)))
    }
}

impl FromIterator<SeriesData> for Dataset {
    fn from_iter<I: IntoIterator<Item = SeriesData>>(iter: I) -> Self {
        Self {
            series: iter.into_iter().collect(),
        }
    }
}

/// Summary of a completed export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportStats {
    /// Buckets opened.
    pub buckets: usize,
    /// Series/field pairs written, summed over buckets.
    pub series: usize,
    /// Points handed to the encoder.
    pub points: u64,
}

/// Points of one series still to be exported, in timestamp order.
struct PendingSeries<'a> {
    series: &'a SeriesData,
    slots: Vec<Slot>,
    position: usize,
}

impl<'a> PendingSeries<'a> {
    fn new(series: &'a SeriesData, range: TimeRange) -> Self {
        Self {
            series,
            slots: series.values.slots_within(range),
            position: 0,
        }
    }

    fn next_timestamp(&self) -> Option<Timestamp> {
        self.slots.get(self.position).map(|&(ts, _)| ts)
    }

    /// Consumes the pending points before `end`.
    fn take_before(&mut self, end: Timestamp) -> &[Slot] {
        let start = self.position;
        let taken = self.slots[start..].partition_point(|&(ts, _)| ts < end);
        self.position += taken;
        &self.slots[start..self.position]
    }
}

/// Drives an export through a [`BucketFactory`].
#[derive(Debug, Clone, Default)]
pub struct Exporter {
    config: ExportConfig,
}

impl Exporter {
    /// Creates an exporter with the given configuration.
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Exports `dataset` bucket by bucket and closes the factory.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured range is empty, a bucket cannot be
    /// created, a bucket latches a write error, or a flush fails.
    pub fn run<F: BucketFactory>(&self, factory: &mut F, dataset: &Dataset) -> Result<ExportStats> {
        let range = match self.config.range {
            Some(range) if range.is_empty() => {
                return Err(ExportError::InvalidTimeRange {
                    start: range.start,
                    end: range.end,
                });
            }
            Some(range) => range,
            // A dataset without points gets an empty range and no buckets.
            None => dataset.time_range().unwrap_or(TimeRange::new(0, 0)),
        };
        let mut pending: Vec<PendingSeries<'_>> = dataset
            .series()
            .iter()
            .map(|series| PendingSeries::new(series, range))
            .filter(|p| p.next_timestamp().is_some())
            .collect();
        let mut buckets = self.config.bucket_duration.buckets(range);

        let mut stats = ExportStats::default();
        // Buckets holding no points are skipped without being opened.
        while let Some(next_ts) = pending.iter().filter_map(|p| p.next_timestamp()).min() {
            buckets.seek(next_ts);
            let Some(bucket_range) = buckets.next() else {
                break;
            };
            let mut bucket = factory.new_bucket(bucket_range)?;
            stats.buckets += 1;

            for series in &mut pending {
                let data = series.series;
                let slots = series.take_before(bucket_range.end);
                if slots.is_empty() {
                    continue;
                }
                let mut cursor = data.values.cursor_over(slots, self.config.batch_size);

                bucket.begin_series(&data.name, &data.field, data.values.data_type(), &data.tags);
                bucket.write_cursor(cursor.as_typed());
                bucket.end_series();
                stats.series += 1;
                stats.points += slots.len() as u64;
            }

            if let Some(err) = bucket.err() {
                let reason = err.to_string();
                // The latched error takes precedence over any flush error.
                if let Err(flush_err) = bucket.close() {
                    warn!(
                        start = bucket_range.start,
                        end = bucket_range.end,
                        error = %flush_err,
                        "Discarding flush error of failed bucket"
                    );
                }
                return Err(ExportError::BucketFailed {
                    start: bucket_range.start,
                    end: bucket_range.end,
                    reason,
                });
            }
            bucket.close()?;
            debug!(start = bucket_range.start, end = bucket_range.end, "Exported bucket");
        }

        factory.close()?;
        info!(
            buckets = stats.buckets,
            series = stats.series,
            points = stats.points,
            "Export complete"
        );
        Ok(stats)
    }
}
