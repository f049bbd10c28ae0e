//! Time bucket layout and the file-per-bucket factory.
//!
//! Buckets are aligned to a fixed duration with floor division, so
//! pre-epoch timestamps land in the bucket that starts at or before them.
//! Each bucket written by [`FileBucketFactory`] gets its own file:
//!
//! ```text
//! <dir>/1970-01-01/03/10800000000000_14400000000000.lp   (hourly)
//! <dir>/1970-01-02/86400000000000_172800000000000.lp     (daily, custom)
//! ```

use crate::error::{ExportError, Result};
use crate::format::text::{TextWriter, TextWriterConfig};
use crate::format::{BucketFactory, Mode};
use crate::models::{TimeRange, Timestamp};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Extension of bucket files.
pub const BUCKET_FILE_EXTENSION: &str = "lp";

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Bucket durations.
///
/// # Examples
/// ```rust,ignore
/// use skulk_export::format::BucketDuration;
/// use skulk_export::models::TimeRange;
///
/// let hour = BucketDuration::Hourly.as_nanos();
/// let buckets: Vec<_> = BucketDuration::Hourly
///     .buckets(TimeRange::new(hour / 2, 2 * hour))
///     .collect();
/// assert_eq!(buckets, vec![TimeRange::new(hour / 2, hour), TimeRange::new(hour, 2 * hour)]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BucketDuration {
    /// One-hour buckets.
    Hourly,
    /// One-day buckets.
    #[default]
    Daily,
    /// Buckets of an arbitrary non-zero duration.
    Custom(Duration),
}

impl BucketDuration {
    /// Returns the duration in nanoseconds, saturating at `i64::MAX`.
    pub fn as_nanos(self) -> i64 {
        i64::try_from(self.as_duration().as_nanos()).unwrap_or(i64::MAX)
    }

    /// Returns the duration as `Duration`.
    pub fn as_duration(self) -> Duration {
        match self {
            Self::Hourly => Duration::from_secs(3600),
            Self::Daily => Duration::from_secs(86_400),
            Self::Custom(duration) => duration,
        }
    }

    /// Iterates over the buckets overlapping `range`, each clipped to it.
    ///
    /// Yields nothing for an empty range or a zero duration.
    pub fn buckets(self, range: TimeRange) -> Buckets {
        Buckets::new(range, self.as_nanos())
    }
}

/// Lazy iterator over aligned buckets, returned by [`BucketDuration::buckets`].
#[derive(Debug, Clone)]
pub struct Buckets {
    range: TimeRange,
    duration_nanos: i64,
    next_start: Option<Timestamp>,
}

impl Buckets {
    fn new(range: TimeRange, duration_nanos: i64) -> Self {
        let next_start = (!range.is_empty() && duration_nanos > 0)
            .then(|| align_timestamp(range.start, duration_nanos));
        Self {
            range,
            duration_nanos,
            next_start,
        }
    }

    /// Skips ahead so the next bucket yielded is the one containing
    /// `timestamp`. Never moves backwards.
    pub fn seek(&mut self, timestamp: Timestamp) {
        if let Some(start) = self.next_start {
            let target = align_timestamp(timestamp, self.duration_nanos);
            if target > start {
                self.next_start = Some(target);
            }
        }
    }
}

impl Iterator for Buckets {
    type Item = TimeRange;

    fn next(&mut self) -> Option<TimeRange> {
        while let Some(start) = self.next_start {
            if start >= self.range.end {
                self.next_start = None;
                break;
            }
            // A saturated end is i64::MAX, which is never below range.end.
            let end = start.saturating_add(self.duration_nanos);
            self.next_start = Some(end);
            if let Some(bucket) = TimeRange::new(start, end).intersect(&self.range) {
                return Some(bucket);
            }
        }
        None
    }
}

/// Provides filesystem paths for bucket files.
///
/// # Examples
/// ```rust,ignore
/// use skulk_export::format::{BucketDuration, BucketLayout};
/// use skulk_export::models::TimeRange;
///
/// let layout = BucketLayout::new("/export", BucketDuration::Hourly);
/// let path = layout.bucket_file_path(&TimeRange::new(0, 3_600_000_000_000));
/// // /export/1970-01-01/00/0_3600000000000.lp
/// ```
#[derive(Debug, Clone)]
pub struct BucketLayout {
    /// Root output directory.
    output_dir: PathBuf,
    /// Bucket duration.
    duration: BucketDuration,
}

impl BucketLayout {
    /// Creates a new layout for the given directory and duration.
    pub fn new(output_dir: impl AsRef<Path>, duration: BucketDuration) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            duration,
        }
    }

    /// Returns the root output directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Returns the bucket duration.
    pub fn duration(&self) -> BucketDuration {
        self.duration
    }

    /// Returns the directory holding the bucket that starts at `timestamp`.
    pub fn bucket_dir_for(&self, timestamp: Timestamp) -> PathBuf {
        let (year, month, day, hour) = timestamp_to_ymdh(timestamp);
        let day_dir = self
            .output_dir
            .join(format!("{:04}-{:02}-{:02}", year, month, day));
        match self.duration {
            BucketDuration::Hourly => day_dir.join(format!("{:02}", hour)),
            BucketDuration::Daily | BucketDuration::Custom(_) => day_dir,
        }
    }

    /// Builds the file path for a bucket.
    pub fn bucket_file_path(&self, range: &TimeRange) -> PathBuf {
        self.bucket_dir_for(range.start).join(format!(
            "{}_{}.{}",
            range.start, range.end, BUCKET_FILE_EXTENSION
        ))
    }
}

/// Creates one text writer, bound to a fresh file, per bucket.
#[derive(Debug)]
pub struct FileBucketFactory {
    layout: BucketLayout,
    mode: Mode,
    config: TextWriterConfig,
    files: Vec<PathBuf>,
}

impl FileBucketFactory {
    /// Creates a factory writing under `layout` in the given mode.
    pub fn new(layout: BucketLayout, mode: Mode) -> Self {
        Self::with_config(layout, mode, TextWriterConfig::default())
    }

    /// Creates a factory whose writers use a custom configuration.
    pub fn with_config(layout: BucketLayout, mode: Mode, config: TextWriterConfig) -> Self {
        Self {
            layout,
            mode,
            config,
            files: Vec::new(),
        }
    }

    /// Returns the layout.
    pub fn layout(&self) -> &BucketLayout {
        &self.layout
    }

    /// Paths of the bucket files created so far, in creation order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

impl BucketFactory for FileBucketFactory {
    type Bucket<'a> = TextWriter<File>;

    fn new_bucket(&mut self, range: TimeRange) -> Result<Self::Bucket<'_>> {
        if range.is_empty() {
            return Err(ExportError::InvalidTimeRange {
                start: range.start,
                end: range.end,
            });
        }

        let path = self.layout.bucket_file_path(&range);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|source| ExportError::SinkCreate {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let file = File::create(&path).map_err(|source| ExportError::SinkCreate {
            path: path.clone(),
            source,
        })?;

        debug!(path = %path.display(), start = range.start, end = range.end, "Created bucket file");
        self.files.push(path);
        Ok(TextWriter::with_config(file, self.mode, self.config.clone()))
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

fn align_timestamp(timestamp: Timestamp, duration_nanos: i64) -> i64 {
    let (quotient, _) = div_floor(timestamp, duration_nanos);
    quotient.saturating_mul(duration_nanos)
}

fn div_floor(value: i64, divisor: i64) -> (i64, i64) {
    let mut quotient = value / divisor;
    let mut remainder = value % divisor;
    if remainder < 0 {
        quotient -= 1;
        remainder += divisor;
    }
    (quotient, remainder)
}

fn timestamp_to_ymdh(timestamp: Timestamp) -> (i32, u32, u32, u32) {
    let (seconds, _) = div_floor(timestamp, NANOS_PER_SECOND);
    let (days, seconds_of_day) = div_floor(seconds, 86_400);
    let hour = (seconds_of_day / 3600) as u32;
    let (year, month, day) = civil_from_days(days);
    (year, month, day, hour)
}

fn civil_from_days(days: i64) -> (i32, u32, u32) {
    let z = days + 719_468;
    let era = if z >= 0 {
        z / 146_097
    } else {
        (z - 146_096) / 146_097
    };
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = mp + if mp < 10 { 3 } else { -9 };
    let year = y + if month <= 2 { 1 } else { 0 };
    (year as i32, month as u32, day as u32)
}
