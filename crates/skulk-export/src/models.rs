//! Core data types shared by the export encoders.

use crate::escape;
use std::fmt;

/// Timestamp in nanoseconds since the Unix epoch.
pub type Timestamp = i64;

/// A half-open time range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeRange {
    /// Start timestamp (inclusive).
    pub start: Timestamp,
    /// End timestamp (exclusive).
    pub end: Timestamp,
}

impl TimeRange {
    /// Creates a new time range.
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }

    /// Returns a range covering every representable timestamp.
    pub fn unbounded() -> Self {
        Self::new(Timestamp::MIN, Timestamp::MAX)
    }

    /// Returns true if the timestamp falls within this range.
    pub fn contains(&self, ts: Timestamp) -> bool {
        ts >= self.start && ts < self.end
    }

    /// Returns true if the range covers no timestamps.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Returns the overlap of two ranges, or `None` if they are disjoint.
    pub fn intersect(&self, other: &TimeRange) -> Option<TimeRange> {
        let range = TimeRange::new(self.start.max(other.start), self.end.min(other.end));
        (!range.is_empty()).then_some(range)
    }
}

/// Value type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// 64-bit IEEE-754 float.
    Float,
    /// Signed 64-bit integer.
    Integer,
    /// Unsigned 64-bit integer.
    Unsigned,
    /// Boolean.
    Boolean,
    /// Byte string.
    String,
}

impl DataType {
    /// Returns the lowercase type name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Integer => "integer",
            Self::Unsigned => "unsigned",
            Self::Boolean => "boolean",
            Self::String => "string",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single tag key/value pair, stored unescaped.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag {
    /// Tag key.
    pub key: Vec<u8>,
    /// Tag value.
    pub value: Vec<u8>,
}

impl Tag {
    /// Creates a new tag.
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A tag set kept in canonical (sorted by key) order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Tags(Vec<Tag>);

impl Tags {
    /// Creates a tag set, sorting it into canonical order.
    pub fn new(mut tags: Vec<Tag>) -> Self {
        tags.sort();
        Self(tags)
    }

    /// Creates a tag set from string pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<Vec<u8>>,
        V: Into<Vec<u8>>,
    {
        Self::new(pairs.into_iter().map(|(k, v)| Tag::new(k, v)).collect())
    }

    /// Returns the tags in canonical order.
    pub fn as_slice(&self) -> &[Tag] {
        &self.0
    }

    /// Returns the value of the tag with the given key.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.0
            .binary_search_by(|t| t.key.as_slice().cmp(key))
            .ok()
            .map(|i| self.0[i].value.as_slice())
    }

    /// Number of tags.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no tags.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Appends `,key=value` for every tag, escaped.
    ///
    /// Tags with an empty key or an empty value cannot be represented in
    /// line protocol and are skipped.
    pub fn append_hash_key(&self, dst: &mut Vec<u8>) {
        for tag in &self.0 {
            if tag.key.is_empty() || tag.value.is_empty() {
                continue;
            }
            dst.push(b',');
            escape::append_tag(dst, &tag.key);
            dst.push(b'=');
            escape::append_tag(dst, &tag.value);
        }
    }
}

/// Appends the escaped series key (measurement plus tag set) to `dst`.
pub fn append_series_key(dst: &mut Vec<u8>, name: &[u8], tags: &Tags) {
    escape::append_measurement(dst, name);
    tags.append_hash_key(dst);
}
