//! Shared helpers for the integration tests.

#![allow(dead_code)]

use skulk_export::cursor::{ArrayCursor, TimestampArray, VecCursor};
use skulk_export::escape;
use std::io::{self, Write};

/// A field value parsed back from a line.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedValue {
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Boolean(bool),
    String(Vec<u8>),
}

/// One point parsed from a line-protocol line.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPoint {
    pub measurement: Vec<u8>,
    pub tags: Vec<(Vec<u8>, Vec<u8>)>,
    pub field: Vec<u8>,
    pub value: ParsedValue,
    pub timestamp: i64,
}

/// Splits on `sep` wherever it is not preceded by a backslash.
fn split_unescaped(src: &[u8], sep: u8) -> Vec<&[u8]> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < src.len() {
        match src[i] {
            b'\\' => i += 2,
            b if b == sep => {
                parts.push(&src[start..i]);
                i += 1;
                start = i;
            }
            _ => i += 1,
        }
    }
    parts.push(&src[start..]);
    parts
}

/// Index of the first `target` not preceded by a backslash.
fn find_unescaped(src: &[u8], target: u8) -> Option<usize> {
    let mut i = 0;
    while i < src.len() {
        match src[i] {
            b'\\' => i += 2,
            b if b == target => return Some(i),
            _ => i += 1,
        }
    }
    None
}

fn parse_value(raw: &[u8]) -> Result<ParsedValue, String> {
    if raw.first() == Some(&b'"') {
        if raw.len() < 2 || raw.last() != Some(&b'"') {
            return Err(format!("unterminated string: {:?}", raw));
        }
        return Ok(ParsedValue::String(
            escape::unescape(&raw[1..raw.len() - 1]).into_owned(),
        ));
    }

    let text = std::str::from_utf8(raw).map_err(|e| e.to_string())?;
    match text {
        "true" => return Ok(ParsedValue::Boolean(true)),
        "false" => return Ok(ParsedValue::Boolean(false)),
        _ => {}
    }
    if let Some(int) = text.strip_suffix('i') {
        return int
            .parse()
            .map(ParsedValue::Integer)
            .map_err(|e| format!("{text}: {e}"));
    }
    if let Some(uint) = text.strip_suffix('u') {
        return uint
            .parse()
            .map(ParsedValue::Unsigned)
            .map_err(|e| format!("{text}: {e}"));
    }
    text.parse()
        .map(ParsedValue::Float)
        .map_err(|e| format!("{text}: {e}"))
}

/// Parses a single-field line-protocol line (without the trailing newline).
pub fn parse_line(line: &[u8]) -> Result<ParsedPoint, String> {
    let key_end = find_unescaped(line, b' ').ok_or("missing field section")?;
    let (key, rest) = (&line[..key_end], &line[key_end + 1..]);

    let mut key_parts = split_unescaped(key, b',').into_iter();
    let measurement = escape::unescape(key_parts.next().ok_or("missing measurement")?).into_owned();
    let mut tags = Vec::new();
    for pair in key_parts {
        let eq = find_unescaped(pair, b'=').ok_or("tag without '='")?;
        tags.push((
            escape::unescape(&pair[..eq]).into_owned(),
            escape::unescape(&pair[eq + 1..]).into_owned(),
        ));
    }

    let eq = find_unescaped(rest, b'=').ok_or("field without '='")?;
    let field = escape::unescape(&rest[..eq]).into_owned();
    let rest = &rest[eq + 1..];

    // The timestamp follows the last space; string values may contain spaces.
    let ts_start = rest
        .iter()
        .rposition(|&b| b == b' ')
        .ok_or("missing timestamp")?;
    let value = parse_value(&rest[..ts_start])?;
    let timestamp = std::str::from_utf8(&rest[ts_start + 1..])
        .map_err(|e| e.to_string())?
        .parse()
        .map_err(|e: std::num::ParseIntError| e.to_string())?;

    Ok(ParsedPoint {
        measurement,
        tags,
        field,
        value,
        timestamp,
    })
}

/// Joins a series-mode key line with values-mode lines into full points.
pub fn join_key_and_values(key_line: &[u8], values: &[u8]) -> Vec<Vec<u8>> {
    let key = key_line.strip_suffix(b"\n").unwrap_or(key_line);
    values
        .split(|&b| b == b'\n')
        .filter(|line| !line.is_empty())
        .map(|line| {
            let mut point = key.to_vec();
            point.push(b'=');
            point.extend_from_slice(line);
            point
        })
        .collect()
}

/// A sink that fails exactly one write call and records everything else.
#[derive(Debug, Default)]
pub struct FailingSink {
    pub written: Vec<u8>,
    pub writes: usize,
    pub flushes: usize,
    /// 1-based index of the write call that fails.
    pub fail_on_write: Option<usize>,
    pub fail_flush: bool,
}

impl FailingSink {
    pub fn failing_on(write: usize) -> Self {
        Self {
            fail_on_write: Some(write),
            ..Self::default()
        }
    }

    pub fn failing_flush() -> Self {
        Self {
            fail_flush: true,
            ..Self::default()
        }
    }
}

impl Write for FailingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writes += 1;
        if self.fail_on_write == Some(self.writes) {
            return Err(io::Error::other("sink rejected write"));
        }
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushes += 1;
        if self.fail_flush {
            return Err(io::Error::other("flush failed"));
        }
        Ok(())
    }
}

/// Wraps a cursor and counts calls to `next`.
#[derive(Debug)]
pub struct CountingCursor<T> {
    inner: VecCursor<T>,
    pub calls: usize,
}

impl<T: Clone> CountingCursor<T> {
    pub fn new(points: Vec<(i64, T)>) -> Self {
        Self {
            inner: VecCursor::new(points),
            calls: 0,
        }
    }

    pub fn with_batch_size(points: Vec<(i64, T)>, batch_size: usize) -> Self {
        Self {
            inner: VecCursor::with_batch_size(points, batch_size),
            calls: 0,
        }
    }
}

impl<T: Clone> ArrayCursor<T> for CountingCursor<T> {
    fn next(&mut self) -> &TimestampArray<T> {
        self.calls += 1;
        self.inner.next()
    }
}
