//! Line-protocol escaping.
//!
//! Each component of a line has its own set of bytes that must be
//! backslash-escaped:
//!
//! | component | escaped bytes |
//! |---|---|
//! | measurement | `,` and space |
//! | tag key, tag value, field key | `,`, `=` and space |
//! | string field value | `"` and `\` |
//!
//! The `append_*` functions write into a caller-owned buffer so that key and
//! line assembly never allocates per call.

use std::borrow::Cow;

const MEASUREMENT_SPECIALS: &[u8] = b", ";
const TAG_SPECIALS: &[u8] = b",= ";
const STRING_FIELD_SPECIALS: &[u8] = b"\"\\";

fn append_escaped(dst: &mut Vec<u8>, src: &[u8], specials: &[u8]) {
    if !src.iter().any(|b| specials.contains(b)) {
        dst.extend_from_slice(src);
        return;
    }

    dst.reserve(src.len() + 8);
    for &b in src {
        if specials.contains(&b) {
            dst.push(b'\\');
        }
        dst.push(b);
    }
}

/// Appends a measurement name, escaping commas and spaces.
pub fn append_measurement(dst: &mut Vec<u8>, name: &[u8]) {
    append_escaped(dst, name, MEASUREMENT_SPECIALS);
}

/// Appends a tag key or tag value, escaping commas, equals signs and spaces.
pub fn append_tag(dst: &mut Vec<u8>, tag: &[u8]) {
    append_escaped(dst, tag, TAG_SPECIALS);
}

/// Appends a field key. Field keys share the tag escaping rules.
pub fn append_field_key(dst: &mut Vec<u8>, field: &[u8]) {
    append_escaped(dst, field, TAG_SPECIALS);
}

/// Appends the contents of a string field value, escaping `"` and `\`.
///
/// The surrounding quotes are not written.
pub fn append_string_field(dst: &mut Vec<u8>, value: &[u8]) {
    append_escaped(dst, value, STRING_FIELD_SPECIALS);
}

/// Removes one level of backslash escaping.
///
/// A backslash followed by any byte yields that byte. A trailing lone
/// backslash is kept as-is. Borrows the input when it contains no escapes.
pub fn unescape(src: &[u8]) -> Cow<'_, [u8]> {
    if !src.contains(&b'\\') {
        return Cow::Borrowed(src);
    }

    let mut out = Vec::with_capacity(src.len());
    let mut i = 0;
    while i < src.len() {
        if src[i] == b'\\' && i + 1 < src.len() {
            out.push(src[i + 1]);
            i += 2;
        } else {
            out.push(src[i]);
            i += 1;
        }
    }
    Cow::Owned(out)
}
