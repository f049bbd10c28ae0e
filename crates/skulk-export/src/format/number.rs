//! Decimal rendering of numeric values into a byte buffer.
//!
//! Integers go through `itoa`. Floats use the shortest digit string that
//! round-trips to the same `f64` (via `ryu`), laid out in general notation:
//! plain decimal when the decimal exponent lies in `-4..6`, otherwise
//! `d.ddde±XX` with at least two exponent digits. `1.5` renders as `1.5`,
//! `100.0` as `100` and `1e21` as `1e+21`.

/// Decimal exponents at or above this switch to exponent notation.
const EXPONENT_UPPER: i32 = 6;

/// Decimal exponents below this switch to exponent notation.
const EXPONENT_LOWER: i32 = -4;

/// Appends a signed integer in base 10.
pub fn append_int(dst: &mut Vec<u8>, value: i64) {
    let mut buf = itoa::Buffer::new();
    dst.extend_from_slice(buf.format(value).as_bytes());
}

/// Appends an unsigned integer in base 10.
pub fn append_uint(dst: &mut Vec<u8>, value: u64) {
    let mut buf = itoa::Buffer::new();
    dst.extend_from_slice(buf.format(value).as_bytes());
}

/// Appends a boolean as `true` or `false`.
pub fn append_bool(dst: &mut Vec<u8>, value: bool) {
    dst.extend_from_slice(if value { b"true" } else { b"false" });
}

/// Shortest round-trip digits of a positive finite float.
///
/// The value equals `0.d1d2...dn × 10^point`.
struct Digits {
    buf: [u8; 24],
    len: usize,
    point: i32,
}

impl Digits {
    fn of(value: f64) -> Self {
        let mut ryu_buf = ryu::Buffer::new();
        let repr = ryu_buf.format_finite(value).as_bytes();

        let (mantissa, exponent) = match repr.iter().position(|&b| b == b'e' || b == b'E') {
            Some(i) => (&repr[..i], parse_exponent(&repr[i + 1..])),
            None => (repr, 0),
        };

        let mut digits = Digits {
            buf: [0; 24],
            len: 0,
            point: 0,
        };
        let mut integer_digits = 0i32;
        let mut leading_zeros = 0i32;
        let mut seen_point = false;
        for &b in mantissa {
            match b {
                b'.' => seen_point = true,
                b'0'..=b'9' => {
                    if !seen_point {
                        integer_digits += 1;
                    }
                    if digits.len == 0 && b == b'0' {
                        leading_zeros += 1;
                    } else if digits.len < digits.buf.len() {
                        digits.buf[digits.len] = b;
                        digits.len += 1;
                    }
                }
                _ => {}
            }
        }
        while digits.len > 0 && digits.buf[digits.len - 1] == b'0' {
            digits.len -= 1;
        }
        digits.point = integer_digits + exponent - leading_zeros;
        digits
    }

    fn as_slice(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    fn digit_at(&self, index: i32) -> u8 {
        if index >= 0 && (index as usize) < self.len {
            self.buf[index as usize]
        } else {
            b'0'
        }
    }
}

fn parse_exponent(src: &[u8]) -> i32 {
    let (negative, digits) = match src.first() {
        Some(b'-') => (true, &src[1..]),
        Some(b'+') => (false, &src[1..]),
        _ => (false, src),
    };
    let magnitude = digits
        .iter()
        .filter(|b| b.is_ascii_digit())
        .fold(0i32, |acc, &b| acc * 10 + i32::from(b - b'0'));
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

/// Appends a float using the shortest representation that round-trips.
pub fn append_float(dst: &mut Vec<u8>, value: f64) {
    if value.is_nan() {
        dst.extend_from_slice(b"NaN");
        return;
    }
    if value.is_infinite() {
        dst.extend_from_slice(if value > 0.0 { b"+Inf" } else { b"-Inf" });
        return;
    }
    if value.is_sign_negative() {
        dst.push(b'-');
    }
    if value == 0.0 {
        dst.push(b'0');
        return;
    }

    let digits = Digits::of(value.abs());
    let exponent = digits.point - 1;
    if (EXPONENT_LOWER..EXPONENT_UPPER).contains(&exponent) {
        append_plain(dst, &digits);
    } else {
        append_scientific(dst, &digits, exponent);
    }
}

fn append_plain(dst: &mut Vec<u8>, digits: &Digits) {
    if digits.point > 0 {
        for i in 0..digits.point {
            dst.push(digits.digit_at(i));
        }
    } else {
        dst.push(b'0');
    }

    let fraction = digits.len as i32 - digits.point;
    if fraction > 0 {
        dst.push(b'.');
        for i in 0..fraction {
            dst.push(digits.digit_at(digits.point + i));
        }
    }
}

fn append_scientific(dst: &mut Vec<u8>, digits: &Digits, exponent: i32) {
    let slice = digits.as_slice();
    dst.push(slice[0]);
    if slice.len() > 1 {
        dst.push(b'.');
        dst.extend_from_slice(&slice[1..]);
    }
    dst.push(b'e');
    dst.push(if exponent < 0 { b'-' } else { b'+' });
    let magnitude = exponent.unsigned_abs();
    if magnitude < 10 {
        dst.push(b'0');
    }
    let mut buf = itoa::Buffer::new();
    dst.extend_from_slice(buf.format(magnitude).as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn float(value: f64) -> String {
        let mut dst = Vec::new();
        append_float(&mut dst, value);
        String::from_utf8(dst).unwrap()
    }

    #[test]
    fn test_integers() {
        let mut dst = Vec::new();
        append_int(&mut dst, i64::MIN);
        dst.push(b' ');
        append_uint(&mut dst, u64::MAX);
        assert_eq!(dst, b"-9223372036854775808 18446744073709551615");
    }

    #[test]
    fn test_bool() {
        let mut dst = Vec::new();
        append_bool(&mut dst, true);
        append_bool(&mut dst, false);
        assert_eq!(dst, b"truefalse");
    }

    #[test]
    fn test_plain_floats() {
        assert_eq!(float(1.5), "1.5");
        assert_eq!(float(100.0), "100");
        assert_eq!(float(-2.25), "-2.25");
        assert_eq!(float(123456.7), "123456.7");
        assert_eq!(float(0.1), "0.1");
        assert_eq!(float(0.0001), "0.0001");
        assert_eq!(float(0.0001234), "0.0001234");
        assert_eq!(float(999999.0), "999999");
    }

    #[test]
    fn test_scientific_floats() {
        assert_eq!(float(1e6), "1e+06");
        assert_eq!(float(1234567.0), "1.234567e+06");
        assert_eq!(float(1e21), "1e+21");
        assert_eq!(float(0.00001), "1e-05");
        assert_eq!(float(1.234e-7), "1.234e-07");
        assert_eq!(float(1e100), "1e+100");
        assert_eq!(float(5e-324), "5e-324");
        assert_eq!(float(f64::MAX), "1.7976931348623157e+308");
    }

    #[test]
    fn test_special_floats() {
        assert_eq!(float(0.0), "0");
        assert_eq!(float(-0.0), "-0");
        assert_eq!(float(f64::NAN), "NaN");
        assert_eq!(float(f64::INFINITY), "+Inf");
        assert_eq!(float(f64::NEG_INFINITY), "-Inf");
    }

    proptest! {
        #[test]
        fn test_float_round_trips(bits in any::<u64>()) {
            let value = f64::from_bits(bits);
            prop_assume!(value.is_finite());
            let rendered = float(value);
            let parsed: f64 = rendered.parse().unwrap();
            prop_assert_eq!(parsed.to_bits(), value.to_bits());
        }
    }
}
