//! Arbitrary-width two's-complement integer, minimally encoded.
//!
//! SNMP's `Integer` value is specified as unbounded (the reference
//! implementation stores it as a native Python `int`), so a plain `i64`
//! can't round-trip every wire value this codec is asked to carry. Rather
//! than pull in a bignum-arithmetic crate for a type that never needs
//! arithmetic — only construction, comparison, and byte access — this
//! stores the minimal big-endian two's-complement representation directly.

use std::fmt;

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Integer(Vec<u8>);

impl Integer {
    /// Builds an `Integer` from a big-endian two's-complement byte buffer,
    /// trimming it to the minimal form (mirrors the byte-trimming rule DER
    /// requires of the wire encoding itself).
    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        Integer(minimize(bytes))
    }

    /// The minimal big-endian two's-complement bytes, wire-ready.
    pub fn as_be_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0[0] & 0x80 != 0
    }

    /// Narrows to `i64` if the value fits, else `None`.
    pub fn to_i64(&self) -> Option<i64> {
        if self.0.len() > 8 {
            return None;
        }
        let sign = if self.is_negative() { 0xFF } else { 0x00 };
        let mut buf = [sign; 8];
        let n = self.0.len();
        buf[8 - n..].copy_from_slice(&self.0);
        Some(i64::from_be_bytes(buf))
    }

    pub fn to_i32(&self) -> Option<i32> {
        self.to_i64().and_then(|v| i32::try_from(v).ok())
    }

    pub fn zero() -> Self {
        Integer(vec![0])
    }
}

impl From<i64> for Integer {
    fn from(v: i64) -> Self {
        Integer::from_be_bytes(&v.to_be_bytes())
    }
}

impl From<i32> for Integer {
    fn from(v: i32) -> Self {
        Integer::from(v as i64)
    }
}

impl From<u32> for Integer {
    fn from(v: u32) -> Self {
        Integer::from(v as i64)
    }
}

impl fmt::Debug for Integer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_i64() {
            Some(v) => write!(f, "Integer({v})"),
            None => write!(f, "Integer({} bytes)", self.0.len()),
        }
    }
}

/// Trims a two's-complement buffer to its minimal form: drop leading `0x00`
/// bytes as long as the following byte's sign bit is still clear, or
/// leading `0xFF` bytes as long as it's still set. Always leaves at least
/// one byte.
fn minimize(bytes: &[u8]) -> Vec<u8> {
    if bytes.is_empty() {
        return vec![0];
    }
    let mut start = 0;
    let n = bytes.len();
    if bytes[0] == 0x00 {
        while start + 1 < n && bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0 {
            start += 1;
        }
    } else if bytes[0] == 0xFF {
        while start + 1 < n && bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0 {
            start += 1;
        }
    }
    bytes[start..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimizes_small_values() {
        assert_eq!(Integer::from(0i32).as_be_bytes(), &[0x00]);
        assert_eq!(Integer::from(127i32).as_be_bytes(), &[0x7F]);
        assert_eq!(Integer::from(128i32).as_be_bytes(), &[0x00, 0x80]);
        assert_eq!(Integer::from(-128i32).as_be_bytes(), &[0x80]);
        assert_eq!(Integer::from(-129i32).as_be_bytes(), &[0xFF, 0x7F]);
        assert_eq!(Integer::from(32768i32).as_be_bytes(), &[0x00, 0x80, 0x00]);
    }

    #[test]
    fn round_trips_i64_boundaries() {
        for v in [0i64, 1, -1, i32::MAX as i64, i32::MIN as i64, i64::MAX, i64::MIN] {
            let i = Integer::from(v);
            assert_eq!(i.to_i64(), Some(v));
        }
    }

    #[test]
    fn round_trips_wider_than_i64() {
        let mut bytes = vec![0x01];
        bytes.extend(std::iter::repeat(0x00).take(15));
        let i = Integer::from_be_bytes(&bytes);
        assert_eq!(i.as_be_bytes(), bytes.as_slice());
        assert_eq!(i.to_i64(), None);
    }

    #[test]
    fn already_minimal_input_is_unchanged() {
        let bytes = [0x01u8, 0x02, 0x03];
        assert_eq!(Integer::from_be_bytes(&bytes).as_be_bytes(), &bytes);
    }
}
