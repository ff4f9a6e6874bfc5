//! Object identifier codec: dotted-string on the Rust side, base-128
//! sub-identifiers with the `(40*a + b)` first-component compression on
//! the wire.
//!
//! The wire grammar (`encode_oid`'s input) never carries a leading dot;
//! the leading dot is purely a display/storage convention the varbind
//! layer applies, and `decode_oid`'s output restores it.

use super::BerError;

/// Deviates from the X.690 standard bound (`a <= 2`) on purpose: the
/// reference implementation this codec matches accepts `a, b <= 39` for
/// both components, so the maximum combined first byte is `39*40+39 =
/// 1599`.
const MAX_FIRST_COMBINED: u64 = 1599;

pub fn encode_oid(dotted: &str) -> Result<Vec<u8>, BerError> {
    let components = parse_components(dotted)?;
    if components.len() < 2 {
        return Err(BerError::IllegalOid(dotted.to_string()));
    }
    let (a, b) = (components[0], components[1]);
    if a > 39 || b > 39 {
        return Err(BerError::IllegalOid(dotted.to_string()));
    }

    let mut buf = Vec::new();
    encode_sub_id(&mut buf, a * 40 + b);
    for &component in &components[2..] {
        encode_sub_id(&mut buf, component);
    }
    Ok(buf)
}

pub fn decode_oid(input: &[u8]) -> Result<String, BerError> {
    if input.is_empty() {
        return Err(BerError::EmptyInput);
    }

    let (first, mut rest) = decode_sub_id(input)?;
    if first > MAX_FIRST_COMBINED {
        return Err(BerError::IllegalOid(format!(
            "first component {first} exceeds 39*40+39"
        )));
    }
    let a = first / 40;
    let b = first % 40;

    let mut out = format!(".{a}.{b}");
    while !rest.is_empty() {
        let (component, remainder) = decode_sub_id(rest)?;
        out.push('.');
        out.push_str(&component.to_string());
        rest = remainder;
    }
    Ok(out)
}

fn parse_components(dotted: &str) -> Result<Vec<u64>, BerError> {
    if dotted.is_empty() || dotted.starts_with('.') || dotted.ends_with('.') {
        return Err(BerError::IllegalOid(dotted.to_string()));
    }
    dotted
        .split('.')
        .map(|part| {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(BerError::IllegalOid(dotted.to_string()));
            }
            part.parse::<u64>()
                .map_err(|_| BerError::IllegalOid(dotted.to_string()))
        })
        .collect()
}

fn encode_sub_id(buf: &mut Vec<u8>, value: u64) {
    let mut groups = Vec::new();
    let mut n = value;
    groups.push((n & 0x7F) as u8);
    n >>= 7;
    while n > 0 {
        groups.push(((n & 0x7F) as u8) | 0x80);
        n >>= 7;
    }
    groups.reverse();
    buf.extend_from_slice(&groups);
}

fn decode_sub_id(input: &[u8]) -> Result<(u64, &[u8]), BerError> {
    if input[0] == 0x80 {
        return Err(BerError::IllegalOid("non-minimal sub-identifier".into()));
    }

    let mut value: u64 = 0;
    for (i, &byte) in input.iter().enumerate() {
        if i >= 10 {
            return Err(BerError::IntegerOverflow);
        }
        value = value
            .checked_shl(7)
            .ok_or(BerError::IntegerOverflow)?
            | (byte & 0x7F) as u64;
        if byte & 0x80 == 0 {
            return Ok((value, &input[i + 1..]));
        }
    }
    Err(BerError::IncompleteData)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_common_oids() {
        assert_eq!(encode_oid("1.2.3").unwrap(), vec![0x2a, 0x03]);
        assert_eq!(
            encode_oid("1.3.6.1.2.1.1.1.0").unwrap(),
            vec![0x2b, 0x06, 0x01, 0x02, 0x01, 0x01, 0x01, 0x00]
        );
    }

    #[test]
    fn first_component_deviation_matches_reference() {
        assert!(encode_oid("39.2.3").is_ok());
        assert!(encode_oid("1.39.3").is_ok());
        assert!(encode_oid("40.2.3").is_err());
        assert!(encode_oid("1.40.3").is_err());
    }

    #[test]
    fn rejects_malformed_grammar() {
        assert!(encode_oid("1").is_err());
        assert!(encode_oid("1.2.3.").is_err());
        assert!(encode_oid(".1.2.3").is_err());
        assert!(encode_oid("1..2").is_err());
        assert!(encode_oid("1.a.3").is_err());
    }

    #[test]
    fn decode_round_trips_and_adds_leading_dot() {
        let bytes = encode_oid("1.3.6.1.2.1.1.1.0").unwrap();
        assert_eq!(decode_oid(&bytes).unwrap(), ".1.3.6.1.2.1.1.1.0");
    }

    #[test]
    fn decode_rejects_non_minimal_and_out_of_range() {
        assert!(decode_oid(&[0x80, 0x00]).is_err());
        // combined value 1600 > 1599 is out of range for the first group.
        let mut buf = Vec::new();
        encode_sub_id(&mut buf, 1600);
        assert!(decode_oid(&buf).is_err());
    }
}
