//! Rust values -> BER bytes. `Encoder` generalizes the teacher's
//! closure-scoped `encode_container_with`/`encode_sequence_with` helpers
//! into an explicit `enter`/`exit` stack, since the SNMP message layer
//! needs to interleave container boundaries with writes rather than build
//! each level in one closure call.

use std::net::Ipv4Addr;

use super::{encode_length, encode_tag, BerError, BerResult, Class, Form, Integer, Number};

/// A value to encode, tagged by Rust type. `write` autodetects the ASN.1
/// number for the variants the SNMP value union actually uses (`Int`,
/// `Bytes`, `Text`, `Null`, `Ip`); `write_as` takes an explicit
/// `(number, class)` override for everything else (booleans, OIDs, the
/// SNMP application-class counters and gauges).
pub enum EncodeValue<'a> {
    Bool(bool),
    Int(&'a Integer),
    /// Unsigned application-class integers (Counter32/Gauge32/TimeTicks/
    /// Counter64/Uinteger32) encoded as minimal unsigned big-endian bytes,
    /// never two's complement.
    Unsigned(u64),
    Bytes(&'a [u8]),
    Text(&'a str),
    Null,
    Oid(&'a str),
    Ip(Ipv4Addr),
}

struct Frame {
    number: u32,
    form: Form,
    class: Class,
    buf: Vec<u8>,
}

pub struct Encoder {
    root: Vec<u8>,
    stack: Vec<Frame>,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    pub fn new() -> Self {
        Encoder {
            root: Vec::new(),
            stack: Vec::new(),
        }
    }

    /// Opens a constructed element; subsequent `write`/`enter` calls land
    /// inside it until the matching `exit`.
    pub fn enter(&mut self, number: u32, class: Class) {
        self.stack.push(Frame {
            number,
            form: Form::Constructed,
            class,
            buf: Vec::new(),
        });
    }

    pub fn enter_universal(&mut self, number: Number) {
        self.enter(number as u32, Class::Universal);
    }

    /// Closes the innermost open element, appending its TLV-wrapped bytes
    /// into the enclosing level (or the root buffer if none is open).
    pub fn exit(&mut self) -> BerResult<()> {
        let frame = self.stack.pop().ok_or(BerError::StackEmpty)?;
        let mut tlv = Vec::new();
        encode_tag(&mut tlv, frame.number, frame.form, frame.class);
        encode_length(&mut tlv, frame.buf.len());
        tlv.extend_from_slice(&frame.buf);
        self.current_buf().extend_from_slice(&tlv);
        Ok(())
    }

    /// Writes a primitive value, autodetecting its tag number.
    pub fn write(&mut self, value: EncodeValue<'_>) -> BerResult<()> {
        let (number, class) = match &value {
            EncodeValue::Int(_) => (Number::Integer as u32, Class::Universal),
            EncodeValue::Bytes(_) | EncodeValue::Text(_) => {
                (Number::OctetString as u32, Class::Universal)
            }
            EncodeValue::Null => (Number::Null as u32, Class::Universal),
            EncodeValue::Oid(_) => (Number::ObjectIdentifier as u32, Class::Universal),
            EncodeValue::Ip(_) => (super::tags::application::IP_ADDRESS, Class::Application),
            EncodeValue::Bool(_) | EncodeValue::Unsigned(_) => {
                return Err(BerError::CannotDetermineNumber);
            }
        };
        self.write_as(value, number, class)
    }

    /// Writes a primitive value under an explicit `(number, class)` tag.
    pub fn write_as(&mut self, value: EncodeValue<'_>, number: u32, class: Class) -> BerResult<()> {
        let body = match value {
            EncodeValue::Bool(b) => vec![if b { 0xFF } else { 0x00 }],
            EncodeValue::Int(i) => i.as_be_bytes().to_vec(),
            EncodeValue::Unsigned(v) => encode_unsigned(v),
            EncodeValue::Bytes(b) => b.to_vec(),
            EncodeValue::Text(s) => s.as_bytes().to_vec(),
            EncodeValue::Null => Vec::new(),
            EncodeValue::Oid(oid) => super::encode_oid(oid)?,
            EncodeValue::Ip(ip) => ip.octets().to_vec(),
        };

        let mut tlv = Vec::new();
        encode_tag(&mut tlv, number, Form::Primitive, class);
        encode_length(&mut tlv, body.len());
        tlv.extend_from_slice(&body);
        self.current_buf().extend_from_slice(&tlv);
        Ok(())
    }

    /// Finishes encoding, failing if any `enter` is missing its `exit`.
    pub fn output(self) -> BerResult<Vec<u8>> {
        if !self.stack.is_empty() {
            return Err(BerError::StackEmpty);
        }
        Ok(self.root)
    }

    fn current_buf(&mut self) -> &mut Vec<u8> {
        match self.stack.last_mut() {
            Some(frame) => &mut frame.buf,
            None => &mut self.root,
        }
    }
}

/// Minimal unsigned big-endian encoding, with a leading `0x00` inserted
/// when the high bit would otherwise be mistaken for a sign bit.
fn encode_unsigned(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < 7 && bytes[start] == 0x00 {
        start += 1;
    }
    let mut out = bytes[start..].to_vec();
    if out[0] & 0x80 != 0 {
        out.insert(0, 0x00);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_nested_sequence() {
        let mut enc = Encoder::new();
        enc.enter_universal(Number::Sequence);
        enc.write(EncodeValue::Int(&Integer::from(5i32))).unwrap();
        enc.write(EncodeValue::Bytes(b"hi")).unwrap();
        enc.exit().unwrap();
        let bytes = enc.output().unwrap();
        assert_eq!(bytes, vec![0x30, 0x07, 0x02, 0x01, 0x05, 0x04, 0x02, b'h', b'i']);
    }

    #[test]
    fn exit_without_enter_errors() {
        let mut enc = Encoder::new();
        assert!(enc.exit().is_err());
    }

    #[test]
    fn output_with_open_frame_errors() {
        let mut enc = Encoder::new();
        enc.enter_universal(Number::Sequence);
        assert!(enc.output().is_err());
    }

    #[test]
    fn encodes_ip_address() {
        let mut enc = Encoder::new();
        enc.write(EncodeValue::Ip("127.0.0.1".parse().unwrap()))
            .unwrap();
        let bytes = enc.output().unwrap();
        assert_eq!(bytes, vec![0x40, 0x04, 127, 0, 0, 1]);
    }

    #[test]
    fn encodes_unsigned_counter() {
        let mut enc = Encoder::new();
        enc.write_as(
            EncodeValue::Unsigned(4294967295),
            super::super::tags::application::COUNTER32,
            Class::Application,
        )
        .unwrap();
        let bytes = enc.output().unwrap();
        assert_eq!(bytes, vec![0x41, 0x05, 0x00, 0xFF, 0xFF, 0xFF, 0xFF]);
    }
}
