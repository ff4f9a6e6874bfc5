//! BER bytes -> Rust values. `Decoder` wraps the teacher's slice-splitting
//! TLV parse (`parse_tag`/`parse_length`) in a cursor+stack so callers can
//! `enter`/`exit` constructed elements imperatively, the way the SNMP
//! message layer needs to walk a `Sequence of Sequence of ...` shape.

use std::net::Ipv4Addr;

use super::{parse_length, parse_tag, tags, BerError, BerResult, Class, Form, Integer, Number, Tag};

#[derive(Debug, Clone, PartialEq)]
pub enum DecodedValue {
    Bool(bool),
    Int(Integer),
    /// Unsigned application-class integers (Counter32/Gauge32/TimeTicks/
    /// Counter64/Uinteger32).
    Unsigned(u64),
    Bytes(Vec<u8>),
    Text(String),
    Null,
    Oid(String),
    Ip(Ipv4Addr),
}

pub struct Decoder<'a> {
    cursor: &'a [u8],
    stack: Vec<&'a [u8]>,
}

impl<'a> Decoder<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Decoder {
            cursor: input,
            stack: Vec::new(),
        }
    }

    pub fn eof(&self) -> bool {
        self.cursor.is_empty()
    }

    /// Looks at the next tag without consuming it.
    pub fn peek(&self) -> BerResult<Tag> {
        let (tag, _) = parse_tag(self.cursor)?;
        Ok(tag)
    }

    /// Enters a constructed element: everything up to its matching `exit`
    /// is read from inside it.
    pub fn enter(&mut self) -> BerResult<()> {
        let (tag, after_tag) = parse_tag(self.cursor)?;
        if tag.form != Form::Constructed {
            return Err(BerError::NotConstructed);
        }
        let (len, after_length) = parse_length(after_tag)?;
        if after_length.len() < len {
            return Err(BerError::IncompleteData);
        }
        let (body, remainder) = after_length.split_at(len);
        self.stack.push(remainder);
        self.cursor = body;
        Ok(())
    }

    /// Leaves the current constructed element, resuming at whatever
    /// followed it in the enclosing level.
    pub fn exit(&mut self) -> BerResult<()> {
        self.cursor = self.stack.pop().ok_or(BerError::StackEmpty)?;
        Ok(())
    }

    /// Reads the next primitive (or raw-bytes-if-constructed) value,
    /// dispatching on its own tag number.
    pub fn read(&mut self) -> BerResult<(Tag, DecodedValue)> {
        self.read_as(None)
    }

    /// As `read`, but interprets the body as `force_number` regardless of
    /// the wire tag's own number (still reads the real tag for the
    /// returned `Tag`).
    pub fn read_as(&mut self, force_number: Option<u32>) -> BerResult<(Tag, DecodedValue)> {
        let (tag, after_tag) = parse_tag(self.cursor)?;
        let (len, after_length) = parse_length(after_tag)?;
        if after_length.len() < len {
            return Err(BerError::IncompleteData);
        }
        let (body, remainder) = after_length.split_at(len);
        self.cursor = remainder;

        let number = force_number.unwrap_or(tag.number);
        let value = decode_body(tag.class, tag.form, number, body)?;
        Ok((tag, value))
    }
}

fn decode_body(class: Class, form: Form, number: u32, body: &[u8]) -> BerResult<DecodedValue> {
    if form == Form::Constructed {
        return Ok(DecodedValue::Bytes(body.to_vec()));
    }

    match class {
        Class::Universal => decode_universal(number, body),
        Class::Application => decode_application(number, body),
        Class::Context => decode_context_primitive(number, body),
        Class::Private => Ok(DecodedValue::Bytes(body.to_vec())),
    }
}

fn decode_universal(number: u32, body: &[u8]) -> BerResult<DecodedValue> {
    if number == Number::Boolean as u32 {
        if body.len() != 1 {
            return Err(BerError::Syntax("boolean body must be one octet".into()));
        }
        return Ok(DecodedValue::Bool(body[0] != 0));
    }
    if number == Number::Integer as u32 || number == Number::Enumerated as u32 {
        if body.is_empty() {
            return Err(BerError::IncompleteData);
        }
        return Ok(DecodedValue::Int(Integer::from_be_bytes(body)));
    }
    if number == Number::OctetString as u32 {
        return Ok(DecodedValue::Bytes(body.to_vec()));
    }
    if number == Number::Null as u32 {
        if !body.is_empty() {
            return Err(BerError::Syntax("NULL body must be empty".into()));
        }
        return Ok(DecodedValue::Null);
    }
    if number == Number::ObjectIdentifier as u32 {
        return Ok(DecodedValue::Oid(super::decode_oid(body)?));
    }
    if matches!(
        number,
        n if n == Number::Utf8String as u32
            || n == Number::PrintableString as u32
            || n == Number::Ia5String as u32
            || n == Number::UtcTime as u32
            || n == Number::UnicodeString as u32
    ) {
        let text = std::str::from_utf8(body)
            .map_err(|_| BerError::InvalidUtf8)?
            .to_string();
        return Ok(DecodedValue::Text(text));
    }
    // Unknown universal primitive (e.g. BitString, ObjectDescription):
    // return the raw bytes rather than failing the whole decode.
    Ok(DecodedValue::Bytes(body.to_vec()))
}

fn decode_application(number: u32, body: &[u8]) -> BerResult<DecodedValue> {
    match number {
        n if n == tags::application::IP_ADDRESS => {
            if body.len() != 4 {
                return Err(BerError::Syntax("IpAddress body must be 4 octets".into()));
            }
            Ok(DecodedValue::Ip(Ipv4Addr::new(
                body[0], body[1], body[2], body[3],
            )))
        }
        n if n == tags::application::COUNTER32
            || n == tags::application::GAUGE32
            || n == tags::application::TIME_TICKS
            || n == tags::application::UINTEGER32 =>
        {
            Ok(DecodedValue::Unsigned(decode_unsigned(body, 5)? as u64))
        }
        n if n == tags::application::COUNTER64 => {
            Ok(DecodedValue::Unsigned(decode_unsigned(body, 9)?))
        }
        n if n == tags::application::OPAQUE || n == tags::application::NSAP_ADDRESS => {
            Ok(DecodedValue::Bytes(body.to_vec()))
        }
        _ => Ok(DecodedValue::Bytes(body.to_vec())),
    }
}

fn decode_context_primitive(number: u32, body: &[u8]) -> BerResult<DecodedValue> {
    match number {
        n if n == tags::exception::NO_SUCH_OBJECT
            || n == tags::exception::NO_SUCH_INSTANCE
            || n == tags::exception::END_OF_MIB_VIEW =>
        {
            if !body.is_empty() {
                return Err(BerError::Syntax("exception value body must be empty".into()));
            }
            Ok(DecodedValue::Null)
        }
        _ => Ok(DecodedValue::Bytes(body.to_vec())),
    }
}

/// Decodes an unsigned big-endian integer, rejecting inputs wider than
/// `max_bytes` octets (an extra leading `0x00` pad byte is allowed).
fn decode_unsigned(input: &[u8], max_bytes: usize) -> BerResult<u64> {
    if input.is_empty() {
        return Err(BerError::IncompleteData);
    }
    if input.len() > max_bytes {
        return Err(BerError::IntegerOverflow);
    }
    if input.len() == max_bytes && input[0] != 0x00 {
        return Err(BerError::IntegerOverflow);
    }
    let mut value: u64 = 0;
    for &byte in input {
        value = (value << 8) | byte as u64;
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ber::{encoder::EncodeValue, Encoder};

    #[test]
    fn round_trips_sequence_of_integer_and_octet_string() {
        let mut enc = Encoder::new();
        enc.enter_universal(Number::Sequence);
        enc.write(EncodeValue::Int(&Integer::from(5i32))).unwrap();
        enc.write(EncodeValue::Bytes(b"hi")).unwrap();
        enc.exit().unwrap();
        let bytes = enc.output().unwrap();

        let mut dec = Decoder::new(&bytes);
        dec.enter().unwrap();
        let (tag1, v1) = dec.read().unwrap();
        assert_eq!(tag1.number, Number::Integer as u32);
        assert_eq!(v1, DecodedValue::Int(Integer::from(5i32)));
        let (_, v2) = dec.read().unwrap();
        assert_eq!(v2, DecodedValue::Bytes(b"hi".to_vec()));
        dec.exit().unwrap();
        assert!(dec.eof());
    }

    #[test]
    fn decodes_ip_address() {
        let mut enc = Encoder::new();
        enc.write(EncodeValue::Ip("192.168.1.1".parse().unwrap()))
            .unwrap();
        let bytes = enc.output().unwrap();
        let mut dec = Decoder::new(&bytes);
        let (tag, value) = dec.read().unwrap();
        assert_eq!(tag.class, Class::Application);
        assert_eq!(value, DecodedValue::Ip("192.168.1.1".parse().unwrap()));
    }

    #[test]
    fn decodes_unsigned_application_types() {
        let mut enc = Encoder::new();
        enc.write_as(
            EncodeValue::Unsigned(u64::from(u32::MAX)),
            tags::application::COUNTER32,
            Class::Application,
        )
        .unwrap();
        let bytes = enc.output().unwrap();
        let mut dec = Decoder::new(&bytes);
        let (_, value) = dec.read().unwrap();
        assert_eq!(value, DecodedValue::Unsigned(u64::from(u32::MAX)));
    }

    #[test]
    fn exit_without_enter_errors() {
        let mut dec = Decoder::new(&[0x02, 0x01, 0x05]);
        assert!(dec.exit().is_err());
    }

    #[test]
    fn enter_on_primitive_errors() {
        let mut dec = Decoder::new(&[0x02, 0x01, 0x05]);
        assert!(matches!(dec.enter(), Err(BerError::NotConstructed)));
    }

    #[test]
    fn context_exception_values_decode_to_null() {
        let bytes = [0x80u8, 0x00];
        let mut dec = Decoder::new(&bytes);
        let (tag, value) = dec.read().unwrap();
        assert_eq!(tag.number, tags::exception::NO_SUCH_OBJECT);
        assert_eq!(value, DecodedValue::Null);
    }
}
