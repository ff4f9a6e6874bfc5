//! The SNMP varbind and PDU shapes: `Sequence { OID, value }` for a
//! varbind, `Sequence { request-id, status-or-bulk-params, varbind-list }`
//! for a PDU, wrapped in whichever `[CONTEXT n]` tag names the PDU type.

use std::net::Ipv4Addr;

use crate::ber::{tags, BerError, BerResult, Class, Decoder, EncodeValue, Encoder, Integer, Tag, DecodedValue};

/// A single (OID, value) pair. `oid` is always stored with its leading
/// dot (`.1.3.6.1.2.1.1.1.0`); constructing from a string without one
/// normalizes it.
#[derive(Debug, Clone, PartialEq)]
pub struct SnmpVarbind {
    pub oid: String,
    pub value: ObjectSyntax,
}

impl SnmpVarbind {
    pub fn new(oid: impl Into<String>, value: ObjectSyntax) -> Self {
        let oid = oid.into();
        let oid = if oid.starts_with('.') {
            oid
        } else {
            format!(".{oid}")
        };
        SnmpVarbind { oid, value }
    }

    pub(crate) fn encode(&self, enc: &mut Encoder) -> BerResult<()> {
        enc.enter_universal(crate::ber::Number::Sequence);
        let bare_oid = self.oid.strip_prefix('.').unwrap_or(&self.oid);
        enc.write(EncodeValue::Oid(bare_oid))?;
        self.value.encode(enc)?;
        enc.exit()?;
        Ok(())
    }

    pub(crate) fn decode(dec: &mut Decoder<'_>) -> BerResult<Self> {
        dec.enter()?;
        let (_, oid_value) = dec.read()?;
        let oid = match oid_value {
            DecodedValue::Oid(s) => s,
            _ => return Err(BerError::Syntax("varbind OID field is not an OID".into())),
        };
        let (tag, value) = dec.read()?;
        let value = ObjectSyntax::from_decoded(tag, value)?;
        dec.exit()?;
        Ok(SnmpVarbind { oid, value })
    }
}

/// The value half of a varbind. `Text`/`Bytes` both encode to an
/// `OctetString` on the wire (decoding always produces `Bytes`, since the
/// wire has no way to distinguish them — `Text` exists so callers
/// building a `set()` request can pass a `&str` directly).
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectSyntax {
    Integer(Integer),
    Text(String),
    Bytes(Vec<u8>),
    Null,
    Ipv4(Ipv4Addr),
    Counter32(u32),
    Gauge32(u32),
    TimeTicks(u32),
    Opaque(Vec<u8>),
    Counter64(u64),
    Uinteger32(u32),
    NoSuchObject,
    NoSuchInstance,
    EndOfMibView,
}

impl ObjectSyntax {
    pub(crate) fn encode(&self, enc: &mut Encoder) -> BerResult<()> {
        use tags::{application, exception};
        match self {
            ObjectSyntax::Integer(i) => enc.write(EncodeValue::Int(i)),
            ObjectSyntax::Text(s) => enc.write(EncodeValue::Text(s)),
            ObjectSyntax::Bytes(b) => enc.write(EncodeValue::Bytes(b)),
            ObjectSyntax::Null => enc.write(EncodeValue::Null),
            ObjectSyntax::Ipv4(ip) => enc.write(EncodeValue::Ip(*ip)),
            ObjectSyntax::Counter32(v) => {
                enc.write_as(EncodeValue::Unsigned(*v as u64), application::COUNTER32, Class::Application)
            }
            ObjectSyntax::Gauge32(v) => {
                enc.write_as(EncodeValue::Unsigned(*v as u64), application::GAUGE32, Class::Application)
            }
            ObjectSyntax::TimeTicks(v) => {
                enc.write_as(EncodeValue::Unsigned(*v as u64), application::TIME_TICKS, Class::Application)
            }
            ObjectSyntax::Opaque(b) => {
                enc.write_as(EncodeValue::Bytes(b), application::OPAQUE, Class::Application)
            }
            ObjectSyntax::Counter64(v) => {
                enc.write_as(EncodeValue::Unsigned(*v), application::COUNTER64, Class::Application)
            }
            ObjectSyntax::Uinteger32(v) => {
                enc.write_as(EncodeValue::Unsigned(*v as u64), application::UINTEGER32, Class::Application)
            }
            ObjectSyntax::NoSuchObject => {
                enc.write_as(EncodeValue::Null, exception::NO_SUCH_OBJECT, Class::Context)
            }
            ObjectSyntax::NoSuchInstance => {
                enc.write_as(EncodeValue::Null, exception::NO_SUCH_INSTANCE, Class::Context)
            }
            ObjectSyntax::EndOfMibView => {
                enc.write_as(EncodeValue::Null, exception::END_OF_MIB_VIEW, Class::Context)
            }
        }
    }

    fn from_decoded(tag: Tag, value: DecodedValue) -> BerResult<Self> {
        use tags::{application, exception};
        match (tag.class, tag.number, value) {
            (Class::Universal, _, DecodedValue::Int(i)) => Ok(ObjectSyntax::Integer(i)),
            (Class::Universal, _, DecodedValue::Bytes(b)) => Ok(ObjectSyntax::Bytes(b)),
            (Class::Universal, _, DecodedValue::Null) => Ok(ObjectSyntax::Null),
            (Class::Application, n, DecodedValue::Ip(ip)) if n == application::IP_ADDRESS => {
                Ok(ObjectSyntax::Ipv4(ip))
            }
            (Class::Application, n, DecodedValue::Unsigned(v)) if n == application::COUNTER32 => {
                Ok(ObjectSyntax::Counter32(v as u32))
            }
            (Class::Application, n, DecodedValue::Unsigned(v)) if n == application::GAUGE32 => {
                Ok(ObjectSyntax::Gauge32(v as u32))
            }
            (Class::Application, n, DecodedValue::Unsigned(v)) if n == application::TIME_TICKS => {
                Ok(ObjectSyntax::TimeTicks(v as u32))
            }
            (Class::Application, n, DecodedValue::Unsigned(v)) if n == application::UINTEGER32 => {
                Ok(ObjectSyntax::Uinteger32(v as u32))
            }
            (Class::Application, n, DecodedValue::Unsigned(v)) if n == application::COUNTER64 => {
                Ok(ObjectSyntax::Counter64(v))
            }
            (Class::Application, n, DecodedValue::Bytes(b)) if n == application::OPAQUE => {
                Ok(ObjectSyntax::Opaque(b))
            }
            (Class::Context, n, DecodedValue::Null) if n == exception::NO_SUCH_OBJECT => {
                Ok(ObjectSyntax::NoSuchObject)
            }
            (Class::Context, n, DecodedValue::Null) if n == exception::NO_SUCH_INSTANCE => {
                Ok(ObjectSyntax::NoSuchInstance)
            }
            (Class::Context, n, DecodedValue::Null) if n == exception::END_OF_MIB_VIEW => {
                Ok(ObjectSyntax::EndOfMibView)
            }
            (_, _, DecodedValue::Bytes(b)) => Ok(ObjectSyntax::Bytes(b)),
            _ => Err(BerError::Syntax("unrecognized varbind value tag".into())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PduData {
    Basic { error_status: i32, error_index: i32 },
    Bulk { non_repeaters: i32, max_repetitions: i32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pdu {
    pub pdu_type: u32,
    /// The outer tag's class as decoded off the wire. Always `Context` for
    /// a `Pdu` built via `basic`/`bulk` (every PDU type this crate emits is
    /// `[CONTEXT n]`); decode preserves whatever class the datagram
    /// actually carried so callers like the trap receiver can reject a
    /// well-numbered but wrong-class tag.
    pub pdu_class: Class,
    pub request_id: i32,
    pub data: PduData,
    pub varbinds: Vec<SnmpVarbind>,
}

impl Pdu {
    /// Generates a fresh positive request id, matching the reference's
    /// `random.randrange(1, 2_147_483_647)`.
    pub fn new_request_id() -> i32 {
        use rand::Rng;
        rand::thread_rng().gen_range(1..i32::MAX)
    }

    pub fn basic(pdu_type: u32, request_id: i32, varbinds: Vec<SnmpVarbind>) -> Self {
        Pdu {
            pdu_type,
            pdu_class: Class::Context,
            request_id,
            data: PduData::Basic {
                error_status: 0,
                error_index: 0,
            },
            varbinds,
        }
    }

    pub fn bulk(request_id: i32, non_repeaters: i32, max_repetitions: i32, varbinds: Vec<SnmpVarbind>) -> Self {
        Pdu {
            pdu_type: tags::pdu::GET_BULK_REQUEST,
            pdu_class: Class::Context,
            request_id,
            data: PduData::Bulk {
                non_repeaters,
                max_repetitions,
            },
            varbinds,
        }
    }

    pub(crate) fn encode(&self, enc: &mut Encoder) -> BerResult<()> {
        enc.enter(self.pdu_type, Class::Context);
        enc.write(EncodeValue::Int(&Integer::from(self.request_id)))?;
        match self.data {
            PduData::Basic {
                error_status,
                error_index,
            } => {
                enc.write(EncodeValue::Int(&Integer::from(error_status)))?;
                enc.write(EncodeValue::Int(&Integer::from(error_index)))?;
            }
            PduData::Bulk {
                non_repeaters,
                max_repetitions,
            } => {
                enc.write(EncodeValue::Int(&Integer::from(non_repeaters)))?;
                enc.write(EncodeValue::Int(&Integer::from(max_repetitions)))?;
            }
        }
        enc.enter_universal(crate::ber::Number::Sequence);
        for vb in &self.varbinds {
            vb.encode(enc)?;
        }
        enc.exit()?;
        enc.exit()?;
        Ok(())
    }

    pub(crate) fn decode(dec: &mut Decoder<'_>) -> BerResult<Self> {
        let outer_tag = dec.peek()?;
        dec.enter()?;

        let request_id = read_i32(dec)?;
        let data = if outer_tag.number == tags::pdu::GET_BULK_REQUEST {
            let non_repeaters = read_i32(dec)?;
            let max_repetitions = read_i32(dec)?;
            PduData::Bulk {
                non_repeaters,
                max_repetitions,
            }
        } else {
            let error_status = read_i32(dec)?;
            let error_index = read_i32(dec)?;
            PduData::Basic {
                error_status,
                error_index,
            }
        };

        dec.enter()?;
        let mut varbinds = Vec::new();
        while !dec.eof() {
            varbinds.push(SnmpVarbind::decode(dec)?);
        }
        dec.exit()?;

        dec.exit()?;
        Ok(Pdu {
            pdu_type: outer_tag.number,
            pdu_class: outer_tag.class,
            request_id,
            data,
            varbinds,
        })
    }
}

fn read_i32(dec: &mut Decoder<'_>) -> BerResult<i32> {
    let (_, value) = dec.read()?;
    match value {
        DecodedValue::Int(i) => i
            .to_i32()
            .ok_or(BerError::IntegerOverflow),
        _ => Err(BerError::Syntax("expected an INTEGER field".into())),
    }
}
