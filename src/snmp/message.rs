//! The outermost `Sequence { version, community, pdu }` envelope, plus the
//! restricted trap-message decode that only accepts a v2c `SNMPv2-Trap`.

use crate::ber::{tags, BerError, BerResult, Class, Decoder, EncodeValue, Encoder, Number};
use crate::snmp::pdu::Pdu;

pub const VERSION_V2C: i32 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct SnmpMessage {
    pub version: i32,
    pub community: Vec<u8>,
    pub pdu: Pdu,
}

impl SnmpMessage {
    pub fn new(community: impl Into<Vec<u8>>, pdu: Pdu) -> Self {
        SnmpMessage {
            version: VERSION_V2C,
            community: community.into(),
            pdu,
        }
    }

    pub fn encode(&self) -> BerResult<Vec<u8>> {
        let mut enc = Encoder::new();
        enc.enter_universal(Number::Sequence);
        enc.write(EncodeValue::Int(&self.version.into()))?;
        enc.write(EncodeValue::Bytes(&self.community))?;
        self.pdu.encode(&mut enc)?;
        enc.exit()?;
        enc.output()
    }

    /// Decodes a message without validating the outer PDU tag against what
    /// the caller expected — a `GetResponse` is accepted as the reply to
    /// any request type, matching the reference client's behavior.
    pub fn decode(input: &[u8]) -> BerResult<Self> {
        let mut dec = Decoder::new(input);
        dec.enter()?;

        let (_, version_value) = dec.read()?;
        let version = match version_value {
            crate::ber::DecodedValue::Int(i) => i.to_i32().ok_or(BerError::IntegerOverflow)?,
            _ => return Err(BerError::Syntax("expected version INTEGER".into())),
        };

        let (_, community_value) = dec.read()?;
        let community = match community_value {
            crate::ber::DecodedValue::Bytes(b) => b,
            _ => return Err(BerError::Syntax("expected community OCTET STRING".into())),
        };

        let pdu = Pdu::decode(&mut dec)?;
        dec.exit()?;
        if !dec.eof() {
            return Err(BerError::TrailingData);
        }

        Ok(SnmpMessage {
            version,
            community,
            pdu,
        })
    }
}

/// A decoded SNMPv2 trap notification: version and community are exposed,
/// but only after `decode` has already confirmed this is in fact a v2c
/// trap.
#[derive(Debug, Clone, PartialEq)]
pub struct SnmpV2TrapMessage {
    pub community: Vec<u8>,
    pub pdu: Pdu,
}

impl SnmpV2TrapMessage {
    /// Returns `None` (rather than an error) for anything that isn't a
    /// well-formed v2c `SNMPv2-Trap`-PDU message: wrong version, or a PDU
    /// tag other than `[CONTEXT 7] Constructed`. Malformed bytes still
    /// decode to `None` rather than propagating a `BerError`, since a
    /// trap listener should silently drop noise rather than error out.
    pub fn decode(input: &[u8]) -> Option<Self> {
        let message = SnmpMessage::decode(input).ok()?;
        if message.version != VERSION_V2C {
            return None;
        }
        if message.pdu.pdu_class != Class::Context || message.pdu.pdu_type != tags::pdu::SNMP_V2_TRAP {
            return None;
        }
        Some(SnmpV2TrapMessage {
            community: message.community,
            pdu: message.pdu,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snmp::pdu::{ObjectSyntax, SnmpVarbind};

    #[test]
    fn round_trips_a_get_request_message() {
        let pdu = Pdu::basic(
            tags::pdu::GET_REQUEST,
            1,
            vec![SnmpVarbind::new("1.3.6.1.2.1.1.1.0", ObjectSyntax::Null)],
        );
        let message = SnmpMessage::new(b"public".to_vec(), pdu);
        let bytes = message.encode().unwrap();
        let decoded = SnmpMessage::decode(&bytes).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn trap_decode_rejects_non_trap_pdu() {
        let pdu = Pdu::basic(
            tags::pdu::GET_REQUEST,
            1,
            vec![SnmpVarbind::new("1.3.6.1.2.1.1.1.0", ObjectSyntax::Null)],
        );
        let message = SnmpMessage::new(b"public".to_vec(), pdu);
        let bytes = message.encode().unwrap();
        assert!(SnmpV2TrapMessage::decode(&bytes).is_none());
    }

    #[test]
    fn trap_decode_accepts_v2_trap_pdu() {
        let pdu = Pdu::basic(
            tags::pdu::SNMP_V2_TRAP,
            1,
            vec![SnmpVarbind::new("1.3.6.1.2.1.1.3.0", ObjectSyntax::TimeTicks(100))],
        );
        let message = SnmpMessage::new(b"public".to_vec(), pdu);
        let bytes = message.encode().unwrap();
        let trap = SnmpV2TrapMessage::decode(&bytes).unwrap();
        assert_eq!(trap.community, b"public");
    }

    #[test]
    fn trap_decode_returns_none_on_garbage() {
        assert!(SnmpV2TrapMessage::decode(&[0xFF, 0xFF, 0xFF]).is_none());
    }

    /// A datagram whose outer PDU tag is `[APPLICATION 7]` constructed
    /// (same number as `SNMPv2Trap`, wrong class) must not be accepted as
    /// a trap.
    #[test]
    fn trap_decode_rejects_right_number_wrong_class() {
        let mut enc = Encoder::new();
        enc.enter_universal(Number::Sequence);
        enc.write(EncodeValue::Int(&VERSION_V2C.into())).unwrap();
        enc.write(EncodeValue::Bytes(b"public")).unwrap();
        enc.enter(tags::pdu::SNMP_V2_TRAP, Class::Application);
        enc.write(EncodeValue::Int(&1i32.into())).unwrap();
        enc.write(EncodeValue::Int(&0i32.into())).unwrap();
        enc.write(EncodeValue::Int(&0i32.into())).unwrap();
        enc.enter_universal(Number::Sequence);
        enc.exit().unwrap();
        enc.exit().unwrap();
        enc.exit().unwrap();
        let bytes = enc.output().unwrap();

        assert!(SnmpV2TrapMessage::decode(&bytes).is_none());
    }
}
