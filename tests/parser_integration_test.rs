//! Decodes real captured SNMPv2c datagrams (not round-tripped through our
//! own encoder) to pin the wire format against `SnmpMessage::decode`.

use rusnmp::ber::tags;
use rusnmp::snmp::pdu::ObjectSyntax;
use rusnmp::snmp::SnmpMessage;

const RAW_PACKET: &[u8] = &[
    0x30, 0x29, 0x02, 0x01, 0x01, 0x04, 0x06, 0x70, 0x75, 0x62, 0x6c, 0x69, 0x63, 0xa0, 0x1c, 0x02,
    0x04, 0x00, 0x00, 0x00, 0x01, 0x02, 0x01, 0x00, 0x02, 0x01, 0x00, 0x30, 0x0e, 0x30, 0x0c, 0x06,
    0x08, 0x2b, 0x06, 0x01, 0x02, 0x01, 0x01, 0x01, 0x00, 0x05, 0x00,
];

#[test]
fn decodes_a_v2c_get_request() {
    let message = SnmpMessage::decode(RAW_PACKET).unwrap();

    assert_eq!(message.version, 1);
    assert_eq!(message.community, b"public");

    let pdu = message.pdu;
    assert_eq!(pdu.pdu_type, tags::pdu::GET_REQUEST);
    assert_eq!(pdu.request_id, 1);

    assert_eq!(pdu.varbinds.len(), 1);
    let varbind = &pdu.varbinds[0];
    assert_eq!(varbind.oid, ".1.3.6.1.2.1.1.1.0");
    assert_eq!(varbind.value, ObjectSyntax::Null);
}

const RAW_PACKET_RESPONSE: &[u8] = &[
    0x30, 0x42, 0x02, 0x01, 0x01, 0x04, 0x06, 0x70, 0x75, 0x62, 0x6c, 0x69, 0x63, 0xa2, 0x35, 0x02,
    0x04, 0x00, 0x00, 0x00, 0x01, 0x02, 0x01, 0x00, 0x02, 0x01, 0x00, 0x30, 0x27, 0x30, 0x25, 0x06,
    0x08, 0x2b, 0x06, 0x01, 0x02, 0x01, 0x01, 0x01, 0x00, 0x04, 0x19, 0x53, 0x61, 0x6d, 0x70, 0x6c,
    0x65, 0x20, 0x73, 0x79, 0x73, 0x74, 0x65, 0x6d, 0x20, 0x64, 0x65, 0x73, 0x63, 0x72, 0x69, 0x70,
    0x74, 0x69, 0x6f, 0x6e,
];

#[test]
fn decodes_a_v2c_get_response() {
    let message = SnmpMessage::decode(RAW_PACKET_RESPONSE).unwrap();

    assert_eq!(message.version, 1);
    assert_eq!(message.community, b"public");

    let pdu = message.pdu;
    assert_eq!(pdu.pdu_type, tags::pdu::GET_RESPONSE);
    assert_eq!(pdu.request_id, 1);

    assert_eq!(pdu.varbinds.len(), 1);
    let varbind = &pdu.varbinds[0];
    assert_eq!(varbind.oid, ".1.3.6.1.2.1.1.1.0");

    match &varbind.value {
        ObjectSyntax::Bytes(val) => assert_eq!(val, b"Sample system description"),
        other => panic!("expected Bytes, got {other:?}"),
    }
}

#[test]
fn decode_rejects_truncated_input() {
    assert!(SnmpMessage::decode(&RAW_PACKET[..RAW_PACKET.len() - 5]).is_err());
}

#[test]
fn re_encoding_a_decoded_message_round_trips() {
    let message = SnmpMessage::decode(RAW_PACKET).unwrap();
    let bytes = message.encode().unwrap();
    let redecoded = SnmpMessage::decode(&bytes).unwrap();
    assert_eq!(redecoded, message);
}
