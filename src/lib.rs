//! Async SNMPv2c client and trap receiver.
//!
//! `ber` implements the BER/DER codec the rest of the crate rides on top
//! of, `snmp` holds the SNMP message/PDU model and error taxonomy,
//! `manager` is the request/response client façade, and `trap` is the
//! inbound SNMPv2-Trap listener.

pub mod ber;
pub mod manager;
pub mod snmp;
pub mod trap;

pub use manager::{SetNumber, SetValue, Snmp};
pub use snmp::error::SnmpError;
pub use snmp::pdu::{ObjectSyntax, SnmpVarbind};
pub use trap::SnmpV2TrapServer;
