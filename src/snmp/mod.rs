//! The SNMPv2c message model: wire shapes (`message`, `pdu`) and the error
//! taxonomy (`error`) client code maps a non-zero `error-status` onto.

pub mod error;
pub mod message;
pub mod pdu;

pub use error::SnmpError;
pub use message::{SnmpMessage, SnmpV2TrapMessage};
pub use pdu::{ObjectSyntax, Pdu, PduData, SnmpVarbind};
