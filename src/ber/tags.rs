//! Tag numbers for the SNMP application and context classes. These are
//! plain `u32` constants rather than enum variants: the same small integers
//! are reused across classes (application tag 0 is `IpAddress`, context
//! tag 0 is `GetRequest`) and Rust enums cannot carry duplicate
//! discriminants cleanly across that split, so callers pair a number from
//! here with an explicit [`super::Class`].

/// SNMP `[APPLICATION n]` tags (primitive).
pub mod application {
    pub const IP_ADDRESS: u32 = 0;
    pub const COUNTER32: u32 = 1;
    pub const GAUGE32: u32 = 2;
    pub const TIME_TICKS: u32 = 3;
    pub const OPAQUE: u32 = 4;
    pub const NSAP_ADDRESS: u32 = 5;
    pub const COUNTER64: u32 = 6;
    pub const UINTEGER32: u32 = 7;
}

/// SNMP `[CONTEXT n]` PDU tags (constructed).
pub mod pdu {
    pub const GET_REQUEST: u32 = 0;
    pub const GET_NEXT_REQUEST: u32 = 1;
    pub const GET_RESPONSE: u32 = 2;
    pub const SET_REQUEST: u32 = 3;
    pub const SNMP_V1_TRAP: u32 = 4;
    pub const GET_BULK_REQUEST: u32 = 5;
    pub const INFORM_REQUEST: u32 = 6;
    pub const SNMP_V2_TRAP: u32 = 7;
    pub const REPORT: u32 = 8;
}

/// SNMP `[CONTEXT n]` exception values (primitive, appear in place of a
/// varbind's value rather than as a PDU wrapper).
pub mod exception {
    pub const NO_SUCH_OBJECT: u32 = 0;
    pub const NO_SUCH_INSTANCE: u32 = 1;
    pub const END_OF_MIB_VIEW: u32 = 2;
}
