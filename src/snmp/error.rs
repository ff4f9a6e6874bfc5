//! The SNMP error taxonomy: one variant per RFC1905/RFC3416 error-status
//! code, plus the transport- and codec-level failures the client façade
//! can hit. Message text mirrors the reference implementation's fixed
//! per-status prose so the taxonomy is grounded rather than invented.

use thiserror::Error;

use crate::ber::BerError;

/// Renders the `oid: {oid}, ` clause, or nothing when the offending OID
/// couldn't be resolved (`error_index` out of range), matching
/// `SnmpErrorStatus.__init__`'s two message forms.
fn oid_clause(oid: &Option<String>) -> String {
    match oid {
        Some(oid) => format!("oid: {oid}, "),
        None => String::new(),
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SnmpError {
    #[error("index: {index}, {}message: the agent could not place the results of the requested SNMP operation in a single SNMP message", oid_clause(oid))]
    TooBig { index: i32, oid: Option<String> },

    #[error("index: {index}, {}message: the requested SNMP operation identified an unknown variable", oid_clause(oid))]
    NoSuchName { index: i32, oid: Option<String> },

    #[error("index: {index}, {}message: the requested SNMP operation tried to change a variable but it specified either a syntax or value error", oid_clause(oid))]
    BadValue { index: i32, oid: Option<String> },

    #[error("index: {index}, {}message: the requested SNMP operation tried to change a variable that was not allowed to change, according to the community profile of the variable", oid_clause(oid))]
    ReadOnly { index: i32, oid: Option<String> },

    #[error("index: {index}, {}message: an error other than one of those listed here occurred during the requested SNMP operation", oid_clause(oid))]
    GenErr { index: i32, oid: Option<String> },

    #[error("index: {index}, {}message: the specified SNMP variable is not accessible", oid_clause(oid))]
    NoAccess { index: i32, oid: Option<String> },

    #[error("index: {index}, {}message: the value specifies a type that is inconsistent with the type required for the variable", oid_clause(oid))]
    WrongType { index: i32, oid: Option<String> },

    #[error("index: {index}, {}message: the value specifies a length that is inconsistent with the length required for the variable", oid_clause(oid))]
    WrongLength { index: i32, oid: Option<String> },

    #[error("index: {index}, {}message: the value contains an ASN.1 encoding that is inconsistent with the ASN.1 tag of the field", oid_clause(oid))]
    WrongEncoding { index: i32, oid: Option<String> },

    #[error("index: {index}, {}message: the value cannot be assigned to the variable", oid_clause(oid))]
    WrongValue { index: i32, oid: Option<String> },

    #[error("index: {index}, {}message: the variable does not exist, and the agent cannot create it", oid_clause(oid))]
    NoCreation { index: i32, oid: Option<String> },

    #[error("index: {index}, {}message: the value is inconsistent with values of other managed objects", oid_clause(oid))]
    InconsistentValue { index: i32, oid: Option<String> },

    #[error("index: {index}, {}message: assigning the value to the variable requires allocation of resources that are currently unavailable", oid_clause(oid))]
    ResourceUnavailable { index: i32, oid: Option<String> },

    #[error("index: {index}, {}message: no validation errors occurred, but no variables were updated", oid_clause(oid))]
    CommitFailed { index: i32, oid: Option<String> },

    #[error("index: {index}, {}message: no validation errors occurred, some variables were updated because it was not possible to undo their assignment", oid_clause(oid))]
    UndoFailed { index: i32, oid: Option<String> },

    #[error("index: {index}, {}message: an authorization error occurred", oid_clause(oid))]
    AuthorizationError { index: i32, oid: Option<String> },

    #[error("index: {index}, {}message: the variable exists but the agent cannot modify it", oid_clause(oid))]
    NotWritable { index: i32, oid: Option<String> },

    #[error("index: {index}, {}message: the variable does not exist; the agent cannot create it because the named object instance is inconsistent with the values of other managed objects", oid_clause(oid))]
    InconsistentName { index: i32, oid: Option<String> },

    #[error("request timed out")]
    Timeout,

    #[error("connection error: {0}")]
    ConnectionError(String),

    #[error("unsupported value type for a varbind")]
    UnsupportedValueType,

    #[error(transparent)]
    Codec(#[from] BerError),
}

impl SnmpError {
    /// Builds the right variant for a non-zero `error-status`/`error-index`
    /// pair, looking up `varbinds[index-1]`'s OID the way the reference
    /// implementation's `SnmpProtocol.datagram_received` does. `oid` is
    /// `None` when `index` is out of range (including the "not applicable"
    /// value of 0), which drops the `oid: ..., ` clause from the rendered
    /// message.
    pub fn from_status(status: i32, index: i32, varbinds: &[crate::snmp::pdu::SnmpVarbind]) -> Self {
        let oid = if index >= 1 {
            varbinds.get((index - 1) as usize).map(|vb| vb.oid.clone())
        } else {
            None
        };

        match status {
            1 => SnmpError::TooBig { index, oid },
            2 => SnmpError::NoSuchName { index, oid },
            3 => SnmpError::BadValue { index, oid },
            4 => SnmpError::ReadOnly { index, oid },
            5 => SnmpError::GenErr { index, oid },
            6 => SnmpError::NoAccess { index, oid },
            7 => SnmpError::WrongType { index, oid },
            8 => SnmpError::WrongLength { index, oid },
            9 => SnmpError::WrongEncoding { index, oid },
            10 => SnmpError::WrongValue { index, oid },
            11 => SnmpError::NoCreation { index, oid },
            12 => SnmpError::InconsistentValue { index, oid },
            13 => SnmpError::ResourceUnavailable { index, oid },
            14 => SnmpError::CommitFailed { index, oid },
            15 => SnmpError::UndoFailed { index, oid },
            16 => SnmpError::AuthorizationError { index, oid },
            17 => SnmpError::NotWritable { index, oid },
            18 => SnmpError::InconsistentName { index, oid },
            _ => SnmpError::GenErr { index, oid },
        }
    }
}
