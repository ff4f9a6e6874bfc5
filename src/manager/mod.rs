//! The synchronous-looking async client façade: [`Snmp`] wraps one
//! [`network::Transport`] and turns it into `get`/`get_next`/`get_bulk`/
//! `set`/`walk`/`bulk_walk` calls.

pub mod network;

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use tokio::net::lookup_host;
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

use crate::ber::tags;
use crate::snmp::pdu::{ObjectSyntax, Pdu};
use crate::snmp::{SnmpError, SnmpMessage, SnmpVarbind};
use network::Transport;

const DEFAULT_PORT: u16 = 161;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);
const DEFAULT_RETRIES: u32 = 6;
const DEFAULT_NON_REPEATERS: i32 = 0;
const DEFAULT_MAX_REPETITIONS: i32 = 10;

/// A value accepted by [`Snmp::set`]. Mirrors the reference client's
/// runtime restriction to `int`/`str`/`bytes`/ipv4 for settable varbinds,
/// just enforced by the type system instead of an `isinstance` check.
#[derive(Debug, Clone, PartialEq)]
pub enum SetValue {
    Int(i64),
    Text(String),
    Bytes(Vec<u8>),
    Ipv4(Ipv4Addr),
}

impl From<SetValue> for ObjectSyntax {
    fn from(value: SetValue) -> Self {
        match value {
            SetValue::Int(i) => ObjectSyntax::Integer(i.into()),
            SetValue::Text(s) => ObjectSyntax::Text(s),
            SetValue::Bytes(b) => ObjectSyntax::Bytes(b),
            SetValue::Ipv4(ip) => ObjectSyntax::Ipv4(ip),
        }
    }
}

/// The varbind's optional third `number` element (spec.md §3/§4.5):
/// selects an explicit application-class tag for a SET value when the
/// default `SetValue` -> `ObjectSyntax` mapping would pick the wrong one
/// (e.g. a plain `Integer` instead of a `Counter32`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetNumber {
    Counter32,
    Gauge32,
    TimeTicks,
    Counter64,
    Uinteger32,
}

/// Applies an optional explicit `number` override to a `SetValue`. Only an
/// `Int` can be redirected to one of the application-class counter/gauge
/// types — pairing a number override with `Text`/`Bytes`/`Ipv4` has no
/// sensible encoding, so it's rejected the same way the reference client
/// rejects a SET value outside `int`/`str`/`bytes`/ipv4.
fn apply_set_number(value: SetValue, number: Option<SetNumber>) -> Result<ObjectSyntax, SnmpError> {
    match (number, value) {
        (None, value) => Ok(ObjectSyntax::from(value)),
        (Some(SetNumber::Counter32), SetValue::Int(i)) => Ok(ObjectSyntax::Counter32(i as u32)),
        (Some(SetNumber::Gauge32), SetValue::Int(i)) => Ok(ObjectSyntax::Gauge32(i as u32)),
        (Some(SetNumber::TimeTicks), SetValue::Int(i)) => Ok(ObjectSyntax::TimeTicks(i as u32)),
        (Some(SetNumber::Counter64), SetValue::Int(i)) => Ok(ObjectSyntax::Counter64(i as u64)),
        (Some(SetNumber::Uinteger32), SetValue::Int(i)) => Ok(ObjectSyntax::Uinteger32(i as u32)),
        (Some(_), _) => Err(SnmpError::UnsupportedValueType),
    }
}

/// An SNMPv2c client for a single agent.
///
/// The underlying socket is opened lazily on the first request and kept
/// open across calls; `close` (or dropping the `Snmp`) tears it down.
pub struct Snmp {
    host: String,
    port: u16,
    community: String,
    timeout: Duration,
    retries: u32,
    non_repeaters: i32,
    max_repetitions: i32,
    local_addr: Option<SocketAddr>,
    validate_source_addr: bool,
    transport: Mutex<Option<Transport>>,
    closed: std::sync::atomic::AtomicBool,
}

impl Snmp {
    pub fn new(host: impl Into<String>) -> Self {
        Snmp {
            host: host.into(),
            port: DEFAULT_PORT,
            community: "public".to_string(),
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
            non_repeaters: DEFAULT_NON_REPEATERS,
            max_repetitions: DEFAULT_MAX_REPETITIONS,
            local_addr: None,
            validate_source_addr: true,
            transport: Mutex::new(None),
            closed: std::sync::atomic::AtomicBool::new(false),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_community(mut self, community: impl Into<String>) -> Self {
        self.community = community.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_non_repeaters(mut self, non_repeaters: i32) -> Self {
        self.non_repeaters = non_repeaters;
        self
    }

    pub fn with_max_repetitions(mut self, max_repetitions: i32) -> Self {
        self.max_repetitions = max_repetitions;
        self
    }

    pub fn with_local_addr(mut self, local_addr: SocketAddr) -> Self {
        self.local_addr = Some(local_addr);
        self
    }

    pub fn with_validate_source_addr(mut self, validate: bool) -> Self {
        self.validate_source_addr = validate;
        self
    }

    async fn ensure_connected(&self) -> Result<(), SnmpError> {
        if self.closed.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(SnmpError::ConnectionError("Connection is closed".into()));
        }
        let mut guard = self.transport.lock().await;
        if guard.is_some() {
            return Ok(());
        }
        let target = format!("{}:{}", self.host, self.port);
        let peer = lookup_host(&target)
            .await
            .map_err(|e| SnmpError::ConnectionError(e.to_string()))?
            .next()
            .ok_or_else(|| SnmpError::ConnectionError(format!("could not resolve {target}")))?;
        let transport = Transport::connect(
            peer,
            self.local_addr,
            self.timeout,
            self.retries,
            self.validate_source_addr,
        )
        .await?;
        *guard = Some(transport);
        Ok(())
    }

    async fn send(&self, pdu: Pdu) -> Result<Vec<SnmpVarbind>, SnmpError> {
        self.ensure_connected().await?;
        let message = SnmpMessage::new(self.community.as_bytes().to_vec(), pdu);
        let guard = self.transport.lock().await;
        let transport = guard.as_ref().ok_or_else(|| {
            SnmpError::ConnectionError("transport unexpectedly absent after connect".into())
        })?;
        transport.send(&message).await
    }

    fn null_varbinds(oids: &[&str]) -> Vec<SnmpVarbind> {
        oids.iter()
            .map(|oid| SnmpVarbind::new(*oid, ObjectSyntax::Null))
            .collect()
    }

    /// Retrieves one or more values from the agent.
    pub async fn get(&self, oids: &[&str]) -> Result<Vec<SnmpVarbind>, SnmpError> {
        let pdu = Pdu::basic(tags::pdu::GET_REQUEST, Pdu::new_request_id(), Self::null_varbinds(oids));
        self.send(pdu).await
    }

    /// Retrieves the value of the next OID in the tree for each requested
    /// OID.
    pub async fn get_next(&self, oids: &[&str]) -> Result<Vec<SnmpVarbind>, SnmpError> {
        let pdu = Pdu::basic(
            tags::pdu::GET_NEXT_REQUEST,
            Pdu::new_request_id(),
            Self::null_varbinds(oids),
        );
        self.send(pdu).await
    }

    /// Performs a bulk `get-next`, returning up to `max_repetitions`
    /// successors per requested OID (after `non_repeaters` plain
    /// `get-next`s). Overrides fall back to the client's configured
    /// defaults when omitted.
    pub async fn get_bulk(
        &self,
        oids: &[&str],
        non_repeaters: Option<i32>,
        max_repetitions: Option<i32>,
    ) -> Result<Vec<SnmpVarbind>, SnmpError> {
        let nr = non_repeaters.unwrap_or(self.non_repeaters);
        let mr = max_repetitions.unwrap_or(self.max_repetitions);
        trace!(target = %self.host, oids = ?oids, non_repeaters = nr, max_repetitions = mr, "Sending GETBULK request");
        let pdu = Pdu::bulk(Pdu::new_request_id(), nr, mr, Self::null_varbinds(oids));
        self.send(pdu).await
    }

    /// Modifies the value of one or more managed objects. Each entry is an
    /// `(oid, value)` pair, optionally with an explicit third `number`
    /// selecting the wire tag (e.g. `Counter32`) — spec.md §4.5's
    /// `(oid, value)` / `(oid, value, number)` varbind forms.
    pub async fn set(
        &self,
        varbinds: Vec<(String, SetValue, Option<SetNumber>)>,
    ) -> Result<Vec<SnmpVarbind>, SnmpError> {
        let varbinds = varbinds
            .into_iter()
            .map(|(oid, value, number)| Ok(SnmpVarbind::new(oid, apply_set_number(value, number)?)))
            .collect::<Result<Vec<_>, SnmpError>>()?;
        let pdu = Pdu::basic(tags::pdu::SET_REQUEST, Pdu::new_request_id(), varbinds);
        self.send(pdu).await
    }

    /// Walks a subtree with repeated `get-next` calls. If the very first
    /// `get-next` lands outside `oid`'s subtree, falls back to a plain
    /// `get` on `oid` itself (matching the reference client rather than
    /// simply returning an empty list).
    pub async fn walk(&self, oid: &str) -> Result<Vec<SnmpVarbind>, SnmpError> {
        let base = normalize_oid(oid);
        let mut vbs = self.get_next(&[oid]).await?;
        if vbs.len() > 1 {
            warn!(target = %self.host, oid = %oid, "Received multiple varbinds for single GETNEXT request");
        }
        let mut next_oid = vbs[0].oid.clone();
        if !in_subtree(&base, &next_oid) {
            debug!(target = %self.host, base_oid = %base, next_oid = %next_oid, "Walk finished: OID left requested subtree on first GETNEXT, falling back to GET");
            return self.get(&[base.as_str()]).await;
        }

        let mut varbinds = vec![vbs.remove(0)];
        loop {
            vbs = self.get_next(&[next_oid.as_str()]).await?;
            if vbs.len() > 1 {
                warn!(target = %self.host, base_oid = %base, "Received multiple varbinds for single GETNEXT request");
            }
            next_oid = vbs[0].oid.clone();
            if !in_subtree(&base, &next_oid) {
                debug!(target = %self.host, base_oid = %base, next_oid = %next_oid, "Walk finished: OID left requested subtree");
                break;
            }
            varbinds.push(vbs.remove(0));
        }
        debug!(target = %self.host, base_oid = %base, count = varbinds.len(), "Walk finished");
        Ok(varbinds)
    }

    /// Walks a subtree with repeated `get-bulk` calls.
    ///
    /// If the first varbind of the very first batch already falls outside
    /// `oid`'s subtree (or carries an exception value), falls back to a
    /// plain `get` the same way `walk` does. Once a later batch runs off
    /// the end of the subtree, the walk stops and returns what it has so
    /// far instead of falling back.
    pub async fn bulk_walk(
        &self,
        oid: &str,
        non_repeaters: Option<i32>,
        max_repetitions: Option<i32>,
    ) -> Result<Vec<SnmpVarbind>, SnmpError> {
        let nr = non_repeaters.unwrap_or(self.non_repeaters);
        let mr = max_repetitions.unwrap_or(self.max_repetitions);
        let base = normalize_oid(oid);

        let mut varbinds = Vec::new();
        let first_batch = self.get_bulk(&[base.as_str()], Some(nr), Some(mr)).await?;
        let mut next_oid = String::new();
        for (i, vb) in first_batch.into_iter().enumerate() {
            if !in_subtree(&base, &vb.oid) || is_exception(&vb.value) {
                if i == 0 {
                    debug!(target = %self.host, base_oid = %base, "Walk finished: first GETBULK varbind outside requested subtree, falling back to GET");
                    return self.get(&[base.as_str()]).await;
                }
                debug!(target = %self.host, base_oid = %base, count = varbinds.len(), "Walk finished: GETBULK batch ran off the end of the subtree");
                return Ok(varbinds);
            }
            next_oid = vb.oid.clone();
            varbinds.push(vb);
        }

        while !next_oid.is_empty() {
            let batch = self.get_bulk(&[next_oid.as_str()], Some(nr), Some(mr)).await?;
            for vb in batch {
                if !in_subtree(&base, &vb.oid) || is_exception(&vb.value) {
                    next_oid.clear();
                    break;
                }
                next_oid = vb.oid.clone();
                varbinds.push(vb);
            }
        }
        debug!(target = %self.host, base_oid = %base, count = varbinds.len(), "Walk finished");
        Ok(varbinds)
    }

    /// Closes the underlying socket and marks this client closed. Safe to
    /// call more than once. Unlike a fresh `Snmp`, a closed client never
    /// reconnects: any subsequent request raises `ConnectionError`.
    pub async fn close(&self) {
        self.closed.store(true, std::sync::atomic::Ordering::SeqCst);
        let mut guard = self.transport.lock().await;
        if let Some(mut transport) = guard.take() {
            transport.close();
        }
    }
}

fn normalize_oid(oid: &str) -> String {
    if let Some(stripped) = oid.strip_prefix('.') {
        format!(".{stripped}")
    } else {
        format!(".{oid}")
    }
}

fn in_subtree(base: &str, oid: &str) -> bool {
    oid.starts_with(base) && oid[base.len()..].starts_with('.')
}

fn is_exception(value: &ObjectSyntax) -> bool {
    matches!(
        value,
        ObjectSyntax::NoSuchObject | ObjectSyntax::NoSuchInstance | ObjectSyntax::EndOfMibView
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_oids_with_and_without_leading_dot() {
        assert_eq!(normalize_oid("1.3.6.1"), ".1.3.6.1");
        assert_eq!(normalize_oid(".1.3.6.1"), ".1.3.6.1");
    }

    #[test]
    fn in_subtree_requires_a_dot_boundary() {
        assert!(in_subtree(".1.3.6.1", ".1.3.6.1.1"));
        assert!(!in_subtree(".1.3.6.1", ".1.3.6.10"));
        assert!(!in_subtree(".1.3.6.1", ".1.3.6.1"));
    }

    #[test]
    fn set_value_maps_to_object_syntax() {
        assert_eq!(ObjectSyntax::from(SetValue::Text("hi".into())), ObjectSyntax::Text("hi".into()));
    }

    #[test]
    fn set_number_redirects_an_int_to_counter32() {
        let syntax = apply_set_number(SetValue::Int(42), Some(SetNumber::Counter32)).unwrap();
        assert_eq!(syntax, ObjectSyntax::Counter32(42));
    }

    #[test]
    fn set_number_rejects_non_int_value() {
        let result = apply_set_number(SetValue::Text("hi".into()), Some(SetNumber::Counter32));
        assert!(matches!(result, Err(SnmpError::UnsupportedValueType)));
    }

    #[tokio::test]
    async fn closed_client_rejects_further_sends() {
        let snmp = Snmp::new("127.0.0.1").with_port(1).with_retries(1);
        snmp.close().await;
        let result = snmp.get(&["1.3.6.1.2.1.1.1.0"]).await;
        assert!(matches!(result, Err(SnmpError::ConnectionError(_))));
    }
}
