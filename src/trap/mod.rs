//! The inbound SNMPv2-Trap listener: bind a UDP socket, decode whatever
//! lands on it as a trap, and hand each one off to a user-supplied
//! handler.

use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::net::UdpSocket;
use tracing::{debug, error, info};

use crate::snmp::{SnmpError, SnmpV2TrapMessage};

const DEFAULT_PORT: u16 = 162;

pub type TrapHandler = Arc<dyn Fn(IpAddr, u16, SnmpV2TrapMessage) -> BoxFuture<'static, ()> + Send + Sync>;

fn default_handler(host: IpAddr, port: u16, message: SnmpV2TrapMessage) -> BoxFuture<'static, ()> {
    Box::pin(async move {
        info!(
            %host,
            port,
            community = %String::from_utf8_lossy(&message.community),
            varbinds = message.pdu.varbinds.len(),
            "received SNMPv2 trap"
        );
    })
}

/// Listens for incoming SNMPv2-Trap datagrams on `host:port`.
///
/// Each accepted trap is dispatched to `handler` on its own task, so a
/// slow handler doesn't stall the receive loop. `communities`, when set,
/// restricts accepted traps to those carrying one of the listed community
/// strings; traps that fail to decode, or whose community isn't allowed,
/// are dropped silently.
pub struct SnmpV2TrapServer {
    host: String,
    port: u16,
    communities: Option<HashSet<String>>,
    handler: TrapHandler,
}

impl SnmpV2TrapServer {
    pub fn new() -> Self {
        SnmpV2TrapServer {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            communities: None,
            handler: Arc::new(default_handler),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_communities(mut self, communities: impl IntoIterator<Item = String>) -> Self {
        self.communities = Some(communities.into_iter().collect());
        self
    }

    pub fn with_handler(mut self, handler: TrapHandler) -> Self {
        self.handler = handler;
        self
    }

    /// Binds the socket and loops forever, dispatching decoded traps.
    /// Returns only if the socket itself cannot be bound.
    pub async fn run(self) -> Result<(), SnmpError> {
        let bind_addr = format!("{}:{}", self.host, self.port);
        let socket = UdpSocket::bind(&bind_addr)
            .await
            .map_err(|e| SnmpError::ConnectionError(e.to_string()))?;
        info!(%bind_addr, "SNMP trap listener started");

        let mut buf = vec![0u8; 65_535];
        loop {
            let (len, from) = match socket.recv_from(&mut buf).await {
                Ok(v) => v,
                Err(e) => {
                    error!(error = %e, "error receiving SNMP trap datagram");
                    continue;
                }
            };

            let Some(message) = SnmpV2TrapMessage::decode(&buf[..len]) else {
                debug!(%from, "dropping non-trap or malformed datagram");
                continue;
            };

            if let Some(communities) = &self.communities {
                let community = String::from_utf8_lossy(&message.community).to_string();
                if !communities.contains(&community) {
                    debug!(%from, community, "dropping trap with unrecognized community");
                    continue;
                }
            }

            let handler = Arc::clone(&self.handler);
            let host = from.ip();
            let port = from.port();
            tokio::spawn(async move {
                handler(host, port, message).await;
            });
        }
    }
}

impl Default for SnmpV2TrapServer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ber::tags;
    use crate::snmp::pdu::{ObjectSyntax, Pdu};
    use crate::snmp::SnmpMessage;

    #[test]
    fn builder_defaults_to_port_162_and_no_community_filter() {
        let server = SnmpV2TrapServer::new();
        assert_eq!(server.port, 162);
        assert!(server.communities.is_none());
    }

    #[test]
    fn with_communities_builds_a_set() {
        let server = SnmpV2TrapServer::new().with_communities(["public".to_string()]);
        assert!(server.communities.unwrap().contains("public"));
    }

    #[test]
    fn trap_message_survives_encode_decode_for_dispatch() {
        let varbind = crate::snmp::SnmpVarbind::new("1.3.6.1.2.1.1.3.0", ObjectSyntax::TimeTicks(42));
        let pdu = Pdu::basic(tags::pdu::SNMP_V2_TRAP, 1, vec![varbind]);
        let message = SnmpMessage::new(b"public".to_vec(), pdu);
        let bytes = message.encode().unwrap();
        assert!(SnmpV2TrapMessage::decode(&bytes).is_some());
    }
}
