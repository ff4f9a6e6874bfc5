//! UDP transport and request/response correlation.
//!
//! A single [`Transport`] owns one bound `UdpSocket` and a background task
//! that reads datagrams off it forever, matching each reply to whichever
//! `(peer host, peer port, request-id)` triple is waiting on it in
//! `pending`. `send` drives the retry loop: send, wait up to `timeout` for
//! the matching `oneshot` to fire, and try again up to `retries` times
//! before giving up with [`SnmpError::Timeout`].

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::snmp::{SnmpError, SnmpMessage, SnmpVarbind};

type PendingKey = (String, u16, i32);
type PendingMap = Arc<Mutex<HashMap<PendingKey, oneshot::Sender<Result<Vec<SnmpVarbind>, SnmpError>>>>>;

/// A bound UDP socket plus its background receive loop.
///
/// Dropping (or calling [`Transport::close`] on) the transport stops the
/// receive loop and releases the socket.
pub struct Transport {
    socket: Arc<UdpSocket>,
    pending: PendingMap,
    recv_task: Option<JoinHandle<()>>,
    timeout: Duration,
    retries: u32,
}

impl Transport {
    /// Binds a socket and connects it to `peer`, then spawns the receive
    /// loop. `local_addr` overrides the bind address (default
    /// `0.0.0.0:0`/`[::]:0`, chosen by the OS).
    pub async fn connect(
        peer: SocketAddr,
        local_addr: Option<SocketAddr>,
        timeout: Duration,
        retries: u32,
        validate_source_addr: bool,
    ) -> Result<Self, SnmpError> {
        let bind_addr = local_addr.unwrap_or_else(|| match peer {
            SocketAddr::V4(_) => "0.0.0.0:0".parse().unwrap(),
            SocketAddr::V6(_) => "[::]:0".parse().unwrap(),
        });
        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| SnmpError::ConnectionError(e.to_string()))?;
        socket
            .connect(peer)
            .await
            .map_err(|e| SnmpError::ConnectionError(e.to_string()))?;
        let socket = Arc::new(socket);

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let recv_task = tokio::spawn(receive_loop(
            Arc::clone(&socket),
            Arc::clone(&pending),
            peer,
            validate_source_addr,
        ));

        Ok(Transport {
            socket,
            pending,
            recv_task: Some(recv_task),
            timeout,
            retries,
        })
    }

    /// Sends `message` to the peer this transport is connected to and
    /// waits for its matching reply, resending up to `retries` times on
    /// timeout.
    pub async fn send(&self, message: &SnmpMessage) -> Result<Vec<SnmpVarbind>, SnmpError> {
        let peer = self
            .socket
            .peer_addr()
            .map_err(|e| SnmpError::ConnectionError(e.to_string()))?;
        let key: PendingKey = (peer.ip().to_string(), peer.port(), message.pdu.request_id);
        let bytes = message.encode()?;

        for attempt in 1..=self.retries.max(1) {
            let (tx, rx) = oneshot::channel();
            self.pending.lock().await.insert(key.clone(), tx);

            trace!(attempt, request_id = message.pdu.request_id, %peer, "sending SNMP request");
            if let Err(e) = self.socket.send(&bytes).await {
                self.pending.lock().await.remove(&key);
                return Err(SnmpError::ConnectionError(e.to_string()));
            }

            match tokio::time::timeout(self.timeout, rx).await {
                Ok(Ok(result)) => return result,
                Ok(Err(_)) => {
                    return Err(SnmpError::ConnectionError(
                        "transport receive loop ended".into(),
                    ));
                }
                Err(_) => {
                    self.pending.lock().await.remove(&key);
                    debug!(attempt, request_id = message.pdu.request_id, "SNMP request timed out, retrying");
                    continue;
                }
            }
        }

        Err(SnmpError::Timeout)
    }

    /// Stops the receive loop. Idempotent: calling this more than once, or
    /// letting `Transport` drop instead, is safe.
    pub fn close(&mut self) {
        if let Some(task) = self.recv_task.take() {
            task.abort();
        }
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.close();
    }
}

async fn receive_loop(socket: Arc<UdpSocket>, pending: PendingMap, peer: SocketAddr, validate_source_addr: bool) {
    let mut buf = [0u8; 65_535];
    loop {
        let (len, from) = match socket.recv_from(&mut buf).await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "SNMP transport receive error, stopping receive loop");
                return;
            }
        };

        if validate_source_addr && from != peer {
            warn!(%from, expected = %peer, "dropping datagram from unexpected source");
            continue;
        }

        let message = match SnmpMessage::decode(&buf[..len]) {
            Ok(m) => m,
            Err(e) => {
                warn!(error = %e, "dropping malformed SNMP response");
                continue;
            }
        };

        let key: PendingKey = (from.ip().to_string(), from.port(), message.pdu.request_id);
        let mut guard = pending.lock().await;
        let Some(tx) = guard.remove(&key) else {
            trace!(request_id = message.pdu.request_id, %from, "dropping response with no matching request");
            continue;
        };
        drop(guard);

        let (error_status, error_index) = match message.pdu.data {
            crate::snmp::pdu::PduData::Basic { error_status, error_index } => (error_status, error_index),
            crate::snmp::pdu::PduData::Bulk { .. } => (0, 0),
        };

        let result = if error_status != 0 {
            Err(SnmpError::from_status(error_status, error_index, &message.pdu.varbinds))
        } else {
            Ok(message.pdu.varbinds)
        };

        let _ = tx.send(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snmp::pdu::{ObjectSyntax, Pdu};
    use crate::snmp::SnmpVarbind as Vb;
    use tokio::net::UdpSocket as StdUdp;

    async fn loopback_agent(socket: StdUdp, reply_pdu_type: u32) {
        let mut buf = [0u8; 4096];
        loop {
            let (len, from) = match socket.recv_from(&mut buf).await {
                Ok(v) => v,
                Err(_) => return,
            };
            let Ok(req) = SnmpMessage::decode(&buf[..len]) else {
                continue;
            };
            let reply_pdu = Pdu::basic(
                reply_pdu_type,
                req.pdu.request_id,
                vec![Vb::new("1.3.6.1.2.1.1.1.0", ObjectSyntax::Text("hello".into()))],
            );
            let reply = SnmpMessage::new(req.community, reply_pdu);
            let _ = socket.send_to(&reply.encode().unwrap(), from).await;
        }
    }

    #[tokio::test]
    async fn round_trips_a_request_through_a_loopback_agent() {
        let agent_socket = StdUdp::bind("127.0.0.1:0").await.unwrap();
        let agent_addr = agent_socket.local_addr().unwrap();
        tokio::spawn(loopback_agent(agent_socket, crate::ber::tags::pdu::GET_RESPONSE));

        let transport = Transport::connect(agent_addr, None, Duration::from_millis(500), 3, true)
            .await
            .unwrap();

        let pdu = Pdu::basic(
            crate::ber::tags::pdu::GET_REQUEST,
            Pdu::new_request_id(),
            vec![Vb::new("1.3.6.1.2.1.1.1.0", ObjectSyntax::Null)],
        );
        let message = SnmpMessage::new(b"public".to_vec(), pdu);
        let varbinds = transport.send(&message).await.unwrap();
        assert_eq!(varbinds[0].oid, ".1.3.6.1.2.1.1.1.0");
    }

    #[tokio::test]
    async fn times_out_when_nothing_answers() {
        let dummy = StdUdp::bind("127.0.0.1:0").await.unwrap();
        let dead_addr = dummy.local_addr().unwrap();
        drop(dummy);

        let transport = Transport::connect(dead_addr, None, Duration::from_millis(50), 2, true)
            .await
            .unwrap();
        let pdu = Pdu::basic(
            crate::ber::tags::pdu::GET_REQUEST,
            Pdu::new_request_id(),
            vec![Vb::new("1.3.6.1.2.1.1.1.0", ObjectSyntax::Null)],
        );
        let message = SnmpMessage::new(b"public".to_vec(), pdu);
        let result = transport.send(&message).await;
        assert!(matches!(result, Err(SnmpError::Timeout)));
    }
}
