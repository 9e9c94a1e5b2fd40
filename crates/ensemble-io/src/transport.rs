// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Delivery of SDP messages towards the host
//!
//! The transmitter only knows [`P2pTransport`]. On hardware that is the
//! monitor core; here it is either an in-memory queue for tests or a UDP
//! socket pointed at the host's IP tag listener.

use crate::error::TransportError;
use crate::sdp::SdpMessage;
use std::sync::Arc;

/// Outbound message path
///
/// `send` must not block for longer than a fraction of a tick.
pub trait P2pTransport: Send {
    fn send(&mut self, message: &SdpMessage) -> Result<(), TransportError>;
}

impl<T: P2pTransport + ?Sized> P2pTransport for Box<T> {
    fn send(&mut self, message: &SdpMessage) -> Result<(), TransportError> {
        (**self).send(message)
    }
}

/// Keeps every sent message; clones share the same queue
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    sent: Arc<parking_lot::Mutex<Vec<SdpMessage>>>,
    closed: Arc<std::sync::atomic::AtomicBool>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent so far, oldest first
    pub fn sent(&self) -> Vec<SdpMessage> {
        self.sent.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.lock().is_empty()
    }

    /// Make every later `send` fail with [`TransportError::Closed`]
    pub fn close(&self) {
        self.closed
            .store(true, std::sync::atomic::Ordering::Release);
    }
}

impl P2pTransport for MemoryTransport {
    fn send(&mut self, message: &SdpMessage) -> Result<(), TransportError> {
        if self.closed.load(std::sync::atomic::Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        self.sent.lock().push(message.clone());
        Ok(())
    }
}

#[cfg(feature = "udp-transport")]
pub use udp::UdpTransport;

#[cfg(feature = "udp-transport")]
mod udp {
    use super::*;
    use crate::sdp::{CMD_HEADER_BYTES, MAX_DATA_BYTES, SDP_HEADER_BYTES};
    use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
    use tracing::info;

    /// Two zero bytes precede the SDP header in an IP tag datagram
    const IPTAG_PADDING: [u8; 2] = [0, 0];

    /// Sends each message as one IP tag datagram
    #[derive(Debug)]
    pub struct UdpTransport {
        socket: UdpSocket,
        target: SocketAddr,
        buf: Vec<u8>,
    }

    impl UdpTransport {
        /// Bind an ephemeral local port and aim at `target`
        pub fn connect(target: impl ToSocketAddrs) -> Result<Self, TransportError> {
            let target = target.to_socket_addrs()?.next().ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "no target address")
            })?;
            let bind: SocketAddr = if target.is_ipv4() {
                ([0, 0, 0, 0], 0).into()
            } else {
                ([0u16; 8], 0).into()
            };
            let socket = UdpSocket::bind(bind)?;
            socket.set_nonblocking(true)?;
            info!("[SDP-TX] UDP transport sending to {}", target);
            Ok(Self {
                socket,
                target,
                buf: Vec::with_capacity(
                    IPTAG_PADDING.len() + SDP_HEADER_BYTES + CMD_HEADER_BYTES + MAX_DATA_BYTES,
                ),
            })
        }

        pub fn target(&self) -> SocketAddr {
            self.target
        }
    }

    impl P2pTransport for UdpTransport {
        fn send(&mut self, message: &SdpMessage) -> Result<(), TransportError> {
            self.buf.clear();
            self.buf.extend_from_slice(&IPTAG_PADDING);
            message.encode_into(&mut self.buf);
            self.socket.send_to(&self.buf, self.target)?;
            Ok(())
        }
    }
}
