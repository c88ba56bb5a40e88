//! One-shot datagram send and receive.
//!
//! Every call binds its own socket and drops it before returning, so no
//! state leaks from one test case into the next.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tracing::{debug, instrument, trace};

use super::error::TransportError;
use super::socket::SocketBinding;

/// Default receive buffer; larger datagrams are truncated.
pub const DEFAULT_MAX_DATAGRAM: usize = 1024;

/// A received datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    payload: Bytes,
    source: SocketAddr,
}

impl Datagram {
    /// Payload bytes.
    #[must_use]
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Sender address.
    #[must_use]
    pub const fn source(&self) -> SocketAddr {
        self.source
    }

    /// Split into payload and sender address.
    #[must_use]
    pub fn into_parts(self) -> (Bytes, SocketAddr) {
        (self.payload, self.source)
    }
}

/// Send one datagram from an ephemeral socket.
///
/// Fire-and-forget: success means the OS accepted the bytes, not that the
/// peer received them.
#[instrument(level = "debug", skip(payload), fields(len = payload.len()))]
pub fn send_datagram(payload: &[u8], destination: SocketAddr) -> Result<usize, TransportError> {
    let socket = SocketBinding::bind(ephemeral_for(destination))?;
    let sent = socket.send_to(payload, destination)?;
    trace!(sent, "datagram handed to socket");
    Ok(sent)
}

/// Bind `bind`, wait up to `timeout` for one datagram, and return it.
#[instrument(level = "debug")]
pub fn receive_datagram(
    bind: SocketAddr,
    timeout: Duration,
    max_len: usize,
) -> Result<Datagram, TransportError> {
    if timeout.is_zero() {
        return Err(TransportError::ZeroTimeout);
    }

    let socket = SocketBinding::bind(bind)?;
    socket.set_read_timeout(Some(timeout))?;

    let mut buffer = BytesMut::zeroed(max_len);
    match socket.recv_from(&mut buffer) {
        Ok((len, source)) => {
            buffer.truncate(len);
            debug!(len, %source, "datagram received");
            Ok(Datagram {
                payload: buffer.freeze(),
                source,
            })
        }
        Err(err) if err.is_timeout() => Err(TransportError::Timeout { waited: timeout }),
        Err(err) => Err(err.into()),
    }
}

fn ephemeral_for(destination: SocketAddr) -> SocketAddr {
    match destination {
        SocketAddr::V4(_) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
        SocketAddr::V6(_) => SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::UdpSocket;
    use std::thread;

    fn free_port() -> u16 {
        UdpSocket::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port()
    }

    #[test]
    fn send_reaches_listener() {
        let listener = UdpSocket::bind("127.0.0.1:0").unwrap();
        listener
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();

        let sent = send_datagram(b"move", listener.local_addr().unwrap()).unwrap();
        assert_eq!(sent, 4);

        let mut buf = [0u8; 8];
        let (len, _) = listener.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], b"move");
    }

    #[test]
    fn receive_returns_payload_and_source() {
        let port = free_port();
        let bind: SocketAddr = ([127, 0, 0, 1], port).into();

        let sender = thread::spawn(move || {
            let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
            for _ in 0..20 {
                thread::sleep(Duration::from_millis(50));
                let _ = socket.send_to(b"telemetry", bind);
            }
        });

        let datagram =
            receive_datagram(bind, Duration::from_secs(3), DEFAULT_MAX_DATAGRAM).unwrap();
        assert_eq!(datagram.payload().as_ref(), b"telemetry");
        assert!(datagram.source().ip().is_loopback());

        sender.join().unwrap();
    }

    #[test]
    fn receive_times_out() {
        let bind: SocketAddr = ([127, 0, 0, 1], free_port()).into();
        let err = receive_datagram(bind, Duration::from_millis(50), 64).unwrap_err();
        assert!(matches!(
            err,
            TransportError::Timeout { waited } if waited == Duration::from_millis(50)
        ));
        assert!(err.is_timeout());
    }

    #[test]
    fn zero_timeout_rejected_before_binding() {
        let bind: SocketAddr = ([127, 0, 0, 1], 0).into();
        let err = receive_datagram(bind, Duration::ZERO, 64).unwrap_err();
        assert!(matches!(err, TransportError::ZeroTimeout));
    }

    #[cfg(unix)]
    #[test]
    fn oversized_datagram_truncated_to_buffer() {
        let port = free_port();
        let bind: SocketAddr = ([127, 0, 0, 1], port).into();

        let sender = thread::spawn(move || {
            let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
            for _ in 0..20 {
                thread::sleep(Duration::from_millis(50));
                let _ = socket.send_to(&[7u8; 100], bind);
            }
        });

        let datagram = receive_datagram(bind, Duration::from_secs(3), 10).unwrap();
        assert_eq!(datagram.payload().len(), 10);

        sender.join().unwrap();
    }

    #[test]
    fn broadcast_without_permission_is_socket_error() {
        let destination: SocketAddr = ([255, 255, 255, 255], 1234).into();
        let err = send_datagram(b"move", destination).unwrap_err();
        assert!(matches!(err, TransportError::Socket(_)));
    }
}
