//! Minimal UDP socket wrapper.

use std::fmt;
use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

/// Error type for socket operations.
#[derive(Debug)]
pub enum SocketError {
    /// Underlying I/O error
    Io(io::Error),
}

impl SocketError {
    /// Whether the error is an expired read timeout.
    ///
    /// Platforms disagree on the kind: Unix reports `WouldBlock`, Windows
    /// reports `TimedOut`.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Io(err) => matches!(
                err.kind(),
                io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
            ),
        }
    }
}

impl fmt::Display for SocketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for SocketError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
        }
    }
}

impl From<io::Error> for SocketError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

/// Binding for a UDP socket, closed when dropped.
#[derive(Debug)]
pub struct SocketBinding {
    socket: UdpSocket,
}

impl SocketBinding {
    /// Bind to the provided address.
    pub fn bind(addr: SocketAddr) -> Result<Self, SocketError> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_nonblocking(false)?;
        Ok(Self { socket })
    }

    /// Set socket read timeout.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<(), SocketError> {
        self.socket.set_read_timeout(timeout)?;
        Ok(())
    }

    /// Send bytes to a remote address.
    pub fn send_to(&self, buf: &[u8], addr: SocketAddr) -> Result<usize, SocketError> {
        Ok(self.socket.send_to(buf, addr)?)
    }

    /// Receive bytes into the provided buffer.
    pub fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr), SocketError> {
        Ok(self.socket.recv_from(buf)?)
    }

    /// Access the local address for this binding.
    pub fn local_addr(&self) -> Result<SocketAddr, SocketError> {
        Ok(self.socket.local_addr()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_send_and_receive() {
        let rx = SocketBinding::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let tx = SocketBinding::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        rx.set_read_timeout(Some(Duration::from_secs(2))).unwrap();

        let sent = tx.send_to(b"hk", rx.local_addr().unwrap()).unwrap();
        assert_eq!(sent, 2);

        let mut buf = [0u8; 16];
        let (len, from) = rx.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], b"hk");
        assert_eq!(from, tx.local_addr().unwrap());
    }

    #[test]
    fn expired_read_is_timeout() {
        let rx = SocketBinding::bind("127.0.0.1:0".parse().unwrap()).unwrap();
        rx.set_read_timeout(Some(Duration::from_millis(20))).unwrap();

        let mut buf = [0u8; 16];
        let err = rx.recv_from(&mut buf).unwrap_err();
        assert!(err.is_timeout());
    }
}
