//! Transport-level error types covering socket failures and timeouts.

use super::socket::SocketError;
use core::fmt;
use std::time::Duration;

/// Unified error type for datagram transport operations.
#[derive(Debug)]
pub enum TransportError {
    /// Underlying socket failure.
    Socket(SocketError),
    /// No datagram arrived within the receive window.
    Timeout {
        /// Length of the window that expired.
        waited: Duration,
    },
    /// A zero receive window was requested; the OS treats it as "block forever".
    ZeroTimeout,
}

impl TransportError {
    /// Whether this is an expired receive window.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Socket(err) => write!(f, "socket error: {err}"),
            Self::Timeout { waited } => {
                write!(f, "timed out after {:.1}s waiting for datagram", waited.as_secs_f64())
            }
            Self::ZeroTimeout => write!(f, "receive timeout must be non-zero"),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Socket(err) => Some(err),
            Self::Timeout { .. } | Self::ZeroTimeout => None,
        }
    }
}

impl From<SocketError> for TransportError {
    fn from(err: SocketError) -> Self {
        Self::Socket(err)
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Socket(SocketError::Io(err))
    }
}
