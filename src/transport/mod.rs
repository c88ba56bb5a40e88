//! UDP datagram transport
//!
//! Connectionless and unreliable: no acknowledgement, retry or ordering.

#[cfg(feature = "debug-tools")]
mod capture;
mod error;
mod link;
mod socket;

#[cfg(feature = "debug-tools")]
pub use capture::PcapRecorder;
pub use error::TransportError;
pub use link::{DEFAULT_MAX_DATAGRAM, Datagram, receive_datagram, send_datagram};
pub use socket::{SocketBinding, SocketError};
