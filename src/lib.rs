//! Movement command codec and UDP integration harness for a cFS sample app
//!
//! The crate builds the sample app's movement command, sends it to a running
//! flight-software core over UDP, and decodes the housekeeping telemetry that
//! comes back.
//!
//! # Quick Start
//!
//! ```rust
//! use cfs_movement::protocol::{decode_telemetry, encode_movement_command, MOVEMENT_CC};
//!
//! // Encode a command (stamped with the current time)
//! let bytes = encode_movement_command(1.5, 2.7, 3.9);
//! assert_eq!(bytes[10], MOVEMENT_CC);
//!
//! // Telemetry shorter than the fixed layout is rejected
//! assert!(decode_telemetry(&bytes).is_err());
//! ```
//!
//! # Layout
//!
//! - [`protocol`] - command and telemetry wire formats
//! - [`transport`] - one-shot UDP send and timed receive
//! - [`harness`] - the sequential test driver
//! - [`sim`] - a loopback stand-in for the flight-software core

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod harness;
pub mod protocol;
pub mod sim;
pub mod transport;

pub use harness::{CaseReport, Harness, HarnessConfig, RunReport};
pub use protocol::{
    CommandConfig, Error, MovementCommand, Position, Result, TelemetryPacket, decode_telemetry,
    encode_movement_command,
};
pub use transport::TransportError;
