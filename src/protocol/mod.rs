//! Movement command and housekeeping telemetry wire formats
//!
//! This module provides the fixed big-endian layouts exchanged with the
//! sample app, plus the encoder and decoder for each.

mod command;
mod error;
mod header;
mod telemetry;
mod types;

pub use command::{MovementCommand, encode_movement_command};
pub use error::{Error, Result};
pub use header::{ChecksumMode, CommandConfig, CommandHeader, LengthField, xor_checksum};
pub use telemetry::{TelemetryPacket, decode_telemetry};
pub use types::{Position, unix_seconds_low16};

/// Message ID of sample app commands
pub const COMMAND_MID: u16 = 0x1882;

/// Message ID of sample app housekeeping telemetry
pub const HK_TLM_MID: u16 = 0x0883;

/// Function code selecting the movement command
pub const MOVEMENT_CC: u8 = 4;

/// Length the reference ground tooling writes into the command header
pub const DECLARED_COMMAND_LENGTH: u16 = 32;

/// Command header size in bytes
pub const COMMAND_HEADER_SIZE: usize = 12;

/// Three big-endian doubles
pub const POSITION_SIZE: usize = 24;

/// Encoded movement command size (header + payload)
pub const MOVEMENT_COMMAND_SIZE: usize = COMMAND_HEADER_SIZE + POSITION_SIZE;

/// Opaque telemetry header size in bytes
pub const TELEMETRY_HEADER_SIZE: usize = 16;

/// Offset of the first coordinate in a telemetry packet
pub const TELEMETRY_POSITION_OFFSET: usize = TELEMETRY_HEADER_SIZE + 4;

/// Minimum decodable telemetry size
pub const TELEMETRY_SIZE: usize = TELEMETRY_POSITION_OFFSET + POSITION_SIZE;
