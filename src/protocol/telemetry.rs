//! Housekeeping telemetry codec
//!
//! ```text
//! [HEADER (16 bytes, opaque)] [CMD CTR (1)] [ERR CTR (1)] [SPARE (2)] [X (8)] [Y (8)] [Z (8)]
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::{
    Error, Position, Result, TELEMETRY_HEADER_SIZE, TELEMETRY_POSITION_OFFSET, TELEMETRY_SIZE,
};

/// Housekeeping telemetry as reported by the sample app
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryPacket {
    header: [u8; TELEMETRY_HEADER_SIZE],
    command_counter: u8,
    error_counter: u8,
    position: Position,
}

impl TelemetryPacket {
    /// Build a packet with a minimal primary header
    ///
    /// Only the stream ID, sequence word and CCSDS length (total - 7) are
    /// populated; the remaining header bytes are zero.
    #[must_use]
    pub fn new(
        stream_id: u16,
        sequence: u16,
        command_counter: u8,
        error_counter: u8,
        position: Position,
    ) -> Self {
        let mut header = [0u8; TELEMETRY_HEADER_SIZE];
        let mut cursor = &mut header[..];
        cursor.put_u16(stream_id);
        cursor.put_u16(sequence);
        cursor.put_u16((TELEMETRY_SIZE - 7) as u16);

        Self {
            header,
            command_counter,
            error_counter,
            position,
        }
    }

    /// Raw header bytes, exactly as received
    #[must_use]
    pub const fn header(&self) -> &[u8; TELEMETRY_HEADER_SIZE] {
        &self.header
    }

    /// Stream ID read from the first two header bytes
    ///
    /// Informational only; decoding never rejects a packet on this value.
    #[must_use]
    pub const fn stream_id(&self) -> u16 {
        u16::from_be_bytes([self.header[0], self.header[1]])
    }

    /// Get command counter
    #[must_use]
    pub const fn command_counter(&self) -> u8 {
        self.command_counter
    }

    /// Get command error counter
    #[must_use]
    pub const fn error_counter(&self) -> u8 {
        self.error_counter
    }

    /// Get reported coordinate
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Encode to bytes (big-endian, spare bytes zero)
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut bytes = BytesMut::with_capacity(TELEMETRY_SIZE);
        bytes.put_slice(&self.header);
        bytes.put_u8(self.command_counter);
        bytes.put_u8(self.error_counter);
        bytes.put_bytes(0, TELEMETRY_POSITION_OFFSET - TELEMETRY_HEADER_SIZE - 2);
        self.position.write_to(&mut bytes);
        bytes.freeze()
    }

    /// Decode a telemetry packet
    ///
    /// No integrity check is performed and bytes past the last coordinate are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InsufficientData`] if the buffer ends before the last
    /// coordinate.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < TELEMETRY_SIZE {
            return Err(Error::InsufficientData {
                needed: TELEMETRY_SIZE,
                got: bytes.len(),
            });
        }

        let mut header = [0u8; TELEMETRY_HEADER_SIZE];
        header.copy_from_slice(&bytes[..TELEMETRY_HEADER_SIZE]);

        let mut buf = &bytes[TELEMETRY_HEADER_SIZE..TELEMETRY_SIZE];
        let command_counter = buf.get_u8();
        let error_counter = buf.get_u8();
        buf.advance(TELEMETRY_POSITION_OFFSET - TELEMETRY_HEADER_SIZE - 2);
        let position = Position::read_from(&mut buf);

        Ok(Self {
            header,
            command_counter,
            error_counter,
            position,
        })
    }
}

/// Decode housekeeping telemetry from a received datagram
pub fn decode_telemetry(bytes: &[u8]) -> Result<TelemetryPacket> {
    TelemetryPacket::decode(bytes)
}
