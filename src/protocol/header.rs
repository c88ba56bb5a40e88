//! Command header
//!
//! The header is 12 bytes, big-endian, with no padding between fields.

use bytes::{Buf, BufMut};

use super::{
    COMMAND_HEADER_SIZE, COMMAND_MID, DECLARED_COMMAND_LENGTH, Error, MOVEMENT_CC,
    MOVEMENT_COMMAND_SIZE, Result,
};

/// What to write into the header's length field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LengthField {
    /// A fixed value, regardless of the encoded size
    Literal(u16),
    /// The actual encoded packet size
    Encoded,
}

impl LengthField {
    /// Resolve the value written on the wire
    #[must_use]
    pub const fn resolve(self) -> u16 {
        match self {
            Self::Literal(value) => value,
            Self::Encoded => MOVEMENT_COMMAND_SIZE as u16,
        }
    }
}

impl Default for LengthField {
    fn default() -> Self {
        Self::Literal(DECLARED_COMMAND_LENGTH)
    }
}

/// How the header's checksum byte is filled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChecksumMode {
    /// Always zero
    #[default]
    Zero,
    /// Chosen so that the XOR of every packet byte is 0xFF
    Xor,
}

/// Per-command settings that used to be process-wide constants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CommandConfig {
    /// Message ID of the target app
    pub stream_id: u16,
    /// Function code written into the header
    pub function_code: u8,
    /// Length field policy
    pub length: LengthField,
    /// Checksum policy
    pub checksum: ChecksumMode,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            stream_id: COMMAND_MID,
            function_code: MOVEMENT_CC,
            length: LengthField::default(),
            checksum: ChecksumMode::default(),
        }
    }
}

/// Command header (12 bytes)
///
/// # Wire Format
///
/// ```text
/// 0                   1                   2                   3
/// 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |          Stream ID            |            Length             |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |           Sequence            |            Seconds            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |          Subseconds           | Function Code |   Checksum    |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandHeader {
    stream_id: u16,
    length: u16,
    sequence: u16,
    seconds: u16,
    subseconds: u16,
    function_code: u8,
    checksum: u8,
}

impl CommandHeader {
    /// Create a header from `config` stamped with `seconds`
    ///
    /// Sequence and subseconds are zero; the checksum starts at zero and is
    /// filled in by the command once the payload is known.
    #[must_use]
    pub const fn new(config: &CommandConfig, seconds: u16) -> Self {
        Self {
            stream_id: config.stream_id,
            length: config.length.resolve(),
            sequence: 0,
            seconds,
            subseconds: 0,
            function_code: config.function_code,
            checksum: 0,
        }
    }

    /// Get stream ID
    #[must_use]
    pub const fn stream_id(&self) -> u16 {
        self.stream_id
    }

    /// Get declared length
    #[must_use]
    pub const fn length(&self) -> u16 {
        self.length
    }

    /// Get sequence counter
    #[must_use]
    pub const fn sequence(&self) -> u16 {
        self.sequence
    }

    /// Get truncated seconds
    #[must_use]
    pub const fn seconds(&self) -> u16 {
        self.seconds
    }

    /// Get subseconds
    #[must_use]
    pub const fn subseconds(&self) -> u16 {
        self.subseconds
    }

    /// Get function code
    #[must_use]
    pub const fn function_code(&self) -> u8 {
        self.function_code
    }

    /// Get checksum byte
    #[must_use]
    pub const fn checksum(&self) -> u8 {
        self.checksum
    }

    pub(crate) fn set_checksum(&mut self, checksum: u8) {
        self.checksum = checksum;
    }

    /// Append the header to `buf` (big-endian)
    pub fn write_to<B: BufMut>(&self, buf: &mut B) {
        buf.put_u16(self.stream_id);
        buf.put_u16(self.length);
        buf.put_u16(self.sequence);
        buf.put_u16(self.seconds);
        buf.put_u16(self.subseconds);
        buf.put_u8(self.function_code);
        buf.put_u8(self.checksum);
    }

    /// Convert to bytes (big-endian)
    #[must_use]
    pub fn to_bytes(&self) -> [u8; COMMAND_HEADER_SIZE] {
        let mut bytes = [0u8; COMMAND_HEADER_SIZE];
        let mut cursor = &mut bytes[..];
        self.write_to(&mut cursor);
        bytes
    }

    /// Parse from bytes (big-endian)
    ///
    /// The length field is not checked against the buffer: peers commonly
    /// send the literal 32 for a 36-byte packet.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < COMMAND_HEADER_SIZE {
            return Err(Error::InsufficientData {
                needed: COMMAND_HEADER_SIZE,
                got: bytes.len(),
            });
        }

        let mut buf = &bytes[..COMMAND_HEADER_SIZE];
        Ok(Self {
            stream_id: buf.get_u16(),
            length: buf.get_u16(),
            sequence: buf.get_u16(),
            seconds: buf.get_u16(),
            subseconds: buf.get_u16(),
            function_code: buf.get_u8(),
            checksum: buf.get_u8(),
        })
    }
}

impl Default for CommandHeader {
    fn default() -> Self {
        Self::new(&CommandConfig::default(), 0)
    }
}

/// Checksum byte that makes the XOR of `packet` plus the byte equal 0xFF
///
/// `packet` must hold the checksum field as zero.
#[must_use]
pub fn xor_checksum(packet: &[u8]) -> u8 {
    packet.iter().fold(0xFF, |acc, byte| acc ^ byte)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let header = CommandHeader::new(&CommandConfig::default(), 0xABCD);
        let bytes = header.to_bytes();

        assert_eq!(bytes.len(), COMMAND_HEADER_SIZE);
        assert_eq!(&bytes[0..2], &[0x18, 0x82]);
        assert_eq!(&bytes[2..4], &[0x00, 0x20]);
        assert_eq!(&bytes[4..6], &[0x00, 0x00]);
        assert_eq!(&bytes[6..8], &[0xAB, 0xCD]);
        assert_eq!(&bytes[8..10], &[0x00, 0x00]);
        assert_eq!(bytes[10], MOVEMENT_CC);
        assert_eq!(bytes[11], 0);
    }

    #[test]
    fn test_header_roundtrip() {
        let header = CommandHeader::new(&CommandConfig::default(), 4242);
        let decoded = CommandHeader::from_bytes(&header.to_bytes()).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(decoded.seconds(), 4242);
    }

    #[test]
    fn test_length_policy() {
        assert_eq!(LengthField::default().resolve(), 32);
        assert_eq!(LengthField::Encoded.resolve(), 36);
        assert_eq!(LengthField::Literal(7).resolve(), 7);
    }

    #[test]
    fn test_short_header_rejected() {
        let result = CommandHeader::from_bytes(&[0u8; 11]);
        assert_eq!(
            result,
            Err(Error::InsufficientData {
                needed: 12,
                got: 11
            })
        );
    }

    #[test]
    fn test_xor_checksum_closes_to_ff() {
        let packet = [0x18, 0x82, 0x00, 0x20, 0x01];
        let checksum = xor_checksum(&packet);
        let total = packet.iter().fold(checksum, |acc, byte| acc ^ byte);
        assert_eq!(total, 0xFF);
    }
}
