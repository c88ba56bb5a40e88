//! Movement command codec
//!
//! ```text
//! [HEADER (12 bytes)] [X (8)] [Y (8)] [Z (8)]
//! ```

use std::time::SystemTime;

use bytes::{Bytes, BytesMut};

use super::{
    COMMAND_HEADER_SIZE, ChecksumMode, CommandConfig, CommandHeader, Error, MOVEMENT_CC,
    MOVEMENT_COMMAND_SIZE, Position, Result, unix_seconds_low16, xor_checksum,
};

/// Movement command: header followed by the target coordinate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementCommand {
    header: CommandHeader,
    position: Position,
}

impl MovementCommand {
    /// Create a command with an explicit timestamp
    #[must_use]
    pub fn new(config: &CommandConfig, seconds: u16, position: Position) -> Self {
        let mut command = Self {
            header: CommandHeader::new(config, seconds),
            position,
        };
        if config.checksum == ChecksumMode::Xor {
            let checksum = xor_checksum(&command.encode());
            command.header.set_checksum(checksum);
        }
        command
    }

    /// Create a command stamped with the current wall-clock seconds
    #[must_use]
    pub fn now(config: &CommandConfig, position: Position) -> Self {
        Self::new(config, unix_seconds_low16(SystemTime::now()), position)
    }

    /// Get header
    #[must_use]
    pub const fn header(&self) -> &CommandHeader {
        &self.header
    }

    /// Get target coordinate
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Encode to bytes (big-endian)
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut bytes = BytesMut::with_capacity(MOVEMENT_COMMAND_SIZE);
        self.header.write_to(&mut bytes);
        self.position.write_to(&mut bytes);
        bytes.freeze()
    }

    /// Decode a movement command
    ///
    /// Trailing bytes past the payload are ignored, as is the declared
    /// length. The checksum is not verified here; see
    /// [`MovementCommand::verify_checksum`].
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Buffer is shorter than header + payload
    /// - Function code is not the movement code
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < MOVEMENT_COMMAND_SIZE {
            return Err(Error::InsufficientData {
                needed: MOVEMENT_COMMAND_SIZE,
                got: bytes.len(),
            });
        }

        let header = CommandHeader::from_bytes(bytes)?;
        if header.function_code() != MOVEMENT_CC {
            return Err(Error::UnexpectedFunctionCode {
                found: header.function_code(),
                expected: MOVEMENT_CC,
            });
        }

        let mut payload = &bytes[COMMAND_HEADER_SIZE..MOVEMENT_COMMAND_SIZE];
        let position = Position::read_from(&mut payload);

        Ok(Self { header, position })
    }

    /// Check a packet built with [`ChecksumMode::Xor`]
    pub fn verify_checksum(bytes: &[u8]) -> Result<()> {
        let residue = bytes.iter().fold(0u8, |acc, byte| acc ^ byte);
        if residue == 0xFF {
            Ok(())
        } else {
            Err(Error::ChecksumMismatch { residue })
        }
    }
}

/// Encode a movement command to `(x, y, z)` with default settings
///
/// Uses the sample app command MID, function code 4, the literal length 32,
/// a zero checksum and the low 16 bits of the current Unix time.
#[must_use]
pub fn encode_movement_command(x: f64, y: f64, z: f64) -> Bytes {
    MovementCommand::now(&CommandConfig::default(), Position::new(x, y, z)).encode()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{COMMAND_MID, LengthField};

    #[test]
    fn test_encode_layout() {
        let encoded = encode_movement_command(1.5, 2.7, 3.9);

        assert_eq!(encoded.len(), MOVEMENT_COMMAND_SIZE);
        assert_eq!(&encoded[0..2], &COMMAND_MID.to_be_bytes());
        assert_eq!(&encoded[2..4], &32u16.to_be_bytes());
        assert_eq!(encoded[10], MOVEMENT_CC);
        assert_eq!(encoded[11], 0);
    }

    #[test]
    fn test_reference_payload_bytes() {
        let command =
            MovementCommand::new(&CommandConfig::default(), 0, Position::new(1.5, 2.7, 3.9));
        let encoded = command.encode();

        assert_eq!(&encoded[12..20], &0x3FF8_0000_0000_0000u64.to_be_bytes());
        assert_eq!(&encoded[20..28], &0x4005_9999_9999_999Au64.to_be_bytes());
        assert_eq!(&encoded[28..36], &0x400F_3333_3333_3333u64.to_be_bytes());
    }

    #[test]
    fn test_encode_is_deterministic_for_fixed_seconds() {
        let position = Position::new(100.0, -50.0, 75.25);
        let a = MovementCommand::new(&CommandConfig::default(), 77, position).encode();
        let b = MovementCommand::new(&CommandConfig::default(), 77, position).encode();
        assert_eq!(a, b);
        assert_eq!(&a[6..8], &77u16.to_be_bytes());
    }

    #[test]
    fn test_decode_roundtrip() {
        let original = MovementCommand::new(
            &CommandConfig::default(),
            1234,
            Position::new(-10.123, 25.456, 0.0),
        );
        let decoded = MovementCommand::decode(&original.encode()).unwrap();

        assert_eq!(decoded.header(), original.header());
        assert!(decoded.position().bit_eq(&original.position()));
    }

    #[test]
    fn test_decode_buffer_too_small() {
        let result = MovementCommand::decode(&[0u8; 20]);
        assert_eq!(
            result,
            Err(Error::InsufficientData {
                needed: MOVEMENT_COMMAND_SIZE,
                got: 20
            })
        );
    }

    #[test]
    fn test_decode_rejects_other_function_code() {
        let config = CommandConfig {
            function_code: 2,
            ..CommandConfig::default()
        };
        let encoded = MovementCommand::new(&config, 0, Position::default()).encode();

        let result = MovementCommand::decode(&encoded);
        assert!(matches!(
            result,
            Err(Error::UnexpectedFunctionCode { found: 2, .. })
        ));
    }

    #[test]
    fn test_encoded_length_policy() {
        let config = CommandConfig {
            length: LengthField::Encoded,
            ..CommandConfig::default()
        };
        let encoded = MovementCommand::new(&config, 0, Position::default()).encode();
        assert_eq!(&encoded[2..4], &(MOVEMENT_COMMAND_SIZE as u16).to_be_bytes());
    }

    #[test]
    fn test_xor_checksum_verifies() {
        let config = CommandConfig {
            checksum: ChecksumMode::Xor,
            ..CommandConfig::default()
        };
        let command = MovementCommand::new(&config, 999, Position::new(1.5, 2.7, 3.9));
        let mut encoded = command.encode().to_vec();

        assert!(MovementCommand::verify_checksum(&encoded).is_ok());

        encoded[20] ^= 0x01;
        assert!(matches!(
            MovementCommand::verify_checksum(&encoded),
            Err(Error::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_zero_checksum_mode_leaves_byte_clear() {
        let command =
            MovementCommand::new(&CommandConfig::default(), 999, Position::new(1.0, 2.0, 3.0));
        assert_eq!(command.header().checksum(), 0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: every command is header + payload with fixed MID and function code
            #[test]
            fn prop_fixed_size_and_selectors(
                x in any::<f64>(),
                y in any::<f64>(),
                z in any::<f64>(),
                seconds in any::<u16>(),
            ) {
                let position = Position::new(x, y, z);
                let encoded =
                    MovementCommand::new(&CommandConfig::default(), seconds, position).encode();

                prop_assert_eq!(encoded.len(), MOVEMENT_COMMAND_SIZE);
                prop_assert_eq!(u16::from_be_bytes([encoded[0], encoded[1]]), COMMAND_MID);
                prop_assert_eq!(encoded[10], MOVEMENT_CC);
            }

            /// Property: decoding an encoded command restores coordinates bit for bit
            #[test]
            fn prop_roundtrip_is_bit_exact(
                x in any::<f64>(),
                y in any::<f64>(),
                z in any::<f64>(),
            ) {
                let position = Position::new(x, y, z);
                let encoded = MovementCommand::new(&CommandConfig::default(), 0, position).encode();
                let decoded = MovementCommand::decode(&encoded).unwrap();

                prop_assert!(decoded.position().bit_eq(&position));
            }

            /// Property: XOR checksum detects any single flipped byte
            #[test]
            fn prop_xor_checksum_detects_corruption(
                x in any::<f64>(),
                offset in 0usize..MOVEMENT_COMMAND_SIZE,
                flip in 1u8..=255,
            ) {
                let config = CommandConfig {
                    checksum: ChecksumMode::Xor,
                    ..CommandConfig::default()
                };
                let mut encoded = MovementCommand::new(&config, 1, Position::new(x, 0.0, 0.0))
                    .encode()
                    .to_vec();
                encoded[offset] ^= flip;

                prop_assert!(MovementCommand::verify_checksum(&encoded).is_err());
            }
        }
    }
}
