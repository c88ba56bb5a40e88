//! Coordinate payload and timestamp helpers

use std::fmt::{self, Write as _};
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::{Buf, BufMut};

use super::POSITION_SIZE;

/// Target or reported 3-axis coordinate
///
/// Serialized as three big-endian IEEE-754 doubles in `x`, `y`, `z` order.
/// No range validation is applied; NaN and infinities pass through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate
    pub z: f64,
}

impl Position {
    /// Create a position from its three coordinates
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Append the payload to `buf` (big-endian)
    pub fn write_to<B: BufMut>(&self, buf: &mut B) {
        buf.put_f64(self.x);
        buf.put_f64(self.y);
        buf.put_f64(self.z);
    }

    /// Read a payload from the front of `buf` (big-endian)
    ///
    /// Caller must ensure at least [`POSITION_SIZE`] bytes remain.
    pub fn read_from<B: Buf>(buf: &mut B) -> Self {
        let x = buf.get_f64();
        let y = buf.get_f64();
        let z = buf.get_f64();
        Self { x, y, z }
    }

    /// Convert to bytes (big-endian)
    #[must_use]
    pub fn to_bytes(&self) -> [u8; POSITION_SIZE] {
        let mut bytes = [0u8; POSITION_SIZE];
        let mut cursor = &mut bytes[..];
        self.write_to(&mut cursor);
        bytes
    }

    /// Bitwise equality, so `-0.0` differs from `0.0` and NaN equals itself
    #[must_use]
    pub fn bit_eq(&self, other: &Self) -> bool {
        self.x.to_bits() == other.x.to_bits()
            && self.y.to_bits() == other.y.to_bits()
            && self.z.to_bits() == other.z.to_bits()
    }

    /// Render the payload as three uppercase hex words
    ///
    /// `(1.5, 2.7, 3.9)` renders as
    /// `3FF8000000000000 400599999999999A 400F333333333333`, the form used
    /// when replaying a payload through external command tooling.
    #[must_use]
    pub fn payload_hex(&self) -> String {
        let mut out = String::with_capacity(POSITION_SIZE * 2 + 2);
        for (i, word) in self.to_bytes().chunks_exact(8).enumerate() {
            if i > 0 {
                out.push(' ');
            }
            for byte in word {
                // Writing into a String cannot fail.
                let _ = write!(out, "{byte:02X}");
            }
        }
        out
    }
}

impl From<(f64, f64, f64)> for Position {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X={:.6}, Y={:.6}, Z={:.6}", self.x, self.y, self.z)
    }
}

/// Low 16 bits of the Unix time in whole seconds
///
/// The command header only carries 16 bits of seconds, so the value wraps
/// roughly every 18 hours. Times before the epoch map to 0.
#[must_use]
pub fn unix_seconds_low16(now: SystemTime) -> u16 {
    let secs = now.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
    (secs & 0xFFFF) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_payload_hex_matches_reference_vector() {
        let position = Position::new(1.5, 2.7, 3.9);
        assert_eq!(
            position.payload_hex(),
            "3FF8000000000000 400599999999999A 400F333333333333"
        );
    }

    #[test]
    fn test_read_back_written_payload() {
        let position = Position::new(-10.123, 25.456, 0.0);
        let bytes = position.to_bytes();
        let decoded = Position::read_from(&mut &bytes[..]);
        assert!(decoded.bit_eq(&position));
    }

    #[test]
    fn test_bit_eq_distinguishes_signed_zero() {
        assert!(!Position::new(0.0, 0.0, 0.0).bit_eq(&Position::new(-0.0, 0.0, 0.0)));
        assert!(Position::new(f64::NAN, 0.0, 0.0).bit_eq(&Position::new(f64::NAN, 0.0, 0.0)));
    }

    #[test]
    fn test_seconds_truncated_to_low_bits() {
        let t = UNIX_EPOCH + Duration::from_secs(0x0001_2345);
        assert_eq!(unix_seconds_low16(t), 0x2345);
        assert_eq!(unix_seconds_low16(UNIX_EPOCH), 0);
    }

    #[test]
    fn test_seconds_before_epoch_is_zero() {
        let t = UNIX_EPOCH - Duration::from_secs(10);
        assert_eq!(unix_seconds_low16(t), 0);
    }

    #[test]
    fn test_display_uses_six_decimals() {
        let position = Position::new(1.5, 2.7, 3.9);
        assert_eq!(position.to_string(), "X=1.500000, Y=2.700000, Z=3.900000");
    }
}
