//! Codec error types

use thiserror::Error;

/// Errors raised while encoding or decoding packets
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Buffer shorter than the fixed layout requires
    #[error("insufficient data: need {needed} bytes, got {got}")]
    InsufficientData {
        /// Needed size
        needed: usize,
        /// Actual size
        got: usize,
    },

    /// Command carries a function code other than the movement code
    #[error("unexpected function code: {found} (expected {expected})")]
    UnexpectedFunctionCode {
        /// Function code found in the header
        found: u8,
        /// Function code this decoder accepts
        expected: u8,
    },

    /// XOR of all packet bytes is not 0xFF
    #[error("checksum mismatch: packet XOR is {residue:#04x}, expected 0xff")]
    ChecksumMismatch {
        /// XOR of every byte, checksum included
        residue: u8,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
