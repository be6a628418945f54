//! Centralized error types for the protocol and host tool
//!
//! All errors are represented by the `SimpleSerialError` enum.
//! Use `Result<T>` as shorthand for `std::result::Result<T, SimpleSerialError>`.

use crate::cobs::CobsError;
use std::fmt;
use std::path::PathBuf;

/// All protocol and host errors
#[derive(Debug)]
pub enum SimpleSerialError {
    // === Framing ===
    /// Receive buffer could not grow
    AllocationFailure { requested: usize },
    /// Stuffed region is not valid COBS
    InvalidEncoding(CobsError),
    /// Terminator arrived with no command byte before it
    EmptyFrame,
    /// Stuffed region decoded to nothing (not even a CRC byte)
    EmptyPayload,
    /// Payload integrity check failed
    CrcMismatch { expected: u8, actual: u8 },
    /// Frame exceeded the configured maximum length
    FrameTooLarge { limit: usize },

    // === Flow control ===
    /// Frame received while waiting for an ACK was not the expected ACK
    MalformedAck {
        expected: u8,
        received: Option<u8>,
        /// Bytes between the command and the terminator
        extra_len: usize,
    },
    /// Packet with a foreign command where a specific one was required
    UnexpectedCommand { expected: u8, received: u8 },

    // === Transport ===
    /// Byte-level read or write failed
    Transport(std::io::Error),
    /// Failed to open serial port
    SerialOpen {
        port: String,
        source: std::io::Error,
    },
    /// No device found matching configuration
    NoDeviceFound,
    /// Multiple devices found matching configuration
    MultipleDevicesFound { count: usize },

    // === Config ===
    /// Config file could not be read or written
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Invalid config value
    ConfigValidation { field: &'static str, reason: String },
    /// Hex payload could not be parsed
    InvalidHex(hex::FromHexError),
}

impl std::error::Error for SimpleSerialError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(source)
            | Self::SerialOpen { source, .. }
            | Self::ConfigRead { source, .. } => Some(source),
            Self::InvalidEncoding(source) => Some(source),
            Self::InvalidHex(source) => Some(source),
            _ => None,
        }
    }
}

impl fmt::Display for SimpleSerialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllocationFailure { requested } => {
                write!(f, "Cannot grow receive buffer to {} bytes", requested)
            }
            Self::InvalidEncoding(e) => write!(f, "Invalid frame encoding: {}", e),
            Self::EmptyFrame => write!(f, "Empty frame (terminator only)"),
            Self::EmptyPayload => write!(f, "Stuffed region decoded to zero bytes"),
            Self::CrcMismatch { expected, actual } => write!(
                f,
                "CRC mismatch: expected 0x{:02X}, computed 0x{:02X}",
                expected, actual
            ),
            Self::FrameTooLarge { limit } => {
                write!(f, "Frame exceeds {} bytes without terminator", limit)
            }
            Self::MalformedAck {
                expected,
                received: Some(received),
                extra_len,
            } => write!(
                f,
                "Expected ACK 0x{:02X}, got command 0x{:02X} followed by {} bytes",
                expected, received, extra_len
            ),
            Self::MalformedAck { expected, .. } => {
                write!(f, "Expected ACK 0x{:02X}, got empty frame", expected)
            }
            Self::UnexpectedCommand { expected, received } => write!(
                f,
                "Expected command 0x{:02X}, got 0x{:02X}",
                expected, received
            ),
            Self::Transport(e) => write!(f, "Transport error: {}", e),
            Self::SerialOpen { port, .. } => write!(f, "Cannot open serial port: {}", port),
            Self::NoDeviceFound => write!(f, "No device found"),
            Self::MultipleDevicesFound { count } => {
                write!(f, "Multiple devices found ({})", count)
            }
            Self::ConfigRead { path, .. } => write!(f, "Config IO error: {}", path.display()),
            Self::ConfigValidation { field, reason } => {
                write!(f, "Invalid {}: {}", field, reason)
            }
            Self::InvalidHex(e) => write!(f, "Invalid hex payload: {}", e),
        }
    }
}

impl From<std::io::Error> for SimpleSerialError {
    fn from(e: std::io::Error) -> Self {
        Self::Transport(e)
    }
}

impl From<CobsError> for SimpleSerialError {
    fn from(e: CobsError) -> Self {
        Self::InvalidEncoding(e)
    }
}

impl From<hex::FromHexError> for SimpleSerialError {
    fn from(e: hex::FromHexError) -> Self {
        Self::InvalidHex(e)
    }
}

/// Alias for Result with SimpleSerialError
pub type Result<T> = std::result::Result<T, SimpleSerialError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_crc_mismatch_display() {
        let err = SimpleSerialError::CrcMismatch {
            expected: 0x12,
            actual: 0xAB,
        };
        assert_eq!(
            err.to_string(),
            "CRC mismatch: expected 0x12, computed 0xAB"
        );
    }

    #[test]
    fn test_io_error_converts_to_transport() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        let err: SimpleSerialError = io.into();
        assert!(matches!(err, SimpleSerialError::Transport(_)));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_cobs_error_has_source() {
        let err: SimpleSerialError = CobsError::ZeroCode { offset: 0 }.into();
        assert!(err.source().is_some());
        assert!(err.to_string().contains("offset 0"));
    }
}
