//! Protocol-wide constants
//!
//! Centralized constants to avoid duplication and ensure consistency
//! between the encoder, the decoder and the host tool.

// =============================================================================
// Framing
// =============================================================================

/// Reserved frame delimiter, only ever seen as the last byte of a frame
pub const DELIMITER: u8 = 0x00;

/// Maximum COBS block length (code byte + 254 data bytes)
pub const MAX_BLOCK_LEN: usize = 255;

/// Maximum number of data bytes in one COBS block
pub const MAX_BLOCK_DATA: usize = MAX_BLOCK_LEN - 1;

// =============================================================================
// CRC
// =============================================================================

/// CRC-8 polynomial (MSB-first, no reflection)
pub const CRC_POLY: u8 = 0x4D;

/// CRC-8 initial accumulator value
pub const CRC_INIT: u8 = 0x00;

// =============================================================================
// Flow control
// =============================================================================

/// Out-of-band resynchronization pattern: `00 00 00 'r' 00 00 00`
pub const RESET_SEQUENCE: [u8; 7] = [0x00, 0x00, 0x00, b'r', 0x00, 0x00, 0x00];

/// Payload bytes per packet for multi-packet transfers
pub const DEFAULT_CHUNK_SIZE: usize = 190;

/// Command used for data chunks of a multi-packet transfer
pub const DEFAULT_DATA_COMMAND: u8 = b'd';

/// ACK command marking the end of a multi-packet transfer
pub const DEFAULT_END_COMMAND: u8 = b'e';

// =============================================================================
// Buffers
// =============================================================================

/// Receive buffer growth step (bytes)
pub const READ_GROWTH_STEP: usize = 64;

// =============================================================================
// Serial
// =============================================================================

/// Default UART baud rate of the target
pub const DEFAULT_BAUD_RATE: u32 = 38_400;

/// Poll interval of the underlying serial port (milliseconds)
pub const SERIAL_POLL_TIMEOUT_MS: u64 = 10;

/// ChipWhisperer USB vendor ID
pub const CHIPWHISPERER_VID: u16 = 0x2B3E;

/// ChipWhisperer-Lite / Pro / Husky product IDs
pub const CHIPWHISPERER_PIDS: &[u16] = &[0xACE2, 0xACE3, 0xACE5];
