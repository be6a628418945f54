//! COBS (Consistent Overhead Byte Stuffing) framing
//!
//! Encodes data so 0x00 never appears in the stuffed region, allowing it as
//! frame delimiter. Stuffing is block-oriented: [`BlockStuffer`] keeps a single
//! 255-byte working block and hands every closed block to a sink, so the packet
//! encoder can stream blocks straight to the wire while [`stuff`] collects the
//! same blocks into a buffer.

use crate::constants::{DELIMITER, MAX_BLOCK_DATA, MAX_BLOCK_LEN};
use bytes::BytesMut;
use std::convert::Infallible;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CobsError {
    /// A length code of 0 was found
    ZeroCode { offset: usize },
    /// A block declares more data than remains in the input
    Truncated {
        offset: usize,
        code: u8,
        available: usize,
    },
}

impl fmt::Display for CobsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroCode { offset } => write!(f, "zero length code at offset {}", offset),
            Self::Truncated {
                offset,
                code,
                available,
            } => write!(
                f,
                "block at offset {} declares {} data bytes, only {} available",
                offset,
                code - 1,
                available
            ),
        }
    }
}

impl std::error::Error for CobsError {}

/// Worst-case stuffed length for `input_len` bytes
pub const fn max_encoded_len(input_len: usize) -> usize {
    input_len + (input_len / MAX_BLOCK_DATA) + 1
}

/// Worst-case unstuffed length for `encoded_len` bytes
pub const fn max_decoded_len(encoded_len: usize) -> usize {
    encoded_len
}

/// Streaming COBS stuffer with a fixed 255-byte working block
///
/// Feed bytes with [`push`](Self::push) and call [`finish`](Self::finish) once.
/// Each closed block (code byte + data) is passed to `emit`.
pub struct BlockStuffer {
    block: [u8; MAX_BLOCK_LEN],
    /// Current block length including the code byte (1..=255)
    len: usize,
}

impl Default for BlockStuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockStuffer {
    pub fn new() -> Self {
        Self {
            block: [0; MAX_BLOCK_LEN],
            len: 1,
        }
    }

    /// Stuff one byte
    ///
    /// A full block is closed before anything else happens to it. A delimiter
    /// then closes the (possibly fresh, empty) block, which is how it is
    /// reconstituted on decode: a full block never implies a delimiter.
    pub fn push<E, F>(&mut self, byte: u8, emit: &mut F) -> Result<(), E>
    where
        F: FnMut(&[u8]) -> Result<(), E>,
    {
        if self.len == MAX_BLOCK_LEN {
            self.close(emit)?;
        }

        if byte == DELIMITER {
            self.close(emit)
        } else {
            self.block[self.len] = byte;
            self.len += 1;
            Ok(())
        }
    }

    /// Stuff a slice of bytes
    pub fn extend<E, F>(&mut self, data: &[u8], emit: &mut F) -> Result<(), E>
    where
        F: FnMut(&[u8]) -> Result<(), E>,
    {
        for &byte in data {
            self.push(byte, emit)?;
        }
        Ok(())
    }

    /// Close the final block
    pub fn finish<E, F>(mut self, emit: &mut F) -> Result<(), E>
    where
        F: FnMut(&[u8]) -> Result<(), E>,
    {
        self.close(emit)
    }

    fn close<E, F>(&mut self, emit: &mut F) -> Result<(), E>
    where
        F: FnMut(&[u8]) -> Result<(), E>,
    {
        // len <= 255 always holds, the cast is exact
        self.block[0] = self.len as u8;
        let result = emit(&self.block[..self.len]);
        self.len = 1;
        result
    }
}

/// Stuff `data` and append the result to `output` (no trailing delimiter)
///
/// Returns number of bytes appended.
pub fn stuff_into(data: &[u8], output: &mut Vec<u8>) -> usize {
    let start_len = output.len();
    output.reserve(max_encoded_len(data.len()));

    let mut emit = |block: &[u8]| -> Result<(), Infallible> {
        output.extend_from_slice(block);
        Ok(())
    };
    let mut stuffer = BlockStuffer::new();
    stuffer
        .extend(data, &mut emit)
        .and_then(|()| stuffer.finish(&mut emit))
        .unwrap_or_else(|never| match never {});

    output.len() - start_len
}

/// Stuff `data` into a new buffer (no trailing delimiter)
pub fn stuff(data: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(max_encoded_len(data.len()));
    stuff_into(data, &mut output);
    output
}

/// Decode COBS-encoded data into BytesMut
///
/// Input should NOT include trailing delimiter.
/// Extends the BytesMut buffer (does not clear - caller should clear if needed).
/// Returns number of bytes written.
pub fn unstuff_into(encoded: &[u8], output: &mut BytesMut) -> Result<usize, CobsError> {
    let start_len = output.len();
    output.reserve(max_decoded_len(encoded.len()));
    let mut i = 0;

    while i < encoded.len() {
        let offset = i;
        let code = encoded[i];
        if code == 0 {
            let err = CobsError::ZeroCode { offset };
            debug!("COBS decode failed: {}", err);
            return Err(err);
        }

        i += 1;
        let copy_len = code as usize - 1;

        if i + copy_len > encoded.len() {
            let err = CobsError::Truncated {
                offset,
                code,
                available: encoded.len() - i,
            };
            debug!("COBS decode failed: {}", err);
            return Err(err);
        }

        output.extend_from_slice(&encoded[i..i + copy_len]);
        i += copy_len;

        // A full block was closed by the cap, not by a delimiter
        if (code as usize) < MAX_BLOCK_LEN && i < encoded.len() {
            output.extend_from_slice(&[DELIMITER]);
        }
    }

    Ok(output.len() - start_len)
}

/// Decode COBS-encoded data into a new buffer
pub fn unstuff(encoded: &[u8]) -> Result<Vec<u8>, CobsError> {
    let mut output = BytesMut::with_capacity(max_decoded_len(encoded.len()));
    unstuff_into(encoded, &mut output)?;
    Ok(output.to_vec())
}
