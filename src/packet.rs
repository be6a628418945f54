//! SimpleSerial packet encoding and decoding
//!
//! Wire format:
//! ```text
//! bare packet:    [command] [0x00]
//! payload packet: [command] [COBS(payload ++ crc8(payload))] [0x00]
//! ```
//!
//! The encoder streams COBS blocks straight to the transport as they close, so
//! it never holds more than one 255-byte block. The decoder reads until the
//! terminator, then unstuffs and checks the CRC.

use crate::cobs::{self, BlockStuffer};
use crate::constants::{DELIMITER, READ_GROWTH_STEP};
use crate::crc::calc_crc;
use crate::error::{Result, SimpleSerialError};
use crate::transport::ByteTransport;
use bytes::{Bytes, BytesMut};
use tracing::{trace, warn};

/// A decoded packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub command: u8,
    pub payload: Bytes,
}

impl Packet {
    pub fn new(command: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            command,
            payload: payload.into(),
        }
    }

    /// Packet without payload (also the shape of an ACK)
    pub fn bare(command: u8) -> Self {
        Self {
            command,
            payload: Bytes::new(),
        }
    }

    pub fn is_bare(&self) -> bool {
        self.payload.is_empty()
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// Produce the wire frame for `(command, payload)` block by block
fn encode_with<E, F>(command: u8, payload: &[u8], emit: &mut F) -> std::result::Result<(), E>
where
    F: FnMut(&[u8]) -> std::result::Result<(), E>,
{
    if payload.is_empty() {
        return emit(&[command, DELIMITER]);
    }

    emit(&[command])?;

    let crc = calc_crc(payload);
    let mut stuffer = BlockStuffer::new();
    stuffer.extend(payload, emit)?;
    stuffer.push(crc, emit)?;
    stuffer.finish(emit)?;

    emit(&[DELIMITER])
}

/// Encode a packet and write it to the transport
///
/// An empty payload is sent as a bare `[command, 0x00]` frame without CRC.
pub fn encode_and_send<T>(transport: &mut T, command: u8, payload: &[u8]) -> Result<()>
where
    T: ByteTransport + ?Sized,
{
    if command == DELIMITER {
        warn!("Command 0x00 collides with the terminator and cannot be received");
    }
    trace!(command, len = payload.len(), "tx packet");
    encode_with(command, payload, &mut |block: &[u8]| transport.write_all(block))?;
    transport.flush()?;
    Ok(())
}

/// Encode a packet into a complete wire frame
pub fn encode_to_vec(command: u8, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(cobs::max_encoded_len(payload.len() + 1) + 2);
    encode_with(command, payload, &mut |block: &[u8]| {
        frame.extend_from_slice(block);
        Ok::<(), std::convert::Infallible>(())
    })
    .unwrap_or_else(|never| match never {});
    frame
}

// =============================================================================
// Reading
// =============================================================================

/// Append one byte, growing the buffer in fixed steps
fn push_byte(buf: &mut Vec<u8>, byte: u8) -> Result<()> {
    if buf.len() == buf.capacity() {
        buf.try_reserve_exact(READ_GROWTH_STEP)
            .map_err(|_| SimpleSerialError::AllocationFailure {
                requested: buf.len() + READ_GROWTH_STEP,
            })?;
    }
    buf.push(byte);
    Ok(())
}

/// Read until the accumulated bytes end with `seq`
///
/// The returned buffer includes the matched sequence. With `limit` set, gives
/// up with `FrameTooLarge` once that many bytes arrived without a match.
pub fn read_until_sequence<T>(transport: &mut T, seq: &[u8], limit: Option<usize>) -> Result<Vec<u8>>
where
    T: ByteTransport + ?Sized,
{
    if seq.is_empty() {
        return Err(SimpleSerialError::ConfigValidation {
            field: "sequence",
            reason: "must not be empty".into(),
        });
    }

    let mut buf = Vec::new();
    loop {
        let byte = transport.read_byte()?;
        push_byte(&mut buf, byte)?;

        if buf.ends_with(seq) {
            return Ok(buf);
        }
        if let Some(limit) = limit {
            if buf.len() >= limit {
                warn!("No match within {} bytes, giving up", limit);
                return Err(SimpleSerialError::FrameTooLarge { limit });
            }
        }
    }
}

/// Read one raw frame, terminator included
pub fn read_until_terminator<T>(transport: &mut T, limit: Option<usize>) -> Result<Vec<u8>>
where
    T: ByteTransport + ?Sized,
{
    read_until_sequence(transport, &[DELIMITER], limit)
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode a frame body (everything before the terminator)
pub fn decode_frame(body: &[u8]) -> Result<Packet> {
    let (&command, stuffed) = body.split_first().ok_or(SimpleSerialError::EmptyFrame)?;

    if stuffed.is_empty() {
        return Ok(Packet::bare(command));
    }

    let mut decoded = BytesMut::with_capacity(cobs::max_decoded_len(stuffed.len()));
    if let Err(e) = cobs::unstuff_into(stuffed, &mut decoded) {
        warn!(command, "Dropping frame: {}", e);
        return Err(e.into());
    }

    let Some(&expected) = decoded.last() else {
        warn!(command, "Dropping frame: no CRC byte");
        return Err(SimpleSerialError::EmptyPayload);
    };
    decoded.truncate(decoded.len() - 1);

    let actual = calc_crc(&decoded);
    if actual != expected {
        warn!(
            command,
            "Dropping frame: CRC 0x{:02X} != 0x{:02X}", expected, actual
        );
        return Err(SimpleSerialError::CrcMismatch { expected, actual });
    }

    Ok(Packet {
        command,
        payload: decoded.freeze(),
    })
}

/// Read one frame from the transport and decode it
///
/// Blocks until a terminator arrives (or `limit` bytes were read).
pub fn receive_and_decode<T>(transport: &mut T, limit: Option<usize>) -> Result<Packet>
where
    T: ByteTransport + ?Sized,
{
    let mut frame = read_until_terminator(transport, limit)?;
    frame.pop();
    let packet = decode_frame(&frame)?;
    trace!(
        command = packet.command,
        len = packet.payload.len(),
        "rx packet"
    );
    Ok(packet)
}
