//! ACK and resynchronization primitives
//!
//! An ACK is a bare `[command, 0x00]` frame; only protocol convention tells it
//! apart from an empty-payload packet. The reset sequence is not a frame at
//! all and is recognized by the application, not by the decoder.

use crate::constants::RESET_SEQUENCE;
use crate::error::{Result, SimpleSerialError};
use crate::packet::{encode_and_send, read_until_sequence, read_until_terminator};
use crate::transport::ByteTransport;
use tracing::{debug, warn};

/// Acknowledge `command`
pub fn send_ack<T>(transport: &mut T, command: u8) -> Result<()>
where
    T: ByteTransport + ?Sized,
{
    encode_and_send(transport, command, &[])
}

/// Read one frame and require it to be the ACK for `expected`
///
/// Fails with `MalformedAck` on a wrong command or any bytes between command
/// and terminator. Transport errors are passed through unchanged.
pub fn wait_ack<T>(transport: &mut T, expected: u8, limit: Option<usize>) -> Result<()>
where
    T: ByteTransport + ?Sized,
{
    let frame = read_until_terminator(transport, limit)?;
    let body = &frame[..frame.len() - 1];

    match body {
        [command] if *command == expected => {
            debug!("ACK 0x{:02X}", expected);
            Ok(())
        }
        _ => {
            let err = SimpleSerialError::MalformedAck {
                expected,
                received: body.first().copied(),
                extra_len: body.len().saturating_sub(1),
            };
            warn!("{}", err);
            Err(err)
        }
    }
}

/// Emit the out-of-band reset pattern `00 00 00 'r' 00 00 00`
pub fn send_reset_sequence<T>(transport: &mut T) -> Result<()>
where
    T: ByteTransport + ?Sized,
{
    transport.write_all(&RESET_SEQUENCE)?;
    transport.flush()?;
    Ok(())
}

/// Skip everything up to and including the next reset sequence
///
/// Returns the discarded bytes (reset sequence included).
pub fn wait_for_reset<T>(transport: &mut T, limit: Option<usize>) -> Result<Vec<u8>>
where
    T: ByteTransport + ?Sized,
{
    let skipped = read_until_sequence(transport, &RESET_SEQUENCE, limit)?;
    debug!(
        "Reset sequence seen after {} bytes",
        skipped.len() - RESET_SEQUENCE.len()
    );
    Ok(skipped)
}
