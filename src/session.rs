//! Protocol session over one transport
//!
//! Bundles a transport with its `ProtocolConfig` and adds the stop-and-wait
//! multi-packet transfer used to move buffers larger than one chunk:
//!
//! ```text
//! sender                         receiver
//!   [d | chunk 0]  ───────────▶
//!                  ◀───────────  [d] ack
//!   [d | chunk 1]  ───────────▶
//!                  ◀───────────  [d] ack
//!   ...
//!   [e] end        ───────────▶
//! ```

use crate::ack;
use crate::config::ProtocolConfig;
use crate::error::{Result, SimpleSerialError};
use crate::packet::{self, Packet};
use crate::transport::ByteTransport;
use crate::trigger::{TriggerGuard, TriggerPin};
use bytes::{Bytes, BytesMut};
use tracing::{debug, warn};

pub struct Session<T: ByteTransport> {
    transport: T,
    config: ProtocolConfig,
}

impl<T: ByteTransport> Session<T> {
    /// Create a session with default protocol settings
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            config: ProtocolConfig::default(),
        }
    }

    pub fn with_config(transport: T, config: ProtocolConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { transport, config })
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    // =========================================================================
    // Single packets
    // =========================================================================

    pub fn send_packet(&mut self, command: u8, payload: &[u8]) -> Result<()> {
        packet::encode_and_send(&mut self.transport, command, payload)
    }

    pub fn read_packet(&mut self) -> Result<Packet> {
        packet::receive_and_decode(&mut self.transport, self.config.max_frame_len)
    }

    /// Write raw text, outside of any frame
    pub fn send_str(&mut self, text: &str) -> Result<()> {
        self.transport.write_all(text.as_bytes())?;
        self.transport.flush()?;
        Ok(())
    }

    // =========================================================================
    // Flow control
    // =========================================================================

    pub fn send_ack(&mut self, command: u8) -> Result<()> {
        ack::send_ack(&mut self.transport, command)
    }

    pub fn wait_ack(&mut self, command: u8) -> Result<()> {
        ack::wait_ack(&mut self.transport, command, self.config.max_frame_len)
    }

    pub fn send_reset_sequence(&mut self) -> Result<()> {
        ack::send_reset_sequence(&mut self.transport)
    }

    /// Skip input up to and including the next reset sequence
    ///
    /// Unbounded: a freshly reset target may print arbitrary boot output first.
    pub fn wait_for_reset(&mut self) -> Result<Vec<u8>> {
        ack::wait_for_reset(&mut self.transport, None)
    }

    /// Read raw bytes until `seq` is seen (match included)
    pub fn read_until(&mut self, seq: &[u8]) -> Result<Vec<u8>> {
        packet::read_until_sequence(&mut self.transport, seq, self.config.max_frame_len)
    }

    // =========================================================================
    // Multi-packet transfers
    // =========================================================================

    /// Send `data` as a chunked transfer
    ///
    /// Every chunk must be acknowledged before the next one goes out. Returns
    /// the number of data packets sent.
    pub fn send_chunked(&mut self, data: &[u8]) -> Result<usize> {
        let command = self.config.data_command;
        let mut sent = 0;

        for chunk in data.chunks(self.config.chunk_size) {
            self.send_packet(command, chunk)?;
            self.wait_ack(command)?;
            sent += 1;
        }

        self.send_ack(self.config.end_command)?;
        debug!("Sent {} bytes in {} chunks", data.len(), sent);
        Ok(sent)
    }

    /// Receive a chunked transfer whose first packet was already read
    ///
    /// Acknowledges every data packet and stops at the end marker. Packets
    /// with other commands are logged and skipped.
    pub fn receive_chunked(&mut self, first: Packet) -> Result<Bytes> {
        let data_command = self.config.data_command;
        let end_command = self.config.end_command;

        if first.command != data_command {
            return Err(SimpleSerialError::UnexpectedCommand {
                expected: data_command,
                received: first.command,
            });
        }

        let mut data = BytesMut::from(first.payload.as_ref());
        self.send_ack(data_command)?;
        let mut chunks = 1;

        loop {
            let packet = self.read_packet()?;
            if packet.command == data_command {
                self.send_ack(data_command)?;
                data.extend_from_slice(&packet.payload);
                chunks += 1;
            } else if packet.command == end_command {
                break;
            } else {
                warn!(
                    "Unexpected packet 0x{:02X} during transfer, skipping",
                    packet.command
                );
            }
        }

        debug!("Received {} bytes in {} chunks", data.len(), chunks);
        Ok(data.freeze())
    }

    /// Read the first packet, then receive the rest of a chunked transfer
    pub fn receive_transfer(&mut self) -> Result<Bytes> {
        let first = self.read_packet()?;
        self.receive_chunked(first)
    }

    // =========================================================================
    // Trigger
    // =========================================================================

    /// Run `f` with the trigger pin held high
    pub fn triggered<P, R>(&mut self, pin: &mut P, f: impl FnOnce(&mut Self) -> R) -> R
    where
        P: TriggerPin + ?Sized,
    {
        let _guard = TriggerGuard::new(pin);
        f(self)
    }
}
