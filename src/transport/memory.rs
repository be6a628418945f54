//! In-memory transport
//!
//! Bytes queued with [`MemoryTransport::feed`] are returned by `read_byte`;
//! everything written is captured for inspection. Reading past the queued
//! data fails with `UnexpectedEof` instead of blocking.

use super::ByteTransport;
use std::collections::VecDeque;
use std::io;

#[derive(Debug, Default, Clone)]
pub struct MemoryTransport {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport with predefined receive data
    pub fn with_rx(data: &[u8]) -> Self {
        Self {
            rx: data.iter().copied().collect(),
            tx: Vec::new(),
        }
    }

    /// Queue bytes to be read
    pub fn feed(&mut self, data: &[u8]) {
        self.rx.extend(data.iter().copied());
    }

    /// Bytes written so far
    pub fn written(&self) -> &[u8] {
        &self.tx
    }

    /// Take the written bytes, leaving the capture empty
    pub fn take_written(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.tx)
    }

    /// Number of queued bytes not yet read
    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

impl ByteTransport for MemoryTransport {
    fn read_byte(&mut self) -> io::Result<u8> {
        self.rx
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "receive queue empty"))
    }

    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.tx.push(byte);
        Ok(())
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.tx.extend_from_slice(data);
        Ok(())
    }
}
