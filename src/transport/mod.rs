//! Transport abstraction for byte-level I/O
//!
//! Separates I/O concerns from protocol logic:
//! - **Transport**: How bytes flow (serial port, in-memory buffers...)
//! - **Framing**: How packets are encoded/decoded (handled by `packet`)
//!
//! The protocol only needs two blocking primitives: read one byte and write
//! one byte. Everything else has a default built on top of them.
//!
//! # Adding a new transport
//!
//! 1. Create `transport/my_transport.rs`
//! 2. Implement the `ByteTransport` trait
//! 3. Add `pub mod my_transport;` here

pub mod memory;
pub mod serial;

pub use memory::MemoryTransport;
pub use serial::SerialTransport;

use std::io;

/// Blocking byte-oriented transport
///
/// A transport does NOT handle:
/// - Packet framing (that's the `packet` module's job)
/// - Retries or resynchronization (that's the caller's job)
///
/// Only one decode may be in flight per transport; the `&mut self` receivers
/// enforce this.
pub trait ByteTransport {
    /// Read a single byte
    ///
    /// Blocks until a byte is available or the transport fails.
    fn read_byte(&mut self) -> io::Result<u8>;

    /// Write a single byte
    fn write_byte(&mut self, byte: u8) -> io::Result<()>;

    /// Write a whole buffer
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        for &byte in data {
            self.write_byte(byte)?;
        }
        Ok(())
    }

    /// Flush any buffered output
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<T: ByteTransport + ?Sized> ByteTransport for &mut T {
    fn read_byte(&mut self) -> io::Result<u8> {
        (**self).read_byte()
    }

    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        (**self).write_byte(byte)
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        (**self).write_all(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}
