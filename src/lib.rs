//! SimpleSerial - framed packet protocol for host/target communication
//!
//! Packets travel over an unreliable byte stream (typically a UART under
//! fault injection) as:
//!
//! ```text
//! [command] [COBS(payload ++ crc8)] [0x00]
//! ```
//!
//! Layers, leaves first:
//! - `crc`: CRC-8 (poly 0x4D) over the payload
//! - `cobs`: byte stuffing that keeps 0x00 out of the frame body
//! - `packet`: streaming encoder and read-until-terminator decoder
//! - `ack`: bare ACK frames and the out-of-band reset sequence
//! - `session`: a transport plus settings, with chunked stop-and-wait transfers
//!
//! Transports only need blocking `read_byte`/`write_byte`; see `transport`.

pub mod ack;
pub mod cobs;
pub mod config;
pub mod constants;
pub mod crc;
pub mod error;
pub mod logging;
pub mod packet;
pub mod session;
pub mod transport;
pub mod trigger;

pub use error::{Result, SimpleSerialError};
pub use packet::Packet;
pub use session::Session;
pub use transport::{ByteTransport, MemoryTransport, SerialTransport};
