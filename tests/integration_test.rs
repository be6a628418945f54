//! Integration tests for the SimpleSerial protocol
//!
//! Tests the complete wire flow using in-memory and channel-backed transports.

use simpleserial::cobs;
use simpleserial::constants::RESET_SEQUENCE;
use simpleserial::crc::calc_crc;
use simpleserial::packet::{self, encode_and_send, receive_and_decode};
use simpleserial::{ack, ByteTransport, MemoryTransport, Packet, Session, SimpleSerialError};
use std::io;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

// =============================================================================
// Channel Transport
// =============================================================================

/// One end of a blocking in-process byte link
pub struct ChannelTransport {
    rx: mpsc::Receiver<u8>,
    tx: mpsc::Sender<u8>,
}

impl ChannelTransport {
    /// Create two connected ends
    pub fn pair() -> (Self, Self) {
        let (a_tx, b_rx) = mpsc::channel();
        let (b_tx, a_rx) = mpsc::channel();
        (
            Self { rx: a_rx, tx: a_tx },
            Self { rx: b_rx, tx: b_tx },
        )
    }
}

impl ByteTransport for ChannelTransport {
    fn read_byte(&mut self) -> io::Result<u8> {
        self.rx
            .recv_timeout(Duration::from_secs(5))
            .map_err(|e| io::Error::new(io::ErrorKind::TimedOut, e))
    }

    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.tx
            .send(byte)
            .map_err(|e| io::Error::new(io::ErrorKind::BrokenPipe, e))
    }
}

// =============================================================================
// Wire scenarios
// =============================================================================

#[test]
fn test_bare_command_on_wire() {
    let mut t = MemoryTransport::new();
    encode_and_send(&mut t, 0x73, &[]).unwrap();
    assert_eq!(t.written(), &[0x73, 0x00]);
}

#[test]
fn test_embedded_zero_splits_blocks_and_roundtrips() {
    let payload = [0xAA, 0x00, 0xBB];
    let mut t = MemoryTransport::new();
    encode_and_send(&mut t, 0x64, &payload).unwrap();

    let wire = t.take_written();
    assert_eq!(wire[0], 0x64);
    assert_eq!(wire.last(), Some(&0x00));

    let stuffed = &wire[1..wire.len() - 1];
    assert!(!stuffed.contains(&0x00));
    let mut logical = payload.to_vec();
    logical.push(calc_crc(&payload));
    assert_eq!(stuffed, cobs::stuff(&logical).as_slice());
    // Block codes: [0x02, 0xAA] then [0x03, 0xBB, crc]
    assert_eq!(stuffed[0], 0x02);
    assert_eq!(stuffed[2], 0x03);

    t.feed(&wire);
    let packet = receive_and_decode(&mut t, None).unwrap();
    assert_eq!(packet, Packet::new(0x64, payload.to_vec()));
}

#[test]
fn test_wait_ack_scenarios() {
    let mut t = MemoryTransport::with_rx(&[0x64, 0x00]);
    assert!(ack::wait_ack(&mut t, 0x64, None).is_ok());

    let mut t = MemoryTransport::with_rx(&[0x65, 0x00]);
    assert!(ack::wait_ack(&mut t, 0x64, None).is_err());

    let mut t = MemoryTransport::with_rx(&[0x64, 0x01, 0x00]);
    assert!(ack::wait_ack(&mut t, 0x64, None).is_err());
}

#[test]
fn test_corrupted_crc_discards_payload() {
    let mut wire = packet::encode_to_vec(b'q', &[0x10, 0x20, 0x30, 0x40]);
    let crc_index = wire.len() - 2;
    wire[crc_index] = wire[crc_index].wrapping_add(1).max(1);

    let mut t = MemoryTransport::with_rx(&wire);
    match receive_and_decode(&mut t, None) {
        Err(SimpleSerialError::CrcMismatch { .. }) => {}
        other => panic!("expected CrcMismatch, got {:?}", other),
    }
}

#[test]
fn test_reset_sequence_independent_of_pending_frame() {
    let mut session = Session::new(MemoryTransport::new());
    session.send_packet(b'd', &[1, 2, 3]).unwrap();
    session.transport_mut().take_written();

    session.send_reset_sequence().unwrap();
    assert_eq!(session.transport().written(), &[0, 0, 0, 0x72, 0, 0, 0]);
    assert_eq!(RESET_SEQUENCE.len(), 7);
}

#[test]
fn test_decoder_recovers_after_garbage_frame() {
    let mut rx = vec![0x64, 0x07, 0x01, 0x00]; // truncated block
    rx.extend(packet::encode_to_vec(b'k', b"ok"));

    let mut t = MemoryTransport::with_rx(&rx);
    assert!(receive_and_decode(&mut t, None).is_err());
    let packet = receive_and_decode(&mut t, None).unwrap();
    assert_eq!(packet.command, b'k');
    assert_eq!(packet.payload.as_ref(), b"ok");
}

#[test]
fn test_large_payload_over_block_cap() {
    // Runs of 254 non-zero bytes followed by a zero stress the block cap
    let mut payload = Vec::new();
    for _ in 0..4 {
        payload.extend(std::iter::repeat(0x5A).take(254));
        payload.push(0x00);
    }
    let mut t = MemoryTransport::new();
    encode_and_send(&mut t, b'd', &payload).unwrap();
    let wire = t.take_written();
    t.feed(&wire);
    assert_eq!(
        receive_and_decode(&mut t, None).unwrap().payload.as_ref(),
        payload.as_slice()
    );
}

// =============================================================================
// Stop-and-wait transfer between two threads
// =============================================================================

#[test]
fn test_chunked_transfer_between_threads() {
    let (host_end, target_end) = ChannelTransport::pair();
    let data: Vec<u8> = (0..384u32).map(|i| (i * 7 % 256) as u8).collect();
    let sent = data.clone();

    let target = thread::spawn(move || {
        let mut session = Session::new(target_end);
        // Wait for the start command, acknowledge, then stream the buffer
        let start = session.read_packet().unwrap();
        assert_eq!(start, Packet::bare(b's'));
        session.send_ack(b's').unwrap();
        session.send_chunked(&sent).unwrap()
    });

    let mut host = Session::new(host_end);
    host.send_packet(b's', &[]).unwrap();
    host.wait_ack(b's').unwrap();
    let received = host.receive_transfer().unwrap();

    assert_eq!(target.join().unwrap(), 3);
    assert_eq!(received.as_ref(), data.as_slice());
}

#[test]
fn test_resync_after_target_reset() {
    let (host_end, target_end) = ChannelTransport::pair();

    let target = thread::spawn(move || {
        let mut session = Session::new(target_end);
        // Half a frame, then the target "reboots"
        session.transport_mut().write_all(&[b'd', 0x05, 0x11]).unwrap();
        session.send_reset_sequence().unwrap();
        session.send_packet(b'f', &42u32.to_le_bytes()).unwrap();
    });

    let mut host = Session::new(host_end);
    host.wait_for_reset().unwrap();
    let packet = host.read_packet().unwrap();
    target.join().unwrap();

    assert_eq!(packet.command, b'f');
    assert_eq!(packet.payload.as_ref(), &42u32.to_le_bytes());
}
