//! CRC-8 integrity check (polynomial 0x4D, init 0x00, MSB-first, no final XOR)

use crate::constants::{CRC_INIT, CRC_POLY};

/// Fold one byte into a running CRC-8 accumulator
#[inline]
pub fn crc_update(mut crc: u8, byte: u8) -> u8 {
    crc ^= byte;
    for _ in 0..8 {
        crc = if crc & 0x80 != 0 {
            (crc << 1) ^ CRC_POLY
        } else {
            crc << 1
        };
    }
    crc
}

/// Compute the CRC-8 of a payload
///
/// Empty input yields `0x00`.
pub fn calc_crc(payload: &[u8]) -> u8 {
    payload.iter().fold(CRC_INIT, |crc, &b| crc_update(crc, b))
}
