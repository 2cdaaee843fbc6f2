//! Frame checksum.
//!
//! Frames use CRC-16/MCRF4XX (the X.25 variant: seed `0xFFFF`, polynomial
//! `0x1021`, reflected). The checksum covers every header byte after the start
//! byte plus the payload. For messages that define a CRC_EXTRA seed byte it is
//! folded in last, which is what lets a receiver reject frames built against a
//! different message definition.

use crc::{CRC_16_MCRF4XX, Crc};

use crate::types::Frame;
use crate::types::mavlink_ids::message_id;

/// CRC-16/MCRF4XX calculator.
const X25: Crc<u16> = Crc::<u16>::new(&CRC_16_MCRF4XX);

/// CRC_EXTRA seed for the message ids this client knows about.
///
/// The interval-set frame has no published definition and therefore no seed.
pub fn crc_extra(msg_id: u32) -> Option<u8> {
    match msg_id {
        message_id::HEARTBEAT => Some(50),
        message_id::SYS_STATUS => Some(124),
        message_id::PARAM_SET => Some(168),
        message_id::ATTITUDE => Some(39),
        message_id::GLOBAL_POSITION_INT => Some(104),
        message_id::VFR_HUD => Some(20),
        _ => None,
    }
}

/// Checksum over `data` (header without start byte, then payload).
pub fn checksum(data: &[u8], msg_id: u32) -> u16 {
    let mut digest = X25.digest();
    digest.update(data);
    if let Some(extra) = crc_extra(msg_id) {
        digest.update(&[extra]);
    }
    digest.finalize()
}

/// Check a received frame's checksum.
///
/// Returns `None` when the message id has no known CRC_EXTRA, since the
/// checksum cannot be verified without it.
pub fn verify(frame: &Frame) -> Option<bool> {
    crc_extra(frame.message_id)?;
    Some(checksum(frame.checksummed_bytes(), frame.message_id) == frame.checksum())
}
