//! Stream framer.
//!
//! Reassembles frames of either protocol generation from byte chunks of
//! arbitrary size. Datagrams may split frames or carry several at once, and
//! stray bytes between frames are skipped by resynchronizing on the next
//! start byte.
//!
//! No checksum validation happens here: any syntactically complete frame is
//! emitted.

use tracing::{trace, warn};

use super::buffer::RawBuffer;
use crate::config::BufferConfig;
use crate::types::{CHECKSUM_LEN, Frame, ProtocolVersion};

/// Finds frame boundaries in a rolling byte buffer.
#[derive(Debug, Default)]
pub struct FrameAssembler {
    buffer: RawBuffer,
}

impl FrameAssembler {
    /// Create an assembler with the given buffer bounds.
    pub fn new(config: BufferConfig) -> Self {
        Self { buffer: RawBuffer::new(config) }
    }

    /// Append a chunk and return every frame now complete, in stream order.
    ///
    /// Bytes belonging to a frame that is still arriving are kept for the next
    /// call. A start byte too close to the end of the buffer to hold a header
    /// is stepped over one byte at a time, but the bytes from it onward are
    /// kept too, in case it is a real frame whose header is split.
    ///
    /// The whole chunk is scanned before the buffer cap applies, so only the
    /// unconsumed tail is ever evicted.
    pub fn ingest(&mut self, bytes: &[u8]) -> Vec<Frame> {
        self.buffer.push(bytes);

        let data = self.buffer.as_slice();
        let mut frames = Vec::new();
        let mut offset = 0;
        let mut retain_from: Option<usize> = None;

        while offset < data.len() {
            let Some(version) = ProtocolVersion::from_start_byte(data[offset]) else {
                offset += 1;
                continue;
            };

            let trailing = data.len() - offset - 1;
            if trailing < version.min_trailing_bytes() {
                retain_from.get_or_insert(offset);
                offset += 1;
                continue;
            }

            let total_len = version.header_len() + data[offset + 1] as usize + CHECKSUM_LEN;
            if offset + total_len > data.len() {
                trace!(
                    "Partial v{} frame at offset {}: have {} of {} bytes",
                    version.number(),
                    offset,
                    data.len() - offset,
                    total_len
                );
                retain_from.get_or_insert(offset);
                break;
            }

            match Frame::parse(&data[offset..offset + total_len]) {
                Some(frame) => {
                    trace!(
                        "v{} frame: msg_id={} len={} seq={}",
                        version.number(),
                        frame.message_id,
                        frame.payload_len,
                        frame.sequence
                    );
                    frames.push(frame);
                    retain_from = None;
                    offset += total_len;
                }
                None => offset += 1,
            }
        }

        let consumed = retain_from.unwrap_or(offset);
        self.buffer.consume(consumed);

        let evicted = self.buffer.enforce_cap();
        if evicted > 0 {
            warn!("Receive buffer overrun, dropped {} oldest bytes", evicted);
        }
        frames
    }

    /// Bytes held back for the next call.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Drop any partial frame.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
