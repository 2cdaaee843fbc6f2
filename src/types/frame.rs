//! Protocol frame representation

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Start byte of a protocol v1 frame.
pub const STX_V1: u8 = 0xFE;

/// Start byte of a protocol v2 frame.
pub const STX_V2: u8 = 0xFD;

/// Header length of a v1 frame, start byte included.
pub const HEADER_LEN_V1: usize = 6;

/// Header length of a v2 frame, start byte included.
pub const HEADER_LEN_V2: usize = 10;

/// Trailing checksum length shared by both generations.
pub const CHECKSUM_LEN: usize = 2;

/// Protocol generation, distinguished by the frame start byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtocolVersion {
    /// `0xFE` frames with a one-byte message id
    V1,
    /// `0xFD` frames with flags and a three-byte message id
    V2,
}

impl ProtocolVersion {
    /// Detect the generation from a candidate start byte.
    pub fn from_start_byte(byte: u8) -> Option<Self> {
        match byte {
            STX_V1 => Some(ProtocolVersion::V1),
            STX_V2 => Some(ProtocolVersion::V2),
            _ => None,
        }
    }

    /// Header length including the start byte.
    pub fn header_len(self) -> usize {
        match self {
            ProtocolVersion::V1 => HEADER_LEN_V1,
            ProtocolVersion::V2 => HEADER_LEN_V2,
        }
    }

    /// Bytes that must follow the start byte before the header can be read.
    ///
    /// v2 needs 12 trailing bytes (header plus the shortest checksum tail),
    /// v1 needs 6.
    pub fn min_trailing_bytes(self) -> usize {
        match self {
            ProtocolVersion::V1 => 6,
            ProtocolVersion::V2 => 12,
        }
    }

    /// Generation number (1 or 2).
    pub fn number(self) -> u8 {
        match self {
            ProtocolVersion::V1 => 1,
            ProtocolVersion::V2 => 2,
        }
    }
}

/// One complete protocol unit: header, payload and checksum.
///
/// The raw bytes are shared via `Arc` so a frame can be handed to several
/// consumers without copying.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Protocol generation
    pub version: ProtocolVersion,

    /// Sender-side sequence number
    pub sequence: u8,

    /// Sender system id
    pub system_id: u8,

    /// Sender component id
    pub component_id: u8,

    /// Message id (8 bits on v1, 24 bits on v2)
    pub message_id: u32,

    /// Declared payload length from the header
    pub payload_len: u8,

    /// Complete frame bytes, start byte through checksum
    raw: Arc<[u8]>,
}

impl Frame {
    /// Parse a frame from the front of `bytes`.
    ///
    /// Returns `None` unless `bytes` starts with a start byte and holds the
    /// whole frame. Trailing bytes beyond the frame are ignored. The checksum
    /// is not validated here.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let version = ProtocolVersion::from_start_byte(*bytes.first()?)?;
        let header_len = version.header_len();
        if bytes.len() < header_len {
            return None;
        }

        let payload_len = bytes[1];
        let total_len = header_len + payload_len as usize + CHECKSUM_LEN;
        if bytes.len() < total_len {
            return None;
        }

        let (sequence, system_id, component_id, message_id) = match version {
            ProtocolVersion::V2 => (
                bytes[4],
                bytes[5],
                bytes[6],
                u32::from_le_bytes([bytes[7], bytes[8], bytes[9], 0]),
            ),
            ProtocolVersion::V1 => (bytes[2], bytes[3], bytes[4], bytes[5] as u32),
        };

        Some(Self {
            version,
            sequence,
            system_id,
            component_id,
            message_id,
            payload_len,
            raw: bytes[..total_len].into(),
        })
    }

    /// Total frame length on the wire.
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Frames always contain at least a header and checksum.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Payload bytes as declared by the header.
    pub fn payload(&self) -> &[u8] {
        let start = self.version.header_len();
        &self.raw[start..start + self.payload_len as usize]
    }

    /// Bytes covered by the checksum: header after the start byte, then payload.
    pub fn checksummed_bytes(&self) -> &[u8] {
        &self.raw[1..self.raw.len() - CHECKSUM_LEN]
    }

    /// Checksum as received (little-endian on the wire).
    pub fn checksum(&self) -> u16 {
        let n = self.raw.len();
        u16::from_le_bytes([self.raw[n - 2], self.raw[n - 1]])
    }

    /// Complete frame bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }
}
