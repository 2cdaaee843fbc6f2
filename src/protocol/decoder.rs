//! Message dispatch and attitude payload decoding

use tracing::{debug, trace};

use super::crc;
use crate::config::DecoderConfig;
use crate::types::mavlink_ids::message_id;
use crate::types::{AttitudeSample, Frame};
use crate::{Result, TelemetryError};

/// Full attitude payload: timestamp, three angles, three angular rates.
pub const ATTITUDE_PAYLOAD_LEN: usize = 28;

/// What a frame carries, as far as this client cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Attitude,
    Heartbeat,
    SysStatus,
    Other(u32),
}

impl MessageKind {
    pub fn classify(msg_id: u32) -> Self {
        match msg_id {
            message_id::ATTITUDE => MessageKind::Attitude,
            message_id::HEARTBEAT => MessageKind::Heartbeat,
            message_id::SYS_STATUS => MessageKind::SysStatus,
            other => MessageKind::Other(other),
        }
    }
}

/// Decode the fields of an attitude payload the client consumes.
///
/// Angular rates (bytes 16..28) are part of the layout but not read.
pub fn parse_attitude(payload: &[u8]) -> Result<AttitudeSample> {
    if payload.len() < ATTITUDE_PAYLOAD_LEN {
        return Err(TelemetryError::truncated_payload(
            message_id::ATTITUDE,
            ATTITUDE_PAYLOAD_LEN,
            payload.len(),
        ));
    }

    let timestamp_ms = u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]);
    let roll = f32::from_le_bytes([payload[4], payload[5], payload[6], payload[7]]);
    let pitch = f32::from_le_bytes([payload[8], payload[9], payload[10], payload[11]]);
    let yaw = f32::from_le_bytes([payload[12], payload[13], payload[14], payload[15]]);

    Ok(AttitudeSample::from_radians(timestamp_ms, roll, pitch, yaw))
}

/// Dispatches complete frames by message id.
#[derive(Debug, Default)]
pub struct MessageDecoder {
    config: DecoderConfig,
}

impl MessageDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    /// Decode one frame.
    ///
    /// Only attitude frames yield a sample. Other ids are logged and return
    /// `Ok(None)`. A short attitude payload is an error for this frame only.
    pub fn decode(&self, frame: &Frame) -> Result<Option<AttitudeSample>> {
        if crc::verify(frame) == Some(false) {
            debug!(
                "Checksum mismatch on msg_id={} seq={} (accepted)",
                frame.message_id, frame.sequence
            );
        }

        match MessageKind::classify(frame.message_id) {
            MessageKind::Attitude => {
                let sample = parse_attitude(frame.payload())?;
                if self.config.ignore_zero_timestamp && sample.timestamp_ms == 0 {
                    trace!("Attitude with zero boot timestamp ignored");
                    return Ok(None);
                }
                trace!("{}", sample);
                Ok(Some(sample))
            }
            MessageKind::Heartbeat => {
                debug!("HEARTBEAT from system {}", frame.system_id);
                Ok(None)
            }
            MessageKind::SysStatus => {
                debug!("SYS_STATUS from system {}", frame.system_id);
                Ok(None)
            }
            MessageKind::Other(id) => {
                trace!("Ignoring v{} message id {}", frame.version.number(), id);
                Ok(None)
            }
        }
    }
}
