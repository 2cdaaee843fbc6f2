//! Outbound frame encoding.
//!
//! Interval-set and parameter-set commands go out as v2 frames, the heartbeat
//! as a v1 frame. Every frame takes the next value of one shared 8-bit
//! sequence counter, and every frame carries a real checksum.

use tracing::trace;

use super::crc;
use crate::config::LinkConfig;
use crate::types::mavlink_ids::{heartbeat, message_id, param_type};
use crate::types::{HEADER_LEN_V1, HEADER_LEN_V2, OutboundCommand, STX_V1, STX_V2};

/// Interval-set payload: id, interval, two targets, zeroed parameter slots.
pub const INTERVAL_PAYLOAD_LEN: usize = 20;

/// Parameter-set payload: two targets, 16-byte name, value, type tag.
pub const PARAM_SET_PAYLOAD_LEN: usize = 23;

/// Heartbeat payload length.
pub const HEARTBEAT_PAYLOAD_LEN: usize = 9;

/// Fixed width of a parameter name on the wire.
pub const PARAM_ID_LEN: usize = 16;

/// Wrapping 8-bit frame sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequenceCounter(u8);

impl SequenceCounter {
    pub fn new(start: u8) -> Self {
        Self(start)
    }

    /// Return the current value and advance, wrapping modulo 256.
    pub fn next(&mut self) -> u8 {
        let value = self.0;
        self.0 = self.0.wrapping_add(1);
        value
    }

    /// Value the next frame will carry.
    pub fn peek(&self) -> u8 {
        self.0
    }
}

/// Builds outbound frames for a fixed sender identity and target.
#[derive(Debug, Clone)]
pub struct CommandEncoder {
    sequence: SequenceCounter,
    system_id: u8,
    component_id: u8,
    target_system: u8,
    target_component: u8,
}

impl CommandEncoder {
    pub fn new(link: &LinkConfig) -> Self {
        Self {
            sequence: SequenceCounter::default(),
            system_id: link.system_id,
            component_id: link.component_id,
            target_system: link.target_system,
            target_component: link.target_component,
        }
    }

    /// Encode any outbound command.
    pub fn encode(&mut self, command: &OutboundCommand) -> Vec<u8> {
        let bytes = match command {
            OutboundCommand::SetMessageInterval { message_id, interval_us } => {
                self.interval_set(*message_id, *interval_us)
            }
            OutboundCommand::SetParameter { name, value } => self.param_set(name, *value),
            OutboundCommand::Heartbeat => self.heartbeat(),
        };
        trace!("Encoded {} frame ({} bytes)", command.kind(), bytes.len());
        bytes
    }

    /// Ask the controller to emit `target_msg_id` every `interval_us` microseconds.
    pub fn interval_set(&mut self, target_msg_id: u32, interval_us: f32) -> Vec<u8> {
        let mut payload = [0u8; INTERVAL_PAYLOAD_LEN];
        payload[0..4].copy_from_slice(&target_msg_id.to_le_bytes());
        payload[4..8].copy_from_slice(&interval_us.to_le_bytes());
        payload[8] = self.target_system;
        payload[9] = self.target_component;

        self.frame_v2(message_id::SET_MESSAGE_INTERVAL, &payload)
    }

    /// Write a named float parameter. Names longer than 16 bytes are truncated.
    pub fn param_set(&mut self, name: &str, value: f32) -> Vec<u8> {
        let mut payload = [0u8; PARAM_SET_PAYLOAD_LEN];
        payload[0] = self.target_system;
        payload[1] = self.target_component;

        let name = name.as_bytes();
        let len = name.len().min(PARAM_ID_LEN);
        payload[2..2 + len].copy_from_slice(&name[..len]);

        payload[18..22].copy_from_slice(&value.to_le_bytes());
        payload[22] = param_type::REAL32;

        self.frame_v2(message_id::PARAM_SET, &payload)
    }

    /// Ground-station heartbeat (v1 frame).
    ///
    /// Standard HEARTBEAT layout: `custom_mode` (u32 LE), type, autopilot,
    /// base_mode, system_status, version. The checksum folds in CRC_EXTRA 50.
    pub fn heartbeat(&mut self) -> Vec<u8> {
        let mut payload = [0u8; HEARTBEAT_PAYLOAD_LEN];
        // bytes 0..4: custom_mode, unused by a ground station
        payload[4] = heartbeat::MAV_TYPE_GCS;
        payload[5] = heartbeat::MAV_AUTOPILOT_GENERIC;
        payload[6] = 0; // base_mode
        payload[7] = heartbeat::MAV_STATE_ACTIVE;
        payload[8] = heartbeat::MAVLINK_VERSION;

        self.frame_v1(message_id::HEARTBEAT as u8, &payload)
    }

    /// Sequence number the next frame will carry.
    pub fn next_sequence(&self) -> u8 {
        self.sequence.peek()
    }

    fn frame_v2(&mut self, msg_id: u32, payload: &[u8]) -> Vec<u8> {
        let id = msg_id.to_le_bytes();
        let mut frame = Vec::with_capacity(HEADER_LEN_V2 + payload.len() + 2);
        frame.extend_from_slice(&[
            STX_V2,
            payload.len() as u8,
            0, // incompat flags
            0, // compat flags
            self.sequence.next(),
            self.system_id,
            self.component_id,
            id[0],
            id[1],
            id[2],
        ]);
        frame.extend_from_slice(payload);
        let checksum = crc::checksum(&frame[1..], msg_id);
        frame.extend_from_slice(&checksum.to_le_bytes());
        frame
    }

    fn frame_v1(&mut self, msg_id: u8, payload: &[u8]) -> Vec<u8> {
        let mut frame = Vec::with_capacity(HEADER_LEN_V1 + payload.len() + 2);
        frame.extend_from_slice(&[
            STX_V1,
            payload.len() as u8,
            self.sequence.next(),
            self.system_id,
            self.component_id,
            msg_id,
        ]);
        frame.extend_from_slice(payload);
        let checksum = crc::checksum(&frame[1..], msg_id as u32);
        frame.extend_from_slice(&checksum.to_le_bytes());
        frame
    }
}

impl Default for CommandEncoder {
    fn default() -> Self {
        Self::new(&LinkConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Frame, ProtocolVersion};
    use proptest::prelude::*;

    #[test]
    fn interval_set_reparses() {
        let mut encoder = CommandEncoder::default();
        let bytes = encoder.encode(&OutboundCommand::interval_hz(30, 30));
        let frame = Frame::parse(&bytes).expect("complete frame");

        assert_eq!(frame.version, ProtocolVersion::V2);
        assert_eq!(frame.message_id, 511);
        assert_eq!(frame.len(), bytes.len());
        assert_eq!(frame.system_id, 255);
        assert_eq!(frame.component_id, 1);

        let payload = frame.payload();
        assert_eq!(payload.len(), INTERVAL_PAYLOAD_LEN);
        assert_eq!(u32::from_le_bytes(payload[0..4].try_into().unwrap()), 30);
        let interval = f32::from_le_bytes(payload[4..8].try_into().unwrap());
        assert!((interval - 33_333.0).abs() < 1.0);
        assert_eq!(&payload[8..10], &[1, 1]);
        assert!(payload[10..].iter().all(|&b| b == 0));
        assert_eq!(crc::checksum(frame.checksummed_bytes(), 511), frame.checksum());
    }

    #[test]
    fn param_set_layout_and_checksum() {
        let mut encoder = CommandEncoder::default();
        let bytes = encoder.param_set("SR1_EXTRA1", 50.0);
        let frame = Frame::parse(&bytes).expect("complete frame");

        assert_eq!(frame.message_id, 23);
        let payload = frame.payload();
        assert_eq!(payload.len(), PARAM_SET_PAYLOAD_LEN);
        assert_eq!(&payload[0..2], &[1, 1]);
        assert_eq!(&payload[2..12], b"SR1_EXTRA1");
        assert!(payload[12..18].iter().all(|&b| b == 0));
        assert_eq!(f32::from_le_bytes(payload[18..22].try_into().unwrap()), 50.0);
        assert_eq!(payload[22], 9);
        assert_eq!(crc::verify(&frame), Some(true));
    }

    #[test]
    fn long_param_names_are_truncated() {
        let bytes = CommandEncoder::default().param_set("A_VERY_LONG_PARAMETER_NAME", 1.0);
        let frame = Frame::parse(&bytes).expect("complete frame");
        assert_eq!(&frame.payload()[2..18], b"A_VERY_LONG_PARA");
        assert_eq!(frame.payload_len as usize, PARAM_SET_PAYLOAD_LEN);
    }

    #[test]
    fn heartbeat_is_v1_with_valid_checksum() {
        let bytes = CommandEncoder::default().heartbeat();
        assert_eq!(bytes.len(), HEADER_LEN_V1 + HEARTBEAT_PAYLOAD_LEN + 2);

        let frame = Frame::parse(&bytes).expect("complete frame");
        assert_eq!(frame.version, ProtocolVersion::V1);
        assert_eq!(frame.message_id, 0);
        assert_eq!(frame.payload(), &[0, 0, 0, 0, 6, 0, 0, 4, 3]);
        assert_eq!(crc::verify(&frame), Some(true));
    }

    #[test]
    fn sequence_is_shared_across_frame_kinds() {
        let mut encoder = CommandEncoder::default();
        let a = Frame::parse(&encoder.interval_set(30, 20_000.0)).unwrap();
        let b = Frame::parse(&encoder.heartbeat()).unwrap();
        let c = Frame::parse(&encoder.param_set("SR1_EXT_STAT", 5.0)).unwrap();
        assert_eq!([a.sequence, b.sequence, c.sequence], [0, 1, 2]);
        assert_eq!(encoder.next_sequence(), 3);
    }

    proptest! {
        #[test]
        fn sequence_wraps_modulo_256(start in any::<u8>(), steps in 0usize..600) {
            let mut counter = SequenceCounter::new(start);
            for _ in 0..steps {
                counter.next();
            }
            prop_assert_eq!(counter.peek(), start.wrapping_add((steps % 256) as u8));
        }
    }
}
