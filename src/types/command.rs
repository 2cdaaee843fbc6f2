//! Outbound command descriptions

use serde::{Deserialize, Serialize};

/// A frame the client wants transmitted.
///
/// Commands are encoded immediately by the `CommandEncoder` and never retained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OutboundCommand {
    /// Ask the controller to emit `message_id` every `interval_us` microseconds
    SetMessageInterval { message_id: u32, interval_us: f32 },

    /// Write a named float parameter
    SetParameter { name: String, value: f32 },

    /// Ground-station liveness frame
    Heartbeat,
}

impl OutboundCommand {
    /// Interval-set command for a rate in Hz.
    ///
    /// A rate of zero is treated as 1 Hz.
    pub fn interval_hz(message_id: u32, rate_hz: u32) -> Self {
        let rate_hz = rate_hz.max(1);
        OutboundCommand::SetMessageInterval {
            message_id,
            interval_us: 1_000_000.0 / rate_hz as f32,
        }
    }

    /// Parameter-set command.
    pub fn parameter(name: impl Into<String>, value: f32) -> Self {
        OutboundCommand::SetParameter { name: name.into(), value }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundCommand::SetMessageInterval { .. } => "interval-set",
            OutboundCommand::SetParameter { .. } => "param-set",
            OutboundCommand::Heartbeat => "heartbeat",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_from_hz() {
        match OutboundCommand::interval_hz(30, 30) {
            OutboundCommand::SetMessageInterval { message_id, interval_us } => {
                assert_eq!(message_id, 30);
                assert!((interval_us - 33_333.33).abs() < 0.1);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn zero_rate_clamps_to_one_hz() {
        assert_eq!(
            OutboundCommand::interval_hz(1, 0),
            OutboundCommand::SetMessageInterval { message_id: 1, interval_us: 1_000_000.0 }
        );
    }
}
