//! Attitude sample type

use serde::{Deserialize, Serialize};
use std::fmt;

/// One orientation report, angles already converted to degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AttitudeSample {
    /// Milliseconds since flight controller boot
    pub timestamp_ms: u32,

    /// Roll in degrees
    pub roll: f64,

    /// Pitch in degrees
    pub pitch: f64,

    /// Yaw in degrees
    pub yaw: f64,
}

impl AttitudeSample {
    /// Build a sample from raw radian angles.
    pub fn from_radians(timestamp_ms: u32, roll: f32, pitch: f32, yaw: f32) -> Self {
        Self {
            timestamp_ms,
            roll: (roll as f64).to_degrees(),
            pitch: (pitch as f64).to_degrees(),
            yaw: (yaw as f64).to_degrees(),
        }
    }
}

impl fmt::Display for AttitudeSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ATTITUDE: Roll={:.2}°, Pitch={:.2}°, Yaw={:.2}°",
            self.roll, self.pitch, self.yaw
        )
    }
}
