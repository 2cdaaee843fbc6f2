//! Rate estimate and negotiation state types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Observed attitude update rate over the last completed one-second window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct RateEstimate(pub u32);

impl RateEstimate {
    /// Samples counted in the window, i.e. Hz.
    pub fn hz(self) -> u32 {
        self.0
    }

    /// Check whether the rate is strictly below a threshold.
    pub fn is_below(self, threshold_hz: u32) -> bool {
        self.0 < threshold_hz
    }
}

impl fmt::Display for RateEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Hz", self.0)
    }
}

/// Stream negotiation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StreamMode {
    /// Rate on target, standard requests only
    #[default]
    Normal,
    /// Rate below target; full stream set is being re-requested
    Degraded,
    /// Rate far below target; aggressive rates and vendor parameters applied.
    /// Sticky until an explicit reset or reconnect.
    HighRate,
}

impl fmt::Display for StreamMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StreamMode::Normal => "normal",
            StreamMode::Degraded => "degraded",
            StreamMode::HighRate => "high-rate",
        };
        f.write_str(name)
    }
}

/// Snapshot of the negotiation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ControllerState {
    /// Most recent rate estimate
    pub rate: RateEstimate,

    /// Consecutive one-second windows below the low-rate threshold
    pub consecutive_low_count: u32,

    /// Current mode
    pub mode: StreamMode,

    /// Whether the link is up
    pub connected: bool,
}
