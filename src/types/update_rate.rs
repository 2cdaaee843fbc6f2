//! Delivery rate for attitude subscriptions

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How often a subscriber wants attitude updates.
///
/// This only shapes delivery to the subscriber. It never changes what the
/// flight controller is asked to stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UpdateRate {
    /// Every decoded sample
    #[default]
    Native,

    /// At most this many updates per second, latest sample wins
    Max(u32),
}

impl UpdateRate {
    /// Throttle interval, if one applies.
    ///
    /// `Max(0)` behaves like `Native`.
    pub fn throttle_interval(self) -> Option<Duration> {
        match self {
            UpdateRate::Native | UpdateRate::Max(0) => None,
            UpdateRate::Max(hz) => Some(Duration::from_secs_f64(1.0 / hz as f64)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_is_unthrottled() {
        assert_eq!(UpdateRate::Native.throttle_interval(), None);
        assert_eq!(UpdateRate::Max(0).throttle_interval(), None);
    }

    #[test]
    fn max_rate_yields_period() {
        assert_eq!(UpdateRate::Max(5).throttle_interval(), Some(Duration::from_millis(200)));
    }
}
