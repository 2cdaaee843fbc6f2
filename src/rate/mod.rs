//! Rate observation and negotiation.
//!
//! [`FrequencyMonitor`] counts attitude samples per window and
//! [`StreamRateController`] turns those counts into outbound commands.

pub mod controller;
pub mod monitor;

pub use controller::{ControllerOutput, StreamRateController};
pub use monitor::FrequencyMonitor;
