//! Stream rate negotiation state machine.
//!
//! Two independent ticks drive the controller:
//!
//! - the **rate tick** (1 s) tracks consecutive low windows and re-requests the
//!   standard attitude/status streams after `retry_after_ticks` of them;
//! - the **ensure tick** (2 s) re-requests the full stream set whenever the last
//!   estimate is low, and escalates to [`StreamMode::HighRate`] when it is very low.
//!
//! Escalation is sticky: only [`StreamRateController::reset_streaming`] or a
//! reconnect returns the controller to [`StreamMode::Normal`].
//!
//! The controller never performs I/O. Each tick returns the commands to send
//! and any mode change as a [`ControllerOutput`].

use tracing::{debug, info, warn};

use crate::config::NegotiationConfig;
use crate::types::mavlink_ids::{message_id, stream_params};
use crate::types::{ControllerState, OutboundCommand, RateEstimate, StreamMode};

/// Standard attitude rate.
pub const ATTITUDE_HZ: u32 = 30;
/// Standard system status rate.
pub const SYS_STATUS_HZ: u32 = 5;
/// Rate requested for secondary streams in the full request set.
pub const SECONDARY_HZ: u32 = 10;
/// Aggressive attitude rate in high-rate mode.
pub const HIGH_RATE_ATTITUDE_HZ: u32 = 50;
/// Aggressive system status rate in high-rate mode.
pub const HIGH_RATE_SYS_STATUS_HZ: u32 = 10;

/// Stream-group parameter values: EXT_STAT, EXTRA1, EXTRA2, EXTRA3.
const HIGH_RATE_PARAMS: [f32; 4] = [10.0, 50.0, 20.0, 10.0];
const DEFAULT_PARAMS: [f32; 4] = [5.0, 10.0, 5.0, 2.0];

/// Result of one controller step.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ControllerOutput {
    /// Commands to send, in order
    pub commands: Vec<OutboundCommand>,
    /// New mode, if it changed
    pub mode_change: Option<StreamMode>,
}

impl ControllerOutput {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.mode_change.is_none()
    }
}

/// Attitude at the standard rate plus system status, the request sent on
/// connect and after repeated low windows.
pub fn standard_request() -> Vec<OutboundCommand> {
    vec![
        OutboundCommand::interval_hz(message_id::ATTITUDE, ATTITUDE_HZ),
        OutboundCommand::interval_hz(message_id::SYS_STATUS, SYS_STATUS_HZ),
    ]
}

/// Every stream the client relies on.
pub fn full_stream_request() -> Vec<OutboundCommand> {
    [
        message_id::ATTITUDE,
        message_id::SYS_STATUS,
        message_id::GLOBAL_POSITION_INT,
        message_id::VFR_HUD,
    ]
    .into_iter()
    .map(|id| {
        let hz = if id == message_id::ATTITUDE { ATTITUDE_HZ } else { SECONDARY_HZ };
        OutboundCommand::interval_hz(id, hz)
    })
    .collect()
}

/// Aggressive interval-set commands, vendor stream parameters, then the full set again.
pub fn high_rate_request() -> Vec<OutboundCommand> {
    let mut commands = vec![
        OutboundCommand::interval_hz(message_id::ATTITUDE, HIGH_RATE_ATTITUDE_HZ),
        OutboundCommand::interval_hz(message_id::SYS_STATUS, HIGH_RATE_SYS_STATUS_HZ),
    ];
    commands.extend(stream_parameters(HIGH_RATE_PARAMS));
    commands.extend(full_stream_request());
    commands
}

/// Standard rates and default vendor stream parameters.
pub fn default_rates_request() -> Vec<OutboundCommand> {
    let mut commands = standard_request();
    commands.extend(stream_parameters(DEFAULT_PARAMS));
    commands
}

fn stream_parameters(values: [f32; 4]) -> impl Iterator<Item = OutboundCommand> {
    [
        stream_params::SR1_EXT_STAT,
        stream_params::SR1_EXTRA1,
        stream_params::SR1_EXTRA2,
        stream_params::SR1_EXTRA3,
    ]
    .into_iter()
    .zip(values)
    .map(|(name, value)| OutboundCommand::parameter(name, value))
}

/// Watchdog that keeps the attitude stream at its target rate.
#[derive(Debug, Clone)]
pub struct StreamRateController {
    config: NegotiationConfig,
    state: ControllerState,
}

impl StreamRateController {
    pub fn new(config: NegotiationConfig) -> Self {
        Self { config, state: ControllerState::default() }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn mode(&self) -> StreamMode {
        self.state.mode
    }

    /// Link came up: start from a clean `Normal` state.
    pub fn on_connected(&mut self) {
        self.state = ControllerState { connected: true, ..ControllerState::default() };
        info!("Rate negotiation started");
    }

    /// Link went down: back to `Normal` with all counters zeroed.
    pub fn on_disconnected(&mut self) {
        self.state = ControllerState::default();
        debug!("Rate negotiation reset");
    }

    /// One-second tick with the rate of the window that just closed.
    pub fn on_rate_tick(&mut self, rate: RateEstimate) -> ControllerOutput {
        self.state.rate = rate;
        let mut output = ControllerOutput::default();

        if self.state.connected && rate.is_below(self.config.low_rate_hz) {
            self.state.consecutive_low_count += 1;
            if self.state.consecutive_low_count >= self.config.retry_after_ticks {
                warn!("Low attitude frequency ({}), re-requesting stream", rate);
                output.commands = standard_request();
                self.state.consecutive_low_count = 0;
            }
        } else {
            self.state.consecutive_low_count = 0;
            if self.state.connected && self.state.mode == StreamMode::Degraded {
                output.mode_change = self.set_mode(StreamMode::Normal);
            }
        }

        output
    }

    /// Two-second tick: enforce stream health from the latest estimate.
    pub fn on_ensure_tick(&mut self) -> ControllerOutput {
        let rate = self.state.rate;
        let mut output = ControllerOutput::default();

        if !self.state.connected || !rate.is_below(self.config.low_rate_hz) {
            return output;
        }

        debug!("Low frequency ({}), re-requesting streams", rate);
        output.commands = full_stream_request();

        if rate.is_below(self.config.very_low_rate_hz) {
            info!("Very low frequency ({}), enabling high rate mode", rate);
            output.commands.extend(high_rate_request());
            output.mode_change = self.set_mode(StreamMode::HighRate);
        } else if self.state.mode == StreamMode::Normal {
            output.mode_change = self.set_mode(StreamMode::Degraded);
        }

        output
    }

    /// Return to default rates and `Normal`, clearing sticky escalation.
    pub fn reset_streaming(&mut self) -> ControllerOutput {
        info!("Resetting streaming to defaults");
        self.state.consecutive_low_count = 0;
        ControllerOutput {
            commands: default_rates_request(),
            mode_change: self.set_mode(StreamMode::Normal),
        }
    }

    fn set_mode(&mut self, mode: StreamMode) -> Option<StreamMode> {
        if self.state.mode == mode {
            return None;
        }
        debug!("Stream mode {} -> {}", self.state.mode, mode);
        self.state.mode = mode;
        Some(mode)
    }
}

impl Default for StreamRateController {
    fn default() -> Self {
        Self::new(NegotiationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn connected() -> StreamRateController {
        let mut controller = StreamRateController::default();
        controller.on_connected();
        controller
    }

    fn interval_targets(commands: &[OutboundCommand]) -> Vec<(u32, u32)> {
        commands
            .iter()
            .filter_map(|c| match c {
                OutboundCommand::SetMessageInterval { message_id, interval_us } => {
                    Some((*message_id, (1_000_000.0 / interval_us).round() as u32))
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn three_low_ticks_trigger_one_standard_request() {
        let mut controller = connected();

        assert!(controller.on_rate_tick(RateEstimate(20)).is_empty());
        assert!(controller.on_rate_tick(RateEstimate(12)).is_empty());
        assert_eq!(controller.state().consecutive_low_count, 2);

        let output = controller.on_rate_tick(RateEstimate(20));
        assert_eq!(output.commands, standard_request());
        assert_eq!(interval_targets(&output.commands), vec![(30, 30), (1, 5)]);
        assert_eq!(output.mode_change, None);
        assert_eq!(controller.state().consecutive_low_count, 0);
        assert_eq!(controller.mode(), StreamMode::Normal);
    }

    #[test]
    fn very_low_rate_on_ensure_escalates() {
        let mut controller = connected();
        for _ in 0..3 {
            controller.on_rate_tick(RateEstimate(20));
        }

        controller.on_rate_tick(RateEstimate(8));
        let output = controller.on_ensure_tick();

        assert_eq!(output.mode_change, Some(StreamMode::HighRate));
        assert_eq!(controller.mode(), StreamMode::HighRate);

        let targets = interval_targets(&output.commands);
        assert_eq!(&targets[..4], &[(30, 30), (1, 10), (33, 10), (74, 10)]);
        assert!(targets.contains(&(30, 50)));
        assert!(targets.contains(&(1, 10)));

        let params: Vec<_> = output
            .commands
            .iter()
            .filter_map(|c| match c {
                OutboundCommand::SetParameter { name, value } => Some((name.as_str(), *value)),
                _ => None,
            })
            .collect();
        assert_eq!(
            params,
            vec![("SR1_EXT_STAT", 10.0), ("SR1_EXTRA1", 50.0), ("SR1_EXTRA2", 20.0), ("SR1_EXTRA3", 10.0)]
        );
    }

    #[test]
    fn moderate_low_rate_degrades_then_recovers() {
        let mut controller = connected();
        controller.on_rate_tick(RateEstimate(18));

        let output = controller.on_ensure_tick();
        assert_eq!(output.commands, full_stream_request());
        assert_eq!(output.mode_change, Some(StreamMode::Degraded));

        let output = controller.on_rate_tick(RateEstimate(30));
        assert_eq!(output.mode_change, Some(StreamMode::Normal));
        assert!(output.commands.is_empty());
    }

    #[test]
    fn high_rate_is_sticky_until_reset() {
        let mut controller = connected();
        controller.on_rate_tick(RateEstimate(2));
        controller.on_ensure_tick();
        assert_eq!(controller.mode(), StreamMode::HighRate);

        let output = controller.on_rate_tick(RateEstimate(60));
        assert_eq!(output.mode_change, None);
        assert_eq!(controller.mode(), StreamMode::HighRate);
        assert!(controller.on_ensure_tick().is_empty());

        let output = controller.reset_streaming();
        assert_eq!(output.mode_change, Some(StreamMode::Normal));
        assert_eq!(output.commands, default_rates_request());
        assert_eq!(controller.mode(), StreamMode::Normal);
    }

    #[test]
    fn healthy_rate_resets_low_count() {
        let mut controller = connected();
        controller.on_rate_tick(RateEstimate(10));
        controller.on_rate_tick(RateEstimate(10));
        controller.on_rate_tick(RateEstimate(25));
        assert_eq!(controller.state().consecutive_low_count, 0);
        assert!(controller.on_rate_tick(RateEstimate(10)).is_empty());
    }

    #[test]
    fn disconnected_controller_stays_quiet() {
        let mut controller = StreamRateController::default();
        for _ in 0..5 {
            assert!(controller.on_rate_tick(RateEstimate(0)).is_empty());
            assert!(controller.on_ensure_tick().is_empty());
        }
        assert_eq!(controller.state().consecutive_low_count, 0);
    }

    #[test]
    fn disconnect_resets_state() {
        let mut controller = connected();
        controller.on_rate_tick(RateEstimate(1));
        controller.on_ensure_tick();
        controller.on_rate_tick(RateEstimate(1));

        controller.on_disconnected();
        assert_eq!(controller.state(), ControllerState::default());

        controller.on_connected();
        assert_eq!(controller.mode(), StreamMode::Normal);
        assert!(controller.state().connected);
    }

    proptest! {
        #[test]
        fn low_count_tracks_streak_and_retries_every_third(rates in prop::collection::vec(0u32..60, 0..100)) {
            let mut controller = connected();
            let mut streak = 0;
            for rate in rates {
                let output = controller.on_rate_tick(RateEstimate(rate));
                if rate < 25 {
                    streak += 1;
                    if streak == 3 {
                        streak = 0;
                        prop_assert_eq!(output.commands.len(), 2);
                    }
                } else {
                    streak = 0;
                }
                prop_assert!(controller.state().consecutive_low_count < 3);
                prop_assert_eq!(controller.state().consecutive_low_count, streak);
            }
        }
    }
}
