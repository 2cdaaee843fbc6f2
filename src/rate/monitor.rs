//! Fixed-window attitude rate counter

use tracing::debug;

use crate::types::RateEstimate;

/// Every Nth sample is logged with the current rate.
const LOG_EVERY: u64 = 30;

/// Counts attitude samples between ticks.
///
/// Not a sliding average: a tick reports exactly what arrived since the
/// previous tick, so the estimate lags a rate change by up to one window.
#[derive(Debug, Default)]
pub struct FrequencyMonitor {
    window_count: u32,
    total: u64,
    last: RateEstimate,
}

impl FrequencyMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one accepted attitude sample.
    pub fn record_sample(&mut self) {
        self.window_count += 1;
        self.total += 1;
        if self.total % LOG_EVERY == 0 {
            debug!("ATTITUDE #{} (rate {})", self.total, self.last);
        }
    }

    /// Close the window: report its count and start a new one.
    pub fn tick(&mut self) -> RateEstimate {
        self.last = RateEstimate(self.window_count);
        self.window_count = 0;
        self.last
    }

    /// Estimate from the last completed window.
    pub fn current(&self) -> RateEstimate {
        self.last
    }

    /// Samples recorded since creation or reset.
    pub fn total_samples(&self) -> u64 {
        self.total
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_reports_window_then_resets() {
        let mut monitor = FrequencyMonitor::new();
        for _ in 0..27 {
            monitor.record_sample();
        }
        assert_eq!(monitor.tick(), RateEstimate(27));
        assert_eq!(monitor.tick(), RateEstimate(0));
        assert_eq!(monitor.total_samples(), 27);
    }

    #[test]
    fn current_holds_last_completed_window() {
        let mut monitor = FrequencyMonitor::new();
        monitor.record_sample();
        assert_eq!(monitor.current(), RateEstimate(0));
        monitor.tick();
        monitor.record_sample();
        assert_eq!(monitor.current(), RateEstimate(1));
    }

    #[test]
    fn reset_clears_everything() {
        let mut monitor = FrequencyMonitor::new();
        monitor.record_sample();
        monitor.tick();
        monitor.reset();
        assert_eq!(monitor.current(), RateEstimate(0));
        assert_eq!(monitor.total_samples(), 0);
        assert_eq!(monitor.tick(), RateEstimate(0));
    }
}
