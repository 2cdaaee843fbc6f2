//! Client configuration
//!
//! Configuration is plain serde data, usually loaded from YAML:
//!
//! ```rust
//! use mavrate::ClientConfig;
//!
//! let config = ClientConfig::from_yaml_str(
//!     r#"
//! link:
//!   remote_host: 192.168.1.10
//!   remote_port: 14550
//! negotiation:
//!   low_rate_hz: 20
//! "#,
//! )
//! .unwrap();
//! assert_eq!(config.negotiation.low_rate_hz, 20);
//! assert_eq!(config.negotiation.very_low_rate_hz, 10);
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::{Result, TelemetryError};

/// Port some bridges advertise for a serial link; the UDP endpoint lives on 14550.
pub const LEGACY_SERIAL_PORT: u16 = 5760;

/// Default UDP port for ground stations.
pub const DEFAULT_UDP_PORT: u16 = 14550;

/// Top-level client configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub link: LinkConfig,
    pub negotiation: NegotiationConfig,
    pub decoder: DecoderConfig,
    pub buffer: BufferConfig,
}

impl ClientConfig {
    /// Parse and validate configuration from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: ClientConfig = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading client configuration from {}", path.display());
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            TelemetryError::config_error(path.display().to_string(), e.to_string())
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        let n = &self.negotiation;
        for (name, period) in [
            ("rate_tick", n.rate_tick),
            ("ensure_tick", n.ensure_tick),
            ("heartbeat_interval", n.heartbeat_interval),
        ] {
            if period.is_zero() {
                return Err(TelemetryError::config_error(
                    "negotiation",
                    format!("{name} must be non-zero"),
                ));
            }
        }

        if n.very_low_rate_hz > n.low_rate_hz {
            return Err(TelemetryError::config_error(
                "negotiation",
                format!(
                    "very_low_rate_hz ({}) exceeds low_rate_hz ({})",
                    n.very_low_rate_hz, n.low_rate_hz
                ),
            ));
        }

        if n.retry_after_ticks == 0 {
            return Err(TelemetryError::config_error(
                "negotiation",
                "retry_after_ticks must be at least 1",
            ));
        }

        if self.buffer.retain > self.buffer.cap {
            return Err(TelemetryError::config_error(
                "buffer",
                format!("retain ({}) exceeds cap ({})", self.buffer.retain, self.buffer.cap),
            ));
        }

        if self.link.bind_ports.is_empty() {
            return Err(TelemetryError::config_error("link", "bind_ports must not be empty"));
        }

        Ok(())
    }
}

/// Addressing and identity on the UDP link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub remote_host: String,
    pub remote_port: u16,
    /// Local ports to listen on. The first must bind; the rest are optional.
    pub bind_ports: Vec<u16>,
    /// Substring the sender address must contain to be accepted
    pub source_filter: Option<String>,
    pub system_id: u8,
    pub component_id: u8,
    pub target_system: u8,
    pub target_component: u8,
}

impl LinkConfig {
    /// Remote port after remapping the legacy serial-bridge port.
    pub fn effective_remote_port(&self) -> u16 {
        if self.remote_port == LEGACY_SERIAL_PORT { DEFAULT_UDP_PORT } else { self.remote_port }
    }

    /// `host:port` of the flight controller.
    pub fn remote_addr(&self) -> String {
        format!("{}:{}", self.remote_host, self.effective_remote_port())
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            remote_host: "192.168.1.1".to_string(),
            remote_port: DEFAULT_UDP_PORT,
            bind_ports: vec![DEFAULT_UDP_PORT, DEFAULT_UDP_PORT + 1],
            source_filter: Some("192.168.1".to_string()),
            system_id: 255,
            component_id: 1,
            target_system: 1,
            target_component: 1,
        }
    }
}

/// Thresholds and timer periods for rate negotiation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NegotiationConfig {
    /// Below this rate the stream is considered low
    pub low_rate_hz: u32,
    /// Below this rate the controller escalates to high-rate mode
    pub very_low_rate_hz: u32,
    /// Consecutive low windows before the standard re-request
    pub retry_after_ticks: u32,
    #[serde(with = "duration_ms")]
    pub rate_tick: Duration,
    #[serde(with = "duration_ms")]
    pub ensure_tick: Duration,
    #[serde(with = "duration_ms")]
    pub initial_request_delay: Duration,
    #[serde(with = "duration_ms")]
    pub heartbeat_interval: Duration,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            low_rate_hz: 25,
            very_low_rate_hz: 10,
            retry_after_ticks: 3,
            rate_tick: Duration::from_secs(1),
            ensure_tick: Duration::from_secs(2),
            initial_request_delay: Duration::from_secs(2),
            heartbeat_interval: Duration::from_secs(1),
        }
    }
}

/// Decoder behaviour switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Drop attitude reports whose boot timestamp reads exactly zero
    pub ignore_zero_timestamp: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self { ignore_zero_timestamp: true }
    }
}

/// Receive buffer bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Size above which the buffer is truncated
    pub cap: usize,
    /// Tail length kept after truncation
    pub retain: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self { cap: 4096, retain: 2048 }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ClientConfig::default();
        config.validate().expect("defaults should validate");
        assert_eq!(config.negotiation.low_rate_hz, 25);
        assert_eq!(config.negotiation.ensure_tick, Duration::from_secs(2));
        assert_eq!(config.buffer.cap, 4096);
        assert!(config.decoder.ignore_zero_timestamp);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let config = ClientConfig::from_yaml_str(
            "link:\n  remote_host: 10.0.0.2\nnegotiation:\n  ensure_tick: 5000\n",
        )
        .expect("valid yaml");
        assert_eq!(config.link.remote_host, "10.0.0.2");
        assert_eq!(config.link.remote_port, DEFAULT_UDP_PORT);
        assert_eq!(config.negotiation.ensure_tick, Duration::from_secs(5));
        assert_eq!(config.negotiation.rate_tick, Duration::from_secs(1));
    }

    #[test]
    fn legacy_port_is_remapped() {
        let link = LinkConfig { remote_port: LEGACY_SERIAL_PORT, ..LinkConfig::default() };
        assert_eq!(link.effective_remote_port(), DEFAULT_UDP_PORT);
        assert_eq!(link.remote_addr(), "192.168.1.1:14550");

        let link = LinkConfig { remote_port: 14560, ..LinkConfig::default() };
        assert_eq!(link.effective_remote_port(), 14560);
    }

    #[test]
    fn rejects_inverted_thresholds() {
        let err = ClientConfig::from_yaml_str(
            "negotiation:\n  low_rate_hz: 5\n  very_low_rate_hz: 10\n",
        )
        .unwrap_err();
        assert!(matches!(err, TelemetryError::Config { .. }));
    }

    #[test]
    fn rejects_zero_periods_and_bad_buffer() {
        assert!(ClientConfig::from_yaml_str("negotiation:\n  rate_tick: 0\n").is_err());
        assert!(ClientConfig::from_yaml_str("buffer:\n  cap: 100\n  retain: 200\n").is_err());
        assert!(ClientConfig::from_yaml_str("link:\n  bind_ports: []\n").is_err());
    }

    #[test]
    fn malformed_yaml_is_config_error() {
        let err = ClientConfig::from_yaml_str("link: [unclosed").unwrap_err();
        assert!(matches!(err, TelemetryError::Config { .. }));
    }

    #[test]
    fn round_trips_through_yaml() {
        let config = ClientConfig::default();
        let yaml = serde_yaml_ng::to_string(&config).expect("serialize");
        assert_eq!(ClientConfig::from_yaml_str(&yaml).expect("parse"), config);
    }

    #[test]
    fn load_reports_missing_file() {
        let err = ClientConfig::load("/nonexistent/mavrate.yaml").unwrap_err();
        assert!(matches!(err, TelemetryError::Config { .. }));
    }
}
