//! Error types for the telemetry client.
//!
//! All errors implement `std::error::Error` and carry enough context to decide
//! whether an operation may be retried.
//!
//! ## Error Categories
//!
//! - **Connection Errors**: socket bind failures, peer address resolution
//! - **Transport Errors**: send/receive failures on an established link
//! - **Decode Errors**: payloads too short for the declared message layout
//! - **Config Errors**: invalid or unreadable client configuration
//!
//! None of these are fatal to a running client: the driver logs decode and
//! transport errors and keeps going, and a connection error leaves the client
//! disconnected so the caller can try again.
//!
//! ```rust
//! use mavrate::TelemetryError;
//!
//! let error = TelemetryError::connection_failed("UDP bind failed");
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::time::Duration;
use thiserror::Error;

/// Result type alias for telemetry operations.
pub type Result<T, E = TelemetryError> = std::result::Result<T, E>;

/// Main error type for telemetry operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TelemetryError {
    #[error("Failed to connect to flight controller: {reason}")]
    Connection {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Transport error during {operation}")]
    Transport {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Truncated payload for message {msg_id}: need {expected} bytes, have {actual}")]
    TruncatedPayload { msg_id: u32, expected: usize, actual: usize },

    #[error("Configuration error in {context}: {details}")]
    Config { context: String, details: String },

    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("Transport is not connected")]
    NotConnected,
}

impl TelemetryError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            TelemetryError::Connection { .. } => true,
            TelemetryError::Transport { .. } => true,
            TelemetryError::Timeout { .. } => true,
            TelemetryError::NotConnected => true,
            TelemetryError::TruncatedPayload { .. } => false,
            TelemetryError::Config { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            TelemetryError::Connection { .. } => vec![
                "Check that no other ground station holds the UDP port",
                "Verify the flight controller address and port",
                "Retry the connection",
            ],
            TelemetryError::Transport { .. } => vec![
                "Check the network link to the flight controller",
                "Verify the telemetry radio or bridge is powered",
            ],
            TelemetryError::TruncatedPayload { .. } => vec![
                "Check the flight controller firmware message definitions",
                "Ignore the frame and wait for the next one",
            ],
            TelemetryError::Config { .. } => vec![
                "Check the configuration file syntax",
                "Verify periods are non-zero and thresholds are ordered",
            ],
            TelemetryError::Timeout { .. } => vec![
                "Increase timeout duration",
                "Verify the flight controller is streaming",
            ],
            TelemetryError::NotConnected => {
                vec!["Connect the client before sending", "Reconnect after a disconnect"]
            }
        }
    }

    /// Helper constructor for connection errors.
    pub fn connection_failed(reason: impl Into<String>) -> Self {
        TelemetryError::Connection { reason: reason.into(), source: None }
    }

    /// Helper constructor for connection errors with source.
    pub fn connection_failed_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        TelemetryError::Connection { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for transport I/O errors.
    pub fn transport(operation: impl Into<String>, source: std::io::Error) -> Self {
        TelemetryError::Transport { operation: operation.into(), source }
    }

    /// Helper constructor for short payloads.
    pub fn truncated_payload(msg_id: u32, expected: usize, actual: usize) -> Self {
        TelemetryError::TruncatedPayload { msg_id, expected, actual }
    }

    /// Helper constructor for configuration errors.
    pub fn config_error(context: impl Into<String>, details: impl Into<String>) -> Self {
        TelemetryError::Config { context: context.into(), details: details.into() }
    }
}

impl From<std::io::Error> for TelemetryError {
    fn from(err: std::io::Error) -> Self {
        TelemetryError::Transport { operation: "I/O".to_string(), source: err }
    }
}

impl From<serde_yaml_ng::Error> for TelemetryError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        TelemetryError::Config { context: "YAML".to_string(), details: err.to_string() }
    }
}
