//! Link status reported to consumers

use serde::{Deserialize, Serialize};

/// Connected flag plus a human-readable status line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub message: String,
}

impl ConnectionStatus {
    pub fn connected(message: impl Into<String>) -> Self {
        Self { connected: true, message: message.into() }
    }

    pub fn disconnected(message: impl Into<String>) -> Self {
        Self { connected: false, message: message.into() }
    }
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self::disconnected("Disconnected")
    }
}
