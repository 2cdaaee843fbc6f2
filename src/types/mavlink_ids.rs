//! Protocol constants used by this client
//!
//! Only the subset of the common message set that the client reads or writes.

/// Message ids
pub mod message_id {
    pub const HEARTBEAT: u32 = 0;
    pub const SYS_STATUS: u32 = 1;
    pub const PARAM_SET: u32 = 23;
    pub const ATTITUDE: u32 = 30;
    pub const GLOBAL_POSITION_INT: u32 = 33;
    pub const VFR_HUD: u32 = 74;
    /// Interval-set command, sent as its own frame id
    pub const SET_MESSAGE_INTERVAL: u32 = 511;
}

/// Heartbeat identity fields for a ground-station peer
pub mod heartbeat {
    pub const MAV_TYPE_GCS: u8 = 6;
    pub const MAV_AUTOPILOT_GENERIC: u8 = 0;
    pub const MAV_STATE_ACTIVE: u8 = 4;
    pub const MAVLINK_VERSION: u8 = 3;
}

/// Parameter value type tags
pub mod param_type {
    pub const REAL32: u8 = 9;
}

/// Vendor stream-group rate parameters (serial port 1)
pub mod stream_params {
    pub const SR1_EXT_STAT: &str = "SR1_EXT_STAT";
    /// Controls the attitude stream group
    pub const SR1_EXTRA1: &str = "SR1_EXTRA1";
    pub const SR1_EXTRA2: &str = "SR1_EXTRA2";
    pub const SR1_EXTRA3: &str = "SR1_EXTRA3";
}
