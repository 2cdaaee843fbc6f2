//! Core types for frames, samples and negotiation state.
//!
//! ## Architecture
//!
//! - [`Frame`] is one complete protocol unit with its raw bytes shared via `Arc`
//! - [`AttitudeSample`] is the decoded orientation report in degrees
//! - [`RateEstimate`], [`StreamMode`] and [`ControllerState`] describe rate negotiation
//! - [`OutboundCommand`] describes a frame to transmit before encoding
//! - [`mavlink_ids`] holds the message ids and enum values the client uses
//!
//! ## Usage Example
//!
//! ```rust
//! use mavrate::types::{Frame, ProtocolVersion};
//!
//! // v1 heartbeat header with an empty payload and a dummy checksum
//! let bytes = [0xFE, 0, 3, 1, 1, 0, 0x00, 0x00];
//! let frame = Frame::parse(&bytes).unwrap();
//! assert_eq!(frame.version, ProtocolVersion::V1);
//! assert_eq!(frame.message_id, 0);
//! assert!(frame.payload().is_empty());
//! ```

mod attitude;
mod command;
mod frame;
pub mod mavlink_ids;
mod rate;
mod status;
mod update_rate;

pub use attitude::AttitudeSample;
pub use command::OutboundCommand;
pub use frame::{
    CHECKSUM_LEN, Frame, HEADER_LEN_V1, HEADER_LEN_V2, ProtocolVersion, STX_V1, STX_V2,
};
pub use rate::{ControllerState, RateEstimate, StreamMode};
pub use status::ConnectionStatus;
pub use update_rate::UpdateRate;
