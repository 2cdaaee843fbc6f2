//! MAVLink attitude telemetry client with closed-loop stream rate negotiation.
//!
//! `mavrate` reassembles MAVLink v1/v2 frames from a lossy datagram link,
//! decodes attitude reports and keeps them arriving at a target rate by
//! re-requesting streams from the flight controller when the observed rate
//! drops.
//!
//! # Features
//!
//! - **Frame reassembly**: frames split across, or packed into, datagrams of any size
//! - **Rate negotiation**: standard re-requests, full stream sets and a sticky high-rate mode
//! - **Watch-based subscriptions**: latest attitude, rate, negotiation state and link status
//! - **Deterministic testing**: pure core types plus an in-memory transport
//!
//! # Architecture
//!
//! ```text
//! Transport ─bytes─▶ FrameAssembler ─Frame─▶ MessageDecoder ─AttitudeSample─▶ FrequencyMonitor
//!     ▲                                                                            │ tick
//!     └──────── CommandEncoder ◀─OutboundCommand── StreamRateController ◀─RateEstimate
//! ```
//!
//! The protocol and rate modules are synchronous and do no I/O. The
//! [`driver`] task owns them and runs the tick schedule; [`TelemetryClient`]
//! owns the driver.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use mavrate::{ClientConfig, TelemetryClient, UpdateRate};
//!
//! #[tokio::main]
//! async fn main() -> mavrate::Result<()> {
//!     let mut client = TelemetryClient::new(ClientConfig::default());
//!     client.connect().await?;
//!
//!     let mut attitude = client.attitude_updates(UpdateRate::Max(10));
//!     while let Some(sample) = attitude.next().await {
//!         println!("{sample} ({})", client.current_rate());
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
pub mod config;
mod error;
pub mod types;

// Synchronous core
pub mod protocol;
pub mod rate;

// Async runtime
pub mod client;
pub mod driver;
pub mod stream;
pub mod transport;

pub use client::TelemetryClient;
pub use config::{BufferConfig, ClientConfig, DecoderConfig, LinkConfig, NegotiationConfig};
pub use error::*;
pub use protocol::{CommandEncoder, FrameAssembler, MessageDecoder, RawBuffer};
pub use rate::{ControllerOutput, FrequencyMonitor, StreamRateController};
pub use transport::Transport;
pub use types::*;
