//! Telemetry client facade.
//!
//! [`TelemetryClient`] binds the transport, spawns the driver and hands out
//! watch-backed subscriptions. A failed connect leaves the client
//! disconnected with the failure in [`TelemetryClient::status`]; calling
//! [`TelemetryClient::connect`] again retries.

use futures::{Stream, StreamExt};
use std::sync::Arc;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::driver::{Driver, DriverCommand, DriverHandle, DriverOutputs};
use crate::stream::ThrottleExt;
use crate::transport::{Transport, UdpTransport};
use crate::types::{
    AttitudeSample, ConnectionStatus, ControllerState, RateEstimate, StreamMode, UpdateRate,
};
use crate::{Result, TelemetryError};

/// Attitude telemetry client with closed-loop rate negotiation.
#[derive(Debug)]
pub struct TelemetryClient {
    config: ClientConfig,
    outputs: Arc<DriverOutputs>,
    session: Option<DriverHandle>,
}

impl TelemetryClient {
    /// Create a stopped client.
    pub fn new(config: ClientConfig) -> Self {
        Self { config, outputs: Arc::new(DriverOutputs::new()), session: None }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Bind the UDP link and start streaming.
    ///
    /// Any running session is shut down first, and its sockets released, so
    /// the same ports can be bound again. On failure the client stays
    /// disconnected and the error text is published as the status message.
    pub async fn connect(&mut self) -> Result<()> {
        self.shutdown().await;
        info!("Connecting to flight controller at {}", self.config.link.remote_addr());

        match UdpTransport::bind(&self.config.link).await {
            Ok(transport) => {
                self.start(transport);
                Ok(())
            }
            Err(e) => {
                warn!("Connection failed: {}", e);
                self.outputs.status.send_replace(ConnectionStatus::disconnected(e.to_string()));
                Err(e)
            }
        }
    }

    /// Start streaming over an already-connected transport.
    pub fn start<T: Transport>(&mut self, transport: T) {
        self.stop();
        self.session = Some(Driver::spawn(transport, self.config.clone(), self.outputs.clone()));
    }

    /// Stop streaming. Safe to call at any time, any number of times.
    ///
    /// The published state is reset to disconnected before this returns. The
    /// driver task stops its timers and drops its buffers when it next wakes.
    pub fn stop(&mut self) {
        self.end_session();
    }

    /// Stop streaming and wait for the driver task to exit.
    ///
    /// Once this returns the transport has been dropped.
    pub async fn shutdown(&mut self) {
        if let Some(session) = self.end_session() {
            if let Err(e) = session.task.await {
                warn!("Driver task did not exit cleanly: {}", e);
            }
        }
    }

    fn end_session(&mut self) -> Option<DriverHandle> {
        let session = self.session.take()?;
        debug!("Stopping telemetry session");
        self.outputs.end_session("Disconnected");
        session.cancel.cancel();
        Some(session)
    }

    /// Return the controller to default rates and `Normal` mode.
    ///
    /// # Errors
    ///
    /// [`TelemetryError::NotConnected`] when no session is running.
    pub fn reset_streaming(&self) -> Result<()> {
        let session = self.session.as_ref().ok_or(TelemetryError::NotConnected)?;
        session.commands.send(DriverCommand::ResetStreaming).map_err(|_| TelemetryError::NotConnected)
    }

    /// Attitude samples as they are decoded, optionally throttled.
    ///
    /// Yields the latest sample immediately if one exists. The stream ends
    /// only when the client is dropped.
    pub fn attitude_updates(&self, rate: UpdateRate) -> impl Stream<Item = AttitudeSample> + 'static {
        let samples = WatchStream::new(self.outputs.attitude.subscribe())
            .filter_map(|sample| async move { sample });

        match rate.throttle_interval() {
            None => samples.boxed(),
            Some(period) => samples.throttle(period).boxed(),
        }
    }

    /// Rate estimate after every one-second window.
    pub fn rate_updates(&self) -> impl Stream<Item = RateEstimate> + 'static {
        WatchStream::new(self.outputs.rate.subscribe())
    }

    /// Negotiation state changes.
    pub fn state_updates(&self) -> impl Stream<Item = ControllerState> + 'static {
        WatchStream::new(self.outputs.state.subscribe())
    }

    /// Connection status changes.
    pub fn status_updates(&self) -> impl Stream<Item = ConnectionStatus> + 'static {
        WatchStream::new(self.outputs.status.subscribe())
    }

    pub fn current_attitude(&self) -> Option<AttitudeSample> {
        *self.outputs.attitude.borrow()
    }

    pub fn current_rate(&self) -> RateEstimate {
        *self.outputs.rate.borrow()
    }

    pub fn state(&self) -> ControllerState {
        *self.outputs.state.borrow()
    }

    pub fn mode(&self) -> StreamMode {
        self.state().mode
    }

    pub fn status(&self) -> ConnectionStatus {
        self.outputs.status.borrow().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.outputs.status.borrow().connected
    }
}

impl Default for TelemetryClient {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl Drop for TelemetryClient {
    fn drop(&mut self) {
        debug!("Dropping telemetry client");
        self.stop();
    }
}
