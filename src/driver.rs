//! Driver task that owns the telemetry core and runs the tick schedule

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval, interval_at, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::config::ClientConfig;
use crate::protocol::{CommandEncoder, FrameAssembler, MessageDecoder};
use crate::rate::{ControllerOutput, FrequencyMonitor, StreamRateController};
use crate::transport::Transport;
use crate::types::{AttitudeSample, ConnectionStatus, ControllerState, OutboundCommand, RateEstimate};

/// Consecutive receive errors tolerated before the link is declared lost.
const MAX_RECV_ERRORS: u32 = 10;

/// Watch channels the driver publishes to.
///
/// Owned by the client and shared with each driver it spawns, so
/// subscriptions survive a stop and reconnect.
///
/// Each driver publishes under a session id. Once the client ends that
/// session, later publishes from the old driver are dropped, so a stopped
/// state can never be overwritten by a task that is still winding down.
#[derive(Debug)]
pub struct DriverOutputs {
    pub attitude: watch::Sender<Option<AttitudeSample>>,
    pub rate: watch::Sender<RateEstimate>,
    pub state: watch::Sender<ControllerState>,
    pub status: watch::Sender<ConnectionStatus>,
    session: Mutex<u64>,
}

impl DriverOutputs {
    pub fn new() -> Self {
        Self {
            attitude: watch::Sender::new(None),
            rate: watch::Sender::new(RateEstimate::default()),
            state: watch::Sender::new(ControllerState::default()),
            status: watch::Sender::new(ConnectionStatus::default()),
            session: Mutex::new(0),
        }
    }

    fn current_session(&self) -> MutexGuard<'_, u64> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a new session and return its id.
    pub fn begin_session(&self) -> u64 {
        let mut current = self.current_session();
        *current += 1;
        *current
    }

    /// End the current session and publish the torn-down state.
    ///
    /// No driver publishes after this returns until a new session begins.
    pub fn end_session(&self, message: impl Into<String>) {
        let mut current = self.current_session();
        *current += 1;
        self.publish_stopped(message);
    }

    /// Run `update` if `session` is still current.
    ///
    /// Returns `false` when the session has ended and nothing was published.
    pub fn publish_for(&self, session: u64, update: impl FnOnce(&Self)) -> bool {
        let current = self.current_session();
        if *current != session {
            return false;
        }
        update(self);
        true
    }

    /// Publish the torn-down state: disconnected, zero rate, `Normal`.
    ///
    /// The last attitude sample is kept.
    pub fn publish_stopped(&self, message: impl Into<String>) {
        self.rate.send_replace(RateEstimate::default());
        self.state.send_replace(ControllerState::default());
        self.status.send_replace(ConnectionStatus::disconnected(message));
    }
}

impl Default for DriverOutputs {
    fn default() -> Self {
        Self::new()
    }
}

/// Requests from the client to a running driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverCommand {
    ResetStreaming,
}

/// Handle to a spawned driver.
#[derive(Debug)]
pub struct DriverHandle {
    /// Client requests
    pub commands: mpsc::UnboundedSender<DriverCommand>,
    /// Cancellation token for graceful shutdown
    pub cancel: CancellationToken,
    pub task: JoinHandle<()>,
}

/// Spawns and runs the per-connection task.
///
/// The task owns every piece of mutable core state (framer, decoder, rate
/// monitor, controller, encoder), so none of it is shared across threads.
/// Only the published outputs are shared with the client. It drives five
/// event sources from one `select!` loop: inbound chunks, the one-second rate
/// tick, the one-shot initial request, the ensure tick and the heartbeat.
pub struct Driver<T> {
    transport: T,
    config: ClientConfig,
    assembler: FrameAssembler,
    decoder: MessageDecoder,
    monitor: FrequencyMonitor,
    controller: StreamRateController,
    encoder: CommandEncoder,
    outputs: Arc<DriverOutputs>,
    session: u64,
}

impl<T: Transport> Driver<T> {
    /// Build a driver that publishes under a fresh session of `outputs`.
    pub fn new(transport: T, config: ClientConfig, outputs: Arc<DriverOutputs>) -> Self {
        let session = outputs.begin_session();
        Self {
            assembler: FrameAssembler::new(config.buffer),
            decoder: MessageDecoder::new(config.decoder),
            monitor: FrequencyMonitor::new(),
            controller: StreamRateController::new(config.negotiation.clone()),
            encoder: CommandEncoder::new(&config.link),
            transport,
            config,
            outputs,
            session,
        }
    }

    /// Spawn the driver task for a connected transport.
    pub fn spawn(transport: T, config: ClientConfig, outputs: Arc<DriverOutputs>) -> DriverHandle {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let driver = Self::new(transport, config, outputs);

        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            driver.run(command_rx, task_cancel).await;
        });

        DriverHandle { commands: command_tx, cancel, task }
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<DriverCommand>,
        cancel: CancellationToken,
    ) {
        let schedule = self.config.negotiation.clone();
        let start = Instant::now();

        let mut rate_tick = ticker(start + schedule.rate_tick, schedule.rate_tick);
        let mut ensure_tick = ticker(
            start + schedule.initial_request_delay + schedule.ensure_tick,
            schedule.ensure_tick,
        );
        let mut heartbeat = interval(schedule.heartbeat_interval);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let initial_request = sleep(schedule.initial_request_delay);
        tokio::pin!(initial_request);
        let mut initial_sent = false;

        self.controller.on_connected();
        self.publish_state();
        let connected = ConnectionStatus::connected(self.transport.describe());
        self.publish(|outputs| {
            outputs.status.send_replace(connected);
        });
        info!("Driver started: {}", self.transport.describe());

        let mut recv_errors = 0u32;
        let mut chunks = 0u64;
        let stop_message = loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    info!("Driver cancelled");
                    break "Disconnected";
                }
                result = self.transport.recv() => match result {
                    Ok(Some(bytes)) => {
                        recv_errors = 0;
                        chunks += 1;
                        self.ingest(&bytes);
                    }
                    Ok(None) => {
                        info!("Link closed after {} chunks", chunks);
                        break "Link closed";
                    }
                    Err(e) => {
                        recv_errors += 1;
                        warn!("Receive error ({}/{}): {}", recv_errors, MAX_RECV_ERRORS, e);
                        if recv_errors >= MAX_RECV_ERRORS {
                            error!("Too many receive errors, dropping link");
                            break "Link lost";
                        }
                        let backoff = Duration::from_millis(50 * (1 << recv_errors.min(5)));
                        sleep(backoff).await;
                    }
                },
                _ = rate_tick.tick() => {
                    let rate = self.monitor.tick();
                    self.publish(|outputs| {
                        outputs.rate.send_replace(rate);
                    });
                    trace!("Rate window closed: {}", rate);
                    let output = self.controller.on_rate_tick(rate);
                    self.apply(output).await;
                }
                () = &mut initial_request, if !initial_sent => {
                    initial_sent = true;
                    debug!("Sending initial stream request");
                    self.send_all(&crate::rate::controller::standard_request()).await;
                }
                _ = ensure_tick.tick() => {
                    let output = self.controller.on_ensure_tick();
                    self.apply(output).await;
                }
                _ = heartbeat.tick() => {
                    self.send(&OutboundCommand::Heartbeat).await;
                }
                Some(command) = commands.recv() => match command {
                    DriverCommand::ResetStreaming => {
                        let output = self.controller.reset_streaming();
                        self.apply(output).await;
                    }
                },
            }
        };

        self.teardown(stop_message);
    }

    /// Feed one inbound chunk through framer, decoder and rate monitor.
    fn ingest(&mut self, bytes: &[u8]) {
        for frame in self.assembler.ingest(bytes) {
            match self.decoder.decode(&frame) {
                Ok(Some(sample)) => {
                    self.monitor.record_sample();
                    self.publish(|outputs| {
                        outputs.attitude.send_replace(Some(sample));
                    });
                }
                Ok(None) => {}
                Err(e) => debug!("Dropping frame: {}", e),
            }
        }
    }

    async fn apply(&mut self, output: ControllerOutput) {
        if let Some(mode) = output.mode_change {
            info!("Stream mode now {}", mode);
        }
        self.send_all(&output.commands).await;
        self.publish_state();
    }

    async fn send_all(&mut self, commands: &[OutboundCommand]) {
        for command in commands {
            self.send(command).await;
        }
    }

    async fn send(&mut self, command: &OutboundCommand) {
        let bytes = self.encoder.encode(command);
        if let Err(e) = self.transport.send(&bytes).await {
            warn!("Failed to send {}: {}", command.kind(), e);
        }
    }

    fn publish(&self, update: impl FnOnce(&DriverOutputs)) {
        if !self.outputs.publish_for(self.session, update) {
            trace!("Session {} ended, update dropped", self.session);
        }
    }

    fn publish_state(&self) {
        let state = self.controller.state();
        self.publish(|outputs| {
            outputs.state.send_replace(state);
        });
    }

    fn teardown(&mut self, message: &str) {
        self.controller.on_disconnected();
        self.assembler.clear();
        self.monitor.reset();
        // Skipped when the client ended the session, and possibly began another.
        self.publish(|outputs| outputs.publish_stopped(message));
        info!("Driver stopped ({})", message);
    }
}

fn ticker(first: Instant, period: Duration) -> tokio::time::Interval {
    let mut ticker = interval_at(first, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}
