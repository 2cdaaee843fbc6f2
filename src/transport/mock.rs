//! In-memory transport for deterministic tests.
//!
//! [`MockTransport::new`] returns the transport together with a [`MockLink`]
//! that plays the flight controller: it pushes inbound chunks, inspects what
//! the client sent and can close the link.
//!
//! ```
//! use mavrate::transport::{MockTransport, Transport};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> mavrate::Result<()> {
//! let (transport, link) = MockTransport::new();
//! link.push(vec![0xFE, 0x00]);
//! assert_eq!(transport.recv().await?, Some(vec![0xFE, 0x00]));
//!
//! transport.send(&[1, 2, 3]).await?;
//! assert_eq!(link.sent(), vec![vec![1, 2, 3]]);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

use super::Transport;
use crate::types::Frame;
use crate::{Result, TelemetryError};

#[derive(Debug, Default)]
struct Shared {
    sent: Mutex<Vec<Vec<u8>>>,
    fail_sends: AtomicBool,
}

impl Shared {
    fn sent(&self) -> MutexGuard<'_, Vec<Vec<u8>>> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Transport half handed to the client.
#[derive(Debug)]
pub struct MockTransport {
    inbound: tokio::sync::Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
    shared: Arc<Shared>,
}

/// Controller half kept by the test.
#[derive(Debug, Clone)]
pub struct MockLink {
    inbound: mpsc::UnboundedSender<Vec<u8>>,
    shared: Arc<Shared>,
}

impl MockTransport {
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (MockTransport, MockLink) {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared::default());
        (
            MockTransport { inbound: tokio::sync::Mutex::new(rx), shared: shared.clone() },
            MockLink { inbound: tx, shared },
        )
    }
}

impl MockLink {
    /// Deliver one inbound chunk. Ignored once the transport is gone.
    pub fn push(&self, bytes: impl Into<Vec<u8>>) {
        let _ = self.inbound.send(bytes.into());
    }

    /// Every datagram sent so far, in order.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.shared.sent().clone()
    }

    /// Sent datagrams parsed as frames; unparseable ones are skipped.
    pub fn sent_frames(&self) -> Vec<Frame> {
        self.shared.sent().iter().filter_map(|bytes| Frame::parse(bytes)).collect()
    }

    pub fn clear_sent(&self) {
        self.shared.sent().clear();
    }

    /// Make subsequent sends fail with a transport error.
    pub fn set_fail_sends(&self, fail: bool) {
        self.shared.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Close the link: the transport's `recv` returns `Ok(None)` once
    /// queued chunks are drained. Other clones keep the link open.
    pub fn close(self) {
        drop(self);
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, data: &[u8]) -> Result<()> {
        if self.shared.fail_sends.load(Ordering::SeqCst) {
            return Err(TelemetryError::transport(
                "mock send",
                std::io::Error::new(std::io::ErrorKind::BrokenPipe, "send disabled"),
            ));
        }
        self.shared.sent().push(data.to_vec());
        Ok(())
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.inbound.lock().await.recv().await)
    }

    fn describe(&self) -> String {
        "Connected to mock link".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn close_ends_receive() {
        let (transport, link) = MockTransport::new();
        link.push([1u8, 2]);
        link.close();
        assert_eq!(transport.recv().await.unwrap(), Some(vec![1, 2]));
        assert_eq!(transport.recv().await.unwrap(), None);
    }

    #[tokio::test]
    async fn failing_sends_are_not_recorded() {
        let (transport, link) = MockTransport::new();
        link.set_fail_sends(true);
        let err = transport.send(&[9]).await.unwrap_err();
        assert!(matches!(err, TelemetryError::Transport { .. }));
        assert!(link.sent().is_empty());

        link.set_fail_sends(false);
        transport.send(&[9]).await.unwrap();
        assert_eq!(link.sent().len(), 1);
        link.clear_sent();
        assert!(link.sent().is_empty());
    }
}
