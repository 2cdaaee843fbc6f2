//! Bounded receive buffer

use crate::config::BufferConfig;

/// Unconsumed bytes from the transport.
///
/// Once the buffer holds more than `cap` bytes after a scan it is cut back to
/// its most recent `retain` bytes. An in-flight partial frame may be lost when
/// that happens.
#[derive(Debug, Clone)]
pub struct RawBuffer {
    bytes: Vec<u8>,
    cap: usize,
    retain: usize,
}

impl RawBuffer {
    /// Create an empty buffer with the given bounds.
    pub fn new(config: BufferConfig) -> Self {
        Self { bytes: Vec::with_capacity(config.cap), cap: config.cap, retain: config.retain }
    }

    /// Append bytes, then enforce the cap.
    ///
    /// Returns the number of bytes evicted from the front.
    pub fn extend(&mut self, data: &[u8]) -> usize {
        self.push(data);
        self.enforce_cap()
    }

    /// Append bytes without enforcing the cap.
    pub fn push(&mut self, data: &[u8]) {
        self.bytes.extend_from_slice(data);
    }

    /// Cut the buffer back to its last `retain` bytes if it exceeds `cap`.
    ///
    /// Returns the number of bytes evicted from the front.
    pub fn enforce_cap(&mut self) -> usize {
        if self.bytes.len() > self.cap {
            let evicted = self.bytes.len() - self.retain;
            self.bytes.drain(..evicted);
            evicted
        } else {
            0
        }
    }

    /// Drop `count` bytes from the front.
    pub fn consume(&mut self, count: usize) {
        let count = count.min(self.bytes.len());
        self.bytes.drain(..count);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }
}

impl Default for RawBuffer {
    fn default() -> Self {
        Self::new(BufferConfig::default())
    }
}
