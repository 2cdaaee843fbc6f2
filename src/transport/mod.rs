//! Transport abstraction for the flight-controller link.
//!
//! The driver talks to a [`Transport`] rather than a socket so that the whole
//! receive/decode/negotiate loop can run against [`MockTransport`] in tests.
//! Addressing, binding and source filtering belong to the implementation.

use async_trait::async_trait;

use crate::Result;

pub mod mock;
pub mod udp;

pub use mock::{MockLink, MockTransport};
pub use udp::UdpTransport;

/// Asynchronous datagram link to a flight controller.
///
/// Both methods take `&self` so a receive can be pending while a send is
/// issued from the same task.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Best-effort send of one datagram to the fixed peer.
    async fn send(&self, data: &[u8]) -> Result<()>;

    /// Wait for the next inbound chunk.
    ///
    /// Returns:
    /// - `Ok(Some(bytes))` - a chunk arrived (any size, any framing)
    /// - `Ok(None)` - the link is gone and will not deliver again
    /// - `Err(e)` - a receive failed; the link may still recover
    ///
    /// Must be cancel-safe: the driver drops a pending `recv` whenever a timer fires.
    async fn recv(&self) -> Result<Option<Vec<u8>>>;

    /// Status line shown while connected.
    fn describe(&self) -> String;
}

/// Hex preview of the first bytes of a chunk, for trace logs.
pub(crate) fn hex_preview(bytes: &[u8]) -> String {
    const PREVIEW_LEN: usize = 16;
    let mut out = bytes
        .iter()
        .take(PREVIEW_LEN)
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ");
    if bytes.len() > PREVIEW_LEN {
        out.push_str(" ...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_is_capped() {
        assert_eq!(hex_preview(&[0xFD, 0x1C, 0x00]), "FD 1C 00");
        let long = hex_preview(&[0xAB; 40]);
        assert_eq!(long.matches("AB").count(), 16);
        assert!(long.ends_with(" ..."));
        assert_eq!(hex_preview(&[]), "");
    }
}
