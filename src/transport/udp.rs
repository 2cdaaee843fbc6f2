//! UDP transport.
//!
//! Listens on every configured local port (the first must bind, the rest are
//! optional extras) and sends to one fixed remote address. Datagrams whose
//! sender does not match the configured source filter are dropped before
//! they reach the framer.

use async_trait::async_trait;
use futures::future::select_all;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tracing::{debug, error, info, trace, warn};

use super::{Transport, hex_preview};
use crate::config::LinkConfig;
use crate::{Result, TelemetryError};

/// Largest UDP payload, so no datagram is ever truncated.
const MAX_DATAGRAM: usize = 65_535;

/// UDP link to a flight controller.
#[derive(Debug)]
pub struct UdpTransport {
    sockets: Vec<UdpSocket>,
    remote: SocketAddr,
    source_filter: Option<String>,
}

impl UdpTransport {
    /// Bind the configured local ports and resolve the remote address.
    ///
    /// # Errors
    ///
    /// [`TelemetryError::Connection`] when the first port cannot be bound or
    /// the remote host does not resolve.
    pub async fn bind(link: &LinkConfig) -> Result<Self> {
        let (first, extra) = link
            .bind_ports
            .split_first()
            .ok_or_else(|| TelemetryError::connection_failed("no local UDP port configured"))?;

        let primary = UdpSocket::bind(("0.0.0.0", *first)).await.map_err(|e| {
            error!(port = first, error = %e, "Failed to bind UDP port");
            TelemetryError::connection_failed_with_source(
                format!("failed to bind UDP port {first}"),
                Box::new(e),
            )
        })?;

        let mut sockets = vec![primary];
        for port in extra {
            match UdpSocket::bind(("0.0.0.0", *port)).await {
                Ok(socket) => sockets.push(socket),
                Err(e) => warn!(port, error = %e, "Additional UDP port unavailable"),
            }
        }

        let remote_addr = link.remote_addr();
        let remote = tokio::net::lookup_host(&remote_addr)
            .await
            .map_err(|e| {
                TelemetryError::connection_failed_with_source(
                    format!("cannot resolve {remote_addr}"),
                    Box::new(e),
                )
            })?
            .next()
            .ok_or_else(|| {
                TelemetryError::connection_failed(format!("no address for {remote_addr}"))
            })?;

        let transport = Self { sockets, remote, source_filter: link.source_filter.clone() };
        info!("UDP link to {} on {:?}", transport.remote, transport.local_ports());
        Ok(transport)
    }

    /// Ports actually bound, primary first.
    pub fn local_ports(&self) -> Vec<u16> {
        self.sockets.iter().filter_map(|s| s.local_addr().ok()).map(|a| a.port()).collect()
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote
    }

    fn accepts(&self, source: &SocketAddr) -> bool {
        self.source_filter.as_deref().is_none_or(|filter| source.ip().to_string().contains(filter))
    }
}

async fn recv_datagram(socket: &UdpSocket) -> std::io::Result<(Vec<u8>, SocketAddr)> {
    let mut buf = vec![0u8; MAX_DATAGRAM];
    let (n, source) = socket.recv_from(&mut buf).await?;
    buf.truncate(n);
    Ok((buf, source))
}

#[async_trait]
impl Transport for UdpTransport {
    async fn send(&self, data: &[u8]) -> Result<()> {
        self.sockets[0]
            .send_to(data, self.remote)
            .await
            .map_err(|e| TelemetryError::transport(format!("send to {}", self.remote), e))?;
        trace!(remote = %self.remote, bytes = data.len(), "Datagram sent");
        Ok(())
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>> {
        loop {
            let reads = self.sockets.iter().map(|socket| Box::pin(recv_datagram(socket)));
            let (result, _, _) = select_all(reads).await;
            let (bytes, source) = result.map_err(|e| TelemetryError::transport("receive", e))?;

            if !self.accepts(&source) {
                debug!("Dropping {} bytes from filtered source {}", bytes.len(), source);
                continue;
            }

            trace!("{} bytes from {}: {}", bytes.len(), source, hex_preview(&bytes));
            return Ok(Some(bytes));
        }
    }

    fn describe(&self) -> String {
        let ports =
            self.local_ports().iter().map(u16::to_string).collect::<Vec<_>>().join(", ");
        format!("Connected to {} (listening on {})", self.remote, ports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn peer() -> UdpSocket {
        UdpSocket::bind("127.0.0.1:0").await.expect("bind peer")
    }

    fn link_to(peer: &UdpSocket, filter: Option<&str>) -> LinkConfig {
        LinkConfig {
            remote_host: "127.0.0.1".to_string(),
            remote_port: peer.local_addr().expect("peer addr").port(),
            bind_ports: vec![0],
            source_filter: filter.map(str::to_string),
            ..LinkConfig::default()
        }
    }

    #[tokio::test]
    async fn round_trip_with_peer() {
        let peer = peer().await;
        let transport = UdpTransport::bind(&link_to(&peer, Some("127.0.0"))).await.unwrap();
        let local = transport.local_ports()[0];

        transport.send(&[0xFE, 0x09]).await.unwrap();
        let mut buf = [0u8; 16];
        let (n, _) = peer.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], &[0xFE, 0x09]);

        peer.send_to(&[1, 2, 3], ("127.0.0.1", local)).await.unwrap();
        let received = tokio::time::timeout(Duration::from_secs(2), transport.recv())
            .await
            .expect("datagram within timeout")
            .unwrap();
        assert_eq!(received, Some(vec![1, 2, 3]));
        assert!(transport.describe().contains(&local.to_string()));
    }

    #[tokio::test]
    async fn large_datagram_arrives_whole() {
        let peer = peer().await;
        let transport = UdpTransport::bind(&link_to(&peer, None)).await.unwrap();
        let local = transport.local_ports()[0];

        let payload: Vec<u8> = (0..3000u32).map(|i| (i % 253) as u8).collect();
        peer.send_to(&payload, ("127.0.0.1", local)).await.unwrap();
        let received = tokio::time::timeout(Duration::from_secs(2), transport.recv())
            .await
            .expect("datagram within timeout")
            .unwrap()
            .expect("link open");
        assert_eq!(received.len(), 3000);
        assert_eq!(received, payload);
    }

    #[tokio::test]
    async fn filtered_sources_are_dropped() {
        let peer = peer().await;
        let transport = UdpTransport::bind(&link_to(&peer, Some("192.168.1"))).await.unwrap();
        let local = transport.local_ports()[0];

        peer.send_to(&[0xFD], ("127.0.0.1", local)).await.unwrap();
        let result = tokio::time::timeout(Duration::from_millis(200), transport.recv()).await;
        assert!(result.is_err(), "datagram from 127.0.0.1 should be filtered");
    }

    #[tokio::test]
    async fn occupied_port_is_connection_error() {
        let holder = std::net::UdpSocket::bind("0.0.0.0:0").unwrap();
        let port = holder.local_addr().unwrap().port();
        let link = LinkConfig { bind_ports: vec![port], ..LinkConfig::default() };

        let err = UdpTransport::bind(&link).await.unwrap_err();
        assert!(matches!(err, TelemetryError::Connection { .. }));
        assert!(err.to_string().contains(&port.to_string()));
    }

    #[tokio::test]
    async fn extra_port_is_best_effort() {
        let holder = std::net::UdpSocket::bind("0.0.0.0:0").unwrap();
        let busy = holder.local_addr().unwrap().port();
        let peer = peer().await;
        let link = LinkConfig { bind_ports: vec![0, busy], ..link_to(&peer, None) };

        let transport = UdpTransport::bind(&link).await.unwrap();
        assert_eq!(transport.local_ports().len(), 1);
    }

    #[tokio::test]
    async fn legacy_remote_port_is_remapped() {
        let link = LinkConfig {
            remote_host: "127.0.0.1".to_string(),
            remote_port: crate::config::LEGACY_SERIAL_PORT,
            bind_ports: vec![0],
            ..LinkConfig::default()
        };
        let transport = UdpTransport::bind(&link).await.unwrap();
        assert_eq!(transport.remote_addr().port(), crate::config::DEFAULT_UDP_PORT);
    }
}
