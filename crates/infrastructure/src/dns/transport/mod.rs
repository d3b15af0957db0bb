pub mod tcp;
pub mod udp;

use super::Protocol;
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use waypoint_dns_domain::DomainError;

#[derive(Debug)]
pub struct TransportResponse {
    pub bytes: Vec<u8>,

    pub protocol_used: Protocol,
}

#[async_trait]
pub trait DnsTransport: Send + Sync {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError>;

    fn protocol(&self) -> Protocol;
}

pub enum Transport {
    Udp(udp::UdpTransport),
    Tcp(tcp::TcpTransport),
}

impl Transport {
    /// Upstream transport matching the listener the question arrived on.
    pub fn for_protocol(protocol: Protocol, server_addr: SocketAddr) -> Self {
        match protocol {
            Protocol::Udp => Self::Udp(udp::UdpTransport::new(server_addr)),
            Protocol::Tcp => Self::Tcp(tcp::TcpTransport::new(server_addr)),
        }
    }

    pub async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError> {
        match self {
            Self::Udp(t) => DnsTransport::send(t, message_bytes, timeout).await,
            Self::Tcp(t) => DnsTransport::send(t, message_bytes, timeout).await,
        }
    }

    pub fn protocol(&self) -> Protocol {
        match self {
            Self::Udp(t) => t.protocol(),
            Self::Tcp(t) => t.protocol(),
        }
    }
}
