pub mod address_translate;
pub mod arpa;
pub mod canonical;
pub mod edns;
pub mod record_maker;
pub mod record_type_map;
pub mod recursor;
pub mod request_type;
pub mod router;
pub mod router_config;
pub mod serializer;
pub mod transport;
pub mod truncate;
pub mod txt;
pub mod wire;

use std::fmt;
use std::net::SocketAddr;

pub use record_type_map::RecordTypeMapper;
pub use recursor::{Recursor, UpstreamRecursor};
pub use request_type::RequestType;
pub use router::Router;
pub use router_config::{RouterConfig, ServiceTtlTable};

/// Listener a request arrived on; it decides the size governor and the
/// transport used when forwarding upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Udp,
    Tcp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Udp => "udp",
            Self::Tcp => "tcp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who asked, and over which transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientInfo {
    pub addr: Option<SocketAddr>,
    pub protocol: Protocol,
}

impl ClientInfo {
    pub fn new(addr: SocketAddr, protocol: Protocol) -> Self {
        Self {
            addr: Some(addr),
            protocol,
        }
    }

    /// Requests generated internally, such as CNAME chasing, have no peer.
    pub fn internal(protocol: Protocol) -> Self {
        Self {
            addr: None,
            protocol,
        }
    }
}
