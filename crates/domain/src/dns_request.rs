use super::RecordType;
use std::net::IpAddr;
use std::sync::Arc;

/// The question a discovery query is built from.
#[derive(Debug, Clone)]
pub struct DnsRequest {
    /// Canonical (lower-case, fully qualified) question name.
    pub name: Arc<str>,
    pub record_type: RecordType,
    pub client_ip: Option<IpAddr>,
    /// Address carried by an EDNS client-subnet option, if any.
    pub ecs_address: Option<IpAddr>,
}

impl DnsRequest {
    pub fn new(name: impl Into<Arc<str>>, record_type: RecordType) -> Self {
        Self {
            name: name.into(),
            record_type,
            client_ip: None,
            ecs_address: None,
        }
    }

    pub fn with_client_ip(mut self, ip: IpAddr) -> Self {
        self.client_ip = Some(ip);
        self
    }

    pub fn with_ecs_address(mut self, ip: IpAddr) -> Self {
        self.ecs_address = Some(ip);
        self
    }
}
