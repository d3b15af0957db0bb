use std::net::IpAddr;

/// An address classified once at construction as empty, IP, or hostname.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsAddress {
    raw: String,
    ip: Option<IpAddr>,
    /// Dotted form of a hostname address; empty for IPs and empty addresses.
    fqdn: String,
}

impl DnsAddress {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let ip = raw.parse::<IpAddr>().ok().map(|ip| match ip {
            IpAddr::V6(v6) => v6
                .to_ipv4_mapped()
                .map(IpAddr::V4)
                .unwrap_or(IpAddr::V6(v6)),
            v4 => v4,
        });
        let fqdn = if ip.is_some() || raw.is_empty() {
            String::new()
        } else if raw.ends_with('.') {
            raw.clone()
        } else {
            format!("{}.", raw)
        };
        Self { raw, ip, fqdn }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn is_ip(&self) -> bool {
        self.ip.is_some()
    }

    pub fn is_ipv4(&self) -> bool {
        matches!(self.ip, Some(IpAddr::V4(_)))
    }

    pub fn ip(&self) -> Option<IpAddr> {
        self.ip
    }

    /// The address with a trailing dot.
    pub fn fqdn(&self) -> String {
        if self.fqdn.is_empty() {
            format!("{}.", self.raw)
        } else {
            self.fqdn.clone()
        }
    }

    fn is_hostname(&self) -> bool {
        !self.fqdn.is_empty()
    }

    pub fn is_internal_fqdn(&self, domain: &str) -> bool {
        self.is_hostname() && self.fqdn.ends_with(domain)
    }

    pub fn is_external_fqdn(&self, domain: &str) -> bool {
        self.is_hostname() && self.fqdn.matches('.').count() > 1 && !self.fqdn.ends_with(domain)
    }
}
