use std::fmt;
use waypoint_dns_domain::RecordType;

const ADDR_LABEL: &str = "addr";
const ARPA_LABEL: &str = "arpa";

/// Which lookup path a question inside a served domain takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestType {
    /// Catalog lookups by name (A/AAAA/CNAME/SRV/TXT/ANY).
    Name,
    /// Reverse lookups under `arpa.`.
    Ip,
    /// Hex-encoded `<ip>.addr.` names.
    Address,
    /// SOA and NS questions, answered from the agent's own service.
    Consul,
}

impl RequestType {
    /// SOA and NS take precedence over the name's shape.
    pub fn parse(qname: &str, qtype: RecordType) -> Self {
        if qtype == RecordType::SOA || qtype == RecordType::NS {
            return Self::Consul;
        }
        let labels: Vec<&str> = qname.split('.').filter(|l| !l.is_empty()).collect();
        if labels.last() == Some(&ARPA_LABEL) {
            Self::Ip
        } else if labels.len() > 2 && labels[1] == ADDR_LABEL {
            Self::Address
        } else {
            Self::Name
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "NAME",
            Self::Ip => "IP",
            Self::Address => "ADDR",
            Self::Consul => "CONSUL",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
