use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};

use super::errors::ConfigError;

/// Order in which configured recursors are tried.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecursorStrategy {
    #[default]
    Sequential,

    Random,
}

impl RecursorStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Random => "random",
        }
    }
}

/// Parses a recursor address, defaulting the port to 53.
///
/// Accepts `1.2.3.4`, `1.2.3.4:5353`, `::1` and `[::1]:5353`. Hostnames are
/// rejected.
pub fn parse_recursor_address(raw: &str) -> Result<SocketAddr, ConfigError> {
    let raw = raw.trim();
    if let Ok(addr) = raw.parse::<SocketAddr>() {
        return Ok(addr);
    }
    let host = raw.trim_start_matches('[').trim_end_matches(']');
    host.parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, 53))
        .map_err(|_| ConfigError::Validation(format!("invalid recursor address: {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recursor_address_defaults_port() {
        assert_eq!(
            parse_recursor_address("8.8.8.8").unwrap(),
            "8.8.8.8:53".parse().unwrap()
        );
        assert_eq!(
            parse_recursor_address("::1").unwrap(),
            "[::1]:53".parse().unwrap()
        );
        assert_eq!(
            parse_recursor_address("[2001:db8::1]:5353").unwrap(),
            "[2001:db8::1]:5353".parse().unwrap()
        );
    }

    #[test]
    fn recursor_address_rejects_hostnames() {
        assert!(parse_recursor_address("dns.example.com").is_err());
    }
}
