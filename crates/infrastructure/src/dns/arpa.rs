//! Reverse-lookup and `addr.` pseudo-domain address encodings.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use waypoint_dns_domain::{DiscoveryResult, DomainError};

const IPV4_SUFFIX: &str = ".in-addr.arpa";
const IPV6_SUFFIX: &str = ".ip6.arpa";

/// Decodes an `in-addr.arpa` or `ip6.arpa` name into the address it names.
pub fn ip_from_arpa(name: &str) -> Option<IpAddr> {
    let name = name.trim_end_matches('.').to_ascii_lowercase();

    if let Some(reversed) = name.strip_suffix(IPV4_SUFFIX) {
        let mut octets = [0u8; 4];
        let labels: Vec<&str> = reversed.split('.').collect();
        if labels.len() != 4 {
            return None;
        }
        for (slot, label) in octets.iter_mut().zip(labels.iter().rev()) {
            *slot = label.parse().ok()?;
        }
        return Some(IpAddr::V4(Ipv4Addr::from(octets)));
    }

    if let Some(reversed) = name.strip_suffix(IPV6_SUFFIX) {
        let nibbles: Vec<&str> = reversed.split('.').collect();
        if nibbles.len() != 32 {
            return None;
        }
        let mut value: u128 = 0;
        for nibble in nibbles.iter().rev() {
            if nibble.len() != 1 {
                return None;
            }
            value = (value << 4) | u128::from(u8::from_str_radix(nibble, 16).ok()?);
        }
        return Some(IpAddr::V6(Ipv6Addr::from(value)));
    }

    None
}

/// Decodes the hex label of an `<hex>.addr.<dc>.<domain>` name.
pub fn ip_from_hex_label(label: &str) -> Result<IpAddr, DomainError> {
    let bytes = hex::decode(label).map_err(|_| DomainError::NameNotFound)?;
    match bytes.len() {
        4 => {
            let mut octets = [0u8; 4];
            octets.copy_from_slice(&bytes);
            Ok(IpAddr::V4(Ipv4Addr::from(octets)))
        }
        16 => {
            let mut octets = [0u8; 16];
            octets.copy_from_slice(&bytes);
            Ok(IpAddr::V6(Ipv6Addr::from(octets)))
        }
        _ => Err(DomainError::NameNotFound),
    }
}

/// Hex `addr.` name for `ip`. Peered results omit the datacenter label.
pub fn encode_ip_as_fqdn(result: &DiscoveryResult, ip: IpAddr, domain: &str) -> String {
    let encoded = match ip {
        IpAddr::V4(v4) => hex::encode(v4.octets()),
        IpAddr::V6(v6) => hex::encode(v6.octets()),
    };
    if result.tenancy.peer_name.is_empty() {
        format!("{}.addr.{}.{}", encoded, result.tenancy.datacenter, domain)
    } else {
        format!("{}.addr.{}", encoded, domain)
    }
}
