//! WAN/LAN and tagged-address rewriting applied before addresses are classified.

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::ops::BitOr;
use waypoint_dns_domain::{RecordType, TaggedAddress};

pub const TAGGED_LAN_IPV4: &str = "lan_ipv4";
pub const TAGGED_LAN_IPV6: &str = "lan_ipv6";
pub const TAGGED_WAN: &str = "wan";
pub const TAGGED_WAN_IPV4: &str = "wan_ipv4";
pub const TAGGED_WAN_IPV6: &str = "wan_ipv6";

/// Kinds of address a caller is willing to receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accept(u8);

impl Accept {
    pub const DOMAIN: Accept = Accept(1);
    pub const IPV4: Accept = Accept(1 << 1);
    pub const IPV6: Accept = Accept(1 << 2);
    pub const ANY: Accept = Accept(Self::DOMAIN.0 | Self::IPV4.0 | Self::IPV6.0);

    pub fn contains(self, other: Accept) -> bool {
        self.0 & other.0 == other.0
    }

    /// Domains are always acceptable; the IP family follows the question.
    pub fn for_question(qtype: RecordType) -> Accept {
        match qtype {
            RecordType::A => Accept::DOMAIN | Accept::IPV4,
            RecordType::AAAA => Accept::DOMAIN | Accept::IPV6,
            _ => Accept::DOMAIN | Accept::ANY,
        }
    }
}

impl BitOr for Accept {
    type Output = Accept;

    fn bitor(self, rhs: Accept) -> Accept {
        Accept(self.0 | rhs.0)
    }
}

/// Rewrites addresses for clients in other datacenters and picks the
/// tagged address matching the accepted family.
#[derive(Debug, Clone)]
pub struct AddressTranslator {
    local_datacenter: String,
    translate_wan: bool,
}

impl AddressTranslator {
    pub fn new(local_datacenter: impl Into<String>, translate_wan: bool) -> Self {
        Self {
            local_datacenter: local_datacenter.into(),
            translate_wan,
        }
    }

    /// Returns the address to publish, or an empty string when nothing
    /// acceptable exists.
    pub fn translate(
        &self,
        datacenter: &str,
        address: &str,
        tagged: &BTreeMap<String, TaggedAddress>,
        accept: Accept,
    ) -> String {
        let tag = |key: &str| {
            tagged
                .get(key)
                .map(|t| t.address.as_str())
                .unwrap_or("")
        };

        let mut default = address;
        let (v4, v6) = if self.translate_wan && datacenter != self.local_datacenter {
            if let Some(wan) = tagged.get(TAGGED_WAN) {
                default = wan.address.as_str();
            }
            (tag(TAGGED_WAN_IPV4), tag(TAGGED_WAN_IPV6))
        } else {
            (tag(TAGGED_LAN_IPV4), tag(TAGGED_LAN_IPV6))
        };

        if accept.contains(Accept::IPV6) && !v6.is_empty() {
            return v6.to_string();
        }
        if accept.contains(Accept::IPV4) && !v4.is_empty() {
            return v4.to_string();
        }
        if accept.contains(Accept::ANY) && !default.is_empty() {
            return default.to_string();
        }

        let acceptable = match default.parse::<IpAddr>() {
            Ok(IpAddr::V4(_)) => accept.contains(Accept::IPV4),
            Ok(IpAddr::V6(v6)) if v6.to_ipv4_mapped().is_some() => accept.contains(Accept::IPV4),
            Ok(IpAddr::V6(_)) => accept.contains(Accept::IPV6),
            Err(_) => accept.contains(Accept::DOMAIN),
        };
        if acceptable {
            default.to_string()
        } else {
            String::new()
        }
    }
}
