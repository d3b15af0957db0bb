use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::upstream::RecursorStrategy;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SoaConfig {
    #[serde(default = "default_soa_refresh")]
    pub refresh: u32,

    #[serde(default = "default_soa_retry")]
    pub retry: u32,

    #[serde(default = "default_soa_expire")]
    pub expire: u32,

    #[serde(default)]
    pub min_ttl: u32,
}

impl Default for SoaConfig {
    fn default() -> Self {
        Self {
            refresh: default_soa_refresh(),
            retry: default_soa_retry(),
            expire: default_soa_expire(),
            min_ttl: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DnsConfig {
    #[serde(default = "default_domain")]
    pub domain: String,

    #[serde(default)]
    pub alt_domain: String,

    #[serde(default = "default_datacenter")]
    pub datacenter: String,

    #[serde(default = "default_node_name")]
    pub node_name: String,

    /// Token forwarded to the catalog with every lookup.
    #[serde(default)]
    pub token: String,

    /// Seconds.
    #[serde(default)]
    pub node_ttl: u64,

    /// Seconds per service name; keys ending in `*` match by prefix.
    #[serde(default)]
    pub service_ttl: BTreeMap<String, u64>,

    #[serde(default)]
    pub a_record_limit: usize,

    #[serde(default = "default_udp_answer_limit")]
    pub udp_answer_limit: usize,

    #[serde(default)]
    pub enable_truncate: bool,

    #[serde(default)]
    pub only_passing: bool,

    #[serde(default = "default_true")]
    pub node_meta_txt: bool,

    #[serde(default)]
    pub disable_compression: bool,

    #[serde(default)]
    pub recursors: Vec<String>,

    #[serde(default = "default_recursor_timeout_ms")]
    pub recursor_timeout_ms: u64,

    #[serde(default)]
    pub recursor_strategy: RecursorStrategy,

    #[serde(default)]
    pub translate_wan_addrs: bool,

    #[serde(default)]
    pub soa: SoaConfig,
}

impl DnsConfig {
    /// Serving domain, lower-cased and fully qualified.
    pub fn canonical_domain(&self) -> String {
        canonical_name(&self.domain)
    }

    /// Alternative serving domain, or an empty string when unset.
    pub fn canonical_alt_domain(&self) -> String {
        if self.alt_domain.trim().is_empty() {
            String::new()
        } else {
            canonical_name(&self.alt_domain)
        }
    }
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            domain: default_domain(),
            alt_domain: String::new(),
            datacenter: default_datacenter(),
            node_name: default_node_name(),
            token: String::new(),
            node_ttl: 0,
            service_ttl: BTreeMap::new(),
            a_record_limit: 0,
            udp_answer_limit: default_udp_answer_limit(),
            enable_truncate: false,
            only_passing: false,
            node_meta_txt: default_true(),
            disable_compression: false,
            recursors: Vec::new(),
            recursor_timeout_ms: default_recursor_timeout_ms(),
            recursor_strategy: RecursorStrategy::default(),
            translate_wan_addrs: false,
            soa: SoaConfig::default(),
        }
    }
}

/// Lower-cases a name and appends the trailing dot.
pub fn canonical_name(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    if lower.ends_with('.') {
        lower
    } else {
        format!("{}.", lower)
    }
}

fn default_domain() -> String {
    "consul".to_string()
}

fn default_datacenter() -> String {
    "dc1".to_string()
}

fn default_node_name() -> String {
    "waypoint".to_string()
}

fn default_udp_answer_limit() -> usize {
    3
}

fn default_recursor_timeout_ms() -> u64 {
    2000
}

fn default_soa_refresh() -> u32 {
    3600
}

fn default_soa_retry() -> u32 {
    600
}

fn default_soa_expire() -> u32 {
    86400
}

fn default_true() -> bool {
    true
}
