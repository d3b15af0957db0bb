use rustc_hash::FxHashMap;
use std::net::SocketAddr;
use std::time::Duration;
use waypoint_dns_domain::config::parse_recursor_address;
use waypoint_dns_domain::{Config, DomainError, RecursorStrategy, SoaConfig};

/// Per-service TTLs. Exact names win over `prefix*` entries; among prefixes
/// the longest match wins.
#[derive(Debug, Clone, Default)]
pub struct ServiceTtlTable {
    strict: FxHashMap<String, u32>,
    /// Sorted longest prefix first.
    prefixes: Vec<(String, u32)>,
}

impl ServiceTtlTable {
    pub fn new<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a u64)>,
    {
        let mut strict = FxHashMap::default();
        let mut prefixes = Vec::new();
        for (key, secs) in entries {
            let ttl = clamp_secs(*secs);
            match key.strip_suffix('*') {
                Some(prefix) => prefixes.push((prefix.to_string(), ttl)),
                None => {
                    strict.insert(key.clone(), ttl);
                }
            }
        }
        prefixes.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self { strict, prefixes }
    }

    pub fn lookup(&self, service: &str) -> Option<u32> {
        if let Some(ttl) = self.strict.get(service) {
            return Some(*ttl);
        }
        self.prefixes
            .iter()
            .find(|(prefix, _)| service.starts_with(prefix.as_str()))
            .map(|(_, ttl)| *ttl)
    }

    pub fn is_empty(&self) -> bool {
        self.strict.is_empty() && self.prefixes.is_empty()
    }
}

/// Hot-reloadable part of the router configuration. A new snapshot is built
/// on every reload and swapped in whole.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub a_record_limit: usize,
    pub disable_compression: bool,
    pub enable_truncate: bool,
    pub node_meta_txt: bool,
    /// Seconds.
    pub node_ttl: u32,
    pub recursors: Vec<SocketAddr>,
    pub recursor_timeout: Duration,
    pub recursor_strategy: RecursorStrategy,
    pub soa: SoaConfig,
    pub service_ttl: ServiceTtlTable,
    pub udp_answer_limit: usize,
    pub translate_wan_addrs: bool,
    pub token: String,
}

impl RouterConfig {
    pub fn from_config(config: &Config) -> Result<Self, DomainError> {
        let dns = &config.dns;
        let recursors = dns
            .recursors
            .iter()
            .map(|raw| {
                parse_recursor_address(raw).map_err(|e| {
                    DomainError::Config(format!("error loading DNS config: {}", e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            a_record_limit: dns.a_record_limit,
            disable_compression: dns.disable_compression,
            enable_truncate: dns.enable_truncate,
            node_meta_txt: dns.node_meta_txt,
            node_ttl: clamp_secs(dns.node_ttl),
            recursors,
            recursor_timeout: Duration::from_millis(dns.recursor_timeout_ms),
            recursor_strategy: dns.recursor_strategy,
            soa: dns.soa.clone(),
            service_ttl: ServiceTtlTable::new(&dns.service_ttl),
            udp_answer_limit: dns.udp_answer_limit,
            translate_wan_addrs: dns.translate_wan_addrs,
            token: dns.token.clone(),
        })
    }

    pub fn can_recurse(&self) -> bool {
        !self.recursors.is_empty()
    }

    pub fn compress(&self) -> bool {
        !self.disable_compression
    }

    /// Order in which recursors are tried for one request.
    pub fn recursor_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.recursors.len()).collect();
        if self.recursor_strategy == RecursorStrategy::Random {
            fastrand::shuffle(&mut order);
        }
        order
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            a_record_limit: 0,
            disable_compression: false,
            enable_truncate: false,
            node_meta_txt: true,
            node_ttl: 0,
            recursors: Vec::new(),
            recursor_timeout: Duration::from_secs(2),
            recursor_strategy: RecursorStrategy::Sequential,
            soa: SoaConfig::default(),
            service_ttl: ServiceTtlTable::default(),
            udp_answer_limit: 3,
            translate_wan_addrs: false,
            token: String::new(),
        }
    }
}

fn clamp_secs(secs: u64) -> u32 {
    u32::try_from(secs).unwrap_or(u32::MAX)
}
