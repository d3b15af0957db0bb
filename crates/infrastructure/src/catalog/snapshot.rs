//! On-disk catalog contents.
//!
//! One TOML file feeds both backends: the legacy catalog reads `nodes`,
//! `services` and `prepared_queries`; the resource catalog reads `workloads`
//! and `mesh_services`.
//!
//! ```toml
//! datacenters = ["dc2"]
//!
//! [[nodes]]
//! name = "foo"
//! address = "10.0.0.1"
//!
//! [[services]]
//! node = "foo"
//! name = "web"
//! port = 8080
//! tags = ["primary"]
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use waypoint_dns_domain::{DomainError, Port, TaggedAddress};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogSnapshot {
    /// Remote datacenters reachable from this agent.
    pub datacenters: Vec<String>,
    pub nodes: Vec<NodeEntry>,
    pub services: Vec<ServiceEntry>,
    pub prepared_queries: Vec<PreparedQueryEntry>,
    pub workloads: Vec<WorkloadEntry>,
    pub mesh_services: Vec<MeshServiceEntry>,
}

impl CatalogSnapshot {
    pub fn from_toml(contents: &str) -> Result<Self, DomainError> {
        toml::from_str(contents)
            .map_err(|e| DomainError::Backend(format!("Failed to parse catalog: {}", e)))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            DomainError::Backend(format!(
                "Failed to read catalog file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&contents)
    }

    /// Empty catalog when no file is configured.
    pub fn load(path: Option<&str>) -> Result<Self, DomainError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Health {
    #[default]
    Passing,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Weights {
    pub passing: u32,
    pub warning: u32,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            passing: 1,
            warning: 1,
        }
    }
}

impl Weights {
    pub fn for_health(&self, health: Health) -> u32 {
        match health {
            Health::Warning => self.warning,
            _ => self.passing,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TaggedAddressEntry {
    pub address: String,
    pub port: u32,
}

pub fn tagged_addresses(
    entries: &BTreeMap<String, TaggedAddressEntry>,
) -> BTreeMap<String, TaggedAddress> {
    entries
        .iter()
        .map(|(key, entry)| {
            (
                key.clone(),
                TaggedAddress {
                    address: entry.address.clone(),
                    port: Port::new("", entry.port),
                },
            )
        })
        .collect()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodeEntry {
    pub name: String,
    pub address: String,
    /// Empty means the agent's own datacenter.
    pub datacenter: String,
    pub partition: String,
    /// Set for nodes imported from a cluster peer.
    pub peer: String,
    pub tagged_addresses: BTreeMap<String, TaggedAddressEntry>,
    pub meta: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceKind {
    #[default]
    Typical,
    ConnectProxy,
    IngressGateway,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceEntry {
    /// Name of the node the instance runs on.
    pub node: String,
    pub name: String,
    pub address: String,
    pub port: u32,
    pub tags: Vec<String>,
    pub kind: ServiceKind,
    /// Service a connect proxy fronts.
    pub proxy_destination: String,
    /// Services an ingress gateway exposes.
    pub ingress_services: Vec<String>,
    pub connect_native: bool,
    pub health: Health,
    pub weights: Weights,
    pub namespace: String,
    pub virtual_ip: String,
    pub tagged_addresses: BTreeMap<String, TaggedAddressEntry>,
}

impl ServiceEntry {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PreparedQueryEntry {
    pub name: String,
    pub service: String,
    pub tag: String,
    pub only_passing: bool,
    /// Seconds; overrides the configured service TTL.
    pub ttl: Option<u32>,
    /// Sort by distance to the requesting client (`Near = "_ip"`).
    pub near_ip: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WorkloadPort {
    pub name: String,
    pub number: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WorkloadEntry {
    pub name: String,
    pub address: String,
    pub namespace: String,
    pub partition: String,
    pub ports: Vec<WorkloadPort>,
    pub weight: Option<u32>,
    pub health: Health,
    pub identity: String,
    pub meta: BTreeMap<String, String>,
}

impl WorkloadEntry {
    /// Ports, restricted to `port_name` when one is given.
    pub fn ports_named(&self, port_name: &str) -> Vec<Port> {
        self.ports
            .iter()
            .filter(|p| port_name.is_empty() || p.name == port_name)
            .map(|p| Port::new(p.name.clone(), p.number))
            .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MeshServiceEntry {
    pub name: String,
    pub namespace: String,
    pub partition: String,
    /// Workloads whose names start with one of these prefixes are endpoints.
    pub workload_prefixes: Vec<String>,
    pub workload_names: Vec<String>,
    pub virtual_ips: Vec<String>,
}

impl MeshServiceEntry {
    pub fn selects(&self, workload: &str) -> bool {
        self.workload_names.iter().any(|n| n == workload)
            || self
                .workload_prefixes
                .iter()
                .any(|p| workload.starts_with(p.as_str()))
    }
}
