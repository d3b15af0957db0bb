use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResultType {
    #[default]
    Service,
    Node,
    Virtual,
    Workload,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Port {
    pub name: String,
    pub number: u32,
}

impl Port {
    pub fn new(name: impl Into<String>, number: u32) -> Self {
        Self {
            name: name.into(),
            number,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaggedAddress {
    pub address: String,
    pub port: Port,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub name: String,
    /// IP literal, internal FQDN or external hostname.
    pub address: String,
    pub tagged_addresses: BTreeMap<String, TaggedAddress>,
}

impl Location {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            tagged_addresses: BTreeMap::new(),
        }
    }

    pub fn tagged_address_strings(&self) -> BTreeMap<String, String> {
        self.tagged_addresses
            .iter()
            .map(|(k, v)| (k.clone(), v.address.clone()))
            .collect()
    }
}

/// Tenancy a result lives in, used to rebuild canonical names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultTenancy {
    pub namespace: String,
    pub partition: String,
    pub peer_name: String,
    pub datacenter: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultDnsConfig {
    pub ttl_override: Option<u32>,
    pub weight: u32,
}

/// One catalog answer, independent of the backend that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryResult {
    pub service: Option<Location>,
    pub node: Option<Location>,
    pub metadata: BTreeMap<String, String>,
    pub result_type: ResultType,
    pub dns: ResultDnsConfig,
    pub ports: Vec<Port>,
    pub tenancy: ResultTenancy,
}

impl DiscoveryResult {
    pub fn node_name(&self) -> &str {
        self.node.as_ref().map(|n| n.name.as_str()).unwrap_or("")
    }

    pub fn node_address(&self) -> &str {
        self.node.as_ref().map(|n| n.address.as_str()).unwrap_or("")
    }

    pub fn service_name(&self) -> &str {
        self.service.as_ref().map(|s| s.name.as_str()).unwrap_or("")
    }

    pub fn service_address(&self) -> &str {
        self.service
            .as_ref()
            .map(|s| s.address.as_str())
            .unwrap_or("")
    }

    /// Ports to emit records for; a result without ports still yields one record.
    pub fn ports_or_default(&self) -> Vec<Port> {
        if self.ports.is_empty() {
            vec![Port::default()]
        } else {
            self.ports.clone()
        }
    }
}

/// Results of a by-name lookup together with their ECS scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResults {
    pub results: Vec<DiscoveryResult>,
    pub ecs_global: bool,
}

impl QueryResults {
    pub fn global(results: Vec<DiscoveryResult>) -> Self {
        Self {
            results,
            ecs_global: true,
        }
    }

    pub fn scoped(results: Vec<DiscoveryResult>) -> Self {
        Self {
            results,
            ecs_global: false,
        }
    }
}
