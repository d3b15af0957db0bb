use super::snapshot::{CatalogSnapshot, Health, MeshServiceEntry, WorkloadEntry};
use arc_swap::ArcSwap;
use std::net::IpAddr;
use std::sync::Arc;
use waypoint_dns_domain::{
    DiscoveryResult, DnsConfig, DomainError, Location, LookupType, QueryPayload, ResultDnsConfig,
    ResultTenancy, ResultType,
};

const DEFAULT_TENANCY: &str = "default";

struct ResourceState {
    datacenter: String,
    only_passing: bool,
    snapshot: Arc<CatalogSnapshot>,
}

/// Workload-centric catalog. Single datacenter, no peering, no prepared
/// queries; services select workloads by name.
pub struct ResourceCatalog {
    state: ArcSwap<ResourceState>,
}

impl ResourceCatalog {
    pub fn new(dns: &DnsConfig, snapshot: CatalogSnapshot) -> Self {
        Self {
            state: ArcSwap::from_pointee(ResourceState {
                datacenter: dns.datacenter.clone(),
                only_passing: dns.only_passing,
                snapshot: Arc::new(snapshot),
            }),
        }
    }

    pub fn reload(&self, dns: &DnsConfig, snapshot: Option<CatalogSnapshot>) {
        let current = self.state.load();
        let snapshot = snapshot
            .map(Arc::new)
            .unwrap_or_else(|| Arc::clone(&current.snapshot));
        self.state.store(Arc::new(ResourceState {
            datacenter: dns.datacenter.clone(),
            only_passing: dns.only_passing,
            snapshot,
        }));
    }

    pub fn validate_request(&self, payload: &QueryPayload) -> Result<(), DomainError> {
        let tenancy = &payload.tenancy;
        if !tenancy.peer.is_empty() || !tenancy.sameness_group.is_empty() {
            return Err(DomainError::NotSupported);
        }
        if !tenancy.datacenter.is_empty() && tenancy.datacenter != self.state.load().datacenter {
            return Err(DomainError::NotSupported);
        }
        Ok(())
    }

    pub fn normalize_request(&self, payload: &mut QueryPayload) {
        if payload.tenancy.namespace.is_empty() {
            payload.tenancy.namespace = DEFAULT_TENANCY.to_string();
        }
        if payload.tenancy.partition.is_empty() {
            payload.tenancy.partition = DEFAULT_TENANCY.to_string();
        }
    }

    pub fn fetch_endpoints(
        &self,
        payload: &QueryPayload,
        lookup_type: LookupType,
    ) -> Result<Vec<DiscoveryResult>, DomainError> {
        if lookup_type != LookupType::Service {
            return Err(DomainError::NotSupported);
        }

        let state = self.state.load();
        let service = state.service(payload).ok_or(DomainError::NotFound)?;

        let mut endpoints: Vec<&WorkloadEntry> = state
            .snapshot
            .workloads
            .iter()
            .filter(|w| service.selects(&w.name) && same_tenancy(w, payload))
            .filter(|w| match w.health {
                Health::Critical => false,
                Health::Warning => !state.only_passing,
                Health::Passing => true,
            })
            .collect();
        fastrand::shuffle(&mut endpoints);

        let mut results: Vec<DiscoveryResult> = endpoints
            .into_iter()
            .filter_map(|w| workload_result(w, &payload.port_name))
            .collect();
        if payload.limit > 0 {
            results.truncate(payload.limit);
        }
        Ok(results)
    }

    pub fn fetch_virtual_ip(&self, payload: &QueryPayload) -> Result<DiscoveryResult, DomainError> {
        let state = self.state.load();
        let vip = state
            .service(payload)
            .and_then(|s| s.virtual_ips.first().cloned())
            .ok_or(DomainError::NotFound)?;

        Ok(DiscoveryResult {
            node: Some(Location {
                address: vip,
                ..Location::default()
            }),
            result_type: ResultType::Virtual,
            tenancy: ResultTenancy {
                namespace: payload.tenancy.namespace.clone(),
                partition: payload.tenancy.partition.clone(),
                ..ResultTenancy::default()
            },
            ..DiscoveryResult::default()
        })
    }

    pub fn fetch_workload(&self, payload: &QueryPayload) -> Result<DiscoveryResult, DomainError> {
        let state = self.state.load();
        state
            .snapshot
            .workloads
            .iter()
            .find(|w| w.name == payload.name && same_tenancy(w, payload))
            .and_then(|w| workload_result(w, &payload.port_name))
            .ok_or(DomainError::NotFound)
    }

    pub fn fetch_records_by_ip(&self, ip: IpAddr) -> Result<Vec<DiscoveryResult>, DomainError> {
        let target = ip.to_string();
        let results: Vec<DiscoveryResult> = self
            .state
            .load()
            .snapshot
            .workloads
            .iter()
            .filter(|w| w.address == target)
            .filter_map(|w| workload_result(w, ""))
            .collect();

        if results.is_empty() {
            return Err(DomainError::NotFound);
        }
        Ok(results)
    }
}

impl ResourceState {
    fn service(&self, payload: &QueryPayload) -> Option<&MeshServiceEntry> {
        self.snapshot.mesh_services.iter().find(|s| {
            s.name.eq_ignore_ascii_case(&payload.name)
                && or_default(&s.namespace) == payload.tenancy.namespace
                && or_default(&s.partition) == payload.tenancy.partition
        })
    }
}

fn or_default(value: &str) -> &str {
    if value.is_empty() {
        DEFAULT_TENANCY
    } else {
        value
    }
}

fn same_tenancy(workload: &WorkloadEntry, payload: &QueryPayload) -> bool {
    or_default(&workload.namespace) == payload.tenancy.namespace
        && or_default(&workload.partition) == payload.tenancy.partition
}

/// `None` when a port name was requested and the workload does not expose it.
fn workload_result(workload: &WorkloadEntry, port_name: &str) -> Option<DiscoveryResult> {
    let ports = workload.ports_named(port_name);
    if !port_name.is_empty() && ports.is_empty() {
        return None;
    }

    Some(DiscoveryResult {
        node: Some(Location::new(workload.name.clone(), workload.address.clone())),
        metadata: workload.meta.clone(),
        result_type: ResultType::Workload,
        dns: ResultDnsConfig {
            ttl_override: None,
            weight: workload.weight.unwrap_or(1),
        },
        ports,
        tenancy: ResultTenancy {
            namespace: or_default(&workload.namespace).to_string(),
            partition: or_default(&workload.partition).to_string(),
            ..ResultTenancy::default()
        },
        ..DiscoveryResult::default()
    })
}
