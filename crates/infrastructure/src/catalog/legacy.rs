use super::snapshot::{
    tagged_addresses, CatalogSnapshot, Health, NodeEntry, ServiceEntry, ServiceKind,
};
use arc_swap::ArcSwap;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::debug;
use waypoint_dns_domain::{
    DiscoveryContext, DiscoveryResult, DnsConfig, DomainError, Location, LookupType, Port,
    QueryPayload, QueryResults, ResultDnsConfig, ResultTenancy, ResultType,
};

struct LegacyState {
    datacenter: String,
    only_passing: bool,
    snapshot: Arc<CatalogSnapshot>,
}

/// Node/service catalog: instances live on nodes, nodes live in datacenters.
pub struct LegacyCatalog {
    state: ArcSwap<LegacyState>,
}

impl LegacyCatalog {
    pub fn new(dns: &DnsConfig, snapshot: CatalogSnapshot) -> Self {
        Self {
            state: ArcSwap::from_pointee(LegacyState {
                datacenter: dns.datacenter.clone(),
                only_passing: dns.only_passing,
                snapshot: Arc::new(snapshot),
            }),
        }
    }

    /// Applies new agent settings; the catalog contents are replaced only
    /// when a fresh snapshot is given.
    pub fn reload(&self, dns: &DnsConfig, snapshot: Option<CatalogSnapshot>) {
        let current = self.state.load();
        let snapshot = snapshot
            .map(Arc::new)
            .unwrap_or_else(|| Arc::clone(&current.snapshot));
        self.state.store(Arc::new(LegacyState {
            datacenter: dns.datacenter.clone(),
            only_passing: dns.only_passing,
            snapshot,
        }));
    }

    pub fn validate_request(&self, payload: &QueryPayload) -> Result<(), DomainError> {
        let tenancy = &payload.tenancy;
        if !tenancy.sameness_group.is_empty() {
            return Err(DomainError::NotSupported);
        }
        if tenancy.datacenter.is_empty() {
            return Ok(());
        }

        let state = self.state.load();
        let known = tenancy.datacenter == state.datacenter
            || state.snapshot.datacenters.contains(&tenancy.datacenter)
            || state
                .snapshot
                .nodes
                .iter()
                .any(|n| n.datacenter == tenancy.datacenter);
        if known {
            Ok(())
        } else {
            Err(DomainError::NoPathToDatacenter)
        }
    }

    pub fn normalize_request(&self, payload: &mut QueryPayload) {
        if payload.tenancy.datacenter.is_empty() && payload.tenancy.peer.is_empty() {
            payload.tenancy.datacenter = self.state.load().datacenter.clone();
        }
    }

    pub fn fetch_nodes(&self, payload: &QueryPayload) -> Result<Vec<DiscoveryResult>, DomainError> {
        let state = self.state.load();
        let node = state
            .snapshot
            .nodes
            .iter()
            .find(|n| {
                n.name.eq_ignore_ascii_case(&payload.name) && state.in_scope(n, payload)
            })
            .ok_or(DomainError::NotFound)?;

        Ok(vec![DiscoveryResult {
            node: Some(node_location(node)),
            metadata: node.meta.clone(),
            result_type: ResultType::Node,
            tenancy: ResultTenancy {
                partition: node.partition.clone(),
                peer_name: payload.tenancy.peer.clone(),
                datacenter: payload.tenancy.datacenter.clone(),
                ..ResultTenancy::default()
            },
            ..DiscoveryResult::default()
        }])
    }

    pub fn fetch_endpoints(
        &self,
        payload: &QueryPayload,
        lookup_type: LookupType,
    ) -> Result<Vec<DiscoveryResult>, DomainError> {
        let state = self.state.load();
        let only_passing = state.only_passing;
        let instances = state.instances(payload, lookup_type, &payload.tag);
        Ok(state.build_results(instances, payload, only_passing))
    }

    pub fn fetch_virtual_ip(&self, payload: &QueryPayload) -> Result<DiscoveryResult, DomainError> {
        let state = self.state.load();
        let vip = state
            .snapshot
            .services
            .iter()
            .filter(|s| s.name.eq_ignore_ascii_case(&payload.name) && !s.virtual_ip.is_empty())
            .find(|s| {
                state
                    .node_for(s)
                    .map(|n| n.peer == payload.tenancy.peer)
                    .unwrap_or(payload.tenancy.peer.is_empty())
            })
            .map(|s| s.virtual_ip.clone())
            .ok_or(DomainError::NotFound)?;

        Ok(DiscoveryResult {
            node: Some(Location {
                address: vip,
                ..Location::default()
            }),
            result_type: ResultType::Virtual,
            tenancy: ResultTenancy {
                peer_name: payload.tenancy.peer.clone(),
                ..ResultTenancy::default()
            },
            ..DiscoveryResult::default()
        })
    }

    /// Nodes are matched first; service addresses only when no node has the IP.
    pub fn fetch_records_by_ip(&self, ip: IpAddr) -> Result<Vec<DiscoveryResult>, DomainError> {
        let state = self.state.load();
        let target = ip.to_string();

        if let Some(node) = state.snapshot.nodes.iter().find(|n| n.address == target) {
            return Ok(vec![DiscoveryResult {
                node: Some(node_location(node)),
                result_type: ResultType::Node,
                tenancy: state.node_tenancy(node),
                ..DiscoveryResult::default()
            }]);
        }

        let service = state
            .snapshot
            .services
            .iter()
            .find(|s| s.address == target)
            .ok_or(DomainError::NotFound)?;
        let node = state.node_for(service);
        let tenancy = match node {
            Some(node) => state.node_tenancy(node),
            None => ResultTenancy {
                datacenter: state.datacenter.clone(),
                ..ResultTenancy::default()
            },
        };

        Ok(vec![DiscoveryResult {
            service: Some(Location::new(service.name.clone(), service.address.clone())),
            node: Some(Location::new(
                service.node.clone(),
                node.map(|n| n.address.clone()).unwrap_or_default(),
            )),
            result_type: ResultType::Service,
            tenancy: ResultTenancy {
                namespace: service.namespace.clone(),
                ..tenancy
            },
            ..DiscoveryResult::default()
        }])
    }

    pub fn fetch_prepared_query(&self, payload: &QueryPayload) -> Result<QueryResults, DomainError> {
        let state = self.state.load();
        let query = state
            .snapshot
            .prepared_queries
            .iter()
            .find(|q| q.name.eq_ignore_ascii_case(&payload.name))
            .ok_or(DomainError::NotFound)?;

        let mut service_payload = payload.clone();
        service_payload.name = query.service.clone();

        let instances = state.instances(&service_payload, LookupType::Service, &query.tag);
        let mut results =
            state.build_results(instances, &service_payload, query.only_passing);
        for result in &mut results {
            result.dns.ttl_override = query.ttl;
        }

        debug!(
            query = %query.name,
            service = %query.service,
            results = results.len(),
            "executed prepared query"
        );

        if query.near_ip && payload.source_ip.is_some() {
            Ok(QueryResults::scoped(results))
        } else {
            Ok(QueryResults::global(results))
        }
    }
}

impl LegacyState {
    fn node_for(&self, service: &ServiceEntry) -> Option<&NodeEntry> {
        self.snapshot.nodes.iter().find(|n| n.name == service.node)
    }

    fn node_datacenter<'a>(&'a self, node: &'a NodeEntry) -> &'a str {
        if node.datacenter.is_empty() {
            &self.datacenter
        } else {
            &node.datacenter
        }
    }

    /// Where a node lives, as seen from this agent.
    fn node_tenancy(&self, node: &NodeEntry) -> ResultTenancy {
        ResultTenancy {
            partition: node.partition.clone(),
            peer_name: node.peer.clone(),
            datacenter: self.node_datacenter(node).to_string(),
            ..ResultTenancy::default()
        }
    }

    /// Peer lookups match the node's peer; everything else matches the datacenter.
    fn in_scope(&self, node: &NodeEntry, payload: &QueryPayload) -> bool {
        if !payload.tenancy.peer.is_empty() || !node.peer.is_empty() {
            return node.peer == payload.tenancy.peer;
        }
        self.node_datacenter(node) == payload.tenancy.datacenter
    }

    fn instances<'a>(
        &'a self,
        payload: &QueryPayload,
        lookup_type: LookupType,
        tag: &str,
    ) -> Vec<(&'a ServiceEntry, &'a NodeEntry)> {
        let name = payload.name.as_str();
        self.snapshot
            .services
            .iter()
            .filter(|s| match lookup_type {
                LookupType::Service => {
                    s.kind == ServiceKind::Typical && s.name.eq_ignore_ascii_case(name)
                }
                LookupType::Connect => {
                    (s.kind == ServiceKind::ConnectProxy
                        && s.proxy_destination.eq_ignore_ascii_case(name))
                        || (s.connect_native && s.name.eq_ignore_ascii_case(name))
                }
                LookupType::Ingress => {
                    s.kind == ServiceKind::IngressGateway
                        && s.ingress_services.iter().any(|i| i.eq_ignore_ascii_case(name))
                }
            })
            .filter(|s| tag.is_empty() || s.has_tag(tag))
            .filter(|s| {
                payload.tenancy.namespace.is_empty()
                    || s.namespace.is_empty()
                    || s.namespace == payload.tenancy.namespace
            })
            .filter_map(|s| self.node_for(s).map(|n| (s, n)))
            .filter(|(_, n)| self.in_scope(n, payload))
            .collect()
    }

    /// Shuffles, drops unhealthy instances, then applies the limit.
    fn build_results(
        &self,
        mut instances: Vec<(&ServiceEntry, &NodeEntry)>,
        payload: &QueryPayload,
        only_passing: bool,
    ) -> Vec<DiscoveryResult> {
        fastrand::shuffle(&mut instances);
        instances.retain(|(s, _)| match s.health {
            Health::Critical => false,
            Health::Warning => !only_passing,
            Health::Passing => true,
        });
        if payload.limit > 0 {
            instances.truncate(payload.limit);
        }

        instances
            .into_iter()
            .map(|(service, node)| DiscoveryResult {
                service: Some(Location {
                    name: service.name.clone(),
                    address: service.address.clone(),
                    tagged_addresses: tagged_addresses(&service.tagged_addresses),
                }),
                node: Some(node_location(node)),
                metadata: node.meta.clone(),
                result_type: ResultType::Service,
                dns: ResultDnsConfig {
                    ttl_override: None,
                    weight: service.weights.for_health(service.health),
                },
                ports: vec![Port::new("", service.port)],
                tenancy: ResultTenancy {
                    namespace: service.namespace.clone(),
                    partition: node.partition.clone(),
                    peer_name: payload.tenancy.peer.clone(),
                    datacenter: self.node_datacenter(node).to_string(),
                },
            })
            .collect()
    }
}

fn node_location(node: &NodeEntry) -> Location {
    Location {
        name: node.name.clone(),
        address: node.address.clone(),
        tagged_addresses: tagged_addresses(&node.tagged_addresses),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_dns_domain::QueryTenancy;

    fn catalog() -> LegacyCatalog {
        let snapshot = CatalogSnapshot::from_toml(
            r#"
            datacenters = ["dc2"]

            [[nodes]]
            name = "foo"
            address = "10.0.0.1"

            [[nodes]]
            name = "bar"
            address = "10.0.0.2"
            datacenter = "dc2"

            [[nodes]]
            name = "baz"
            address = "10.0.0.3"
            peer = "peer1"

            [[services]]
            node = "bar"
            name = "db"
            address = "10.2.0.1"
            port = 5432

            [[services]]
            node = "foo"
            name = "web"
            address = "10.1.0.1"
            port = 8080
            tags = ["Primary"]

            [[services]]
            node = "foo"
            name = "web-proxy"
            port = 21000
            kind = "connect-proxy"
            proxy_destination = "web"
            "#,
        )
        .unwrap();
        LegacyCatalog::new(&DnsConfig::default(), snapshot)
    }

    fn payload(name: &str, dc: &str) -> QueryPayload {
        QueryPayload {
            name: name.to_string(),
            tenancy: QueryTenancy {
                datacenter: dc.to_string(),
                ..QueryTenancy::default()
            },
            ..QueryPayload::default()
        }
    }

    #[test]
    fn unknown_datacenter_has_no_path() {
        let catalog = catalog();
        assert!(catalog.validate_request(&payload("web", "dc2")).is_ok());
        assert_eq!(
            catalog.validate_request(&payload("web", "dc9")),
            Err(DomainError::NoPathToDatacenter)
        );
    }

    #[test]
    fn tags_match_case_insensitively() {
        let catalog = catalog();
        let mut p = payload("web", "dc1");
        p.tag = "primary".to_string();
        let results = catalog.fetch_endpoints(&p, LookupType::Service).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].ports[0].number, 8080);
        assert_eq!(results[0].tenancy.datacenter, "dc1");
    }

    #[test]
    fn connect_lookup_returns_proxies() {
        let catalog = catalog();
        let results = catalog
            .fetch_endpoints(&payload("web", "dc1"), LookupType::Connect)
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].service_name(), "web-proxy");
    }

    #[test]
    fn nodes_are_scoped_to_their_datacenter() {
        let catalog = catalog();
        assert!(catalog.fetch_nodes(&payload("bar", "dc2")).is_ok());
        assert_eq!(
            catalog.fetch_nodes(&payload("bar", "dc1")),
            Err(DomainError::NotFound)
        );
    }

    #[test]
    fn reverse_lookup_prefers_nodes() {
        let catalog = catalog();
        let node = catalog.fetch_records_by_ip("10.0.0.1".parse().unwrap()).unwrap();
        assert_eq!(node[0].result_type, ResultType::Node);

        let service = catalog.fetch_records_by_ip("10.1.0.1".parse().unwrap()).unwrap();
        assert_eq!(service[0].result_type, ResultType::Service);
        assert_eq!(service[0].node_address(), "10.0.0.1");
    }

    #[test]
    fn reverse_lookup_reports_where_the_node_lives() {
        let catalog = catalog();

        let peered = catalog.fetch_records_by_ip("10.0.0.3".parse().unwrap()).unwrap();
        assert_eq!(peered[0].tenancy.peer_name, "peer1");

        let remote = catalog.fetch_records_by_ip("10.0.0.2".parse().unwrap()).unwrap();
        assert_eq!(remote[0].tenancy.datacenter, "dc2");
        assert!(remote[0].tenancy.peer_name.is_empty());

        let remote_service = catalog.fetch_records_by_ip("10.2.0.1".parse().unwrap()).unwrap();
        assert_eq!(remote_service[0].result_type, ResultType::Service);
        assert_eq!(remote_service[0].tenancy.datacenter, "dc2");
    }
}
