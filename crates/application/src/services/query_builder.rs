use tracing::debug;
use waypoint_dns_domain::query_labels::{
    name_and_tag_from_parts, parse_labels, parse_port, split_by_query_type, split_labels,
    strip_failover_suffix, trim_domain,
};
use waypoint_dns_domain::{
    DnsRequest, DomainError, ParsedLabels, Query, QueryPayload, QueryTenancy, QueryType,
    RecordType, RequestContext,
};

/// Turns a DNS question into a discovery [`Query`].
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    domain: String,
    alt_domain: String,
}

impl QueryBuilder {
    /// Both domains are expected in canonical form (`consul.`), the alt
    /// domain may be empty.
    pub fn new(domain: impl Into<String>, alt_domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            alt_domain: alt_domain.into(),
        }
    }

    pub fn build(&self, request: &DnsRequest, ctx: &RequestContext) -> Result<Query, DomainError> {
        let (name, enable_failover) = strip_failover_suffix(&request.name);
        let labels = split_labels(trim_domain(name, &self.domain, &self.alt_domain));
        let split = split_by_query_type(&labels, request.record_type);

        let tenancy = Self::query_tenancy(ctx, split.query_type, split.suffixes)?;

        let (target, tag) = name_and_tag_from_parts(split.query_type, split.parts)
            .ok_or(DomainError::InvalidQuestion)?;
        let port_name = parse_port(split.parts);

        if split.query_type == QueryType::Workload && request.record_type == RecordType::SRV {
            return Err(DomainError::NotImplemented);
        }
        if split.query_type == QueryType::Invalid {
            return Err(DomainError::InvalidQuestion);
        }

        let source_ip = match split.query_type {
            QueryType::PreparedQuery => request.ecs_address.or(request.client_ip),
            _ => None,
        };

        debug!(
            question = %request.name,
            query_type = %split.query_type,
            name = %target,
            "built discovery query"
        );

        Ok(Query::new(
            split.query_type,
            QueryPayload {
                name: target,
                tag,
                port_name,
                source_ip,
                tenancy,
                limit: 0,
                enable_failover,
            },
        ))
    }

    /// Resolves tenancy: explicit labels first, then the request context.
    /// The agent-wide default is left to the catalog backend.
    pub fn query_tenancy(
        ctx: &RequestContext,
        query_type: QueryType,
        suffixes: &[String],
    ) -> Result<QueryTenancy, DomainError> {
        let mut labels = parse_labels(suffixes).ok_or(DomainError::NameNotFound)?;

        if labels.partition.is_empty() {
            labels.partition = ctx.default_partition.clone();
        }
        if labels.namespace.is_empty() {
            labels.namespace = ctx.default_namespace.clone();
        }

        if !labels.sameness_group.is_empty() {
            return Ok(QueryTenancy {
                namespace: labels.namespace,
                partition: labels.partition,
                sameness_group: labels.sameness_group,
                ..QueryTenancy::default()
            });
        }

        // virtual IPs are never cross-datacenter, so the ambiguous slot is a peer
        if query_type == QueryType::Virtual && labels.peer.is_empty() {
            labels.peer = labels.peer_or_datacenter.clone();
        }

        let datacenter = if labels.peer.is_empty() {
            effective_datacenter(&labels, &ctx.default_datacenter)
        } else {
            String::new()
        };

        Ok(QueryTenancy {
            namespace: labels.namespace,
            partition: labels.partition,
            peer: labels.peer,
            datacenter,
            sameness_group: String::new(),
        })
    }
}

fn effective_datacenter(labels: &ParsedLabels, default_dc: &str) -> String {
    if !labels.datacenter.is_empty() {
        return labels.datacenter.clone();
    }
    if !labels.peer_or_datacenter.is_empty() {
        return labels.peer_or_datacenter.clone();
    }
    default_dc.to_string()
}
