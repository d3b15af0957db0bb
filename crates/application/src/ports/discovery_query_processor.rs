use async_trait::async_trait;
use std::net::IpAddr;
use waypoint_dns_domain::{DiscoveryContext, DiscoveryResult, DomainError, Query, QueryResults};

/// Entry point for anything that needs service discovery results.
#[async_trait]
pub trait DiscoveryQueryProcessor: Send + Sync {
    async fn query_by_name(
        &self,
        query: &Query,
        ctx: &DiscoveryContext,
    ) -> Result<QueryResults, DomainError>;

    async fn query_by_ip(
        &self,
        ip: IpAddr,
        ctx: &DiscoveryContext,
    ) -> Result<Vec<DiscoveryResult>, DomainError>;
}
