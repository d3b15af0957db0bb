use async_trait::async_trait;
use std::net::IpAddr;
use waypoint_dns_domain::{
    Config, DiscoveryContext, DiscoveryResult, DomainError, LookupType, QueryPayload,
    QueryResults,
};

/// Catalog backend that turns query payloads into discovery results.
#[async_trait]
pub trait CatalogDataFetcher: Send + Sync {
    /// Applies a reloaded runtime configuration.
    fn load_config(&self, config: &Config);

    fn validate_request(
        &self,
        ctx: &DiscoveryContext,
        payload: &QueryPayload,
    ) -> Result<(), DomainError>;

    /// Fills in backend defaults (tenancy, datacenter) on the payload.
    fn normalize_request(&self, payload: &mut QueryPayload);

    async fn fetch_nodes(
        &self,
        ctx: &DiscoveryContext,
        payload: &QueryPayload,
    ) -> Result<Vec<DiscoveryResult>, DomainError>;

    async fn fetch_endpoints(
        &self,
        ctx: &DiscoveryContext,
        payload: &QueryPayload,
        lookup_type: LookupType,
    ) -> Result<Vec<DiscoveryResult>, DomainError>;

    async fn fetch_virtual_ip(
        &self,
        ctx: &DiscoveryContext,
        payload: &QueryPayload,
    ) -> Result<DiscoveryResult, DomainError>;

    async fn fetch_workload(
        &self,
        ctx: &DiscoveryContext,
        payload: &QueryPayload,
    ) -> Result<DiscoveryResult, DomainError>;

    async fn fetch_records_by_ip(
        &self,
        ctx: &DiscoveryContext,
        ip: IpAddr,
    ) -> Result<Vec<DiscoveryResult>, DomainError>;

    /// Prepared query results may be scoped to the client subnet.
    async fn fetch_prepared_query(
        &self,
        ctx: &DiscoveryContext,
        payload: &QueryPayload,
    ) -> Result<QueryResults, DomainError>;
}
