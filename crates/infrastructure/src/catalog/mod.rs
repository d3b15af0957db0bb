pub mod legacy;
pub mod resource;
pub mod snapshot;

pub use legacy::LegacyCatalog;
pub use resource::ResourceCatalog;
pub use snapshot::CatalogSnapshot;

use async_trait::async_trait;
use std::net::IpAddr;
use tracing::{info, warn};
use waypoint_dns_application::ports::CatalogDataFetcher;
use waypoint_dns_domain::{
    CatalogBackendKind, Config, DiscoveryContext, DiscoveryResult, DomainError, LookupType,
    QueryPayload, QueryResults,
};

/// The catalog backend selected by `[catalog] backend`.
pub enum CatalogBackend {
    Legacy(LegacyCatalog),
    Resource(ResourceCatalog),
}

impl CatalogBackend {
    pub fn from_config(config: &Config) -> Result<Self, DomainError> {
        let snapshot = CatalogSnapshot::load(config.catalog.path.as_deref())?;
        info!(
            backend = config.catalog.backend.as_str(),
            nodes = snapshot.nodes.len(),
            services = snapshot.services.len(),
            workloads = snapshot.workloads.len(),
            "catalog loaded"
        );

        Ok(match config.catalog.backend {
            CatalogBackendKind::Legacy => Self::Legacy(LegacyCatalog::new(&config.dns, snapshot)),
            CatalogBackendKind::Resource => {
                Self::Resource(ResourceCatalog::new(&config.dns, snapshot))
            }
        })
    }

    pub fn kind(&self) -> CatalogBackendKind {
        match self {
            Self::Legacy(_) => CatalogBackendKind::Legacy,
            Self::Resource(_) => CatalogBackendKind::Resource,
        }
    }
}

#[async_trait]
impl CatalogDataFetcher for CatalogBackend {
    /// Re-reads the catalog file. On failure the previous contents stay
    /// active and only the agent settings change.
    fn load_config(&self, config: &Config) {
        let snapshot = match CatalogSnapshot::load(config.catalog.path.as_deref()) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(error = %e, "catalog reload failed, keeping previous contents");
                None
            }
        };

        match self {
            Self::Legacy(c) => c.reload(&config.dns, snapshot),
            Self::Resource(c) => c.reload(&config.dns, snapshot),
        }
    }

    fn validate_request(
        &self,
        _ctx: &DiscoveryContext,
        payload: &QueryPayload,
    ) -> Result<(), DomainError> {
        match self {
            Self::Legacy(c) => c.validate_request(payload),
            Self::Resource(c) => c.validate_request(payload),
        }
    }

    fn normalize_request(&self, payload: &mut QueryPayload) {
        match self {
            Self::Legacy(c) => c.normalize_request(payload),
            Self::Resource(c) => c.normalize_request(payload),
        }
    }

    async fn fetch_nodes(
        &self,
        _ctx: &DiscoveryContext,
        payload: &QueryPayload,
    ) -> Result<Vec<DiscoveryResult>, DomainError> {
        match self {
            Self::Legacy(c) => c.fetch_nodes(payload),
            Self::Resource(_) => Err(DomainError::NotSupported),
        }
    }

    async fn fetch_endpoints(
        &self,
        _ctx: &DiscoveryContext,
        payload: &QueryPayload,
        lookup_type: LookupType,
    ) -> Result<Vec<DiscoveryResult>, DomainError> {
        match self {
            Self::Legacy(c) => c.fetch_endpoints(payload, lookup_type),
            Self::Resource(c) => c.fetch_endpoints(payload, lookup_type),
        }
    }

    async fn fetch_virtual_ip(
        &self,
        _ctx: &DiscoveryContext,
        payload: &QueryPayload,
    ) -> Result<DiscoveryResult, DomainError> {
        match self {
            Self::Legacy(c) => c.fetch_virtual_ip(payload),
            Self::Resource(c) => c.fetch_virtual_ip(payload),
        }
    }

    async fn fetch_workload(
        &self,
        _ctx: &DiscoveryContext,
        payload: &QueryPayload,
    ) -> Result<DiscoveryResult, DomainError> {
        match self {
            Self::Legacy(_) => Err(DomainError::NotSupported),
            Self::Resource(c) => c.fetch_workload(payload),
        }
    }

    async fn fetch_records_by_ip(
        &self,
        _ctx: &DiscoveryContext,
        ip: IpAddr,
    ) -> Result<Vec<DiscoveryResult>, DomainError> {
        match self {
            Self::Legacy(c) => c.fetch_records_by_ip(ip),
            Self::Resource(c) => c.fetch_records_by_ip(ip),
        }
    }

    async fn fetch_prepared_query(
        &self,
        _ctx: &DiscoveryContext,
        payload: &QueryPayload,
    ) -> Result<QueryResults, DomainError> {
        match self {
            Self::Legacy(c) => c.fetch_prepared_query(payload),
            Self::Resource(_) => Err(DomainError::NotSupported),
        }
    }
}
