use crate::ports::{CatalogDataFetcher, DiscoveryQueryProcessor};
use async_trait::async_trait;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::debug;
use waypoint_dns_domain::{
    DiscoveryContext, DiscoveryResult, DomainError, LookupType, Query, QueryResults, QueryType,
};

/// Validates, normalizes and dispatches discovery queries to the catalog.
pub struct ProcessDiscoveryQueryUseCase {
    fetcher: Arc<dyn CatalogDataFetcher>,
}

impl ProcessDiscoveryQueryUseCase {
    pub fn new(fetcher: Arc<dyn CatalogDataFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl DiscoveryQueryProcessor for ProcessDiscoveryQueryUseCase {
    async fn query_by_name(
        &self,
        query: &Query,
        ctx: &DiscoveryContext,
    ) -> Result<QueryResults, DomainError> {
        self.fetcher.validate_request(ctx, &query.payload)?;

        let mut payload = query.payload.clone();
        self.fetcher.normalize_request(&mut payload);

        debug!(
            query_type = %query.query_type,
            name = %payload.name,
            "dispatching discovery query"
        );

        let f = &self.fetcher;
        match query.query_type {
            QueryType::Node => f.fetch_nodes(ctx, &payload).await.map(QueryResults::global),
            QueryType::Service => f
                .fetch_endpoints(ctx, &payload, LookupType::Service)
                .await
                .map(QueryResults::global),
            QueryType::Connect => f
                .fetch_endpoints(ctx, &payload, LookupType::Connect)
                .await
                .map(QueryResults::global),
            QueryType::Ingress => f
                .fetch_endpoints(ctx, &payload, LookupType::Ingress)
                .await
                .map(QueryResults::global),
            QueryType::Virtual => f
                .fetch_virtual_ip(ctx, &payload)
                .await
                .map(|r| QueryResults::global(vec![r])),
            QueryType::Workload => f
                .fetch_workload(ctx, &payload)
                .await
                .map(|r| QueryResults::global(vec![r])),
            QueryType::PreparedQuery => f.fetch_prepared_query(ctx, &payload).await,
            QueryType::Invalid => Err(DomainError::UnknownQueryType(
                query.query_type.to_string(),
            )),
        }
    }

    async fn query_by_ip(
        &self,
        ip: IpAddr,
        ctx: &DiscoveryContext,
    ) -> Result<Vec<DiscoveryResult>, DomainError> {
        self.fetcher.fetch_records_by_ip(ctx, ip).await
    }
}
