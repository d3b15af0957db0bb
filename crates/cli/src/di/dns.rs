use std::sync::Arc;
use tracing::info;
use waypoint_dns_application::ports::{CatalogDataFetcher, DiscoveryQueryProcessor};
use waypoint_dns_application::use_cases::ProcessDiscoveryQueryUseCase;
use waypoint_dns_domain::Config;
use waypoint_dns_infrastructure::catalog::CatalogBackend;
use waypoint_dns_infrastructure::dns::{Recursor, Router, UpstreamRecursor};

pub struct DnsServices {
    pub catalog: Arc<CatalogBackend>,
    pub router: Arc<Router>,
}

impl DnsServices {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let catalog = Arc::new(CatalogBackend::from_config(config)?);
        let fetcher: Arc<dyn CatalogDataFetcher> = catalog.clone();
        let processor: Arc<dyn DiscoveryQueryProcessor> =
            Arc::new(ProcessDiscoveryQueryUseCase::new(fetcher));
        let recursor: Arc<dyn Recursor> = Arc::new(UpstreamRecursor::new());

        let router = Arc::new(Router::new(config, processor, recursor)?);

        info!(
            domain = %router.domain(),
            node = %config.dns.node_name,
            datacenter = %config.dns.datacenter,
            backend = catalog.kind().as_str(),
            recursors = config.dns.recursors.len(),
            "DNS services initialized"
        );

        Ok(Self { catalog, router })
    }
}
