mod catalog_data_fetcher;
mod discovery_query_processor;
mod router_config_port;

pub use catalog_data_fetcher::CatalogDataFetcher;
pub use discovery_query_processor::DiscoveryQueryProcessor;
pub use router_config_port::RouterConfigPort;
