use crate::ports::{CatalogDataFetcher, RouterConfigPort};
use std::sync::Arc;
use tracing::info;
use waypoint_dns_domain::config::CliOverrides;
use waypoint_dns_domain::{Config, DomainError};

/// Re-reads the configuration file and pushes it to the router and catalog.
pub struct ReloadConfigUseCase {
    router: Arc<dyn RouterConfigPort>,
    fetcher: Arc<dyn CatalogDataFetcher>,
}

impl ReloadConfigUseCase {
    pub fn new(router: Arc<dyn RouterConfigPort>, fetcher: Arc<dyn CatalogDataFetcher>) -> Self {
        Self { router, fetcher }
    }

    /// Command-line overrides are re-applied so a reload never undoes them.
    pub fn execute(
        &self,
        config_path: Option<&str>,
        overrides: CliOverrides,
    ) -> Result<Config, DomainError> {
        let new_config = Config::load(config_path, overrides)
            .map_err(|e| DomainError::Config(format!("Config load error: {}", e)))?;

        self.apply(&new_config)?;

        info!(
            path = config_path.unwrap_or("<default>"),
            "Configuration reloaded successfully"
        );

        Ok(new_config)
    }

    /// Validates and applies an already-loaded configuration.
    pub fn apply(&self, config: &Config) -> Result<(), DomainError> {
        config
            .validate()
            .map_err(|e| DomainError::Config(format!("Config validation error: {}", e)))?;

        self.router.reload_config(config)?;
        self.fetcher.load_config(config);
        Ok(())
    }
}
