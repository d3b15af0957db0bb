use waypoint_dns_domain::{Config, DomainError};

/// Receiver of hot-reloaded configuration snapshots.
pub trait RouterConfigPort: Send + Sync {
    fn reload_config(&self, config: &Config) -> Result<(), DomainError>;
}
