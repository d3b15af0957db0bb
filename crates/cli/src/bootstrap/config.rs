use anyhow::Context;
use waypoint_dns_domain::{CliOverrides, Config};

/// Loads and validates the configuration, applying command-line overrides.
pub fn load_config(path: Option<&str>, overrides: CliOverrides) -> anyhow::Result<Config> {
    let config = Config::load(path, overrides).context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;
    Ok(config)
}
