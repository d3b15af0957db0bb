use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};
use waypoint_dns_application::use_cases::ReloadConfigUseCase;
use waypoint_dns_domain::CliOverrides;

/// Re-reads the configuration file on every SIGHUP. A failed reload leaves
/// the running configuration untouched.
pub async fn watch_for_reload(
    reload: Arc<ReloadConfigUseCase>,
    config_path: Option<String>,
    overrides: CliOverrides,
) -> anyhow::Result<()> {
    let mut hangup = signal(SignalKind::hangup())?;

    while hangup.recv().await.is_some() {
        info!("SIGHUP received, reloading configuration");
        if let Err(e) = reload.execute(config_path.as_deref(), overrides.clone()) {
            error!(error = %e, "configuration reload failed");
        }
    }
    Ok(())
}
