use anyhow::Context;
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use tracing::{error, info};
use waypoint_dns_domain::CliOverrides;

mod bootstrap;
mod di;
mod server;

#[derive(Parser)]
#[command(name = "waypoint-dns")]
#[command(version)]
#[command(about = "Waypoint DNS - service discovery over DNS")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// DNS server port
    #[arg(short = 'd', long)]
    dns_port: Option<u16>,

    /// Bind address
    #[arg(short = 'b', long)]
    bind: Option<String>,

    /// Catalog file path
    #[arg(long, value_name = "FILE")]
    catalog: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            dns_port: self.dns_port,
            bind_address: self.bind.clone(),
            log_level: self.log_level.clone(),
            catalog_path: self.catalog.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = bootstrap::load_config(cli.config.as_deref(), cli.overrides())?;

    bootstrap::init_logging(&config);

    info!("Starting Waypoint DNS v{}", env!("CARGO_PKG_VERSION"));

    let dns_services = di::DnsServices::new(&config)?;
    let use_cases = di::UseCases::new(&dns_services);

    let reload = use_cases.reload_config.clone();
    let config_path = cli.config.clone();
    let overrides = cli.overrides();
    tokio::spawn(async move {
        if let Err(e) = server::watch_for_reload(reload, config_path, overrides).await {
            error!(error = %e, "reload signal handler failed");
        }
    });

    let bind_ip: IpAddr = config
        .server
        .bind_address
        .parse()
        .context("invalid bind address")?;
    let dns_addr = SocketAddr::new(bind_ip, config.server.dns_port);
    let router = dns_services.router.clone();

    tokio::select! {
        result = server::start_dns_server(dns_addr, router) => {
            if let Err(e) = &result {
                error!(error = %e, "DNS server error");
            }
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
