pub mod catalog;
pub mod dns;
pub mod errors;
pub mod logging;
pub mod root;
pub mod server;
pub mod upstream;

pub use catalog::{CatalogBackendKind, CatalogConfig};
pub use dns::{canonical_name, DnsConfig, SoaConfig};
pub use errors::ConfigError;
pub use logging::LoggingConfig;
pub use root::{CliOverrides, Config};
pub use server::ServerConfig;
pub use upstream::{parse_recursor_address, RecursorStrategy};
