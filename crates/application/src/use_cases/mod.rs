pub mod config;
pub mod discovery;

pub use config::ReloadConfigUseCase;
pub use discovery::ProcessDiscoveryQueryUseCase;
