pub mod dns;
pub mod reload;

pub use dns::start_dns_server;
pub use reload::watch_for_reload;
