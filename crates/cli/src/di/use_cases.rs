use super::DnsServices;
use std::sync::Arc;
use waypoint_dns_application::use_cases::ReloadConfigUseCase;

pub struct UseCases {
    pub reload_config: Arc<ReloadConfigUseCase>,
}

impl UseCases {
    pub fn new(services: &DnsServices) -> Self {
        Self {
            reload_config: Arc::new(ReloadConfigUseCase::new(
                services.router.clone(),
                services.catalog.clone(),
            )),
        }
    }
}
