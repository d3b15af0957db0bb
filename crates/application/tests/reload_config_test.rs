mod helpers;

use helpers::{MockCatalogDataFetcher, MockRouterConfig};
use std::sync::Arc;
use waypoint_dns_application::use_cases::ReloadConfigUseCase;
use waypoint_dns_domain::config::CliOverrides;
use waypoint_dns_domain::Config;

#[test]
fn test_apply_pushes_config_to_router_and_catalog() {
    let router = Arc::new(MockRouterConfig::default());
    let fetcher = MockCatalogDataFetcher::new();
    let use_case = ReloadConfigUseCase::new(router.clone(), Arc::new(fetcher.clone()));

    use_case.apply(&Config::default()).unwrap();

    assert_eq!(*router.reloads.lock().unwrap(), vec!["consul".to_string()]);
    assert_eq!(fetcher.reload_count(), 1);
}

#[test]
fn test_invalid_config_is_not_applied() {
    let router = Arc::new(MockRouterConfig::default());
    let fetcher = MockCatalogDataFetcher::new();
    let use_case = ReloadConfigUseCase::new(router.clone(), Arc::new(fetcher.clone()));

    let mut config = Config::default();
    config.dns.recursors = vec!["bogus".to_string()];

    assert!(use_case.apply(&config).is_err());
    assert!(router.reloads.lock().unwrap().is_empty());
    assert_eq!(fetcher.reload_count(), 0);
}

#[test]
fn test_router_rejection_keeps_catalog_untouched() {
    let router = Arc::new(MockRouterConfig::default());
    *router.fail.lock().unwrap() = true;
    let fetcher = MockCatalogDataFetcher::new();
    let use_case = ReloadConfigUseCase::new(router, Arc::new(fetcher.clone()));

    assert!(use_case.apply(&Config::default()).is_err());
    assert_eq!(fetcher.reload_count(), 0);
}

#[test]
fn test_execute_reports_missing_file() {
    let router = Arc::new(MockRouterConfig::default());
    let use_case = ReloadConfigUseCase::new(router, Arc::new(MockCatalogDataFetcher::new()));

    assert!(use_case
        .execute(Some("/nonexistent/waypoint-dns.toml"), CliOverrides::default())
        .is_err());
}
