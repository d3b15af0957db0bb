#![allow(dead_code)]

use async_trait::async_trait;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use waypoint_dns_application::ports::{CatalogDataFetcher, RouterConfigPort};
use waypoint_dns_domain::{
    Config, DiscoveryContext, DiscoveryResult, DomainError, Location, LookupType, QueryPayload,
    QueryResults, ResultType,
};

/// Catalog fetcher that records every call and replays canned responses.
#[derive(Clone, Default)]
pub struct MockCatalogDataFetcher {
    calls: Arc<Mutex<Vec<String>>>,
    results: Arc<Mutex<Vec<DiscoveryResult>>>,
    validate_error: Arc<Mutex<Option<DomainError>>>,
    fetch_error: Arc<Mutex<Option<DomainError>>>,
    normalize_partition: Arc<Mutex<Option<String>>>,
    seen_payloads: Arc<Mutex<Vec<QueryPayload>>>,
    reloads: Arc<Mutex<usize>>,
}

impl MockCatalogDataFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_results(results: Vec<DiscoveryResult>) -> Self {
        let mock = Self::new();
        *mock.results.lock().unwrap() = results;
        mock
    }

    pub fn set_validate_error(&self, err: DomainError) {
        *self.validate_error.lock().unwrap() = Some(err);
    }

    pub fn set_fetch_error(&self, err: DomainError) {
        *self.fetch_error.lock().unwrap() = Some(err);
    }

    pub fn set_normalize_partition(&self, partition: &str) {
        *self.normalize_partition.lock().unwrap() = Some(partition.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn seen_payloads(&self) -> Vec<QueryPayload> {
        self.seen_payloads.lock().unwrap().clone()
    }

    pub fn reload_count(&self) -> usize {
        *self.reloads.lock().unwrap()
    }

    fn record(&self, call: &str, payload: Option<&QueryPayload>) -> Result<(), DomainError> {
        self.calls.lock().unwrap().push(call.to_string());
        if let Some(payload) = payload {
            self.seen_payloads.lock().unwrap().push(payload.clone());
        }
        match self.fetch_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn canned(&self) -> Vec<DiscoveryResult> {
        self.results.lock().unwrap().clone()
    }

    fn first(&self) -> DiscoveryResult {
        self.canned().into_iter().next().unwrap_or_default()
    }
}

#[async_trait]
impl CatalogDataFetcher for MockCatalogDataFetcher {
    fn load_config(&self, _config: &Config) {
        *self.reloads.lock().unwrap() += 1;
    }

    fn validate_request(
        &self,
        _ctx: &DiscoveryContext,
        _payload: &QueryPayload,
    ) -> Result<(), DomainError> {
        self.calls.lock().unwrap().push("validate".to_string());
        match self.validate_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn normalize_request(&self, payload: &mut QueryPayload) {
        self.calls.lock().unwrap().push("normalize".to_string());
        if let Some(partition) = self.normalize_partition.lock().unwrap().clone() {
            payload.tenancy.partition = partition;
        }
    }

    async fn fetch_nodes(
        &self,
        _ctx: &DiscoveryContext,
        payload: &QueryPayload,
    ) -> Result<Vec<DiscoveryResult>, DomainError> {
        self.record("fetch_nodes", Some(payload))?;
        Ok(self.canned())
    }

    async fn fetch_endpoints(
        &self,
        _ctx: &DiscoveryContext,
        payload: &QueryPayload,
        lookup_type: LookupType,
    ) -> Result<Vec<DiscoveryResult>, DomainError> {
        self.record(&format!("fetch_endpoints:{:?}", lookup_type), Some(payload))?;
        Ok(self.canned())
    }

    async fn fetch_virtual_ip(
        &self,
        _ctx: &DiscoveryContext,
        payload: &QueryPayload,
    ) -> Result<DiscoveryResult, DomainError> {
        self.record("fetch_virtual_ip", Some(payload))?;
        Ok(self.first())
    }

    async fn fetch_workload(
        &self,
        _ctx: &DiscoveryContext,
        payload: &QueryPayload,
    ) -> Result<DiscoveryResult, DomainError> {
        self.record("fetch_workload", Some(payload))?;
        Ok(self.first())
    }

    async fn fetch_records_by_ip(
        &self,
        _ctx: &DiscoveryContext,
        _ip: IpAddr,
    ) -> Result<Vec<DiscoveryResult>, DomainError> {
        self.record("fetch_records_by_ip", None)?;
        Ok(self.canned())
    }

    async fn fetch_prepared_query(
        &self,
        _ctx: &DiscoveryContext,
        payload: &QueryPayload,
    ) -> Result<QueryResults, DomainError> {
        self.record("fetch_prepared_query", Some(payload))?;
        Ok(QueryResults::global(self.canned()))
    }
}

#[derive(Default)]
pub struct MockRouterConfig {
    pub reloads: Mutex<Vec<String>>,
    pub fail: Mutex<bool>,
}

impl RouterConfigPort for MockRouterConfig {
    fn reload_config(&self, config: &Config) -> Result<(), DomainError> {
        if *self.fail.lock().unwrap() {
            return Err(DomainError::Config("rejected".to_string()));
        }
        self.reloads.lock().unwrap().push(config.dns.domain.clone());
        Ok(())
    }
}

pub fn node_result(name: &str, address: &str) -> DiscoveryResult {
    DiscoveryResult {
        node: Some(Location::new(name, address)),
        result_type: ResultType::Node,
        ..DiscoveryResult::default()
    }
}
