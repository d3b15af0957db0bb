#![allow(dead_code)]

use async_trait::async_trait;
use hickory_proto::op::{Edns, Message};
use hickory_proto::rr::rdata::opt::{ClientSubnet, EdnsOption};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{RData, Record, RecordType};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use waypoint_dns_application::ports::DiscoveryQueryProcessor;
use waypoint_dns_domain::{
    Config, DiscoveryContext, DiscoveryResult, DomainError, Location, Port, Query, QueryResults,
    QueryType, ResultTenancy, ResultType,
};
use waypoint_dns_infrastructure::dns::{wire, ClientInfo, Protocol, Recursor, Router, RouterConfig};

// ── discovery processor ─────────────────────────────────────────────────────

/// Answers name lookups by payload name and records every query it sees.
#[derive(Clone, Default)]
pub struct MockProcessor {
    by_name: Arc<Mutex<HashMap<String, Result<QueryResults, DomainError>>>>,
    by_ip: Arc<Mutex<Option<Result<Vec<DiscoveryResult>, DomainError>>>>,
    queries: Arc<Mutex<Vec<Query>>>,
    ips: Arc<Mutex<Vec<IpAddr>>>,
}

impl MockProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_name(self, name: &str, outcome: Result<QueryResults, DomainError>) -> Self {
        self.by_name
            .lock()
            .unwrap()
            .insert(name.to_string(), outcome);
        self
    }

    pub fn on_ip(self, outcome: Result<Vec<DiscoveryResult>, DomainError>) -> Self {
        *self.by_ip.lock().unwrap() = Some(outcome);
        self
    }

    pub fn queries(&self) -> Vec<Query> {
        self.queries.lock().unwrap().clone()
    }

    pub fn ips(&self) -> Vec<IpAddr> {
        self.ips.lock().unwrap().clone()
    }
}

#[async_trait]
impl DiscoveryQueryProcessor for MockProcessor {
    async fn query_by_name(
        &self,
        query: &Query,
        _ctx: &DiscoveryContext,
    ) -> Result<QueryResults, DomainError> {
        self.queries.lock().unwrap().push(query.clone());
        self.by_name
            .lock()
            .unwrap()
            .get(&query.payload.name)
            .cloned()
            .unwrap_or(Err(DomainError::NotFound))
    }

    async fn query_by_ip(
        &self,
        ip: IpAddr,
        _ctx: &DiscoveryContext,
    ) -> Result<Vec<DiscoveryResult>, DomainError> {
        self.ips.lock().unwrap().push(ip);
        self.by_ip
            .lock()
            .unwrap()
            .clone()
            .unwrap_or(Err(DomainError::NotFound))
    }
}

// ── recursor ────────────────────────────────────────────────────────────────

/// Replies to every forwarded question with fixed answers, or fails.
#[derive(Clone, Default)]
pub struct MockRecursor {
    answers: Arc<Mutex<Vec<Record>>>,
    error: Arc<Mutex<Option<DomainError>>>,
    requests: Arc<Mutex<Vec<(Message, Protocol)>>>,
}

impl MockRecursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answering(answers: Vec<Record>) -> Self {
        let mock = Self::new();
        *mock.answers.lock().unwrap() = answers;
        mock
    }

    pub fn failing(err: DomainError) -> Self {
        let mock = Self::new();
        *mock.error.lock().unwrap() = Some(err);
        mock
    }

    pub fn requests(&self) -> Vec<(Message, Protocol)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Recursor for MockRecursor {
    async fn handle(
        &self,
        request: &Message,
        _cfg: &RouterConfig,
        protocol: Protocol,
    ) -> Result<Message, DomainError> {
        self.requests
            .lock()
            .unwrap()
            .push((request.clone(), protocol));
        if let Some(err) = self.error.lock().unwrap().clone() {
            return Err(err);
        }
        let mut response = wire::reply_to(request);
        response.set_recursion_available(true);
        response.insert_answers(self.answers.lock().unwrap().clone());
        Ok(response)
    }
}

// ── builders ────────────────────────────────────────────────────────────────

pub fn config() -> Config {
    Config::default()
}

pub fn config_with_recursor() -> Config {
    let mut config = Config::default();
    config.dns.recursors = vec!["127.0.0.1:5353".to_string()];
    config
}

pub fn router(config: &Config, processor: &MockProcessor, recursor: &MockRecursor) -> Router {
    Router::new(config, Arc::new(processor.clone()), Arc::new(recursor.clone())).unwrap()
}

pub fn udp_client() -> ClientInfo {
    ClientInfo::new(client_addr(), Protocol::Udp)
}

pub fn tcp_client() -> ClientInfo {
    ClientInfo::new(client_addr(), Protocol::Tcp)
}

fn client_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::new(192, 0, 2, 10), 53000))
}

pub fn question(name: &str, record_type: RecordType) -> Message {
    wire::question(wire::name(name), record_type)
}

pub fn question_with_edns(name: &str, record_type: RecordType, payload: u16) -> Message {
    let mut message = question(name, record_type);
    let mut edns = Edns::new();
    edns.set_max_payload(payload);
    message.set_edns(edns);
    message
}

pub fn question_with_subnet(name: &str, record_type: RecordType, subnet: IpAddr, prefix: u8) -> Message {
    let mut message = question(name, record_type);
    let mut edns = Edns::new();
    edns.set_max_payload(4096);
    edns.options_mut()
        .insert(EdnsOption::Subnet(ClientSubnet::new(subnet, prefix, 0)));
    message.set_edns(edns);
    message
}

pub fn a_record(name: &str, addr: Ipv4Addr) -> Record {
    Record::from_rdata(wire::name(name), 60, RData::A(A(addr)))
}

fn tenancy(datacenter: &str) -> ResultTenancy {
    ResultTenancy {
        datacenter: datacenter.to_string(),
        ..ResultTenancy::default()
    }
}

pub fn service_result(
    service: &str,
    service_address: &str,
    node: &str,
    node_address: &str,
    port: u32,
) -> DiscoveryResult {
    DiscoveryResult {
        service: Some(Location::new(service, service_address)),
        node: Some(Location::new(node, node_address)),
        result_type: ResultType::Service,
        ports: vec![Port::new("", port)],
        tenancy: tenancy("dc1"),
        ..DiscoveryResult::default()
    }
}

pub fn node_result(node: &str, node_address: &str) -> DiscoveryResult {
    DiscoveryResult {
        node: Some(Location::new(node, node_address)),
        result_type: ResultType::Node,
        tenancy: tenancy("dc1"),
        ..DiscoveryResult::default()
    }
}

pub fn query_types(processor: &MockProcessor) -> Vec<QueryType> {
    processor.queries().iter().map(|q| q.query_type).collect()
}
