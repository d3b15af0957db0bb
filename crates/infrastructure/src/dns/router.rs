//! Request router: decides whether a question is served from the catalog or
//! forwarded upstream, runs the discovery pipeline, and shapes the response.

use super::address_translate::AddressTranslator;
use super::arpa::{ip_from_arpa, ip_from_hex_label};
use super::edns::{client_subnet_address, has_edns, set_edns};
use super::record_maker::make_soa;
use super::record_type_map::RecordTypeMapper;
use super::recursor::Recursor;
use super::request_type::RequestType;
use super::router_config::RouterConfig;
use super::serializer::{CnameResolver, MessageSerializer, SerializeRequest};
use super::truncate::{trim_tcp, trim_udp};
use super::{wire, ClientInfo, Protocol};
use arc_swap::ArcSwap;
use async_trait::async_trait;
use futures::future::BoxFuture;
use hickory_proto::op::{Message, ResponseCode};
use hickory_proto::rr::{Record, RecordType as HickoryRecordType};
use std::sync::Arc;
use tracing::{debug, error};
use waypoint_dns_application::ports::{DiscoveryQueryProcessor, RouterConfigPort};
use waypoint_dns_application::services::QueryBuilder;
use waypoint_dns_domain::query_labels::{split_labels, strip_failover_suffix, trim_domain};
use waypoint_dns_domain::{
    Config, DiscoveryContext, DiscoveryResult, DnsRequest, DomainError, Location, Query,
    QueryPayload, QueryResults, QueryTenancy, QueryType, RequestContext, ResultType,
};

/// Recursion budget for CNAME chains pointing back into a served domain.
pub const MAX_RECURSION_LEVEL_DEFAULT: usize = 3;

const ARPA_DOMAIN: &str = "arpa.";
const CONSUL_SERVICE_NAME: &str = "consul";
const DEFAULT_PARTITION: &str = "default";
const CONSUL_SERVICE_LIMIT: usize = 3;

pub struct Router {
    processor: Arc<dyn DiscoveryQueryProcessor>,
    recursor: Arc<dyn Recursor>,
    query_builder: QueryBuilder,
    domain: String,
    alt_domain: String,
    datacenter: String,
    config: ArcSwap<RouterConfig>,
}

impl Router {
    pub fn new(
        config: &Config,
        processor: Arc<dyn DiscoveryQueryProcessor>,
        recursor: Arc<dyn Recursor>,
    ) -> Result<Self, DomainError> {
        let domain = config.dns.canonical_domain();
        let alt_domain = config.dns.canonical_alt_domain();
        let router_config = RouterConfig::from_config(config)?;

        Ok(Self {
            processor,
            recursor,
            query_builder: QueryBuilder::new(domain.clone(), alt_domain.clone()),
            domain,
            alt_domain,
            datacenter: config.dns.datacenter.clone(),
            config: ArcSwap::from_pointee(router_config),
        })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn config(&self) -> Arc<RouterConfig> {
        self.config.load_full()
    }

    /// Context used for requests arriving on the agent's own listeners.
    pub fn default_request_context(&self) -> RequestContext {
        RequestContext {
            token: self.config.load().token.clone(),
            default_datacenter: self.datacenter.clone(),
            ..RequestContext::default()
        }
    }

    /// Answers one DNS message. Never fails: every error becomes a response code.
    pub async fn handle_request(
        &self,
        request: &Message,
        ctx: &RequestContext,
        client: ClientInfo,
    ) -> Message {
        let cfg = self.config.load_full();

        let Some(request) = normalize_request(request) else {
            error!(error = %DomainError::InvalidQuestion, "error parsing DNS query");
            return refused_response(request);
        };

        self.handle_recursively(&request, &cfg, ctx, &client, MAX_RECURSION_LEVEL_DEFAULT)
            .await
    }

    fn handle_recursively<'a>(
        &'a self,
        request: &'a Message,
        cfg: &'a RouterConfig,
        ctx: &'a RequestContext,
        client: &'a ClientInfo,
        max_recursion_level: usize,
    ) -> BoxFuture<'a, Message> {
        Box::pin(async move {
            let Some(question) = request.queries().first() else {
                return refused_response(request);
            };
            let question_name = wire::canonical_text(question.name());
            let qtype = RecordTypeMapper::from_hickory(question.query_type());

            debug!(
                question = %question_name,
                qtype = %qtype,
                recursion_remaining = max_recursion_level,
                "received request"
            );

            let Some(response_domain) = self.parse_domain(&question_name) else {
                if !cfg.can_recurse() {
                    return refused_response(request);
                }
                return match self.recursor.handle(request, cfg, client.protocol).await {
                    Ok(response) => response,
                    Err(e) => {
                        if e != DomainError::RecursionFailed {
                            error!(error = %e, "unhandled error recursing DNS query");
                        }
                        server_failure_response(request, true)
                    }
                };
            };

            let qname = if max_recursion_level < MAX_RECURSION_LEVEL_DEFAULT {
                trim_domain(&question_name, &self.domain, &self.alt_domain).to_string()
            } else {
                question_name.clone()
            };

            let request_type = RequestType::parse(&question_name, qtype);
            let (outcome, query) = self
                .query_results(request, ctx, client, request_type, &question_name, &qname)
                .await;

            let (results, ecs_global) = match outcome {
                Ok(found) => (found.results, found.ecs_global),
                Err(e) => {
                    let ecs_global = e.is_ecs_global();
                    return self.response_from_error(
                        request,
                        e.into_inner(),
                        &qname,
                        cfg,
                        &response_domain,
                        ecs_global,
                        query.as_ref(),
                        cfg.can_recurse(),
                    );
                }
            };

            debug!(
                question = %question_name,
                results_found = results.len(),
                "serializing results"
            );

            let translator = AddressTranslator::new(self.datacenter.clone(), cfg.translate_wan_addrs);
            let serializer = MessageSerializer::new(cfg, &translator, self);
            let serialize_request = SerializeRequest {
                request,
                question_name: &question_name,
                qname: &qname,
                qtype,
                request_type,
                query: query.as_ref(),
                results: &results,
                response_domain: &response_domain,
                ctx,
                client,
                max_recursion_level,
            };

            let response = match serializer.serialize(&serialize_request).await {
                Ok(response) => response,
                Err(e) => {
                    error!(error = %e, "error serializing DNS results");
                    return self.response_from_error(
                        request,
                        e,
                        &qname,
                        cfg,
                        &response_domain,
                        false,
                        query.as_ref(),
                        false,
                    );
                }
            };

            let mut response = trim_response(cfg, client.protocol, request, response);
            set_edns(request, &mut response, ecs_global);
            response
        })
    }

    /// The served domain a question belongs to, or `None` when it must be
    /// forwarded. Reverse lookups are served under the primary domain.
    fn parse_domain(&self, question_name: &str) -> Option<String> {
        let (target, _) = strip_failover_suffix(question_name);

        let mut offset = 0;
        loop {
            let subdomain = &target[offset..];
            if subdomain == "." || subdomain.is_empty() {
                return None;
            }
            if subdomain == self.domain {
                return Some(self.domain.clone());
            }
            if !self.alt_domain.is_empty() && subdomain == self.alt_domain {
                return Some(self.alt_domain.clone());
            }
            if subdomain == ARPA_DOMAIN {
                return Some(self.domain.clone());
            }
            match subdomain.find('.') {
                Some(idx) => offset += idx + 1,
                None => return None,
            }
        }
    }

    async fn query_results(
        &self,
        request: &Message,
        ctx: &RequestContext,
        client: &ClientInfo,
        request_type: RequestType,
        question_name: &str,
        qname: &str,
    ) -> (Result<QueryResults, DomainError>, Option<Query>) {
        let discovery_ctx = DiscoveryContext::from(ctx);

        match request_type {
            RequestType::Consul => {
                let query = Query::new(
                    QueryType::Service,
                    QueryPayload {
                        name: CONSUL_SERVICE_NAME.to_string(),
                        tenancy: QueryTenancy {
                            partition: DEFAULT_PARTITION.to_string(),
                            ..QueryTenancy::default()
                        },
                        limit: CONSUL_SERVICE_LIMIT,
                        ..QueryPayload::default()
                    },
                );
                let outcome = self.processor.query_by_name(&query, &discovery_ctx).await;
                (outcome, Some(query))
            }
            RequestType::Name => {
                let mut dns_request = DnsRequest::new(
                    question_name,
                    RecordTypeMapper::from_hickory(
                        request
                            .queries()
                            .first()
                            .map(|q| q.query_type())
                            .unwrap_or(HickoryRecordType::A),
                    ),
                );
                if let Some(addr) = client.addr {
                    dns_request = dns_request.with_client_ip(addr.ip());
                }
                if let Some(ecs) = client_subnet_address(request) {
                    dns_request = dns_request.with_ecs_address(ecs);
                }

                let query = match self.query_builder.build(&dns_request, ctx) {
                    Ok(query) => query,
                    Err(e) => {
                        error!(error = %e, "error building discovery query from DNS request");
                        return (Err(e), None);
                    }
                };
                let outcome = self.processor.query_by_name(&query, &discovery_ctx).await;
                if let Err(e) = &outcome {
                    error!(error = %e, "error processing discovery query");
                }
                (outcome, Some(query))
            }
            RequestType::Ip => {
                let Some(ip) = ip_from_arpa(qname) else {
                    error!(name = %qname, "error building IP from DNS request");
                    return (Err(DomainError::NameNotFound), None);
                };
                let outcome = self
                    .processor
                    .query_by_ip(ip, &discovery_ctx)
                    .await
                    .map(QueryResults::global);
                (outcome, None)
            }
            RequestType::Address => {
                let outcome = address_results(question_name);
                if let Err(e) = &outcome {
                    error!(error = %e, "error processing discovery query");
                }
                (outcome.map(QueryResults::global), None)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn response_from_error(
        &self,
        request: &Message,
        err: DomainError,
        qname: &str,
        cfg: &RouterConfig,
        response_domain: &str,
        ecs_global: bool,
        query: Option<&Query>,
        can_recurse: bool,
    ) -> Message {
        let qtype = request
            .queries()
            .first()
            .map(|q| q.query_type().to_string())
            .unwrap_or_default();

        let rcode = match &err {
            DomainError::InvalidQuestion => {
                error!(name = %qname, "invalid question");
                ResponseCode::NXDomain
            }
            DomainError::NameNotFound => {
                error!(name = %qname, "name not found");
                ResponseCode::NXDomain
            }
            DomainError::NotImplemented => {
                error!(name = %qname, qtype = %qtype, "query not implemented");
                ResponseCode::NotImp
            }
            DomainError::NotSupported => {
                debug!(name = %qname, "query name syntax not supported");
                ResponseCode::NXDomain
            }
            DomainError::NotFound => {
                debug!(name = %qname, "query name not found");
                ResponseCode::NXDomain
            }
            DomainError::NoData => {
                debug!(name = %qname, "no data available");
                ResponseCode::NoError
            }
            DomainError::NoPathToDatacenter => {
                let datacenter = query
                    .map(|q| q.payload.tenancy.datacenter.as_str())
                    .unwrap_or("");
                debug!(datacenter = %datacenter, "no path to datacenter");
                ResponseCode::NXDomain
            }
            other => {
                error!(error = %other, "error processing discovery query");
                return server_failure_response(request, can_recurse);
            }
        };

        authoritative_response(request, cfg, response_domain, rcode, ecs_global)
    }
}

#[async_trait]
impl CnameResolver for Router {
    async fn resolve_cname(
        &self,
        cfg: &RouterConfig,
        name: &str,
        ctx: &RequestContext,
        client: &ClientInfo,
        max_recursion_level: usize,
    ) -> Vec<Record> {
        let lower = name.to_lowercase();
        let internal = lower.ends_with(&format!(".{}", self.domain))
            || (!self.alt_domain.is_empty() && lower.ends_with(&format!(".{}", self.alt_domain)));

        if internal {
            if max_recursion_level < 1 {
                error!(
                    name = %name,
                    "infinite recursion detected for name, won't perform any CNAME resolution"
                );
                return Vec::new();
            }
            let request = wire::question(wire::name(name), HickoryRecordType::ANY);
            let internal_client = ClientInfo::internal(Protocol::Udp);
            let mut response = self
                .handle_recursively(&request, cfg, ctx, &internal_client, max_recursion_level - 1)
                .await;
            return response.take_answers();
        }

        if !cfg.can_recurse() {
            return Vec::new();
        }

        let request = wire::question(wire::name(name), HickoryRecordType::A);
        match self.recursor.handle(&request, cfg, client.protocol).await {
            Ok(mut response) => response.take_answers(),
            Err(e) => {
                error!(name = %name, error = %e, "failed to resolve CNAME target");
                Vec::new()
            }
        }
    }
}

impl RouterConfigPort for Router {
    fn reload_config(&self, config: &Config) -> Result<(), DomainError> {
        let router_config = RouterConfig::from_config(config)?;
        self.config.store(Arc::new(router_config));
        Ok(())
    }
}

/// Copy of the request with the first question name lower-cased, or `None`
/// when there is no question.
fn normalize_request(request: &Message) -> Option<Message> {
    let mut normalized = request.clone();
    let mut queries = normalized.take_queries();
    let first = queries.first_mut()?;
    first.set_name(first.name().to_lowercase());
    normalized.add_queries(queries);
    Some(normalized)
}

fn refused_response(request: &Message) -> Message {
    let mut response = wire::reply_to(request);
    response.set_response_code(ResponseCode::Refused);
    response
}

fn server_failure_response(request: &Message, recursion_available: bool) -> Message {
    let mut response = wire::reply_to(request);
    response.set_response_code(ResponseCode::ServFail);
    response.set_recursion_available(recursion_available);
    set_edns(request, &mut response, true);
    response
}

/// Authoritative reply without data, carrying the zone SOA in the
/// authority section.
fn authoritative_response(
    request: &Message,
    cfg: &RouterConfig,
    domain: &str,
    rcode: ResponseCode,
    ecs_global: bool,
) -> Message {
    let mut response = wire::reply_to(request);
    response.set_response_code(rcode);
    response.set_authoritative(true);
    response.set_recursion_available(cfg.can_recurse());
    if has_edns(request) {
        set_edns(request, &mut response, ecs_global);
    }
    response.add_name_server(make_soa(domain, &cfg.soa));
    response
}

/// Synthesizes the node result for a hex-encoded `<ip>.addr.` question.
fn address_results(question_name: &str) -> Result<Vec<DiscoveryResult>, DomainError> {
    let labels = split_labels(question_name);
    let hex_label = labels.first().ok_or(DomainError::NameNotFound)?;
    let ip = ip_from_hex_label(hex_label)?;

    Ok(vec![DiscoveryResult {
        node: Some(Location {
            address: ip.to_string(),
            ..Location::default()
        }),
        result_type: ResultType::Node,
        ..DiscoveryResult::default()
    }])
}

fn trim_response(
    cfg: &RouterConfig,
    protocol: Protocol,
    request: &Message,
    response: Message,
) -> Message {
    let original_records = response.answers().len();
    let original_size = wire::encoded_len(&response, cfg.compress());

    let (mut response, trimmed) = match protocol {
        Protocol::Udp => trim_udp(request, response, cfg.udp_answer_limit, cfg.compress()),
        Protocol::Tcp => trim_tcp(request, response, cfg.compress()),
    };

    if trimmed {
        if cfg.enable_truncate {
            response.set_truncated(true);
        }
        debug!(
            protocol = %protocol,
            question = ?request.queries().first().map(|q| q.name().to_string()),
            records = response.answers().len(),
            original_records,
            size = wire::encoded_len(&response, cfg.compress()),
            original_size,
            "DNS response too large, truncated"
        );
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_dns_domain::DnsConfig;

    struct NoopProcessor;

    #[async_trait]
    impl DiscoveryQueryProcessor for NoopProcessor {
        async fn query_by_name(
            &self,
            _query: &Query,
            _ctx: &DiscoveryContext,
        ) -> Result<QueryResults, DomainError> {
            Err(DomainError::NotFound)
        }

        async fn query_by_ip(
            &self,
            _ip: std::net::IpAddr,
            _ctx: &DiscoveryContext,
        ) -> Result<Vec<DiscoveryResult>, DomainError> {
            Err(DomainError::NotFound)
        }
    }

    struct NoopRecursor;

    #[async_trait]
    impl Recursor for NoopRecursor {
        async fn handle(
            &self,
            _request: &Message,
            _cfg: &RouterConfig,
            _protocol: Protocol,
        ) -> Result<Message, DomainError> {
            Err(DomainError::RecursionFailed)
        }
    }

    fn router(alt_domain: &str) -> Router {
        let config = Config {
            dns: DnsConfig {
                alt_domain: alt_domain.to_string(),
                ..DnsConfig::default()
            },
            ..Config::default()
        };
        Router::new(&config, Arc::new(NoopProcessor), Arc::new(NoopRecursor)).unwrap()
    }

    #[test]
    fn parse_domain_matches_served_suffixes() {
        let router = router("test-domain");
        assert_eq!(
            router.parse_domain("web.service.consul."),
            Some("consul.".to_string())
        );
        assert_eq!(
            router.parse_domain("web.service.test-domain."),
            Some("test-domain.".to_string())
        );
        assert_eq!(
            router.parse_domain("1.0.0.127.in-addr.arpa."),
            Some("consul.".to_string())
        );
        assert_eq!(
            router.parse_domain("web.service.consul.failover."),
            Some("consul.".to_string())
        );
        assert_eq!(router.parse_domain("www.example.com."), None);
        assert_eq!(router.parse_domain("."), None);
    }

    #[test]
    fn address_results_decode_hex_label() {
        let results = address_results("c000027b.addr.dc1.consul.").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].node_address(), "192.0.2.123");
        assert_eq!(results[0].result_type, ResultType::Node);

        assert_eq!(
            address_results("zz.addr.dc1.consul.").unwrap_err(),
            DomainError::NameNotFound
        );
    }

    #[test]
    fn default_context_carries_token_and_datacenter() {
        let router = router("");
        let ctx = router.default_request_context();
        assert_eq!(ctx.default_datacenter, "dc1");
        assert!(ctx.token.is_empty());
    }

    #[test]
    fn reload_swaps_config_snapshot() {
        let router = router("");
        assert!(!router.config().can_recurse());

        let mut config = Config::default();
        config.dns.recursors = vec!["127.0.0.1:53".to_string()];
        config.dns.enable_truncate = true;
        router.reload_config(&config).unwrap();

        let cfg = router.config();
        assert!(cfg.can_recurse());
        assert!(cfg.enable_truncate);
    }
}
