//! Turns discovery results into the answer, authority and additional
//! sections of a DNS response.
//!
//! The question type decides the layout: SOA and `addr.` lookups list every
//! result, SRV lookups drop duplicate (node, address, port) tuples, and all
//! other questions drop duplicate answers, prefer address records over
//! CNAMEs and honour the A-record limit.

use super::address_translate::{Accept, AddressTranslator};
use super::arpa::encode_ip_as_fqdn;
use super::canonical::canonical_name_for_result;
use super::record_maker::{
    fqdn, make_cname, make_ip_record, make_ns, make_ptr, make_soa, make_srv,
};
use super::request_type::RequestType;
use super::router_config::RouterConfig;
use super::txt::answer_and_extra_txt;
use super::{wire, ClientInfo};
use async_trait::async_trait;
use hickory_proto::op::Message;
use hickory_proto::rr::{Record, RecordType as HickoryRecordType};
use rustc_hash::FxHashSet;
use waypoint_dns_domain::{
    DiscoveryResult, DnsAddress, DomainError, Port, Query, QueryType, RecordType,
    RequestContext, ResultType,
};

/// Records appended from a CNAME chain when the client did not send EDNS.
pub const MAX_RECURSE_RECORDS: usize = 5;

/// Follows a CNAME target to the records it resolves to.
#[async_trait]
pub trait CnameResolver: Send + Sync {
    async fn resolve_cname(
        &self,
        cfg: &RouterConfig,
        name: &str,
        ctx: &RequestContext,
        client: &ClientInfo,
        max_recursion_level: usize,
    ) -> Vec<Record>;
}

/// Everything about the question that shapes the response.
pub struct SerializeRequest<'a> {
    pub request: &'a Message,
    /// Canonical question name; owns every answer record.
    pub question_name: &'a str,
    /// Question name with the served domain trimmed on recursive lookups.
    pub qname: &'a str,
    pub qtype: RecordType,
    pub request_type: RequestType,
    /// `None` for reverse and `addr.` lookups.
    pub query: Option<&'a Query>,
    pub results: &'a [DiscoveryResult],
    pub response_domain: &'a str,
    pub ctx: &'a RequestContext,
    pub client: &'a ClientInfo,
    pub max_recursion_level: usize,
}

#[derive(Debug, Default)]
struct RecordSets {
    answer: Vec<Record>,
    extra: Vec<Record>,
    ns: Vec<Record>,
}

impl RecordSets {
    fn extend(&mut self, other: RecordSets) {
        self.answer.extend(other.answer);
        self.extra.extend(other.extra);
        self.ns.extend(other.ns);
    }
}

pub struct MessageSerializer<'a> {
    cfg: &'a RouterConfig,
    translator: &'a AddressTranslator,
    resolver: &'a dyn CnameResolver,
}

impl<'a> MessageSerializer<'a> {
    pub fn new(
        cfg: &'a RouterConfig,
        translator: &'a AddressTranslator,
        resolver: &'a dyn CnameResolver,
    ) -> Self {
        Self {
            cfg,
            translator,
            resolver,
        }
    }

    /// Builds the authoritative response, or `NoData` when a catalog lookup
    /// produced nothing to answer with.
    pub async fn serialize(&self, req: &SerializeRequest<'_>) -> Result<Message, DomainError> {
        let mut response = wire::reply_to(req.request);
        response.set_authoritative(true);
        response.set_recursion_available(self.cfg.can_recurse());

        let mut sets = RecordSets::default();
        if req.qtype == RecordType::SOA {
            sets.answer
                .push(make_soa(req.response_domain, &self.cfg.soa));
        }

        if req.qtype == RecordType::SOA || req.request_type == RequestType::Address {
            for result in req.results {
                for port in result.ports_or_default() {
                    sets.extend(self.answer_extra_and_ns(req, result, &port).await);
                }
            }
        } else if req.qtype == RecordType::SRV {
            let mut handled = FxHashSet::default();
            for result in req.results {
                let address = match &result.service {
                    Some(service) => service.address.as_str(),
                    None => result.node_address(),
                };
                for port in result.ports_or_default() {
                    let tuple = format!("{}:{}:{}", result.node_name(), address, port.number);
                    if !handled.insert(tuple) {
                        continue;
                    }
                    sets.extend(self.answer_extra_and_ns(req, result, &port).await);
                }
            }
        } else {
            self.append_deduplicated(req, &mut sets).await;
        }

        if let Some(query) = req.query {
            if query.query_type != QueryType::Virtual
                && sets.answer.is_empty()
                && sets.extra.is_empty()
            {
                return Err(DomainError::NoData);
            }
        }

        wire::set_sections(&mut response, sets.answer, sets.ns, sets.extra);
        Ok(response)
    }

    /// Default layout: first-answer deduplication, CNAME answers deferred
    /// until no address answer turned up, and the A-record limit.
    async fn append_deduplicated(&self, req: &SerializeRequest<'_>, sets: &mut RecordSets) {
        let mut handled = FxHashSet::default();
        let mut cname_answer: Vec<Record> = Vec::new();
        let mut count = 0usize;

        'results: for result in req.results {
            for port in result.ports_or_default() {
                let found = self.answer_extra_and_ns(req, result, &port).await;
                sets.extra.extend(found.extra);

                let Some(first) = found.answer.first() else {
                    continue;
                };
                if !handled.insert(first.to_string()) {
                    continue;
                }

                if first.record_type() == HickoryRecordType::CNAME {
                    if cname_answer.is_empty() {
                        cname_answer = found.answer;
                    }
                    continue;
                }

                sets.answer.extend(found.answer);
                count += 1;
                if count == self.cfg.a_record_limit {
                    break 'results;
                }
            }
        }

        if sets.answer.is_empty() && !cname_answer.is_empty() {
            sets.answer = cname_answer;
        }
    }

    fn ttl_for_result(&self, name: &str, ttl_override: Option<u32>, query: Option<&Query>) -> u32 {
        let Some(query) = query else {
            return self.cfg.node_ttl;
        };
        if let Some(ttl) = ttl_override {
            return ttl;
        }
        match query.query_type {
            QueryType::Service | QueryType::PreparedQuery => self
                .cfg
                .service_ttl
                .lookup(name)
                .unwrap_or(self.cfg.node_ttl),
            _ => self.cfg.node_ttl,
        }
    }

    /// Translated service and node addresses, in that order.
    fn service_and_node_addresses(
        &self,
        qtype: RecordType,
        result: &DiscoveryResult,
    ) -> (DnsAddress, DnsAddress) {
        let accept = Accept::for_question(qtype);
        let datacenter = result.tenancy.datacenter.as_str();

        let service = result
            .service
            .as_ref()
            .map(|s| {
                self.translator
                    .translate(datacenter, &s.address, &s.tagged_addresses, accept)
            })
            .unwrap_or_default();
        let node = result
            .node
            .as_ref()
            .map(|n| {
                self.translator
                    .translate(datacenter, &n.address, &n.tagged_addresses, accept)
            })
            .unwrap_or_default();

        (DnsAddress::new(service), DnsAddress::new(node))
    }

    async fn answer_extra_and_ns(
        &self,
        req: &SerializeRequest<'_>,
        result: &DiscoveryResult,
        port: &Port,
    ) -> RecordSets {
        let (service_address, node_address) = self.service_and_node_addresses(req.qtype, result);
        let ttl_name = req
            .query
            .map(|q| q.payload.name.as_str())
            .unwrap_or(req.qname);
        let ttl = self.ttl_for_result(ttl_name, result.dns.ttl_override, req.query);
        let domain = req.response_domain;

        let mut sets = RecordSets::default();
        if req.request_type == RequestType::Ip {
            let target = match result.result_type {
                ResultType::Node => result.node_name(),
                ResultType::Service => result.service_name(),
                _ => "",
            };
            let ptr = canonical_name_for_result(
                result.result_type,
                target,
                domain,
                &result.tenancy,
                &port.name,
            );
            sets.answer.push(make_ptr(req.question_name, &ptr, 0));
        } else if req.qtype == RecordType::NS || req.qtype == RecordType::SOA {
            // Name servers are nodes, even when found through the agent's service.
            let result_type = match result.result_type {
                ResultType::Service if req.request_type == RequestType::Consul => ResultType::Node,
                other => other,
            };
            let target = canonical_name_for_result(
                result_type,
                result.node_name(),
                domain,
                &result.tenancy,
                &port.name,
            );
            let ns = make_ns(domain, &target, ttl);
            if req.qtype == RecordType::NS {
                sets.answer.push(ns);
            } else {
                sets.ns.push(ns);
            }
            sets.extra
                .extend(make_ip_record(&target, &node_address, ttl));
        } else {
            let found = self
                .answer_extras_for_address_and_target(
                    req,
                    result,
                    port,
                    ttl,
                    &node_address,
                    &service_address,
                )
                .await;
            sets.extend(found);
        }

        let (answer, extra) = answer_and_extra_txt(
            req.query,
            self.cfg.node_meta_txt,
            req.qtype,
            req.question_name,
            result,
            ttl,
            domain,
            &port.name,
        );
        sets.answer.extend(answer);
        sets.extra.extend(extra);
        sets
    }

    async fn answer_extras_for_address_and_target(
        &self,
        req: &SerializeRequest<'_>,
        result: &DiscoveryResult,
        port: &Port,
        ttl: u32,
        node_address: &DnsAddress,
        service_address: &DnsAddress,
    ) -> RecordSets {
        let domain = req.response_domain;
        let canonical = |result_type: ResultType, target: &str| {
            canonical_name_for_result(result_type, target, domain, &result.tenancy, &port.name)
        };

        if (req.request_type == RequestType::Address
            || result.result_type == ResultType::Virtual)
            && service_address.is_empty()
            && node_address.is_ip()
        {
            return self.answer_extras_for_ip(
                req.question_name,
                node_address,
                req,
                result,
                ttl,
                port,
            );
        }

        if result.result_type == ResultType::Node {
            if node_address.is_ip() {
                let name = canonical(ResultType::Node, result.node_name());
                return self.answer_extras_for_ip(&name, node_address, req, result, ttl, port);
            }
            return self
                .record_from_fqdn(&service_address.fqdn(), req, result, ttl, port)
                .await;
        }

        if service_address.is_empty() && node_address.is_empty() {
            return RecordSets::default();
        }

        if service_address.is_empty() {
            if node_address.is_ip() {
                let result_type = if result.result_type == ResultType::Workload {
                    ResultType::Workload
                } else {
                    ResultType::Node
                };
                let name = canonical(result_type, result.node_name());
                return self.answer_extras_for_ip(&name, node_address, req, result, ttl, port);
            }
            return self
                .record_from_fqdn(&node_address.fqdn(), req, result, ttl, port)
                .await;
        }

        if service_address.is_ip() {
            let name = canonical(ResultType::Service, result.service_name());
            return self.answer_extras_for_ip(&name, service_address, req, result, ttl, port);
        }

        // A service address naming the question itself would loop; answer with the node.
        if service_address.fqdn() == req.question_name && node_address.is_ip() {
            let name = canonical(ResultType::Node, result.node_name());
            return self.answer_extras_for_ip(&name, node_address, req, result, ttl, port);
        }

        self.record_from_fqdn(&service_address.fqdn(), req, result, ttl, port)
            .await
    }

    /// Address record for `addr`, plus the SRV pointing at it for SRV questions.
    fn answer_extras_for_ip(
        &self,
        name: &str,
        addr: &DnsAddress,
        req: &SerializeRequest<'_>,
        result: &DiscoveryResult,
        ttl: u32,
        port: &Port,
    ) -> RecordSets {
        let qtype = req.qtype;
        let mut sets = RecordSets::default();

        let can_return_a = matches!(
            qtype,
            RecordType::SRV | RecordType::A | RecordType::ANY | RecordType::NS | RecordType::TXT
        );
        let can_return_aaaa = matches!(
            qtype,
            RecordType::SRV | RecordType::AAAA | RecordType::ANY | RecordType::NS | RecordType::TXT
        );
        if req.request_type != RequestType::Address
            && result.result_type != ResultType::Virtual
            && addr.is_ip()
            && ((addr.is_ipv4() && !can_return_a) || (!addr.is_ipv4() && !can_return_aaaa))
        {
            return sets;
        }

        // SRV answers are owned by the question and point at `name`; every
        // other answer is owned by the question directly.
        let mut header = if qtype == RecordType::SRV {
            name.to_string()
        } else {
            req.question_name.to_string()
        };

        if req.request_type != RequestType::Address && qtype == RecordType::SRV {
            if result.result_type == ResultType::Service
                && result.node_address() != addr.as_str()
            {
                if let Some(ip) = addr.ip() {
                    header = encode_ip_as_fqdn(result, ip, req.response_domain);
                }
            }
            if result.result_type == ResultType::Workload {
                header = canonical_name_for_result(
                    result.result_type,
                    result.node_name(),
                    req.response_domain,
                    &result.tenancy,
                    &port.name,
                );
            }
            sets.answer.push(make_srv(
                req.question_name,
                &header,
                result.dns.weight,
                port.number,
                ttl,
            ));
        }

        if let Some(record) = make_ip_record(&header, addr, ttl) {
            let unrequested_a = record.record_type() == HickoryRecordType::A
                && qtype != RecordType::A
                && qtype != RecordType::ANY;
            let unrequested_aaaa = record.record_type() == HickoryRecordType::AAAA
                && qtype != RecordType::AAAA
                && qtype != RecordType::ANY;
            if unrequested_a || unrequested_aaaa {
                sets.extra.push(record);
            } else {
                sets.answer.push(record);
            }
        }
        sets
    }

    /// Answers for a hostname target: a CNAME (or SRV) to it, followed by
    /// whatever the chain resolves to.
    async fn record_from_fqdn(
        &self,
        target: &str,
        req: &SerializeRequest<'_>,
        result: &DiscoveryResult,
        ttl: u32,
        port: &Port,
    ) -> RecordSets {
        let has_edns = req.request.extensions().is_some();
        let chain = self
            .resolver
            .resolve_cname(
                self.cfg,
                &fqdn(target),
                req.ctx,
                req.client,
                req.max_recursion_level,
            )
            .await;

        let mut additional = Vec::new();
        for mut record in chain {
            if !matches!(
                record.record_type(),
                HickoryRecordType::CNAME
                    | HickoryRecordType::A
                    | HickoryRecordType::AAAA
                    | HickoryRecordType::TXT
            ) {
                continue;
            }
            record.set_ttl(ttl);
            additional.push(record);
            if additional.len() == MAX_RECURSE_RECORDS && !has_edns {
                break;
            }
        }

        if req.qtype == RecordType::SRV {
            return RecordSets {
                answer: vec![make_srv(
                    req.question_name,
                    target,
                    result.dns.weight,
                    port.number,
                    ttl,
                )],
                extra: additional,
                ns: Vec::new(),
            };
        }

        let address = if result.service_address().is_empty() {
            result.node_address()
        } else {
            result.service_address()
        };
        let mut answer = vec![make_cname(req.question_name, address, ttl)];
        answer.extend(additional);
        RecordSets {
            answer,
            extra: Vec::new(),
            ns: Vec::new(),
        }
    }
}
