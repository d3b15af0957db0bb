//! Node and service metadata as TXT records.

use super::canonical::canonical_name_for_result;
use super::wire;
use hickory_proto::rr::rdata::TXT;
use hickory_proto::rr::{RData, Record};
use std::collections::BTreeMap;
use waypoint_dns_domain::{
    DiscoveryResult, DnsAddress, Query, QueryType, RecordType, ResultType,
};

const RAW_VALUE_PREFIX: &str = "rfc1035-";

/// Encodes a key/value pair following RFC 1464 quoting rules.
pub fn encode_kv_rfc1464(key: &str, value: &str) -> String {
    let key = key.replace('`', "``").replace('=', "`=");

    let leading = key.len() - key.trim_start_matches(' ').len();
    let trimmed = key.trim_start_matches(' ');
    let trailing = trimmed.len() - trimmed.trim_end_matches(' ').len();
    let core = trimmed.trim_end_matches(' ');

    let mut out = String::with_capacity(key.len() + leading + trailing + value.len() + 1);
    out.push_str(&"` ".repeat(leading));
    out.push_str(core);
    out.push_str(&"` ".repeat(trailing));
    out.push('=');
    out.push_str(&value.replace('`', "``"));
    out
}

/// One TXT record per metadata entry. Keys prefixed `rfc1035-` emit the raw value.
pub fn make_txt_records(name: &str, metadata: &BTreeMap<String, String>, ttl: u32) -> Vec<Record> {
    metadata
        .iter()
        .map(|(key, value)| {
            let txt = if key.to_lowercase().starts_with(RAW_VALUE_PREFIX) {
                value.clone()
            } else {
                encode_kv_rfc1464(key, value)
            };
            Record::from_rdata(wire::name(name), ttl, RData::TXT(TXT::new(vec![txt])))
        })
        .collect()
}

pub fn should_append_txt(query: Option<&Query>, node_meta_txt: bool, qtype: RecordType) -> bool {
    let Some(query) = query else {
        return false;
    };
    match query.query_type {
        QueryType::Node => node_meta_txt || qtype == RecordType::ANY || qtype == RecordType::TXT,
        QueryType::Service | QueryType::PreparedQuery => node_meta_txt && qtype == RecordType::SRV,
        _ => false,
    }
}

/// TXT records for a result, split into answer and extra sections.
///
/// ANY and TXT questions carry metadata in the answer; everything else only
/// gets it as extra data when node metadata TXT is enabled.
#[allow(clippy::too_many_arguments)]
pub fn answer_and_extra_txt(
    query: Option<&Query>,
    node_meta_txt: bool,
    qtype: RecordType,
    qname: &str,
    result: &DiscoveryResult,
    ttl: u32,
    domain: &str,
    port_name: &str,
) -> (Vec<Record>, Vec<Record>) {
    if !should_append_txt(query, node_meta_txt, qtype) {
        return (Vec::new(), Vec::new());
    }

    let service_address = DnsAddress::new(result.service_address());
    let header = if result.result_type != ResultType::Node
        && result.result_type != ResultType::Virtual
        && !service_address.is_internal_fqdn(domain)
        && !service_address.is_external_fqdn(domain)
    {
        canonical_name_for_result(
            ResultType::Node,
            result.node_name(),
            domain,
            &result.tenancy,
            port_name,
        )
    } else {
        qname.to_string()
    };

    match qtype {
        RecordType::ANY | RecordType::TXT => {
            (make_txt_records(&header, &result.metadata, ttl), Vec::new())
        }
        _ if node_meta_txt => (Vec::new(), make_txt_records(&header, &result.metadata, ttl)),
        _ => (Vec::new(), Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_dns_domain::{QueryPayload, Location};

    #[test]
    fn plain_pairs_are_untouched() {
        assert_eq!(encode_kv_rfc1464("rack", "a1"), "rack=a1");
    }

    #[test]
    fn quotes_backticks_equals_and_edge_spaces() {
        assert_eq!(encode_kv_rfc1464("a=b", "v"), "a`=b=v");
        assert_eq!(encode_kv_rfc1464("a`b", "x`y"), "a``b=x``y");
        assert_eq!(encode_kv_rfc1464("  key ", "v"), "` ` key` =v");
    }

    #[test]
    fn raw_prefix_skips_encoding() {
        let mut meta = BTreeMap::new();
        meta.insert("RFC1035-spf".to_string(), "v=spf1 -all".to_string());
        meta.insert("key".to_string(), "value".to_string());
        let records = make_txt_records("foo.node.consul.", &meta, 0);
        let texts: Vec<String> = records
            .iter()
            .filter_map(|r| match r.data() {
                RData::TXT(txt) => Some(txt.to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(texts.len(), 2);
        assert!(texts.iter().any(|t| t.contains("v=spf1 -all")));
        assert!(texts.iter().any(|t| t.contains("key=value")));
    }

    fn query(query_type: QueryType) -> Query {
        Query::new(query_type, QueryPayload::default())
    }

    #[test]
    fn append_policy() {
        let node = query(QueryType::Node);
        let service = query(QueryType::Service);
        assert!(should_append_txt(Some(&node), false, RecordType::TXT));
        assert!(should_append_txt(Some(&node), true, RecordType::A));
        assert!(!should_append_txt(Some(&node), false, RecordType::A));
        assert!(should_append_txt(Some(&service), true, RecordType::SRV));
        assert!(!should_append_txt(Some(&service), true, RecordType::A));
        assert!(!should_append_txt(None, true, RecordType::ANY));
    }

    #[test]
    fn service_results_are_named_after_their_node() {
        let mut result = DiscoveryResult {
            node: Some(Location::new("n1", "10.0.0.1")),
            service: Some(Location::new("web", "10.0.0.2")),
            ..Default::default()
        };
        result.tenancy.datacenter = "dc1".to_string();
        result.metadata.insert("k".to_string(), "v".to_string());

        let (answer, extra) = answer_and_extra_txt(
            Some(&query(QueryType::Service)),
            true,
            RecordType::SRV,
            "web.service.consul.",
            &result,
            5,
            "consul.",
            "",
        );
        assert!(answer.is_empty());
        assert_eq!(extra.len(), 1);
        assert_eq!(extra[0].name().to_ascii(), "n1.node.dc1.consul.");
    }

    #[test]
    fn hostname_service_addresses_keep_the_question_name() {
        let mut result = DiscoveryResult {
            node: Some(Location::new("n1", "10.0.0.1")),
            service: Some(Location::new("web", "www.example.com")),
            ..Default::default()
        };
        result.tenancy.datacenter = "dc1".to_string();
        result.metadata.insert("k".to_string(), "v".to_string());

        let (_, extra) = answer_and_extra_txt(
            Some(&query(QueryType::Service)),
            true,
            RecordType::SRV,
            "web.service.consul.",
            &result,
            5,
            "consul.",
            "",
        );
        assert_eq!(extra.len(), 1);
        assert_eq!(extra[0].name().to_ascii(), "web.service.consul.");

        result.service = Some(Location::new("web", "db.service.consul"));
        let (_, extra) = answer_and_extra_txt(
            Some(&query(QueryType::Service)),
            true,
            RecordType::SRV,
            "web.service.consul.",
            &result,
            5,
            "consul.",
            "",
        );
        assert_eq!(extra[0].name().to_ascii(), "web.service.consul.");
    }
}
