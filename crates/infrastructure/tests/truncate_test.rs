mod helpers;

use helpers::*;
use hickory_proto::op::Message;
use hickory_proto::rr::rdata::SRV;
use hickory_proto::rr::{RData, Record, RecordType};
use std::net::Ipv4Addr;
use waypoint_dns_domain::QueryResults;
use waypoint_dns_infrastructure::dns::truncate::{
    trim_tcp, trim_udp, DEFAULT_MAX_UDP_SIZE, MAX_TCP_SIZE,
};
use waypoint_dns_infrastructure::dns::wire;

fn response_with(request: &Message, answers: Vec<Record>, extra: Vec<Record>) -> Message {
    let mut response = wire::reply_to(request);
    wire::set_sections(&mut response, answers, Vec::new(), extra);
    response
}

fn srv_set(count: u8) -> (Vec<Record>, Vec<Record>) {
    let mut answers = Vec::new();
    let mut extra = Vec::new();
    for i in 0..count {
        let target = format!("0a0000{:02x}.addr.dc1.consul.", i);
        answers.push(Record::from_rdata(
            wire::name("web.service.consul."),
            0,
            RData::SRV(SRV::new(1, 1, 8080, wire::name(&target))),
        ));
        extra.push(a_record(&target, Ipv4Addr::new(10, 0, 0, i)));
    }
    (answers, extra)
}

fn a_set(count: u8) -> Vec<Record> {
    (0..count)
        .map(|i| a_record("web.service.consul.", Ipv4Addr::new(10, 0, 0, i)))
        .collect()
}

// ── UDP ─────────────────────────────────────────────────────────────────────

#[test]
fn test_udp_without_edns_caps_answer_count() {
    let request = question("web.service.consul.", RecordType::A);
    let response = response_with(&request, a_set(20), Vec::new());

    let (trimmed, did_trim) = trim_udp(&request, response, 3, true);

    assert!(did_trim);
    assert_eq!(trimmed.answers().len(), 3);
    assert!(wire::encode(&trimmed, false).unwrap().len() <= DEFAULT_MAX_UDP_SIZE);
}

#[test]
fn test_udp_small_response_untouched() {
    let request = question("web.service.consul.", RecordType::A);
    let response = response_with(&request, a_set(2), Vec::new());

    let (trimmed, did_trim) = trim_udp(&request, response, 3, true);

    assert!(!did_trim);
    assert_eq!(trimmed.answers().len(), 2);
}

#[test]
fn test_udp_srv_keeps_extra_in_sync() {
    let request = question("web.service.consul.", RecordType::SRV);
    let (answers, extra) = srv_set(30);
    let response = response_with(&request, answers, extra);

    let (trimmed, did_trim) = trim_udp(&request, response, 8, true);

    assert!(did_trim);
    assert!(wire::encode(&trimmed, false).unwrap().len() <= DEFAULT_MAX_UDP_SIZE);
    assert_eq!(trimmed.answers().len(), trimmed.additionals().len());
    for (answer, glue) in trimmed.answers().iter().zip(trimmed.additionals()) {
        match answer.data() {
            RData::SRV(srv) => assert_eq!(srv.target(), glue.name()),
            other => panic!("unexpected rdata {:?}", other),
        }
    }
}

#[test]
fn test_udp_edns_payload_bounds_size() {
    let request = question_with_edns("web.service.consul.", RecordType::SRV, 1232);
    let (answers, extra) = srv_set(120);
    let response = response_with(&request, answers, extra);

    let (trimmed, did_trim) = trim_udp(&request, response, 3, true);

    assert!(did_trim);
    // the answer cap only applies without EDNS
    assert!(trimmed.answers().len() > 3);
    assert!(wire::encode(&trimmed, true).unwrap().len() <= 1232);
}

#[test]
fn test_udp_never_drops_the_last_answer() {
    let request = question("big.service.consul.", RecordType::TXT);
    let long = "x".repeat(250);
    let record = Record::from_rdata(
        wire::name("big.service.consul."),
        0,
        RData::TXT(hickory_proto::rr::rdata::TXT::new(vec![
            long.clone(),
            long.clone(),
            long,
        ])),
    );
    let response = response_with(&request, vec![record], Vec::new());

    let (trimmed, did_trim) = trim_udp(&request, response, 3, true);

    assert!(!did_trim);
    assert_eq!(trimmed.answers().len(), 1);
}

#[test]
fn test_udp_zero_answer_limit_keeps_one_answer() {
    let request = question("web.service.consul.", RecordType::A);
    let response = response_with(&request, a_set(2), Vec::new());

    let (trimmed, did_trim) = trim_udp(&request, response, 0, true);

    assert!(did_trim);
    assert_eq!(trimmed.answers().len(), 1);
}

// ── TCP ─────────────────────────────────────────────────────────────────────

#[test]
fn test_tcp_bounds_message_size() {
    let request = question("web.service.consul.", RecordType::SRV);
    let mut answers = Vec::new();
    let mut extra = Vec::new();
    for round in 0..12u8 {
        let (a, e) = srv_set(255);
        answers.extend(a.into_iter().map(|mut r| {
            r.set_ttl(u32::from(round));
            r
        }));
        extra.extend(e);
    }
    let original = answers.len();
    let response = response_with(&request, answers, extra);

    let (trimmed, did_trim) = trim_tcp(&request, response, true);

    assert!(did_trim);
    assert!(trimmed.answers().len() < original);
    assert!(wire::encode(&trimmed, true).unwrap().len() <= MAX_TCP_SIZE);
}

#[test]
fn test_tcp_small_response_untouched() {
    let request = question("web.service.consul.", RecordType::A);
    let response = response_with(&request, a_set(50), Vec::new());

    let (trimmed, did_trim) = trim_tcp(&request, response, true);

    assert!(!did_trim);
    assert_eq!(trimmed.answers().len(), 50);
}

// ── through the router ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_router_sets_tc_when_truncate_enabled() {
    let results = (1..=20u8)
        .map(|i| {
            service_result(
                "web",
                &format!("10.0.1.{}", i),
                &format!("node{}", i),
                &format!("10.0.0.{}", i),
                80,
            )
        })
        .collect();
    let processor = MockProcessor::new().on_name("web", Ok(QueryResults::global(results)));

    let mut config = config();
    config.dns.enable_truncate = true;
    let router = router(&config, &processor, &MockRecursor::new());
    let ctx = router.default_request_context();

    let udp = router
        .handle_request(&question("web.service.consul.", RecordType::A), &ctx, udp_client())
        .await;
    assert!(udp.truncated());
    assert_eq!(udp.answers().len(), 3);

    let tcp = router
        .handle_request(&question("web.service.consul.", RecordType::A), &ctx, tcp_client())
        .await;
    assert!(!tcp.truncated());
    assert_eq!(tcp.answers().len(), 20);
}

#[tokio::test]
async fn test_router_trims_without_tc_by_default() {
    let results = (1..=10u8)
        .map(|i| service_result("web", &format!("10.0.1.{}", i), "node", "10.0.0.1", 80))
        .collect();
    let processor = MockProcessor::new().on_name("web", Ok(QueryResults::global(results)));
    let router = router(&config(), &processor, &MockRecursor::new());
    let ctx = router.default_request_context();

    let response = router
        .handle_request(&question("web.service.consul.", RecordType::A), &ctx, udp_client())
        .await;

    assert!(!response.truncated());
    assert_eq!(response.answers().len(), 3);
}
