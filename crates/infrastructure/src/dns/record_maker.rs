//! Constructors for the resource records the serializer emits.

use super::wire;
use hickory_proto::rr::rdata::{A, AAAA, CNAME, NS, PTR, SOA, SRV};
use hickory_proto::rr::{RData, Record};
use std::net::IpAddr;
use std::time::{SystemTime, UNIX_EPOCH};
use waypoint_dns_domain::{DnsAddress, SoaConfig};

/// Zone SOA. Its TTL matches `min_ttl` so negative caching stays consistent.
pub fn make_soa(domain: &str, soa: &SoaConfig) -> Record {
    let serial = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0);
    let rdata = SOA::new(
        wire::name(&format!("ns.{}", domain)),
        wire::name(&format!("hostmaster.{}", domain)),
        serial,
        to_i32(soa.refresh),
        to_i32(soa.retry),
        to_i32(soa.expire),
        soa.min_ttl,
    );
    Record::from_rdata(wire::name(domain), soa.min_ttl, RData::SOA(rdata))
}

pub fn make_ns(domain: &str, fqdn: &str, ttl: u32) -> Record {
    Record::from_rdata(wire::name(domain), ttl, RData::NS(NS(wire::name(fqdn))))
}

pub fn make_ptr(name: &str, target: &str, ttl: u32) -> Record {
    Record::from_rdata(wire::name(name), ttl, RData::PTR(PTR(wire::name(target))))
}

/// A record for IPv4 addresses, AAAA otherwise. Non-IP addresses yield `None`.
pub fn make_ip_record(name: &str, address: &DnsAddress, ttl: u32) -> Option<Record> {
    let rdata = match address.ip()? {
        IpAddr::V4(v4) => RData::A(A(v4)),
        IpAddr::V6(v6) => RData::AAAA(AAAA(v6)),
    };
    Some(Record::from_rdata(wire::name(name), ttl, rdata))
}

pub fn make_cname(name: &str, target: &str, ttl: u32) -> Record {
    Record::from_rdata(
        wire::name(name),
        ttl,
        RData::CNAME(CNAME(wire::name(&fqdn(target)))),
    )
}

pub fn make_srv(name: &str, target: &str, weight: u32, port: u32, ttl: u32) -> Record {
    let rdata = SRV::new(1, to_u16(weight), to_u16(port), wire::name(target));
    Record::from_rdata(wire::name(name), ttl, RData::SRV(rdata))
}

pub fn fqdn(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{}.", name)
    }
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn to_u16(value: u32) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}
