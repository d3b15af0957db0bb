use waypoint_dns_domain::config::{Config, RecursorStrategy};
use waypoint_dns_domain::DnsConfig;

#[test]
fn test_config_default_values() {
    let config = DnsConfig::default();

    assert_eq!(config.domain, "consul");
    assert_eq!(config.datacenter, "dc1");
    assert_eq!(config.node_ttl, 0);
    assert_eq!(config.a_record_limit, 0);
    assert_eq!(config.udp_answer_limit, 3);
    assert!(config.node_meta_txt);
    assert!(!config.enable_truncate);
    assert!(!config.only_passing);
    assert_eq!(config.recursor_timeout_ms, 2000);
    assert_eq!(config.recursor_strategy, RecursorStrategy::Sequential);
    assert_eq!(config.soa.refresh, 3600);
    assert_eq!(config.soa.retry, 600);
    assert_eq!(config.soa.expire, 86400);
    assert_eq!(config.soa.min_ttl, 0);
}

#[test]
fn test_canonical_domains() {
    let config = DnsConfig {
        domain: "Consul".to_string(),
        alt_domain: "test-domain.".to_string(),
        ..DnsConfig::default()
    };
    assert_eq!(config.canonical_domain(), "consul.");
    assert_eq!(config.canonical_alt_domain(), "test-domain.");
    assert_eq!(DnsConfig::default().canonical_alt_domain(), "");
}

#[test]
fn test_config_from_toml() {
    let config = Config::from_toml(
        r#"
        [server]
        dns_port = 5353

        [dns]
        domain = "example"
        recursors = ["1.1.1.1"]
        recursor_strategy = "random"
        service_ttl = { "db" = 10, "web-*" = 5 }

        [dns.soa]
        min_ttl = 30

        [catalog]
        backend = "resource"
        "#,
    )
    .unwrap();

    assert_eq!(config.server.dns_port, 5353);
    assert_eq!(config.dns.domain, "example");
    assert_eq!(config.dns.recursor_strategy, RecursorStrategy::Random);
    assert_eq!(config.dns.service_ttl.get("web-*"), Some(&5));
    assert_eq!(config.dns.soa.min_ttl, 30);
    assert_eq!(config.dns.soa.refresh, 3600);
    assert_eq!(config.catalog.backend.as_str(), "resource");
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_validation_rejects_bad_recursor() {
    let mut config = Config::default();
    config.dns.recursors = vec!["not-an-ip".to_string()];
    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_rejects_port_zero() {
    let mut config = Config::default();
    config.server.dns_port = 0;
    assert!(config.validate().is_err());
}
