//! Rebuilds the name a result would be looked up by.

use waypoint_dns_domain::{ResultTenancy, ResultType};

/// Canonical name for `target` under `domain` (which carries its trailing dot).
///
/// Virtual results have no canonical name and yield an empty string.
pub fn canonical_name_for_result(
    result_type: ResultType,
    target: &str,
    domain: &str,
    tenancy: &ResultTenancy,
    port_name: &str,
) -> String {
    match result_type {
        ResultType::Service => {
            if tenancy.namespace.is_empty() {
                format!("{}.service.{}.{}", target, tenancy.datacenter, domain)
            } else {
                format!(
                    "{}.service.{}.{}.{}",
                    target, tenancy.namespace, tenancy.datacenter, domain
                )
            }
        }
        ResultType::Node => {
            // Peered nodes always live in the default namespace, so `.ns` is never needed.
            if !tenancy.peer_name.is_empty() && !tenancy.partition.is_empty() {
                format!(
                    "{}.node.{}.peer.{}.ap.{}",
                    target, tenancy.peer_name, tenancy.partition, domain
                )
            } else if !tenancy.peer_name.is_empty() {
                format!("{}.node.{}.peer.{}", target, tenancy.peer_name, domain)
            } else {
                format!("{}.node.{}.{}", target, tenancy.datacenter, domain)
            }
        }
        ResultType::Workload => {
            if port_name.is_empty() {
                format!(
                    "{}.workload.{}.ns.{}.ap.{}",
                    target, tenancy.namespace, tenancy.partition, domain
                )
            } else {
                format!(
                    "{}.port.{}.workload.{}.ns.{}.ap.{}",
                    port_name, target, tenancy.namespace, tenancy.partition, domain
                )
            }
        }
        ResultType::Virtual => String::new(),
    }
}
