//! Label grammar for discovery question names.
//!
//! A question such as `web.service.ns1.ns.dc2.dc.consul.` is decoded by
//! stripping the serving domain, locating the rightmost query-type keyword
//! and splitting the remaining labels into the name segment (left of the
//! keyword) and the tenancy segment (right of it).

use crate::query::QueryType;
use crate::record_type::RecordType;

/// Tenancy labels as they appear in the question, before any defaults apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedLabels {
    pub datacenter: String,
    pub namespace: String,
    pub partition: String,
    pub peer: String,
    /// A lone label that names either a peer or a datacenter depending on
    /// the query type.
    pub peer_or_datacenter: String,
    pub sameness_group: String,
}

/// Output of the keyword scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSplit<'a> {
    pub query_type: QueryType,
    pub parts: &'a [String],
    pub suffixes: &'a [String],
}

/// Strips a trailing `failover.` or `no-failover.` label from a canonical name.
///
/// Returns the remaining name and whether failover was requested.
pub fn strip_failover_suffix(name: &str) -> (&str, bool) {
    let trimmed = name.strip_suffix('.').unwrap_or(name);
    let (head, last) = match trimmed.rfind('.') {
        Some(idx) => (&name[..=idx], &trimmed[idx + 1..]),
        None => return (name, false),
    };
    match last {
        "failover" => (head, true),
        "no-failover" => (head, false),
        _ => (name, false),
    }
}

/// Splits a name into its labels, ignoring empty ones.
pub fn split_labels(name: &str) -> Vec<String> {
    name.split('.')
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .collect()
}

/// Removes the longer matching serving domain from a canonical question name.
pub fn trim_domain<'a>(question: &'a str, domain: &str, alt_domain: &str) -> &'a str {
    let (longer, shorter) = if alt_domain.len() > domain.len() {
        (alt_domain, domain)
    } else {
        (domain, alt_domain)
    };

    let dotted_longer = format!(".{}", longer.trim_start_matches('.'));
    if !longer.is_empty() && question.ends_with(&dotted_longer) {
        return question.strip_suffix(longer).unwrap_or(question);
    }
    if shorter.is_empty() {
        return question;
    }
    question.strip_suffix(shorter).unwrap_or(question)
}

/// Scans labels right to left for the first query-type keyword.
///
/// SRV questions may omit the `service` keyword when using RFC 2782 labels
/// (`_name._tcp`), in which case the underscore label is kept in `parts`.
pub fn split_by_query_type(labels: &[String], record_type: RecordType) -> LabelSplit<'_> {
    for i in (0..labels.len()).rev() {
        if let Some(query_type) = QueryType::from_label(&labels[i]) {
            return LabelSplit {
                query_type,
                parts: &labels[..i],
                suffixes: &labels[i + 1..],
            };
        }
        if record_type == RecordType::SRV && labels[i].starts_with('_') {
            return LabelSplit {
                query_type: QueryType::Service,
                parts: &labels[..=i],
                suffixes: &labels[i + 1..],
            };
        }
    }

    LabelSplit {
        query_type: QueryType::Invalid,
        parts: &[],
        suffixes: &[],
    }
}

/// Decodes the tenancy segment. Returns `None` when the labels are malformed.
pub fn parse_labels(labels: &[String]) -> Option<ParsedLabels> {
    let mut result = ParsedLabels::default();

    match labels.len() {
        0 => Some(result),
        1 => {
            result.peer_or_datacenter = labels[0].clone();
            Some(result)
        }
        2 | 4 | 6 => {
            for pair in labels.chunks(2) {
                let value = pair[0].clone();
                match pair[1].as_str() {
                    "ns" => result.namespace = value,
                    "ap" => result.partition = value,
                    "dc" | "cluster" => result.datacenter = value,
                    "sg" => result.sameness_group = value,
                    "peer" => result.peer = value,
                    _ if labels.len() == 2 => {
                        // legacy <namespace>.<peer-or-datacenter>
                        return Some(ParsedLabels {
                            namespace: labels[0].clone(),
                            peer_or_datacenter: labels[1].clone(),
                            ..ParsedLabels::default()
                        });
                    }
                    _ => return None,
                }
            }

            let dc = !result.datacenter.is_empty();
            let peer = !result.peer.is_empty();
            let sg = !result.sameness_group.is_empty();
            if (dc && peer) || (dc && sg) || (peer && sg) {
                return None;
            }
            Some(result)
        }
        _ => None,
    }
}

/// Returns the port name of a `<port>.port.<target>` segment.
pub fn parse_port(parts: &[String]) -> String {
    if parts.len() == 3 && parts[1] == "port" {
        return parts[0].clone();
    }
    String::new()
}

/// Extracts the target name and legacy tag from the name segment.
///
/// Returns `None` for shapes that can never be a valid question.
pub fn name_and_tag_from_parts(query_type: QueryType, parts: &[String]) -> Option<(String, String)> {
    let n = parts.len();
    if n == 0 {
        return None;
    }

    match query_type {
        QueryType::Service => {
            if n > 3 || (n == 3 && parts[1] != "port") {
                return None;
            }
            if n == 2 && parts[0].starts_with('_') && parts[1].starts_with('_') {
                let mut tag = parts[1][1..].to_string();
                if tag == "tcp" {
                    tag.clear();
                }
                return Some((parts[0][1..].to_string(), tag));
            }
            if n == 2 {
                // <tag>.<service>
                return Some((parts[1].clone(), parts[0].clone()));
            }
            non_empty(parts[n - 1].clone())
        }
        QueryType::PreparedQuery => {
            let name = if n >= 2 && parts[0].starts_with('_') && parts[n - 1].starts_with('_') {
                // the trailing label is the protocol and is ignored
                parts[..n - 1].join(".")[1..].to_string()
            } else {
                parts.join(".")
            };
            non_empty(name)
        }
        _ => non_empty(parts[n - 1].clone()),
    }
}

fn non_empty(name: String) -> Option<(String, String)> {
    if name.is_empty() {
        None
    } else {
        Some((name, String::new()))
    }
}
