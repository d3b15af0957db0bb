use std::fmt;
use std::net::IpAddr;

/// Discovery intent encoded in a DNS question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryType {
    Node,
    Service,
    Connect,
    Ingress,
    Virtual,
    Workload,
    PreparedQuery,
    Invalid,
}

impl QueryType {
    /// Maps a query-type keyword label (`service`, `node`, ...) to its type.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "service" => Some(QueryType::Service),
            "connect" => Some(QueryType::Connect),
            "virtual" => Some(QueryType::Virtual),
            "ingress" => Some(QueryType::Ingress),
            "node" => Some(QueryType::Node),
            "query" => Some(QueryType::PreparedQuery),
            "workload" => Some(QueryType::Workload),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Node => "node",
            QueryType::Service => "service",
            QueryType::Connect => "connect",
            QueryType::Ingress => "ingress",
            QueryType::Virtual => "virtual",
            QueryType::Workload => "workload",
            QueryType::PreparedQuery => "query",
            QueryType::Invalid => "invalid",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Distinguishes the three flavours of endpoint lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupType {
    Service,
    Connect,
    Ingress,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryTenancy {
    pub namespace: String,
    pub partition: String,
    pub peer: String,
    pub datacenter: String,
    pub sameness_group: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPayload {
    pub name: String,
    /// Legacy tag filter.
    pub tag: String,
    pub port_name: String,
    pub source_ip: Option<IpAddr>,
    pub tenancy: QueryTenancy,
    /// Maximum number of results, 0 means unbounded.
    pub limit: usize,
    pub enable_failover: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub query_type: QueryType,
    pub payload: QueryPayload,
}

impl Query {
    pub fn new(query_type: QueryType, payload: QueryPayload) -> Self {
        Self {
            query_type,
            payload,
        }
    }
}
