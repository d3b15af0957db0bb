//! waypoint-dns domain layer
pub mod config;
pub mod context;
pub mod discovery_result;
pub mod dns_address;
pub mod dns_request;
pub mod errors;
pub mod query;
pub mod query_labels;
pub mod record_type;

pub use config::{
    CatalogBackendKind, CliOverrides, Config, DnsConfig, RecursorStrategy, SoaConfig,
};
pub use context::{DiscoveryContext, RequestContext};
pub use discovery_result::{
    DiscoveryResult, Location, Port, QueryResults, ResultDnsConfig, ResultTenancy, ResultType,
    TaggedAddress,
};
pub use dns_address::DnsAddress;
pub use dns_request::DnsRequest;
pub use errors::DomainError;
pub use query::{LookupType, Query, QueryPayload, QueryTenancy, QueryType};
pub use query_labels::ParsedLabels;
pub use record_type::RecordType;
