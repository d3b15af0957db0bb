use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid question")]
    InvalidQuestion,

    #[error("name not found")]
    NameNotFound,

    #[error("not implemented")]
    NotImplemented,

    #[error("no results found for query")]
    NotFound,

    #[error("no data")]
    NoData,

    #[error("query not supported")]
    NotSupported,

    #[error("no path to datacenter")]
    NoPathToDatacenter,

    /// Marks an answer whose ECS scope is the client subnet rather than global.
    #[error("ECS response not global: {0}")]
    EcsNotGlobal(Box<DomainError>),

    #[error("unknown query type: {0}")]
    UnknownQueryType(String),

    #[error("recursion failed")]
    RecursionFailed,

    #[error("Query timeout")]
    QueryTimeout,

    #[error("Invalid DNS response: {0}")]
    InvalidDnsResponse(String),

    #[error("Invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("Catalog backend error: {0}")]
    Backend(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DomainError {
    pub fn is_ecs_global(&self) -> bool {
        !matches!(self, DomainError::EcsNotGlobal(_))
    }

    /// Strips the ECS marker, returning the error it carries.
    pub fn into_inner(self) -> DomainError {
        match self {
            DomainError::EcsNotGlobal(inner) => inner.into_inner(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ecs_marker_unwraps_to_inner_error() {
        let err = DomainError::EcsNotGlobal(Box::new(DomainError::NotFound));
        assert!(!err.is_ecs_global());
        assert_eq!(err.into_inner(), DomainError::NotFound);
    }

    #[test]
    fn plain_errors_are_global() {
        assert!(DomainError::NoData.is_ecs_global());
        assert_eq!(DomainError::NoData.into_inner(), DomainError::NoData);
    }
}
