use serde::{Deserialize, Serialize};

/// Which catalog implementation answers discovery lookups.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CatalogBackendKind {
    #[default]
    Legacy,

    Resource,
}

impl CatalogBackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::Resource => "resource",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct CatalogConfig {
    #[serde(default)]
    pub backend: CatalogBackendKind,

    /// TOML file holding the catalog contents. An empty catalog is used when unset.
    #[serde(default)]
    pub path: Option<String>,
}
