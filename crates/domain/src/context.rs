/// Per-request defaults supplied by whoever received the DNS message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub token: String,
    pub default_namespace: String,
    pub default_partition: String,
    pub default_datacenter: String,
}

/// What the catalog backend sees of the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryContext {
    pub token: String,
}

impl From<&RequestContext> for DiscoveryContext {
    fn from(ctx: &RequestContext) -> Self {
        Self {
            token: ctx.token.clone(),
        }
    }
}
