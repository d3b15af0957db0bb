use super::router_config::RouterConfig;
use super::transport::Transport;
use super::{wire, Protocol};
use async_trait::async_trait;
use hickory_proto::op::{Message, ResponseCode};
use tracing::{debug, error};
use waypoint_dns_domain::DomainError;

/// Forwards questions outside the served domains.
#[async_trait]
pub trait Recursor: Send + Sync {
    async fn handle(
        &self,
        request: &Message,
        cfg: &RouterConfig,
        protocol: Protocol,
    ) -> Result<Message, DomainError>;
}

/// Tries the configured recursors in strategy order until one replies with
/// NOERROR or NXDOMAIN. Other response codes and transport failures move on
/// to the next recursor.
#[derive(Debug, Default)]
pub struct UpstreamRecursor;

impl UpstreamRecursor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Recursor for UpstreamRecursor {
    async fn handle(
        &self,
        request: &Message,
        cfg: &RouterConfig,
        protocol: Protocol,
    ) -> Result<Message, DomainError> {
        let bytes = wire::encode(request, cfg.compress())?;
        let question = request
            .queries()
            .first()
            .map(|q| q.name().to_string())
            .unwrap_or_default();

        for idx in cfg.recursor_order() {
            let server = cfg.recursors[idx];
            let transport = Transport::for_protocol(protocol, server);

            let reply = match transport.send(&bytes, cfg.recursor_timeout).await {
                Ok(reply) => reply,
                Err(e) => {
                    error!(
                        question = %question,
                        recursor = %server,
                        protocol = %transport.protocol(),
                        error = %e,
                        "recurse failed"
                    );
                    continue;
                }
            };

            let response = match wire::decode(&reply.bytes) {
                Ok(response) => response,
                Err(e) => {
                    error!(question = %question, recursor = %server, error = %e, "recurse failed");
                    continue;
                }
            };

            match response.response_code() {
                ResponseCode::NoError | ResponseCode::NXDomain => {
                    debug!(
                        question = %question,
                        recursor = %server,
                        protocol = %reply.protocol_used,
                        truncated = response.truncated(),
                        "recurse succeeded"
                    );
                    return Ok(response);
                }
                rcode => {
                    debug!(
                        question = %question,
                        recursor = %server,
                        rcode = %rcode,
                        "recurse returned error, trying next"
                    );
                }
            }
        }

        error!(
            question = %question,
            recursors = cfg.recursors.len(),
            "all recursors failed"
        );
        Err(DomainError::RecursionFailed)
    }
}
