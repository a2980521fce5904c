//! User-agent sources and the per-client holder.

use std::sync::Arc;

use async_trait::async_trait;
use fortkit_manifest::{FALLBACK_USER_AGENT, ManifestResolver};
use reqwest::header::HeaderValue;
use tokio::sync::OnceCell;

/// Produces the user-agent string stamped on outgoing requests.
#[async_trait]
pub trait UserAgentSource: Send + Sync + std::fmt::Debug {
    async fn user_agent(&self) -> String;

    /// Used when [`user_agent`](Self::user_agent) is not a valid header value.
    fn fallback_user_agent(&self) -> String {
        FALLBACK_USER_AGENT.to_string()
    }
}

pub type SharedUserAgentSource = Arc<dyn UserAgentSource>;

#[async_trait]
impl UserAgentSource for ManifestResolver {
    async fn user_agent(&self) -> String {
        self.resolve_user_agent().await
    }

    fn fallback_user_agent(&self) -> String {
        self.config().fallback_user_agent.clone()
    }
}

/// A user-agent that never changes.
#[derive(Debug, Clone)]
pub struct FixedUserAgent(pub String);

impl FixedUserAgent {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self(user_agent.into())
    }
}

#[async_trait]
impl UserAgentSource for FixedUserAgent {
    async fn user_agent(&self) -> String {
        self.0.clone()
    }
}

/// Resolves the user-agent on first use and keeps it for the client's lifetime.
#[derive(Debug)]
pub(crate) struct UserAgentHolder {
    source: SharedUserAgentSource,
    value: OnceCell<HeaderValue>,
}

impl UserAgentHolder {
    pub(crate) fn new(source: SharedUserAgentSource) -> Self {
        Self {
            source,
            value: OnceCell::new(),
        }
    }

    pub(crate) async fn get(&self) -> &HeaderValue {
        self.value
            .get_or_init(|| async {
                let user_agent = self.source.user_agent().await;
                HeaderValue::from_str(&user_agent).unwrap_or_else(|_| {
                    let fallback = self.source.fallback_user_agent();
                    tracing::warn!(
                        user_agent = %user_agent,
                        fallback = %fallback,
                        "user-agent is not a valid header value, using fallback"
                    );
                    HeaderValue::from_str(&fallback)
                        .unwrap_or_else(|_| HeaderValue::from_static(FALLBACK_USER_AGENT))
                })
            })
            .await
    }
}
