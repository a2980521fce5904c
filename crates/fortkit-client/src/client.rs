//! Main client implementation.
//!
//! Per request the client:
//!
//! 1. decides whether the URL belongs to the protected domain,
//! 2. stamps the user-agent and default headers without overriding the caller,
//! 3. sends through the transport,
//! 4. on a rejected bearer token, invalidates and refreshes the owning
//!    account's credential and replays the request once,
//! 5. turns Epic error bodies on protected requests into [`EpicApiError`].

use std::sync::Arc;
use std::time::Duration;

use fortkit_manifest::{ManifestConfig, ManifestResolver};
use reqwest::header::{HeaderMap, USER_AGENT};
use serde::de::DeserializeOwned;
use url::Url;

use crate::credentials::{InMemoryCredentialStore, NoRefresh, SharedCredentialStore};
use crate::domain_error::{DomainErrorClass, EpicApiError};
use crate::error::{Error, Result};
use crate::request::{ApiRequest, ApiResponse};
use crate::transport::{ReqwestTransport, SharedTransport, TransportError};
use crate::user_agent::{FixedUserAgent, SharedUserAgentSource, UserAgentHolder};

/// Ceiling for a single request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Root of the domain whose requests get credential handling.
pub const DEFAULT_PROTECTED_DOMAIN: &str = "epicgames.com";

/// Replays allowed per logical request.
const MAX_RETRIES: u32 = 1;

// ─────────────────────────────────────────────────────────────────────────────
// Config
// ─────────────────────────────────────────────────────────────────────────────

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Hosts equal to this root or ending in `.<root>` are protected.
    pub protected_domain: String,
    pub timeout: Duration,
    /// Added to every request unless the request already sets them.
    pub default_headers: HeaderMap,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            protected_domain: DEFAULT_PROTECTED_DOMAIN.to_string(),
            timeout: DEFAULT_TIMEOUT,
            default_headers: HeaderMap::new(),
        }
    }
}

impl ClientConfig {
    /// Whether requests to `url` go through credential handling.
    pub fn is_protected(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        let root = self.protected_domain.trim_start_matches('.').to_ascii_lowercase();

        !root.is_empty() && (host == root || host.ends_with(&format!(".{}", root)))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────────────────────────

/// Epic Games API client.
///
/// Cheap to clone; clones share the transport, credential store and the
/// resolved user-agent.
#[derive(Debug, Clone)]
pub struct EpicClient {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
struct ClientInner {
    config: ClientConfig,
    transport: SharedTransport,
    credentials: SharedCredentialStore,
    user_agent: UserAgentHolder,
}

/// Retry bookkeeping for one logical request.
#[derive(Debug)]
struct RetryContext {
    request: ApiRequest,
    protected: bool,
    attempts: u32,
}

impl RetryContext {
    fn new(request: ApiRequest, protected: bool) -> Self {
        Self {
            request,
            protected,
            attempts: 0,
        }
    }

    fn can_retry(&self) -> bool {
        self.protected && self.attempts < MAX_RETRIES
    }
}

/// What the recovery step decided.
enum Recovery {
    /// The request now carries a fresh token.
    Retry,
    /// No account owns the rejected token.
    Abort,
}

impl EpicClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Send a request through the pipeline.
    ///
    /// Returns the response for 2xx statuses. Anything else is an error:
    /// [`Error::Epic`] for Epic error bodies on protected requests,
    /// [`Error::Http`] for other statuses, [`Error::Transport`] when no
    /// response arrived and [`Error::Refresh`] when the credential refresh
    /// feeding the retry failed.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let protected = self.inner.config.is_protected(&request.url);
        let request = self.prepare(request).await;
        let mut ctx = RetryContext::new(request, protected);

        loop {
            let response = self.dispatch(&ctx.request).await?;

            if response.is_success() {
                return Ok(response);
            }

            if !ctx.protected {
                return Err(http_error(&ctx.request, response));
            }

            let class = DomainErrorClass::classify(&response.body);

            if ctx.can_retry() && class.is_credential_error() {
                tracing::info!(
                    method = %ctx.request.method,
                    url = %ctx.request.url,
                    status = response.status.as_u16(),
                    "access token rejected, refreshing before retry"
                );

                match self.recover(&mut ctx.request).await? {
                    Recovery::Retry => {
                        ctx.attempts += 1;
                        continue;
                    }
                    Recovery::Abort => {}
                }
            }

            return Err(normalize(&ctx.request, response, class));
        }
    }

    /// Send a request and deserialize the JSON response body.
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        self.send(request).await?.json()
    }

    /// One transport round trip, bounded by the configured timeout.
    async fn dispatch(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let timeout = self.inner.config.timeout;
        match tokio::time::timeout(timeout, self.inner.transport.send(request)).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                tracing::warn!(
                    method = %request.method,
                    url = %request.url,
                    timeout_ms = timeout.as_millis() as u64,
                    "request timed out"
                );
                Err(TransportError::Timeout(timeout).into())
            }
        }
    }

    /// Merge default headers and the user-agent beneath the caller's headers.
    async fn prepare(&self, mut request: ApiRequest) -> ApiRequest {
        for (name, value) in &self.inner.config.default_headers {
            if !request.headers.contains_key(name) {
                request.headers.insert(name.clone(), value.clone());
            }
        }

        if !request.headers.contains_key(USER_AGENT) {
            let user_agent = self.inner.user_agent.get().await.clone();
            request.headers.insert(USER_AGENT, user_agent);
        }

        request
    }

    /// Swap the rejected bearer token for a freshly refreshed one.
    async fn recover(&self, request: &mut ApiRequest) -> Result<Recovery> {
        let account = match request.bearer_token() {
            Some(token) => self.inner.credentials.lookup_by_token(token).await,
            None => None,
        };

        let Some(account) = account else {
            tracing::warn!(
                url = %request.url,
                "rejected token does not belong to a known account, not retrying"
            );
            return Ok(Recovery::Abort);
        };

        self.inner.credentials.invalidate(&account.account_id).await;
        let token = self.inner.credentials.refresh(&account).await?;
        request.set_bearer(&token.access_token)?;

        tracing::debug!(account_id = %account.account_id, "retrying with refreshed token");
        Ok(Recovery::Retry)
    }
}

fn http_error(request: &ApiRequest, response: ApiResponse) -> Error {
    Error::Http {
        status: response.status.as_u16(),
        method: request.method.clone(),
        url: request.url.clone(),
        body: response.text().into_owned(),
    }
}

fn normalize(request: &ApiRequest, response: ApiResponse, class: DomainErrorClass) -> Error {
    match class {
        DomainErrorClass::Recognized(payload) => Error::Epic(EpicApiError {
            payload,
            method: request.method.clone(),
            url: request.url.clone(),
            status: response.status,
        }),
        DomainErrorClass::Unrecognized => http_error(request, response),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for creating an [`EpicClient`].
#[derive(Debug, Default)]
pub struct ClientBuilder {
    config: ClientConfig,
    transport: Option<SharedTransport>,
    credentials: Option<SharedCredentialStore>,
    user_agent: Option<SharedUserAgentSource>,
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn protected_domain(mut self, domain: impl Into<String>) -> Self {
        self.config.protected_domain = domain.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        self.config.default_headers = headers;
        self
    }

    /// Use a custom transport. Defaults to [`ReqwestTransport`].
    pub fn transport(mut self, transport: SharedTransport) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Credential store consulted on rejected tokens.
    ///
    /// Defaults to an empty in-memory store, which never retries.
    pub fn credentials(mut self, credentials: SharedCredentialStore) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// User-agent source. Defaults to a [`ManifestResolver`] with default config.
    pub fn user_agent_source(mut self, source: SharedUserAgentSource) -> Self {
        self.user_agent = Some(source);
        self
    }

    /// Use a fixed user-agent string.
    pub fn user_agent(self, user_agent: impl Into<String>) -> Self {
        self.user_agent_source(Arc::new(FixedUserAgent::new(user_agent)))
    }

    /// Build the client.
    pub fn build(self) -> Result<EpicClient> {
        if self.config.protected_domain.trim_start_matches('.').is_empty() {
            return Err(Error::Config("protected_domain must not be empty".to_string()));
        }
        if self.config.timeout.is_zero() {
            return Err(Error::Config("timeout must be greater than zero".to_string()));
        }

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(self.config.timeout)?),
        };

        let credentials = self
            .credentials
            .unwrap_or_else(|| Arc::new(InMemoryCredentialStore::new(Arc::new(NoRefresh))));

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| Arc::new(ManifestResolver::new(ManifestConfig::default())));

        Ok(EpicClient {
            inner: Arc::new(ClientInner {
                config: self.config,
                transport,
                credentials,
                user_agent: UserAgentHolder::new(user_agent),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use reqwest::StatusCode;

    use crate::credentials::{
        AccessToken, Account, CredentialError, CredentialStore, TokenRefresher,
    };
    use crate::transport::{Transport, TransportError};

    const ACCOUNT_URL: &str =
        "https://account-public-service-prod.ol.epicgames.com/account/api/public/account/abc";
    const INVALID_TOKEN: &str = "errors.com.epicgames.common.oauth.invalid_token";

    type Log = Arc<Mutex<Vec<String>>>;

    /// Transport that replays canned responses and records requests.
    #[derive(Debug)]
    struct ScriptedTransport {
        responses: Mutex<VecDeque<std::result::Result<ApiResponse, TransportError>>>,
        requests: Mutex<Vec<ApiRequest>>,
        log: Log,
    }

    impl ScriptedTransport {
        fn new(log: Log, responses: Vec<std::result::Result<ApiResponse, TransportError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
                log,
            }
        }

        fn requests(&self) -> Vec<ApiRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(
            &self,
            request: &ApiRequest,
        ) -> std::result::Result<ApiResponse, TransportError> {
            self.log.lock().unwrap().push("send".to_string());
            self.requests.lock().unwrap().push(request.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected request")
        }
    }

    #[derive(Debug)]
    struct StaticRefresher {
        token: String,
        fail: bool,
        calls: AtomicU32,
    }

    #[async_trait]
    impl TokenRefresher for StaticRefresher {
        async fn force_refresh(
            &self,
            account: &Account,
        ) -> std::result::Result<AccessToken, CredentialError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(CredentialError::Refresh {
                    account_id: account.account_id.clone(),
                    message: "device auth revoked".to_string(),
                });
            }
            Ok(AccessToken::new(self.token.clone()))
        }
    }

    /// Store wrapper that logs every call.
    #[derive(Debug)]
    struct LoggingStore {
        inner: InMemoryCredentialStore,
        log: Log,
    }

    #[async_trait]
    impl CredentialStore for LoggingStore {
        async fn lookup_by_token(&self, token: &str) -> Option<Account> {
            self.log.lock().unwrap().push("lookup".to_string());
            self.inner.lookup_by_token(token).await
        }

        async fn invalidate(&self, account_id: &str) {
            self.log
                .lock()
                .unwrap()
                .push(format!("invalidate:{}", account_id));
            self.inner.invalidate(account_id).await
        }

        async fn refresh(
            &self,
            account: &Account,
        ) -> std::result::Result<AccessToken, CredentialError> {
            self.log
                .lock()
                .unwrap()
                .push(format!("refresh:{}", account.account_id));
            self.inner.refresh(account).await
        }
    }

    struct Harness {
        client: EpicClient,
        transport: Arc<ScriptedTransport>,
        store: Arc<LoggingStore>,
        refresher: Arc<StaticRefresher>,
        log: Log,
    }

    async fn harness(
        responses: Vec<std::result::Result<ApiResponse, TransportError>>,
        fail_refresh: bool,
    ) -> Harness {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let transport = Arc::new(ScriptedTransport::new(log.clone(), responses));
        let refresher = Arc::new(StaticRefresher {
            token: "fresh-token".to_string(),
            fail: fail_refresh,
            calls: AtomicU32::new(0),
        });
        let inner = InMemoryCredentialStore::new(refresher.clone());
        inner
            .add_account(Account::new("abc"), AccessToken::new("stale-token"))
            .await;
        let store = Arc::new(LoggingStore {
            inner,
            log: log.clone(),
        });

        let client = EpicClient::builder()
            .transport(transport.clone())
            .credentials(store.clone())
            .user_agent("Fortnite/38.10")
            .build()
            .unwrap();

        Harness {
            client,
            transport,
            store,
            refresher,
            log,
        }
    }

    fn response(status: u16, body: &str) -> std::result::Result<ApiResponse, TransportError> {
        Ok(ApiResponse {
            status: StatusCode::from_u16(status).unwrap(),
            headers: HeaderMap::new(),
            body: body.as_bytes().to_vec(),
        })
    }

    fn epic_error(code: &str) -> String {
        serde_json::json!({
            "errorCode": code,
            "errorMessage": "Sorry the token you are using is not valid",
            "messageVars": [],
            "numericErrorCode": 1014,
            "originatingService": "com.epicgames.account.public",
            "intent": "prod"
        })
        .to_string()
    }

    fn authorized(url: &str, token: &str) -> ApiRequest {
        ApiRequest::get(url).unwrap().bearer(token).unwrap()
    }

    fn log_of(h: &Harness) -> Vec<String> {
        h.log.lock().unwrap().clone()
    }

    #[test]
    fn test_is_protected() {
        let config = ClientConfig::default();
        let protected = |u: &str| config.is_protected(&Url::parse(u).unwrap());

        assert!(protected(ACCOUNT_URL));
        assert!(protected("https://epicgames.com/id/login"));
        assert!(protected("https://FNGW-MCP-GC-LIVEFN.OL.EPICGAMES.COM/fortnite"));
        assert!(!protected("https://notepicgames.com/"));
        assert!(!protected("https://epicgames.com.evil.example/"));
        assert!(!protected("https://fortnite-api.com/v2/cosmetics"));
    }

    #[tokio::test]
    async fn test_builder_rejects_empty_domain() {
        let result = EpicClient::builder()
            .protected_domain("")
            .user_agent("x")
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_success_stamps_user_agent() {
        let h = harness(vec![response(200, "{}")], false).await;

        let response = h
            .client
            .send(authorized(ACCOUNT_URL, "stale-token"))
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::OK);

        let sent = h.transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].headers[USER_AGENT], "Fortnite/38.10");
        assert_eq!(log_of(&h), vec!["send"]);
    }

    #[tokio::test]
    async fn test_caller_user_agent_is_kept() {
        let h = harness(vec![response(200, "{}")], false).await;

        let request = ApiRequest::get(ACCOUNT_URL)
            .unwrap()
            .header("User-Agent", "EpicGamesLauncher/17.0")
            .unwrap();
        h.client.send(request).await.unwrap();

        assert_eq!(
            h.transport.requests()[0].headers[USER_AGENT],
            "EpicGamesLauncher/17.0"
        );
    }

    #[tokio::test]
    async fn test_default_headers_do_not_override_request() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let transport = Arc::new(ScriptedTransport::new(log, vec![response(200, "{}")]));
        let mut defaults = HeaderMap::new();
        defaults.insert("accept-language", "en".parse().unwrap());
        defaults.insert("x-epic-device-id", "device-1".parse().unwrap());

        let client = EpicClient::builder()
            .transport(transport.clone())
            .default_headers(defaults)
            .user_agent("Fortnite/38.10")
            .build()
            .unwrap();

        let request = ApiRequest::get(ACCOUNT_URL)
            .unwrap()
            .header("Accept-Language", "de")
            .unwrap();
        client.send(request).await.unwrap();

        let sent = &transport.requests()[0];
        assert_eq!(sent.headers["accept-language"], "de");
        assert_eq!(sent.headers["x-epic-device-id"], "device-1");
    }

    #[tokio::test]
    async fn test_unprotected_request_bypasses_credentials() {
        let h = harness(vec![response(401, &epic_error(INVALID_TOKEN))], false).await;

        let err = h
            .client
            .send(authorized("https://fortnite-api.com/v2/shop", "stale-token"))
            .await
            .unwrap_err();

        // Not normalized, not retried, store untouched
        assert!(matches!(err, Error::Http { status: 401, .. }));
        assert_eq!(log_of(&h), vec!["send"]);
        assert_eq!(
            h.transport.requests()[0].headers[USER_AGENT],
            "Fortnite/38.10"
        );
        assert!(h.store.inner.token_for("abc").await.is_some());
    }

    #[tokio::test]
    async fn test_invalid_token_refreshes_and_retries_once() {
        let h = harness(
            vec![
                response(400, &epic_error(INVALID_TOKEN)),
                response(200, r#"{"id":"abc","displayName":"Ninja"}"#),
            ],
            false,
        )
        .await;

        let value: serde_json::Value = h
            .client
            .send_json(authorized(ACCOUNT_URL, "stale-token"))
            .await
            .unwrap();
        assert_eq!(value["displayName"], "Ninja");

        assert_eq!(
            log_of(&h),
            vec!["send", "lookup", "invalidate:abc", "refresh:abc", "send"]
        );

        let sent = h.transport.requests();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].bearer_token(), Some("stale-token"));
        assert_eq!(sent[1].bearer_token(), Some("fresh-token"));
        assert_eq!(sent[1].headers[USER_AGENT], "Fortnite/38.10");
        assert_eq!(
            h.store.inner.token_for("abc").await.unwrap().access_token,
            "fresh-token"
        );
    }

    #[tokio::test]
    async fn test_token_verification_failed_also_retries() {
        let h = harness(
            vec![
                response(
                    401,
                    &epic_error("errors.com.epicgames.common.authentication.token_verification_failed"),
                ),
                response(204, ""),
            ],
            false,
        )
        .await;

        let response = h
            .client
            .send(authorized(ACCOUNT_URL, "stale-token"))
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::NO_CONTENT);
        assert_eq!(h.refresher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_replays_body() {
        let h = harness(
            vec![
                response(401, &epic_error(INVALID_TOKEN)),
                response(200, "{}"),
            ],
            false,
        )
        .await;

        let request = ApiRequest::post(ACCOUNT_URL)
            .unwrap()
            .bearer("stale-token")
            .unwrap()
            .json(&serde_json::json!({"displayName": "Ninja"}))
            .unwrap();
        h.client.send(request).await.unwrap();

        let sent = h.transport.requests();
        assert_eq!(sent[0].body, sent[1].body);
        assert!(sent[1].body.is_some());
    }

    #[tokio::test]
    async fn test_unknown_token_is_not_retried() {
        let h = harness(vec![response(401, &epic_error(INVALID_TOKEN))], false).await;

        let err = h
            .client
            .send(authorized(ACCOUNT_URL, "someone-elses-token"))
            .await
            .unwrap_err();

        assert!(err.is_credential_error());
        assert_eq!(err.status(), Some(401));
        assert_eq!(log_of(&h), vec!["send", "lookup"]);
        assert_eq!(h.refresher.calls.load(Ordering::SeqCst), 0);
        assert!(h.store.inner.token_for("abc").await.is_some());
    }

    #[tokio::test]
    async fn test_missing_bearer_is_not_retried() {
        let h = harness(vec![response(401, &epic_error(INVALID_TOKEN))], false).await;

        let err = h
            .client
            .send(ApiRequest::get(ACCOUNT_URL).unwrap())
            .await
            .unwrap_err();

        assert!(err.is_credential_error());
        assert_eq!(log_of(&h), vec!["send"]);
    }

    #[tokio::test]
    async fn test_second_rejection_is_not_retried() {
        let h = harness(
            vec![
                response(401, &epic_error(INVALID_TOKEN)),
                response(401, &epic_error(INVALID_TOKEN)),
            ],
            false,
        )
        .await;

        let err = h
            .client
            .send(authorized(ACCOUNT_URL, "stale-token"))
            .await
            .unwrap_err();

        match &err {
            Error::Epic(e) => {
                assert_eq!(e.error_code(), INVALID_TOKEN);
                assert_eq!(e.status, StatusCode::UNAUTHORIZED);
                assert_eq!(e.url.as_str(), ACCOUNT_URL);
                assert_eq!(e.method, reqwest::Method::GET);
            }
            other => panic!("expected Epic error, got {:?}", other),
        }
        assert_eq!(h.transport.requests().len(), 2);
        assert_eq!(h.refresher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refresh_failure_propagates() {
        let h = harness(vec![response(401, &epic_error(INVALID_TOKEN))], true).await;

        let err = h
            .client
            .send(authorized(ACCOUNT_URL, "stale-token"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Refresh(CredentialError::Refresh { .. })));
        assert_eq!(h.transport.requests().len(), 1);
        // The stale entry was already invalidated before the refresh ran
        assert!(h.store.inner.token_for("abc").await.is_none());
    }

    #[tokio::test]
    async fn test_other_epic_error_is_normalized_without_retry() {
        let h = harness(
            vec![response(
                404,
                &epic_error("errors.com.epicgames.account.account_not_found"),
            )],
            false,
        )
        .await;

        let err = h
            .client
            .send(authorized(ACCOUNT_URL, "stale-token"))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(
            err.error_code(),
            Some("errors.com.epicgames.account.account_not_found")
        );
        assert_eq!(log_of(&h), vec!["send"]);
    }

    #[tokio::test]
    async fn test_malformed_error_body_passes_through() {
        let h = harness(vec![response(502, "<html>Bad Gateway</html>")], false).await;

        let err = h
            .client
            .send(authorized(ACCOUNT_URL, "stale-token"))
            .await
            .unwrap_err();

        match err {
            Error::Http { status, body, .. } => {
                assert_eq!(status, 502);
                assert!(body.contains("Bad Gateway"));
            }
            other => panic!("expected Http error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transport_error_is_not_retried() {
        let h = harness(
            vec![Err(TransportError::Timeout(DEFAULT_TIMEOUT))],
            false,
        )
        .await;

        let err = h
            .client
            .send(authorized(ACCOUNT_URL, "stale-token"))
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(log_of(&h), vec!["send"]);
    }

    #[tokio::test]
    async fn test_builder_rejects_zero_timeout() {
        let result = EpicClient::builder()
            .timeout(Duration::ZERO)
            .user_agent("x")
            .build();
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("timeout")));
    }

    /// Transport that never answers within a test's timeout.
    #[derive(Debug)]
    struct StalledTransport;

    #[async_trait]
    impl Transport for StalledTransport {
        async fn send(
            &self,
            _request: &ApiRequest,
        ) -> std::result::Result<ApiResponse, TransportError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            response(200, "{}")
        }
    }

    #[tokio::test]
    async fn test_configured_timeout_bounds_custom_transport() {
        let client = EpicClient::builder()
            .timeout(Duration::from_millis(50))
            .transport(Arc::new(StalledTransport))
            .user_agent("Fortnite/38.10")
            .build()
            .unwrap();

        let started = std::time::Instant::now();
        let err = client
            .send(ApiRequest::get(ACCOUNT_URL).unwrap())
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert!(matches!(
            err,
            Error::Transport(TransportError::Timeout(d)) if d == Duration::from_millis(50)
        ));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    /// Answers by bearer token: `stale-*` is rejected, anything else succeeds.
    #[derive(Debug, Default)]
    struct TokenRoutedTransport {
        requests: Mutex<Vec<ApiRequest>>,
    }

    #[async_trait]
    impl Transport for TokenRoutedTransport {
        async fn send(
            &self,
            request: &ApiRequest,
        ) -> std::result::Result<ApiResponse, TransportError> {
            self.requests.lock().unwrap().push(request.clone());
            // Let the other in-flight request interleave
            tokio::task::yield_now().await;
            match request.bearer_token() {
                Some(token) if token.starts_with("stale-") => {
                    response(401, &epic_error(INVALID_TOKEN))
                }
                Some(token) => response(200, &format!(r#"{{"token":"{}"}}"#, token)),
                None => response(401, &epic_error(INVALID_TOKEN)),
            }
        }
    }

    /// Issues `fresh-<account id>` for each account.
    #[derive(Debug, Default)]
    struct PerAccountRefresher {
        calls: AtomicU32,
    }

    #[async_trait]
    impl TokenRefresher for PerAccountRefresher {
        async fn force_refresh(
            &self,
            account: &Account,
        ) -> std::result::Result<AccessToken, CredentialError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            Ok(AccessToken::new(format!("fresh-{}", account.account_id)))
        }
    }

    #[tokio::test]
    async fn test_concurrent_requests_retry_independently() {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let transport = Arc::new(TokenRoutedTransport::default());
        let refresher = Arc::new(PerAccountRefresher::default());
        let inner = InMemoryCredentialStore::new(refresher.clone());
        inner
            .add_account(Account::new("a"), AccessToken::new("stale-a"))
            .await;
        inner
            .add_account(Account::new("b"), AccessToken::new("stale-b"))
            .await;
        let store = Arc::new(LoggingStore {
            inner,
            log: log.clone(),
        });

        let client = EpicClient::builder()
            .transport(transport.clone())
            .credentials(store.clone())
            .user_agent("Fortnite/38.10")
            .build()
            .unwrap();

        let (a, b) = tokio::join!(
            client.send_json::<serde_json::Value>(authorized(ACCOUNT_URL, "stale-a")),
            client.send_json::<serde_json::Value>(authorized(ACCOUNT_URL, "stale-b")),
        );
        assert_eq!(a.unwrap()["token"], "fresh-a");
        assert_eq!(b.unwrap()["token"], "fresh-b");
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 2);

        let log = log.lock().unwrap().clone();
        for entry in ["invalidate:a", "refresh:a", "invalidate:b", "refresh:b"] {
            assert_eq!(log.iter().filter(|e| *e == entry).count(), 1, "{}", entry);
        }
        let position = |entry: &str| log.iter().position(|e| e == entry).unwrap();
        assert!(position("invalidate:a") < position("refresh:a"));
        assert!(position("invalidate:b") < position("refresh:b"));

        let sent = transport.requests.lock().unwrap().clone();
        assert_eq!(sent.len(), 4);
        let tokens: Vec<_> = sent.iter().filter_map(|r| r.bearer_token()).collect();
        assert_eq!(tokens.iter().filter(|t| **t == "fresh-a").count(), 1);
        assert_eq!(tokens.iter().filter(|t| **t == "fresh-b").count(), 1);
        assert!(sent.iter().all(|r| r.headers[USER_AGENT] == "Fortnite/38.10"));

        assert_eq!(store.inner.token_for("a").await.unwrap().access_token, "fresh-a");
        assert_eq!(store.inner.token_for("b").await.unwrap().access_token, "fresh-b");
    }
}
