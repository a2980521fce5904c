//! Authenticated HTTP client for Epic Games services.
//!
//! Wraps a transport with the behaviour the game client expects from the
//! platform API:
//!
//! - every request carries the game's user-agent (derived from the installed
//!   launcher manifest, see [`fortkit_manifest`]) unless the caller set one;
//! - requests to the protected domain (`epicgames.com`) whose bearer token is
//!   rejected are retried once with a freshly refreshed token;
//! - Epic error payloads on protected requests surface as [`EpicApiError`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use fortkit_client::{Account, AccessToken, ApiRequest, EpicClient, InMemoryCredentialStore, NoRefresh};
//!
//! # async fn example() -> fortkit_client::Result<()> {
//! let store = Arc::new(InMemoryCredentialStore::new(Arc::new(NoRefresh)));
//! store
//!     .add_account(Account::new("abc123"), AccessToken::new("token"))
//!     .await;
//!
//! let client = EpicClient::builder().credentials(store).build()?;
//!
//! let request = ApiRequest::get(
//!     "https://account-public-service-prod.ol.epicgames.com/account/api/public/account/abc123",
//! )?
//! .bearer("token")?;
//! let account: serde_json::Value = client.send_json(request).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod credentials;
pub mod domain_error;
pub mod error;
pub mod request;
pub mod transport;
pub mod user_agent;

pub use client::{ClientBuilder, ClientConfig, DEFAULT_PROTECTED_DOMAIN, DEFAULT_TIMEOUT, EpicClient};
pub use credentials::{
    AccessToken, Account, CredentialError, CredentialStore, InMemoryCredentialStore, NoRefresh,
    SharedCredentialStore, SharedTokenRefresher, TokenRefresher,
};
pub use domain_error::{ACCESS_TOKEN_VALIDATION_ERRORS, DomainErrorClass, EpicApiError, EpicErrorPayload};
pub use error::{Error, Result};
pub use request::{ApiRequest, ApiResponse};
pub use transport::{ReqwestTransport, SharedTransport, Transport, TransportError};
pub use user_agent::{FixedUserAgent, SharedUserAgentSource, UserAgentSource};
