//! Credential capability used by the retry path.
//!
//! The client never owns accounts or tokens. It asks a [`CredentialStore`]
//! which account a rejected bearer token belongs to, invalidates that
//! account's cached token and asks for a forced refresh. Minting tokens (the
//! device-auth grant) is the job of a [`TokenRefresher`] supplied by the host
//! application.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

// ============================================================================
// Types
// ============================================================================

/// An Epic account known to the host application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub account_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Account {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }
}

/// Cached access credential for one account.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: Some("bearer".to_string()),
            expires_at: None,
        }
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Whether the token's recorded expiry has passed. Unknown expiry is not expired.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Utc::now())
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Credential lookup or refresh failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CredentialError {
    /// The refresh flow ran and failed.
    #[error("failed to refresh credential for account {account_id}: {message}")]
    Refresh { account_id: String, message: String },

    /// No refresh flow is available.
    #[error("credential refresh unavailable: {0}")]
    Unavailable(String),
}

// ============================================================================
// Traits
// ============================================================================

/// Mints a new access token for an account, bypassing any cache.
#[async_trait]
pub trait TokenRefresher: Send + Sync + fmt::Debug {
    async fn force_refresh(&self, account: &Account) -> Result<AccessToken, CredentialError>;
}

/// The narrow view of account/token storage the client needs.
#[async_trait]
pub trait CredentialStore: Send + Sync + fmt::Debug {
    /// Account whose cached access token equals `token`.
    async fn lookup_by_token(&self, token: &str) -> Option<Account>;

    /// Drop the cached token of `account_id`.
    async fn invalidate(&self, account_id: &str);

    /// Obtain a fresh token for `account`.
    async fn refresh(&self, account: &Account) -> Result<AccessToken, CredentialError>;
}

pub type SharedCredentialStore = Arc<dyn CredentialStore>;
pub type SharedTokenRefresher = Arc<dyn TokenRefresher>;

/// Refresher for hosts without a device-auth flow. Always fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRefresh;

#[async_trait]
impl TokenRefresher for NoRefresh {
    async fn force_refresh(&self, account: &Account) -> Result<AccessToken, CredentialError> {
        Err(CredentialError::Unavailable(format!(
            "no refresh flow configured for account {}",
            account.account_id
        )))
    }
}

// ============================================================================
// InMemoryCredentialStore
// ============================================================================

/// Ordered account list plus an `account_id -> token` cache.
#[derive(Debug)]
pub struct InMemoryCredentialStore {
    accounts: RwLock<Vec<Account>>,
    tokens: RwLock<HashMap<String, AccessToken>>,
    refresher: SharedTokenRefresher,
}

impl InMemoryCredentialStore {
    pub fn new(refresher: SharedTokenRefresher) -> Self {
        Self {
            accounts: RwLock::new(Vec::new()),
            tokens: RwLock::new(HashMap::new()),
            refresher,
        }
    }

    /// Register an account (keeping list order) and cache its token.
    pub async fn add_account(&self, account: Account, token: AccessToken) {
        let account_id = account.account_id.clone();
        {
            let mut accounts = self.accounts.write().await;
            match accounts.iter_mut().find(|a| a.account_id == account_id) {
                Some(existing) => *existing = account,
                None => accounts.push(account),
            }
        }
        self.insert_token(&account_id, token).await;
    }

    pub async fn insert_token(&self, account_id: &str, token: AccessToken) {
        self.tokens
            .write()
            .await
            .insert(account_id.to_string(), token);
    }

    pub async fn token_for(&self, account_id: &str) -> Option<AccessToken> {
        self.tokens.read().await.get(account_id).cloned()
    }

    pub async fn accounts(&self) -> Vec<Account> {
        self.accounts.read().await.clone()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn lookup_by_token(&self, token: &str) -> Option<Account> {
        let account_id = {
            let tokens = self.tokens.read().await;
            tokens
                .iter()
                .find(|(_, cached)| cached.access_token == token)
                .map(|(account_id, _)| account_id.clone())?
        };

        self.accounts
            .read()
            .await
            .iter()
            .find(|a| a.account_id == account_id)
            .cloned()
    }

    async fn invalidate(&self, account_id: &str) {
        if self.tokens.write().await.remove(account_id).is_some() {
            tracing::debug!(account_id, "invalidated cached access token");
        }
    }

    async fn refresh(&self, account: &Account) -> Result<AccessToken, CredentialError> {
        let token = self.refresher.force_refresh(account).await?;
        self.insert_token(&account.account_id, token.clone()).await;
        tracing::debug!(account_id = %account.account_id, "access token refreshed");
        Ok(token)
    }
}
