use async_trait::async_trait;
use thiserror::Error;

use super::realm_status_models::{RealmStatus, TokenGrant};

/// Failures talking to the OAuth2 token endpoint or the realm-status endpoint.
#[derive(Debug, Error)]
pub enum RealmStatusError {
    #[error("Connection error: {0}")]
    Transport(String),
    #[error("Unexpected response: {code} - {body}")]
    Status { code: u16, body: String },
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl RealmStatusError {
    /// Transport failures, rate limiting and server errors may clear up on a
    /// second attempt. Everything else will fail the same way again.
    pub fn is_transient(&self) -> bool {
        match self {
            RealmStatusError::Transport(_) => true,
            RealmStatusError::Status { code, .. } => *code == 429 || *code >= 500,
            RealmStatusError::Malformed(_) => false,
        }
    }
}

/// The two external calls the poller needs.
#[async_trait]
pub trait RealmStatusApi: Send + Sync {
    /// Client-credentials exchange against the token endpoint.
    async fn request_token(&self) -> Result<TokenGrant, RealmStatusError>;

    /// Query the realm-status endpoint with a bearer token.
    async fn fetch_realm_status(&self, access_token: &str) -> Result<RealmStatus, RealmStatusError>;
}
