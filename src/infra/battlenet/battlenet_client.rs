use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::core::realm_status::{
    PopulationType, RealmStatus, RealmStatusApi, RealmStatusError, TokenGrant,
};

/// Endpoints and query parameters for one connected realm.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RealmEndpoint {
    /// Display name used in channel messages.
    pub name: String,
    pub token_url: String,
    pub status_url: String,
    pub namespace: String,
    pub locale: String,
    pub region: String,
}

impl Default for RealmEndpoint {
    fn default() -> Self {
        // 5827 Living Flame; 5828 Crusader Strike
        Self {
            name: "Living Flame".to_string(),
            token_url: "https://eu.battle.net/oauth/token".to_string(),
            status_url: "https://eu.api.blizzard.com/data/wow/connected-realm/5827".to_string(),
            namespace: "dynamic-classic1x-eu".to_string(),
            locale: "en_GB".to_string(),
            region: "eu".to_string(),
        }
    }
}

/// OAuth2 client id/secret pair for the client-credentials flow.
#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Battle.net REST client. Only the two calls the poller needs.
pub struct BattleNetClient {
    client: Client,
    credentials: ClientCredentials,
    endpoint: RealmEndpoint,
}

impl BattleNetClient {
    pub fn new(
        credentials: ClientCredentials,
        endpoint: RealmEndpoint,
        timeout: Duration,
    ) -> Result<Self, RealmStatusError> {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        headers.insert(
            "User-Agent",
            HeaderValue::from_static(concat!("RealmStatusBot/", env!("CARGO_PKG_VERSION"))),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| RealmStatusError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            credentials,
            endpoint,
        })
    }

    /// Turn a non-200 reply into a status error that keeps the body for the logs.
    async fn reject(resp: reqwest::Response) -> RealmStatusError {
        let code = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        RealmStatusError::Status { code, body }
    }
}

#[async_trait]
impl RealmStatusApi for BattleNetClient {
    async fn request_token(&self) -> Result<TokenGrant, RealmStatusError> {
        let resp = self
            .client
            .post(&self.endpoint.token_url)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| RealmStatusError::Transport(e.to_string()))?;

        if resp.status() != StatusCode::OK {
            return Err(Self::reject(resp).await);
        }

        resp.json::<TokenGrant>()
            .await
            .map_err(|e| RealmStatusError::Malformed(e.to_string()))
    }

    async fn fetch_realm_status(&self, access_token: &str) -> Result<RealmStatus, RealmStatusError> {
        let resp = self
            .client
            .get(&self.endpoint.status_url)
            .query(&[
                ("access_token", access_token),
                ("namespace", self.endpoint.namespace.as_str()),
                ("locale", self.endpoint.locale.as_str()),
                ("region", self.endpoint.region.as_str()),
            ])
            .send()
            .await
            .map_err(|e| RealmStatusError::Transport(e.to_string()))?;

        if resp.status() != StatusCode::OK {
            return Err(Self::reject(resp).await);
        }

        let realm: ApiConnectedRealm = resp
            .json()
            .await
            .map_err(|e| RealmStatusError::Malformed(e.to_string()))?;
        realm.into_status()
    }
}

// ============================================================================
// API DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
struct ApiConnectedRealm {
    population: Option<ApiPopulation>,
    has_queue: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ApiPopulation {
    #[serde(rename = "type")]
    kind: Option<String>,
}

impl ApiConnectedRealm {
    fn into_status(self) -> Result<RealmStatus, RealmStatusError> {
        let kind = self
            .population
            .and_then(|p| p.kind)
            .ok_or_else(|| RealmStatusError::Malformed("missing population.type".to_string()))?;

        Ok(RealmStatus {
            population: PopulationType::from(kind.as_str()),
            has_queue: self.has_queue.unwrap_or(false),
        })
    }
}
