use chrono::{DateTime, Duration, Utc};

use super::realm_status_api::{RealmStatusApi, RealmStatusError};
use super::realm_status_models::BearerToken;
use super::retry::RetryPolicy;

/// Owns the cached bearer token and decides when to exchange credentials again.
pub struct TokenManager {
    token: Option<BearerToken>,
    refresh_threshold: Duration,
}

impl TokenManager {
    pub fn new(refresh_threshold: Duration) -> Self {
        Self {
            token: None,
            refresh_threshold,
        }
    }

    pub fn current(&self) -> Option<&BearerToken> {
        self.token.as_ref()
    }

    /// Drop the cached token if it is inside the refresh window.
    ///
    /// Returns true when a token was discarded.
    pub fn invalidate_if_expiring(&mut self, now: DateTime<Utc>) -> bool {
        let expiring = self
            .token
            .as_ref()
            .is_some_and(|token| !token.is_fresh(now, self.refresh_threshold));

        if expiring {
            tracing::info!("The token is about to expire. Refreshing now.");
            self.token = None;
        }
        expiring
    }

    /// Return a token that is valid for at least the refresh threshold,
    /// exchanging client credentials when the cache is empty or stale.
    ///
    /// On failure the cache is left empty so the next call starts over.
    pub async fn ensure_token<A: RealmStatusApi>(
        &mut self,
        api: &A,
        retry: &RetryPolicy,
        now: DateTime<Utc>,
    ) -> Result<&BearerToken, RealmStatusError> {
        let fresh = self
            .token
            .as_ref()
            .is_some_and(|token| token.is_fresh(now, self.refresh_threshold));

        if !fresh {
            self.token = None;
            tracing::info!("Requesting a new access token");

            let grant = match retry.run("Token request", move || api.request_token()).await {
                Ok(grant) => grant,
                Err(err) => {
                    tracing::error!("Error getting access token: {}", err);
                    return Err(err);
                }
            };

            let expires_in = grant.expires_in;
            let Some(token) = BearerToken::from_grant(grant, now) else {
                let err = RealmStatusError::Malformed(format!(
                    "token grant has unusable expires_in {}",
                    expires_in
                ));
                tracing::error!("Error getting access token: {}", err);
                return Err(err);
            };

            tracing::info!(expires_at = %token.expires_at, "Loaded access token");
            if !token.is_fresh(now, self.refresh_threshold) {
                tracing::warn!(
                    expires_in,
                    refresh_threshold_secs = self.refresh_threshold.num_seconds(),
                    "New access token is already inside the refresh window; it will be replaced on the next tick"
                );
            }
            self.token = Some(token);
        }

        self.token
            .as_ref()
            .ok_or_else(|| RealmStatusError::Malformed("token cache empty after refresh".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::realm_status::realm_status_models::{RealmStatus, TokenGrant};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FakeTokenApi {
        status: Option<u16>,
        expires_in: i64,
        calls: AtomicU32,
    }

    impl FakeTokenApi {
        fn ok() -> Self {
            Self::granting(86_399)
        }

        fn granting(expires_in: i64) -> Self {
            Self {
                status: None,
                expires_in,
                calls: AtomicU32::new(0),
            }
        }

        fn failing(code: u16) -> Self {
            Self {
                status: Some(code),
                expires_in: 86_399,
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RealmStatusApi for FakeTokenApi {
        async fn request_token(&self) -> Result<TokenGrant, RealmStatusError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.status {
                None => Ok(TokenGrant {
                    access_token: "fresh".into(),
                    expires_in: self.expires_in,
                }),
                Some(code) => Err(RealmStatusError::Status {
                    code,
                    body: "denied".into(),
                }),
            }
        }

        async fn fetch_realm_status(&self, _: &str) -> Result<RealmStatus, RealmStatusError> {
            Err(RealmStatusError::Malformed(
                "token tests should not query status".into(),
            ))
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn manager_with(expires_at: DateTime<Utc>) -> TokenManager {
        let mut manager = TokenManager::new(Duration::hours(1));
        manager.token = Some(BearerToken {
            value: "cached".into(),
            expires_at,
        });
        manager
    }

    #[tokio::test]
    async fn token_inside_refresh_window_is_replaced() {
        let api = FakeTokenApi::ok();
        let mut manager = manager_with(now() + Duration::minutes(30));

        let token = manager
            .ensure_token(&api, &RetryPolicy::none(), now())
            .await
            .unwrap();

        assert_eq!(token.value, "fresh");
        assert_eq!(token.expires_at, now() + Duration::seconds(86_399));
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test]
    async fn token_outside_refresh_window_is_kept() {
        let api = FakeTokenApi::ok();
        let mut manager = manager_with(now() + Duration::hours(2));

        let token = manager
            .ensure_token(&api, &RetryPolicy::none(), now())
            .await
            .unwrap();

        assert_eq!(token.value, "cached");
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn missing_token_is_fetched() {
        let api = FakeTokenApi::ok();
        let mut manager = TokenManager::new(Duration::hours(1));

        manager
            .ensure_token(&api, &RetryPolicy::none(), now())
            .await
            .unwrap();

        assert_eq!(manager.current().map(|t| t.value.as_str()), Some("fresh"));
    }

    #[tokio::test]
    async fn rejected_exchange_leaves_cache_empty() {
        for code in [401, 500] {
            let api = FakeTokenApi::failing(code);
            let mut manager = manager_with(now() + Duration::minutes(10));

            let result = manager
                .ensure_token(&api, &RetryPolicy::none(), now())
                .await;

            assert!(matches!(result, Err(RealmStatusError::Status { code: c, .. }) if c == code));
            assert!(manager.current().is_none());
        }
    }

    #[tokio::test]
    async fn unusable_lifetime_is_malformed_and_not_cached() {
        for expires_in in [-5, 10_000_000_000_000] {
            let api = FakeTokenApi::granting(expires_in);
            let mut manager = TokenManager::new(Duration::hours(1));

            let result = manager
                .ensure_token(&api, &RetryPolicy::none(), now())
                .await;

            assert!(matches!(result, Err(RealmStatusError::Malformed(_))));
            assert!(manager.current().is_none());
        }
    }

    #[tokio::test]
    async fn short_lived_grant_is_used_then_replaced_next_call() {
        let api = FakeTokenApi::granting(3_600);
        let mut manager = TokenManager::new(Duration::hours(1));

        let token = manager
            .ensure_token(&api, &RetryPolicy::none(), now())
            .await
            .unwrap();
        assert_eq!(token.value, "fresh");
        assert_eq!(api.calls(), 1);

        manager
            .ensure_token(&api, &RetryPolicy::none(), now() + Duration::seconds(10))
            .await
            .unwrap();
        assert_eq!(api.calls(), 2);
    }

    #[test]
    fn proactive_check_only_clears_expiring_tokens() {
        let mut fresh = manager_with(now() + Duration::hours(2));
        assert!(!fresh.invalidate_if_expiring(now()));
        assert!(fresh.current().is_some());

        let mut stale = manager_with(now() + Duration::minutes(50));
        assert!(stale.invalidate_if_expiring(now()));
        assert!(stale.current().is_none());

        let mut empty = TokenManager::new(Duration::hours(1));
        assert!(!empty.invalidate_if_expiring(now()));
    }
}
