use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Short-lived credential from the client-credentials exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl BearerToken {
    /// Build a token from a grant received at `now`. Returns `None` when
    /// `expires_in` is negative or pushes the expiry past what a timestamp
    /// can hold.
    pub fn from_grant(grant: TokenGrant, now: DateTime<Utc>) -> Option<Self> {
        if grant.expires_in < 0 {
            return None;
        }
        let lifetime = Duration::try_seconds(grant.expires_in)?;
        let expires_at = now.checked_add_signed(lifetime)?;
        Some(Self {
            value: grant.access_token,
            expires_at,
        })
    }

    /// True while `now` is still outside the refresh window before expiry.
    pub fn is_fresh(&self, now: DateTime<Utc>, refresh_threshold: Duration) -> bool {
        self.expires_at
            .checked_sub_signed(refresh_threshold)
            .is_some_and(|refresh_at| now < refresh_at)
    }
}

/// The token endpoint's answer, stripped down to what we use.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub expires_in: i64,
}

/// Population type reported by the realm API.
///
/// Only `LOCKED` and `OFFLINE` mean the realm is unavailable. Everything else
/// is kept verbatim so the status line shows exactly what the API said.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopulationType {
    Locked,
    Offline,
    Other(String),
}

impl PopulationType {
    pub fn is_available(&self) -> bool {
        matches!(self, PopulationType::Other(_))
    }
}

impl From<&str> for PopulationType {
    fn from(raw: &str) -> Self {
        match raw {
            "LOCKED" => PopulationType::Locked,
            "OFFLINE" => PopulationType::Offline,
            other => PopulationType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for PopulationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PopulationType::Locked => f.write_str("LOCKED"),
            PopulationType::Offline => f.write_str("OFFLINE"),
            PopulationType::Other(raw) => f.write_str(raw),
        }
    }
}

/// Availability snapshot derived from one realm-status response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealmStatus {
    pub population: PopulationType,
    pub has_queue: bool,
}

/// Counters that live for the whole process and drive the posting cadence.
#[derive(Debug, Clone)]
pub struct PollState {
    pub request_count: u64,
    pub started_at: DateTime<Utc>,
}

impl PollState {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            request_count: 0,
            started_at,
        }
    }

    /// Seconds since start, clamped at zero if the clock went backwards.
    pub fn uptime_secs(&self, now: DateTime<Utc>) -> u64 {
        (now - self.started_at).num_seconds().max(0) as u64
    }

    /// True on ticks 1, 1 + every, 1 + 2*every, ...
    pub fn is_nth_tick(&self, every: u64) -> bool {
        every > 0 && self.request_count % every == 1 % every
    }
}

/// Which set of channels and local side effects a running instance uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentMode {
    Local,
    Hosted,
    Hosted2,
}

impl DeploymentMode {
    /// Parse the `LOCAL` environment flag. Unknown or missing values mean Hosted.
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag {
            Some("LOCAL") => DeploymentMode::Local,
            Some("HOSTED2") => DeploymentMode::Hosted2,
            _ => DeploymentMode::Hosted,
        }
    }

    pub fn is_local(self) -> bool {
        self == DeploymentMode::Local
    }
}

/// Channel ids the poller writes to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChannelTable {
    pub guild_id: u64,
    pub status_local: u64,
    pub status_hosted: u64,
    pub status_hosted2: u64,
    pub alert: u64,
}

impl Default for ChannelTable {
    fn default() -> Self {
        Self {
            guild_id: 1187848575435157685,
            status_local: 1187859524376342598,
            status_hosted: 1187902358299091004,
            status_hosted2: 1188091059323019284,
            alert: 1187859369493266432,
        }
    }
}

impl ChannelTable {
    pub fn status_channel(&self, mode: DeploymentMode) -> u64 {
        match mode {
            DeploymentMode::Local => self.status_local,
            DeploymentMode::Hosted => self.status_hosted,
            DeploymentMode::Hosted2 => self.status_hosted2,
        }
    }
}

/// Result of a successful tick, shared with the command layer.
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub request_count: u64,
    pub status: RealmStatus,
    pub message: String,
    pub observed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn only_locked_and_offline_are_unavailable() {
        assert!(!PopulationType::from("LOCKED").is_available());
        assert!(!PopulationType::from("OFFLINE").is_available());
        assert!(PopulationType::from("FULL").is_available());
        assert!(PopulationType::from("UP").is_available());
        assert_eq!(PopulationType::from("FULL").to_string(), "FULL");
    }

    #[test]
    fn deployment_mode_parsing() {
        assert_eq!(DeploymentMode::from_flag(Some("LOCAL")), DeploymentMode::Local);
        assert_eq!(
            DeploymentMode::from_flag(Some("HOSTED2")),
            DeploymentMode::Hosted2
        );
        assert_eq!(
            DeploymentMode::from_flag(Some("anything")),
            DeploymentMode::Hosted
        );
        assert_eq!(DeploymentMode::from_flag(None), DeploymentMode::Hosted);
    }

    #[test]
    fn channel_table_selects_by_mode() {
        let table = ChannelTable::default();
        assert_eq!(table.status_channel(DeploymentMode::Local), table.status_local);
        assert_eq!(
            table.status_channel(DeploymentMode::Hosted),
            table.status_hosted
        );
        assert_eq!(
            table.status_channel(DeploymentMode::Hosted2),
            table.status_hosted2
        );
    }

    #[test]
    fn token_freshness_respects_threshold() {
        let now = at(1_000_000);
        let threshold = Duration::hours(1);

        let soon = BearerToken {
            value: "a".into(),
            expires_at: now + Duration::minutes(30),
        };
        let later = BearerToken {
            value: "b".into(),
            expires_at: now + Duration::hours(2),
        };

        assert!(!soon.is_fresh(now, threshold));
        assert!(later.is_fresh(now, threshold));
    }

    #[test]
    fn grant_expiry_is_relative_to_receipt() {
        let now = at(1_000_000);
        let token = BearerToken::from_grant(
            TokenGrant {
                access_token: "abc".into(),
                expires_in: 86_399,
            },
            now,
        )
        .unwrap();

        assert_eq!(token.value, "abc");
        assert_eq!(token.expires_at, now + Duration::seconds(86_399));
    }

    #[test]
    fn unusable_grant_lifetimes_are_rejected() {
        let now = at(1_000_000);
        for expires_in in [-1, 10_000_000_000_000, i64::MAX] {
            let grant = TokenGrant {
                access_token: "abc".into(),
                expires_in,
            };
            assert!(
                BearerToken::from_grant(grant, now).is_none(),
                "expires_in {} should be rejected",
                expires_in
            );
        }
    }

    #[test]
    fn nth_tick_matches_count_modulo() {
        let mut state = PollState::new(at(0));
        let mut hits = Vec::new();
        for _ in 0..13 {
            state.request_count += 1;
            if state.is_nth_tick(6) {
                hits.push(state.request_count);
            }
        }
        assert_eq!(hits, vec![1, 7, 13]);
    }

    #[test]
    fn every_tick_when_cadence_is_one() {
        let mut state = PollState::new(at(0));
        state.request_count = 5;
        assert!(state.is_nth_tick(1));
    }
}
