// The polling loop's brain. One instance is owned by one background task, so
// the token cache and request counter need no locking.

use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use super::notifier::{ChatChannels, LocalAlert, Notifier};
use super::realm_status_api::{RealmStatusApi, RealmStatusError};
use super::realm_status_models::{
    ChannelTable, DeploymentMode, PollState, RealmStatus, StatusReport,
};
use super::retry::RetryPolicy;
use super::token_manager::TokenManager;
use crate::core::uptime::{format_count, format_elapsed};

/// Cadence knobs. Defaults match the hosted bot.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub interval: StdDuration,
    /// Proactive token expiry check every N ticks.
    pub token_check_every: u64,
    /// Post to the status channel every N ticks.
    pub post_every: u64,
    /// Log the status line every N ticks.
    pub log_every: u64,
    pub refresh_threshold: Duration,
    pub retry: RetryPolicy,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: StdDuration::from_secs(10),
            token_check_every: 60,
            post_every: 6,
            log_every: 60,
            refresh_threshold: Duration::hours(1),
            retry: RetryPolicy::default(),
        }
    }
}

/// Why a tick stopped early.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("Token refresh failed: {0}")]
    Token(RealmStatusError),
    #[error("Realm status query failed: {0}")]
    Status(RealmStatusError),
}

/// What one successful tick did.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub report: StatusReport,
    pub refreshed_token: bool,
    pub posted_status: bool,
    pub alerted: bool,
}

pub struct RealmStatusService<A, C, L>
where
    A: RealmStatusApi,
    C: ChatChannels,
    L: LocalAlert,
{
    api: A,
    notifier: Notifier<C, L>,
    tokens: TokenManager,
    state: PollState,
    config: PollerConfig,
    status_channel: u64,
    alert_channel: u64,
    realm_name: String,
}

impl<A, C, L> RealmStatusService<A, C, L>
where
    A: RealmStatusApi,
    C: ChatChannels,
    L: LocalAlert,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        api: A,
        channels: C,
        local: L,
        mode: DeploymentMode,
        table: &ChannelTable,
        realm_name: impl Into<String>,
        config: PollerConfig,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            api,
            notifier: Notifier::new(channels, local, mode),
            tokens: TokenManager::new(config.refresh_threshold),
            state: PollState::new(started_at),
            status_channel: table.status_channel(mode),
            alert_channel: table.alert,
            realm_name: realm_name.into(),
            config,
        }
    }

    fn banner(&self) -> String {
        format!("🔥{}🔥", self.realm_name)
    }

    /// Status line posted to the status channel.
    pub fn status_message(&self, status: &RealmStatus, now: DateTime<Utc>) -> String {
        format!(
            "{} Status: **{}** elapsed_time: {}; requests: {}",
            self.banner(),
            status.population,
            format_elapsed(self.state.uptime_secs(now)),
            format_count(self.state.request_count)
        )
    }

    /// Run one poll cycle. Any error aborts only this tick.
    pub async fn tick(&mut self, now: DateTime<Utc>) -> Result<TickReport, PollError> {
        self.state.request_count += 1;
        let previous_token = self.tokens.current().cloned();

        if self.state.is_nth_tick(self.config.token_check_every) {
            self.tokens.invalidate_if_expiring(now);
        }

        let access_token = self
            .tokens
            .ensure_token(&self.api, &self.config.retry, now)
            .await
            .map_err(PollError::Token)?
            .value
            .clone();
        let refreshed_token = previous_token.as_ref() != self.tokens.current();

        let api = &self.api;
        let token = access_token.as_str();
        let status = self
            .config
            .retry
            .run("Realm status query", move || api.fetch_realm_status(token))
            .await
            .map_err(PollError::Status)?;

        let message = self.status_message(&status, now);

        if self.state.is_nth_tick(self.config.log_every) {
            tracing::info!("{}", message);
        }

        let posted_status = if self.state.is_nth_tick(self.config.post_every) {
            self.notifier.post_status(self.status_channel, &message).await
        } else {
            false
        };

        let alerted = if status.population.is_available() {
            let alert = format!("@everyone {} Status: **{}**", self.banner(), status.population);
            self.notifier
                .post_alert(
                    self.alert_channel,
                    &alert,
                    &self.banner(),
                    "Realm is not LOCKED!",
                )
                .await
        } else {
            false
        };

        Ok(TickReport {
            report: StatusReport {
                request_count: self.state.request_count,
                status,
                message,
                observed_at: now,
            },
            refreshed_token,
            posted_status,
            alerted,
        })
    }

    /// Tick forever on the configured interval, publishing every successful
    /// report. Missed ticks are skipped, never queued.
    pub async fn run(mut self, reports: watch::Sender<Option<StatusReport>>) {
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            interval_secs = self.config.interval.as_secs(),
            realm = %self.realm_name,
            "Realm status poller started"
        );

        loop {
            ticker.tick().await;
            match self.tick(Utc::now()).await {
                Ok(tick) => {
                    tracing::debug!(
                        request_count = tick.report.request_count,
                        refreshed_token = tick.refreshed_token,
                        posted = tick.posted_status,
                        alerted = tick.alerted,
                        "Realm status tick finished"
                    );
                    reports.send_replace(Some(tick.report));
                }
                Err(err) => tracing::warn!(
                    request_count = self.state.request_count,
                    "Realm status tick aborted: {}",
                    err
                ),
            }
        }
    }
}
