// Startup configuration: the required JSON file plus environment secrets.
// Both are read once in main and injected into the services; nothing reads
// the environment ad hoc after startup.

use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;

use chrono::Duration;
use serde::Deserialize;
use thiserror::Error;

use crate::core::realm_status::{ChannelTable, DeploymentMode, PollerConfig, RetryPolicy};
use crate::infra::battlenet::{ClientCredentials, RealmEndpoint};
use crate::infra::local_alert::LocalAlertSettings;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("'{0}' not found! Please add it and try again.")]
    Missing(String),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid setting `{0}`: {1}")]
    Invalid(&'static str, String),
    #[error("Missing {0} environment variable! Create a .env file with your bot token.")]
    MissingEnv(&'static str),
}

/// Contents of `config.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    pub prefix: String,
    #[serde(default)]
    pub realm: RealmEndpoint,
    #[serde(default)]
    pub channels: ChannelTable,
    #[serde(default)]
    pub poller: PollerSettings,
    #[serde(default)]
    pub local_alert: LocalAlertSettings,
    #[serde(default = "default_presence_statuses")]
    pub presence_statuses: Vec<String>,
}

fn default_presence_statuses() -> Vec<String> {
    vec![
        "with you!".to_string(),
        "with Krypton!".to_string(),
        "with humans!".to_string(),
    ]
}

/// A day, the lifetime Battle.net grants.
const MAX_REFRESH_THRESHOLD_SECS: i64 = 24 * 60 * 60;
/// Token exchange plus status query.
const CALLS_PER_TICK: u32 = 2;

/// Poller cadence as written in the config file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PollerSettings {
    pub interval_secs: u64,
    pub token_check_every: u64,
    pub post_every: u64,
    pub log_every: u64,
    pub refresh_threshold_secs: i64,
    pub http_timeout_secs: u64,
    pub retry_attempts: u32,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            token_check_every: 60,
            post_every: 6,
            log_every: 60,
            refresh_threshold_secs: 60 * 60,
            http_timeout_secs: 2,
            retry_attempts: 2,
        }
    }
}

impl PollerSettings {
    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            interval: StdDuration::from_secs(self.interval_secs),
            token_check_every: self.token_check_every,
            post_every: self.post_every,
            log_every: self.log_every,
            refresh_threshold: Duration::seconds(self.refresh_threshold_secs),
            retry: RetryPolicy {
                max_attempts: self.retry_attempts,
                ..RetryPolicy::default()
            },
        }
    }

    pub fn http_timeout(&self) -> StdDuration {
        StdDuration::from_secs(self.http_timeout_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("poller.interval_secs", self.interval_secs),
            ("poller.token_check_every", self.token_check_every),
            ("poller.post_every", self.post_every),
            ("poller.log_every", self.log_every),
            ("poller.http_timeout_secs", self.http_timeout_secs),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid(name, "must be greater than zero".into()));
            }
        }
        if !(0..=MAX_REFRESH_THRESHOLD_SECS).contains(&self.refresh_threshold_secs) {
            return Err(ConfigError::Invalid(
                "poller.refresh_threshold_secs",
                format!("must be between 0 and {}", MAX_REFRESH_THRESHOLD_SECS),
            ));
        }

        // A tick makes two calls (token, then status); both must fit in one
        // interval or ticks get skipped and the posting cadence drifts.
        let per_call = self.poller_config().retry.worst_case(self.http_timeout());
        let tick_budget = per_call.saturating_mul(CALLS_PER_TICK);
        let interval = StdDuration::from_secs(self.interval_secs);
        if tick_budget >= interval {
            return Err(ConfigError::Invalid(
                "poller",
                format!(
                    "{} retry attempts with a {}s HTTP timeout can take {:.1}s per tick, \
                     which does not fit in interval_secs = {}",
                    self.retry_attempts,
                    self.http_timeout_secs,
                    tick_budget.as_secs_f64(),
                    self.interval_secs
                ),
            ));
        }
        Ok(())
    }
}

impl BotConfig {
    /// Load and validate the config file. A missing file is its own error so
    /// main can print the friendly message.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.is_file() {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            return Err(ConfigError::Missing(name));
        }

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: BotConfig = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if config.prefix.trim().is_empty() {
            return Err(ConfigError::Invalid("prefix", "must not be empty".into()));
        }
        config.poller.validate()?;
        Ok(config)
    }
}

/// Secrets and flags that come from the environment.
#[derive(Debug, Clone)]
pub struct EnvSettings {
    pub discord_token: String,
    pub credentials: ClientCredentials,
    pub mode: DeploymentMode,
}

impl EnvSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Missing OAuth credentials are not fatal:
    /// the token exchange will fail and be logged on every tick instead.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let discord_token = lookup("DISCORD_TOKEN")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingEnv("DISCORD_TOKEN"))?;

        let credential = |key: &'static str| {
            lookup(key).unwrap_or_else(|| {
                tracing::warn!("{} is not set; realm status token requests will fail", key);
                String::new()
            })
        };
        let credentials = ClientCredentials {
            client_id: credential("CLIENT_ID"),
            client_secret: credential("CLIENT_SECRET"),
        };

        let mode = DeploymentMode::from_flag(lookup("LOCAL").as_deref());

        Ok(Self {
            discord_token,
            credentials,
            mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn write_config(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("config.json");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn missing_file_has_friendly_message() {
        let dir = tempfile::tempdir().unwrap();
        let err = BotConfig::load(dir.path().join("config.json")).unwrap_err();

        assert!(matches!(err, ConfigError::Missing(_)));
        assert_eq!(
            err.to_string(),
            "'config.json' not found! Please add it and try again."
        );
    }

    #[test]
    fn minimal_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, r#"{ "prefix": "!" }"#);

        let config = BotConfig::load(&path).unwrap();

        assert_eq!(config.prefix, "!");
        assert_eq!(config.realm, RealmEndpoint::default());
        assert_eq!(config.channels, ChannelTable::default());
        assert_eq!(config.poller, PollerSettings::default());
        assert_eq!(config.presence_statuses.len(), 3);

        let poller = config.poller.poller_config();
        assert_eq!(poller.interval, StdDuration::from_secs(10));
        assert_eq!(poller.post_every, 6);
        assert_eq!(poller.token_check_every, 60);
        assert_eq!(poller.refresh_threshold, Duration::hours(1));
    }

    #[test]
    fn partial_blocks_merge_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"{
                "prefix": "?",
                "realm": { "name": "Crusader Strike", "status_url": "https://example.test/5828" },
                "channels": { "alert": 42 },
                "poller": { "post_every": 3 }
            }"#,
        );

        let config = BotConfig::load(&path).unwrap();

        assert_eq!(config.realm.name, "Crusader Strike");
        assert_eq!(config.realm.namespace, "dynamic-classic1x-eu");
        assert_eq!(config.channels.alert, 42);
        assert_eq!(
            config.channels.status_hosted,
            ChannelTable::default().status_hosted
        );
        assert_eq!(config.poller.post_every, 3);
        assert_eq!(config.poller.log_every, 60);
    }

    #[test]
    fn missing_prefix_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, r#"{ "realm": {} }"#);

        assert!(matches!(
            BotConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, r#"{ "prefix": "!", "poller": { "interval_secs": 0 } }"#);

        assert!(matches!(
            BotConfig::load(&path),
            Err(ConfigError::Invalid("poller.interval_secs", _))
        ));
    }

    #[test]
    fn retry_budget_must_fit_in_one_interval() {
        let dir = tempfile::tempdir().unwrap();
        // 3 attempts x 5s + 1.5s backoff, twice per tick: 33s against 10s.
        let path = write_config(
            &dir,
            r#"{ "prefix": "!", "poller": { "http_timeout_secs": 5, "retry_attempts": 3 } }"#,
        );

        assert!(matches!(
            BotConfig::load(&path),
            Err(ConfigError::Invalid("poller", _))
        ));

        let path = write_config(
            &dir,
            r#"{ "prefix": "!", "poller": { "interval_secs": 60, "http_timeout_secs": 5, "retry_attempts": 3 } }"#,
        );
        assert!(BotConfig::load(&path).is_ok());
    }

    #[test]
    fn default_retry_budget_fits_default_interval() {
        let settings = PollerSettings::default();
        let per_call = settings.poller_config().retry.worst_case(settings.http_timeout());
        assert!(per_call * CALLS_PER_TICK < StdDuration::from_secs(settings.interval_secs));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn oversized_refresh_threshold_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"{ "prefix": "!", "poller": { "refresh_threshold_secs": 9000000000000000 } }"#,
        );

        assert!(matches!(
            BotConfig::load(&path),
            Err(ConfigError::Invalid("poller.refresh_threshold_secs", _))
        ));
    }

    #[test]
    fn env_settings_require_discord_token() {
        let vars: HashMap<&str, &str> = HashMap::new();
        let err = EnvSettings::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv("DISCORD_TOKEN")));
    }

    #[test]
    fn env_settings_read_credentials_and_mode() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("DISCORD_TOKEN", "bot-token"),
            ("CLIENT_ID", "id"),
            ("CLIENT_SECRET", "secret"),
            ("LOCAL", "HOSTED2"),
        ]);

        let env = EnvSettings::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(env.discord_token, "bot-token");
        assert_eq!(env.credentials.client_id, "id");
        assert_eq!(env.credentials.client_secret, "secret");
        assert_eq!(env.mode, DeploymentMode::Hosted2);
    }

    #[test]
    fn missing_credentials_fall_back_to_empty() {
        let vars: HashMap<&str, &str> = HashMap::from([("DISCORD_TOKEN", "bot-token")]);

        let env = EnvSettings::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();

        assert!(env.credentials.client_id.is_empty());
        assert_eq!(env.mode, DeploymentMode::Hosted);
    }
}
