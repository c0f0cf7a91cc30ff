// Realm status monitoring: token lifecycle, polling cadence and delivery policy.
// Platform-agnostic; the Discord and HTTP sides plug in through traits.

pub mod notifier;
pub mod realm_status_api;
pub mod realm_status_models;
pub mod realm_status_service;
pub mod retry;
pub mod token_manager;

pub use notifier::{ChatChannels, LocalAlert, NotifyError};
pub use realm_status_api::{RealmStatusApi, RealmStatusError};
pub use realm_status_models::{
    ChannelTable, DeploymentMode, PopulationType, RealmStatus, StatusReport, TokenGrant,
};
pub use realm_status_service::{PollerConfig, RealmStatusService};
pub use retry::RetryPolicy;
