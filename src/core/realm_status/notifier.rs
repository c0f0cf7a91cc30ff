// Delivery side of the poller. The chat platform and the local desktop are
// both behind traits so the posting policy can be tested without either.

use async_trait::async_trait;
use thiserror::Error;

use super::realm_status_models::DeploymentMode;

/// Failures from the chat platform while posting.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The channel or a message in it no longer exists.
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("HTTP error: {0}")]
    Http(String),
}

/// Minimal channel operations the notifier needs from the chat client.
#[async_trait]
pub trait ChatChannels: Send + Sync {
    /// Remove the channel's recent messages.
    async fn clear_channel(&self, channel_id: u64) -> Result<(), NotifyError>;
    async fn send_message(&self, channel_id: u64, content: &str) -> Result<(), NotifyError>;
}

/// Sound and desktop popup on the machine running the bot.
pub trait LocalAlert: Send + Sync {
    fn raise(&self, title: &str, message: &str);
}

/// Best-effort poster: every failure is logged and swallowed.
pub struct Notifier<C: ChatChannels, L: LocalAlert> {
    channels: C,
    local: L,
    mode: DeploymentMode,
}

impl<C, L> Notifier<C, L>
where
    C: ChatChannels,
    L: LocalAlert,
{
    pub fn new(channels: C, local: L, mode: DeploymentMode) -> Self {
        Self {
            channels,
            local,
            mode,
        }
    }

    /// Replace the channel's contents with `message`.
    ///
    /// Returns true when the message was sent.
    pub async fn post_status(&self, channel_id: u64, message: &str) -> bool {
        match self.channels.clear_channel(channel_id).await {
            Ok(()) => {}
            Err(NotifyError::NotFound(detail)) => {
                tracing::error!(channel_id, "Error NotFound: {}", detail);
            }
            Err(err) => {
                tracing::error!(channel_id, "Error HTTPException: {}", err);
                return false;
            }
        }

        match self.channels.send_message(channel_id, message).await {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(channel_id, "Error HTTPException: {}", err);
                false
            }
        }
    }

    /// Broadcast to the alert channel, then ring locally when running in
    /// local mode regardless of how the send went.
    pub async fn post_alert(&self, channel_id: u64, message: &str, title: &str, popup: &str) -> bool {
        let sent = match self.channels.send_message(channel_id, message).await {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(channel_id, "Failed to send alert: {}", err);
                false
            }
        };

        if self.mode.is_local() {
            self.local.raise(title, popup);
        }

        sent
    }
}
