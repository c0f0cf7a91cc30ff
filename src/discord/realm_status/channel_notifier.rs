// Serenity-backed implementation of the poller's chat channel operations.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use poise::serenity_prelude as serenity;

use crate::core::realm_status::{ChatChannels, NotifyError};

/// How many recent messages one purge looks at.
const PURGE_LIMIT: u8 = 100;
/// Discord refuses bulk deletes of messages older than two weeks.
const BULK_DELETE_MAX_AGE_SECS: i64 = 14 * 24 * 60 * 60;

pub struct SerenityChannels {
    http: Arc<serenity::Http>,
}

impl SerenityChannels {
    pub fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }
}

/// 404s mean the channel or message is already gone.
fn map_error(err: serenity::Error) -> NotifyError {
    if let serenity::Error::Http(http_err) = &err {
        if http_err.status_code().map(|code| code.as_u16()) == Some(404) {
            return NotifyError::NotFound(err.to_string());
        }
    }
    NotifyError::Http(err.to_string())
}

/// Split message ids into those that can be bulk deleted and those that
/// have to go one at a time.
fn split_by_age(
    messages: &[(serenity::MessageId, i64)],
    now_secs: i64,
) -> (Vec<serenity::MessageId>, Vec<serenity::MessageId>) {
    let cutoff = now_secs - BULK_DELETE_MAX_AGE_SECS;
    let (recent, old): (Vec<(serenity::MessageId, i64)>, Vec<(serenity::MessageId, i64)>) =
        messages.iter().copied().partition(|(_, sent)| *sent > cutoff);
    (
        recent.into_iter().map(|(id, _)| id).collect(),
        old.into_iter().map(|(id, _)| id).collect(),
    )
}

#[async_trait]
impl ChatChannels for SerenityChannels {
    async fn clear_channel(&self, channel_id: u64) -> Result<(), NotifyError> {
        let channel = serenity::ChannelId::new(channel_id);
        let messages = channel
            .messages(&self.http, serenity::GetMessages::new().limit(PURGE_LIMIT))
            .await
            .map_err(map_error)?;

        let stamped: Vec<_> = messages
            .iter()
            .map(|m| (m.id, m.timestamp.unix_timestamp()))
            .collect();
        let (recent, old) = split_by_age(&stamped, Utc::now().timestamp());

        match recent.len() {
            0 => {}
            1 => channel
                .delete_message(&self.http, recent[0])
                .await
                .map_err(map_error)?,
            _ => {
                let body = serde_json::json!({ "messages": recent });
                self.http
                    .delete_messages(channel, &body, None)
                    .await
                    .map_err(map_error)?;
            }
        }

        for message_id in old {
            channel
                .delete_message(&self.http, message_id)
                .await
                .map_err(map_error)?;
        }

        tracing::debug!(channel_id, deleted = messages.len(), "Purged channel");
        Ok(())
    }

    async fn send_message(&self, channel_id: u64, content: &str) -> Result<(), NotifyError> {
        serenity::ChannelId::new(channel_id)
            .say(&self.http, content)
            .await
            .map_err(map_error)?;
        Ok(())
    }
}
