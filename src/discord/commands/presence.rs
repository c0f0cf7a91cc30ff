// This module handles bot presence and lifecycle events.
//
// Everything here is Discord-layer glue: pick a status line and hand it to
// the gateway. The list of lines comes from the config file.

use poise::serenity_prelude as serenity;
use rand::seq::SliceRandom;
use std::time::Duration;

const ROTATION_INTERVAL: Duration = Duration::from_secs(60);

/// Shows "Playing <text>" on the bot's profile.
pub fn set_playing(ctx: &serenity::Context, text: &str) {
    let activity = serenity::ActivityData::playing(text);
    ctx.set_presence(Some(activity), serenity::OnlineStatus::Online);
}

/// Pick a random status line, if there are any.
pub fn pick_status(statuses: &[String]) -> Option<&str> {
    statuses
        .choose(&mut rand::thread_rng())
        .map(String::as_str)
}

/// Called once the bot is ready. Starts rotating through `statuses` every
/// minute; an empty list leaves the presence alone.
pub fn on_ready(ctx: &serenity::Context, statuses: Vec<String>) {
    if statuses.is_empty() {
        return;
    }

    let ctx = ctx.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(ROTATION_INTERVAL);
        loop {
            ticker.tick().await;
            if let Some(status) = pick_status(&statuses) {
                set_playing(&ctx, status);
            }
        }
    });
}
