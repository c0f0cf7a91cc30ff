// Commands for the realm status monitor.
//
// Same pattern as everywhere else in this layer: read from the shared data,
// call a pure helper for the text, send the reply. The poller's state is only
// seen through the watch channel it publishes to.

use crate::core::realm_status::StatusReport;
use crate::core::uptime::{format_count, format_elapsed};
use chrono::{DateTime, Utc};
use poise::serenity_prelude as serenity;
use tokio::sync::watch;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Shared data available to every command.
pub struct Data {
    pub started_at: DateTime<Utc>,
    pub realm_name: String,
    pub latest_status: watch::Receiver<Option<StatusReport>>,
}

impl Data {
    pub fn uptime_secs(&self) -> u64 {
        (Utc::now() - self.started_at).num_seconds().max(0) as u64
    }
}

/// Show the most recent realm status seen by the poller.
#[poise::command(slash_command, prefix_command)]
pub async fn realm(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();
    // Clone out of the watch so the borrow is not held across the send.
    let latest = data.latest_status.borrow().clone();

    let mut embed = serenity::CreateEmbed::new()
        .title(format!("🔥{}🔥", data.realm_name))
        .description(describe_report(latest.as_ref()))
        .color(realm_color(latest.as_ref()))
        .timestamp(serenity::Timestamp::now());

    if let Some(report) = &latest {
        embed = embed
            .field("Queue", if report.status.has_queue { "Yes" } else { "No" }, true)
            .field("Requests", format_count(report.request_count), true)
            .field("Last checked", format!("<t:{}:R>", report.observed_at.timestamp()), true);
    }

    embed = embed.footer(serenity::CreateEmbedFooter::new(format!(
        "Uptime: {}",
        format_elapsed(data.uptime_secs())
    )));

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// How long the bot has been running.
#[poise::command(slash_command, prefix_command, user_cooldown = 10)]
pub async fn uptime(ctx: Context<'_>) -> Result<(), Error> {
    let elapsed = format_elapsed(ctx.data().uptime_secs());
    ctx.say(format!("⏱️ Up for {}", elapsed)).await?;
    Ok(())
}

/// Embed description for the latest report.
pub fn describe_report(report: Option<&StatusReport>) -> String {
    match report {
        Some(report) if report.status.population.is_available() => {
            format!("Status: **{}** - the realm is open!", report.status.population)
        }
        Some(report) => format!("Status: **{}**", report.status.population),
        None => "No status received yet. The first check runs shortly after startup.".to_string(),
    }
}

fn realm_color(report: Option<&StatusReport>) -> serenity::Color {
    match report {
        Some(report) if report.status.population.is_available() => serenity::Color::from_rgb(0, 255, 0),
        Some(_) => serenity::Color::RED,
        None => serenity::Color::LIGHT_GREY,
    }
}
