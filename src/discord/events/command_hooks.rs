// Command lifecycle hooks: gateway events, command completion and command
// errors. User-facing failures get a short red embed; everything else is
// handed back to poise's default handler.

use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;
use std::time::Duration;

const ERROR_COLOR: u32 = 0xE02B2B;

/// Non-command gateway events.
pub async fn event_handler(
    _ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    _data: &Data,
) -> Result<(), Error> {
    if let serenity::FullEvent::Ready { data_about_bot } = event {
        tracing::info!("Logged in as {}", data_about_bot.user.name);
        tracing::info!("Bot version: {}", env!("CARGO_PKG_VERSION"));
        tracing::info!(
            "Running on: {} ({})",
            std::env::consts::OS,
            std::env::consts::ARCH
        );
        tracing::info!("-------------------");
    }

    Ok(())
}

/// Runs after every successfully executed command.
pub async fn on_command_completion(ctx: poise::Context<'_, Data, Error>) {
    let command = &ctx.command().qualified_name;
    let author = ctx.author();

    let guild = ctx.guild_id().map(|guild_id| {
        let name = ctx
            .guild()
            .map(|g| g.name.clone())
            .unwrap_or_else(|| "Unknown guild".to_string());
        (name, guild_id.get())
    });

    tracing::info!(
        "{}",
        completion_line(
            command,
            guild.as_ref().map(|(name, id)| (name.as_str(), *id)),
            &author.name,
            author.id.get(),
        )
    );
}

/// Framework error handler.
pub async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::CooldownHit {
            remaining_cooldown,
            ctx,
            ..
        } => {
            reply_error(ctx, None, cooldown_description(remaining_cooldown)).await;
        }
        poise::FrameworkError::NotAnOwner { ctx, .. } => {
            reply_error(ctx, None, "You are not the owner of the bot!".to_string()).await;
            tracing::warn!(
                "{} (ID: {}) tried to execute an owner only command {}, but the user is not an owner of the bot.",
                ctx.author().name,
                ctx.author().id,
                location(ctx)
            );
        }
        poise::FrameworkError::MissingUserPermissions {
            missing_permissions,
            ctx,
            ..
        } => {
            let names = missing_permissions
                .map(permission_names)
                .unwrap_or_else(|| "unknown".to_string());
            reply_error(
                ctx,
                None,
                format!(
                    "You are missing the permission(s) `{}` to execute this command!",
                    names
                ),
            )
            .await;
        }
        poise::FrameworkError::MissingBotPermissions {
            missing_permissions,
            ctx,
            ..
        } => {
            reply_error(
                ctx,
                None,
                format!(
                    "I am missing the permission(s) `{}` to fully perform this command!",
                    permission_names(missing_permissions)
                ),
            )
            .await;
        }
        poise::FrameworkError::ArgumentParse { error, ctx, .. } => {
            reply_error(ctx, Some("Error!"), capitalize(&error.to_string())).await;
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                tracing::error!("Error while handling error: {}", e);
            }
        }
    }
}

async fn reply_error(ctx: poise::Context<'_, Data, Error>, title: Option<&str>, description: String) {
    let mut embed = serenity::CreateEmbed::new()
        .description(description)
        .color(ERROR_COLOR);
    if let Some(title) = title {
        embed = embed.title(title);
    }

    if let Err(e) = ctx.send(poise::CreateReply::default().embed(embed)).await {
        tracing::warn!("Failed to send error embed: {}", e);
    }
}

fn location(ctx: poise::Context<'_, Data, Error>) -> String {
    match ctx.guild_id() {
        Some(guild_id) => {
            let name = ctx
                .guild()
                .map(|g| g.name.clone())
                .unwrap_or_else(|| "Unknown guild".to_string());
            format!("in the guild {} (ID: {})", name, guild_id)
        }
        None => "in the bot's DMs".to_string(),
    }
}

fn permission_names(permissions: serenity::Permissions) -> String {
    permissions.get_permission_names().join(", ")
}

/// Log line for a finished command. Only the top-level command name is shown.
pub fn completion_line(
    qualified_name: &str,
    guild: Option<(&str, u64)>,
    author_name: &str,
    author_id: u64,
) -> String {
    let executed = qualified_name.split(' ').next().unwrap_or(qualified_name);
    match guild {
        Some((guild_name, guild_id)) => format!(
            "Executed {} command in {} (ID: {}) by {} (ID: {})",
            executed, guild_name, guild_id, author_name, author_id
        ),
        None => format!(
            "Executed {} command by {} (ID: {}) in DMs",
            executed, author_name, author_id
        ),
    }
}

/// Text shown when a user hits a cooldown. Zero-valued units are left out.
pub fn cooldown_description(remaining: Duration) -> String {
    let total = remaining.as_secs_f64().round() as u64;
    let hours = (total / 3600) % 24;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    let parts: Vec<String> = [(hours, "hours"), (minutes, "minutes"), (seconds, "seconds")]
        .iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| format!("{} {}", value, unit))
        .collect();

    let wait = if parts.is_empty() {
        "a moment".to_string()
    } else {
        parts.join(" ")
    };

    format!(
        "**Please slow down** - You can use this command again in {}.",
        wait
    )
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
