// This is the entry point of the Discord bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (HTTP APIs, config, local side effects)
// - `discord/` = Discord-specific adapters (commands, events, channel posting)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Start the background realm status poller

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::core::realm_status::RealmStatusService;
use crate::discord::channel_notifier::SerenityChannels;
use crate::discord::command_hooks;
use crate::discord::commands::presence;
use crate::discord::{Data, Error};
use crate::infra::battlenet::BattleNetClient;
use crate::infra::config::{BotConfig, EnvSettings, DEFAULT_CONFIG_PATH};
use crate::infra::local_alert::DesktopAlert;
use crate::infra::logging::{init_logging, DEFAULT_LOG_FILE};
use anyhow::Context as _;
use chrono::Utc;
use poise::serenity_prelude as serenity;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Console + discord.log, so we can see what's happening
    init_logging(DEFAULT_LOG_FILE).context("Failed to open the log file")?;

    // The config file is the one thing we refuse to start without.
    let config_path =
        std::env::var("BOT_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = BotConfig::load(&config_path)?;
    let env = EnvSettings::from_env()?;

    tracing::info!(
        mode = ?env.mode,
        realm = %config.realm.name,
        guild_id = config.channels.guild_id,
        "Configuration loaded"
    );

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // This is the "composition root" where we wire everything together.

    let started_at = Utc::now();
    let (status_tx, status_rx) = watch::channel(None);

    let realm_client = BattleNetClient::new(
        env.credentials.clone(),
        config.realm.clone(),
        config.poller.http_timeout(),
    )
    .context("Failed to create Battle.net API client")?;
    let local_alert = DesktopAlert::new(config.local_alert.clone());

    // Create the data structure that will be shared across all commands
    let data = Data {
        started_at,
        realm_name: config.realm.name.clone(),
        latest_status: status_rx,
    };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    // Prefix commands need MESSAGE_CONTENT (privileged); slash commands and
    // mention-prefixed commands work without it.
    let intents = serenity::GatewayIntents::non_privileged();

    let prefix = config.prefix.clone();
    let token = env.discord_token.clone();

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                discord::commands::realm::realm(),
                discord::commands::realm::uptime(),
                discord::commands::help::help(),
            ],
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(prefix),
                mention_as_prefix: true,
                ignore_bots: true,
                ..Default::default()
            },
            on_error: |error| Box::pin(command_hooks::on_error(error)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(command_hooks::event_handler(ctx, event, framework, data))
            },
            // Hook to run after every command
            post_command: |ctx| Box::pin(command_hooks::on_command_completion(ctx)),
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                tracing::info!("Bot is starting up...");

                // Register slash commands globally (can take up to an hour to propagate)
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                tracing::info!("Commands registered");

                presence::on_ready(ctx, config.presence_statuses.clone());

                // Background realm status poller. Runs every poller.interval_secs.
                let service = RealmStatusService::new(
                    realm_client,
                    SerenityChannels::new(ctx.http.clone()),
                    local_alert,
                    env.mode,
                    &config.channels,
                    config.realm.name.clone(),
                    config.poller.poller_config(),
                    started_at,
                );
                tokio::spawn(service.run(status_tx));

                Ok::<Data, Error>(data)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(&token, intents)
        .framework(framework)
        .await
        .context("Error creating client")?;

    client.start().await.context("Error running bot")?;
    Ok(())
}
