pub mod bot_config;

pub use bot_config::{BotConfig, EnvSettings, DEFAULT_CONFIG_PATH};
