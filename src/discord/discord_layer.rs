// Discord layer - commands and event handlers.

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "events/command_hooks.rs"]
pub mod command_hooks;

#[path = "realm_status/channel_notifier.rs"]
pub mod channel_notifier;

// Re-export command types for convenience
pub use commands::realm::{Context, Data, Error};
