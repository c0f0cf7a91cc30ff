// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "battlenet/mod.rs"]
pub mod battlenet;

#[path = "config/mod.rs"]
pub mod config;

#[path = "local_alert/mod.rs"]
pub mod local_alert;

#[path = "logging/mod.rs"]
pub mod logging;
