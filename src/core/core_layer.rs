// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "realm_status/mod.rs"]
pub mod realm_status;

#[path = "uptime/uptime_formatter.rs"]
pub mod uptime;
