pub mod log_setup;

pub use log_setup::{init_logging, DEFAULT_LOG_FILE};
