pub mod desktop_alert;

pub use desktop_alert::{DesktopAlert, LocalAlertSettings};
