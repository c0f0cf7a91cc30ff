// Local-mode side effects: an audible alert and a desktop notification.
// Both run as external programs. A missing program is logged and skipped.

use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::core::realm_status::LocalAlert;

/// Commands used to ring the local machine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LocalAlertSettings {
    /// Full argv for the sound player. Empty disables sound.
    pub sound_command: Vec<String>,
    /// Notifier argv; title and message are appended. Empty disables popups.
    pub notify_command: Vec<String>,
}

impl Default for LocalAlertSettings {
    fn default() -> Self {
        Self {
            sound_command: vec![
                "mpg123".to_string(),
                "-q".to_string(),
                "--loop".to_string(),
                "3".to_string(),
                "alert_sound_short.mp3".to_string(),
            ],
            notify_command: vec!["notify-send".to_string(), "--expire-time=10000".to_string()],
        }
    }
}

pub struct DesktopAlert {
    settings: LocalAlertSettings,
}

impl DesktopAlert {
    pub fn new(settings: LocalAlertSettings) -> Self {
        Self { settings }
    }

    /// Build the notifier argv for a given title and message.
    fn notify_args(&self, title: &str, message: &str) -> Vec<String> {
        let mut argv = self.settings.notify_command.clone();
        if !argv.is_empty() {
            argv.push(title.to_string());
            argv.push(message.to_string());
        }
        argv
    }

    /// Fire and forget. The child is reaped by the runtime.
    fn spawn(argv: &[String]) {
        let Some((program, args)) = argv.split_first() else {
            return;
        };

        if let Err(e) = Command::new(program).args(args).spawn() {
            tracing::warn!("Failed to run local alert command {}: {}", program, e);
        }
    }
}

impl LocalAlert for DesktopAlert {
    fn raise(&self, title: &str, message: &str) {
        Self::spawn(&self.settings.sound_command);
        Self::spawn(&self.notify_args(title, message));
    }
}
