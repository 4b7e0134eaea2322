// Push configuration, read-only during message intake

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::keys::KeyOverrides;
use super::{PushError, PushResult};

pub const DEFAULT_CHANNEL_ID: &str = "PushPluginChannel";

/// Options supplied by the host when push is initialised
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PushConfig {
    /// Render a notification even while the host is in the foreground
    pub force_show: bool,
    /// Reset the badge to zero on every arrival
    pub clear_badge: bool,
    /// Cancel all rendered notifications when the host bridge goes away
    pub clear_notifications: bool,
    pub message_key: Option<String>,
    pub title_key: Option<String>,
    /// Default small icon resource name
    pub icon: Option<String>,
    /// Default small icon tint
    pub icon_color: Option<String>,
    pub sound: bool,
    pub vibrate: bool,
    pub default_channel_id: String,
    pub image_connect_timeout_ms: u64,
    pub image_timeout_ms: u64,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            force_show: false,
            clear_badge: false,
            clear_notifications: true,
            message_key: None,
            title_key: None,
            icon: None,
            icon_color: None,
            sound: true,
            vibrate: true,
            default_channel_id: DEFAULT_CHANNEL_ID.to_string(),
            image_connect_timeout_ms: 15_000,
            image_timeout_ms: 30_000,
        }
    }
}

impl PushConfig {
    /// Parse host init options. Platform options may be nested under `android`.
    pub fn from_init_options(options: &Value) -> PushResult<Self> {
        let section = options.get("android").unwrap_or(options);
        if !section.is_object() {
            return Err(PushError::Configuration {
                message: "init options must be a JSON object".to_string(),
            });
        }

        let mut config: PushConfig =
            serde_json::from_value(section.clone()).map_err(|e| PushError::Configuration {
                message: e.to_string(),
            })?;

        // The host sends "" for unset string options
        for field in [
            &mut config.message_key,
            &mut config.title_key,
            &mut config.icon,
            &mut config.icon_color,
        ] {
            if field.as_deref().is_some_and(str::is_empty) {
                *field = None;
            }
        }

        Ok(config)
    }

    pub fn key_overrides(&self) -> KeyOverrides {
        KeyOverrides::new(self.message_key.clone(), self.title_key.clone())
    }

    pub fn image_connect_timeout(&self) -> Duration {
        Duration::from_millis(self.image_connect_timeout_ms)
    }

    pub fn image_timeout(&self) -> Duration {
        Duration::from_millis(self.image_timeout_ms)
    }
}
