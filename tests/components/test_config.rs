//! Tests for components/config.rs

use std::time::Duration;

use push_bridge::PushConfig;
use push_bridge::components::config::DEFAULT_CHANNEL_ID;
use serde_json::json;

#[test]
fn test_defaults() {
    let config = PushConfig::default();
    assert!(!config.force_show);
    assert!(config.clear_notifications);
    assert!(config.sound);
    assert!(config.vibrate);
    assert_eq!(config.default_channel_id, DEFAULT_CHANNEL_ID);
    assert_eq!(config.image_connect_timeout(), Duration::from_secs(15));
}

#[test]
fn test_from_init_options_reads_android_section() -> anyhow::Result<()> {
    let options = json!({
        "android": {
            "forceShow": true,
            "messageKey": "text",
            "titleKey": "",
            "iconColor": "#336699",
            "sound": false
        },
        "ios": { "alert": true }
    });

    let config = PushConfig::from_init_options(&options)?;
    assert!(config.force_show);
    assert!(!config.sound);
    assert_eq!(config.message_key.as_deref(), Some("text"));
    assert_eq!(config.title_key, None);
    assert_eq!(config.icon_color.as_deref(), Some("#336699"));
    assert!(config.vibrate);

    let overrides = config.key_overrides();
    assert!(overrides.is_message_key("text"));
    Ok(())
}

#[test]
fn test_from_init_options_flat() -> anyhow::Result<()> {
    let config = PushConfig::from_init_options(&json!({"clearBadge": true}))?;
    assert!(config.clear_badge);
    Ok(())
}

#[test]
fn test_from_init_options_rejects_non_object() {
    assert!(PushConfig::from_init_options(&json!("nope")).is_err());
    assert!(PushConfig::from_init_options(&json!({"forceShow": "yes"})).is_err());
}
