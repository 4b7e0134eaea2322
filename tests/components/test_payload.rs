//! Tests for components/payload.rs

use push_bridge::components::keys;
use push_bridge::{CanonicalMessage, KeyOverrides, NotId, PayloadNormalizer, PushError, RawPayload};
use serde_json::{Value, json};

use crate::support;

fn normalizer() -> PayloadNormalizer {
    PayloadNormalizer::new(KeyOverrides::default(), support::resources())
}

#[test]
fn test_nested_data_json_is_promoted() {
    let raw = RawPayload::new().with("data", r#"{"alert":"hi","title":"t"}"#);
    let message = normalizer().normalize(&raw);

    assert_eq!(message.get_str("message"), Some("hi"));
    assert_eq!(message.get_str("title"), Some("t"));
    assert_eq!(message.len(), 2);
}

#[test]
fn test_notification_submap_is_flattened() {
    let raw = RawPayload::new()
        .with("notification", json!({"body": "Body", "title": "Title", "notId": 7}))
        .with("customKey", "value");
    let message = normalizer().normalize(&raw);

    assert_eq!(message.get_str("message"), Some("Body"));
    assert_eq!(message.get_str("title"), Some("Title"));
    assert_eq!(message.get_str("customKey"), Some("value"));
    assert_eq!(message.not_id(), NotId(7));
}

#[test]
fn test_provider_keys_are_renamed() {
    let raw = RawPayload::new()
        .with("gcm.notification.body", "from gcm")
        .with("msgcnt", "3")
        .with("soundname", "chime");
    let message = normalizer().normalize(&raw);

    assert_eq!(message.get_str("message"), Some("from gcm"));
    assert_eq!(message.get_str("count"), Some("3"));
    assert_eq!(message.get_str("sound"), Some("chime"));
}

#[test]
fn test_malformed_nested_json_kept_as_string() {
    let raw = RawPayload::new().with("data", "{broken");
    let message = normalizer().normalize(&raw);
    assert_eq!(message.get_str("data"), Some("{broken"));
}

#[test]
fn test_nested_object_without_message_fields_passes_through() {
    let encoded = r#"{"orderId":12,"status":"shipped"}"#;
    let raw = RawPayload::new().with("data", encoded);
    let message = normalizer().normalize(&raw);

    assert_eq!(message.get_str("data"), Some(encoded));
    assert_eq!(message.passthrough().count(), 1);
}

#[test]
fn test_message_key_override_unwraps_nested() {
    let overrides = KeyOverrides::new(Some("payload".into()), None);
    let normalizer = PayloadNormalizer::new(overrides, support::resources());
    let raw = RawPayload::new().with("payload", r#"{"body":"wrapped"}"#);

    let message = normalizer.normalize(&raw);
    assert_eq!(message.get_str("message"), Some("wrapped"));
}

#[test]
fn test_localized_title() {
    let raw = RawPayload::new()
        .with("title", r#"{"loc-key":"greeting","loc-data":["Ada"]}"#)
        .with("message", r#"{"loc-key":"missing_resource_key"}"#);
    let message = normalizer().normalize(&raw);

    assert_eq!(message.get_str("title"), Some("Hello Ada"));
    assert_eq!(
        message.get_str("message"),
        Some(r#"{"loc-key":"missing_resource_key"}"#)
    );
}

#[test]
fn test_null_values_are_dropped() {
    let raw = RawPayload::new().with("image", Value::Null).with("title", "x");
    let message = normalizer().normalize(&raw);
    assert!(!message.contains_key("image"));
}

#[test]
fn test_flag_truthiness() {
    let message = CanonicalMessage::new()
        .with("a", "1")
        .with("b", "true")
        .with("c", 1)
        .with("d", true)
        .with("e", "0")
        .with("f", "yes");

    for key in ["a", "b", "c", "d"] {
        assert!(message.flag(key), "{} should be set", key);
    }
    for key in ["e", "f", "missing"] {
        assert!(!message.flag(key), "{} should be unset", key);
    }
}

#[test]
fn test_not_id_parsing() {
    assert_eq!(CanonicalMessage::new().not_id(), NotId(0));
    assert_eq!(CanonicalMessage::new().with("notId", "42").not_id(), NotId(42));
    assert_eq!(CanonicalMessage::new().with("notId", "abc").not_id(), NotId(0));
}

#[test]
fn test_host_json_shape() {
    let mut message = CanonicalMessage::new()
        .with("title", "T")
        .with("message", "M")
        .with("count", "2")
        .with("extra", r#"{"nested":true}"#)
        .with("list", "[1,2]")
        .with("brace", "{not json");
    message.set_flag(keys::FOREGROUND, true);
    message.set_flag(keys::COLDSTART, false);

    let json = message.to_host_json();
    assert_eq!(json["title"], "T");
    assert_eq!(json["message"], "M");
    assert_eq!(json["count"], "2");

    let additional = &json["additionalData"];
    assert_eq!(additional["foreground"], true);
    assert_eq!(additional["coldstart"], false);
    assert_eq!(additional["extra"], json!({"nested": true}));
    assert_eq!(additional["list"], json!([1, 2]));
    assert_eq!(additional["brace"], "{not json");
    assert!(additional.get("title").is_none());
}

#[test]
fn test_raw_payload_from_json() -> anyhow::Result<()> {
    let raw = RawPayload::from_json_str(r#"{"alert":"hi"}"#)?;
    assert_eq!(raw.len(), 1);

    let err = RawPayload::from_json_str("[1,2]").unwrap_err();
    assert!(matches!(err, PushError::MalformedPayload { .. }));
    Ok(())
}
