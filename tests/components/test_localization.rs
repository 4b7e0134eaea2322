//! Tests for components/localization.rs

use push_bridge::{LocalizationResolver, format_template};

use crate::support;

#[test]
fn test_format_template() {
    let args = vec!["Ada".to_string(), "42".to_string()];
    assert_eq!(format_template("Hello %s", &args), "Hello Ada");
    assert_eq!(format_template("%s has %d", &args), "Ada has 42");
    assert_eq!(format_template("%2$s for %1$s", &args), "42 for Ada");
    assert_eq!(format_template("100%%", &args), "100%");
    assert_eq!(format_template("%s %s %s", &args), "Ada 42 %s");
    assert_eq!(format_template("plain", &[]), "plain");
}

#[test]
fn test_localizes_known_key() {
    let resolver = LocalizationResolver::new(support::resources());

    let value = r#"{"loc-key":"greeting","loc-data":["Ada"]}"#;
    assert_eq!(resolver.localize("title", value), "Hello Ada");

    let value = r#"{"loc-key":"score","loc-data":"[\"Ada\", 3]"}"#;
    assert_eq!(resolver.localize("message", value), "Ada scored 3");
}

#[test]
fn test_missing_resource_returns_original() {
    let resolver = LocalizationResolver::new(support::resources());
    let value = r#"{"loc-key":"missing_resource_key"}"#;
    assert_eq!(resolver.localize("message", value), value);
}

#[test]
fn test_non_template_values_unchanged() {
    let resolver = LocalizationResolver::new(support::resources());

    assert_eq!(resolver.localize("message", "just text"), "just text");
    assert_eq!(resolver.localize("message", "{not json"), "{not json");
    // Only title, message and summaryText are localizable
    let value = r#"{"loc-key":"greeting","loc-data":["Ada"]}"#;
    assert_eq!(resolver.localize("sound", value), value);
}
