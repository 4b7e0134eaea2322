//! Tests for components/content.rs

use push_bridge::components::content::{
    PRIORITY_RANGE, VISIBILITY_RANGE, parse_count, parse_led_color, parse_ranged,
    parse_vibration_pattern,
};
use push_bridge::{IconMask, PushError, parse_color, styled_text};

#[test]
fn test_vibration_pattern_coerces_bad_entries() {
    assert_eq!(parse_vibration_pattern("[100,abc,300]"), vec![100, 0, 300]);
    assert_eq!(parse_vibration_pattern("500, 1000"), vec![500, 1000]);
    assert_eq!(parse_vibration_pattern("[-5]"), vec![0]);
}

#[test]
fn test_led_color_requires_four_entries() {
    let lights = parse_led_color("[255,255,0,0]").expect("valid ARGB");
    assert_eq!(lights.argb, 0xFFFF_0000);
    assert_eq!(lights.on_ms, 500);
    assert_eq!(lights.off_ms, 500);

    assert!(parse_led_color("[255,0,0]").is_err());
    assert!(parse_led_color("[255,0,0,0,0]").is_err());
    assert!(parse_led_color("[255,x,0,0]").is_err());
}

#[test]
fn test_led_color_masks_channels() {
    let lights = parse_led_color("[256,0,0,1]").expect("integers are accepted");
    assert_eq!(lights.argb, 0x0000_0001);
}

#[test]
fn test_priority_and_visibility_ranges() {
    assert_eq!(parse_ranged("priority", "2", &PRIORITY_RANGE).ok(), Some(2));
    assert_eq!(parse_ranged("priority", "-2", &PRIORITY_RANGE).ok(), Some(-2));
    assert!(matches!(
        parse_ranged("priority", "5", &PRIORITY_RANGE),
        Err(PushError::MalformedField { .. })
    ));
    assert!(parse_ranged("priority", "high", &PRIORITY_RANGE).is_err());

    assert_eq!(parse_ranged("visibility", "-1", &VISIBILITY_RANGE).ok(), Some(-1));
    assert!(parse_ranged("visibility", "2", &VISIBILITY_RANGE).is_err());
}

#[test]
fn test_count() {
    assert_eq!(parse_count("0").ok(), Some(0));
    assert_eq!(parse_count(" 12 ").ok(), Some(12));
    assert!(parse_count("-1").is_err());
    assert!(parse_count("many").is_err());
}

#[test]
fn test_parse_color() {
    assert_eq!(parse_color("#FF0000").ok(), Some(0xFFFF_0000));
    assert_eq!(parse_color("#80ff0000").ok(), Some(0x80FF_0000));
    assert_eq!(parse_color("blue").ok(), Some(0xFF00_00FF));
    assert!(parse_color("#GG0000").is_err());
    assert!(parse_color("not-a-colour").is_err());
}

#[test]
fn test_icon_mask() {
    assert_eq!(IconMask::from_image_type(None), IconMask::Square);
    assert_eq!(IconMask::from_image_type(Some("SQUARE")), IconMask::Square);
    assert_eq!(IconMask::from_image_type(Some("circle")), IconMask::Circle);
}

#[test]
fn test_styled_text_keeps_inline_markup_only() {
    assert_eq!(styled_text("<b>Bold</b> text"), "<b>Bold</b> text");
    assert_eq!(styled_text("hi<script>alert(1)</script>"), "hi");
    assert_eq!(styled_text("<a href=\"https://x\">link</a>"), "link");
    assert_eq!(styled_text("plain"), "plain");
}

#[test]
fn test_styled_text_output_is_escaped_html() {
    assert_eq!(
        styled_text("Tom & Jerry say \"hi\" 5 > 3"),
        "Tom &amp; Jerry say \"hi\" 5 &gt; 3"
    );
    assert_eq!(styled_text("<i>a</i> &amp; b"), "<i>a</i> &amp; b");
}
