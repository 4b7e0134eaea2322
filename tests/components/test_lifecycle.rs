//! Tests for components/lifecycle.rs

use push_bridge::components::keys;
use push_bridge::{AppState, CanonicalMessage, LifecycleRouter, RouteDecision, RouteInputs};

fn inputs(force_show: bool, content_available: bool, force_start: bool) -> RouteInputs {
    RouteInputs {
        force_show,
        content_available,
        force_start,
    }
}

#[test]
fn test_foreground_delivers_without_rendering() {
    let decision = RouteDecision::decide(AppState::Foreground, inputs(false, false, false));
    assert!(decision.deliver);
    assert!(!decision.render);
    assert!(decision.foreground);
    assert!(!decision.coldstart);
}

#[test]
fn test_foreground_force_show_renders_only() {
    let decision = RouteDecision::decide(AppState::Foreground, inputs(true, true, false));
    assert!(!decision.deliver);
    assert!(decision.render);
    assert!(decision.foreground);
}

#[test]
fn test_background_renders_and_delivers_content_available() {
    let plain = RouteDecision::decide(AppState::Background, inputs(false, false, false));
    assert!(plain.render);
    assert!(!plain.deliver);
    assert!(!plain.coldstart);

    let content = RouteDecision::decide(AppState::Background, inputs(false, true, false));
    assert!(content.render);
    assert!(content.deliver);
    assert!(!content.launch);
}

#[test]
fn test_not_running_is_coldstart() {
    let decision = RouteDecision::decide(AppState::NotRunning, inputs(false, true, false));
    assert!(decision.coldstart);
    assert!(!decision.foreground);
    assert!(decision.render);
    assert!(decision.deliver);
}

#[test]
fn test_force_start_launches_only_when_not_running() {
    let cold = RouteDecision::decide(AppState::NotRunning, inputs(false, false, true));
    assert!(cold.launch);
    assert!(cold.deliver);

    let warm = RouteDecision::decide(AppState::Background, inputs(false, false, true));
    assert!(!warm.launch);
    assert!(!warm.deliver);
}

#[test]
fn test_route_is_pure() {
    let states = [AppState::NotRunning, AppState::Background, AppState::Foreground];
    for state in states {
        for bits in 0..8u8 {
            let input = inputs(bits & 1 != 0, bits & 2 != 0, bits & 4 != 0);
            let first = RouteDecision::decide(state, input);
            for _ in 0..3 {
                assert_eq!(RouteDecision::decide(state, input), first);
            }
        }
    }
}

#[test]
fn test_route_stamps_flags() {
    let mut message = CanonicalMessage::new()
        .with(keys::MESSAGE, "hi")
        .with(keys::CONTENT_AVAILABLE, "1");

    let decision = LifecycleRouter::route(&mut message, AppState::NotRunning, false);

    assert!(decision.deliver);
    assert_eq!(message.get(keys::FOREGROUND), Some(&serde_json::Value::Bool(false)));
    assert_eq!(message.get(keys::COLDSTART), Some(&serde_json::Value::Bool(true)));
}

#[test]
fn test_router_signals() {
    let router = LifecycleRouter::new();
    assert_eq!(router.state(), AppState::NotRunning);

    assert_eq!(router.on_bridge_attached(), AppState::Foreground);
    assert_eq!(router.on_pause(), AppState::Background);
    assert_eq!(router.on_resume(), AppState::Foreground);
    assert_eq!(router.on_bridge_detached(), AppState::NotRunning);

    // Resume without a bridge does not make the host running
    assert_eq!(router.on_resume(), AppState::NotRunning);
    assert!(LifecycleRouter::attached().state().is_running());
}
