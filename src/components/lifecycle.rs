// Host lifecycle state machine and per-message routing
// Decides whether a message goes straight to the host, gets rendered, or both.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::keys;
use super::payload::CanonicalMessage;

/// Host application state as seen by the push layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppState {
    /// No host bridge attached
    NotRunning,
    /// Bridge attached, UI not visible
    Background,
    /// Bridge attached, UI visible
    Foreground,
}

impl AppState {
    pub fn is_running(&self) -> bool {
        !matches!(self, AppState::NotRunning)
    }
}

/// Everything routing depends on besides the app state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteInputs {
    pub force_show: bool,
    pub content_available: bool,
    pub force_start: bool,
}

impl RouteInputs {
    pub fn from_message(message: &CanonicalMessage, force_show: bool) -> Self {
        Self {
            force_show,
            content_available: message.flag(keys::CONTENT_AVAILABLE),
            force_start: message.flag(keys::FORCE_START),
        }
    }
}

/// Outcome of routing one arrival
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteDecision {
    /// Hand the message to the host bridge (buffered while detached)
    pub deliver: bool,
    /// Build and post a platform notification
    pub render: bool,
    /// Start the host application in the background
    pub launch: bool,
    pub foreground: bool,
    pub coldstart: bool,
}

impl RouteDecision {
    /// Pure routing table. Identical inputs always give the identical decision.
    pub fn decide(state: AppState, inputs: RouteInputs) -> Self {
        match state {
            AppState::Foreground if !inputs.force_show => Self {
                deliver: true,
                render: false,
                launch: false,
                foreground: true,
                coldstart: false,
            },
            AppState::Foreground => Self {
                deliver: false,
                render: true,
                launch: false,
                foreground: true,
                coldstart: false,
            },
            AppState::Background | AppState::NotRunning => {
                let launch = inputs.force_start && !state.is_running();
                Self {
                    // A launched host picks the message up through the delivery queue
                    deliver: launch || inputs.content_available,
                    render: true,
                    launch,
                    foreground: false,
                    coldstart: !state.is_running(),
                }
            },
        }
    }

    /// Write the lifecycle flags onto the message
    pub fn stamp(&self, message: &mut CanonicalMessage) {
        message.set_flag(keys::FOREGROUND, self.foreground);
        message.set_flag(keys::COLDSTART, self.coldstart);
    }
}

#[derive(Debug, Default)]
struct Signals {
    attached: bool,
    visible: bool,
}

/// Tracks host attach/detach and pause/resume signals and routes arrivals against them
#[derive(Debug, Default)]
pub struct LifecycleRouter {
    signals: RwLock<Signals>,
}

impl LifecycleRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Router for a host whose bridge is already attached and visible
    pub fn attached() -> Self {
        Self {
            signals: RwLock::new(Signals {
                attached: true,
                visible: true,
            }),
        }
    }

    pub fn state(&self) -> AppState {
        let signals = self.signals.read();
        match (signals.attached, signals.visible) {
            (false, _) => AppState::NotRunning,
            (true, true) => AppState::Foreground,
            (true, false) => AppState::Background,
        }
    }

    fn transition(&self, reason: &str, apply: impl FnOnce(&mut Signals)) -> AppState {
        let from = self.state();
        apply(&mut *self.signals.write());
        let to = self.state();
        if from != to {
            tracing::info!(?from, ?to, reason, "Host lifecycle transition");
        }
        to
    }

    /// The bridge attaches from a live UI, so the host starts out visible
    pub fn on_bridge_attached(&self) -> AppState {
        self.transition("bridge attached", |s| {
            s.attached = true;
            s.visible = true;
        })
    }

    pub fn on_bridge_detached(&self) -> AppState {
        self.transition("bridge detached", |s| {
            s.attached = false;
            s.visible = false;
        })
    }

    pub fn on_pause(&self) -> AppState {
        self.transition("paused", |s| s.visible = false)
    }

    pub fn on_resume(&self) -> AppState {
        self.transition("resumed", |s| s.visible = true)
    }

    /// Route against an explicit state and stamp the message's lifecycle flags
    pub fn route(
        message: &mut CanonicalMessage,
        state: AppState,
        force_show: bool,
    ) -> RouteDecision {
        let decision = RouteDecision::decide(state, RouteInputs::from_message(message, force_show));
        decision.stamp(message);
        decision
    }

    /// Route against the current state
    pub fn route_current(&self, message: &mut CanonicalMessage, force_show: bool) -> RouteDecision {
        Self::route(message, self.state(), force_show)
    }
}
