//! Push notification integration layer for mobile hosts
//!
//! Takes raw provider payloads (FCM, GCM, Urban Airship, Twilio, Pinpoint, Mixpanel),
//! normalizes them into one canonical message, decides from the host's lifecycle state
//! whether to render a platform notification or hand the message straight to the host,
//! and buffers host deliveries until the host bridge is attached.
//!
//! The platform itself (notification tray, resources, host event channel) sits behind the
//! traits in [`components::platform`]; [`service::PushService`] wires everything together.

pub mod backends;
pub mod components;
pub mod service;

pub use backends::*;
pub use components::*;
pub use service::{IntakeHandle, PushService, RouteOutcome};
