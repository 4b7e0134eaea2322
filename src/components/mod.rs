// Push message model components
// Canonical keys, payload normalization, localization, routing and the built notification shape

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod config;
pub mod content;
pub mod keys;
pub mod lifecycle;
pub mod localization;
pub mod payload;
pub mod platform;
pub mod record;

pub use config::PushConfig;
pub use content::{
    ActionButton, ActionHandler, BuiltNotification, IconMask, ImageRef, InlineReply, LargeIcon,
    Lights, NotificationStyle, PendingAction, SoundSource, parse_color, styled_text,
};
pub use keys::{AliasRule, KeyOverrides, PrefixRule, normalize_key};
pub use lifecycle::{AppState, LifecycleRouter, RouteDecision, RouteInputs};
pub use localization::{LocalizationResolver, format_template};
pub use payload::{CanonicalMessage, PayloadNormalizer, RawPayload};
pub use platform::{
    BadgeSink, HostBridge, HostLauncher, NotificationSurface, ResourceId, ResourceNamespace,
    ResourceResolver, StaticResources,
};
pub use record::NotificationRecords;

/// Per-arrival correlation id, attached to every log line for one push message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Platform notification id (`notId` in the payload); 0 when absent or unparseable
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct NotId(pub i32);

impl NotId {
    pub fn as_i32(&self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for NotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error taxonomy for the push pipeline.
///
/// None of these escalate past the pipeline entry points: each is absorbed by the
/// policy documented on the variant and logged.
#[derive(Debug, Clone, thiserror::Error, Serialize, Deserialize)]
pub enum PushError {
    /// Bad colour, out-of-range integer, malformed vibration entry. Attribute is skipped.
    #[error("Malformed field {field} = {value:?}: {reason}")]
    MalformedField {
        field: String,
        value: String,
        reason: String,
    },
    /// Nested JSON that fails to parse. Value is kept as an opaque string.
    #[error("Malformed payload under key {key}: {reason}")]
    MalformedPayload { key: String, reason: String },
    /// Icon, sound or image not found. The fallback chain continues.
    #[error("Resource unavailable: {resource_type} '{name}'")]
    ResourceUnavailable { resource_type: String, name: String },
    /// Image fetch failed or timed out. The image is omitted.
    #[error("Network failure fetching {url}: {message}")]
    NetworkFailure { url: String, message: String },
    /// Host bridge refused a delivery. The message stays buffered.
    #[error("Host bridge error: {message}")]
    HostBridge { message: String },
    /// Initialisation options could not be read.
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl PushError {
    pub fn malformed_field(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedField {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn resource_unavailable(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self::ResourceUnavailable {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }
}

pub type PushResult<T> = Result<T, PushError>;
