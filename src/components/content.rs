// Built notification description handed to the platform surface
// plus the permissive attribute parsers used while building it

use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::payload::CanonicalMessage;
use super::platform::ResourceId;
use super::{NotId, PushError, PushResult};

pub const PRIORITY_RANGE: RangeInclusive<i32> = -2..=2;
pub const VISIBILITY_RANGE: RangeInclusive<i32> = -1..=1;
pub const LIGHTS_ON_MS: u32 = 500;
pub const LIGHTS_OFF_MS: u32 = 500;
pub const DEFAULT_REPLY_LABEL: &str = "Enter your reply here";

/// Fully resolved notification, ready for `NotificationSurface::render`.
///
/// `title`, `ticker`, `content_text` and the text inside `style` are sanitized HTML
/// fragments, not plain text: inline formatting tags survive and `&`, `<`, `>` arrive as
/// entities. Surfaces must interpret them as HTML (`Html.fromHtml` on Android) before
/// display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltNotification {
    pub id: NotId,
    /// Tag the notification is posted under (the application name)
    pub tag: String,
    pub channel_id: String,
    pub when: DateTime<Utc>,
    pub title: Option<String>,
    pub ticker: Option<String>,
    pub content_text: Option<String>,
    pub style: NotificationStyle,
    pub small_icon: ResourceId,
    /// Small icon tint, ARGB
    pub color: Option<u32>,
    pub large_icon: Option<LargeIcon>,
    pub sound: Option<SoundSource>,
    /// Use the platform default vibration
    pub default_vibrate: bool,
    pub vibration_pattern: Option<Vec<u64>>,
    pub lights: Option<Lights>,
    pub priority: Option<i32>,
    pub visibility: Option<i32>,
    pub number: Option<u32>,
    pub ongoing: bool,
    pub auto_cancel: bool,
    pub actions: Vec<ActionButton>,
    /// Fired when the notification body is tapped
    pub content_action: PendingAction,
    /// Fired when the notification is swiped away
    pub delete_action: PendingAction,
    /// Message carried by every pending action
    pub payload: CanonicalMessage,
}

impl BuiltNotification {
    pub fn new(
        id: NotId,
        tag: impl Into<String>,
        channel_id: impl Into<String>,
        payload: CanonicalMessage,
        content_action: PendingAction,
        delete_action: PendingAction,
    ) -> Self {
        Self {
            id,
            tag: tag.into(),
            channel_id: channel_id.into(),
            when: Utc::now(),
            title: None,
            ticker: None,
            content_text: None,
            style: NotificationStyle::None,
            small_icon: ResourceId(0),
            color: None,
            large_icon: None,
            sound: None,
            default_vibrate: false,
            vibration_pattern: None,
            lights: None,
            priority: None,
            visibility: None,
            number: None,
            ongoing: false,
            auto_cancel: true,
            actions: Vec::new(),
            content_action,
            delete_action,
            payload,
        }
    }

    pub fn inbox_lines(&self) -> Option<&[String]> {
        match &self.style {
            NotificationStyle::Inbox { lines, .. } => Some(lines),
            _ => None,
        }
    }

    pub fn summary_text(&self) -> Option<&str> {
        match &self.style {
            NotificationStyle::BigText { summary_text, .. }
            | NotificationStyle::Inbox { summary_text, .. }
            | NotificationStyle::BigPicture { summary_text, .. } => summary_text.as_deref(),
            NotificationStyle::None => None,
        }
    }
}

/// Expanded layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NotificationStyle {
    /// Collapsed single line only
    None,
    BigText {
        big_text: String,
        big_content_title: Option<String>,
        summary_text: Option<String>,
    },
    /// Lines are most-recent-first
    Inbox {
        big_content_title: Option<String>,
        summary_text: Option<String>,
        lines: Vec<String>,
    },
    BigPicture {
        picture: Option<ImageRef>,
        big_content_title: Option<String>,
        summary_text: Option<String>,
    },
}

/// Where a bitmap came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageRef {
    /// Downloaded to a local file
    Remote { url: String, path: PathBuf },
    /// Bundled with the application
    Asset(PathBuf),
    Resource(ResourceId),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IconMask {
    #[default]
    Square,
    Circle,
}

impl IconMask {
    /// `image-type`: anything other than "square" (case-insensitive) crops to a circle
    pub fn from_image_type(image_type: Option<&str>) -> Self {
        match image_type {
            None => IconMask::Square,
            Some(t) if t.eq_ignore_ascii_case("square") => IconMask::Square,
            Some(_) => IconMask::Circle,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LargeIcon {
    pub image: ImageRef,
    pub mask: IconMask,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundSource {
    Default,
    Ringtone,
    /// Sound file shipped in the application's raw resources
    Bundled { uri: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lights {
    pub argb: u32,
    pub on_ms: u32,
    pub off_ms: u32,
}

/// Component that receives a pending action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionHandler {
    /// Brings the host UI up
    Activity,
    /// Handled without showing UI
    Receiver,
}

/// Intent attached to a tap, swipe or action button
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAction {
    pub handler: ActionHandler,
    /// Unique per pending action for the life of the process
    pub request_code: u32,
    pub not_id: NotId,
    pub callback: Option<String>,
    pub foreground: bool,
    pub dismissed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineReply {
    /// Key the reply text is returned under
    pub result_key: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionButton {
    pub title: String,
    pub icon: Option<ResourceId>,
    pub action: PendingAction,
    pub inline_reply: Option<InlineReply>,
}

/// Action button definition as it arrives in the `actions` JSON array
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActionSpec {
    pub title: String,
    pub callback: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default = "default_true")]
    pub foreground: bool,
    #[serde(default)]
    pub inline: bool,
    #[serde(default, rename = "replyLabel")]
    pub reply_label: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Sanitise provider HTML down to inline formatting. The result is HTML: text is
/// entity-escaped.
pub fn styled_text(source: &str) -> String {
    ammonia::Builder::empty()
        .add_tags(&[
            "b", "i", "u", "em", "strong", "br", "small", "big", "sub", "sup", "tt", "s",
            "strike", "del", "font", "span", "p", "div",
        ])
        .add_tag_attributes("font", &["color", "face"])
        .clean_content_tags(HashSet::from(["script", "style"]))
        .url_schemes(HashSet::new())
        .clean(source)
        .to_string()
}

/// Parse `#RRGGBB`, `#AARRGGBB` or a named colour into ARGB
pub fn parse_color(value: &str) -> PushResult<u32> {
    let trimmed = value.trim();
    let hex = regex::Regex::new(r"^#([0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").map_err(|e| {
        PushError::malformed_field("color", value, format!("color pattern failed: {}", e))
    })?;

    if let Some(caps) = hex.captures(trimmed) {
        let digits = &caps[1];
        let parsed = u32::from_str_radix(digits, 16)
            .map_err(|e| PushError::malformed_field("color", value, e.to_string()))?;
        return Ok(if digits.len() == 6 {
            0xFF00_0000 | parsed
        } else {
            parsed
        });
    }

    let named = match trimmed.to_ascii_lowercase().as_str() {
        "black" => 0xFF00_0000,
        "darkgray" | "darkgrey" => 0xFF44_4444,
        "gray" | "grey" => 0xFF88_8888,
        "lightgray" | "lightgrey" => 0xFFCC_CCCC,
        "white" => 0xFFFF_FFFF,
        "red" => 0xFFFF_0000,
        "green" => 0xFF00_FF00,
        "blue" => 0xFF00_00FF,
        "yellow" => 0xFFFF_FF00,
        "cyan" | "aqua" => 0xFF00_FFFF,
        "magenta" | "fuchsia" => 0xFFFF_00FF,
        "lime" => 0xFF00_FF00,
        "maroon" => 0xFF80_0000,
        "navy" => 0xFF00_0080,
        "olive" => 0xFF80_8000,
        "purple" => 0xFF80_0080,
        "silver" => 0xFFC0_C0C0,
        "teal" => 0xFF00_8080,
        _ => {
            return Err(PushError::malformed_field("color", value, "unknown color"));
        },
    };
    Ok(named)
}

/// Split `"[a, b, c]"` or `"a,b,c"` into trimmed entries
fn list_entries(value: &str) -> Vec<&str> {
    value
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(str::trim)
        .collect()
}

/// Vibration pattern in milliseconds. Entries that do not parse become 0; the length
/// of the list is preserved.
pub fn parse_vibration_pattern(value: &str) -> Vec<u64> {
    list_entries(value)
        .into_iter()
        .map(|entry| {
            entry.parse::<u64>().unwrap_or_else(|_| {
                tracing::warn!(entry, "Malformed vibration entry, using 0");
                0
            })
        })
        .collect()
}

/// LED colour as four ARGB integers
pub fn parse_led_color(value: &str) -> PushResult<Lights> {
    let entries = list_entries(value);
    if entries.len() != 4 {
        return Err(PushError::malformed_field(
            "ledColor",
            value,
            "must be an array of length == 4 (ARGB)",
        ));
    }

    let mut channels = [0u32; 4];
    for (slot, entry) in channels.iter_mut().zip(&entries) {
        let parsed = entry.parse::<i64>().map_err(|_| {
            PushError::malformed_field("ledColor", value, format!("'{}' is not an integer", entry))
        })?;
        *slot = (parsed & 0xFF) as u32;
    }

    let [a, r, g, b] = channels;
    Ok(Lights {
        argb: (a << 24) | (r << 16) | (g << 8) | b,
        on_ms: LIGHTS_ON_MS,
        off_ms: LIGHTS_OFF_MS,
    })
}

/// Integer constrained to an inclusive range
pub fn parse_ranged(field: &str, value: &str, range: &RangeInclusive<i32>) -> PushResult<i32> {
    let parsed = value
        .trim()
        .parse::<i32>()
        .map_err(|e| PushError::malformed_field(field, value, e.to_string()))?;
    if range.contains(&parsed) {
        Ok(parsed)
    } else {
        Err(PushError::malformed_field(
            field,
            value,
            format!(
                "must be between {} and {}",
                range.start(),
                range.end()
            ),
        ))
    }
}

/// Badge count; negative values are rejected
pub fn parse_count(value: &str) -> PushResult<u32> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|e| PushError::malformed_field("count", value, e.to_string()))
}
