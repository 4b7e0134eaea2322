// Canonical key names and the provider alias table
// Providers disagree on field naming (FCM, GCM legacy, Twilio, Mixpanel, Urban Airship, Pinpoint);
// everything is folded onto one canonical key set here.

use serde::{Deserialize, Serialize};

use super::payload::CanonicalMessage;

pub const TITLE: &str = "title";
pub const MESSAGE: &str = "message";
pub const SOUND: &str = "sound";
pub const ICON: &str = "icon";
pub const COLOR: &str = "color";
pub const COUNT: &str = "count";
pub const STYLE: &str = "style";
pub const SUMMARY_TEXT: &str = "summaryText";
pub const PICTURE: &str = "picture";
pub const IMAGE: &str = "image";
pub const IMAGE_TYPE: &str = "image-type";
pub const ACTIONS: &str = "actions";
pub const VISIBILITY: &str = "visibility";
pub const PRIORITY: &str = "priority";
pub const VIBRATION_PATTERN: &str = "vibrationPattern";
pub const LED_COLOR: &str = "ledColor";
pub const ONGOING: &str = "ongoing";
pub const CONTENT_AVAILABLE: &str = "content-available";
pub const FORCE_START: &str = "force-start";
pub const CHANNEL_ID: &str = "android_channel_id";
pub const NOT_ID: &str = "notId";
pub const NO_CACHE: &str = "no-cache";

pub const FOREGROUND: &str = "foreground";
pub const COLDSTART: &str = "coldstart";
pub const DISMISSED: &str = "dismissed";
pub const ACTION_CALLBACK: &str = "actionCallback";
pub const INLINE_REPLY: &str = "inlineReply";

/// Wrapper keys that may hold a JSON-encoded nested message
pub const DATA: &str = "data";
pub const NOTIFICATION: &str = "notification";

pub const LOC_KEY: &str = "loc-key";
pub const LOC_DATA: &str = "loc-data";

pub const STYLE_TEXT: &str = "text";
pub const STYLE_INBOX: &str = "inbox";
pub const STYLE_PICTURE: &str = "picture";

/// Every key the renderer or router reads. Anything else is passthrough data.
pub const RECOGNIZED: &[&str] = &[
    TITLE,
    MESSAGE,
    SOUND,
    ICON,
    COLOR,
    COUNT,
    STYLE,
    SUMMARY_TEXT,
    PICTURE,
    IMAGE,
    IMAGE_TYPE,
    ACTIONS,
    VISIBILITY,
    PRIORITY,
    VIBRATION_PATTERN,
    LED_COLOR,
    ONGOING,
    CONTENT_AVAILABLE,
    FORCE_START,
    CHANNEL_ID,
    NOT_ID,
    NO_CACHE,
];

pub fn is_recognized(key: &str) -> bool {
    RECOGNIZED.contains(&key)
}

/// Which configured override participates in an alias rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideSlot {
    Message,
    Title,
}

/// Exact-match rule: any alias maps onto `canonical`
#[derive(Debug, Clone, Copy)]
pub struct AliasRule {
    pub canonical: &'static str,
    pub aliases: &'static [&'static str],
    pub override_slot: Option<OverrideSlot>,
    /// Extra `(key, value)` written into the output whenever this rule fires
    pub side_effect: Option<(&'static str, &'static str)>,
}

/// Namespace rule: strip `prefix` plus its `.` separator
#[derive(Debug, Clone, Copy)]
pub struct PrefixRule {
    pub prefix: &'static str,
    pub lowercase: bool,
}

pub const BODY_ALIASES: &[&str] = &[
    "body",
    "alert",
    "mp_message",
    "gcm.notification.body",
    "twi_body",
    "pinpoint.notification.body",
];

pub const TITLE_ALIASES: &[&str] = &["twi_title", "subject"];

/// Priority ordered; first match wins
pub static ALIAS_TABLE: &[AliasRule] = &[
    AliasRule {
        canonical: MESSAGE,
        aliases: BODY_ALIASES,
        override_slot: Some(OverrideSlot::Message),
        side_effect: None,
    },
    AliasRule {
        canonical: TITLE,
        aliases: TITLE_ALIASES,
        override_slot: Some(OverrideSlot::Title),
        side_effect: None,
    },
    AliasRule {
        canonical: COUNT,
        aliases: &["msgcnt", "badge"],
        override_slot: None,
        side_effect: None,
    },
    AliasRule {
        canonical: SOUND,
        aliases: &["soundname", "twi_sound"],
        override_slot: None,
        side_effect: None,
    },
    AliasRule {
        canonical: PICTURE,
        aliases: &["pinpoint.notification.imageUrl"],
        override_slot: None,
        side_effect: Some((STYLE, STYLE_PICTURE)),
    },
];

/// `gcm.notification` must precede `gcm.n`
pub static PREFIX_RULES: &[PrefixRule] = &[
    PrefixRule {
        prefix: "gcm.notification",
        lowercase: false,
    },
    PrefixRule {
        prefix: "gcm.n",
        lowercase: false,
    },
    PrefixRule {
        prefix: "com.urbanairship.push",
        lowercase: true,
    },
    PrefixRule {
        prefix: "pinpoint.notification",
        lowercase: false,
    },
];

/// Configured message/title key overrides (`messageKey` / `titleKey` init options)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyOverrides {
    pub message_key: Option<String>,
    pub title_key: Option<String>,
}

impl KeyOverrides {
    pub fn new(message_key: Option<String>, title_key: Option<String>) -> Self {
        Self {
            message_key: message_key.filter(|k| !k.is_empty()),
            title_key: title_key.filter(|k| !k.is_empty()),
        }
    }

    fn slot(&self, slot: OverrideSlot) -> Option<&str> {
        match slot {
            OverrideSlot::Message => self.message_key.as_deref(),
            OverrideSlot::Title => self.title_key.as_deref(),
        }
    }

    pub fn is_message_key(&self, key: &str) -> bool {
        self.message_key.as_deref() == Some(key)
    }

    /// True when `key` names a body or title field in any provider's scheme
    pub fn is_body_or_title(&self, key: &str) -> bool {
        key == MESSAGE
            || key == TITLE
            || BODY_ALIASES.contains(&key)
            || TITLE_ALIASES.contains(&key)
            || self.message_key.as_deref() == Some(key)
            || self.title_key.as_deref() == Some(key)
    }
}

impl AliasRule {
    fn matches(&self, key: &str, overrides: &KeyOverrides) -> bool {
        self.aliases.contains(&key)
            || self
                .override_slot
                .and_then(|slot| overrides.slot(slot))
                .is_some_and(|o| o == key)
    }
}

impl PrefixRule {
    fn strip(&self, key: &str) -> Option<String> {
        let rest = key.strip_prefix(self.prefix)?.strip_prefix('.')?;
        if rest.is_empty() {
            return None;
        }
        Some(if self.lowercase {
            rest.to_lowercase()
        } else {
            rest.to_string()
        })
    }
}

/// Map a provider key onto its canonical name.
///
/// Never fails: unmatched keys come back verbatim. Rules with a side effect (the Pinpoint
/// picture field) write into `side_output` as they fire.
pub fn normalize_key(
    key: &str,
    overrides: &KeyOverrides,
    side_output: &mut CanonicalMessage,
) -> String {
    if let Some(rule) = ALIAS_TABLE.iter().find(|rule| rule.matches(key, overrides)) {
        if let Some((side_key, side_value)) = rule.side_effect {
            side_output.insert_str(side_key, side_value);
        }
        return rule.canonical.to_string();
    }

    PREFIX_RULES
        .iter()
        .find_map(|rule| rule.strip(key))
        .unwrap_or_else(|| key.to_string())
}
