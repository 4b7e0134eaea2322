// Builds platform notification descriptions from canonical messages
// Attributes are independent: a malformed one is logged and skipped, never fatal.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::RwLock;
use rand::Rng;

use super::image_utils::{self, ImageFetcher};
use crate::components::content::{
    ActionSpec, DEFAULT_REPLY_LABEL, PRIORITY_RANGE, VISIBILITY_RANGE, parse_count,
    parse_led_color, parse_ranged, parse_vibration_pattern,
};
use crate::components::{
    ActionButton, ActionHandler, BuiltNotification, CanonicalMessage, IconMask, ImageRef,
    InlineReply, LargeIcon, NotId, NotificationRecords, NotificationStyle, PendingAction,
    PushConfig, PushError, PushResult, ResourceId, ResourceResolver, SoundSource, keys,
    parse_color, styled_text,
};

/// Hands out pending-intent request codes, unique for the life of the renderer.
///
/// Codes stay within `1..=MAX` and repeat only after `MAX` allocations.
#[derive(Debug)]
pub struct RequestCodeAllocator {
    next: AtomicU32,
}

impl RequestCodeAllocator {
    pub const MAX: u32 = 2_000_000_000;

    /// Start at a random offset so codes from a previous process are unlikely to collide
    pub fn new() -> Self {
        Self::starting_at(rand::rng().random_range(1..=Self::MAX))
    }

    pub fn starting_at(start: u32) -> Self {
        Self {
            next: AtomicU32::new(start),
        }
    }

    pub fn next_code(&self) -> u32 {
        let raw = self.next.fetch_add(1, Ordering::Relaxed);
        raw.wrapping_sub(1) % Self::MAX + 1
    }
}

impl Default for RequestCodeAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Turns a `CanonicalMessage` into a `BuiltNotification`.
///
/// Owns the image cache and the request-code allocator, and shares the per-id
/// line records with the tap and dismiss handlers.
pub struct NotificationRenderer {
    config: RwLock<Arc<PushConfig>>,
    resources: Arc<dyn ResourceResolver>,
    records: Arc<NotificationRecords>,
    images: ImageFetcher,
    request_codes: RequestCodeAllocator,
}

impl NotificationRenderer {
    pub fn new(
        config: Arc<PushConfig>,
        resources: Arc<dyn ResourceResolver>,
        records: Arc<NotificationRecords>,
    ) -> PushResult<Self> {
        let images = ImageFetcher::new(config.image_connect_timeout(), config.image_timeout())?;
        Ok(Self {
            config: RwLock::new(config),
            resources,
            records,
            images,
            request_codes: RequestCodeAllocator::new(),
        })
    }

    pub fn with_request_codes(mut self, request_codes: RequestCodeAllocator) -> Self {
        self.request_codes = request_codes;
        self
    }

    pub fn config(&self) -> Arc<PushConfig> {
        self.config.read().clone()
    }

    /// Replace the configuration used by later renders. Image timeouts keep the values
    /// the renderer was built with.
    pub fn update_config(&self, config: Arc<PushConfig>) {
        *self.config.write() = config;
    }

    pub fn records(&self) -> &Arc<NotificationRecords> {
        &self.records
    }

    pub fn images(&self) -> &ImageFetcher {
        &self.images
    }

    pub fn next_request_code(&self) -> u32 {
        self.request_codes.next_code()
    }

    /// Messages with neither a body nor a title are data-only and are not rendered
    pub fn has_visible_content(message: &CanonicalMessage) -> bool {
        message.non_empty(keys::MESSAGE).is_some() || message.non_empty(keys::TITLE).is_some()
    }

    pub async fn render(&self, message: &CanonicalMessage) -> BuiltNotification {
        let config = self.config();
        let id = message.not_id();
        let app_name = self.resources.app_name();

        let channel_id = message
            .non_empty(keys::CHANNEL_ID)
            .unwrap_or_else(|| config.default_channel_id.clone());

        let content_action = PendingAction {
            handler: ActionHandler::Activity,
            request_code: self.next_request_code(),
            not_id: id,
            callback: None,
            foreground: true,
            dismissed: false,
        };
        let delete_action = PendingAction {
            handler: ActionHandler::Receiver,
            request_code: self.next_request_code(),
            not_id: id,
            callback: None,
            foreground: false,
            dismissed: true,
        };

        let mut built = BuiltNotification::new(
            id,
            app_name.clone(),
            channel_id,
            message.clone(),
            content_action,
            delete_action,
        );

        let title = message
            .non_empty(keys::TITLE)
            .unwrap_or_else(|| app_name.clone());
        built.title = Some(styled_text(&title));
        built.ticker = built.title.clone();

        if let Some(pattern) = message.non_empty(keys::VIBRATION_PATTERN) {
            built.vibration_pattern = Some(parse_vibration_pattern(&pattern));
        } else if config.vibrate {
            built.default_vibrate = true;
        }

        built.color = self.icon_color(message, &config);
        built.small_icon = self.small_icon(message, &config);
        built.large_icon = self.large_icon(message).await;

        if config.sound {
            built.sound = Some(self.sound(message));
        }

        if let Some(led) = message.non_empty(keys::LED_COLOR) {
            match parse_led_color(&led) {
                Ok(lights) => built.lights = Some(lights),
                Err(e) => tracing::warn!(error = %e, "Skipping LED colour"),
            }
        }

        built.priority = ranged(message, keys::PRIORITY, &PRIORITY_RANGE);
        built.visibility = ranged(message, keys::VISIBILITY, &VISIBILITY_RANGE);

        self.apply_style(&mut built, message).await;

        if let Some(count) = message.non_empty(keys::COUNT) {
            match parse_count(&count) {
                Ok(number) => built.number = Some(number),
                Err(e) => tracing::warn!(error = %e, "Skipping badge number"),
            }
        }

        built.ongoing = message.flag(keys::ONGOING);
        built.actions = self.actions(message, id);

        tracing::debug!(
            not_id = %id,
            actions = built.actions.len(),
            "Built notification"
        );
        built
    }

    async fn apply_style(&self, built: &mut BuiltNotification, message: &CanonicalMessage) {
        let body = message.non_empty(keys::MESSAGE);
        let title = message.non_empty(keys::TITLE).map(|t| styled_text(&t));
        let summary = message.non_empty(keys::SUMMARY_TEXT);
        let style = message
            .non_empty(keys::STYLE)
            .unwrap_or_else(|| keys::STYLE_TEXT.to_string());

        match style.as_str() {
            keys::STYLE_INBOX => {
                let lines = self
                    .records
                    .append(built.id, body.as_deref().unwrap_or_default());
                built.content_text = body.as_deref().map(styled_text);

                if lines.len() > 1 {
                    let count = lines.len().to_string();
                    let summary_text = match summary {
                        Some(template) => template.replace("%n%", &count),
                        None => format!("{} more", count),
                    };
                    built.style = NotificationStyle::Inbox {
                        big_content_title: title,
                        summary_text: Some(styled_text(&summary_text)),
                        lines: lines.iter().rev().map(|line| styled_text(line)).collect(),
                    };
                } else if let Some(body) = body {
                    built.style = NotificationStyle::BigText {
                        big_text: styled_text(&body),
                        big_content_title: title,
                        summary_text: None,
                    };
                }
            },
            keys::STYLE_PICTURE => {
                self.records.clear(built.id);
                let picture = match message.non_empty(keys::PICTURE) {
                    Some(source) => self.resolve_image(&source).await,
                    None => {
                        tracing::warn!("Picture style without a picture");
                        None
                    },
                };
                built.title = title.clone().or(built.title.take());
                built.content_text = body.as_deref().map(styled_text);
                built.style = NotificationStyle::BigPicture {
                    picture,
                    big_content_title: title,
                    summary_text: summary.as_deref().map(styled_text),
                };
            },
            other => {
                if other != keys::STYLE_TEXT {
                    tracing::warn!(style = other, "Unknown style, rendering as text");
                }
                self.records.clear(built.id);
                // Without a body the notification stays title-only
                if let Some(body) = body {
                    let big_text = styled_text(&body);
                    built.content_text = Some(big_text.clone());
                    built.style = NotificationStyle::BigText {
                        big_text,
                        big_content_title: title,
                        summary_text: summary.as_deref().map(styled_text),
                    };
                }
            },
        }
    }

    /// Explicit colour, then the configured default
    fn icon_color(&self, message: &CanonicalMessage, config: &PushConfig) -> Option<u32> {
        [message.non_empty(keys::COLOR), config.icon_color.clone()]
            .into_iter()
            .flatten()
            .find_map(|value| match parse_color(&value) {
                Ok(argb) => Some(argb),
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring icon colour");
                    None
                },
            })
            .filter(|argb| *argb != 0)
    }

    /// Explicit icon, then the configured default, then the application icon
    fn small_icon(&self, message: &CanonicalMessage, config: &PushConfig) -> ResourceId {
        [message.non_empty(keys::ICON), config.icon.clone()]
            .into_iter()
            .flatten()
            .find_map(|name| {
                let resolved = self.resources.resolve_drawable(&name);
                if resolved.is_none() {
                    let e = PushError::resource_unavailable("icon", name);
                    tracing::warn!(error = %e, "Falling back to next small icon");
                }
                resolved
            })
            .unwrap_or_else(|| self.resources.application_icon())
    }

    async fn large_icon(&self, message: &CanonicalMessage) -> Option<LargeIcon> {
        let source = message.non_empty(keys::IMAGE)?;
        let image = self.resolve_image(&source).await?;
        Some(LargeIcon {
            image,
            mask: IconMask::from_image_type(message.get_str(keys::IMAGE_TYPE)),
        })
    }

    /// Remote URL, then bundled asset, then resource
    async fn resolve_image(&self, source: &str) -> Option<ImageRef> {
        if let Some(url) = image_utils::remote_url(source) {
            return match self.images.fetch(&url).await {
                Ok(path) => Some(ImageRef::Remote {
                    url: source.to_string(),
                    path,
                }),
                Err(e) => {
                    tracing::warn!(error = %e, "Continuing without image");
                    None
                },
            };
        }

        if let Some(path) = self.resources.asset_path(source) {
            return Some(ImageRef::Asset(path));
        }

        match self.resources.resolve_drawable(source) {
            Some(id) => Some(ImageRef::Resource(id)),
            None => {
                let e = PushError::resource_unavailable("image", source);
                tracing::warn!(error = %e, "Continuing without image");
                None
            },
        }
    }

    fn sound(&self, message: &CanonicalMessage) -> SoundSource {
        match message.non_empty(keys::SOUND).as_deref() {
            Some("ringtone") => SoundSource::Ringtone,
            None | Some("default") => SoundSource::Default,
            Some(name) => SoundSource::Bundled {
                uri: format!(
                    "android.resource://{}/raw/{}",
                    self.resources.package_name(),
                    name
                ),
            },
        }
    }

    fn actions(&self, message: &CanonicalMessage, id: NotId) -> Vec<ActionButton> {
        let Some(value) = message.get(keys::ACTIONS) else {
            return Vec::new();
        };

        let entries = match value {
            serde_json::Value::Array(entries) => entries.clone(),
            serde_json::Value::String(encoded) => {
                match serde_json::from_str::<Vec<serde_json::Value>>(encoded) {
                    Ok(entries) => entries,
                    Err(e) => {
                        let err = PushError::malformed_field(keys::ACTIONS, encoded.as_str(), e.to_string());
                        tracing::warn!(error = %err, "Skipping actions");
                        return Vec::new();
                    },
                }
            },
            other => {
                let err = PushError::malformed_field(
                    keys::ACTIONS,
                    other.to_string(),
                    "expected a JSON array",
                );
                tracing::warn!(error = %err, "Skipping actions");
                return Vec::new();
            },
        };

        let mut buttons = Vec::with_capacity(entries.len());
        let mut inline_taken = false;

        for entry in entries {
            let spec = match serde_json::from_value::<ActionSpec>(entry) {
                Ok(spec) => spec,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping malformed action");
                    continue;
                },
            };

            // Only one action per notification can carry a reply field
            let inline = spec.inline && !inline_taken;
            if spec.inline && inline_taken {
                tracing::warn!(callback = %spec.callback, "Second inline action, dropping its reply field");
            }
            inline_taken |= inline;

            let handler = if inline || !spec.foreground {
                ActionHandler::Receiver
            } else {
                ActionHandler::Activity
            };

            let icon = spec.icon.as_deref().and_then(|name| {
                let resolved = self.resources.resolve_drawable(name);
                if resolved.is_none() {
                    tracing::warn!(icon = name, "Action icon not found");
                }
                resolved
            });

            let inline_reply = inline.then(|| InlineReply {
                result_key: keys::INLINE_REPLY.to_string(),
                label: spec
                    .reply_label
                    .clone()
                    .filter(|l| !l.is_empty())
                    .unwrap_or_else(|| DEFAULT_REPLY_LABEL.to_string()),
            });

            tracing::debug!(callback = %spec.callback, ?handler, "Adding action");
            buttons.push(ActionButton {
                title: spec.title,
                icon,
                action: PendingAction {
                    handler,
                    request_code: self.next_request_code(),
                    not_id: id,
                    callback: Some(spec.callback),
                    foreground: spec.foreground,
                    dismissed: false,
                },
                inline_reply,
            });
        }

        buttons
    }
}

fn ranged(
    message: &CanonicalMessage,
    field: &str,
    range: &std::ops::RangeInclusive<i32>,
) -> Option<i32> {
    let value = message.non_empty(field)?;
    match parse_ranged(field, &value, range) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!(error = %e, "Leaving {} unset", field);
            None
        },
    }
}
