// Raw provider payloads and the canonical message they normalize into

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::keys::{self, KeyOverrides, normalize_key};
use super::localization::LocalizationResolver;
use super::platform::ResourceResolver;
use super::{NotId, PushError};

/// Unordered string-keyed map as delivered by the push provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawPayload(Map<String, Value>);

impl RawPayload {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Parse a JSON object into a payload; anything other than an object is rejected
    pub fn from_json_str(json: &str) -> Result<Self, PushError> {
        match serde_json::from_str::<Value>(json) {
            Ok(Value::Object(map)) => Ok(Self(map)),
            Ok(other) => Err(PushError::MalformedPayload {
                key: "<root>".to_string(),
                reason: format!("expected a JSON object, found {}", json_type(&other)),
            }),
            Err(e) => Err(PushError::MalformedPayload {
                key: "<root>".to_string(),
                reason: e.to_string(),
            }),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for RawPayload {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for RawPayload {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Provider-agnostic message: recognized canonical fields plus passthrough data.
///
/// Built fresh per payload. After normalization only the lifecycle flags
/// (`foreground`, `coldstart`, `dismissed`) and tap results are added.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalMessage(Map<String, Value>);

impl CanonicalMessage {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn insert_str(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), Value::String(value.into()));
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn set_flag(&mut self, key: &str, value: bool) {
        self.0.insert(key.to_string(), Value::Bool(value));
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Field as text; scalars are rendered, null is absent
    pub fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Non-empty text field
    pub fn non_empty(&self, key: &str) -> Option<String> {
        self.text(key).filter(|s| !s.is_empty())
    }

    /// Providers send flags as `"1"`, `"true"`, `1` or `true`
    pub fn flag(&self, key: &str) -> bool {
        match self.0.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => matches!(s.trim(), "1" | "true"),
            Some(Value::Number(n)) => n.as_i64() == Some(1),
            _ => false,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Entries outside the canonical key set
    pub fn passthrough(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter().filter(|(k, _)| !keys::is_recognized(k))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn not_id(&self) -> NotId {
        let parsed = match self.0.get(keys::NOT_ID) {
            None => return NotId::default(),
            Some(Value::Number(n)) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
            Some(Value::String(s)) => s.trim().parse::<i32>().ok(),
            Some(_) => None,
        };
        parsed.map(NotId).unwrap_or_else(|| {
            tracing::warn!(value = ?self.0.get(keys::NOT_ID), "Unparseable notId, using 0");
            NotId::default()
        })
    }

    /// Shape handed to the host bridge: display fields at the top level, everything
    /// else (lifecycle flags included) under `additionalData`.
    pub fn to_host_json(&self) -> Value {
        const TOP_LEVEL: &[&str] = &[
            keys::TITLE,
            keys::MESSAGE,
            keys::COUNT,
            keys::SOUND,
            keys::IMAGE,
        ];

        let mut json = Map::new();
        let mut additional = Map::new();

        for (key, value) in &self.0 {
            if TOP_LEVEL.contains(&key.as_str()) {
                json.insert(key.clone(), value.clone());
                continue;
            }
            let value = match value {
                Value::String(s) if s.starts_with('{') || s.starts_with('[') => {
                    serde_json::from_str::<Value>(s)
                        .ok()
                        .filter(|v| v.is_object() || v.is_array())
                        .unwrap_or_else(|| value.clone())
                },
                _ => value.clone(),
            };
            additional.insert(key.clone(), value);
        }

        json.insert("additionalData".to_string(), Value::Object(additional));
        Value::Object(json)
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for CanonicalMessage {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Walks a raw payload and folds it onto the canonical schema
pub struct PayloadNormalizer {
    overrides: KeyOverrides,
    localizer: LocalizationResolver,
}

impl PayloadNormalizer {
    pub fn new(overrides: KeyOverrides, resources: Arc<dyn ResourceResolver>) -> Self {
        Self {
            overrides,
            localizer: LocalizationResolver::new(resources),
        }
    }

    pub fn overrides(&self) -> &KeyOverrides {
        &self.overrides
    }

    /// Normalize one payload.
    ///
    /// When two raw keys land on the same canonical key the later one in enumeration
    /// order wins.
    pub fn normalize(&self, raw: &RawPayload) -> CanonicalMessage {
        tracing::debug!(keys = raw.len(), "Normalizing payload");
        let mut out = CanonicalMessage::new();

        for (key, value) in raw.iter() {
            if self.is_wrapper_key(key)
                && let Value::String(encoded) = value
                && encoded.starts_with('{')
                && self.promote_nested(key, encoded, &mut out)
            {
                continue;
            }

            if key == keys::NOTIFICATION
                && let Value::Object(inner) = value
            {
                for (inner_key, inner_value) in inner {
                    tracing::debug!(key = %inner_key, "Flattening notification/{}", inner_key);
                    self.put_text(&mut out, inner_key, &stringify(inner_value));
                }
                continue;
            }

            self.put_value(&mut out, key, value);
        }

        out
    }

    fn is_wrapper_key(&self, key: &str) -> bool {
        key == keys::DATA || key == keys::MESSAGE || self.overrides.is_message_key(key)
    }

    /// Flatten a JSON-encoded message into the root. Returns false when the outer pair
    /// should be handled as a single entry instead.
    fn promote_nested(&self, key: &str, encoded: &str, out: &mut CanonicalMessage) -> bool {
        let inner = match serde_json::from_str::<Map<String, Value>>(encoded) {
            Ok(inner) => inner,
            Err(e) => {
                let err = PushError::MalformedPayload {
                    key: key.to_string(),
                    reason: e.to_string(),
                };
                tracing::debug!(error = %err, "Keeping value as an opaque string");
                return false;
            },
        };

        if inner.keys().any(|k| self.overrides.is_body_or_title(k)) {
            tracing::debug!(key, "Extracting nested message data");
            for (inner_key, inner_value) in &inner {
                tracing::debug!("key = {}/{}", key, inner_key);
                self.put_text(out, inner_key, &stringify(inner_value));
            }
            return true;
        }

        if inner.contains_key(keys::LOC_KEY) || inner.contains_key(keys::LOC_DATA) {
            tracing::debug!(key, "Nested value is a localization template");
        } else {
            tracing::debug!(key, "Nested object has no message fields, keeping it whole");
        }
        false
    }

    fn put_text(&self, out: &mut CanonicalMessage, raw_key: &str, value: &str) {
        let key = normalize_key(raw_key, &self.overrides, out);
        let value = self.localizer.localize(&key, value);
        out.insert_str(key, value);
    }

    fn put_value(&self, out: &mut CanonicalMessage, raw_key: &str, value: &Value) {
        let key = normalize_key(raw_key, &self.overrides, out);
        if key != raw_key {
            tracing::debug!("replace key {} with {}", raw_key, key);
        }
        match value {
            Value::Null => {},
            Value::String(s) => {
                let localized = self.localizer.localize(&key, s);
                out.insert_str(key, localized);
            },
            other => out.insert(key, other.clone()),
        }
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
