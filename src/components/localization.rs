// Localized-template resolution for canonical text fields

use std::sync::Arc;

use serde_json::{Map, Value};

use super::keys;
use super::platform::ResourceResolver;

/// Fields whose value may be a `{"loc-key": ..., "loc-data": [...]}` template
const LOCALIZABLE: &[&str] = &[keys::TITLE, keys::MESSAGE, keys::SUMMARY_TEXT];

pub struct LocalizationResolver {
    resources: Arc<dyn ResourceResolver>,
}

impl LocalizationResolver {
    pub fn new(resources: Arc<dyn ResourceResolver>) -> Self {
        Self { resources }
    }

    /// Resolve `value` against the string table when `key` is localizable and the value
    /// is a localization template. Any failure returns `value` unchanged.
    pub fn localize(&self, key: &str, value: &str) -> String {
        if !LOCALIZABLE.contains(&key) {
            return value.to_string();
        }

        let Some((loc_key, args)) = parse_template(value) else {
            return value.to_string();
        };

        match self.resources.localized_string(&loc_key, &args) {
            Some(resolved) => resolved,
            None => {
                tracing::debug!(loc_key = %loc_key, "can't find resource for locale key");
                value.to_string()
            },
        }
    }
}

fn parse_template(value: &str) -> Option<(String, Vec<String>)> {
    let object = match serde_json::from_str::<Map<String, Value>>(value) {
        Ok(object) => object,
        Err(_) => return None,
    };

    let loc_key = object.get(keys::LOC_KEY)?.as_str()?.to_string();

    let args = match object.get(keys::LOC_DATA) {
        Some(Value::Array(items)) => items.iter().map(arg_text).collect(),
        // loc-data may itself arrive JSON-encoded
        Some(Value::String(encoded)) => match serde_json::from_str::<Vec<Value>>(encoded) {
            Ok(items) => items.iter().map(arg_text).collect(),
            Err(e) => {
                tracing::debug!(error = %e, "loc-data is not an array, ignoring template");
                return None;
            },
        },
        Some(Value::Null) | None => Vec::new(),
        Some(other) => {
            tracing::debug!(value = %other, "loc-data is not an array, ignoring template");
            return None;
        },
    };

    Some((loc_key, args))
}

fn arg_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Substitute printf-style placeholders: `%s`/`%d` consume arguments in order,
/// `%1$s` picks by position, `%%` is a literal percent. Missing arguments leave the
/// placeholder as written.
pub fn format_template(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    let mut next_arg = 0usize;

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let mut spec = String::from('%');
        let mut position: Option<usize> = None;
        let mut digits = String::new();
        while let Some(&d) = chars.peek() {
            if d.is_ascii_digit() {
                digits.push(d);
                chars.next();
            } else {
                break;
            }
        }
        spec.push_str(&digits);
        if !digits.is_empty() {
            if chars.peek() == Some(&'$') {
                chars.next();
                spec.push('$');
                position = digits.parse::<usize>().ok();
            } else {
                out.push_str(&spec);
                continue;
            }
        }

        match chars.next() {
            Some('%') if digits.is_empty() => out.push('%'),
            Some(conv @ ('s' | 'd')) => {
                let index = match position {
                    Some(p) if p > 0 => p - 1,
                    Some(_) => usize::MAX,
                    None => {
                        next_arg += 1;
                        next_arg - 1
                    },
                };
                match args.get(index) {
                    Some(arg) => out.push_str(arg),
                    None => {
                        out.push_str(&spec);
                        out.push(conv);
                    },
                }
            },
            Some(other) => {
                out.push_str(&spec);
                out.push(other);
            },
            None => out.push_str(&spec),
        }
    }

    out
}
