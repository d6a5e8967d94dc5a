//! Sanitization of host values for inclusion in events.
//!
//! Host values are arbitrary graphs; events carry JSON. The [`Sanitizer`]
//! trait is the seam between the two. [`DefaultSanitizer`] walks values into
//! [`serde_json::Value`], summarizing anything deeper than the requested depth
//! and replacing values JSON cannot represent with marker strings.

use std::borrow::Cow;

use serde_json::{Map, Number, Value};

use crate::value::{HostValue, NativeFailure, ObjectKind, Property};

/// Depth used by [`Sanitizer::normalize_to_size`] before shrinking.
pub const DEFAULT_NORMALIZE_DEPTH: usize = 3;

/// Serialized size limit used by [`Sanitizer::normalize_to_size`], in bytes.
pub const DEFAULT_MAX_SERIALIZED_SIZE: usize = 100 * 1024;

/// Length limit used by [`extract_keys_for_message`] in events.
pub const DEFAULT_MAX_KEYS_LENGTH: usize = 40;

/// Normalizes and truncates values for events.
pub trait Sanitizer: Send + Sync {
    /// Converts `value` into JSON, summarizing everything nested deeper than
    /// `depth`. `None` walks the whole value.
    fn normalize(&self, value: &HostValue, depth: Option<usize>) -> Value;

    /// Converts `value` into JSON bounded in serialized size.
    fn normalize_to_size(&self, value: &HostValue) -> Value;

    /// Shortens `text` to `max` characters.
    fn truncate<'a>(&self, text: &'a str, max: usize) -> Cow<'a, str> {
        truncate(text, max)
    }
}

/// The built-in sanitizer.
#[derive(Copy, Clone, Debug)]
pub struct DefaultSanitizer {
    /// Starting depth for size-bounded normalization.
    pub depth: usize,
    /// Maximum serialized size for size-bounded normalization, in bytes.
    pub max_size: usize,
}

impl DefaultSanitizer {
    /// Sanitizer with the default depth and size limit.
    pub const DEFAULT: Self = Self {
        depth: DEFAULT_NORMALIZE_DEPTH,
        max_size: DEFAULT_MAX_SERIALIZED_SIZE,
    };
}

impl Default for DefaultSanitizer {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Sanitizer for DefaultSanitizer {
    fn normalize(&self, value: &HostValue, depth: Option<usize>) -> Value {
        walk(value, depth)
    }

    fn normalize_to_size(&self, value: &HostValue) -> Value {
        let mut depth = self.depth;
        loop {
            let normalized = walk(value, Some(depth));
            if depth == 0 || serialized_size(&normalized) <= self.max_size {
                return normalized;
            }
            depth -= 1;
        }
    }
}

/// Keeps the first `max` characters of `text`, appending `...` if anything
/// was cut. A `max` of zero leaves the text alone.
pub fn truncate(text: &str, max: usize) -> Cow<'_, str> {
    if max == 0 {
        return Cow::Borrowed(text);
    }
    match text.char_indices().nth(max) {
        Some((end, _)) => Cow::Owned(format!("{}...", &text[..end])),
        None => Cow::Borrowed(text),
    }
}

/// Summarizes the own keys of `value` for a message.
///
/// Keys are sorted and joined with `", "`. As many keys are included as fit in
/// `max` characters; the result is truncated when not all of them do.
pub fn extract_keys_for_message(value: &HostValue, max: usize) -> String {
    let mut keys = own_keys(value);
    keys.sort_unstable();

    let Some(first) = keys.first() else {
        return "[object has no keys]".to_owned();
    };
    if first.chars().count() >= max {
        return truncate(first, max).into_owned();
    }

    for included in (1..=keys.len()).rev() {
        let serialized = keys[..included].join(", ");
        if serialized.chars().count() > max {
            continue;
        }
        if included == keys.len() {
            return serialized;
        }
        return truncate(&serialized, max).into_owned();
    }

    String::new()
}

fn own_keys(value: &HostValue) -> Vec<String> {
    match value {
        HostValue::Object(object) => object.keys().map(str::to_owned).collect(),
        HostValue::Array(items) => (0..items.len()).map(|index| index.to_string()).collect(),
        HostValue::Error(native) => native_fields(native).map(|(key, _)| key).collect(),
        HostValue::String(text) => (0..text.chars().count()).map(|index| index.to_string()).collect(),
        _ => Vec::new(),
    }
}

fn native_fields(native: &NativeFailure) -> impl Iterator<Item = (String, HostValue)> + '_ {
    let builtins = [
        ("message", HostValue::string(&*native.message)),
        ("name", HostValue::string(&*native.name)),
        (
            "stack",
            native
                .stack_text()
                .map_or(HostValue::Undefined, HostValue::String),
        ),
    ];
    builtins
        .into_iter()
        .map(|(key, value)| (key.to_owned(), value))
        .chain(
            native
                .properties
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        )
}

fn walk(value: &HostValue, depth: Option<usize>) -> Value {
    if depth == Some(0) {
        return summarize(value);
    }
    let inner = depth.map(|depth| depth - 1);

    match value {
        HostValue::Array(items) => Value::Array(items.iter().map(|item| walk(item, inner)).collect()),
        HostValue::Object(object) => {
            let mut map = Map::new();
            for (key, property) in object.properties() {
                if let Property::Value(value) = property {
                    map.insert(key.to_owned(), walk(value, inner));
                }
            }
            Value::Object(map)
        }
        HostValue::Error(native) => Value::Object(
            native_fields(native)
                .map(|(key, value)| (key, walk(&value, inner)))
                .collect(),
        ),
        primitive => primitive_to_json(primitive),
    }
}

fn summarize(value: &HostValue) -> Value {
    match value {
        HostValue::Array(_) => Value::String("[Array]".to_owned()),
        HostValue::Object(object) if object.kind() == ObjectKind::Plain => {
            Value::String("[Object]".to_owned())
        }
        HostValue::Object(_) | HostValue::Error(_) => Value::String(value.type_tag().to_owned()),
        primitive => primitive_to_json(primitive),
    }
}

fn primitive_to_json(value: &HostValue) -> Value {
    match value {
        HostValue::Undefined => Value::String("[undefined]".to_owned()),
        HostValue::Null => Value::Null,
        HostValue::Bool(value) => Value::Bool(*value),
        HostValue::Number(number) if number.is_nan() => Value::String("[NaN]".to_owned()),
        HostValue::Number(number) => number_to_json(*number),
        HostValue::String(text) => Value::String(text.clone()),
        compound => Value::String(compound.type_tag().to_owned()),
    }
}

fn number_to_json(number: f64) -> Value {
    if number.fract() == 0.0 && number.abs() < 9_007_199_254_740_992.0 {
        Value::Number(Number::from(number as i64))
    } else {
        Number::from_f64(number).map_or(Value::Null, Value::Number)
    }
}

fn serialized_size(value: &Value) -> usize {
    serde_json::to_string(value).map_or(0, |text| text.len())
}
