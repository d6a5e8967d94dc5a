//! Host-side failure values.
//!
//! Uncaught failures arrive from the host as loosely-typed values: native
//! error objects, error-event wrappers around them, rejection events carrying a
//! `reason`, plain objects or bare primitives. [`HostValue`] models all of
//! these, and [`HostValue::shape`] classifies a value into the handful of
//! [`Shape`]s the normalizers care about, so no code in this crate has to probe
//! properties ad hoc.
//!
//! Property reads can fail: a host object may expose an accessor that throws
//! when read. Such properties are modeled by [`Property::Throwing`], and
//! reading them yields a [`PropertyAccessError`] instead of a value.

use core::fmt;

use indexmap::IndexMap;
use triomphe::Arc;

use crate::{PropertyAccessError, trace::Frame};

/// Property marking a failure that was caused by this crate's own delivery
/// attempt. A failure carrying it with the value `true` is never reported.
pub const SELF_DELIVERY_MARKER: &str = "__unhandled_own_request__";

/// A dynamically-typed value handed over by the host.
///
/// Compound values are reference counted, so cloning a [`HostValue`] is
/// always cheap.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum HostValue {
    /// The absence of a value.
    #[default]
    Undefined,
    /// An explicit null.
    Null,
    /// A boolean.
    Bool(bool),
    /// A number.
    Number(f64),
    /// A string.
    String(String),
    /// An array of values.
    Array(Arc<Vec<HostValue>>),
    /// An object that is not a native failure.
    Object(Arc<HostObject>),
    /// A structured native failure object.
    Error(Arc<NativeFailure>),
}

/// Classification of a [`HostValue`] by capability.
#[derive(Copy, Clone, Debug)]
pub enum Shape<'a> {
    /// A structured failure the stack computer can work with.
    NativeFailure(&'a NativeFailure),
    /// An error-event wrapper exposing `error` and `message`.
    EventWrapper(&'a HostObject),
    /// Any other object or array.
    PlainReason(&'a HostValue),
    /// A primitive: undefined, null, boolean, number or string.
    Primitive(&'a HostValue),
}

impl HostValue {
    /// Creates a string value.
    pub fn string(value: impl Into<String>) -> Self {
        HostValue::String(value.into())
    }

    /// Classifies the value.
    pub fn shape(&self) -> Shape<'_> {
        match self {
            HostValue::Error(native) => Shape::NativeFailure(native),
            HostValue::Object(object) if object.kind() == ObjectKind::ErrorEvent => {
                Shape::EventWrapper(object)
            }
            HostValue::Object(_) | HostValue::Array(_) => Shape::PlainReason(self),
            _ => Shape::Primitive(self),
        }
    }

    /// Returns `true` for undefined, null, booleans, numbers and strings.
    pub fn is_primitive(&self) -> bool {
        matches!(self.shape(), Shape::Primitive(_))
    }

    /// Returns `true` for undefined and null.
    pub fn is_nullish(&self) -> bool {
        matches!(self, HostValue::Undefined | HostValue::Null)
    }

    /// Returns the contained string, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::String(text) => Some(text),
            _ => None,
        }
    }

    /// Returns `true` if the value exposes the property `key`.
    ///
    /// Never reads the property, so throwing accessors count as present.
    pub fn has_property(&self, key: &str) -> bool {
        match self {
            HostValue::Object(object) => object.has(key),
            HostValue::Error(native) => native.has(key),
            HostValue::Array(items) => key.parse::<usize>().is_ok_and(|index| index < items.len()),
            _ => false,
        }
    }

    /// Reads the property `key`.
    ///
    /// Primitives have no properties and return `Ok(None)`.
    pub fn get(&self, key: &str) -> Result<Option<HostValue>, PropertyAccessError> {
        match self {
            HostValue::Object(object) => Ok(object.get(key)?.cloned()),
            HostValue::Error(native) => Ok(native.get(key)),
            HostValue::Array(items) => Ok(key
                .parse::<usize>()
                .ok()
                .and_then(|index| items.get(index))
                .cloned()),
            _ => Ok(None),
        }
    }

    /// Returns `true` if the value carries the [`SELF_DELIVERY_MARKER`] set to
    /// `true`.
    pub fn is_self_delivery(&self) -> bool {
        matches!(
            self.get(SELF_DELIVERY_MARKER),
            Ok(Some(HostValue::Bool(true)))
        )
    }

    /// The host's internal type tag, such as `[object Object]`.
    pub fn type_tag(&self) -> &'static str {
        match self {
            HostValue::Undefined => "[object Undefined]",
            HostValue::Null => "[object Null]",
            HostValue::Bool(_) => "[object Boolean]",
            HostValue::Number(_) => "[object Number]",
            HostValue::String(_) => "[object String]",
            HostValue::Array(_) => "[object Array]",
            HostValue::Error(_) => "[object Error]",
            HostValue::Object(object) => match object.kind() {
                ObjectKind::Plain => "[object Object]",
                ObjectKind::ErrorEvent => "[object ErrorEvent]",
                ObjectKind::RejectionEvent => "[object PromiseRejectionEvent]",
            },
        }
    }
}

/// Formats the value the way the host converts values to strings.
impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Undefined => f.write_str("undefined"),
            HostValue::Null => f.write_str("null"),
            HostValue::Bool(value) => write!(f, "{value}"),
            HostValue::Number(value) => fmt_number(*value, f),
            HostValue::String(value) => f.write_str(value),
            HostValue::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(",")?;
                    }
                    if !item.is_nullish() {
                        write!(f, "{item}")?;
                    }
                }
                Ok(())
            }
            HostValue::Error(native) => write!(f, "{native}"),
            HostValue::Object(_) => f.write_str(self.type_tag()),
        }
    }
}

fn fmt_number(value: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if value.is_nan() {
        f.write_str("NaN")
    } else if value.is_infinite() {
        f.write_str(if value > 0.0 { "Infinity" } else { "-Infinity" })
    } else if value == 0.0 {
        f.write_str("0")
    } else {
        write!(f, "{value}")
    }
}

impl From<&str> for HostValue {
    fn from(value: &str) -> Self {
        HostValue::String(value.to_owned())
    }
}

impl From<String> for HostValue {
    fn from(value: String) -> Self {
        HostValue::String(value)
    }
}

impl From<bool> for HostValue {
    fn from(value: bool) -> Self {
        HostValue::Bool(value)
    }
}

impl From<f64> for HostValue {
    fn from(value: f64) -> Self {
        HostValue::Number(value)
    }
}

impl From<i32> for HostValue {
    fn from(value: i32) -> Self {
        HostValue::Number(f64::from(value))
    }
}

impl From<Vec<HostValue>> for HostValue {
    fn from(value: Vec<HostValue>) -> Self {
        HostValue::Array(Arc::new(value))
    }
}

impl From<HostObject> for HostValue {
    fn from(value: HostObject) -> Self {
        HostValue::Object(Arc::new(value))
    }
}

impl From<NativeFailure> for HostValue {
    fn from(value: NativeFailure) -> Self {
        HostValue::Error(Arc::new(value))
    }
}

/// The host class of a [`HostObject`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// An ordinary object.
    #[default]
    Plain,
    /// An error event, wrapping a failure in its `error` property.
    ErrorEvent,
    /// An unhandled-rejection event, carrying a `reason` property.
    RejectionEvent,
}

/// A property of a [`HostObject`].
#[derive(Clone, Debug, PartialEq)]
pub enum Property {
    /// A plain data property.
    Value(HostValue),
    /// An accessor that throws the given message when read.
    Throwing(String),
}

/// A host object with ordered own properties.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HostObject {
    kind: ObjectKind,
    properties: IndexMap<String, Property>,
}

impl HostObject {
    /// Creates an empty object of the given kind.
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            kind,
            properties: IndexMap::new(),
        }
    }

    /// Creates an empty plain object.
    pub fn plain() -> Self {
        Self::new(ObjectKind::Plain)
    }

    /// Creates an error event wrapping `error`.
    pub fn error_event(message: impl Into<HostValue>, error: impl Into<HostValue>) -> Self {
        Self::new(ObjectKind::ErrorEvent)
            .with("message", message)
            .with("error", error)
    }

    /// Creates an unhandled-rejection event carrying `reason`.
    pub fn rejection_event(reason: impl Into<HostValue>) -> Self {
        Self::new(ObjectKind::RejectionEvent).with("reason", reason)
    }

    /// Sets the data property `key`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<HostValue>) -> Self {
        self.properties
            .insert(key.into(), Property::Value(value.into()));
        self
    }

    /// Sets `key` to an accessor that throws `message` when read.
    pub fn with_throwing_accessor(
        mut self,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.properties
            .insert(key.into(), Property::Throwing(message.into()));
        self
    }

    /// The host class of the object.
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// Returns `true` if the object has the own property `key`.
    pub fn has(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// Reads the own property `key`.
    pub fn get(&self, key: &str) -> Result<Option<&HostValue>, PropertyAccessError> {
        match self.properties.get(key) {
            None => Ok(None),
            Some(Property::Value(value)) => Ok(Some(value)),
            Some(Property::Throwing(message)) => Err(PropertyAccessError {
                key: key.to_owned(),
                message: message.clone(),
            }),
        }
    }

    /// Iterates over the own properties in insertion order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.properties
            .iter()
            .map(|(key, property)| (key.as_str(), property))
    }

    /// Iterates over the own property names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Number of own properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Returns `true` if the object has no own properties.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// A structured failure object, such as a thrown error.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NativeFailure {
    /// The failure type, for instance `TypeError`.
    pub name: String,
    /// The failure message.
    pub message: String,
    /// Frames already resolved by the host, most recent call first. Empty
    /// when the host could not provide any.
    pub stack: Vec<Frame>,
    /// Additional own properties.
    pub properties: IndexMap<String, HostValue>,
}

impl NativeFailure {
    /// Creates a failure without frames.
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            ..Default::default()
        }
    }

    /// Sets the resolved frames.
    pub fn with_stack(mut self, stack: Vec<Frame>) -> Self {
        self.stack = stack;
        self
    }

    /// Sets an additional own property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<HostValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Marks the failure as caused by this crate's own delivery attempt.
    pub fn mark_self_delivery(self) -> Self {
        self.with_property(SELF_DELIVERY_MARKER, true)
    }

    /// Returns `true` if the failure exposes the property `key`.
    pub fn has(&self, key: &str) -> bool {
        matches!(key, "name" | "message")
            || (key == "stack" && !self.stack.is_empty())
            || self.properties.contains_key(key)
    }

    /// Reads the property `key`.
    pub fn get(&self, key: &str) -> Option<HostValue> {
        match key {
            "name" => Some(HostValue::string(&*self.name)),
            "message" => Some(HostValue::string(&*self.message)),
            "stack" => self.stack_text().map(HostValue::String),
            _ => self.properties.get(key).cloned(),
        }
    }

    /// Renders the resolved frames one per line, or `None` without frames.
    pub fn stack_text(&self) -> Option<String> {
        if self.stack.is_empty() {
            return None;
        }
        let lines: Vec<String> = self
            .stack
            .iter()
            .map(|frame| format!("    at {frame}"))
            .collect();
        Some(lines.join("\n"))
    }
}

impl fmt::Display for NativeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.name.is_empty(), self.message.is_empty()) {
            (true, true) => f.write_str("Error"),
            (false, true) => f.write_str(&self.name),
            (true, false) => write!(f, "Error: {}", self.message),
            (false, false) => write!(f, "{}: {}", self.name, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_classification() {
        let native = HostValue::from(NativeFailure::new("TypeError", "nope"));
        assert!(matches!(native.shape(), Shape::NativeFailure(_)));

        let event = HostValue::from(HostObject::error_event("boom", HostValue::Null));
        assert!(matches!(event.shape(), Shape::EventWrapper(_)));

        let rejection = HostValue::from(HostObject::rejection_event(1));
        assert!(matches!(rejection.shape(), Shape::PlainReason(_)));

        let array = HostValue::from(vec![HostValue::from(1)]);
        assert!(matches!(array.shape(), Shape::PlainReason(_)));

        for primitive in [
            HostValue::Undefined,
            HostValue::Null,
            HostValue::Bool(false),
            HostValue::from(42),
            HostValue::from("text"),
        ] {
            assert!(primitive.is_primitive(), "{primitive:?}");
        }
    }

    #[test]
    fn test_throwing_accessor() {
        let object = HostObject::plain().with_throwing_accessor("reason", "denied");
        assert!(object.has("reason"));
        let error = object.get("reason").unwrap_err();
        assert_eq!(error.key, "reason");
        assert_eq!(error.message, "denied");
    }

    #[test]
    fn test_self_delivery_marker() {
        let marked = HostValue::from(NativeFailure::new("Error", "send failed").mark_self_delivery());
        assert!(marked.is_self_delivery());

        let object = HostValue::from(HostObject::plain().with(SELF_DELIVERY_MARKER, true));
        assert!(object.is_self_delivery());

        let falsy = HostValue::from(HostObject::plain().with(SELF_DELIVERY_MARKER, "true"));
        assert!(!falsy.is_self_delivery());

        let throwing =
            HostValue::from(HostObject::plain().with_throwing_accessor(SELF_DELIVERY_MARKER, "no"));
        assert!(!throwing.is_self_delivery());

        assert!(!HostValue::from(42).is_self_delivery());
    }

    #[test]
    fn test_display_matches_host_string_conversion() {
        assert_eq!(HostValue::Undefined.to_string(), "undefined");
        assert_eq!(HostValue::Null.to_string(), "null");
        assert_eq!(HostValue::Bool(true).to_string(), "true");
        assert_eq!(HostValue::from(42).to_string(), "42");
        assert_eq!(HostValue::from(1.5).to_string(), "1.5");
        assert_eq!(HostValue::from(-0.0).to_string(), "0");
        assert_eq!(HostValue::from(f64::NAN).to_string(), "NaN");
        assert_eq!(HostValue::from(f64::NEG_INFINITY).to_string(), "-Infinity");
        assert_eq!(HostValue::from("plain").to_string(), "plain");
        assert_eq!(
            HostValue::from(vec![HostValue::from(1), HostValue::Null, HostValue::from("a")])
                .to_string(),
            "1,,a"
        );
        assert_eq!(
            HostValue::from(HostObject::plain()).to_string(),
            "[object Object]"
        );
        assert_eq!(
            HostValue::from(NativeFailure::new("RangeError", "too big")).to_string(),
            "RangeError: too big"
        );
    }

    #[test]
    fn test_native_failure_properties() {
        let native = NativeFailure::new("Error", "boom")
            .with_stack(vec![Frame::new("run", Some("app.js"), Some(3), Some(7))])
            .with_property("code", 7);
        let value = HostValue::from(native);

        assert_eq!(value.get("name").unwrap(), Some(HostValue::from("Error")));
        assert_eq!(value.get("code").unwrap(), Some(HostValue::from(7)));
        assert_eq!(
            value.get("stack").unwrap(),
            Some(HostValue::from("    at run (app.js:3:7)"))
        );
        assert!(value.has_property("stack"));
        assert!(!value.has_property("reason"));
    }
}
