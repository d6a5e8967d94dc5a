//! Events, exceptions and capture mechanisms.

use core::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::stacktrace::Stacktrace;

/// Ordered string-keyed map of JSON values.
///
/// Used for [`Mechanism::data`] and [`Event::extra`]; insertion order is kept
/// so serialized payloads are stable.
pub type Map = IndexMap<String, serde_json::Value>;

/// Severity of an event.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Debug information.
    Debug,
    /// Informational message.
    Info,
    /// A warning.
    Warning,
    /// An error.
    Error,
    /// A fatal error.
    Fatal,
}

impl Level {
    /// Returns the wire name of the level.
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A telemetry event ready for submission.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Severity, only set on degraded events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
    /// The exceptions carried by the event.
    #[serde(default, skip_serializing_if = "ExceptionList::is_empty")]
    pub exception: ExceptionList,
    /// Auxiliary sanitized data.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extra: Map,
}

/// Wrapper around the exceptions of an [`Event`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExceptionList {
    /// The exception values, the first one being the primary exception.
    #[serde(default)]
    pub values: Vec<Exception>,
}

impl ExceptionList {
    /// Returns `true` if no exception values are present.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A single exception inside an [`Event`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Exception {
    /// The exception type, for instance `TypeError`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    /// The exception message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Frames leading up to the exception.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stacktrace: Option<Stacktrace>,
    /// How the exception was captured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mechanism: Option<Mechanism>,
}

impl Exception {
    /// Creates an exception with a type and a value and nothing else.
    pub fn new(ty: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            ty: Some(ty.into()),
            value: Some(value.into()),
            ..Default::default()
        }
    }
}

/// Describes the mechanism that captured an [`Exception`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mechanism {
    /// Name of the capturing hook, for instance `onerror`.
    #[serde(rename = "type")]
    pub ty: String,
    /// Whether the application handled the failure itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handled: Option<bool>,
    /// Free-form data about the capture.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub data: Map,
}

impl Mechanism {
    /// Creates an unhandled mechanism of the given type.
    pub fn unhandled(ty: impl Into<String>, data: Map) -> Self {
        Self {
            ty: ty.into(),
            handled: Some(false),
            data,
        }
    }
}

impl Event {
    /// Makes sure the event carries a primary exception.
    ///
    /// Creates the first exception value if it is missing and fills in
    /// `value` and `ty` only where the existing exception left them empty.
    /// The mechanism is always replaced with `mechanism`.
    pub fn ensure_exception(&mut self, ty: &str, value: &str, mechanism: Mechanism) {
        if self.exception.values.is_empty() {
            self.exception.values.push(Exception::default());
        }
        let first = &mut self.exception.values[0];

        if first.value.as_deref().is_none_or(str::is_empty) {
            first.value = Some(value.to_owned());
        }
        if first.ty.as_deref().is_none_or(str::is_empty) {
            first.ty = Some(if ty.is_empty() { "Error" } else { ty }.to_owned());
        }
        first.mechanism = Some(mechanism);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_exception_creates_missing_value() {
        let mut event = Event::default();
        event.ensure_exception("Error", "fallback", Mechanism::unhandled("onerror", Map::new()));

        assert_eq!(event.exception.values.len(), 1);
        let exception = &event.exception.values[0];
        assert_eq!(exception.ty.as_deref(), Some("Error"));
        assert_eq!(exception.value.as_deref(), Some("fallback"));
        assert_eq!(exception.mechanism.as_ref().unwrap().handled, Some(false));
    }

    #[test]
    fn ensure_exception_keeps_existing_fields() {
        let mut event = Event::default();
        event
            .exception
            .values
            .push(Exception::new("TypeError", "x is not a function"));
        event.ensure_exception(
            "UnhandledRejection",
            "fallback",
            Mechanism::unhandled("onunhandledrejection", Map::new()),
        );

        let exception = &event.exception.values[0];
        assert_eq!(exception.ty.as_deref(), Some("TypeError"));
        assert_eq!(exception.value.as_deref(), Some("x is not a function"));
        assert_eq!(
            exception.mechanism.as_ref().unwrap().ty,
            "onunhandledrejection"
        );
    }

    #[test]
    fn ensure_exception_fills_empty_value() {
        let mut event = Event::default();
        event.exception.values.push(Exception {
            ty: None,
            value: Some(String::new()),
            ..Default::default()
        });
        event.ensure_exception("", "", Mechanism::unhandled("onerror", Map::new()));

        let exception = &event.exception.values[0];
        assert_eq!(exception.ty.as_deref(), Some("Error"));
        assert_eq!(exception.value.as_deref(), Some(""));
    }
}
