use std::borrow::Cow;

use unhandled_protocol::{Event, Map, Mechanism};

use crate::{
    convert::EventConverter,
    sanitize::Sanitizer,
    trace::{CanonicalStackTrace, MechanismKind, TraceMessage},
    value::HostValue,
};

/// Maximum length of fallback exception values when none is configured.
pub const DEFAULT_MAX_VALUE_LENGTH: usize = 250;

/// Message used for synchronous failures whose message could not be read.
pub const NO_ERROR_MESSAGE: &str = "No error message";

/// Builds events from canonical traces.
#[derive(Copy, Clone)]
pub struct EventBuilder<'a> {
    converter: &'a dyn EventConverter,
    sanitizer: &'a dyn Sanitizer,
    max_value_length: usize,
}

impl<'a> EventBuilder<'a> {
    /// Creates a builder using the given collaborators.
    pub fn new(converter: &'a dyn EventConverter, sanitizer: &'a dyn Sanitizer) -> Self {
        Self {
            converter,
            sanitizer,
            max_value_length: DEFAULT_MAX_VALUE_LENGTH,
        }
    }

    /// Sets the maximum length of fallback values.
    ///
    /// `None` and zero select [`DEFAULT_MAX_VALUE_LENGTH`].
    pub fn max_value_length(mut self, max_value_length: Option<usize>) -> Self {
        self.max_value_length = max_value_length
            .filter(|&max| max > 0)
            .unwrap_or(DEFAULT_MAX_VALUE_LENGTH);
        self
    }

    pub(super) fn sanitizer(&self) -> &'a dyn Sanitizer {
        self.sanitizer
    }

    /// Builds the event for a failure observed by `hook`.
    ///
    /// `original` is the failure as the hook saw it. It is only consulted on
    /// the degraded rejection path.
    ///
    /// The returned event always has a first exception whose mechanism is
    /// unhandled and typed after `hook`.
    pub fn build_event(
        &self,
        trace: &CanonicalStackTrace,
        hook: MechanismKind,
        original: &HostValue,
    ) -> Event {
        let trace = repair_message(trace);

        if hook == MechanismKind::OnUnhandledRejection && trace.mode().is_failed() {
            return self.build_incomplete_rejection_event(&trace, hook, original);
        }

        let mut event = self.converter.convert(&trace);

        let fallback_value = trace.original().map_or(String::new(), |original| {
            let normalized = self.sanitizer.normalize(original, None);
            let serialized = serde_json::to_string(&normalized).unwrap_or_default();
            self.sanitizer
                .truncate(&serialized, self.max_value_length)
                .into_owned()
        });

        event.ensure_exception(
            hook.fallback_type(),
            &fallback_value,
            Mechanism::unhandled(hook.as_str(), mechanism_data(&trace)),
        );
        event
    }
}

impl core::fmt::Debug for EventBuilder<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventBuilder")
            .field("max_value_length", &self.max_value_length)
            .finish_non_exhaustive()
    }
}

/// Replaces non-text messages of synchronous failures with the nested
/// `error.message`, or [`NO_ERROR_MESSAGE`].
fn repair_message(trace: &CanonicalStackTrace) -> Cow<'_, CanonicalStackTrace> {
    let TraceMessage::Unexpected(message) = trace.message() else {
        return Cow::Borrowed(trace);
    };
    if trace.mechanism() == MechanismKind::OnUnhandledRejection {
        return Cow::Borrowed(trace);
    }

    let nested = message
        .get("error")
        .ok()
        .flatten()
        .and_then(|error| error.get("message").ok().flatten());
    let repaired = match nested {
        Some(HostValue::String(text)) => text,
        _ => NO_ERROR_MESSAGE.to_owned(),
    };
    Cow::Owned(trace.with_message(repaired))
}

pub(super) fn mechanism_data(trace: &CanonicalStackTrace) -> Map {
    let mut data = Map::new();
    data.insert("mode".to_owned(), trace.mode().as_str().into());
    if let Some(message) = trace.message().as_text()
        && !message.is_empty()
    {
        data.insert("message".to_owned(), message.into());
    }
    if let Some(name) = trace.name()
        && !name.is_empty()
    {
        data.insert("name".to_owned(), name.into());
    }
    data
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        convert::DefaultEventConverter,
        sanitize::DefaultSanitizer,
        trace::{ComputedTrace, Frame, Mode},
        value::{HostObject, NativeFailure},
    };

    fn builder() -> EventBuilder<'static> {
        EventBuilder::new(&DefaultEventConverter, &DefaultSanitizer::DEFAULT)
    }

    #[test]
    fn test_regular_event() {
        let trace = ComputedTrace {
            mode: Mode::Stack,
            name: Some("TypeError".into()),
            message: TraceMessage::Text("x is not a function".into()),
            stack: vec![Frame::new("main", Some("a.js"), Some(1), Some(2))],
            original: None,
        }
        .with_mechanism(MechanismKind::OnError);

        let event = builder().build_event(&trace, MechanismKind::OnError, &HostValue::Null);
        assert_eq!(event.level, None);
        assert_eq!(event.exception.values.len(), 1);

        let exception = &event.exception.values[0];
        assert_eq!(exception.ty.as_deref(), Some("TypeError"));
        assert_eq!(exception.value.as_deref(), Some("x is not a function"));

        let mechanism = exception.mechanism.as_ref().unwrap();
        assert_eq!(mechanism.ty, "onerror");
        assert_eq!(mechanism.handled, Some(false));
        assert_eq!(
            serde_json::to_value(&mechanism.data).unwrap(),
            json!({ "mode": "stack", "message": "x is not a function", "name": "TypeError" })
        );
    }

    #[test]
    fn test_message_repair() {
        let nested = HostValue::from(
            HostObject::plain().with("error", NativeFailure::new("Error", "from nested error")),
        );
        let trace = ComputedTrace {
            mode: Mode::OnError,
            name: None,
            message: TraceMessage::Unexpected(nested),
            stack: vec![],
            original: None,
        }
        .with_mechanism(MechanismKind::OnError);
        let event = builder().build_event(&trace, MechanismKind::OnError, &HostValue::Null);
        assert_eq!(
            event.exception.values[0].value.as_deref(),
            Some("from nested error")
        );

        let trace = ComputedTrace {
            mode: Mode::OnError,
            name: None,
            message: TraceMessage::Unexpected(HostValue::from(7)),
            stack: vec![],
            original: None,
        }
        .with_mechanism(MechanismKind::OnError);
        let event = builder().build_event(&trace, MechanismKind::OnError, &HostValue::Null);
        assert_eq!(event.exception.values[0].value.as_deref(), Some(NO_ERROR_MESSAGE));
    }

    #[test]
    fn test_fallback_value_is_truncated() {
        let original = HostValue::from(HostObject::plain().with("key", "x".repeat(40)));
        let trace = ComputedTrace {
            mode: Mode::OnError,
            name: None,
            message: TraceMessage::Text(String::new()),
            stack: vec![],
            original: Some(original.clone()),
        }
        .with_mechanism(MechanismKind::OnError);

        let event = EventBuilder::new(&|_: &CanonicalStackTrace| Event::default(), &DefaultSanitizer::DEFAULT)
            .max_value_length(Some(10))
            .build_event(&trace, MechanismKind::OnError, &original);

        let exception = &event.exception.values[0];
        assert_eq!(exception.value.as_deref(), Some("{\"key\":\"xx..."));
        assert_eq!(exception.ty.as_deref(), Some("Error"));
        assert_eq!(
            serde_json::to_value(&exception.mechanism.as_ref().unwrap().data).unwrap(),
            json!({ "mode": "onerror" })
        );
    }

    #[test]
    fn test_default_max_value_length() {
        let builder = builder().max_value_length(Some(0));
        assert_eq!(builder.max_value_length, DEFAULT_MAX_VALUE_LENGTH);
        assert_eq!(builder.max_value_length(Some(12)).max_value_length, 12);
    }

    #[test]
    fn test_rejection_with_stack_uses_regular_path() {
        let trace = ComputedTrace {
            mode: Mode::Stack,
            name: Some("Error".into()),
            message: TraceMessage::Text("rejected".into()),
            stack: vec![Frame::new("load", Some("a.js"), Some(1), Some(1))],
            original: None,
        }
        .with_mechanism(MechanismKind::OnUnhandledRejection);

        let event =
            builder().build_event(&trace, MechanismKind::OnUnhandledRejection, &HostValue::Null);
        assert_eq!(event.level, None);
        let exception = &event.exception.values[0];
        assert_eq!(exception.ty.as_deref(), Some("Error"));
        assert_eq!(exception.mechanism.as_ref().unwrap().ty, "onunhandledrejection");
    }
}
