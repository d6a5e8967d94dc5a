use unhandled_protocol::{Event, Exception, ExceptionList, Level, Mechanism};

use super::builder::{EventBuilder, mechanism_data};
use crate::{
    sanitize::{DEFAULT_MAX_KEYS_LENGTH, extract_keys_for_message},
    trace::{CanonicalStackTrace, MechanismKind},
    value::HostValue,
};

impl EventBuilder<'_> {
    /// Builds the event for a rejection whose trace could not be computed.
    ///
    /// The exception describes `reason` itself: its value for primitives, or
    /// its sorted keys for objects, in which case a size-bounded copy of the
    /// reason is attached as `extra.__serialized__`.
    pub fn build_incomplete_rejection_event(
        &self,
        trace: &CanonicalStackTrace,
        hook: MechanismKind,
        reason: &HostValue,
    ) -> Event {
        let mut event = Event {
            level: Some(Level::Error),
            ..Default::default()
        };

        let value = if reason.is_primitive() {
            format!("Non-Error promise rejection captured with value: {reason}")
        } else {
            event.extra.insert(
                "__serialized__".to_owned(),
                self.sanitizer().normalize_to_size(reason),
            );
            format!(
                "Non-Error promise rejection captured with keys: {}",
                extract_keys_for_message(reason, DEFAULT_MAX_KEYS_LENGTH)
            )
        };

        let mut exception = Exception::new(MechanismKind::OnUnhandledRejection.fallback_type(), value);
        exception.mechanism = Some(Mechanism::unhandled(hook.as_str(), mechanism_data(trace)));
        event.exception = ExceptionList {
            values: vec![exception],
        };
        event
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        convert::DefaultEventConverter,
        sanitize::DefaultSanitizer,
        trace::ComputedTrace,
        value::{HostObject, NativeFailure},
    };

    fn build(reason: HostValue) -> Event {
        let trace = ComputedTrace::failed(reason.clone())
            .with_mechanism(MechanismKind::OnUnhandledRejection);
        EventBuilder::new(&DefaultEventConverter, &DefaultSanitizer::DEFAULT).build_event(
            &trace,
            MechanismKind::OnUnhandledRejection,
            &reason,
        )
    }

    #[test]
    fn test_primitive_reasons() {
        for (reason, text) in [
            (HostValue::from(42), "42"),
            (HostValue::from("nope"), "nope"),
            (HostValue::Undefined, "undefined"),
            (HostValue::Null, "null"),
            (HostValue::from(false), "false"),
        ] {
            let event = build(reason);
            assert_eq!(event.level, Some(Level::Error));
            assert!(event.extra.is_empty());

            let exception = &event.exception.values[0];
            assert_eq!(exception.ty.as_deref(), Some("UnhandledRejection"));
            assert_eq!(
                exception.value.as_deref(),
                Some(format!("Non-Error promise rejection captured with value: {text}").as_str())
            );
            let mechanism = exception.mechanism.as_ref().unwrap();
            assert_eq!(mechanism.ty, "onunhandledrejection");
            assert_eq!(mechanism.handled, Some(false));
        }
    }

    #[test]
    fn test_object_reason() {
        let event = build(HostValue::from(HostObject::plain().with("b", 1).with("a", 2)));

        assert_eq!(event.exception.values.len(), 1);
        assert_eq!(
            event.exception.values[0].value.as_deref(),
            Some("Non-Error promise rejection captured with keys: a, b")
        );
        assert_eq!(event.extra["__serialized__"], json!({ "b": 1, "a": 2 }));
        assert_eq!(
            serde_json::to_value(&event.exception.values[0].mechanism.as_ref().unwrap().data)
                .unwrap(),
            json!({ "mode": "failed" })
        );
    }

    #[test]
    fn test_frameless_native_reason_keeps_name_and_message() {
        let event = build(HostValue::from(NativeFailure::new("AbortError", "aborted")));
        let exception = &event.exception.values[0];

        assert_eq!(
            exception.value.as_deref(),
            Some("Non-Error promise rejection captured with keys: message, name, stack")
        );
        assert_eq!(
            serde_json::to_value(&exception.mechanism.as_ref().unwrap().data).unwrap(),
            json!({ "mode": "failed", "message": "aborted", "name": "AbortError" })
        );
    }
}
