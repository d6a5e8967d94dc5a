//! Conversion of canonical traces into events.

use unhandled_protocol::{Event, Exception, ExceptionList, StackFrame, Stacktrace};

use crate::trace::{CanonicalStackTrace, Frame, UNKNOWN_FUNCTION};

/// Maximum number of frames put into an event.
pub const STACKTRACE_LIMIT: usize = 50;

/// Converts a canonical trace into a base event.
pub trait EventConverter: Send + Sync {
    /// Converts `trace` into an event carrying its exception.
    fn convert(&self, trace: &CanonicalStackTrace) -> Event;
}

impl<F> EventConverter for F
where
    F: Fn(&CanonicalStackTrace) -> Event + Send + Sync,
{
    fn convert(&self, trace: &CanonicalStackTrace) -> Event {
        self(trace)
    }
}

/// Event converter producing a single exception from the trace.
#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultEventConverter;

impl EventConverter for DefaultEventConverter {
    fn convert(&self, trace: &CanonicalStackTrace) -> Event {
        let mut exception = Exception {
            ty: trace.name().map(str::to_owned),
            value: trace.message().as_text().map(str::to_owned),
            ..Default::default()
        };

        let frames = prepare_frames(trace.stack());
        if !frames.is_empty() {
            exception.stacktrace = Some(Stacktrace { frames });
        }

        if exception.ty.is_none() && exception.value.as_deref() == Some("") {
            exception.value = Some("Unrecoverable error caught".to_owned());
        }

        Event {
            exception: ExceptionList {
                values: vec![exception],
            },
            ..Default::default()
        }
    }
}

/// Maps trace frames to event frames.
///
/// Keeps at most [`STACKTRACE_LIMIT`] of the most recent frames and reverses
/// them so the oldest call comes first. Frames without a url inherit the url
/// of the most recent frame.
pub fn prepare_frames(stack: &[Frame]) -> Vec<StackFrame> {
    let Some(first) = stack.first() else {
        return Vec::new();
    };
    let fallback_url = first.url.as_deref();

    let mut frames: Vec<StackFrame> = stack
        .iter()
        .take(STACKTRACE_LIMIT)
        .map(|frame| StackFrame {
            function: Some(if frame.func.is_empty() {
                UNKNOWN_FUNCTION.to_owned()
            } else {
                frame.func.clone()
            }),
            filename: frame.url.as_deref().or(fallback_url).map(str::to_owned),
            lineno: frame.line,
            colno: frame.column,
            in_app: Some(true),
        })
        .collect();
    frames.reverse();
    frames
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        trace::{ComputedTrace, MechanismKind, Mode, TraceMessage},
        value::HostValue,
    };

    fn trace(name: Option<&str>, message: TraceMessage, stack: Vec<Frame>) -> CanonicalStackTrace {
        ComputedTrace {
            mode: Mode::Stack,
            name: name.map(str::to_owned),
            message,
            stack,
            original: None,
        }
        .with_mechanism(MechanismKind::OnError)
    }

    #[test]
    fn test_frames_are_reversed_and_filled() {
        let stack = vec![
            Frame::new("inner", Some("https://example.com/a.js"), Some(1), Some(1)),
            Frame::new("", None, Some(2), None),
        ];
        let frames = prepare_frames(&stack);

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].function.as_deref(), Some("?"));
        assert_eq!(frames[0].filename.as_deref(), Some("https://example.com/a.js"));
        assert_eq!(frames[0].lineno, Some(2));
        assert_eq!(frames[1].function.as_deref(), Some("inner"));
        assert!(frames.iter().all(|frame| frame.in_app == Some(true)));
    }

    #[test]
    fn test_frames_are_capped() {
        let stack: Vec<Frame> = (0..80)
            .map(|line| Frame::new("f", Some("a.js"), Some(line), None))
            .collect();
        let frames = prepare_frames(&stack);

        assert_eq!(frames.len(), STACKTRACE_LIMIT);
        assert_eq!(frames.last().unwrap().lineno, Some(0));
    }

    #[test]
    fn test_convert_builds_single_exception() {
        let event = DefaultEventConverter.convert(&trace(
            Some("TypeError"),
            TraceMessage::Text("x is not a function".into()),
            vec![Frame::new("main", Some("a.js"), Some(3), Some(9))],
        ));

        assert_eq!(event.exception.values.len(), 1);
        let exception = &event.exception.values[0];
        assert_eq!(exception.ty.as_deref(), Some("TypeError"));
        assert_eq!(exception.value.as_deref(), Some("x is not a function"));
        assert_eq!(exception.stacktrace.as_ref().unwrap().frames.len(), 1);
        assert!(exception.mechanism.is_none());
    }

    #[test]
    fn test_convert_unrecoverable() {
        let event = DefaultEventConverter.convert(&trace(None, TraceMessage::Text(String::new()), vec![]));
        assert_eq!(
            event.exception.values[0].value.as_deref(),
            Some("Unrecoverable error caught")
        );

        let event = DefaultEventConverter.convert(&trace(
            None,
            TraceMessage::Unexpected(HostValue::Undefined),
            vec![],
        ));
        assert_eq!(event.exception.values[0].value, None);
    }
}
