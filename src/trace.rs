//! Canonical stack traces.
//!
//! A failure is normalized in two steps. The [stack computer] turns the raw
//! failure value into a [`ComputedTrace`], which knows what happened but not
//! which hook observed it. Tagging it with a [`MechanismKind`] through
//! [`ComputedTrace::with_mechanism`] yields the [`CanonicalStackTrace`] that the
//! event builder consumes. The mechanism is assigned exactly once, and a
//! canonical trace is never mutated afterwards.
//!
//! [stack computer]: crate::compute::StackComputer

use core::fmt;

use crate::value::HostValue;

/// Function name used for frames whose function is unknown.
pub const UNKNOWN_FUNCTION: &str = "?";

/// A single frame of a canonical trace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// The function name, or [`UNKNOWN_FUNCTION`].
    pub func: String,
    /// The script url or source file.
    pub url: Option<String>,
    /// Line number, 1-based.
    pub line: Option<u32>,
    /// Column number, 1-based.
    pub column: Option<u32>,
    /// Call arguments, when the host exposes them.
    pub args: Vec<String>,
}

impl Frame {
    /// Creates a frame without arguments.
    pub fn new(
        func: impl Into<String>,
        url: Option<&str>,
        line: Option<u32>,
        column: Option<u32>,
    ) -> Self {
        Self {
            func: func.into(),
            url: url.map(str::to_owned),
            line,
            column,
            args: Vec::new(),
        }
    }

    /// Creates a synthetic frame with no information at all.
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_FUNCTION, None, None, None)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (", self.func)?;
        f.write_str(self.url.as_deref().unwrap_or("<anonymous>"))?;
        if let Some(line) = self.line {
            write!(f, ":{line}")?;
            if let Some(column) = self.column {
                write!(f, ":{column}")?;
            }
        }
        f.write_str(")")
    }
}

/// The hook that observed a failure.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MechanismKind {
    /// The synchronous uncaught-error hook.
    OnError,
    /// The unhandled-rejection hook.
    OnUnhandledRejection,
}

impl MechanismKind {
    /// The hook's name, as used in mechanism types.
    pub const fn as_str(self) -> &'static str {
        match self {
            MechanismKind::OnError => "onerror",
            MechanismKind::OnUnhandledRejection => "onunhandledrejection",
        }
    }

    /// The exception type used when nothing better is known.
    pub const fn fallback_type(self) -> &'static str {
        match self {
            MechanismKind::OnError => "Error",
            MechanismKind::OnUnhandledRejection => "UnhandledRejection",
        }
    }
}

impl fmt::Display for MechanismKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How completely a trace could be computed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Built from the arguments of the uncaught-error hook.
    OnError,
    /// Built from the argument of the unhandled-rejection hook.
    OnUnhandledRejection,
    /// Frames recovered from the failure's own stack.
    Stack,
    /// Only partial information could be recovered.
    Failed,
}

impl Mode {
    /// The mode's wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Mode::OnError => "onerror",
            Mode::OnUnhandledRejection => "onunhandledrejection",
            Mode::Stack => "stack",
            Mode::Failed => "failed",
        }
    }

    /// Returns `true` for [`Mode::Failed`].
    pub const fn is_failed(self) -> bool {
        matches!(self, Mode::Failed)
    }
}

impl From<MechanismKind> for Mode {
    fn from(value: MechanismKind) -> Self {
        match value {
            MechanismKind::OnError => Mode::OnError,
            MechanismKind::OnUnhandledRejection => Mode::OnUnhandledRejection,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The message of a trace.
#[derive(Clone, Debug, PartialEq)]
pub enum TraceMessage {
    /// A regular text message.
    Text(String),
    /// Something that is not a string and may need further extraction.
    Unexpected(HostValue),
}

impl TraceMessage {
    /// Returns the text, if this is a text message.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            TraceMessage::Text(text) => Some(text),
            TraceMessage::Unexpected(_) => None,
        }
    }

    /// Reads a message-like property: strings become text, anything else
    /// (including an absent or throwing property) is unexpected.
    pub(crate) fn from_property(value: &HostValue) -> Self {
        match value.get("message") {
            Ok(Some(HostValue::String(text))) => TraceMessage::Text(text),
            Ok(Some(other)) => TraceMessage::Unexpected(other),
            Ok(None) | Err(_) => TraceMessage::Unexpected(HostValue::Undefined),
        }
    }
}

/// A trace produced by a stack computer, not yet tagged with a mechanism.
#[derive(Clone, Debug, PartialEq)]
pub struct ComputedTrace {
    /// How completely the trace was computed.
    pub mode: Mode,
    /// The failure type label, if known.
    pub name: Option<String>,
    /// The failure message.
    pub message: TraceMessage,
    /// Frames, most recent call first. May be empty.
    pub stack: Vec<Frame>,
    /// The raw failure, kept for fallback serialization.
    pub original: Option<HostValue>,
}

impl ComputedTrace {
    /// A trace for a failure whose frames could not be computed.
    ///
    /// Reads `name` and `message` from the failure when it exposes them;
    /// throwing accessors are treated as absent.
    pub fn failed(original: HostValue) -> Self {
        let name = match original.get("name") {
            Ok(Some(HostValue::String(name))) if !name.is_empty() => Some(name),
            _ => None,
        };
        Self {
            mode: Mode::Failed,
            name,
            message: TraceMessage::from_property(&original),
            stack: Vec::new(),
            original: Some(original),
        }
    }

    /// Tags the trace with the hook that observed it.
    ///
    /// A synthetic [`Frame::unknown`] is added when no frames were computed,
    /// so the resulting stack is never empty.
    pub fn with_mechanism(mut self, mechanism: MechanismKind) -> CanonicalStackTrace {
        if self.stack.is_empty() {
            self.stack.push(Frame::unknown());
        }
        CanonicalStackTrace {
            mechanism,
            mode: self.mode,
            name: self.name,
            message: self.message,
            stack: self.stack,
            original: self.original,
        }
    }
}

/// A normalized, mechanism-tagged representation of a failure.
#[derive(Clone, Debug, PartialEq)]
pub struct CanonicalStackTrace {
    mechanism: MechanismKind,
    mode: Mode,
    name: Option<String>,
    message: TraceMessage,
    stack: Vec<Frame>,
    original: Option<HostValue>,
}

impl CanonicalStackTrace {
    /// The hook that observed the failure.
    pub fn mechanism(&self) -> MechanismKind {
        self.mechanism
    }

    /// How completely the trace was computed.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The failure type label, if known.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The failure message.
    pub fn message(&self) -> &TraceMessage {
        &self.message
    }

    /// The frames, most recent call first. Never empty.
    pub fn stack(&self) -> &[Frame] {
        &self.stack
    }

    /// The raw failure, if it was retained.
    pub fn original(&self) -> Option<&HostValue> {
        self.original.as_ref()
    }

    pub(crate) fn with_message(&self, message: String) -> Self {
        Self {
            message: TraceMessage::Text(message),
            ..self.clone()
        }
    }
}
