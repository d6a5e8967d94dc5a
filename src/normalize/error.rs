use std::sync::OnceLock;

use crate::{
    compute::StackComputer,
    trace::{
        CanonicalStackTrace, ComputedTrace, Frame, MechanismKind, Mode, TraceMessage,
        UNKNOWN_FUNCTION,
    },
    value::{HostValue, Shape},
};

/// The arguments delivered to the synchronous failure hook.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ErrorArgs {
    /// The display message, or an error event wrapping one.
    pub message: HostValue,
    /// The url of the script that failed.
    pub url: Option<String>,
    /// The line of the failure.
    pub line: Option<u32>,
    /// The column of the failure.
    pub column: Option<u32>,
    /// The failure itself, if the host provided it.
    pub error: HostValue,
}

impl ErrorArgs {
    /// Arguments carrying only a message.
    pub fn new(message: impl Into<HostValue>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    /// Sets the location of the failure.
    pub fn with_location(
        mut self,
        url: Option<&str>,
        line: Option<u32>,
        column: Option<u32>,
    ) -> Self {
        self.url = url.map(str::to_owned);
        self.line = line;
        self.column = column;
        self
    }

    /// Sets the failure value.
    pub fn with_error(mut self, error: impl Into<HostValue>) -> Self {
        self.error = error.into();
        self
    }

    /// The failure value, unwrapped from an error event if necessary.
    ///
    /// Hosts that pass the error event as the first argument leave `error`
    /// empty; the event is unwrapped from `message` in that case.
    pub fn error_like(&self) -> HostValue {
        match self.error.shape() {
            Shape::EventWrapper(_) => event_field(&self.error, "error"),
            _ if self.error.is_nullish() => match self.message.shape() {
                Shape::EventWrapper(_) => event_field(&self.message, "error"),
                _ => self.error.clone(),
            },
            _ => self.error.clone(),
        }
    }

    /// The display message, unwrapped from an error event if necessary.
    pub fn display_message(&self) -> HostValue {
        match self.message.shape() {
            Shape::EventWrapper(_) => event_field(&self.message, "message"),
            _ => self.message.clone(),
        }
    }
}

fn event_field(event: &HostValue, key: &str) -> HostValue {
    event.get(key).ok().flatten().unwrap_or_default()
}

/// A failure message split into its type label and text.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FailureLabel<'a> {
    /// The failure type, such as `TypeError`, if the message carried one.
    pub name: Option<&'a str>,
    /// The remaining message text.
    pub message: &'a str,
}

impl<'a> FailureLabel<'a> {
    /// Splits a host failure message such as
    /// `Uncaught TypeError: x is not a function`.
    ///
    /// Returns `None` if the text does not look like a failure message, which
    /// is only the case for text spanning several lines.
    pub fn parse(text: &'a str) -> Option<Self> {
        static ERROR_TYPES: OnceLock<regex::Regex> = OnceLock::new();
        let regex = ERROR_TYPES.get_or_init(|| {
            regex::Regex::new(
                r"^(?:[Uu]ncaught (?:exception: )?)?(?:((?:Eval|Internal|Range|Reference|Syntax|Type|URI|)Error): )?(.*)$",
            )
            .expect("built-in regex pattern for failure labels should be valid")
        });

        let captures = regex.captures(text)?;
        Some(Self {
            name: captures.get(1).map(|name| name.as_str()),
            message: captures.get(2).map_or("", |message| message.as_str()),
        })
    }
}

/// Normalizes the arguments of the synchronous failure hook.
///
/// A native failure, direct or inside an error event, is handed to
/// `computer`. Anything else produces a single synthetic frame at the given
/// location, falling back to `location_href` when the url is missing.
pub fn normalize_error(
    args: &ErrorArgs,
    computer: &dyn StackComputer,
    location_href: Option<&str>,
) -> CanonicalStackTrace {
    let error = args.error_like();
    if let Shape::NativeFailure(_) = error.shape() {
        return computer
            .compute(&error)
            .with_mechanism(MechanismKind::OnError);
    }

    let (name, message) = match args.display_message() {
        HostValue::String(text) => match FailureLabel::parse(&text) {
            Some(label) => (
                label.name.map(str::to_owned),
                TraceMessage::Text(label.message.to_owned()),
            ),
            None => (None, TraceMessage::Text(text)),
        },
        other => (None, TraceMessage::Unexpected(other)),
    };

    let url = args
        .url
        .as_deref()
        .filter(|url| !url.is_empty())
        .or(location_href);
    let frame = Frame::new(UNKNOWN_FUNCTION, url, args.line, args.column);

    ComputedTrace {
        mode: Mode::OnError,
        name,
        message,
        stack: vec![frame],
        original: None,
    }
    .with_mechanism(MechanismKind::OnError)
}
