use crate::{
    PropertyAccessError,
    compute::StackComputer,
    trace::{CanonicalStackTrace, MechanismKind},
    value::HostValue,
};

/// Extracts the rejection reason from the argument of the rejection hook.
///
/// Values exposing a `reason` property yield that property. Everything else is
/// its own reason.
///
/// # Errors
///
/// Returns the error of a throwing `reason` accessor.
pub fn extract_reason(event: &HostValue) -> Result<HostValue, PropertyAccessError> {
    if !event.has_property("reason") {
        return Ok(event.clone());
    }
    Ok(event.get("reason")?.unwrap_or_default())
}

/// Like [`extract_reason`], but falls back to the event itself when reading
/// the reason fails.
pub fn reason_or_original(event: &HostValue) -> HostValue {
    extract_reason(event).unwrap_or_else(|error| {
        tracing::trace!(%error, "rejection reason unavailable, using the event itself");
        event.clone()
    })
}

/// The result of [`normalize_rejection`].
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedRejection {
    /// The canonical trace of the reason.
    pub trace: CanonicalStackTrace,
    /// The extracted reason.
    pub reason: HostValue,
}

/// Normalizes the argument of the unhandled-rejection hook.
pub fn normalize_rejection(event: &HostValue, computer: &dyn StackComputer) -> NormalizedRejection {
    let reason = reason_or_original(event);
    let trace = normalize_reason(&reason, computer);
    NormalizedRejection { trace, reason }
}

/// Computes the trace of an already extracted rejection reason.
pub fn normalize_reason(reason: &HostValue, computer: &dyn StackComputer) -> CanonicalStackTrace {
    computer
        .compute(reason)
        .with_mechanism(MechanismKind::OnUnhandledRejection)
}
