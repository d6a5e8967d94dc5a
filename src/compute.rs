//! Stack computation.
//!
//! Turning a raw failure into frames is the job of a [`StackComputer`]. Hosts
//! with their own stack parsing plug theirs in through
//! [`GlobalHandlersBuilder::stack_computer`]; the [`DefaultStackComputer`]
//! relies on the frames the host already attached to native failures.
//!
//! [`GlobalHandlersBuilder::stack_computer`]: crate::hooks::GlobalHandlersBuilder::stack_computer

use crate::{
    trace::{ComputedTrace, Mode, TraceMessage},
    value::{HostValue, Shape},
};

/// Computes a trace from a raw failure value.
///
/// Implementations must not panic on malformed input; anything they cannot
/// make sense of should become a [`ComputedTrace::failed`] trace.
pub trait StackComputer: Send + Sync {
    /// Computes the trace of `failure`.
    fn compute(&self, failure: &HostValue) -> ComputedTrace;
}

impl<F> StackComputer for F
where
    F: Fn(&HostValue) -> ComputedTrace + Send + Sync,
{
    fn compute(&self, failure: &HostValue) -> ComputedTrace {
        self(failure)
    }
}

/// Stack computer using the frames attached to native failures.
///
/// A native failure with at least one frame yields a [`Mode::Stack`] trace.
/// Everything else, including native failures without frames, yields a
/// [`Mode::Failed`] trace that keeps the failure for fallback serialization.
#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultStackComputer;

impl StackComputer for DefaultStackComputer {
    fn compute(&self, failure: &HostValue) -> ComputedTrace {
        match failure.shape() {
            Shape::NativeFailure(native) if !native.stack.is_empty() => ComputedTrace {
                mode: Mode::Stack,
                name: Some(native.name.clone()).filter(|name| !name.is_empty()),
                message: TraceMessage::Text(native.message.clone()),
                stack: native.stack.clone(),
                original: None,
            },
            _ => ComputedTrace::failed(failure.clone()),
        }
    }
}
