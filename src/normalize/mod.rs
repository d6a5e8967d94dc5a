//! Normalization of raw hook arguments into canonical traces.
//!
//! Each hook has its own normalizer:
//!
//! - [`normalize_error`] handles the five arguments of the synchronous
//!   failure hook.
//! - [`normalize_rejection`] handles the single argument of the
//!   unhandled-rejection hook.
//!
//! Both delegate frame computation to a [`StackComputer`] and return a trace
//! tagged with their mechanism.
//!
//! [`StackComputer`]: crate::compute::StackComputer

mod error;
mod rejection;

pub use self::{
    error::{ErrorArgs, FailureLabel, normalize_error},
    rejection::{
        NormalizedRejection, extract_reason, normalize_reason, normalize_rejection,
        reason_or_original,
    },
};
