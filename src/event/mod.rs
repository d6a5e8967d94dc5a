//! Construction of telemetry events from canonical traces.
//!
//! [`EventBuilder::build_event`] is the regular path. Rejections whose trace
//! could not be computed take the degraded path of
//! [`EventBuilder::build_incomplete_rejection_event`], which describes the
//! rejection reason instead of its frames.

mod builder;
mod incomplete;

pub use self::builder::{DEFAULT_MAX_VALUE_LENGTH, EventBuilder, NO_ERROR_MESSAGE};
