//! Commonly used items for convenient importing.
//!
//! ```rust
//! use unhandled::prelude::*;
//!
//! let args = ErrorArgs::new("Uncaught TypeError: x is not a function");
//! assert!(!HostSlots::new().dispatch_error(&args));
//! ```

pub use crate::{
    Arc,
    config::{ClientOptions, GlobalHandlersOptions},
    context::{EventHint, IntegrationId, ReportingContext},
    hooks::{GlobalHandlers, HostHooks, HostSlots},
    hub::Hub,
    normalize::ErrorArgs,
    protocol::Event,
    trace::{CanonicalStackTrace, MechanismKind},
    value::{HostObject, HostValue, NativeFailure},
};
