//! Handlers stored in the host's failure slots.

use core::{any::type_name, fmt};

use triomphe::Arc;
use unsize::CoerceUnsize;

use crate::{normalize::ErrorArgs, value::HostValue};

/// A handler for the synchronous failure slot.
///
/// Returning `true` tells the host the failure was handled, which suppresses
/// its default failure logging.
pub trait OnErrorHandler: 'static + Send + Sync {
    /// Handles an uncaught failure.
    fn on_error(&self, args: &ErrorArgs) -> bool;
}

impl<F> OnErrorHandler for F
where
    F: Fn(&ErrorArgs) -> bool + 'static + Send + Sync,
{
    fn on_error(&self, args: &ErrorArgs) -> bool {
        self(args)
    }
}

/// A handler for the unhandled-rejection slot.
pub trait OnRejectionHandler: 'static + Send + Sync {
    /// Handles an unhandled rejection event.
    fn on_rejection(&self, event: &HostValue);
}

impl<F> OnRejectionHandler for F
where
    F: Fn(&HostValue) + 'static + Send + Sync,
{
    fn on_rejection(&self, event: &HostValue) {
        self(event)
    }
}

/// A shared reference to an [`OnErrorHandler`].
///
/// ```
/// use unhandled::{hooks::ErrorHandlerRef, normalize::ErrorArgs};
///
/// let handler = ErrorHandlerRef::new(|args: &ErrorArgs| args.line == Some(1));
/// assert!(handler.call(&ErrorArgs::new("boom").with_location(None, Some(1), None)));
/// assert!(handler.ptr_eq(&handler.clone()));
/// ```
#[derive(Clone)]
pub struct ErrorHandlerRef {
    handler: Arc<dyn OnErrorHandler>,
    type_name: &'static str,
}

impl ErrorHandlerRef {
    /// Wraps `handler`.
    pub fn new<H: OnErrorHandler>(handler: H) -> Self {
        Self {
            handler: Arc::new(handler).unsize(unsize::Coercion!(to dyn OnErrorHandler)),
            type_name: type_name::<H>(),
        }
    }

    /// Invokes the handler.
    pub fn call(&self, args: &ErrorArgs) -> bool {
        self.handler.on_error(args)
    }

    /// Returns `true` if both refer to the same handler instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.handler, &other.handler)
    }

    /// The type name of the wrapped handler.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for ErrorHandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ErrorHandlerRef").field(&self.type_name).finish()
    }
}

/// A shared reference to an [`OnRejectionHandler`].
#[derive(Clone)]
pub struct RejectionHandlerRef {
    handler: Arc<dyn OnRejectionHandler>,
    type_name: &'static str,
}

impl RejectionHandlerRef {
    /// Wraps `handler`.
    pub fn new<H: OnRejectionHandler>(handler: H) -> Self {
        Self {
            handler: Arc::new(handler).unsize(unsize::Coercion!(to dyn OnRejectionHandler)),
            type_name: type_name::<H>(),
        }
    }

    /// Invokes the handler.
    pub fn call(&self, event: &HostValue) {
        self.handler.on_rejection(event);
    }

    /// Returns `true` if both refer to the same handler instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.handler, &other.handler)
    }

    /// The type name of the wrapped handler.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for RejectionHandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RejectionHandlerRef")
            .field(&self.type_name)
            .finish()
    }
}
