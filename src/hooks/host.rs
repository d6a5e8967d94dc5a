//! The host's global failure slots.

use core::fmt;

use super::{
    handler::{ErrorHandlerRef, RejectionHandlerRef},
    hook_lock::HookLock,
};
use crate::{normalize::ErrorArgs, value::HostValue};

/// The process-wide failure-dispatch surface of a host runtime.
///
/// A host has one slot for synchronous uncaught failures and one for
/// unhandled rejections. Each holds at most one handler.
pub trait HostHooks: Send + Sync {
    /// The handler currently in the synchronous failure slot.
    fn error_handler(&self) -> Option<ErrorHandlerRef>;

    /// Replaces the handler in the synchronous failure slot.
    fn set_error_handler(&self, handler: Option<ErrorHandlerRef>);

    /// The handler currently in the unhandled-rejection slot.
    fn rejection_handler(&self) -> Option<RejectionHandlerRef>;

    /// Replaces the handler in the unhandled-rejection slot.
    fn set_rejection_handler(&self, handler: Option<RejectionHandlerRef>);

    /// The address of the current document, used when a failure carries no
    /// url of its own.
    fn location_href(&self) -> Option<String> {
        None
    }

    /// Delivers a synchronous failure to the current handler.
    ///
    /// Returns the handler's result, or `false` without a handler.
    fn dispatch_error(&self, args: &ErrorArgs) -> bool {
        self.error_handler()
            .is_some_and(|handler| handler.call(args))
    }

    /// Delivers an unhandled rejection to the current handler.
    fn dispatch_rejection(&self, event: &HostValue) {
        if let Some(handler) = self.rejection_handler() {
            handler.call(event);
        }
    }
}

/// An in-process implementation of [`HostHooks`].
///
/// Handlers are cloned out of their slot before they run, so a handler may
/// replace the contents of the slots while it is being called.
pub struct HostSlots {
    error: HookLock<ErrorHandlerRef>,
    rejection: HookLock<RejectionHandlerRef>,
    location: HookLock<String>,
}

impl HostSlots {
    /// Creates empty slots.
    pub const fn new() -> Self {
        Self {
            error: HookLock::new(),
            rejection: HookLock::new(),
            location: HookLock::new(),
        }
    }

    /// The slots shared by the whole process.
    pub fn global() -> &'static Self {
        static GLOBAL: HostSlots = HostSlots::new();
        &GLOBAL
    }

    /// Sets the address reported by [`HostHooks::location_href`].
    pub fn set_location_href(&self, href: Option<String>) {
        self.location.replace(href);
    }
}

impl Default for HostSlots {
    fn default() -> Self {
        Self::new()
    }
}

impl HostHooks for HostSlots {
    fn error_handler(&self) -> Option<ErrorHandlerRef> {
        self.error.cloned()
    }

    fn set_error_handler(&self, handler: Option<ErrorHandlerRef>) {
        self.error.replace(handler);
    }

    fn rejection_handler(&self) -> Option<RejectionHandlerRef> {
        self.rejection.cloned()
    }

    fn set_rejection_handler(&self, handler: Option<RejectionHandlerRef>) {
        self.rejection.replace(handler);
    }

    fn location_href(&self) -> Option<String> {
        self.location.cloned()
    }
}

impl fmt::Debug for HostSlots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostSlots")
            .field("error", &self.error.cloned())
            .field("rejection", &self.rejection.cloned())
            .field("location", &self.location.cloned())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    static_assertions::assert_impl_all!(HostSlots: Send, Sync);

    #[test]
    fn test_dispatch_without_handlers() {
        let slots = HostSlots::new();
        assert!(!slots.dispatch_error(&ErrorArgs::new("boom")));
        slots.dispatch_rejection(&HostValue::Null);
        assert_eq!(slots.location_href(), None);
    }

    #[test]
    fn test_handler_may_replace_its_slot() {
        static SLOTS: HostSlots = HostSlots::new();
        static CALLED: AtomicBool = AtomicBool::new(false);

        SLOTS.set_error_handler(Some(ErrorHandlerRef::new(|_: &ErrorArgs| {
            SLOTS.set_error_handler(None);
            CALLED.store(true, Ordering::SeqCst);
            true
        })));

        assert!(SLOTS.dispatch_error(&ErrorArgs::new("boom")));
        assert!(CALLED.load(Ordering::SeqCst));
        assert!(SLOTS.error_handler().is_none());
        assert!(!SLOTS.dispatch_error(&ErrorArgs::new("again")));
    }

    #[test]
    fn test_location_href() {
        let slots = HostSlots::new();
        slots.set_location_href(Some("https://example.com/".to_owned()));
        assert_eq!(slots.location_href().as_deref(), Some("https://example.com/"));
    }
}
