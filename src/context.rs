//! The reporting context a [`GlobalHandlers`] instance reports into.
//!
//! [`GlobalHandlers`]: crate::hooks::GlobalHandlers

use core::sync::atomic::{AtomicU64, Ordering};

use unhandled_protocol::Event;

use crate::{trace::CanonicalStackTrace, value::HostValue};

/// Identifies one registered integration.
///
/// Every call to [`IntegrationId::next`] returns a fresh id, so a context can
/// tell a replaced integration apart from the current one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntegrationId(u64);

impl IntegrationId {
    /// Allocates a new, process-unique id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// The numeric value of the id.
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Context passed along with a captured event.
#[derive(Clone, Debug, PartialEq)]
pub struct EventHint {
    /// The trace the event was built from.
    pub stack: CanonicalStackTrace,
    /// The failure as the hook observed it, or null when only a message was
    /// available.
    pub original_exception: HostValue,
}

/// The collector side of the engine.
pub trait ReportingContext: Send + Sync {
    /// Returns `true` while the integration `id` is the active one.
    fn is_integration_active(&self, id: IntegrationId) -> bool;

    /// Returns `true` if the current failure should be ignored entirely.
    fn should_suppress(&self) -> bool {
        false
    }

    /// The configured maximum length of fallback values.
    fn max_value_length(&self) -> Option<usize> {
        None
    }

    /// Accepts a finished event. Must not block on delivery.
    fn capture_event(&self, event: Event, hint: EventHint);
}
