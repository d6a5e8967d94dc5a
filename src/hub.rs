//! A minimal reporting context backed by a transport.

use core::{
    fmt,
    sync::atomic::{AtomicUsize, Ordering},
};

use hashbrown::HashSet;
use rustc_hash::FxBuildHasher;
use unhandled_protocol::Event;

use crate::{
    config::ClientOptions,
    context::{EventHint, IntegrationId, ReportingContext},
};

/// Delivers captured events.
///
/// Implementations must hand events off without waiting for delivery.
pub trait Transport: Send + Sync {
    /// Sends a captured event.
    fn send(&self, event: Event, hint: EventHint);
}

impl<F> Transport for F
where
    F: Fn(Event, EventHint) + Send + Sync,
{
    fn send(&self, event: Event, hint: EventHint) {
        self(event, hint)
    }
}

/// A [`ReportingContext`] forwarding events to a [`Transport`].
///
/// The hub keeps track of which integrations are registered with it and
/// can be told to ignore failures for the duration of a closure, for example
/// while the transport itself runs.
///
/// ```
/// use unhandled::{
///     config::ClientOptions,
///     context::{EventHint, IntegrationId},
///     hub::Hub,
///     protocol::Event,
/// };
///
/// let hub = Hub::new(ClientOptions::default(), |event: Event, _hint: EventHint| {
///     println!("{event:?}");
/// });
/// let id = IntegrationId::next();
/// assert!(hub.register_integration(id));
/// assert!(hub.is_registered(id));
/// ```
pub struct Hub {
    options: ClientOptions,
    transport: Box<dyn Transport>,
    integrations: spin::RwLock<HashSet<IntegrationId, FxBuildHasher>>,
    ignore_errors: AtomicUsize,
}

impl Hub {
    /// Creates a hub with the given options and transport.
    pub fn new(options: ClientOptions, transport: impl Transport + 'static) -> Self {
        Self {
            options,
            transport: Box::new(transport),
            integrations: spin::RwLock::new(HashSet::with_hasher(FxBuildHasher)),
            ignore_errors: AtomicUsize::new(0),
        }
    }

    /// The hub's options.
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Marks `id` as active. Returns `false` if it already was.
    pub fn register_integration(&self, id: IntegrationId) -> bool {
        let inserted = self.integrations.write().insert(id);
        if inserted {
            tracing::debug!(integration = id.get(), "integration registered");
        }
        inserted
    }

    /// Marks `id` as inactive. Returns `false` if it was not active.
    pub fn unregister_integration(&self, id: IntegrationId) -> bool {
        let removed = self.integrations.write().remove(&id);
        if removed {
            tracing::debug!(integration = id.get(), "integration unregistered");
        }
        removed
    }

    /// Returns `true` if `id` is registered.
    pub fn is_registered(&self, id: IntegrationId) -> bool {
        self.integrations.read().contains(&id)
    }

    /// Runs `f` while suppressing every failure reported to this hub.
    ///
    /// Calls nest. Suppression ends when `f` returns or unwinds.
    pub fn with_ignored_errors<R>(&self, f: impl FnOnce() -> R) -> R {
        self.ignore_errors.fetch_add(1, Ordering::SeqCst);
        let _guard = IgnoreGuard(&self.ignore_errors);
        f()
    }

    /// Returns `true` while inside [`Hub::with_ignored_errors`].
    pub fn is_ignoring_errors(&self) -> bool {
        self.ignore_errors.load(Ordering::SeqCst) > 0
    }
}

struct IgnoreGuard<'a>(&'a AtomicUsize);

impl Drop for IgnoreGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ReportingContext for Hub {
    fn is_integration_active(&self, id: IntegrationId) -> bool {
        self.is_registered(id)
    }

    fn should_suppress(&self) -> bool {
        self.is_ignoring_errors()
    }

    fn max_value_length(&self) -> Option<usize> {
        self.options.max_value_length
    }

    fn capture_event(&self, event: Event, hint: EventHint) {
        self.transport.send(event, hint);
    }
}

impl fmt::Debug for Hub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hub")
            .field("options", &self.options)
            .field("integrations", &self.integrations.read().len())
            .field("ignore_errors", &self.ignore_errors.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
