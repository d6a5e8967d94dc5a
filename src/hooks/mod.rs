//! Installation of the global failure hooks.
//!
//! # Quick Start
//!
//! ```rust
//! use unhandled::{
//!     Arc,
//!     config::ClientOptions,
//!     context::EventHint,
//!     hooks::{GlobalHandlers, HostHooks, HostSlots},
//!     hub::Hub,
//!     normalize::ErrorArgs,
//!     protocol::Event,
//! };
//!
//! let host: &'static HostSlots = Box::leak(Box::new(HostSlots::new()));
//! let hub = Arc::new(Hub::new(ClientOptions::default(), |event: Event, _: EventHint| {
//!     println!("captured {event:?}");
//! }));
//!
//! let handlers = GlobalHandlers::builder(host, hub.clone()).build();
//! hub.register_integration(handlers.id());
//! handlers.setup_once();
//!
//! host.dispatch_error(&ErrorArgs::new("Uncaught TypeError: x is not a function"));
//! ```
//!
//! # Chaining
//!
//! Installing a hook captures the handler that occupied the host slot before,
//! and the installed wrapper calls it after every report with the same
//! arguments. The synchronous wrapper returns that handler's result, so
//! default failure logging stays suppressed exactly when it was before.
//!
//! While the integration is not active in its [`ReportingContext`], the
//! wrappers report nothing and only forward to the previous handler.

mod handler;
mod hook_lock;
mod host;

use core::{
    fmt,
    sync::atomic::{AtomicBool, Ordering},
};
use std::panic::{AssertUnwindSafe, catch_unwind};

use triomphe::Arc;
use unsize::CoerceUnsize;

pub use self::{
    handler::{ErrorHandlerRef, OnErrorHandler, OnRejectionHandler, RejectionHandlerRef},
    host::{HostHooks, HostSlots},
};
use self::hook_lock::HookLock;
use crate::{
    compute::{DefaultStackComputer, StackComputer},
    config::GlobalHandlersOptions,
    context::{EventHint, IntegrationId, ReportingContext},
    convert::{DefaultEventConverter, EventConverter},
    event::EventBuilder,
    normalize::{ErrorArgs, normalize_error, normalize_reason, reason_or_original},
    panic::payload_message,
    sanitize::{DefaultSanitizer, Sanitizer},
    trace::MechanismKind,
    value::{HostValue, Shape},
};

/// The engine that reports uncaught failures from the host's global slots.
///
/// Cloning is cheap and every clone controls the same hooks.
#[derive(Clone)]
pub struct GlobalHandlers(Arc<Shared>);

struct Shared {
    id: IntegrationId,
    options: GlobalHandlersOptions,
    host: &'static dyn HostHooks,
    context: Arc<dyn ReportingContext>,
    stack_computer: Box<dyn StackComputer>,
    converter: Box<dyn EventConverter>,
    sanitizer: Box<dyn Sanitizer>,
    error_hook: HookState<ErrorHandlerRef>,
    rejection_hook: HookState<RejectionHandlerRef>,
}

struct HookState<T: Send + Sync> {
    installed: AtomicBool,
    previous: HookLock<T>,
}

impl<T: Send + Sync> HookState<T> {
    const fn new() -> Self {
        Self {
            installed: AtomicBool::new(false),
            previous: HookLock::new(),
        }
    }

    fn claim(&self) -> bool {
        self.installed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn release(&self) -> bool {
        self.installed
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Builder for [`GlobalHandlers`].
///
/// Every collaborator defaults to the built-in implementation.
pub struct GlobalHandlersBuilder {
    host: &'static dyn HostHooks,
    context: Arc<dyn ReportingContext>,
    options: GlobalHandlersOptions,
    stack_computer: Box<dyn StackComputer>,
    converter: Box<dyn EventConverter>,
    sanitizer: Box<dyn Sanitizer>,
}

impl GlobalHandlersBuilder {
    /// Selects the hooks [`GlobalHandlers::setup_once`] installs.
    pub fn options(mut self, options: GlobalHandlersOptions) -> Self {
        self.options = options;
        self
    }

    /// Replaces the stack computer.
    pub fn stack_computer(mut self, computer: impl StackComputer + 'static) -> Self {
        self.stack_computer = Box::new(computer);
        self
    }

    /// Replaces the converter from traces to events.
    pub fn event_converter(mut self, converter: impl EventConverter + 'static) -> Self {
        self.converter = Box::new(converter);
        self
    }

    /// Replaces the sanitizer.
    pub fn sanitizer(mut self, sanitizer: impl Sanitizer + 'static) -> Self {
        self.sanitizer = Box::new(sanitizer);
        self
    }

    /// Creates the handlers under a fresh [`IntegrationId`].
    ///
    /// Nothing is installed until [`GlobalHandlers::setup_once`] or one of the
    /// install methods is called.
    pub fn build(self) -> GlobalHandlers {
        GlobalHandlers(Arc::new(Shared {
            id: IntegrationId::next(),
            options: self.options,
            host: self.host,
            context: self.context,
            stack_computer: self.stack_computer,
            converter: self.converter,
            sanitizer: self.sanitizer,
            error_hook: HookState::new(),
            rejection_hook: HookState::new(),
        }))
    }
}

impl fmt::Debug for GlobalHandlersBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalHandlersBuilder")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl GlobalHandlers {
    /// Starts building handlers for `host` that report into `context`.
    pub fn builder<C>(host: &'static dyn HostHooks, context: Arc<C>) -> GlobalHandlersBuilder
    where
        C: ReportingContext + 'static,
    {
        GlobalHandlersBuilder {
            host,
            context: context.unsize(unsize::Coercion!(to dyn ReportingContext)),
            options: GlobalHandlersOptions::DEFAULT,
            stack_computer: Box::new(DefaultStackComputer),
            converter: Box::new(DefaultEventConverter),
            sanitizer: Box::new(DefaultSanitizer::DEFAULT),
        }
    }

    /// The id under which the handlers check whether they are active.
    pub fn id(&self) -> IntegrationId {
        self.0.id
    }

    /// The options used by [`GlobalHandlers::setup_once`].
    pub fn options(&self) -> GlobalHandlersOptions {
        self.0.options
    }

    /// Installs the hooks enabled in the options.
    ///
    /// Hooks that are already installed are left alone.
    pub fn setup_once(&self) {
        if self.0.options.onerror {
            self.install_error_hook();
        }
        if self.0.options.onunhandledrejection {
            self.install_rejection_hook();
        }
    }

    /// Installs the synchronous failure hook.
    ///
    /// Returns `false` without doing anything if the hook is already
    /// installed.
    pub fn install_error_hook(&self) -> bool {
        let state = &self.0.error_hook;
        if !state.claim() {
            return false;
        }
        state.previous.replace(self.0.host.error_handler());
        self.0
            .host
            .set_error_handler(Some(ErrorHandlerRef::new(ErrorWrapper(self.0.clone()))));
        tracing::debug!(integration = self.0.id.get(), "onerror hook installed");
        true
    }

    /// Installs the unhandled-rejection hook.
    ///
    /// Returns `false` without doing anything if the hook is already
    /// installed.
    pub fn install_rejection_hook(&self) -> bool {
        let state = &self.0.rejection_hook;
        if !state.claim() {
            return false;
        }
        state.previous.replace(self.0.host.rejection_handler());
        self.0
            .host
            .set_rejection_handler(Some(RejectionHandlerRef::new(RejectionWrapper(
                self.0.clone(),
            ))));
        tracing::debug!(
            integration = self.0.id.get(),
            "onunhandledrejection hook installed"
        );
        true
    }

    /// Puts the handler captured at installation back into the synchronous
    /// failure slot.
    ///
    /// Returns `false` if the hook is not installed.
    pub fn uninstall_error_hook(&self) -> bool {
        let state = &self.0.error_hook;
        if !state.release() {
            return false;
        }
        self.0.host.set_error_handler(state.previous.replace(None));
        tracing::debug!(integration = self.0.id.get(), "onerror hook removed");
        true
    }

    /// Puts the handler captured at installation back into the
    /// unhandled-rejection slot.
    ///
    /// Returns `false` if the hook is not installed.
    pub fn uninstall_rejection_hook(&self) -> bool {
        let state = &self.0.rejection_hook;
        if !state.release() {
            return false;
        }
        self.0
            .host
            .set_rejection_handler(state.previous.replace(None));
        tracing::debug!(
            integration = self.0.id.get(),
            "onunhandledrejection hook removed"
        );
        true
    }

    /// Returns `true` while the synchronous failure hook is installed.
    pub fn is_error_hook_installed(&self) -> bool {
        self.0.error_hook.installed.load(Ordering::Acquire)
    }

    /// Returns `true` while the unhandled-rejection hook is installed.
    pub fn is_rejection_hook_installed(&self) -> bool {
        self.0.rejection_hook.installed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for GlobalHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalHandlers")
            .field("id", &self.0.id)
            .field("options", &self.0.options)
            .field("error_hook", &self.is_error_hook_installed())
            .field("rejection_hook", &self.is_rejection_hook_installed())
            .finish_non_exhaustive()
    }
}

struct ErrorWrapper(Arc<Shared>);

impl OnErrorHandler for ErrorWrapper {
    fn on_error(&self, args: &ErrorArgs) -> bool {
        let shared = &*self.0;
        let previous = shared.error_hook.previous.cloned();

        if shared.context.is_integration_active(shared.id) {
            shared.guarded(MechanismKind::OnError, || shared.report_error(args));
        } else {
            tracing::trace!(integration = shared.id.get(), "integration inactive, deferring");
        }

        previous.is_some_and(|previous| previous.call(args))
    }
}

struct RejectionWrapper(Arc<Shared>);

impl OnRejectionHandler for RejectionWrapper {
    fn on_rejection(&self, event: &HostValue) {
        let shared = &*self.0;
        let previous = shared.rejection_hook.previous.cloned();

        if shared.context.is_integration_active(shared.id) {
            shared.guarded(MechanismKind::OnUnhandledRejection, || {
                shared.report_rejection(event)
            });
        } else {
            tracing::trace!(integration = shared.id.get(), "integration inactive, deferring");
        }

        if let Some(previous) = previous {
            previous.call(event);
        }
    }
}

impl Shared {
    fn guarded(&self, hook: MechanismKind, report: impl FnOnce()) {
        if let Err(payload) = catch_unwind(AssertUnwindSafe(report)) {
            tracing::warn!(
                integration = self.id.get(),
                %hook,
                panic = payload_message(&*payload),
                "reporting an unhandled failure panicked"
            );
        }
    }

    fn event_builder(&self) -> EventBuilder<'_> {
        EventBuilder::new(&*self.converter, &*self.sanitizer)
            .max_value_length(self.context.max_value_length())
    }

    fn report_error(&self, args: &ErrorArgs) {
        if self.context.should_suppress() {
            tracing::trace!("failure suppressed by the reporting context");
            return;
        }
        let error = args.error_like();
        if error.is_self_delivery() {
            tracing::trace!("skipping a failure raised while delivering a report");
            return;
        }

        let trace = normalize_error(
            args,
            &*self.stack_computer,
            self.host.location_href().as_deref(),
        );
        let original = match error.shape() {
            Shape::NativeFailure(_) => error,
            _ => HostValue::Null,
        };
        let event = self
            .event_builder()
            .build_event(&trace, MechanismKind::OnError, &original);
        self.context.capture_event(
            event,
            EventHint {
                stack: trace,
                original_exception: original,
            },
        );
    }

    fn report_rejection(&self, event: &HostValue) {
        if self.context.should_suppress() {
            tracing::trace!("rejection suppressed by the reporting context");
            return;
        }
        let reason = reason_or_original(event);
        if reason.is_self_delivery() {
            tracing::trace!("skipping a rejection raised while delivering a report");
            return;
        }

        let trace = normalize_reason(&reason, &*self.stack_computer);
        let captured =
            self.event_builder()
                .build_event(&trace, MechanismKind::OnUnhandledRejection, &reason);
        self.context.capture_event(
            captured,
            EventHint {
                stack: trace,
                original_exception: reason,
            },
        );
    }
}
