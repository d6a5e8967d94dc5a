#![deny(
    missing_docs,
    unsafe_code,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Reporting of uncaught failures from a host runtime's global hooks.
//!
//! ## Overview
//!
//! A host runtime dispatches two kinds of failures nobody handled: synchronous
//! uncaught errors and unhandled asynchronous rejections. This crate installs
//! a wrapper into each of the host's global slots, turns whatever the host
//! delivers into a canonical, structured event and hands it to a collector.
//! The handler that occupied a slot before keeps being called with the same
//! arguments, so installing the engine never changes what the host does by
//! default.
//!
//! ## Quick Example
//!
//! ```
//! use std::sync::Mutex;
//!
//! use unhandled::{
//!     Arc,
//!     config::ClientOptions,
//!     context::EventHint,
//!     hooks::{GlobalHandlers, HostHooks, HostSlots},
//!     hub::Hub,
//!     protocol::Event,
//!     value::{HostObject, HostValue},
//! };
//!
//! static EVENTS: Mutex<Vec<Event>> = Mutex::new(Vec::new());
//!
//! let host: &'static HostSlots = Box::leak(Box::new(HostSlots::new()));
//! let hub = Arc::new(Hub::new(ClientOptions::default(), |event: Event, _: EventHint| {
//!     EVENTS.lock().unwrap().push(event);
//! }));
//!
//! let handlers = GlobalHandlers::builder(host, hub.clone()).build();
//! hub.register_integration(handlers.id());
//! handlers.setup_once();
//!
//! host.dispatch_rejection(&HostValue::from(HostObject::rejection_event(42)));
//!
//! let events = EVENTS.lock().unwrap();
//! assert_eq!(
//!     events[0].exception.values[0].value.as_deref(),
//!     Some("Non-Error promise rejection captured with value: 42")
//! );
//! ```
//!
//! ## Pipeline
//!
//! Every triggered failure runs through the same synchronous chain:
//!
//! 1. The [`hooks`] wrapper checks that its integration is still active in the
//!    [`ReportingContext`](context::ReportingContext), that the context does
//!    not suppress failures right now, and that the failure did not come from
//!    delivering an earlier report.
//! 2. The [`normalize`] functions turn the hook's arguments into a
//!    [`CanonicalStackTrace`](trace::CanonicalStackTrace), with the help of a
//!    [`StackComputer`](compute::StackComputer).
//! 3. The [`EventBuilder`](event::EventBuilder) turns the trace into an
//!    [`Event`](protocol::Event), falling back to a description of the
//!    rejection reason when no frames could be computed.
//! 4. The event goes to the context, then the previous handler runs.
//!
//! Rust panics can be fed into the same pipeline with the [`panic`] bridge.
//!
//! ## Features
//!
//! - `backtrace`: resolve stack frames of panics with the `backtrace` crate.
//!   Without it, a panic carries a single frame at its location.

pub mod compute;
pub mod config;
pub mod context;
pub mod convert;
mod error;
pub mod event;
pub mod hooks;
pub mod hub;
pub mod normalize;
pub mod panic;
pub mod prelude;
pub mod sanitize;
pub mod trace;
pub mod value;

pub use triomphe::Arc;
pub use unhandled_protocol as protocol;

pub use self::error::{ConfigError, PropertyAccessError};
