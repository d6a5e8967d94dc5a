#![deny(
    missing_docs,
    unsafe_code,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]

//! Wire data model for the [`unhandled`] crate.
//!
//! # Overview
//!
//! This crate contains the serializable shapes of the telemetry events that
//! [`unhandled`] submits to a collector. It deliberately knows nothing about
//! hooks, host values or stack computation: everything here is plain data
//! with `serde` implementations that match the collector's JSON format.
//!
//! **This crate is an implementation detail.** Users should depend on the
//! [`unhandled`] crate, which re-exports everything needed from here.
//!
//! # Layout
//!
//! - **[`event`]**: the top-level [`Event`], its [`ExceptionList`], every
//!   [`Exception`] and the [`Mechanism`] describing how it was captured.
//! - **[`stacktrace`]**: the [`Stacktrace`] attached to an exception and its
//!   [`StackFrame`]s, ordered oldest call first.
//!
//! ```
//! use unhandled_protocol::{Event, Exception, Level};
//!
//! let mut event = Event::default();
//! event.level = Some(Level::Error);
//! event.exception.values.push(Exception::new("TypeError", "x is not a function"));
//!
//! let json = serde_json::to_value(&event).unwrap();
//! assert_eq!(json["exception"]["values"][0]["type"], "TypeError");
//! ```
//!
//! [`unhandled`]: https://docs.rs/unhandled/latest/unhandled/

pub mod event;
pub mod stacktrace;

pub use event::{Event, Exception, ExceptionList, Level, Map, Mechanism};
pub use stacktrace::{StackFrame, Stacktrace};
