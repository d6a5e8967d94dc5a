//! Forwarding of Rust panics to the host's synchronous failure slot.
//!
//! Panics are the native uncaught failures of a Rust process. Once the bridge
//! is installed, every panic reaches the error slot of a [`HostHooks`] as an
//! [`ErrorArgs`] whose error is a [`NativeFailure`] named `panic`. Whatever
//! [`GlobalHandlers`] installed there reports it like any other failure.
//!
//! [`GlobalHandlers`]: crate::hooks::GlobalHandlers

use core::any::Any;
use std::panic::{self, PanicHookInfo};

use crate::{
    hooks::HostHooks,
    normalize::ErrorArgs,
    trace::{Frame, UNKNOWN_FUNCTION},
    value::NativeFailure,
};

/// The name of native failures created from panics.
pub const PANIC_FAILURE_NAME: &str = "panic";

/// Installs a panic hook forwarding panics to `host`.
///
/// The panic hook that was installed before keeps running, unless the error
/// slot returns `true` to signal the panic was handled.
pub fn install_panic_bridge(host: &'static dyn HostHooks) {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let handled = host.dispatch_error(&panic_args(info));
        if !handled {
            previous(info);
        }
    }));
    tracing::debug!("panic bridge installed");
}

/// Describes a panic as the arguments of the synchronous failure hook.
pub fn panic_args(info: &PanicHookInfo<'_>) -> ErrorArgs {
    let message = payload_message(info.payload());
    let location = info.location();
    let (url, line, column) = match location {
        Some(location) => (
            Some(location.file()),
            Some(location.line()),
            Some(location.column()),
        ),
        None => (None, None, None),
    };

    let mut frames = capture_frames();
    if frames.is_empty() {
        frames.push(Frame::new(UNKNOWN_FUNCTION, url, line, column));
    }

    ErrorArgs::new(message)
        .with_location(url, line, column)
        .with_error(NativeFailure::new(PANIC_FAILURE_NAME, message).with_stack(frames))
}

pub(crate) fn payload_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "Box<dyn Any>"
    }
}

#[cfg(feature = "backtrace")]
const SKIPPED_INITIAL_CRATES: &[&str] = &[
    "backtrace",
    "unhandled",
    "core",
    "std",
    "alloc",
    "__rustc",
    "rust_begin_unwind",
];

#[cfg(feature = "backtrace")]
fn capture_frames() -> Vec<Frame> {
    let mut frames = Vec::new();
    let mut initial_filtering = true;

    backtrace::trace(|frame| {
        backtrace::resolve_frame(frame, |symbol| {
            let (Some(name), Some(filename)) = (symbol.name(), symbol.filename()) else {
                return;
            };
            let name = format!("{name:#}");

            if initial_filtering {
                if SKIPPED_INITIAL_CRATES.contains(&crate_of(&name)) {
                    return;
                }
                initial_filtering = false;
            }

            frames.push(Frame::new(
                name,
                Some(&*filename.to_string_lossy()),
                symbol.lineno(),
                symbol.colno(),
            ));
        });
        frames.len() < crate::convert::STACKTRACE_LIMIT
    });

    frames
}

#[cfg(feature = "backtrace")]
fn crate_of(symbol: &str) -> &str {
    let symbol = symbol.trim_start_matches('<');
    symbol.split("::").next().unwrap_or(symbol)
}

#[cfg(not(feature = "backtrace"))]
fn capture_frames() -> Vec<Frame> {
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_message() {
        let text: Box<dyn Any + Send> = Box::new("static text");
        assert_eq!(payload_message(&*text), "static text");

        let owned: Box<dyn Any + Send> = Box::new(String::from("owned text"));
        assert_eq!(payload_message(&*owned), "owned text");

        let other: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(payload_message(&*other), "Box<dyn Any>");
    }

    #[cfg(feature = "backtrace")]
    #[test]
    fn test_crate_of() {
        assert_eq!(crate_of("std::panicking::begin_panic"), "std");
        assert_eq!(
            crate_of("<alloc::boxed::Box<F,A> as core::ops::function::Fn<Args>>::call"),
            "alloc"
        );
        assert_eq!(crate_of("rust_begin_unwind"), "rust_begin_unwind");
    }
}
