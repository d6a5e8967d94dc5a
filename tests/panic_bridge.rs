use std::{
    panic,
    sync::{Arc as StdArc, Mutex},
};

use unhandled::{
    Arc,
    config::ClientOptions,
    context::EventHint,
    hooks::{ErrorHandlerRef, GlobalHandlers, HostHooks, HostSlots},
    hub::Hub,
    normalize::ErrorArgs,
    panic::{PANIC_FAILURE_NAME, install_panic_bridge},
    protocol::Event,
    value::HostValue,
};

fn explode() {
    panic!("bridge test");
}

#[test]
fn panics_are_reported_through_the_error_slot() {
    let host: &'static HostSlots = Box::leak(Box::new(HostSlots::new()));
    let captured = StdArc::new(Mutex::new(Vec::<(Event, EventHint)>::new()));
    let sink = captured.clone();
    let hub = Arc::new(Hub::new(
        ClientOptions::default(),
        move |event: Event, hint: EventHint| {
            sink.lock().unwrap().push((event, hint));
        },
    ));

    let forwarded = StdArc::new(Mutex::new(Vec::new()));
    let previous_sink = forwarded.clone();
    host.set_error_handler(Some(ErrorHandlerRef::new(move |args: &ErrorArgs| {
        previous_sink.lock().unwrap().push(args.clone());
        true
    })));

    let handlers = GlobalHandlers::builder(host, hub.clone()).build();
    hub.register_integration(handlers.id());
    handlers.setup_once();
    install_panic_bridge(host);

    let result = panic::catch_unwind(explode);
    drop(panic::take_hook());
    assert!(result.is_err());

    let forwarded = forwarded.lock().unwrap();
    assert_eq!(forwarded.len(), 1);
    assert_eq!(forwarded[0].message, HostValue::from("bridge test"));
    assert!(
        forwarded[0]
            .url
            .as_deref()
            .is_some_and(|url| url.ends_with("panic_bridge.rs"))
    );

    let captured = captured.lock().unwrap();
    assert_eq!(captured.len(), 1);
    let (event, hint) = &captured[0];

    let exception = &event.exception.values[0];
    assert_eq!(exception.ty.as_deref(), Some(PANIC_FAILURE_NAME));
    assert_eq!(exception.value.as_deref(), Some("bridge test"));
    assert_eq!(exception.mechanism.as_ref().unwrap().ty, "onerror");

    let frames = &exception.stacktrace.as_ref().unwrap().frames;
    assert!(frames.iter().any(|frame| {
        frame
            .filename
            .as_deref()
            .is_some_and(|filename| filename.ends_with("panic_bridge.rs"))
    }));

    let HostValue::Error(failure) = &hint.original_exception else {
        panic!("expected a native failure, got {:?}", hint.original_exception);
    };
    assert_eq!(failure.name, PANIC_FAILURE_NAME);
    assert_eq!(failure.message, "bridge test");
}
