//! Wire-shape tests for the telemetry model.

use serde_json::json;
use unhandled_protocol::{
    Event, Exception, ExceptionList, Level, Map, Mechanism, StackFrame, Stacktrace,
};

static_assertions::assert_impl_all!(Event: Send, Sync, Clone);
static_assertions::assert_impl_all!(Level: Copy);

#[test]
fn test_empty_event_serializes_to_empty_object() {
    let event = Event::default();
    assert_eq!(serde_json::to_value(&event).unwrap(), json!({}));
}

#[test]
fn test_full_event_shape() {
    let mut data = Map::new();
    data.insert("mode".into(), json!("onerror"));
    data.insert("message".into(), json!("boom"));

    let event = Event {
        level: Some(Level::Error),
        exception: ExceptionList {
            values: vec![Exception {
                ty: Some("Error".into()),
                value: Some("boom".into()),
                stacktrace: Some(Stacktrace {
                    frames: vec![StackFrame {
                        function: Some("?".into()),
                        filename: Some("https://example.com/app.js".into()),
                        lineno: Some(10),
                        colno: Some(4),
                        in_app: Some(true),
                    }],
                }),
                mechanism: Some(Mechanism::unhandled("onerror", data)),
            }],
        },
        extra: Map::new(),
    };

    assert_eq!(
        serde_json::to_value(&event).unwrap(),
        json!({
            "level": "error",
            "exception": {
                "values": [{
                    "type": "Error",
                    "value": "boom",
                    "stacktrace": {
                        "frames": [{
                            "function": "?",
                            "filename": "https://example.com/app.js",
                            "lineno": 10,
                            "colno": 4,
                            "in_app": true
                        }]
                    },
                    "mechanism": {
                        "type": "onerror",
                        "handled": false,
                        "data": { "mode": "onerror", "message": "boom" }
                    }
                }]
            }
        })
    );
}

#[test]
fn test_mechanism_data_keeps_insertion_order() {
    let mut data = Map::new();
    data.insert("mode".into(), json!("failed"));
    data.insert("name".into(), json!("TypeError"));
    data.insert("message".into(), json!("nope"));

    let text = serde_json::to_string(&Mechanism::unhandled("onunhandledrejection", data)).unwrap();
    assert_eq!(
        text,
        r#"{"type":"onunhandledrejection","handled":false,"data":{"mode":"failed","name":"TypeError","message":"nope"}}"#
    );
}

#[test]
fn test_event_deserializes_from_collector_payload() {
    let event: Event = serde_json::from_value(json!({
        "level": "warning",
        "exception": { "values": [{ "type": "UnhandledRejection", "value": "x" }] },
        "extra": { "__serialized__": { "a": 1 } }
    }))
    .unwrap();

    assert_eq!(event.level, Some(Level::Warning));
    assert_eq!(event.exception.values[0].ty.as_deref(), Some("UnhandledRejection"));
    assert_eq!(event.extra["__serialized__"], json!({ "a": 1 }));
}
