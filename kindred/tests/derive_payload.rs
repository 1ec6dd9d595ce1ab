//! `#[derive(Payload)]` integration.

#![cfg(feature = "macros")]

use kindred::{AnyPayload, ContentType, ContentTyped, Dispatcher, Payload, Registry, content_type_of};
use std::sync::Arc;

#[derive(Payload)]
#[content_type = "shop.order"]
struct Order {
    id: u64,
}

#[derive(Payload)]
#[content_type = "shop.order.refund"]
struct Refund(u64);

#[derive(Payload)]
#[content_type = "shop.event"]
struct Event {
    #[content_type]
    kind: Option<ContentType>,
}

#[derive(Payload)]
#[content_type = "shop.wrapper"]
struct Wrapper<T: Send + Sync + 'static> {
    inner: T,
}

#[test]
fn test_declared_content_type() {
    assert_eq!(Order::CONTENT_TYPE, "shop.order");
    assert_eq!(Order::declared().unwrap().to_string(), "shop.order");
    assert_eq!(content_type_of(&Order { id: 1 }).unwrap().to_string(), "shop.order");
    assert_eq!(Refund(1).declared_content_type(), Some("shop.order.refund"));
    assert_eq!(Wrapper::<u8>::CONTENT_TYPE, "shop.wrapper");
    let _ = Wrapper { inner: 0u8 }.inner;
}

#[test]
fn test_instance_field_overrides() {
    let shipped = Event {
        kind: Some("shop.event.shipped".parse().unwrap()),
    };
    assert_eq!(content_type_of(&shipped).unwrap().to_string(), "shop.event.shipped");

    let unknown = Event { kind: None };
    assert_eq!(content_type_of(&unknown).unwrap().to_string(), "shop.event");
}

#[test]
fn test_derived_payloads_dispatch() {
    let registry = Arc::new(Registry::new());
    registry
        .register_handler::<Order, _, _>("audit", |o: &Order| format!("order {}", o.id))
        .unwrap();
    registry
        .register_handler_for::<AnyPayload, _, _>("shop", "audit", |p: &AnyPayload| {
            format!("shop {}", content_type_of(p).unwrap())
        })
        .unwrap();

    let dispatcher = Dispatcher::new(registry);
    let out: String = dispatcher.dispatch(&Order { id: 7 }, "audit", ()).unwrap();
    assert_eq!(out, "order 7");

    // `shop.order.refund` falls back to `shop.order`, whose handler takes
    // only `Order`.
    let err = dispatcher
        .dispatch::<(), String>(&Refund(3), "audit", ())
        .unwrap_err();
    assert!(matches!(err, kindred::DispatchError::PayloadTypeMismatch { .. }));

    let event = Event {
        kind: Some("shop.event.cancelled".parse().unwrap()),
    };
    let out: String = dispatcher.dispatch(&event, "audit", ()).unwrap();
    assert_eq!(out, "shop shop.event.cancelled");
}
