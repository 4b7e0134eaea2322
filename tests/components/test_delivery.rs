//! Tests for backends/delivery.rs

use std::sync::Arc;
use std::thread;

use push_bridge::components::keys;
use push_bridge::{CanonicalMessage, DeliveryOutcome, DeliveryQueue};

use crate::support::{self, RecordingBridge};

fn message(body: &str) -> CanonicalMessage {
    CanonicalMessage::new().with(keys::MESSAGE, body)
}

#[test]
fn test_attached_delivers_immediately() {
    let bridge = RecordingBridge::attached();
    let queue = DeliveryQueue::new(bridge.clone());

    assert_eq!(queue.deliver(message("one")), DeliveryOutcome::Delivered);
    assert_eq!(bridge.messages(), vec!["one"]);
    assert!(queue.is_empty());
}

#[test]
fn test_detached_buffers_then_flushes_in_order_once() {
    support::init_tracing();
    let bridge = RecordingBridge::detached();
    let queue = DeliveryQueue::new(bridge.clone());

    for body in ["a", "b", "c"] {
        assert_eq!(queue.deliver(message(body)), DeliveryOutcome::Buffered);
    }
    assert_eq!(queue.len(), 3);
    assert!(bridge.delivered().is_empty());

    bridge.set_attached(true);
    assert_eq!(queue.on_bridge_attached(), 3);
    assert_eq!(bridge.messages(), vec!["a", "b", "c"]);

    // A second attach has nothing left to send
    assert_eq!(queue.on_bridge_attached(), 0);
    assert_eq!(bridge.delivered().len(), 3);
}

#[test]
fn test_no_cache_messages_are_not_buffered() {
    let queue = DeliveryQueue::new(RecordingBridge::detached());
    let volatile = message("ping").with(keys::NO_CACHE, "1");

    assert_eq!(queue.deliver(volatile), DeliveryOutcome::Dropped);
    assert!(queue.is_empty());
}

#[test]
fn test_refusal_only_affects_that_delivery() {
    let bridge = RecordingBridge::attached();
    let queue = DeliveryQueue::new(bridge.clone());

    bridge.set_refusing(true);
    assert_eq!(queue.deliver(message("first")), DeliveryOutcome::Buffered);
    assert_eq!(queue.len(), 1);

    bridge.set_refusing(false);
    assert_eq!(queue.deliver(message("second")), DeliveryOutcome::Delivered);
    assert_eq!(bridge.messages(), vec!["first", "second"]);
    assert!(queue.is_empty());
    assert!(queue.is_attached());
}

#[test]
fn test_refused_flush_keeps_order() {
    let bridge = RecordingBridge::detached();
    let queue = DeliveryQueue::new(bridge.clone());
    queue.deliver(message("a"));

    bridge.set_attached(true);
    bridge.set_refusing(true);
    assert_eq!(queue.deliver(message("b")), DeliveryOutcome::Buffered);
    assert_eq!(queue.len(), 2);

    bridge.set_refusing(false);
    assert_eq!(queue.deliver(message("c")), DeliveryOutcome::Delivered);
    assert_eq!(bridge.messages(), vec!["a", "b", "c"]);
}

#[test]
fn test_bridge_attach_is_picked_up_without_signal() {
    let bridge = RecordingBridge::detached();
    let queue = DeliveryQueue::new(bridge.clone());
    assert_eq!(queue.deliver(message("early")), DeliveryOutcome::Buffered);

    bridge.set_attached(true);
    assert_eq!(queue.deliver(message("late")), DeliveryOutcome::Delivered);
    assert_eq!(bridge.messages(), vec!["early", "late"]);
}

#[test]
fn test_refused_no_cache_message_is_dropped() {
    let bridge = RecordingBridge::attached();
    let queue = DeliveryQueue::new(bridge.clone());

    bridge.set_refusing(true);
    let volatile = message("ping").with(keys::NO_CACHE, "1");
    assert_eq!(queue.deliver(volatile), DeliveryOutcome::Dropped);
    assert!(queue.is_empty());
}

#[test]
fn test_concurrent_deliver_and_flush() {
    let bridge = RecordingBridge::detached();
    let queue = Arc::new(DeliveryQueue::new(bridge.clone()));

    for i in 0..50 {
        queue.deliver(message(&format!("early-{}", i)));
    }

    let producers: Vec<_> = (0..4)
        .map(|t| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..25 {
                    queue.deliver(message(&format!("late-{}-{}", t, i)));
                }
            })
        })
        .collect();

    bridge.set_attached(true);
    queue.on_bridge_attached();

    for producer in producers {
        producer.join().expect("producer thread panicked");
    }
    queue.on_bridge_attached();

    let delivered = bridge.messages();
    assert_eq!(delivered.len(), 150);

    let mut unique = delivered.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 150);

    let early: Vec<_> = delivered.iter().take(50).cloned().collect();
    let expected: Vec<_> = (0..50).map(|i| format!("early-{}", i)).collect();
    assert_eq!(early, expected);
}
