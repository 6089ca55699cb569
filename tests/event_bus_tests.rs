// Event bus: delivery, unsubscribe by identity, failure isolation, concurrent access

mod common;

use netbind::event_bus::{EventBus, handler};
use netbind::models::{Event, EventKind, ProcessState};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn counter(bus: &EventBus, kind: EventKind) -> (netbind::event_bus::Handler, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let c = count.clone();
    let h = handler(move |_| {
        c.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    bus.subscribe(kind, h.clone());
    (h, count)
}

#[test]
fn test_subscriber_receives_published_event_once() {
    let bus = EventBus::new();
    let (_h, seen) = common::record(&bus, EventKind::InterfaceChanged);

    bus.publish(&Event::interface_changed("eth0")).unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.as_slice(), &[Event::interface_changed("eth0")]);
}

#[test]
fn test_unsubscribed_handler_is_not_invoked() {
    let bus = EventBus::new();
    let (h, count) = counter(&bus, EventKind::InterfaceChanged);

    bus.publish(&Event::interface_changed("eth0")).unwrap();
    bus.unsubscribe(EventKind::InterfaceChanged, &h);
    bus.publish(&Event::interface_changed("eth0")).unwrap();

    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(bus.subscriber_count(EventKind::InterfaceChanged), 0);
}

#[test]
fn test_publish_without_subscribers_is_noop() {
    let bus = EventBus::new();
    assert!(
        bus.publish(&Event::process_state_changed(1, ProcessState::Running))
            .is_ok()
    );
}

#[test]
fn test_delivery_is_keyed_by_kind() {
    let bus = EventBus::new();
    let (_a, interface_count) = counter(&bus, EventKind::InterfaceChanged);
    let (_b, process_count) = counter(&bus, EventKind::ProcessStateChanged);

    bus.publish(&Event::process_state_changed(7, ProcessState::Terminated))
        .unwrap();

    assert_eq!(interface_count.load(Ordering::SeqCst), 0);
    assert_eq!(process_count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_duplicate_registration_delivers_twice_and_unsubscribe_removes_all() {
    let bus = EventBus::new();
    let (h, count) = counter(&bus, EventKind::InterfaceChanged);
    bus.subscribe(EventKind::InterfaceChanged, h.clone());

    bus.publish(&Event::interface_changed("eth0")).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 2);

    bus.unsubscribe(EventKind::InterfaceChanged, &h);
    bus.publish(&Event::interface_changed("eth0")).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[test]
fn test_unsubscribe_matches_identity_not_behaviour() {
    let bus = EventBus::new();
    let (kept, kept_count) = counter(&bus, EventKind::InterfaceChanged);
    let (removed, removed_count) = counter(&bus, EventKind::InterfaceChanged);

    bus.unsubscribe(EventKind::InterfaceChanged, &removed);
    bus.unsubscribe(EventKind::ProcessStateChanged, &kept);
    bus.publish(&Event::interface_changed("eth0")).unwrap();

    assert_eq!(kept_count.load(Ordering::SeqCst), 1);
    assert_eq!(removed_count.load(Ordering::SeqCst), 0);
}

#[test]
fn test_failing_handler_does_not_block_others() {
    let bus = EventBus::new();
    bus.subscribe(
        EventKind::InterfaceChanged,
        handler(|_| anyhow::bail!("view refresh failed")),
    );
    bus.subscribe(
        EventKind::InterfaceChanged,
        handler(|_| panic!("handler bug")),
    );
    let (_h, count) = counter(&bus, EventKind::InterfaceChanged);

    let err = bus.publish(&Event::interface_changed("eth0")).unwrap_err();

    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(err.failed, 2);
    assert_eq!(err.delivered, 3);
    assert_eq!(err.kind, EventKind::InterfaceChanged);
}

#[test]
fn test_handler_may_unsubscribe_itself_during_delivery() {
    let bus = Arc::new(EventBus::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let slot: Arc<Mutex<Option<netbind::event_bus::Handler>>> = Arc::new(Mutex::new(None));

    let bus_ref = bus.clone();
    let slot_ref = slot.clone();
    let c = calls.clone();
    let h = handler(move |_| {
        c.fetch_add(1, Ordering::SeqCst);
        if let Some(me) = slot_ref.lock().unwrap().as_ref() {
            bus_ref.unsubscribe(EventKind::InterfaceChanged, me);
        }
        Ok(())
    });
    *slot.lock().unwrap() = Some(h.clone());
    bus.subscribe(EventKind::InterfaceChanged, h);

    bus.publish(&Event::interface_changed("eth0")).unwrap();
    bus.publish(&Event::interface_changed("eth0")).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    // Break the handler -> slot -> handler cycle.
    slot.lock().unwrap().take();
}

#[test]
fn test_concurrent_subscribe_unsubscribe_publish() {
    let bus = Arc::new(EventBus::new());
    let (_stable, stable_count) = counter(&bus, EventKind::InterfaceChanged);

    let threads: Vec<_> = (0..8)
        .map(|i| {
            let bus = bus.clone();
            std::thread::spawn(move || {
                for _ in 0..200 {
                    if i % 2 == 0 {
                        let h = handler(|_| Ok(()));
                        bus.subscribe(EventKind::InterfaceChanged, h.clone());
                        bus.unsubscribe(EventKind::InterfaceChanged, &h);
                    } else {
                        bus.publish(&Event::interface_changed("eth0")).unwrap();
                    }
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }

    assert_eq!(stable_count.load(Ordering::SeqCst), 4 * 200);
    assert_eq!(bus.subscriber_count(EventKind::InterfaceChanged), 1);
}
