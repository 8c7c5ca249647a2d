//! Tests for observable properties

use std::sync::Arc;
use std::thread;

use contention::core::{Index, Observable};
use parking_lot::Mutex;

#[test]
fn test_update_applies_function() {
    let cell = Observable::new(3_u32);
    assert!(cell.update(|v| v * 2));
    assert_eq!(cell.get(), 6);
    assert!(!cell.update(|v| *v));
}

#[test]
fn test_clone_shares_state() {
    let cell = Observable::named(Index(7000), "Power", 50.0_f64);
    let other = cell.clone();
    other.set(75.0);
    assert!((cell.get() - 75.0).abs() < f64::EPSILON);
    assert!(cell.ptr_eq(&other));
    assert_eq!(cell.index(), Index(7000));
    assert_eq!(cell.name(), "Power");
}

#[test]
fn test_unsubscribe_unknown_id() {
    let a = Observable::new(0_i32);
    let b = Observable::new(0_i32);
    let id = a.subscribe(|_| {});
    assert!(!b.unsubscribe(id));
    assert!(a.unsubscribe(id));
    assert!(!a.unsubscribe(id));
    assert_eq!(a.subscriber_count(), 0);
}

#[test]
fn test_subscribe_from_inside_callback() {
    let cell = Observable::new(0_u32);
    let late = Arc::new(Mutex::new(Vec::new()));

    let inner_cell = cell.clone();
    let inner_late = Arc::clone(&late);
    cell.subscribe(move |value: &u32| {
        if *value == 1 {
            let sink = Arc::clone(&inner_late);
            inner_cell.subscribe(move |v: &u32| sink.lock().push(*v));
        }
    });

    cell.set(1);
    cell.set(2);
    // Replay of 1 on subscribe, then the later write.
    assert_eq!(*late.lock(), vec![1, 2]);
}

#[test]
fn test_cells_cross_threads() {
    let cell = Observable::new(0_u64);
    let total = Arc::new(Mutex::new(0_u64));
    let sink = Arc::clone(&total);
    cell.subscribe(move |v: &u64| *sink.lock() += *v);

    let handles: Vec<_> = (1..=4_u64)
        .map(|n| {
            let cell = cell.clone();
            thread::spawn(move || {
                cell.set(n * 10);
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!([10, 20, 30, 40].contains(&cell.get()));
    assert!(*total.lock() > 0);
}

#[test]
fn test_debug_shows_value() {
    let cell = Observable::named(Index(1000), "CPU Speed", 8.0_f64);
    let rendered = format!("{cell:?}");
    assert!(rendered.contains("CPU Speed"));
    assert!(rendered.contains('8'));
}
