//! Concurrent resolution tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Barrier};
use std::thread;
use std::time::Duration;

use lazywire_di::*;

dependency! {
    Slow: Vec<u8>;
    Front: u32;
    Back: u32;
}

/// Block on `barrier` the first time only
fn rendezvous(barrier: &Barrier, passed: &AtomicBool) {
    if !passed.swap(true, Ordering::SeqCst) {
        barrier.wait();
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

#[test]
fn test_racing_threads_construct_once() {
    init_tracing();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let mut factories = Factories::new();
    factories.provide::<Slow, _>(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        Ok(vec![0; 1024])
    });

    let container = Arc::new(Container::new(factories));
    let thread_count = 8;
    let barrier = Arc::new(Barrier::new(thread_count));
    let (tx, rx) = mpsc::channel();

    for _ in 0..thread_count {
        let container = Arc::clone(&container);
        let barrier = Arc::clone(&barrier);
        let tx = tx.clone();

        thread::spawn(move || {
            barrier.wait();
            let resolved = container.resolve::<Slow>().unwrap();
            tx.send(resolved).unwrap();
        });
    }

    let mut results = vec![];
    for _ in 0..thread_count {
        results.push(rx.recv_timeout(Duration::from_secs(10)).unwrap());
    }

    for result in &results[1..] {
        assert!(Arc::ptr_eq(&results[0], result));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_waiters_retry_after_failed_construction() {
    init_tracing();
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);

    let mut factories = Factories::new();
    factories.provide::<Front, _>(move |_| {
        let attempt = counter.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        if attempt == 0 {
            Err(DIError::construction::<Front>(anyhow::anyhow!("first attempt fails")))
        } else {
            Ok(5)
        }
    });

    let container = Arc::new(Container::new(factories));
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let container = Arc::clone(&container);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                container.resolve::<Front>().ok().map(|v| *v)
            })
        })
        .collect();

    let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    // Whichever thread ran the first attempt failed; the other retried
    assert_eq!(outcomes.iter().filter(|o| **o == Some(5)).count(), 1);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert_eq!(*container.resolve::<Front>().unwrap(), 5);
}

#[test]
fn test_cross_thread_cycle_does_not_deadlock() {
    init_tracing();
    let barrier = Arc::new(Barrier::new(2));

    let mut factories = Factories::new();
    let front_barrier = Arc::clone(&barrier);
    let front_passed = AtomicBool::new(false);
    factories.provide::<Front, _>(move |c| {
        rendezvous(&front_barrier, &front_passed);
        Ok(*c.resolve::<Back>()? + 1)
    });
    let back_barrier = Arc::clone(&barrier);
    let back_passed = AtomicBool::new(false);
    factories.provide::<Back, _>(move |c| {
        rendezvous(&back_barrier, &back_passed);
        Ok(*c.resolve::<Front>()? + 1)
    });

    let container = Arc::new(Container::new(factories));
    let (tx, rx) = mpsc::channel();

    let front = {
        let container = Arc::clone(&container);
        let tx = tx.clone();
        thread::spawn(move || tx.send(container.resolve::<Front>().map(|v| *v)).unwrap())
    };
    let back = {
        let container = Arc::clone(&container);
        thread::spawn(move || tx.send(container.resolve::<Back>().map(|v| *v)).unwrap())
    };

    let first = rx.recv_timeout(Duration::from_secs(10)).unwrap();
    let second = rx.recv_timeout(Duration::from_secs(10)).unwrap();
    front.join().unwrap();
    back.join().unwrap();

    for outcome in [first, second] {
        match outcome {
            Err(DIError::DependencyCycle { path, .. }) => {
                assert_eq!(path.len(), 3, "{path:?}");
                assert_eq!(path.first(), path.last(), "{path:?}");
                assert!(path.contains(&DependencyKey::of::<Front>()));
                assert!(path.contains(&DependencyKey::of::<Back>()));
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }
    assert!(!container.is_resolved::<Front>());
    assert!(!container.is_resolved::<Back>());
}
