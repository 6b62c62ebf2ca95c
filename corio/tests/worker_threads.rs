use corio::ops::post;
use corio::{RuntimeBuilder, spawn};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

#[test]
fn test_single_worker_thread() {
    let rt = RuntimeBuilder::new().worker_threads(1).build();

    let result = rt.block_on(async { 42 });
    assert_eq!(result, 42);
}

#[test]
fn test_multiple_worker_threads() {
    let rt = RuntimeBuilder::new().worker_threads(4).build();

    let result = rt.block_on(async { 100 });
    assert_eq!(result, 100);
}

#[test]
fn test_worker_threads_spawned_routines_all_run() {
    let rt = RuntimeBuilder::new().worker_threads(4).build();

    let completed = Arc::new(Mutex::new(HashSet::new()));
    let remaining = Arc::new(AtomicUsize::new(20));

    for i in 0..20 {
        let completed = completed.clone();
        let remaining = remaining.clone();
        rt.spawn(move || async move {
            completed.lock().unwrap().insert(i);
            remaining.fetch_sub(1, Ordering::SeqCst);
        });
    }

    let ctx = rt.context().clone();
    let left = remaining.clone();
    rt.block_on(async move {
        while left.load(Ordering::SeqCst) > 0 {
            post(&ctx).await;
        }
    });

    let set = completed.lock().unwrap();
    assert_eq!(set.len(), 20);
    for i in 0..20 {
        assert!(set.contains(&i), "Routine {} should have completed", i);
    }
}

#[test]
fn test_worker_threads_are_named() {
    let rt = RuntimeBuilder::new()
        .worker_threads(2)
        .thread_name("named-worker")
        .build();

    let name = rt.block_on(async { thread::current().name().map(String::from) });
    assert!(name.is_some_and(|n| n.starts_with("named-worker")));
}

#[test]
fn test_worker_threads_chained_spawns() {
    let rt = RuntimeBuilder::new().worker_threads(4).build();
    let (tx, rx) = std::sync::mpsc::channel();

    let ctx = rt.context().clone();
    rt.spawn(move || async move {
        let inner = ctx.clone();
        spawn(&ctx, move || async move {
            spawn(&inner, move || async move {
                let _ = tx.send(10 + 20 + 30);
            });
        });
    });

    assert_eq!(rx.recv().unwrap(), 60);
}

#[test]
#[should_panic(expected = "worker_threads must be > 0")]
fn test_worker_threads_zero_panics() {
    let _ = RuntimeBuilder::new().worker_threads(0).build();
}

#[test]
fn test_worker_threads_sequential_runtimes() {
    for n in 1..=4 {
        let rt = RuntimeBuilder::new().worker_threads(n).build();
        let result = rt.block_on(async move { n * 10 });
        assert_eq!(result, n * 10);
        drop(rt);
    }
}

#[test]
fn test_block_on_reraises_panic() {
    let rt = RuntimeBuilder::new().worker_threads(2).build();

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        rt.block_on(async {
            if true {
                panic!("routine failed");
            }
        })
    }));
    assert!(result.is_err());

    assert_eq!(rt.block_on(async { 7 }), 7);
}
