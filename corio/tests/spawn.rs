use corio::{IoContext, Task, spawn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[test]
fn test_spawn_accumulates_indices() {
    let ctx = IoContext::new();
    let total = Arc::new(AtomicUsize::new(0));

    for i in 0..10 {
        let total = total.clone();
        spawn(&ctx, move || async move {
            total.fetch_add(i, Ordering::SeqCst);
        });
    }

    ctx.run();
    assert_eq!(total.load(Ordering::SeqCst), 45);
}

#[test]
fn test_spawn_releases_captures_after_run() {
    let ctx = IoContext::new();
    let data = Arc::new(7);

    {
        let data = data.clone();
        spawn(&ctx, move || async move {
            assert_eq!(*data, 7);
        });
    }

    assert_eq!(Arc::strong_count(&data), 2);

    ctx.run();
    assert_eq!(Arc::strong_count(&data), 1);
}

#[test]
fn test_spawn_never_runs_inline() {
    let ctx = IoContext::new();
    let ran = Arc::new(AtomicBool::new(false));

    let flag = ran.clone();
    spawn(&ctx, move || async move {
        flag.store(true, Ordering::SeqCst);
    });
    assert!(!ran.load(Ordering::SeqCst));

    ctx.run();
    assert!(ran.load(Ordering::SeqCst));
}

#[test]
fn test_spawn_from_inside_a_routine_is_deferred() {
    let ctx = IoContext::new();
    let ran = Arc::new(AtomicBool::new(false));
    let seen_early = Arc::new(AtomicBool::new(true));

    let inner = ctx.clone();
    let flag = ran.clone();
    let early = seen_early.clone();

    spawn(&ctx, move || async move {
        let child = flag.clone();
        spawn(&inner, move || async move {
            child.store(true, Ordering::SeqCst);
        });
        early.store(flag.load(Ordering::SeqCst), Ordering::SeqCst);
    });

    ctx.run();
    assert!(ran.load(Ordering::SeqCst));
    assert!(!seen_early.load(Ordering::SeqCst));
}

#[test]
fn test_spawn_accepts_tasks() {
    let ctx = IoContext::new();
    let total = Arc::new(AtomicUsize::new(0));

    let out = total.clone();
    spawn(&ctx, move || {
        Task::new(async move {
            out.fetch_add(5, Ordering::SeqCst);
        })
    });

    ctx.run();
    assert_eq!(total.load(Ordering::SeqCst), 5);
}

#[test]
fn test_spawn_panic_does_not_stop_context() {
    let ctx = IoContext::new();
    let ran = Arc::new(AtomicBool::new(false));

    spawn(&ctx, || Task::<()>::new(async { panic!("routine failed") }));

    let flag = ran.clone();
    spawn(&ctx, move || async move {
        flag.store(true, Ordering::SeqCst);
    });

    ctx.run();
    assert!(ran.load(Ordering::SeqCst));
}
