use corio::IoContext;
use corio::ops::async_wait;
use corio::spawn;
use corio::time::{SteadyTimer, sleep};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[test]
fn test_wait_until_expiry() {
    let ctx = IoContext::new();
    let start = Instant::now();

    let inner = ctx.clone();
    let result = ctx.block_on(async move {
        let timer = SteadyTimer::after(&inner, Duration::from_millis(30));
        async_wait(&timer).await
    });

    assert!(result.is_ok());
    assert!(start.elapsed() >= Duration::from_millis(30));
}

#[test]
fn test_expired_timer_completes_immediately() {
    let ctx = IoContext::new();

    let inner = ctx.clone();
    let result = ctx.block_on(async move {
        let timer = SteadyTimer::new(&inner);
        async_wait(&timer).await
    });

    assert!(result.is_ok());
}

#[test]
fn test_sleep() {
    let ctx = IoContext::new();
    let start = Instant::now();

    let inner = ctx.clone();
    ctx.block_on(async move { sleep(&inner, Duration::from_millis(20)).await })
        .unwrap();

    assert!(start.elapsed() >= Duration::from_millis(20));
}

#[test]
fn test_timers_fire_in_deadline_order() {
    let ctx = IoContext::new();
    let order = Arc::new(Mutex::new(Vec::new()));

    for (id, millis) in [(0, 40), (1, 10), (2, 25)] {
        let inner = ctx.clone();
        let order = order.clone();
        spawn(&ctx, move || async move {
            let timer = SteadyTimer::after(&inner, Duration::from_millis(millis));
            if async_wait(&timer).await.is_ok() {
                order.lock().unwrap().push(id);
            }
        });
    }

    ctx.run();
    assert_eq!(*order.lock().unwrap(), [1, 2, 0]);
}

#[test]
fn test_cancel_aborts_pending_wait() {
    let ctx = IoContext::new();
    let timer = Arc::new(SteadyTimer::after(&ctx, Duration::from_secs(60)));
    let outcome = Arc::new(Mutex::new(None));
    let cancelled = Arc::new(Mutex::new(0));

    let waiting = timer.clone();
    let out = outcome.clone();
    spawn(&ctx, move || async move {
        let result = async_wait(&waiting).await;
        *out.lock().unwrap() = Some(result.is_err_and(|e| e.is_aborted()));
    });

    let canceller = timer.clone();
    let count = cancelled.clone();
    spawn(&ctx, move || async move {
        *count.lock().unwrap() = canceller.cancel();
    });

    let start = Instant::now();
    ctx.run();

    assert!(start.elapsed() < Duration::from_secs(60));
    assert_eq!(*outcome.lock().unwrap(), Some(true));
    assert_eq!(*cancelled.lock().unwrap(), 1);
}

#[test]
fn test_rearm_aborts_pending_wait() {
    let ctx = IoContext::new();
    let timer = Arc::new(SteadyTimer::after(&ctx, Duration::from_secs(60)));
    let results = Arc::new(Mutex::new(Vec::new()));

    let waiting = timer.clone();
    let out = results.clone();
    spawn(&ctx, move || async move {
        let first = async_wait(&waiting).await;
        out.lock().unwrap().push(first.is_err_and(|e| e.is_aborted()));

        let second = async_wait(&waiting).await;
        out.lock().unwrap().push(second.is_ok());
    });

    let rearm = timer.clone();
    spawn(&ctx, move || async move {
        rearm.expires_after(Duration::from_millis(5));
    });

    ctx.run();
    assert_eq!(*results.lock().unwrap(), [true, true]);
}

#[test]
fn test_cancel_without_waits() {
    let ctx = IoContext::new();
    let timer = SteadyTimer::after(&ctx, Duration::from_secs(1));

    assert_eq!(timer.cancel(), 0);
    assert_eq!(ctx.run(), 0);
}
