use corio::IoContext;
use corio::ops::post;
use corio::spawn;
use corio::sync::{AsyncMutex, Mutex};
use futures::FutureExt;
use std::future::Future;
use std::pin::pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};

struct Shared {
    ctx: IoContext,
    mutex: AsyncMutex,
    counter: AtomicUsize,
    log: std::sync::Mutex<Vec<&'static str>>,
}

impl Shared {
    fn new(ctx: &IoContext) -> Arc<Self> {
        Arc::new(Self {
            ctx: ctx.clone(),
            mutex: AsyncMutex::new(ctx.clone()),
            counter: AtomicUsize::new(0),
            log: std::sync::Mutex::new(Vec::new()),
        })
    }

    async fn wait_for(&self, expected: usize) {
        loop {
            {
                let _guard = self.mutex.async_lock_scoped().await;
                if self.counter.load(Ordering::SeqCst) == expected {
                    break;
                }
            }
            post(&self.ctx).await;
        }
    }

    async fn set(&self, value: usize, who: &'static str) {
        {
            let _guard = self.mutex.async_lock_scoped().await;
            self.counter.store(value, Ordering::SeqCst);
            self.log.lock().unwrap().push(who);
        }
        post(&self.ctx).await;
    }
}

#[test]
fn test_try_lock() {
    let ctx = IoContext::new();
    let mutex = AsyncMutex::new(ctx.clone());

    assert!(mutex.try_lock());
    assert!(!mutex.try_lock());
    assert!(mutex.is_locked());

    mutex.unlock();
    assert!(!mutex.is_locked());
    assert!(mutex.try_lock());
}

#[test]
#[should_panic(expected = "unlock of an unlocked AsyncMutex")]
fn test_unlock_unlocked_panics() {
    let mutex = AsyncMutex::new(IoContext::new());
    mutex.unlock();
}

#[test]
fn test_contended_routines_interleave() {
    let ctx = IoContext::new();
    let shared = Shared::new(&ctx);

    let a = shared.clone();
    spawn(&ctx, move || async move {
        a.set(1, "A").await;
        a.wait_for(3).await;
        a.set(4, "A").await;
    });

    let b = shared.clone();
    spawn(&ctx, move || async move {
        b.wait_for(1).await;
        for value in 2..4 {
            b.set(value, "B").await;
        }
        b.wait_for(4).await;
    });

    ctx.run();

    assert_eq!(*shared.log.lock().unwrap(), ["A", "B", "B", "A"]);
    assert!(!shared.mutex.is_locked());
}

#[test]
fn test_waiters_are_granted_in_arrival_order() {
    let ctx = IoContext::new();
    let mutex = Arc::new(AsyncMutex::new(ctx.clone()));
    let order = Arc::new(std::sync::Mutex::new(Vec::new()));

    assert!(mutex.try_lock());

    for i in 0..3 {
        let mutex = mutex.clone();
        let order = order.clone();
        spawn(&ctx, move || async move {
            mutex.async_lock().await;
            order.lock().unwrap().push(i);
            mutex.unlock();
        });
    }

    let queued = Arc::new(AtomicUsize::new(0));

    let releaser = mutex.clone();
    let out = queued.clone();
    spawn(&ctx, move || async move {
        out.store(releaser.waiters(), Ordering::SeqCst);
        releaser.unlock();
    });

    ctx.run();

    assert_eq!(queued.load(Ordering::SeqCst), 3);
    assert_eq!(*order.lock().unwrap(), [0, 1, 2]);
    assert!(!mutex.is_locked());
}

#[test]
fn test_uncontended_lock_completes_without_suspending() {
    let mutex = AsyncMutex::new(IoContext::new());

    assert!(mutex.async_lock().now_or_never().is_some());
    assert!(mutex.is_locked());

    mutex.unlock();
    assert!(!mutex.is_locked());
}

#[test]
fn test_dropping_pending_lock_removes_waiter() {
    let mutex = AsyncMutex::new(IoContext::new());
    assert!(mutex.try_lock());

    assert!(mutex.async_lock().now_or_never().is_none());
    assert_eq!(mutex.waiters(), 0);

    mutex.unlock();
    assert!(!mutex.is_locked());
}

#[test]
fn test_dropping_granted_lock_passes_it_on() {
    let ctx = IoContext::new();
    let mutex = AsyncMutex::new(ctx.clone());
    assert!(mutex.try_lock());

    {
        let mut lock = pin!(mutex.async_lock());
        let mut cx = Context::from_waker(futures::task::noop_waker_ref());

        assert!(matches!(lock.as_mut().poll(&mut cx), Poll::Pending));
        assert_eq!(mutex.waiters(), 1);

        // Hands the lock to the pending waiter.
        mutex.unlock();
        assert!(mutex.is_locked());
        assert_eq!(mutex.waiters(), 0);
    }

    assert!(!mutex.is_locked());
    ctx.run();
}

#[test]
fn test_scoped_guard_unlocks_on_drop() {
    let ctx = IoContext::new();
    let mutex = Arc::new(AsyncMutex::new(ctx.clone()));

    let inner = mutex.clone();
    ctx.block_on(async move {
        let guard = inner.async_lock_scoped().await;
        assert!(guard.owns_lock());
        assert!(inner.is_locked());

        drop(guard);
        assert!(!inner.is_locked());
    });
}

#[test]
fn test_guard_explicit_unlock() {
    let mutex = AsyncMutex::new(IoContext::new());

    let guard = mutex.async_lock_scoped().now_or_never();
    assert!(mutex.is_locked());

    if let Some(guard) = guard {
        guard.unlock();
    }
    assert!(!mutex.is_locked());
}

#[test]
fn test_mutex_counter() {
    let ctx = IoContext::new();
    let counter = Arc::new(Mutex::new(ctx.clone(), 0usize));

    for _ in 0..10 {
        let counter = counter.clone();
        let inner = ctx.clone();
        spawn(&ctx, move || async move {
            for _ in 0..100 {
                *counter.lock().await += 1;
                post(&inner).await;
            }
        });
    }

    ctx.run();

    assert!(!counter.is_locked());
    assert_eq!(counter.try_lock().map(|value| *value), Some(1000));
}

#[test]
fn test_mutex_on_runtime() {
    let runtime = corio::RuntimeBuilder::new().worker_threads(4).build();
    let counter = Arc::new(Mutex::new(runtime.context().clone(), 0usize));

    let total = runtime.block_on({
        let counter = counter.clone();
        let ctx = runtime.context().clone();

        async move {
            let done = Arc::new(AtomicUsize::new(0));

            for _ in 0..8 {
                let counter = counter.clone();
                let done = done.clone();
                spawn(&ctx, move || async move {
                    for _ in 0..250 {
                        *counter.lock().await += 1;
                    }
                    done.fetch_add(1, Ordering::SeqCst);
                });
            }

            while done.load(Ordering::SeqCst) < 8 {
                post(&ctx).await;
            }

            *counter.lock().await
        }
    });

    assert_eq!(total, 2000);
}
