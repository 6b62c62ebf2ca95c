#![cfg(unix)]

use corio::IoContext;
use corio::ops::async_wait_signal;
use corio::signal::{SIGUSR1, SIGUSR2, SignalSet};
use corio::spawn;
use std::sync::{Arc, Mutex};

#[test]
fn test_delivered_signal_completes_wait() {
    let ctx = IoContext::new();
    let signals = Arc::new(SignalSet::new(&ctx));
    signals.add(SIGUSR1).unwrap();
    assert!(signals.contains(SIGUSR1));

    let waiting = signals.clone();
    let received = ctx.block_on({
        let sender = signals.clone();
        let inner = ctx.clone();

        async move {
            spawn(&inner, move || async move {
                sender.deliver(SIGUSR1);
            });
            async_wait_signal(&waiting).await
        }
    });

    assert_eq!(received.unwrap(), SIGUSR1);
}

#[test]
fn test_signal_before_wait_is_queued() {
    let ctx = IoContext::new();
    let signals = SignalSet::new(&ctx);
    signals.add(SIGUSR1).unwrap();

    signals.deliver(SIGUSR1);
    signals.deliver(SIGUSR1);

    let inner = Arc::new(signals);
    let received = ctx.block_on(async move {
        let first = async_wait_signal(&inner).await;
        let second = async_wait_signal(&inner).await;
        (first.ok(), second.ok())
    });

    assert_eq!(received, (Some(SIGUSR1), Some(SIGUSR1)));
}

#[test]
fn test_signal_outside_set_is_ignored() {
    let ctx = IoContext::new();
    let signals = SignalSet::new(&ctx);
    signals.add(SIGUSR1).unwrap();
    signals.remove(SIGUSR1).unwrap();

    signals.deliver(SIGUSR1);
    assert!(!signals.contains(SIGUSR1));
    assert_eq!(ctx.run(), 0);
}

#[test]
fn test_cancel_aborts_wait() {
    let ctx = IoContext::new();
    let signals = Arc::new(SignalSet::new(&ctx));
    signals.add(SIGUSR1).unwrap();

    let outcome = Arc::new(Mutex::new(None));

    let waiting = signals.clone();
    let out = outcome.clone();
    spawn(&ctx, move || async move {
        let result = async_wait_signal(&waiting).await;
        *out.lock().unwrap() = Some(result.is_err_and(|e| e.is_aborted()));
    });

    let canceller = signals.clone();
    spawn(&ctx, move || async move {
        canceller.cancel();
    });

    ctx.run();
    assert_eq!(*outcome.lock().unwrap(), Some(true));
}

#[test]
fn test_raised_signal_is_delivered() {
    let ctx = IoContext::new();
    let signals = Arc::new(SignalSet::new(&ctx));
    signals.add(SIGUSR2).unwrap();

    let waiting = signals.clone();
    let received = ctx.block_on(async move {
        // Safety: the process-wide handler for SIGUSR2 was installed by `add`.
        unsafe {
            libc::raise(SIGUSR2);
        }
        async_wait_signal(&waiting).await
    });

    assert_eq!(received.unwrap(), SIGUSR2);
}

fn disposition(signo: i32) -> libc::sighandler_t {
    unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        assert_eq!(libc::sigaction(signo, std::ptr::null(), &mut action), 0);
        action.sa_sigaction
    }
}

#[test]
fn test_dropping_last_set_restores_disposition() {
    // Ignored by default, so a stray delivery cannot end the test process.
    let signo = libc::SIGWINCH;
    let before = disposition(signo);

    let ctx = IoContext::new();
    let first = SignalSet::new(&ctx);
    let second = SignalSet::new(&ctx);

    first.add(signo).unwrap();
    second.add(signo).unwrap();
    let installed = disposition(signo);
    assert_ne!(installed, before);

    drop(first);
    assert_eq!(disposition(signo), installed);

    drop(second);
    assert_eq!(disposition(signo), before);
}

#[test]
fn test_removing_signal_restores_disposition() {
    let signo = libc::SIGURG;
    let before = disposition(signo);

    let ctx = IoContext::new();
    let signals = SignalSet::new(&ctx);

    signals.add(signo).unwrap();
    assert_ne!(disposition(signo), before);

    signals.remove(signo).unwrap();
    assert_eq!(disposition(signo), before);

    signals.add(signo).unwrap();
    assert_ne!(disposition(signo), before);
}
