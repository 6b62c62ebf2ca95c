use crate::error::{Error, Result};
use crate::runtime::{IoContext, WorkGuard};

use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tracing::trace;

type WaitHandler = Box<dyn FnOnce(Result<()>) + Send + 'static>;

/// A wait registered on the timer.
struct PendingWait {
    seq: u64,

    /// Deadline entry on the context heap.
    key: u64,

    handler: WaitHandler,

    /// Keeps the context running until the wait completes.
    _work: WorkGuard,
}

struct TimerState {
    expiry: Instant,
    waits: Vec<PendingWait>,
    next_seq: u64,
}

struct TimerShared {
    state: Mutex<TimerState>,
}

impl TimerShared {
    /// Completes the wait `seq` successfully, if it is still pending.
    ///
    /// Runs as a handler of the timer's context.
    fn fire(&self, seq: u64) {
        let wait = {
            let mut state = self.state.lock();
            let index = state.waits.iter().position(|w| w.seq == seq);
            index.map(|i| state.waits.remove(i))
        };

        if let Some(PendingWait { handler, _work, .. }) = wait {
            trace!(seq, "timer expired");
            handler(Ok(()));
        }
    }
}

/// A deadline timer bound to an [`IoContext`].
///
/// Any number of waits may be pending on one timer; all of them complete
/// once the expiry time passes, on the timer's context. Setting a new
/// expiry time cancels the pending waits.
///
/// Dropping the timer cancels its pending waits.
///
/// # Examples
///
/// ```rust,ignore
/// let timer = SteadyTimer::new(&ctx);
/// timer.expires_after(Duration::from_millis(50));
///
/// corio::ops::async_wait(&timer).await?;
/// ```
pub struct SteadyTimer {
    context: IoContext,
    shared: Arc<TimerShared>,
}

impl SteadyTimer {
    /// Creates a timer that is already expired.
    pub fn new(context: &IoContext) -> Self {
        Self::at(context, Instant::now())
    }

    /// Creates a timer expiring `duration` from now.
    pub fn after(context: &IoContext, duration: Duration) -> Self {
        Self::at(context, Instant::now() + duration)
    }

    /// Creates a timer expiring at `expiry`.
    pub fn at(context: &IoContext, expiry: Instant) -> Self {
        Self {
            context: context.clone(),
            shared: Arc::new(TimerShared {
                state: Mutex::new(TimerState {
                    expiry,
                    waits: Vec::new(),
                    next_seq: 0,
                }),
            }),
        }
    }

    /// Returns the context completions are delivered on.
    pub fn context(&self) -> &IoContext {
        &self.context
    }

    /// Returns the current expiry time.
    pub fn expiry(&self) -> Instant {
        self.shared.state.lock().expiry
    }

    /// Sets the expiry time to `duration` from now.
    ///
    /// # Returns
    ///
    /// The number of pending waits that were cancelled.
    pub fn expires_after(&self, duration: Duration) -> usize {
        self.expires_at(Instant::now() + duration)
    }

    /// Sets the expiry time.
    ///
    /// Pending waits complete with [`Error::OperationAborted`].
    ///
    /// # Returns
    ///
    /// The number of pending waits that were cancelled.
    pub fn expires_at(&self, expiry: Instant) -> usize {
        let waits = {
            let mut state = self.shared.state.lock();
            state.expiry = expiry;
            std::mem::take(&mut state.waits)
        };

        self.abort(waits)
    }

    /// Cancels every pending wait with [`Error::OperationAborted`].
    ///
    /// # Returns
    ///
    /// The number of pending waits that were cancelled.
    pub fn cancel(&self) -> usize {
        let waits = std::mem::take(&mut self.shared.state.lock().waits);
        self.abort(waits)
    }

    /// Registers `handler` to run on the timer's context once the expiry
    /// time passes.
    ///
    /// `handler` never runs before this returns, even if the timer has
    /// already expired.
    pub fn async_wait<F>(&self, handler: F)
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let mut state = self.shared.state.lock();

        let seq = state.next_seq;
        state.next_seq += 1;

        let shared: Weak<TimerShared> = Arc::downgrade(&self.shared);

        // Armed under the timer lock so that an abort always finds the key.
        let key = self.context.add_timer(
            state.expiry,
            Box::new(move || {
                if let Some(shared) = shared.upgrade() {
                    shared.fire(seq);
                }
            }),
        );

        state.waits.push(PendingWait {
            seq,
            key,
            handler: Box::new(handler),
            _work: self.context.work(),
        });
    }

    fn abort(&self, waits: Vec<PendingWait>) -> usize {
        let cancelled = waits.len();

        for PendingWait {
            key, handler, _work, ..
        } in waits
        {
            self.context.cancel_timer(key);
            self.context
                .post(move || handler(Err(Error::OperationAborted)));
        }

        if cancelled > 0 {
            trace!(cancelled, "timer waits aborted");
        }

        cancelled
    }
}

impl Drop for SteadyTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for SteadyTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();

        f.debug_struct("SteadyTimer")
            .field("expiry", &state.expiry)
            .field("pending", &state.waits.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rearm_and_cancel_leave_no_deadlines_behind() {
        let ctx = IoContext::new();
        let timer = SteadyTimer::after(&ctx, Duration::from_secs(30));

        for _ in 0..1000 {
            timer.async_wait(|_| {});
            assert_eq!(timer.expires_after(Duration::from_secs(30)), 1);
        }

        assert_eq!(ctx.pending_timers(), 0);

        timer.async_wait(|_| {});
        assert_eq!(ctx.pending_timers(), 1);

        assert_eq!(timer.cancel(), 1);
        assert_eq!(ctx.pending_timers(), 0);

        // Only the aborted handlers are left to run.
        assert_eq!(ctx.run(), 1001);
    }

    #[test]
    fn fired_wait_leaves_no_deadline_behind() {
        let ctx = IoContext::new();
        let timer = SteadyTimer::new(&ctx);

        let fired = Arc::new(Mutex::new(None));
        let out = fired.clone();
        timer.async_wait(move |result| *out.lock() = Some(result.is_ok()));

        assert_eq!(ctx.run(), 1);
        assert_eq!(*fired.lock(), Some(true));
        assert_eq!(ctx.pending_timers(), 0);
    }

    #[test]
    fn dropping_the_timer_clears_its_deadlines() {
        let ctx = IoContext::new();

        {
            let timer = SteadyTimer::after(&ctx, Duration::from_secs(30));
            timer.async_wait(|_| {});
            timer.async_wait(|_| {});
            assert_eq!(ctx.pending_timers(), 2);
        }

        assert_eq!(ctx.pending_timers(), 0);
        assert_eq!(ctx.run(), 2);
    }
}
