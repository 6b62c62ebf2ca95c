use super::core::{Awaitable, Suspend};
use crate::task::{Continuation, ContinuationHolder};

use parking_lot::Mutex;
use std::fmt;
use std::mem;
use std::sync::Arc;

/// Single-shot completion callback handed to an operation's start
/// function.
pub type Handler<R> = Box<dyn FnOnce(R) + Send + 'static>;

enum Slot<R> {
    /// Not started yet.
    Idle,

    /// Started; holds the continuation of the suspended routine.
    Waiting(ContinuationHolder),

    /// The handler ran.
    Done(R),

    /// The result was handed to the routine.
    Taken,
}

/// Completion slot shared between an [`Operation`] and its handler.
///
/// The handler keeps the slot alive on its own, so a completion arriving
/// after the operation was dropped writes into live memory and finds no
/// continuation to resume.
struct Completion<R> {
    slot: Mutex<Slot<R>>,
}

impl<R> Completion<R> {
    fn new() -> Self {
        Self {
            slot: Mutex::new(Slot::Idle),
        }
    }

    fn arm(&self, continuation: Continuation) {
        let mut slot = self.slot.lock();

        match *slot {
            Slot::Idle => *slot = Slot::Waiting(ContinuationHolder::new(continuation)),
            _ => panic!("operation armed twice"),
        }
    }

    /// Stores `result` and resumes the waiting routine, outside the lock.
    ///
    /// # Panics
    ///
    /// Panics if the operation already completed.
    fn complete(&self, result: R) {
        let holder = {
            let mut slot = self.slot.lock();

            match mem::replace(&mut *slot, Slot::Done(result)) {
                Slot::Idle => None,
                Slot::Waiting(holder) => Some(holder),
                Slot::Done(_) | Slot::Taken => panic!("completion handler invoked twice"),
            }
        };

        if let Some(holder) = holder {
            holder.resume();
        }
    }

    fn refresh(&self, continuation: Continuation) {
        if let Slot::Waiting(holder) = &mut *self.slot.lock() {
            if !holder.holds(&continuation) {
                holder.replace(continuation);
            }
        }
    }

    /// Drops the parked continuation; a later completion resumes nothing.
    fn abandon(&self) {
        if let Slot::Waiting(holder) = &mut *self.slot.lock() {
            holder.clear();
        }
    }

    fn is_done(&self) -> bool {
        matches!(*self.slot.lock(), Slot::Done(_))
    }

    fn take(&self) -> Option<R> {
        let mut slot = self.slot.lock();

        match mem::replace(&mut *slot, Slot::Taken) {
            Slot::Done(result) => Some(result),
            other => {
                *slot = other;
                None
            }
        }
    }
}

/// Adapter turning a callback-based operation into an [`Awaitable`].
///
/// `start` receives a [`Handler`] and must arrange for it to be invoked
/// exactly once with the operation's result. On suspension the routine's
/// continuation is parked in a shared slot, `start` is invoked, and the
/// handler later stores the result and resumes the continuation from
/// whatever thread it runs on.
///
/// # Examples
///
/// ```rust,ignore
/// let bytes = Await::new(Operation::new(|handler: Handler<usize>| {
///     some_library::read(move |n| handler(n));
/// }))
/// .await;
/// ```
pub struct Operation<R, S> {
    start: Option<S>,
    completion: Arc<Completion<R>>,
}

impl<R, S> Operation<R, S>
where
    R: Send + 'static,
    S: FnOnce(Handler<R>),
{
    /// Wraps the start function of an operation. Nothing is started yet.
    pub fn new(start: S) -> Self {
        Self {
            start: Some(start),
            completion: Arc::new(Completion::new()),
        }
    }
}

// The start function is never pinned.
impl<R, S> Unpin for Operation<R, S> {}

impl<R, S> Awaitable for Operation<R, S>
where
    R: Send + 'static,
    S: FnOnce(Handler<R>),
{
    type Output = R;

    fn is_ready(&self) -> bool {
        self.completion.is_done()
    }

    fn suspend(&mut self, continuation: Continuation) -> Suspend {
        let Some(start) = self.start.take() else {
            panic!("operation started twice");
        };

        self.completion.arm(continuation);

        let completion = self.completion.clone();
        start(Box::new(move |result| completion.complete(result)));

        // The handler may already have run, on this thread or another.
        if self.completion.is_done() {
            Suspend::Resumed
        } else {
            Suspend::Suspended
        }
    }

    fn refresh(&mut self, continuation: Continuation) -> Suspend {
        self.completion.refresh(continuation);

        if self.completion.is_done() {
            Suspend::Resumed
        } else {
            Suspend::Suspended
        }
    }

    fn take_result(&mut self) -> R {
        match self.completion.take() {
            Some(result) => result,
            None => panic!("operation result taken before completion"),
        }
    }
}

impl<R, S> Drop for Operation<R, S> {
    fn drop(&mut self) {
        self.completion.abandon();
    }
}

impl<R, S> fmt::Debug for Operation<R, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("started", &self.start.is_none())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::awaitable::Await;

    use futures::executor::block_on;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::task::{Wake, Waker};
    use std::thread;

    struct Counter(AtomicUsize);

    impl Wake for Counter {
        fn wake(self: Arc<Self>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn synchronous_completion_resumes_inline() {
        let value = block_on(Await::new(Operation::new(|handler: Handler<u32>| {
            handler(5)
        })));

        assert_eq!(value, 5);
    }

    #[test]
    fn completion_from_another_thread() {
        let value = block_on(Await::new(Operation::new(|handler: Handler<String>| {
            thread::spawn(move || handler(String::from("done")));
        })));

        assert_eq!(value, "done");
    }

    #[test]
    fn handler_resumes_the_continuation_once() {
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let waker = Waker::from(counter.clone());

        let parked: Arc<Mutex<Option<Handler<u8>>>> = Arc::new(Mutex::new(None));
        let slot = parked.clone();

        let mut op = Operation::new(move |handler: Handler<u8>| {
            *slot.lock() = Some(handler);
        });

        assert!(!op.is_ready());
        assert_eq!(op.suspend(Continuation::new(waker)), Suspend::Suspended);

        let handler = parked.lock().take().unwrap();
        handler(9);

        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
        assert!(op.is_ready());
        assert_eq!(op.take_result(), 9);
    }

    #[test]
    fn late_completion_after_drop_is_harmless() {
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let waker = Waker::from(counter.clone());

        let parked: Arc<Mutex<Option<Handler<u8>>>> = Arc::new(Mutex::new(None));
        let slot = parked.clone();

        let mut op = Operation::new(move |handler: Handler<u8>| {
            *slot.lock() = Some(handler);
        });
        op.suspend(Continuation::new(waker));
        drop(op);

        let handler = parked.lock().take().unwrap();
        handler(1);

        assert_eq!(counter.0.load(Ordering::SeqCst), 0);
        assert_eq!(Arc::strong_count(&counter), 1);
    }

    #[test]
    fn panicking_start_releases_the_continuation() {
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let waker = Waker::from(counter.clone());

        let mut op = Operation::new(|_handler: Handler<u8>| panic!("start failed"));

        let payload = panic::catch_unwind(AssertUnwindSafe(|| {
            op.suspend(Continuation::new(waker))
        }))
        .unwrap_err();
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"start failed"));
        assert!(!op.is_ready());

        drop(op);
        assert_eq!(counter.0.load(Ordering::SeqCst), 0);
        assert_eq!(Arc::strong_count(&counter), 1);
    }

    #[test]
    fn panicking_start_reaches_the_awaiter() {
        let result = panic::catch_unwind(|| {
            block_on(Await::new(Operation::new(|_handler: Handler<u8>| {
                panic!("start failed")
            })))
        });

        assert!(result.is_err());
    }

    #[test]
    #[should_panic(expected = "invoked twice")]
    fn double_completion_panics() {
        let completion = Completion::new();
        completion.complete(1);
        completion.complete(2);
    }
}
