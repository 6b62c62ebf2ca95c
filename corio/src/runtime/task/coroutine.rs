use super::core::Frame;
use super::state::{COMPLETED, IDLE, NOTIFIED, RUNNING};
use super::waker::make_waker;

use std::cell::UnsafeCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};
use tracing::debug;

/// Driver of a detached routine frame.
///
/// Nobody awaits a detached frame, so the coroutine itself is what its
/// continuations wake. A wake while [`IDLE`] resumes the frame right away
/// on the waking thread; a wake while [`RUNNING`] is recorded as
/// [`NOTIFIED`] and the polling thread polls once more. The frame is
/// therefore never polled by two threads at once, and it is destroyed as
/// soon as it completes.
pub(crate) struct Coroutine<T> {
    /// The frame, `None` once it has completed.
    ///
    /// Only the thread that moved `state` to `RUNNING` touches it.
    frame: UnsafeCell<Option<Box<Frame<T>>>>,

    /// Current lifecycle state (IDLE, RUNNING, NOTIFIED, COMPLETED).
    state: AtomicUsize,
}

// Safety: the frame is only accessed by the thread holding the RUNNING
// state, and `Frame<T>` is `Send` when `T` is.
unsafe impl<T: Send> Send for Coroutine<T> {}
unsafe impl<T: Send> Sync for Coroutine<T> {}

impl<T: Send + 'static> Coroutine<T> {
    /// Starts driving `frame` on the calling thread.
    ///
    /// The frame runs until its first suspension point before this returns.
    pub(crate) fn start(frame: Box<Frame<T>>) {
        let coroutine = Arc::new(Self {
            frame: UnsafeCell::new(Some(frame)),
            state: AtomicUsize::new(IDLE),
        });

        Coroutine::wake(coroutine);
    }

    /// Signals that the frame may make progress.
    pub(crate) fn wake(self: Arc<Self>) {
        loop {
            match self.state.load(Ordering::Acquire) {
                IDLE => {
                    if self
                        .state
                        .compare_exchange(IDLE, RUNNING, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        self.run();
                        return;
                    }
                }
                RUNNING => {
                    if self
                        .state
                        .compare_exchange(RUNNING, NOTIFIED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        return;
                    }
                }
                // Already going to be polled again, or finished.
                _ => return,
            }
        }
    }

    /// Polls the frame until it suspends without a pending notification,
    /// or completes.
    ///
    /// Must only be called by the thread that moved the state to RUNNING.
    fn run(self: &Arc<Self>) {
        let waker = make_waker(self.clone());
        let mut cx = Context::from_waker(&waker);

        loop {
            // Safety: the RUNNING state guarantees that no other thread
            // touches the frame.
            let slot = unsafe { &mut *self.frame.get() };

            let poll = match slot.as_mut() {
                Some(frame) => frame.resume(&mut cx),
                None => Poll::Ready(()),
            };

            match poll {
                Poll::Pending => {
                    if self
                        .state
                        .compare_exchange(RUNNING, IDLE, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        return;
                    }

                    // Woken while running; poll again.
                    self.state.store(RUNNING, Ordering::Release);
                }
                Poll::Ready(()) => {
                    let finished = slot.take();
                    self.state.store(COMPLETED, Ordering::Release);

                    if let Some(mut frame) = finished {
                        if frame.take_result().is_err() {
                            debug!("detached routine panicked; the panic is discarded");
                        }
                    }

                    return;
                }
            }
        }
    }
}
