use super::coroutine::Coroutine;
use super::holder::Continuation;
use super::promise::{Promise, Register};
use crate::awaitable::{Await, Awaitable, Suspend};

use std::fmt;
use std::future::{Future, IntoFuture};
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::thread;
use tracing::trace;

/// Storage of one routine: its suspended body and its result slot.
pub(crate) struct Frame<T> {
    /// The routine body, `None` once it has returned or panicked.
    body: Option<Pin<Box<dyn Future<Output = T> + Send>>>,

    /// Where the outcome of the body is published.
    promise: Promise<T>,
}

impl<T> Frame<T> {
    fn new<F>(body: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self {
            body: Some(Box::pin(body)),
            promise: Promise::new(),
        }
    }

    /// Runs the body until its next suspension point.
    ///
    /// A panic raised by the body is caught and stored in the promise. The
    /// body, and every local it holds, is dropped as soon as it finishes.
    ///
    /// # Returns
    ///
    /// `Poll::Ready(())` once a result is stored.
    pub(crate) fn resume(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        let Some(body) = self.body.as_mut() else {
            return Poll::Ready(());
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| body.as_mut().poll(cx)));

        let result = match outcome {
            Ok(Poll::Pending) => return Poll::Pending,
            Ok(Poll::Ready(value)) => Ok(value),
            Err(payload) => Err(payload),
        };

        self.body = None;

        match result {
            Ok(value) => self.promise.set_value(value),
            Err(payload) => self.promise.set_panic(payload),
        }

        Poll::Ready(())
    }

    pub(crate) fn take_result(&mut self) -> thread::Result<T> {
        self.promise.take()
    }
}

/// A lazily started routine producing a `T`.
///
/// Creating a task never runs its body. The body starts when the task is
/// awaited (which consumes the task), when it is [detached](Self::detach),
/// or when it is handed to [`spawn`](crate::spawn). Dropping a task that
/// was never started destroys its frame along with everything the body
/// captured.
///
/// A default-constructed or [cleared](Self::clear) task owns no frame and
/// is *invalid*; awaiting it panics.
///
/// # Examples
///
/// ```rust,ignore
/// fn answer() -> Task<u32> {
///     Task::new(async { 42 })
/// }
///
/// let value = answer().await;
/// ```
pub struct Task<T> {
    frame: Option<Box<Frame<T>>>,
}

impl<T: Send + 'static> Task<T> {
    /// Wraps `body` into a task without polling it.
    pub fn new<F>(body: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self {
            frame: Some(Box::new(Frame::new(body))),
        }
    }

    /// Starts the routine on the calling thread and lets it run to
    /// completion on its own.
    ///
    /// The body runs until its first suspension point before `detach`
    /// returns. Its result is discarded, and a panic it raises is logged
    /// and swallowed. Detaching an invalid task does nothing.
    pub fn detach(mut self) {
        if let Some(frame) = self.frame.take() {
            trace!("detaching routine");
            Coroutine::start(frame);
        }
    }
}

impl<T> Task<T> {
    /// Returns `true` if the task owns a frame.
    pub fn is_valid(&self) -> bool {
        self.frame.is_some()
    }

    /// Destroys the owned frame, leaving the task invalid.
    pub fn clear(&mut self) {
        self.frame = None;
    }
}

impl<T> Default for Task<T> {
    /// Creates an invalid task.
    fn default() -> Self {
        Self { frame: None }
    }
}

impl<T> fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("valid", &self.is_valid())
            .finish()
    }
}

impl<T> IntoFuture for Task<T> {
    type Output = T;
    type IntoFuture = Await<TaskAwait<T>>;

    /// Turns the task into the future awaiting it.
    ///
    /// # Panics
    ///
    /// Panics if the task is invalid.
    fn into_future(mut self) -> Self::IntoFuture {
        let Some(frame) = self.frame.take() else {
            panic!("awaited an invalid Task");
        };

        Await::new(TaskAwait { frame })
    }
}

/// Awaitable owning the frame of an awaited [`Task`].
///
/// Suspending registers the awaiter on the frame's promise and then resumes
/// the frame directly, with the awaiter's continuation as its waker. When
/// the frame finishes during that resumption, the awaiter continues right
/// away without being woken.
pub struct TaskAwait<T> {
    frame: Box<Frame<T>>,
}

impl<T> TaskAwait<T> {
    fn resume_frame(&mut self, continuation: &Continuation) -> Suspend {
        let mut cx = Context::from_waker(continuation.waker());

        match self.frame.resume(&mut cx) {
            Poll::Ready(()) => Suspend::Resumed,
            Poll::Pending => Suspend::Suspended,
        }
    }
}

impl<T> Awaitable for TaskAwait<T> {
    type Output = T;

    fn is_ready(&self) -> bool {
        self.frame.promise.is_ready()
    }

    fn suspend(&mut self, continuation: Continuation) -> Suspend {
        // The awaiter drives the frame from here on, so only the fact that
        // it is awaited is recorded.
        match self.frame.promise.register() {
            Register::Ready => Suspend::Resumed,
            Register::Suspended => self.resume_frame(&continuation),
        }
    }

    fn refresh(&mut self, continuation: Continuation) -> Suspend {
        self.resume_frame(&continuation)
    }

    /// Returns the routine's value, re-raising its panic if it had one.
    fn take_result(&mut self) -> T {
        match self.frame.take_result() {
            Ok(value) => value,
            Err(payload) => panic::resume_unwind(payload),
        }
    }
}

impl<T> fmt::Debug for TaskAwait<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskAwait")
            .field("ready", &self.frame.promise.is_ready())
            .finish()
    }
}
