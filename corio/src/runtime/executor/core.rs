use super::work::WorkGuard;
use super::worker::Shared;
use super::{Executor, Job};
use crate::runtime::context;

use futures::FutureExt;
use parking_lot::Mutex;
use std::fmt;
use std::future::IntoFuture;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::trace;

/// Source of process-unique context identifiers.
static NEXT_ID: AtomicUsize = AtomicUsize::new(1);

/// A run-to-completion executor.
///
/// An `IoContext` owns a FIFO queue of handlers and a deadline heap. Any
/// number of threads may call [`run`](Self::run) on it; each of them pops
/// and executes handlers until the context runs out of work, that is,
/// until the queue is empty and no [`WorkGuard`] or pending operation is
/// outstanding.
///
/// Handles are cheap to clone and all refer to the same context.
///
/// # Examples
///
/// ```rust,ignore
/// let ctx = IoContext::new();
///
/// corio::spawn(&ctx, || async {
///     println!("hello from a routine");
/// });
///
/// ctx.run();
/// ```
#[derive(Clone)]
pub struct IoContext {
    shared: Arc<Shared>,
}

impl IoContext {
    /// Creates a new, empty context.
    pub fn new() -> Self {
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);

        Self {
            shared: Arc::new(Shared::new(id)),
        }
    }

    pub(crate) fn from_shared(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Schedules `f` to run on a later turn of the context.
    ///
    /// `f` never runs before `post` returns, even when called from inside
    /// the context.
    pub fn post<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.shared.push(Box::new(f));
    }

    /// Runs `f` inline if the calling thread is running this context,
    /// otherwise posts it.
    pub fn dispatch<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.running_in_this_thread() {
            f();
        } else {
            self.post(f);
        }
    }

    /// Returns `true` if the calling thread is inside [`run`](Self::run)
    /// or [`poll`](Self::poll) of this context.
    pub fn running_in_this_thread(&self) -> bool {
        context::is_running(self.shared.id)
    }

    /// Runs handlers on the calling thread until the context runs out of
    /// work or is stopped.
    ///
    /// # Returns
    ///
    /// The number of handlers executed by this call.
    pub fn run(&self) -> usize {
        self.shared.run(true)
    }

    /// Runs the handlers that are ready right now without blocking.
    ///
    /// # Returns
    ///
    /// The number of handlers executed by this call.
    pub fn poll(&self) -> usize {
        self.shared.run(false)
    }

    /// Makes every [`run`](Self::run) call return as soon as possible.
    ///
    /// Queued handlers stay queued; they run after
    /// [`restart`](Self::restart) and a new `run`.
    pub fn stop(&self) {
        trace!(context = self.shared.id, "stop requested");
        self.shared.stop();
    }

    /// Clears the stopped state set by [`stop`](Self::stop).
    pub fn restart(&self) {
        self.shared.restart();
    }

    /// Returns `true` if the context has been stopped.
    pub fn stopped(&self) -> bool {
        self.shared.is_stopped()
    }

    /// Returns a guard that keeps [`run`](Self::run) from returning while
    /// it is alive.
    pub fn work(&self) -> WorkGuard {
        WorkGuard::new(self.shared.clone())
    }

    /// Arms a deadline on the context's heap.
    ///
    /// `fire` runs as a regular handler once `deadline` has passed.
    ///
    /// # Returns
    ///
    /// A key for [`cancel_timer`](Self::cancel_timer).
    pub(crate) fn add_timer(&self, deadline: Instant, fire: Job) -> u64 {
        self.shared.schedule_at(deadline, fire)
    }

    /// Drops an armed deadline that has not fired yet.
    pub(crate) fn cancel_timer(&self, key: u64) -> bool {
        self.shared.cancel_timer(key)
    }

    /// Number of deadlines still armed on the heap.
    #[cfg(test)]
    pub(crate) fn pending_timers(&self) -> usize {
        self.shared.pending_timers()
    }

    /// Drives `future` to completion on the calling thread.
    ///
    /// The future is started as a detached routine on this context and
    /// [`run`](Self::run) is called until the context runs out of work.
    /// Any other work queued on the context is executed along the way.
    ///
    /// # Panics
    ///
    /// Re-raises a panic of `future`. Panics if the context stops, or runs
    /// out of work, before `future` completes.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let ctx = IoContext::new();
    /// let value = ctx.block_on(async { 21 * 2 });
    /// assert_eq!(value, 42);
    /// ```
    pub fn block_on<F>(&self, future: F) -> F::Output
    where
        F: IntoFuture,
        F::IntoFuture: Send + 'static,
        F::Output: Send + 'static,
    {
        let slot = Arc::new(Mutex::new(None));
        let out = slot.clone();
        let future = future.into_future();

        crate::spawn(self, move || async move {
            let result = AssertUnwindSafe(future).catch_unwind().await;
            *out.lock() = Some(result);
        });

        self.run();

        let result = slot.lock().take();
        match result {
            Some(Ok(value)) => value,
            Some(Err(payload)) => panic::resume_unwind(payload),
            None => panic!(
                "block_on: context {} returned before the future completed",
                self.shared.id
            ),
        }
    }
}

impl Default for IoContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for IoContext {
    fn post(&self, job: Job) {
        self.shared.push(job);
    }

    fn running_in_this_thread(&self) -> bool {
        IoContext::running_in_this_thread(self)
    }
}

impl PartialEq for IoContext {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl Eq for IoContext {}

impl fmt::Debug for IoContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IoContext")
            .field("id", &self.shared.id)
            .field("outstanding", &self.shared.outstanding())
            .field("timers", &self.shared.pending_timers())
            .field("stopped", &self.shared.is_stopped())
            .finish()
    }
}
