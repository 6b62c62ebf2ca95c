use super::executor::core::IoContext;
use super::executor::work::WorkGuard;

use futures::FutureExt;
use std::future::IntoFuture;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// A multi-threaded runtime.
///
/// `Runtime` is responsible for:
/// - running one [`IoContext`] on a pool of worker threads,
/// - spawning routines onto that context,
/// - providing a synchronous entry point via [`block_on`](Self::block_on).
///
/// Dropping the runtime stops the context and joins every worker thread.
pub struct Runtime {
    /// Context shared by all workers.
    context: IoContext,

    /// Keeps idle workers parked instead of returning from `run`.
    work: Option<WorkGuard>,

    /// Join handles for worker threads.
    handles: Vec<JoinHandle<()>>,
}

impl Runtime {
    /// Creates a new runtime instance.
    ///
    /// # Arguments
    ///
    /// * `worker_threads` - Number of threads running the context.
    /// * `thread_name` - Prefix of the worker thread names.
    ///
    /// # Panics
    ///
    /// Panics if the operating system refuses to spawn a thread.
    pub(crate) fn new(worker_threads: usize, thread_name: &str) -> Self {
        let context = IoContext::new();
        let work = context.work();

        let mut handles = Vec::with_capacity(worker_threads);

        for index in 0..worker_threads {
            let ctx = context.clone();

            let handle = thread::Builder::new()
                .name(format!("{thread_name}-{index}"))
                .spawn(move || worker_loop(ctx))
                .unwrap_or_else(|e| panic!("failed to spawn worker thread {index}: {e}"));

            handles.push(handle);
        }

        debug!(worker_threads, "runtime started");

        Self {
            context,
            work: Some(work),
            handles,
        }
    }

    /// Returns the context driven by the runtime's workers.
    pub fn context(&self) -> &IoContext {
        &self.context
    }

    /// Spawns a routine onto the runtime.
    ///
    /// See [`spawn`](crate::spawn).
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// runtime.spawn(|| async {
    ///     // background routine
    /// });
    /// ```
    pub fn spawn<F, R>(&self, routine: F)
    where
        F: FnOnce() -> R + Send + 'static,
        R: IntoFuture,
        R::IntoFuture: Send + 'static,
    {
        crate::spawn(&self.context, routine);
    }

    /// Runs a future to completion, blocking the current thread.
    ///
    /// The future is spawned onto the runtime and its result is sent back
    /// through a channel. It must not be called from a worker thread.
    ///
    /// # Panics
    ///
    /// Re-raises a panic of `future`. Panics if the runtime shuts down
    /// before the future completes.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let result = runtime.block_on(async {
    ///     42
    /// });
    /// assert_eq!(result, 42);
    /// ```
    pub fn block_on<F>(&self, future: F) -> F::Output
    where
        F: IntoFuture,
        F::IntoFuture: Send + 'static,
        F::Output: Send + 'static,
    {
        let (transmitter, receiver) = mpsc::channel();
        let future = future.into_future();

        self.spawn(move || async move {
            let result = AssertUnwindSafe(future).catch_unwind().await;
            let _ = transmitter.send(result);
        });

        match receiver.recv() {
            Ok(Ok(value)) => value,
            Ok(Err(payload)) => panic::resume_unwind(payload),
            Err(_) => panic!("block_on: runtime shut down before the future completed"),
        }
    }
}

/// Body of a worker thread.
///
/// A panicking handler unwinds out of `run`; the worker logs it and goes
/// back to running the context.
fn worker_loop(context: IoContext) {
    loop {
        match panic::catch_unwind(AssertUnwindSafe(|| context.run())) {
            Ok(_) => break,
            Err(_) => warn!("handler panicked on a worker thread"),
        }
    }
}

impl Drop for Runtime {
    /// Shuts down the runtime.
    ///
    /// This performs the following steps:
    /// 1. Releases the runtime's outstanding work
    /// 2. Stops the context so that parked workers return from `run`
    /// 3. Joins all worker threads
    fn drop(&mut self) {
        drop(self.work.take());
        self.context.stop();

        for h in self.handles.drain(..) {
            let _ = h.join();
        }

        debug!("runtime stopped");
    }
}
