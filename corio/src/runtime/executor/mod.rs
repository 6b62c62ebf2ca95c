//! Executor abstraction and the bundled run-to-completion executor.
//!
//! The coroutine machinery only needs two things from whoever runs it:
//! a way to schedule a closure for later ([`Executor::post`]) and a way to
//! run a closure inline when already on the right thread
//! ([`Executor::dispatch`]). [`IoContext`] is the implementation shipped
//! with the crate:
//! - [`core`]: the public context handle and its lifecycle,
//! - [`worker`]: the handler queue, deadline heap, and run loop,
//! - [`work`]: outstanding-work accounting.

pub(crate) mod core;
pub(crate) mod work;
pub(crate) mod worker;

use std::sync::Arc;

/// A unit of work scheduled on an executor.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Something that can run closures on behalf of coroutines.
///
/// Implementations must never run a posted job before `post` returns.
pub trait Executor: Send + Sync + 'static {
    /// Schedules `job` to run on a later turn of the executor.
    fn post(&self, job: Job);

    /// Returns `true` if the calling thread is currently running
    /// handlers of this executor.
    fn running_in_this_thread(&self) -> bool;

    /// Runs `job` immediately if the caller is already running inside this
    /// executor, otherwise behaves like [`post`](Self::post).
    fn dispatch(&self, job: Job) {
        if self.running_in_this_thread() {
            job();
        } else {
            self.post(job);
        }
    }
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn post(&self, job: Job) {
        (**self).post(job)
    }

    fn running_in_this_thread(&self) -> bool {
        (**self).running_in_this_thread()
    }

    fn dispatch(&self, job: Job) {
        (**self).dispatch(job)
    }
}
