use crate::awaitable::{Await, Handler, Operation};
use crate::runtime::Executor;
use crate::task::Task;

use std::future::{Future, IntoFuture};

/// Waits for a future that is not driven by this crate.
///
/// The future is polled by a detached routine of its own. Whoever wakes it
/// (typically the thread resolving it) polls it, and when it resolves the
/// awaiting routine resumes on that same thread. Use
/// [`async_wait_future_on`] to come back to a particular executor.
///
/// # Examples
///
/// ```rust,ignore
/// let (tx, rx) = futures::channel::oneshot::channel();
/// std::thread::spawn(move || tx.send(5));
///
/// let value = corio::ops::async_wait_future(rx).await;
/// assert_eq!(value, Ok(5));
/// ```
pub fn async_wait_future<F>(future: F) -> impl Future<Output = F::Output> + Send
where
    F: IntoFuture,
    F::IntoFuture: Send + 'static,
    F::Output: Send + 'static,
{
    let future = future.into_future();

    Await::new(Operation::new(move |handler: Handler<F::Output>| {
        Task::new(async move { handler(future.await) }).detach();
    }))
}

/// Like [`async_wait_future`], but the awaiting routine resumes through
/// [`Executor::dispatch`] on `executor`.
pub fn async_wait_future_on<E, F>(
    executor: &E,
    future: F,
) -> impl Future<Output = F::Output> + Send + '_
where
    E: Executor + Clone,
    F: IntoFuture,
    F::IntoFuture: Send + 'static,
    F::Output: Send + 'static,
{
    let future = future.into_future();

    Await::new(Operation::new(move |handler: Handler<F::Output>| {
        let executor = executor.clone();

        Task::new(async move {
            let value = future.await;
            executor.dispatch(Box::new(move || handler(value)));
        })
        .detach();
    }))
}
