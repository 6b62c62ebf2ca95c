use crate::awaitable::{Await, Handler, Operation};
use crate::runtime::Executor;

use std::future::Future;

/// Suspends the routine and resumes it from a handler posted onto
/// `executor`.
///
/// The routine always yields, even when it already runs on `executor`.
/// Once the hop completes, the routine continues on one of the executor's
/// threads.
///
/// # Examples
///
/// ```rust,ignore
/// corio::ops::post(&other_context).await;
/// assert!(other_context.running_in_this_thread());
/// ```
pub fn post<E>(executor: &E) -> impl Future<Output = ()> + Send + '_
where
    E: Executor + ?Sized,
{
    Await::new(Operation::new(move |handler: Handler<()>| {
        executor.post(Box::new(move || handler(())));
    }))
}

/// Like [`post`], but continues without yielding when the routine is
/// already running inside `executor`.
pub fn dispatch<E>(executor: &E) -> impl Future<Output = ()> + Send + '_
where
    E: Executor + ?Sized,
{
    Await::new(Operation::new(move |handler: Handler<()>| {
        executor.dispatch(Box::new(move || handler(())));
    }))
}
