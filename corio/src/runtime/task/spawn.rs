use super::core::Task;
use crate::runtime::Executor;

use std::future::IntoFuture;
use tracing::trace;

/// Starts `routine` on `executor` without waiting for it.
///
/// A wrapper is posted onto the executor; when it runs, it invokes
/// `routine`, wraps the returned future into a [`Task`], and detaches it.
/// The routine therefore never starts before `spawn` returns, even when
/// called from inside the executor. Its result is discarded, and its frame
/// is destroyed as soon as it completes, releasing everything it captured.
///
/// # Examples
///
/// ```rust,ignore
/// let ctx = IoContext::new();
/// let total = Arc::new(AtomicUsize::new(0));
///
/// for i in 0..10 {
///     let total = total.clone();
///     corio::spawn(&ctx, move || async move {
///         total.fetch_add(i, Ordering::SeqCst);
///     });
/// }
///
/// ctx.run();
/// assert_eq!(total.load(Ordering::SeqCst), 45);
/// ```
pub fn spawn<E, F, R>(executor: &E, routine: F)
where
    E: Executor + ?Sized,
    F: FnOnce() -> R + Send + 'static,
    R: IntoFuture,
    R::IntoFuture: Send + 'static,
{
    trace!("spawning routine");

    executor.post(Box::new(move || {
        let future = routine().into_future();

        Task::new(async move {
            let _ = future.await;
        })
        .detach();
    }));
}
