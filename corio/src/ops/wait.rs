use crate::awaitable::{Await, Handler, Operation};
use crate::error::Result;
use crate::signal::SignalSet;
use crate::time::SteadyTimer;

use std::future::Future;

/// Waits until `timer` expires.
///
/// # Returns
///
/// `Ok(())` once the expiry time has passed, or
/// [`Error::OperationAborted`](crate::Error::OperationAborted) if the wait
/// was cancelled or the timer re-armed.
pub fn async_wait(timer: &SteadyTimer) -> impl Future<Output = Result<()>> + Send + '_ {
    Await::new(Operation::new(move |handler: Handler<Result<()>>| {
        timer.async_wait(handler);
    }))
}

/// Waits for one of the signals in `signals` to be delivered.
///
/// # Returns
///
/// The number of the delivered signal.
pub fn async_wait_signal(signals: &SignalSet) -> impl Future<Output = Result<i32>> + Send + '_ {
    Await::new(Operation::new(move |handler: Handler<Result<i32>>| {
        signals.async_wait(handler);
    }))
}
