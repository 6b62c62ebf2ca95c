//! TCP networking collaborators.
//!
//! This module provides thin wrappers around `std::net` sockets whose
//! operations follow the callback contract of the awaitable adapters:
//! - each operation runs on a short-lived helper thread,
//! - its completion is posted onto the socket's [`IoContext`] and never
//!   runs before the start call returns,
//! - a pending operation counts as outstanding work of the context.
//!
//! There is no readiness polling here; see [`ops`](crate::ops) for the
//! awaitable forms of these operations.
mod tcp;

pub use tcp::listener::TcpListener;
pub use tcp::stream::TcpStream;

use crate::error::Result;
use crate::runtime::{IoContext, WorkGuard};

use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use tracing::warn;

/// Runs `op` on a helper thread and posts `handler` with its result onto
/// `context`.
///
/// If the helper thread cannot be spawned, `handler` receives the spawn
/// error instead.
pub(crate) fn run_blocking<T, Op, H>(context: &IoContext, name: &'static str, op: Op, handler: H)
where
    T: Send + 'static,
    Op: FnOnce() -> Result<T> + Send + 'static,
    H: FnOnce(Result<T>) + Send + 'static,
{
    let slot: Arc<Mutex<Option<(H, WorkGuard)>>> = Arc::new(Mutex::new(Some((handler, context.work()))));

    let ctx = context.clone();
    let pending = slot.clone();

    let spawned = thread::Builder::new()
        .name(format!("corio-net-{name}"))
        .spawn(move || {
            let result = op();

            if let Some((handler, work)) = pending.lock().take() {
                ctx.post(move || handler(result));
                drop(work);
            }
        });

    if let Err(e) = spawned {
        warn!(error = %e, op = name, "failed to spawn network helper thread");

        if let Some((handler, work)) = slot.lock().take() {
            context.post(move || handler(Err(e.into())));
            drop(work);
        }
    }
}
