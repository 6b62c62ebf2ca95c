//! Demo: routines sharing a counter through `corio::sync::Mutex`
//!
//! Ten routines increment the same counter on a four-thread runtime. The
//! lock is handed over in arrival order, so no increment is ever lost.

use corio::RuntimeBuilder;
use corio::ops::async_wait_future;
use corio::sync::Mutex;

use futures::channel::oneshot;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;
use tracing_subscriber::EnvFilter;

const ROUTINES: usize = 10;
const INCREMENTS: usize = 1_000;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let runtime = RuntimeBuilder::new().worker_threads(4).build();
    let counter = Arc::new(Mutex::new(runtime.context().clone(), 0usize));
    let remaining = Arc::new(AtomicUsize::new(ROUTINES));
    let (done, finished) = oneshot::channel::<()>();
    let done = Arc::new(parking_lot::Mutex::new(Some(done)));

    for id in 0..ROUTINES {
        let counter = counter.clone();
        let remaining = remaining.clone();
        let done = done.clone();

        runtime.spawn(move || async move {
            for _ in 0..INCREMENTS {
                *counter.lock().await += 1;
            }

            info!(id, "routine finished");

            if remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
                if let Some(done) = done.lock().take() {
                    let _ = done.send(());
                }
            }
        });
    }

    runtime.block_on(async move {
        let _ = async_wait_future(finished).await;
    });

    let total = runtime.block_on({
        let counter = counter.clone();
        async move { *counter.lock().await }
    });

    info!(total, "all routines done");
    assert_eq!(total, ROUTINES * INCREMENTS);
}
