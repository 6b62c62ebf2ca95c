//! # Corio
//!
//! **Corio** lets application code write one-shot asynchronous operations
//! (accepting a connection, reading from a socket, waiting for a timer, a
//! signal, or a foreign future) as sequential routines instead of nested
//! callbacks.
//!
//! A routine is an `async` body wrapped into a [`Task`]. Tasks are lazy and
//! move-only: creating one never runs it, awaiting one consumes it, and
//! dropping one destroys everything it captured. Any callback-based
//! operation becomes a suspension point through the
//! [`Operation`](awaitable::Operation) adapter, and routines that need to
//! share state serialize on an [`AsyncMutex`](sync::AsyncMutex) with strict
//! first-come first-served hand-off.
//!
//! The crate ships what it needs to run on its own:
//!
//! - An **[`IoContext`]**, a run-to-completion executor with a FIFO handler
//!   queue, deadlines, and outstanding-work accounting
//! - A **[`Runtime`]** running one context on a pool of threads
//! - **Callback-based collaborators**: [`SteadyTimer`](time::SteadyTimer),
//!   [`SignalSet`](signal::SignalSet), in-memory [`pipe`](io::pipe)s, and
//!   TCP sockets
//! - **Awaitable operations** over all of them in [`ops`]
//! - **Macros**: `#[corio::routine]`, `#[corio::main]`, `#[corio::test]`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use corio::{IoContext, Task};
//! use corio::time::sleep;
//! use std::time::Duration;
//!
//! #[corio::routine]
//! async fn answer(ctx: IoContext) -> u32 {
//!     sleep(&ctx, Duration::from_millis(10)).await.ok();
//!     42
//! }
//!
//! fn main() {
//!     let ctx = IoContext::new();
//!     let handle = ctx.clone();
//!
//!     corio::spawn(&ctx, move || async move {
//!         let value = answer(handle).await;
//!         println!("the answer is {value}");
//!     });
//!
//!     ctx.run();
//! }
//! ```
//!
//! ## Modules
//!
//! - [`task`] — Tasks, continuations, and `spawn`
//! - [`awaitable`] — The awaitable protocol and the generic operation adapter
//! - [`ops`] — Awaitable operations (hops, I/O, timers, signals, futures)
//! - [`sync`] — Asynchronous mutexes
//! - [`io`], [`net`], [`time`], [`signal`] — Callback-based collaborators

mod error;
mod runtime;

pub mod awaitable;
pub mod io;
pub mod net;
pub mod ops;
pub mod signal;
pub mod sync;
pub mod time;

pub use runtime::task;

pub use error::{Error, Result};
pub use runtime::{Executor, IoContext, Job, Runtime, RuntimeBuilder, WorkGuard};
pub use task::{Continuation, ContinuationHolder, Task, spawn};

pub use corio_macros::*;
