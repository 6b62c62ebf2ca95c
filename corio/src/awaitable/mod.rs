//! Turning one-shot operations into suspension points.
//!
//! Every place where a routine can suspend implements [`Awaitable`]:
//! awaiting a [`Task`](crate::Task), acquiring an
//! [`AsyncMutex`](crate::sync::AsyncMutex), and every callback-based
//! operation wrapped by [`Operation`]. [`Await`] is the single `Future`
//! implementation that drives any of them.

mod core;
mod operation;

pub use self::core::{Await, Awaitable, Map, Suspend};
pub use operation::{Handler, Operation};
