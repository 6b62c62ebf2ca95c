//! Awaitable operations.
//!
//! Each function here wraps one callback-based primitive into an
//! [`Operation`](crate::awaitable::Operation) and returns the future
//! awaiting it. Errors are returned as values; none of these futures
//! panic on an I/O failure.
//!
//! - [`post`], [`dispatch`]: hop onto an executor,
//! - [`async_accept`], [`async_connect`]: TCP connection setup,
//! - [`async_read`], [`async_write`] and their `_with` variants: byte
//!   transfers driven by a [`CompletionCondition`],
//! - [`async_wait`], [`async_wait_signal`]: timers and signals,
//! - [`async_wait_future`], [`async_wait_future_on`]: foreign futures.

mod condition;
mod future;
mod hop;
mod socket;
mod transfer;
mod wait;

pub use condition::{CompletionCondition, MAX_CHUNK, transfer_all, transfer_at_least, transfer_exactly};
pub use future::{async_wait_future, async_wait_future_on};
pub use hop::{dispatch, post};
pub use socket::{async_accept, async_connect};
pub use transfer::{Transfer, async_read, async_read_with, async_write, async_write_with};
pub use wait::{async_wait, async_wait_signal};
