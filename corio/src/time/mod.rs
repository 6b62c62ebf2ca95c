//! Deadline timers.
//!
//! This module provides the timer collaborator used by
//! [`async_wait`](crate::ops::async_wait).
//!
//! It includes:
//! - [`SteadyTimer`], a cancellable deadline timer bound to a context,
//! - [`sleep`], the common "wait for a duration" routine built on it.

mod sleep;
mod timer;

#[doc(inline)]
pub use sleep::sleep;

#[doc(inline)]
pub use timer::SteadyTimer;
