//! Routine tasks and the machinery that drives them.
//!
//! This module defines how a suspendable routine is represented, awaited,
//! and run without an awaiter.
//!
//! It includes:
//! - [`Task`], the lazily started, single-owner handle to a routine,
//! - [`Continuation`] and [`ContinuationHolder`], the handles used to
//!   resume suspended routines,
//! - the promise storing a routine's value or panic,
//! - the detached coroutine driver and its waker,
//! - [`spawn`], which starts a routine on an executor.

pub(crate) mod coroutine;
pub(crate) mod holder;
pub(crate) mod promise;
pub(crate) mod state;
pub(crate) mod waker;

mod core;
mod spawn;

pub use self::core::{Task, TaskAwait};
pub use holder::{Continuation, ContinuationHolder};
pub use spawn::spawn;
