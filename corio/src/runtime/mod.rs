//! Core runtime components.
//!
//! This module contains the executor that drives routines and the
//! multi-threaded runtime built on top of it.
//!
//! It is responsible for:
//! - queueing and running handlers ([`IoContext`]),
//! - tracking outstanding work so `run` knows when to return,
//! - firing deadlines armed by timers,
//! - running one context on a pool of threads ([`Runtime`]),
//! - representing and driving routines ([`task`]).

mod core;
mod timer;

pub(crate) mod builder;
pub(crate) mod context;
pub(crate) mod executor;

pub mod task;

pub use self::core::Runtime;
pub use builder::RuntimeBuilder;
pub use executor::core::IoContext;
pub use executor::work::WorkGuard;
pub use executor::{Executor, Job};
