//! Signal sets.
//!
//! A [`SignalSet`] collects signal numbers and completes waits when one of
//! them is delivered. On unix, adding a signal installs a process handler
//! so that real signals reach the set; [`SignalSet::deliver`] injects a
//! signal by hand on every platform.

mod set;

#[cfg(unix)]
mod unix;

pub use set::SignalSet;

#[cfg(unix)]
pub use libc::{SIGINT, SIGTERM, SIGUSR1, SIGUSR2};

/// Interactive interrupt.
#[cfg(not(unix))]
pub const SIGINT: i32 = 2;

/// Termination request.
#[cfg(not(unix))]
pub const SIGTERM: i32 = 15;
