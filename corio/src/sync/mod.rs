//! Synchronization primitives for routines.
//!
//! These primitives let routines serialize access to shared state without
//! blocking the threads that run them.
//!
//! The current primitives include:
//! - [`AsyncMutex`], a lock with strict first-come first-served hand-off,
//! - [`Mutex`], the same lock wrapped around the data it protects.
//!
//! ## Design notes
//!
//! - Waiting routines are queued and suspended; they never spin or block.
//! - Unlocking hands the lock to the oldest waiter and resumes it through
//!   the mutex's executor, so the unlocking routine keeps running.
//! - Mutexes are safe to share between threads and routines using `Arc`.

mod async_mutex;
mod mutex;

pub use async_mutex::{AsyncMutex, AsyncMutexGuard, LockOperation, ScopedLockOperation};
pub use mutex::{Mutex, MutexGuard};
