//! States of a detached [`Coroutine`](super::coroutine::Coroutine).

/// The frame is suspended and nobody is polling it.
///
/// A wake in this state resumes the frame on the waking thread.
pub(crate) const IDLE: usize = 0;

/// A thread is polling the frame.
///
/// At most one thread may observe this state at a time.
pub(crate) const RUNNING: usize = 1;

/// The frame was woken while being polled.
///
/// The polling thread polls it again instead of going back to `IDLE`.
pub(crate) const NOTIFIED: usize = 2;

/// The frame ran to completion and has been destroyed.
pub(crate) const COMPLETED: usize = 3;
