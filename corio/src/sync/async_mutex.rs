use crate::awaitable::{Await, Awaitable, Suspend};
use crate::runtime::{Executor, IoContext};
use crate::task::{Continuation, ContinuationHolder};

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::trace;

/// A routine waiting for the lock.
struct Waiter {
    id: u64,
    continuation: ContinuationHolder,

    /// Set, under the state lock, when the lock is handed to this waiter.
    granted: Arc<AtomicBool>,
}

struct State {
    /// `false` only while `waiters` is empty.
    locked: bool,

    /// Waiters in arrival order.
    waiters: VecDeque<Waiter>,

    next_id: u64,
}

/// A mutual exclusion lock for routines.
///
/// Acquiring a held `AsyncMutex` suspends the routine instead of blocking
/// its thread. Unlocking hands the lock directly to the oldest waiter:
/// the mutex stays locked across the hand-off, so a routine arriving in
/// between cannot overtake the queue. The waiter is resumed by a handler
/// posted onto the mutex's executor, never inline inside `unlock`.
///
/// The mutex guards no data; see [`Mutex`](super::Mutex) for the
/// data-carrying variant.
///
/// # Examples
///
/// ```rust,ignore
/// let mutex = AsyncMutex::new(ctx.clone());
///
/// {
///     let _guard = mutex.async_lock_scoped().await;
///     // critical section
/// }
/// ```
pub struct AsyncMutex<E: Executor = IoContext> {
    executor: E,
    state: Mutex<State>,
}

impl<E: Executor> AsyncMutex<E> {
    /// Creates an unlocked mutex whose hand-offs are posted onto
    /// `executor`.
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            state: Mutex::new(State {
                locked: false,
                waiters: VecDeque::new(),
                next_id: 0,
            }),
        }
    }

    /// Returns the executor hand-offs are posted onto.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Acquires the lock if it is free.
    ///
    /// # Returns
    ///
    /// `true` if the caller now owns the lock and must
    /// [`unlock`](Self::unlock) it.
    pub fn try_lock(&self) -> bool {
        let mut state = self.state.lock();

        if state.locked {
            false
        } else {
            state.locked = true;
            true
        }
    }

    /// Waits for the lock.
    ///
    /// Once the returned future completes, the caller owns the lock and
    /// must [`unlock`](Self::unlock) it. Dropping the future before it
    /// completes gives up the place in the queue.
    pub fn async_lock(&self) -> Await<LockOperation<'_, E>> {
        Await::new(LockOperation::new(self))
    }

    /// Waits for the lock and returns a guard releasing it.
    pub fn async_lock_scoped(&self) -> Await<ScopedLockOperation<'_, E>> {
        Await::new(ScopedLockOperation(LockOperation::new(self)))
    }

    /// Releases the lock.
    ///
    /// If routines are waiting, the lock passes to the oldest one, which
    /// is resumed through the executor.
    ///
    /// # Panics
    ///
    /// Panics if the mutex is not locked.
    pub fn unlock(&self) {
        let next = {
            let mut state = self.state.lock();
            assert!(state.locked, "unlock of an unlocked AsyncMutex");

            match state.waiters.pop_front() {
                None => {
                    state.locked = false;
                    None
                }
                Some(waiter) => {
                    waiter.granted.store(true, Ordering::Release);
                    Some((waiter.id, waiter.continuation))
                }
            }
        };

        if let Some((id, continuation)) = next {
            trace!(waiter = id, "handing the lock over");
            self.executor.post(Box::new(move || continuation.resume()));
        }
    }

    /// Returns `true` if the lock is held or being handed over.
    pub fn is_locked(&self) -> bool {
        self.state.lock().locked
    }

    /// Returns the number of routines waiting for the lock.
    pub fn waiters(&self) -> usize {
        self.state.lock().waiters.len()
    }
}

impl<E: Executor> fmt::Debug for AsyncMutex<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();

        f.debug_struct("AsyncMutex")
            .field("locked", &state.locked)
            .field("waiters", &state.waiters.len())
            .finish()
    }
}

/// Awaitable returned by [`AsyncMutex::async_lock`].
pub struct LockOperation<'a, E: Executor> {
    mutex: &'a AsyncMutex<E>,

    /// Queue entry, while queued or granted but not yet observed.
    waiter: Option<(u64, Arc<AtomicBool>)>,

    /// The lock is held on behalf of this operation and not yet handed to
    /// the caller.
    owned: bool,
}

impl<'a, E: Executor> LockOperation<'a, E> {
    fn new(mutex: &'a AsyncMutex<E>) -> Self {
        Self {
            mutex,
            waiter: None,
            owned: false,
        }
    }

    fn granted(&self) -> bool {
        self.waiter
            .as_ref()
            .is_some_and(|(_, granted)| granted.load(Ordering::Acquire))
    }
}

impl<E: Executor> Awaitable for LockOperation<'_, E> {
    type Output = ();

    fn is_ready(&self) -> bool {
        self.owned || self.granted()
    }

    fn suspend(&mut self, continuation: Continuation) -> Suspend {
        let mut state = self.mutex.state.lock();

        if !state.locked {
            state.locked = true;
            self.owned = true;
            return Suspend::Resumed;
        }

        let id = state.next_id;
        state.next_id += 1;

        let granted = Arc::new(AtomicBool::new(false));
        state.waiters.push_back(Waiter {
            id,
            continuation: ContinuationHolder::new(continuation),
            granted: granted.clone(),
        });

        self.waiter = Some((id, granted));
        Suspend::Suspended
    }

    fn refresh(&mut self, continuation: Continuation) -> Suspend {
        let Some((id, _)) = &self.waiter else {
            return Suspend::Suspended;
        };

        let mut state = self.mutex.state.lock();

        if let Some(waiter) = state.waiters.iter_mut().find(|w| w.id == *id) {
            if !waiter.continuation.holds(&continuation) {
                waiter.continuation.replace(continuation);
            }

            return Suspend::Suspended;
        }

        drop(state);

        if self.granted() {
            Suspend::Resumed
        } else {
            Suspend::Suspended
        }
    }

    fn take_result(&mut self) {
        // Ownership of the lock moves to the caller.
        self.owned = false;
        self.waiter = None;
    }
}

impl<E: Executor> Drop for LockOperation<'_, E> {
    fn drop(&mut self) {
        if self.owned {
            self.mutex.unlock();
            return;
        }

        let Some((id, granted)) = self.waiter.take() else {
            return;
        };

        let mut state = self.mutex.state.lock();

        if let Some(position) = state.waiters.iter().position(|w| w.id == id) {
            state.waiters.remove(position);
            return;
        }

        drop(state);

        // Granted while being dropped: pass the lock on.
        if granted.load(Ordering::Acquire) {
            self.mutex.unlock();
        }
    }
}

/// Awaitable returned by [`AsyncMutex::async_lock_scoped`].
pub struct ScopedLockOperation<'a, E: Executor>(LockOperation<'a, E>);

impl<'a, E: Executor> Awaitable for ScopedLockOperation<'a, E> {
    type Output = AsyncMutexGuard<'a, E>;

    fn is_ready(&self) -> bool {
        self.0.is_ready()
    }

    fn suspend(&mut self, continuation: Continuation) -> Suspend {
        self.0.suspend(continuation)
    }

    fn refresh(&mut self, continuation: Continuation) -> Suspend {
        self.0.refresh(continuation)
    }

    fn take_result(&mut self) -> AsyncMutexGuard<'a, E> {
        self.0.take_result();

        AsyncMutexGuard {
            mutex: self.0.mutex,
            owns: true,
        }
    }
}

/// Owns a lock on an [`AsyncMutex`] and releases it when dropped.
#[must_use = "if unused the AsyncMutex will immediately unlock"]
pub struct AsyncMutexGuard<'a, E: Executor = IoContext> {
    mutex: &'a AsyncMutex<E>,
    owns: bool,
}

impl<E: Executor> AsyncMutexGuard<'_, E> {
    /// Returns `true` while the guard holds the lock.
    pub fn owns_lock(&self) -> bool {
        self.owns
    }

    /// Releases the lock now.
    pub fn unlock(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.owns {
            self.owns = false;
            self.mutex.unlock();
        }
    }
}

impl<E: Executor> Drop for AsyncMutexGuard<'_, E> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<E: Executor> fmt::Debug for AsyncMutexGuard<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncMutexGuard")
            .field("owns", &self.owns)
            .finish()
    }
}
