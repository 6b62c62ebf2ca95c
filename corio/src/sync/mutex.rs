use super::async_mutex::AsyncMutex;
use crate::runtime::{Executor, IoContext};

use std::cell::UnsafeCell;
use std::fmt;
use std::future::Future;
use std::ops::{Deref, DerefMut};

/// An asynchronous mutex protecting a value.
///
/// `Mutex<T>` pairs an [`AsyncMutex`] with the data it protects. Routines
/// that cannot acquire the lock are suspended, not blocked, and are
/// granted the lock in arrival order.
pub struct Mutex<T, E: Executor = IoContext> {
    /// Lock ordering access to `data`.
    raw: AsyncMutex<E>,

    /// The underlying data protected by the mutex.
    ///
    /// UnsafeCell allows mutable access through shared references,
    /// which is sound because `raw` guarantees mutual exclusion.
    data: UnsafeCell<T>,
}

// Safety: `Mutex<T>` can be sent across threads if `T` is Send.
unsafe impl<T: Send, E: Executor> Send for Mutex<T, E> {}
// Safety: access to `data` is serialized by `raw`, so sharing the mutex
// only ever hands `T` to one thread at a time.
unsafe impl<T: Send, E: Executor> Sync for Mutex<T, E> {}

impl<T, E: Executor> Mutex<T, E> {
    /// Creates a new mutex wrapping `value`, handing the lock over through
    /// `executor`.
    pub fn new(executor: E, value: T) -> Self {
        Self {
            raw: AsyncMutex::new(executor),
            data: UnsafeCell::new(value),
        }
    }

    /// Waits for the lock and returns a guard giving access to the value.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let mut guard = mutex.lock().await;
    /// *guard += 1;
    /// ```
    pub fn lock(&self) -> impl Future<Output = MutexGuard<'_, T, E>> {
        let lock = self.raw.async_lock();

        async move {
            lock.await;
            MutexGuard { mutex: self }
        }
    }

    /// Acquires the lock if it is free.
    pub fn try_lock(&self) -> Option<MutexGuard<'_, T, E>> {
        if self.raw.try_lock() {
            Some(MutexGuard { mutex: self })
        } else {
            None
        }
    }

    /// Returns a mutable reference to the value.
    ///
    /// No locking is needed: the exclusive borrow rules out other users.
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    /// Consumes the mutex and returns the value.
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }

    /// Returns `true` if the lock is held.
    pub fn is_locked(&self) -> bool {
        self.raw.is_locked()
    }
}

impl<T: fmt::Debug, E: Executor> fmt::Debug for Mutex<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("Mutex");

        match self.try_lock() {
            Some(guard) => d.field("data", &&*guard),
            None => d.field("data", &format_args!("<locked>")),
        };

        d.finish()
    }
}

/// Guard returned by [`Mutex::lock`].
///
/// Releases the mutex when dropped.
#[must_use = "if unused the Mutex will immediately unlock"]
pub struct MutexGuard<'a, T, E: Executor = IoContext> {
    mutex: &'a Mutex<T, E>,
}

// Safety: the guard hands out `&T` / `&mut T`; moving it to another thread
// moves that access, which needs `T: Send`, and sharing it shares `&T`.
unsafe impl<T: Send, E: Executor> Send for MutexGuard<'_, T, E> {}
unsafe impl<T: Send + Sync, E: Executor> Sync for MutexGuard<'_, T, E> {}

impl<T, E: Executor> Drop for MutexGuard<'_, T, E> {
    /// Unlocks the mutex, handing it to the next waiter if any.
    fn drop(&mut self) {
        self.mutex.raw.unlock();
    }
}

impl<T, E: Executor> Deref for MutexGuard<'_, T, E> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        unsafe { &*self.mutex.data.get() }
    }
}

impl<T, E: Executor> DerefMut for MutexGuard<'_, T, E> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        unsafe { &mut *self.mutex.data.get() }
    }
}
