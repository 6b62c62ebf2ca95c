use std::fmt;
use std::task::Waker;

/// A handle to a suspended routine: whom to wake when it may proceed.
///
/// A `Continuation` does not own the routine it refers to. Resuming one
/// schedules the routine to be polled again; what "again" means (inline on
/// the resuming thread, or through a queue) is decided by whoever drives
/// the routine.
#[derive(Clone)]
pub struct Continuation {
    waker: Waker,
}

impl Continuation {
    /// Wraps the waker of a suspended routine.
    pub fn new(waker: Waker) -> Self {
        Self { waker }
    }

    /// Returns the underlying waker.
    pub fn waker(&self) -> &Waker {
        &self.waker
    }

    /// Returns `true` if resuming `self` and `other` wakes the same
    /// routine.
    pub fn will_resume(&self, other: &Continuation) -> bool {
        self.waker.will_wake(&other.waker)
    }

    /// Resumes the routine.
    pub fn resume(self) {
        self.waker.wake();
    }
}

impl From<Waker> for Continuation {
    fn from(waker: Waker) -> Self {
        Self::new(waker)
    }
}

impl fmt::Debug for Continuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Continuation")
            .field("data", &self.waker.data())
            .finish()
    }
}

/// Exclusive owner of at most one [`Continuation`].
///
/// The holder is move-only: there is never more than one party entitled
/// to resume the routine it holds. Dropping a holder that still owns a
/// continuation discards it without resuming.
#[derive(Debug, Default)]
pub struct ContinuationHolder {
    continuation: Option<Continuation>,
}

impl ContinuationHolder {
    /// Creates a holder owning `continuation`.
    pub fn new(continuation: Continuation) -> Self {
        Self {
            continuation: Some(continuation),
        }
    }

    /// Returns `true` if the holder owns a continuation.
    pub fn is_valid(&self) -> bool {
        self.continuation.is_some()
    }

    /// Gives up ownership of the held continuation.
    ///
    /// The holder is empty afterwards.
    pub fn release(&mut self) -> Option<Continuation> {
        self.continuation.take()
    }

    /// Discards the held continuation, if any.
    pub fn clear(&mut self) {
        self.continuation = None;
    }

    /// Replaces the held continuation, discarding the previous one.
    pub fn replace(&mut self, continuation: Continuation) {
        self.continuation = Some(continuation);
    }

    /// Returns `true` if the holder owns a continuation resuming the same
    /// routine as `other`.
    pub fn holds(&self, other: &Continuation) -> bool {
        self.continuation
            .as_ref()
            .is_some_and(|c| c.will_resume(other))
    }

    /// Releases the held continuation and resumes it.
    ///
    /// Does nothing on an empty holder.
    pub fn resume(mut self) {
        if let Some(continuation) = self.release() {
            continuation.resume();
        }
    }
}

impl Drop for ContinuationHolder {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::task::Wake;

    struct Counter(AtomicUsize);

    impl Wake for Counter {
        fn wake(self: Arc<Self>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn continuation() -> (Arc<Counter>, Continuation) {
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let waker = Waker::from(counter.clone());
        (counter, Continuation::new(waker))
    }

    #[test]
    fn default_holder_is_empty() {
        let holder = ContinuationHolder::default();
        assert!(!holder.is_valid());

        // Resuming an empty holder is a no-op.
        holder.resume();
    }

    #[test]
    fn resume_wakes_exactly_once() {
        let (counter, c) = continuation();
        let holder = ContinuationHolder::new(c);
        assert!(holder.is_valid());

        holder.resume();
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn release_empties_the_holder() {
        let (counter, c) = continuation();
        let mut holder = ContinuationHolder::new(c);

        let released = holder.release();
        assert!(released.is_some());
        assert!(!holder.is_valid());

        drop(holder);
        assert_eq!(counter.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn drop_disposes_without_resuming() {
        let (counter, c) = continuation();
        let holder = ContinuationHolder::new(c);

        assert_eq!(Arc::strong_count(&counter), 2);
        drop(holder);
        assert_eq!(Arc::strong_count(&counter), 1);
        assert_eq!(counter.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn clear_and_replace() {
        let (first, a) = continuation();
        let (_second, b) = continuation();
        let mut holder = ContinuationHolder::new(a.clone());

        assert!(holder.holds(&a));
        assert!(!holder.holds(&b));

        holder.replace(b);
        assert_eq!(Arc::strong_count(&first), 2);

        holder.clear();
        assert!(!holder.is_valid());
    }
}
