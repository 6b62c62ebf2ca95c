use super::executor::Job;

use std::cmp::Ordering;
use std::time::Instant;

/// An entry in the context's deadline heap.
///
/// When the deadline passes, `fire` is moved onto the handler queue. The
/// closure itself decides whether the wait it belongs to is still pending;
/// cancelled waits leave stale entries behind that fire into nothing.
pub(crate) struct TimerEntry {
    /// The time at which the entry should fire.
    pub(crate) deadline: Instant,

    /// Insertion sequence, used to keep equal deadlines in FIFO order.
    pub(crate) seq: u64,

    /// Work to queue once the deadline is reached.
    pub(crate) fire: Job,
}

impl Eq for TimerEntry {}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline.eq(&other.deadline) && self.seq == other.seq
    }
}

impl Ord for TimerEntry {
    /// Orders timer entries by deadline, then by insertion order.
    ///
    /// Note that the comparison is **reversed** so that a
    /// `BinaryHeap<TimerEntry>` behaves as a min-heap,
    /// where the earliest deadline is popped first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
