use super::Job;
use crate::runtime::context::enter_context;
use crate::runtime::timer::TimerEntry;

use parking_lot::{Condvar, Mutex};
use std::collections::{BinaryHeap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{debug, trace};

/// State shared by every handle to one I/O context.
///
/// The handler queue and the deadline heap live behind one lock so that
/// a thread deciding to sleep can never miss a push or a newly armed
/// deadline.
pub(crate) struct Shared {
    /// Process-unique identifier of the context.
    pub(crate) id: usize,

    /// Pending handlers and deadlines.
    state: Mutex<State>,

    /// Wakes threads parked in [`next_job`](Self::next_job).
    condvar: Condvar,

    /// Queued handlers, running handlers, and live work guards.
    ///
    /// `run` returns once this drops to zero and the queue is empty.
    outstanding: AtomicUsize,

    /// Set by `stop`; cleared by `restart`.
    stopped: AtomicBool,
}

struct State {
    /// Handlers in submission order.
    queue: VecDeque<Job>,

    /// Deadline heap (min-heap through the reversed ordering of
    /// [`TimerEntry`]).
    timers: BinaryHeap<TimerEntry>,

    /// Sequence number for the next timer entry.
    next_seq: u64,
}

/// Balances the outstanding-work count of a dequeued handler, even when
/// the handler unwinds.
struct HandlerDone<'a>(&'a Shared);

impl Drop for HandlerDone<'_> {
    fn drop(&mut self) {
        self.0.work_finished();
    }
}

impl Shared {
    pub(crate) fn new(id: usize) -> Self {
        Self {
            id,
            state: Mutex::new(State {
                queue: VecDeque::new(),
                timers: BinaryHeap::new(),
                next_seq: 0,
            }),
            condvar: Condvar::new(),
            outstanding: AtomicUsize::new(0),
            stopped: AtomicBool::new(false),
        }
    }

    /// Appends a handler to the queue and wakes one parked thread.
    pub(crate) fn push(&self, job: Job) {
        self.outstanding.fetch_add(1, Ordering::AcqRel);

        self.state.lock().queue.push_back(job);
        self.condvar.notify_one();
    }

    /// Arms a deadline. `fire` is queued as a handler once `deadline`
    /// has passed.
    ///
    /// # Returns
    ///
    /// The key passed to [`cancel_timer`](Self::cancel_timer).
    pub(crate) fn schedule_at(&self, deadline: Instant, fire: Job) -> u64 {
        let mut state = self.state.lock();

        let seq = state.next_seq;
        state.next_seq += 1;
        state.timers.push(TimerEntry {
            deadline,
            seq,
            fire,
        });

        // Parked threads must recompute how long to sleep.
        self.condvar.notify_all();
        seq
    }

    /// Removes an armed deadline before it fires.
    ///
    /// Returns `false` if the entry already left the heap.
    pub(crate) fn cancel_timer(&self, key: u64) -> bool {
        let mut state = self.state.lock();

        let before = state.timers.len();
        state.timers.retain(|entry| entry.seq != key);
        state.timers.len() != before
    }

    pub(crate) fn pending_timers(&self) -> usize {
        self.state.lock().timers.len()
    }

    pub(crate) fn work_started(&self) {
        self.outstanding.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn work_finished(&self) {
        if self.outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            let _state = self.state.lock();
            self.condvar.notify_all();
        }
    }

    pub(crate) fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    pub(crate) fn stop(&self) {
        self.stopped.store(true, Ordering::Release);

        let _state = self.state.lock();
        self.condvar.notify_all();
    }

    pub(crate) fn restart(&self) {
        self.stopped.store(false, Ordering::Release);
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Runs handlers on the calling thread until the context runs out of
    /// work or is stopped.
    ///
    /// With `block == false` the loop only drains what is ready right now.
    ///
    /// # Returns
    ///
    /// The number of handlers executed.
    pub(crate) fn run(&self, block: bool) -> usize {
        debug!(context = self.id, block, "entering run loop");

        let executed = enter_context(self.id, || {
            let mut executed = 0;

            while let Some(job) = self.next_job(block) {
                let _done = HandlerDone(self);
                job();
                executed += 1;
            }

            executed
        });

        debug!(context = self.id, executed, "leaving run loop");
        executed
    }

    /// Pops the next runnable handler.
    ///
    /// Expired deadlines are moved onto the queue first. When nothing is
    /// ready and work is still outstanding, the thread parks until the
    /// next deadline or until it is notified.
    fn next_job(&self, block: bool) -> Option<Job> {
        let mut state = self.state.lock();

        loop {
            if self.is_stopped() {
                return None;
            }

            let now = Instant::now();
            while state.timers.peek().is_some_and(|t| t.deadline <= now) {
                if let Some(entry) = state.timers.pop() {
                    trace!(context = self.id, seq = entry.seq, "deadline reached");
                    self.outstanding.fetch_add(1, Ordering::AcqRel);
                    state.queue.push_back(entry.fire);
                }
            }

            if let Some(job) = state.queue.pop_front() {
                return Some(job);
            }

            if !block || self.outstanding() == 0 {
                return None;
            }

            match state.timers.peek().map(|t| t.deadline) {
                Some(deadline) => {
                    self.condvar.wait_until(&mut state, deadline);
                }
                None => self.condvar.wait(&mut state),
            }
        }
    }
}
