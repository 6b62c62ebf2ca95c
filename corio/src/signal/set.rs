use crate::error::{Error, Result};
use crate::runtime::{IoContext, WorkGuard};

use parking_lot::Mutex;
use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

type SignalHandler = Box<dyn FnOnce(Result<i32>) + Send + 'static>;

struct PendingWait {
    handler: SignalHandler,
    _work: WorkGuard,
}

#[derive(Default)]
struct SignalState {
    /// Signal numbers the set listens to.
    signals: BTreeSet<i32>,

    /// Delivered signals nobody was waiting for, oldest first.
    queued: VecDeque<i32>,

    /// Waits in registration order.
    waits: VecDeque<PendingWait>,
}

pub(crate) struct SignalShared {
    context: IoContext,
    state: Mutex<SignalState>,
}

impl SignalShared {
    /// Hands `signo` to the oldest wait, or queues it.
    ///
    /// Signals outside the set are ignored.
    pub(crate) fn deliver(&self, signo: i32) {
        let wait = {
            let mut state = self.state.lock();

            if !state.signals.contains(&signo) {
                return;
            }

            match state.waits.pop_front() {
                Some(wait) => wait,
                None => {
                    trace!(signo, "signal queued");
                    state.queued.push_back(signo);
                    return;
                }
            }
        };

        trace!(signo, "signal delivered");

        let PendingWait { handler, _work } = wait;
        self.context.post(move || handler(Ok(signo)));
    }
}

/// A set of signal numbers bound to an [`IoContext`].
///
/// Each delivered signal completes exactly one wait, oldest first. A signal
/// arriving while no wait is pending is queued and completes the next wait.
///
/// Dropping the set removes its signals and cancels its pending waits.
///
/// # Examples
///
/// ```rust,ignore
/// let signals = SignalSet::new(&ctx);
/// signals.add(corio::signal::SIGINT)?;
///
/// let signo = corio::ops::async_wait_signal(&signals).await?;
/// ```
pub struct SignalSet {
    shared: Arc<SignalShared>,
}

impl SignalSet {
    /// Creates an empty set.
    pub fn new(context: &IoContext) -> Self {
        Self {
            shared: Arc::new(SignalShared {
                context: context.clone(),
                state: Mutex::new(SignalState::default()),
            }),
        }
    }

    /// Returns the context completions are delivered on.
    pub fn context(&self) -> &IoContext {
        &self.shared.context
    }

    /// Adds `signo` to the set.
    ///
    /// On unix this installs a process handler for the signal.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the handler cannot be installed, for example
    /// for an invalid signal number or one that cannot be caught.
    pub fn add(&self, signo: i32) -> Result<()> {
        #[cfg(unix)]
        super::unix::register(signo, &self.shared)?;

        self.shared.state.lock().signals.insert(signo);
        Ok(())
    }

    /// Removes `signo` from the set, discarding its queued deliveries.
    pub fn remove(&self, signo: i32) -> Result<()> {
        #[cfg(unix)]
        super::unix::unregister(signo, &self.shared);

        let mut state = self.shared.state.lock();
        state.signals.remove(&signo);
        state.queued.retain(|&queued| queued != signo);

        Ok(())
    }

    /// Removes every signal from the set.
    pub fn clear(&self) -> Result<()> {
        let signals: Vec<i32> = self.shared.state.lock().signals.iter().copied().collect();

        for signo in signals {
            self.remove(signo)?;
        }

        Ok(())
    }

    /// Returns `true` if `signo` is in the set.
    pub fn contains(&self, signo: i32) -> bool {
        self.shared.state.lock().signals.contains(&signo)
    }

    /// Cancels every pending wait with [`Error::OperationAborted`].
    ///
    /// # Returns
    ///
    /// The number of waits cancelled.
    pub fn cancel(&self) -> usize {
        let waits = std::mem::take(&mut self.shared.state.lock().waits);
        let cancelled = waits.len();

        for PendingWait { handler, _work } in waits {
            self.shared
                .context
                .post(move || handler(Err(Error::OperationAborted)));
        }

        cancelled
    }

    /// Delivers `signo` to the set as if the process had received it.
    ///
    /// Does nothing if `signo` is not in the set.
    pub fn deliver(&self, signo: i32) {
        self.shared.deliver(signo);
    }

    /// Registers `handler` to run on the set's context with the next
    /// delivered signal.
    ///
    /// `handler` never runs before this returns, even if a signal is
    /// already queued.
    pub fn async_wait<F>(&self, handler: F)
    where
        F: FnOnce(Result<i32>) + Send + 'static,
    {
        let mut state = self.shared.state.lock();
        let queued = state.queued.pop_front();

        match queued {
            Some(signo) => {
                drop(state);
                self.shared.context.post(move || handler(Ok(signo)));
            }
            None => state.waits.push_back(PendingWait {
                handler: Box::new(handler),
                _work: self.shared.context.work(),
            }),
        }
    }
}

impl Drop for SignalSet {
    fn drop(&mut self) {
        let _ = self.clear();
        self.cancel();
    }
}

impl fmt::Debug for SignalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();

        f.debug_struct("SignalSet")
            .field("signals", &state.signals)
            .field("queued", &state.queued.len())
            .field("pending", &state.waits.len())
            .finish()
    }
}
