use super::core::IoContext;
use super::worker::Shared;

use std::fmt;
use std::sync::Arc;

/// Keeps an [`IoContext`] from running out of work.
///
/// While at least one guard is alive, [`IoContext::run`] keeps waiting for
/// handlers instead of returning. Pending asynchronous operations hold one
/// so that a run loop does not exit while their completion is still in
/// flight; applications hold one to keep worker threads parked on an idle
/// context.
pub struct WorkGuard {
    shared: Option<Arc<Shared>>,
}

impl WorkGuard {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        shared.work_started();

        Self {
            shared: Some(shared),
        }
    }

    /// Returns `true` if the guard still counts as outstanding work.
    pub fn owns_work(&self) -> bool {
        self.shared.is_some()
    }

    /// Releases the outstanding work early.
    ///
    /// Calling `reset` more than once has no further effect.
    pub fn reset(&mut self) {
        if let Some(shared) = self.shared.take() {
            shared.work_finished();
        }
    }

    /// Returns the context this guard keeps alive, if it still owns work.
    pub fn context(&self) -> Option<IoContext> {
        self.shared.clone().map(IoContext::from_shared)
    }
}

impl Clone for WorkGuard {
    fn clone(&self) -> Self {
        match &self.shared {
            Some(shared) => WorkGuard::new(shared.clone()),
            None => WorkGuard { shared: None },
        }
    }
}

impl Drop for WorkGuard {
    fn drop(&mut self) {
        self.reset();
    }
}

impl fmt::Debug for WorkGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkGuard")
            .field("context", &self.shared.as_ref().map(|s| s.id))
            .finish()
    }
}
