use std::cell::RefCell;

thread_local! {
    /// Identifiers of the I/O contexts currently running on this thread.
    ///
    /// A thread can be inside several contexts at once when one context's
    /// `run` is entered from a handler of another. The stack only answers
    /// "am I running inside context N"; it is never used to locate an
    /// executor.
    static RUNNING_CONTEXTS: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Pops the context id pushed by [`enter_context`], even when the closure
/// unwinds.
struct ContextGuard;

impl Drop for ContextGuard {
    fn drop(&mut self) {
        RUNNING_CONTEXTS.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Marks the current thread as running inside context `id` for the
/// duration of `f`.
///
/// # Arguments
///
/// * `id` - Identifier of the entered context.
/// * `f` - Closure executed inside the context.
///
/// # Returns
///
/// Returns the result of the closure `f`.
pub(crate) fn enter_context<R>(id: usize, f: impl FnOnce() -> R) -> R {
    RUNNING_CONTEXTS.with(|stack| stack.borrow_mut().push(id));
    let _guard = ContextGuard;

    f()
}

/// Returns `true` if the current thread is inside context `id`.
pub(crate) fn is_running(id: usize) -> bool {
    RUNNING_CONTEXTS.with(|stack| stack.borrow().contains(&id))
}
