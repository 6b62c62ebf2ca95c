use crate::error::Error;

/// Largest chunk the provided conditions ask for in one operation.
pub const MAX_CHUNK: usize = 65536;

/// Decides how a composed transfer proceeds.
///
/// Before every underlying operation, [`next`](Self::next) receives the
/// error of the previous one (if any) and the number of bytes transferred
/// so far, and returns the maximum size of the next operation. Returning
/// `0` ends the transfer.
pub trait CompletionCondition {
    fn next(&mut self, error: Option<&Error>, transferred: usize) -> usize;
}

impl<F> CompletionCondition for F
where
    F: FnMut(Option<&Error>, usize) -> usize,
{
    fn next(&mut self, error: Option<&Error>, transferred: usize) -> usize {
        self(error, transferred)
    }
}

/// Transfers until the buffer is full or an error occurs.
pub fn transfer_all() -> impl CompletionCondition + Send + 'static {
    |error: Option<&Error>, _transferred: usize| {
        if error.is_some() { 0 } else { MAX_CHUNK }
    }
}

/// Transfers until at least `minimum` bytes have moved.
pub fn transfer_at_least(minimum: usize) -> impl CompletionCondition + Send + 'static {
    move |error: Option<&Error>, transferred: usize| {
        if error.is_some() || transferred >= minimum {
            0
        } else {
            MAX_CHUNK
        }
    }
}

/// Transfers exactly `size` bytes, unless the buffer is smaller or an
/// error occurs.
pub fn transfer_exactly(size: usize) -> impl CompletionCondition + Send + 'static {
    move |error: Option<&Error>, transferred: usize| {
        if error.is_some() || transferred >= size {
            0
        } else {
            (size - transferred).min(MAX_CHUNK)
        }
    }
}
