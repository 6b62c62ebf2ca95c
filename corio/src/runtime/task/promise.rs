use std::any::Any;
use std::mem;
use std::thread;

/// Outcome of [`Promise::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Register {
    /// A result is already present; the awaiter continues immediately.
    Ready,

    /// The awaiter is recorded; it suspends.
    Suspended,
}

enum State<T> {
    /// Nothing written, nobody waiting.
    Pending,

    /// An awaiter registered.
    ///
    /// No continuation is kept: the awaiter resumes the frame itself and
    /// sees the result through the poll that produced it.
    Awaited,

    /// The routine returned.
    Value(T),

    /// The routine panicked.
    Panicked(Box<dyn Any + Send + 'static>),

    /// The result was handed to the awaiter.
    Consumed,
}

/// Result slot of a routine frame.
///
/// The promise is only ever reached through the exclusive borrow of the
/// frame that owns it, so registering the awaiter and checking for a
/// result form a single step: no result can be written between the two.
pub(crate) struct Promise<T> {
    state: State<T>,
}

impl<T> Promise<T> {
    pub(crate) fn new() -> Self {
        Self {
            state: State::Pending,
        }
    }

    /// Records the awaiter.
    ///
    /// # Panics
    ///
    /// Panics if an awaiter was already registered or the result was
    /// already consumed.
    pub(crate) fn register(&mut self) -> Register {
        match self.state {
            State::Pending => {
                self.state = State::Awaited;
                Register::Suspended
            }
            State::Value(_) | State::Panicked(_) => Register::Ready,
            State::Awaited => panic!("an awaiter is already registered on this promise"),
            State::Consumed => panic!("the result of this promise was already consumed"),
        }
    }

    /// Stores the routine's return value.
    ///
    /// # Panics
    ///
    /// Panics if a result was already written.
    pub(crate) fn set_value(&mut self, value: T) {
        self.complete(State::Value(value));
    }

    /// Stores the payload of a panic raised by the routine.
    ///
    /// Same contract as [`set_value`](Self::set_value).
    pub(crate) fn set_panic(&mut self, payload: Box<dyn Any + Send + 'static>) {
        self.complete(State::Panicked(payload));
    }

    fn complete(&mut self, result: State<T>) {
        match mem::replace(&mut self.state, result) {
            State::Pending | State::Awaited => {}
            State::Value(_) | State::Panicked(_) | State::Consumed => {
                panic!("the result of this promise was written twice")
            }
        }
    }

    /// Returns `true` if a value or a panic is stored.
    pub(crate) fn is_ready(&self) -> bool {
        matches!(self.state, State::Value(_) | State::Panicked(_))
    }

    /// Takes the stored result.
    ///
    /// # Panics
    ///
    /// Panics if no result is stored.
    pub(crate) fn take(&mut self) -> thread::Result<T> {
        match mem::replace(&mut self.state, State::Consumed) {
            State::Value(value) => Ok(value),
            State::Panicked(payload) => Err(payload),
            _ => panic!("the result of this promise is not available"),
        }
    }
}
