use crate::task::Continuation;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Outcome of handing a continuation to an [`Awaitable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suspend {
    /// The continuation is stored and will be resumed later.
    Suspended,

    /// The result became available while suspending; the awaiter
    /// continues immediately.
    Resumed,
}

/// A value a routine can suspend on.
///
/// The protocol is driven by [`Await`]:
/// 1. [`is_ready`](Self::is_ready) is checked first; a ready awaitable never
///    suspends.
/// 2. [`suspend`](Self::suspend) receives the routine's continuation and
///    either keeps it (`Suspended`) or reports that the result is already
///    there (`Resumed`).
/// 3. Once resumed, [`take_result`](Self::take_result) is called exactly
///    once.
///
/// When the awaiting routine is polled again while still suspended,
/// [`refresh`](Self::refresh) is called instead of `suspend`.
pub trait Awaitable: Unpin {
    /// The value produced at the await point.
    type Output;

    /// Returns `true` if the result is available without suspending.
    fn is_ready(&self) -> bool;

    /// Registers `continuation` and starts whatever will eventually resume
    /// it.
    fn suspend(&mut self, continuation: Continuation) -> Suspend;

    /// Hands out the result.
    fn take_result(&mut self) -> Self::Output;

    /// Called when the suspended routine is polled again.
    ///
    /// `continuation` is the routine's current one; implementations holding
    /// an older continuation should swap it in. The default keeps waiting.
    fn refresh(&mut self, continuation: Continuation) -> Suspend {
        let _ = continuation;

        if self.is_ready() {
            Suspend::Resumed
        } else {
            Suspend::Suspended
        }
    }

    /// Transforms the result with `f`.
    fn map<F, U>(self, f: F) -> Map<Self, F>
    where
        Self: Sized,
        F: FnOnce(Self::Output) -> U,
    {
        Map::new(self, f)
    }
}

enum State {
    Fresh,
    Suspended,
    Done,
}

/// The future awaiting an [`Awaitable`].
///
/// # Panics
///
/// Polling an `Await` after it returned `Poll::Ready` panics.
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Await<A> {
    awaitable: A,
    state: State,
}

impl<A: Awaitable> Await<A> {
    /// Wraps `awaitable`.
    pub fn new(awaitable: A) -> Self {
        Self {
            awaitable,
            state: State::Fresh,
        }
    }

    /// Returns a reference to the wrapped awaitable.
    pub fn get_ref(&self) -> &A {
        &self.awaitable
    }

    fn finish(&mut self) -> Poll<A::Output> {
        self.state = State::Done;
        Poll::Ready(self.awaitable.take_result())
    }
}

impl<A: Awaitable> Future for Await<A> {
    type Output = A::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        match this.state {
            State::Fresh => {
                if this.awaitable.is_ready() {
                    return this.finish();
                }

                match this.awaitable.suspend(Continuation::new(cx.waker().clone())) {
                    Suspend::Resumed => this.finish(),
                    Suspend::Suspended => {
                        this.state = State::Suspended;
                        Poll::Pending
                    }
                }
            }
            State::Suspended => {
                if this.awaitable.is_ready() {
                    return this.finish();
                }

                match this.awaitable.refresh(Continuation::new(cx.waker().clone())) {
                    Suspend::Resumed => this.finish(),
                    Suspend::Suspended => Poll::Pending,
                }
            }
            State::Done => panic!("`Await` polled after completion"),
        }
    }
}

impl<A: fmt::Debug> fmt::Debug for Await<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Await")
            .field("awaitable", &self.awaitable)
            .finish()
    }
}

/// Awaitable returned by [`Awaitable::map`].
pub struct Map<A, F> {
    inner: A,
    f: Option<F>,
}

impl<A, F> Map<A, F> {
    /// Wraps `inner`, transforming its result with `f`.
    pub fn new(inner: A, f: F) -> Self {
        Self { inner, f: Some(f) }
    }
}

// `F` is never pinned.
impl<A: Unpin, F> Unpin for Map<A, F> {}

impl<A, F, U> Awaitable for Map<A, F>
where
    A: Awaitable,
    F: FnOnce(A::Output) -> U,
{
    type Output = U;

    fn is_ready(&self) -> bool {
        self.inner.is_ready()
    }

    fn suspend(&mut self, continuation: Continuation) -> Suspend {
        self.inner.suspend(continuation)
    }

    fn refresh(&mut self, continuation: Continuation) -> Suspend {
        self.inner.refresh(continuation)
    }

    fn take_result(&mut self) -> U {
        let Some(f) = self.f.take() else {
            panic!("`Map` result taken twice");
        };

        f(self.inner.take_result())
    }
}
