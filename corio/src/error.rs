use std::io;

use thiserror::Error;

/// Result alias used by every operation adapter.
pub type Result<T> = std::result::Result<T, Error>;

/// Error code delivered by asynchronous operations.
///
/// Operation errors are plain values: they are handed back at the await
/// point and never unwind. Panics raised inside a routine body travel on a
/// separate channel (see [`Task`](crate::Task)).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The operation was cancelled before it could complete, either
    /// explicitly (`cancel`) or because the underlying object was closed
    /// or re-armed.
    #[error("operation aborted")]
    OperationAborted,

    /// The peer closed its end of the stream.
    #[error("end of file")]
    Eof,

    /// The producer of an awaited external future went away without
    /// resolving it.
    #[error("broken promise")]
    BrokenPromise,

    /// An error reported by the operating system.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Returns `true` if this error reports a cancelled operation.
    pub fn is_aborted(&self) -> bool {
        matches!(self, Error::OperationAborted)
    }

    /// Returns `true` if this error reports end of stream.
    pub fn is_eof(&self) -> bool {
        matches!(self, Error::Eof)
    }

    pub(crate) fn broken_pipe() -> Self {
        Error::Io(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "peer end of the stream is closed",
        ))
    }
}
