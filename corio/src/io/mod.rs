//! Byte stream seams and the in-memory pipe.
//!
//! The read and write adapters in [`ops`](crate::ops) work with any type
//! implementing [`AsyncReadStream`] or [`AsyncWriteStream`]. Both traits
//! describe a single callback-based primitive; composing several of them
//! into a larger transfer is the adapters' job.

mod pipe;

pub use pipe::{DEFAULT_CHUNK, PipeStream, pipe, pipe_with_chunk};

use crate::error::Result;

/// A stream supporting a one-shot, callback-based read.
pub trait AsyncReadStream: Clone + Send + Sync + 'static {
    /// Reads at most `max_len` bytes and passes them to `handler`.
    ///
    /// `handler` is invoked exactly once, never before this method returns.
    /// A stream whose peer has closed completes with
    /// [`Error::Eof`](crate::Error::Eof) rather than with an empty buffer;
    /// an empty buffer is only delivered for `max_len == 0`.
    fn async_read_some<F>(&self, max_len: usize, handler: F)
    where
        F: FnOnce(Result<Vec<u8>>) + Send + 'static;
}

/// A stream supporting a one-shot, callback-based write.
pub trait AsyncWriteStream: Clone + Send + Sync + 'static {
    /// Writes a prefix of `data` and passes the number of bytes written to
    /// `handler`.
    ///
    /// `handler` is invoked exactly once, never before this method returns.
    fn async_write_some<F>(&self, data: Vec<u8>, handler: F)
    where
        F: FnOnce(Result<usize>) + Send + 'static;
}
