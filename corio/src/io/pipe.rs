use super::{AsyncReadStream, AsyncWriteStream};
use crate::error::{Error, Result};
use crate::runtime::{IoContext, WorkGuard};

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

/// Default number of bytes a pipe accepts per write.
pub const DEFAULT_CHUNK: usize = 4096;

type ReadHandler = Box<dyn FnOnce(Result<Vec<u8>>) + Send + 'static>;

/// A read waiting for data.
struct PendingRead {
    max_len: usize,
    handler: ReadHandler,
    _work: WorkGuard,
}

#[derive(Default)]
struct ChannelState {
    buffer: VecDeque<u8>,
    readers: VecDeque<PendingRead>,

    /// No more data will be written into this direction.
    write_closed: bool,

    /// The reading end is gone; writes fail.
    read_closed: bool,
}

/// One direction of a pipe.
#[derive(Default)]
struct Channel {
    state: Mutex<ChannelState>,
}

/// One end of an in-memory, bidirectional byte stream.
///
/// Created in pairs by [`pipe`] or [`pipe_with_chunk`]. Each write moves at
/// most `chunk` bytes, so a large transfer is observable as a sequence of
/// partial operations. Completions are always posted onto the context the
/// pipe was created with.
///
/// Clones refer to the same end.
#[derive(Clone)]
pub struct PipeStream {
    context: IoContext,
    incoming: Arc<Channel>,
    outgoing: Arc<Channel>,
    chunk: usize,
}

/// Creates a connected pair of pipe ends accepting up to
/// [`DEFAULT_CHUNK`] bytes per write.
pub fn pipe(context: &IoContext) -> (PipeStream, PipeStream) {
    pipe_with_chunk(context, DEFAULT_CHUNK)
}

/// Creates a connected pair of pipe ends accepting up to `chunk` bytes per
/// write.
///
/// # Panics
///
/// Panics if `chunk == 0`.
pub fn pipe_with_chunk(context: &IoContext, chunk: usize) -> (PipeStream, PipeStream) {
    assert!(chunk > 0, "pipe chunk size must be > 0");

    let a_to_b = Arc::new(Channel::default());
    let b_to_a = Arc::new(Channel::default());

    let a = PipeStream {
        context: context.clone(),
        incoming: b_to_a.clone(),
        outgoing: a_to_b.clone(),
        chunk,
    };

    let b = PipeStream {
        context: context.clone(),
        incoming: a_to_b,
        outgoing: b_to_a,
        chunk,
    };

    (a, b)
}

impl PipeStream {
    /// Returns the context completions are posted onto.
    pub fn context(&self) -> &IoContext {
        &self.context
    }

    /// Returns the maximum number of bytes accepted per write.
    pub fn chunk(&self) -> usize {
        self.chunk
    }

    /// Closes this end.
    ///
    /// Pending and future reads of the peer end with [`Error::Eof`] once
    /// the buffered data is drained, writes of the peer fail with a broken
    /// pipe, and reads pending on this end are aborted.
    pub fn close(&self) {
        let peer_readers = {
            let mut state = self.outgoing.state.lock();
            state.write_closed = true;

            if state.buffer.is_empty() {
                state.readers.drain(..).collect()
            } else {
                Vec::new()
            }
        };

        for reader in peer_readers {
            self.complete_read(reader, Err(Error::Eof));
        }

        let own_readers: Vec<_> = {
            let mut state = self.incoming.state.lock();
            state.read_closed = true;
            state.buffer.clear();
            state.readers.drain(..).collect()
        };

        for reader in own_readers {
            self.complete_read(reader, Err(Error::OperationAborted));
        }
    }

    fn complete_read(&self, reader: PendingRead, result: Result<Vec<u8>>) {
        let PendingRead { handler, _work, .. } = reader;

        self.context.post(move || handler(result));
    }
}

/// Moves up to `max_len` bytes out of `buffer`.
fn drain_front(buffer: &mut VecDeque<u8>, max_len: usize) -> Vec<u8> {
    let n = max_len.min(buffer.len());
    buffer.drain(..n).collect()
}

impl AsyncReadStream for PipeStream {
    fn async_read_some<F>(&self, max_len: usize, handler: F)
    where
        F: FnOnce(Result<Vec<u8>>) + Send + 'static,
    {
        let mut state = self.incoming.state.lock();

        let result = if max_len == 0 {
            Ok(Vec::new())
        } else if state.read_closed {
            Err(Error::OperationAborted)
        } else if !state.buffer.is_empty() {
            Ok(drain_front(&mut state.buffer, max_len))
        } else if state.write_closed {
            Err(Error::Eof)
        } else {
            state.readers.push_back(PendingRead {
                max_len,
                handler: Box::new(handler),
                _work: self.context.work(),
            });
            return;
        };

        drop(state);
        self.context.post(move || handler(result));
    }
}

impl AsyncWriteStream for PipeStream {
    fn async_write_some<F>(&self, data: Vec<u8>, handler: F)
    where
        F: FnOnce(Result<usize>) + Send + 'static,
    {
        let mut state = self.outgoing.state.lock();

        if state.read_closed || state.write_closed {
            drop(state);
            self.context.post(move || handler(Err(Error::broken_pipe())));
            return;
        }

        let n = data.len().min(self.chunk);
        state.buffer.extend(&data[..n]);

        let mut ready = Vec::new();
        while !state.buffer.is_empty() {
            let Some(reader) = state.readers.pop_front() else {
                break;
            };

            let bytes = drain_front(&mut state.buffer, reader.max_len);
            ready.push((reader, bytes));
        }

        drop(state);

        for (reader, bytes) in ready {
            self.complete_read(reader, Ok(bytes));
        }

        self.context.post(move || handler(Ok(n)));
    }
}

impl fmt::Debug for PipeStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipeStream")
            .field("chunk", &self.chunk)
            .finish_non_exhaustive()
    }
}
