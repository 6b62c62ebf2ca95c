use super::condition::CompletionCondition;
use crate::awaitable::{Await, Awaitable, Handler, Operation};
use crate::error::{Error, Result};
use crate::io::{AsyncReadStream, AsyncWriteStream};

use std::future::Future;
use std::io;

/// Outcome of a read or write.
///
/// A transfer can fail part way: `bytes` counts what moved before
/// `error` occurred.
#[derive(Debug)]
pub struct Transfer {
    /// The error that ended the transfer, if any.
    pub error: Option<Error>,

    /// Number of bytes transferred.
    pub bytes: usize,
}

impl Transfer {
    /// Returns `true` if the transfer ended without an error.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Converts into a `Result`, dropping the byte count on failure.
    pub fn into_result(self) -> Result<usize> {
        match self.error {
            None => Ok(self.bytes),
            Some(error) => Err(error),
        }
    }
}

/// Reads once from `stream` into `buf`.
///
/// Completes as soon as the stream has any data, which may be less than
/// `buf.len()`.
pub fn async_read<'a, S>(stream: &'a S, buf: &'a mut [u8]) -> impl Future<Output = Transfer> + Send + 'a
where
    S: AsyncReadStream,
{
    let capacity = buf.len();

    let op = Operation::new(move |handler: Handler<Result<Vec<u8>>>| {
        stream.async_read_some(capacity, handler);
    });

    Await::new(op.map(move |result| match result {
        Ok(data) => Transfer {
            error: None,
            bytes: copy_into(buf, &data),
        },
        Err(error) => Transfer {
            error: Some(error),
            bytes: 0,
        },
    }))
}

/// Reads from `stream` into `buf` until `condition` says stop, the buffer
/// is full, or an error occurs.
///
/// # Examples
///
/// ```rust,ignore
/// let mut header = [0u8; 16];
/// let transfer = async_read_with(&stream, &mut header, transfer_exactly(16)).await;
/// assert_eq!(transfer.bytes, 16);
/// ```
pub fn async_read_with<'a, S, C>(
    stream: &'a S,
    buf: &'a mut [u8],
    condition: C,
) -> impl Future<Output = Transfer> + Send + 'a
where
    S: AsyncReadStream,
    C: CompletionCondition + Send + 'static,
{
    let capacity = buf.len();

    let op = Operation::new(move |handler: Handler<(Vec<u8>, Option<Error>)>| {
        read_step(stream.clone(), capacity, Vec::new(), condition, None, handler);
    });

    Await::new(op.map(move |(data, error)| Transfer {
        error,
        bytes: copy_into(buf, &data),
    }))
}

/// Writes once to `stream` from `data`.
///
/// The stream may accept only a prefix of `data`.
pub fn async_write<'a, S>(stream: &'a S, data: &'a [u8]) -> impl Future<Output = Transfer> + Send + 'a
where
    S: AsyncWriteStream,
{
    let data = data.to_vec();

    let op = Operation::new(move |handler: Handler<Result<usize>>| {
        stream.async_write_some(data, handler);
    });

    Await::new(op.map(|result| match result {
        Ok(bytes) => Transfer { error: None, bytes },
        Err(error) => Transfer {
            error: Some(error),
            bytes: 0,
        },
    }))
}

/// Writes `data` to `stream` until `condition` says stop, everything is
/// written, or an error occurs.
pub fn async_write_with<'a, S, C>(
    stream: &'a S,
    data: &'a [u8],
    condition: C,
) -> impl Future<Output = Transfer> + Send + 'a
where
    S: AsyncWriteStream,
    C: CompletionCondition + Send + 'static,
{
    let data = data.to_vec();

    let op = Operation::new(move |handler: Handler<(usize, Option<Error>)>| {
        write_step(stream.clone(), data, 0, condition, None, handler);
    });

    Await::new(op.map(|(bytes, error)| Transfer { error, bytes }))
}

fn copy_into(buf: &mut [u8], data: &[u8]) -> usize {
    let n = data.len().min(buf.len());
    buf[..n].copy_from_slice(&data[..n]);
    n
}

/// One step of a composed read. Each completion schedules the next step.
fn read_step<S, C>(
    stream: S,
    capacity: usize,
    mut data: Vec<u8>,
    mut condition: C,
    error: Option<Error>,
    handler: Handler<(Vec<u8>, Option<Error>)>,
) where
    S: AsyncReadStream,
    C: CompletionCondition + Send + 'static,
{
    let max = condition
        .next(error.as_ref(), data.len())
        .min(capacity - data.len());

    if error.is_some() || max == 0 {
        handler((data, error));
        return;
    }

    let next = stream.clone();
    stream.async_read_some(max, move |result| match result {
        Ok(chunk) => {
            data.extend_from_slice(&chunk);
            read_step(next, capacity, data, condition, None, handler);
        }
        Err(error) => read_step(next, capacity, data, condition, Some(error), handler),
    });
}

/// One step of a composed write.
fn write_step<S, C>(
    stream: S,
    data: Vec<u8>,
    written: usize,
    mut condition: C,
    error: Option<Error>,
    handler: Handler<(usize, Option<Error>)>,
) where
    S: AsyncWriteStream,
    C: CompletionCondition + Send + 'static,
{
    let max = condition
        .next(error.as_ref(), written)
        .min(data.len() - written);

    if error.is_some() || max == 0 {
        handler((written, error));
        return;
    }

    let chunk = data[written..written + max].to_vec();
    let next = stream.clone();

    stream.async_write_some(chunk, move |result| match result {
        Ok(0) => {
            let error = Error::Io(io::Error::new(
                io::ErrorKind::WriteZero,
                "stream accepted zero bytes",
            ));
            write_step(next, data, written, condition, Some(error), handler);
        }
        Ok(n) => write_step(next, data, written + n, condition, None, handler),
        Err(error) => write_step(next, data, written, condition, Some(error), handler),
    });
}
