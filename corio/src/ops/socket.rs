use crate::awaitable::{Await, Handler, Operation};
use crate::error::Result;
use crate::net::{TcpListener, TcpStream};
use crate::runtime::IoContext;

use std::future::Future;
use std::net::SocketAddr;

/// Waits for the next incoming connection on `listener`.
///
/// # Returns
///
/// The connected stream and the peer address, or the accept error.
/// [`Error::OperationAborted`](crate::Error::OperationAborted) is returned
/// when the listener is closed while waiting.
pub fn async_accept(
    listener: &TcpListener,
) -> impl Future<Output = Result<(TcpStream, SocketAddr)>> + Send + '_ {
    Await::new(Operation::new(
        move |handler: Handler<Result<(TcpStream, SocketAddr)>>| {
            listener.async_accept(handler);
        },
    ))
}

/// Connects to `addr`, delivering the stream on `context`.
pub fn async_connect(
    context: &IoContext,
    addr: SocketAddr,
) -> impl Future<Output = Result<TcpStream>> + Send + '_ {
    Await::new(Operation::new(move |handler: Handler<Result<TcpStream>>| {
        TcpStream::async_connect(context, addr, handler);
    }))
}
