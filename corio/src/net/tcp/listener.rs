use super::stream::TcpStream;
use crate::error::{Error, Result};
use crate::net::run_blocking;
use crate::runtime::IoContext;

use std::fmt;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// How often a pending accept checks whether the listener was closed.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

struct Inner {
    socket: std::net::TcpListener,
    closed: AtomicBool,
}

impl Inner {
    fn accept(&self) -> Result<(std::net::TcpStream, SocketAddr)> {
        loop {
            if self.closed.load(Ordering::Acquire) {
                return Err(Error::OperationAborted);
            }

            match self.socket.accept() {
                Ok((stream, peer)) => {
                    stream.set_nonblocking(false)?;
                    return Ok((stream, peer));
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// A TCP socket listening for connections.
///
/// Clones refer to the same socket.
///
/// # Limitations
///
/// There is no readiness reactor behind the listener. Each pending accept
/// occupies a helper thread that polls the non-blocking socket every
/// 10 ms, so a connection may wait up to that long before it is accepted,
/// and [`close`](Self::close) takes up to that long to abort a pending
/// accept.
#[derive(Clone)]
pub struct TcpListener {
    context: IoContext,
    inner: Arc<Inner>,
}

impl TcpListener {
    /// Binds a listener to `addr`. Accepted streams belong to `context`.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the address cannot be bound.
    pub fn bind(context: &IoContext, addr: impl ToSocketAddrs) -> Result<Self> {
        let socket = std::net::TcpListener::bind(addr)?;
        socket.set_nonblocking(true)?;

        Ok(Self {
            context: context.clone(),
            inner: Arc::new(Inner {
                socket,
                closed: AtomicBool::new(false),
            }),
        })
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.inner.socket.local_addr()?)
    }

    /// Returns the context accepted streams belong to.
    pub fn context(&self) -> &IoContext {
        &self.context
    }

    /// Accepts the next connection and passes it to `handler` on the
    /// listener's context.
    ///
    /// The accept runs on its own helper thread until it completes; see the
    /// type-level limitations.
    pub fn async_accept<F>(&self, handler: F)
    where
        F: FnOnce(Result<(TcpStream, SocketAddr)>) + Send + 'static,
    {
        let inner = self.inner.clone();
        let context = self.context.clone();

        run_blocking(
            &self.context,
            "accept",
            move || inner.accept(),
            move |result| handler(result.map(|(s, peer)| (TcpStream::from_std(&context, s), peer))),
        );
    }

    /// Closes the listener.
    ///
    /// Pending and future accepts complete with
    /// [`Error::OperationAborted`].
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
    }

    /// Returns `true` if the listener was closed.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for TcpListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TcpListener")
            .field("local_addr", &self.inner.socket.local_addr().ok())
            .field("closed", &self.is_closed())
            .finish()
    }
}
