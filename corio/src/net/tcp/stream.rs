use crate::error::{Error, Result};
use crate::io::{AsyncReadStream, AsyncWriteStream};
use crate::net::run_blocking;
use crate::runtime::IoContext;

use std::fmt;
use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr};
use std::sync::Arc;

/// A connected TCP stream.
///
/// Reads and writes each run on a helper thread with a blocking socket;
/// completions are posted onto the stream's context. Clones refer to the
/// same connection, so one clone may read while another writes.
#[derive(Clone)]
pub struct TcpStream {
    context: IoContext,
    socket: Arc<std::net::TcpStream>,
}

impl TcpStream {
    /// Wraps a connected, blocking `std` socket.
    pub fn from_std(context: &IoContext, socket: std::net::TcpStream) -> Self {
        Self {
            context: context.clone(),
            socket: Arc::new(socket),
        }
    }

    /// Connects to `addr` and passes the stream to `handler` on `context`.
    pub fn async_connect<F>(context: &IoContext, addr: SocketAddr, handler: F)
    where
        F: FnOnce(Result<TcpStream>) + Send + 'static,
    {
        let ctx = context.clone();

        run_blocking(
            context,
            "connect",
            move || Ok(std::net::TcpStream::connect(addr)?),
            move |result| handler(result.map(|socket| TcpStream::from_std(&ctx, socket))),
        );
    }

    /// Returns the context completions are posted onto.
    pub fn context(&self) -> &IoContext {
        &self.context
    }

    pub fn peer_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.peer_addr()?)
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    pub fn set_nodelay(&self, nodelay: bool) -> Result<()> {
        Ok(self.socket.set_nodelay(nodelay)?)
    }

    /// Shuts down both directions of the connection.
    ///
    /// Pending reads, on both ends, complete with [`Error::Eof`].
    pub fn close(&self) -> Result<()> {
        match self.socket.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            // Already shut down by the peer.
            Err(e) if e.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl AsyncReadStream for TcpStream {
    fn async_read_some<F>(&self, max_len: usize, handler: F)
    where
        F: FnOnce(Result<Vec<u8>>) + Send + 'static,
    {
        let socket = self.socket.clone();

        run_blocking(
            &self.context,
            "read",
            move || {
                if max_len == 0 {
                    return Ok(Vec::new());
                }

                let mut buf = vec![0u8; max_len];
                let n = (&*socket).read(&mut buf)?;

                if n == 0 {
                    return Err(Error::Eof);
                }

                buf.truncate(n);
                Ok(buf)
            },
            handler,
        );
    }
}

impl AsyncWriteStream for TcpStream {
    fn async_write_some<F>(&self, data: Vec<u8>, handler: F)
    where
        F: FnOnce(Result<usize>) + Send + 'static,
    {
        let socket = self.socket.clone();

        run_blocking(
            &self.context,
            "write",
            move || Ok((&*socket).write(&data)?),
            handler,
        );
    }
}

impl fmt::Debug for TcpStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TcpStream")
            .field("local_addr", &self.socket.local_addr().ok())
            .field("peer_addr", &self.socket.peer_addr().ok())
            .finish()
    }
}
