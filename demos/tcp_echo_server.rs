//! Demo: TCP echo server with Corio
//!
//! Every connection is echoed back until the peer closes it or stays idle
//! for longer than `IDLE_TIMEOUT`. Ctrl-C (or SIGTERM) stops the server.
//!
//! Run with `RUST_LOG=debug` to follow the runtime's own logging.

use corio::IoContext;
use corio::net::{TcpListener, TcpStream};
use corio::ops::{async_accept, async_read, async_wait, async_wait_signal, async_write_with, transfer_all};
use corio::signal::{SIGINT, SIGTERM, SignalSet};
use corio::time::SteadyTimer;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const ADDR: &str = "127.0.0.1:9000";
const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

fn main() -> corio::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let ctx = IoContext::new();

    let listener = TcpListener::bind(&ctx, ADDR)?;
    info!(addr = %listener.local_addr()?, "echo server listening");

    let signals = SignalSet::new(&ctx);
    signals.add(SIGINT)?;
    signals.add(SIGTERM)?;

    let acceptor = listener.clone();
    corio::spawn(&ctx, move || serve(acceptor));
    corio::spawn(&ctx, move || shutdown(signals, listener));

    ctx.run();
    info!("bye");

    Ok(())
}

// Accepts connections until the listener is closed.
#[corio::routine]
async fn serve(listener: TcpListener) {
    loop {
        match async_accept(&listener).await {
            Ok((stream, peer)) => {
                info!(%peer, "accepted connection");
                corio::spawn(listener.context(), move || session(stream));
            }
            Err(e) if e.is_aborted() => {
                info!("listener closed");
                return;
            }
            Err(e) => warn!(error = %e, "accept failed"),
        }
    }
}

// Echoes everything back; every read pushes the idle deadline.
#[corio::routine]
async fn session(stream: TcpStream) {
    let timer = Arc::new(SteadyTimer::after(stream.context(), IDLE_TIMEOUT));
    let done = Arc::new(AtomicBool::new(false));

    {
        let timer = timer.clone();
        let stream = stream.clone();
        let done = done.clone();
        let ctx = stream.context().clone();
        corio::spawn(&ctx, move || watchdog(timer, stream, done));
    }

    let mut buf = [0u8; 1024];

    loop {
        let read = async_read(&stream, &mut buf).await;

        if let Some(error) = read.error {
            if !error.is_eof() {
                warn!(error = %error, "read failed");
            }
            break;
        }

        timer.expires_after(IDLE_TIMEOUT);

        let written = async_write_with(&stream, &buf[..read.bytes], transfer_all()).await;
        if let Some(error) = written.error {
            warn!(error = %error, "write failed");
            break;
        }
    }

    done.store(true, Ordering::Release);
    timer.cancel();
    let _ = stream.close();
}

// Closes the connection once the idle deadline passes.
#[corio::routine]
async fn watchdog(timer: Arc<SteadyTimer>, stream: TcpStream, done: Arc<AtomicBool>) {
    loop {
        let expired = async_wait(&timer).await.is_ok();

        if done.load(Ordering::Acquire) {
            return;
        }

        if expired && timer.expiry() <= Instant::now() {
            info!("closing idle connection");
            let _ = stream.close();
            return;
        }
    }
}

#[corio::routine]
async fn shutdown(signals: SignalSet, listener: TcpListener) {
    match async_wait_signal(&signals).await {
        Ok(signo) => info!(signo, "shutting down"),
        Err(e) => warn!(error = %e, "signal wait failed"),
    }

    listener.close();
    listener.context().stop();
}
