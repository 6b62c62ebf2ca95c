use corio::IoContext;
use corio::net::TcpListener;
use corio::ops::{async_accept, async_connect, async_read_with, async_write_with, transfer_exactly};
use corio::spawn;
use std::sync::{Arc, Mutex};

#[test]
fn test_accept_and_connect() {
    let ctx = IoContext::new();
    let listener = TcpListener::bind(&ctx, "127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let accepted = Arc::new(Mutex::new(None));
    let connected = Arc::new(Mutex::new(None));

    let out = accepted.clone();
    spawn(&ctx, move || async move {
        let result = async_accept(&listener).await;
        *out.lock().unwrap() = Some(result.map(|(_, peer)| peer));
    });

    let inner = ctx.clone();
    let out = connected.clone();
    spawn(&ctx, move || async move {
        let result = async_connect(&inner, addr).await;
        *out.lock().unwrap() = Some(result.and_then(|stream| stream.local_addr()));
    });

    ctx.run();

    let peer = accepted.lock().unwrap().take().unwrap().unwrap();
    let local = connected.lock().unwrap().take().unwrap().unwrap();
    assert_eq!(peer, local);
}

#[test]
fn test_exact_read_and_write() {
    const N: usize = 1_000_000;

    let ctx = IoContext::new();
    let listener = TcpListener::bind(&ctx, "127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let received = Arc::new(Mutex::new(None));
    let written = Arc::new(Mutex::new(None));

    let out = received.clone();
    spawn(&ctx, move || async move {
        let Ok((stream, _)) = async_accept(&listener).await else {
            return;
        };

        let mut buf = vec![0u8; N];
        let transfer = async_read_with(&stream, &mut buf, transfer_exactly(N)).await;
        *out.lock().unwrap() = Some((transfer.bytes, transfer.is_ok(), buf));
    });

    let inner = ctx.clone();
    let out = written.clone();
    spawn(&ctx, move || async move {
        let Ok(stream) = async_connect(&inner, addr).await else {
            return;
        };

        let data = vec![b'r'; N];
        let transfer = async_write_with(&stream, &data, transfer_exactly(N)).await;
        *out.lock().unwrap() = Some((transfer.bytes, transfer.is_ok()));
    });

    ctx.run();

    assert_eq!(*written.lock().unwrap(), Some((N, true)));

    let (bytes, ok, buf) = received.lock().unwrap().take().unwrap();
    assert!(ok);
    assert_eq!(bytes, N);
    assert!(buf.iter().all(|&b| b == b'r'));
}

#[test]
fn test_close_aborts_pending_accept() {
    let ctx = IoContext::new();
    let listener = TcpListener::bind(&ctx, "127.0.0.1:0").unwrap();
    let aborted = Arc::new(Mutex::new(false));

    let closer = listener.clone();
    let out = aborted.clone();
    spawn(&ctx, move || async move {
        let result = async_accept(&listener).await;
        *out.lock().unwrap() = result.is_err_and(|e| e.is_aborted());
    });
    spawn(&ctx, move || async move {
        closer.close();
    });

    ctx.run();
    assert!(*aborted.lock().unwrap());
}

#[test]
fn test_read_after_peer_close_reports_eof() {
    let ctx = IoContext::new();
    let listener = TcpListener::bind(&ctx, "127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let eof = Arc::new(Mutex::new(false));

    let out = eof.clone();
    spawn(&ctx, move || async move {
        let Ok((stream, _)) = async_accept(&listener).await else {
            return;
        };

        let mut buf = [0u8; 16];
        let transfer = async_read_with(&stream, &mut buf, transfer_exactly(16)).await;
        *out.lock().unwrap() = transfer.error.is_some_and(|e| e.is_eof());
    });

    let inner = ctx.clone();
    spawn(&ctx, move || async move {
        if let Ok(stream) = async_connect(&inner, addr).await {
            let _ = stream.close();
        }
    });

    ctx.run();
    assert!(*eof.lock().unwrap());
}
