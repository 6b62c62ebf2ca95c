use corio::IoContext;
use corio::io::{pipe, pipe_with_chunk};
use corio::ops::{async_read, async_read_with, async_write, async_write_with, transfer_all, transfer_exactly};
use corio::spawn;
use std::sync::{Arc, Mutex};

#[test]
fn test_exact_transfer_across_partial_operations() {
    const N: usize = 1000;

    let ctx = IoContext::new();
    let (writer, reader) = pipe_with_chunk(&ctx, 64);
    let written = Arc::new(Mutex::new(None));
    let received = Arc::new(Mutex::new(None));

    let out = written.clone();
    spawn(&ctx, move || async move {
        let data: Vec<u8> = (0..N).map(|i| (i % 251) as u8).collect();

        let transfer = async_write_with(&writer, &data, transfer_exactly(N)).await;
        *out.lock().unwrap() = Some(transfer);
    });

    let out = received.clone();
    spawn(&ctx, move || async move {
        let mut buf = vec![0u8; N];

        let transfer = async_read_with(&reader, &mut buf, transfer_exactly(N)).await;
        *out.lock().unwrap() = Some((transfer, buf));
    });

    ctx.run();

    let written = written.lock().unwrap().take().unwrap();
    assert!(written.is_ok());
    assert_eq!(written.bytes, N);

    let (read, buf) = received.lock().unwrap().take().unwrap();
    assert!(read.is_ok());
    assert_eq!(read.bytes, N);

    let expected: Vec<u8> = (0..N).map(|i| (i % 251) as u8).collect();
    assert_eq!(buf, expected);
}

#[test]
fn test_single_write_is_partial() {
    let ctx = IoContext::new();
    let (writer, _reader) = pipe_with_chunk(&ctx, 4);

    let bytes = ctx.block_on(async move { async_write(&writer, b"hello world").await.bytes });
    assert_eq!(bytes, 4);
}

#[test]
fn test_single_read_returns_available_data() {
    let ctx = IoContext::new();
    let (writer, reader) = pipe(&ctx);

    let data = ctx.block_on(async move {
        async_write(&writer, b"ping").await.into_result()?;

        let mut buf = [0u8; 32];
        let bytes = async_read(&reader, &mut buf).await.into_result()?;
        Ok::<_, corio::Error>(buf[..bytes].to_vec())
    });

    assert_eq!(data.unwrap(), b"ping");
}

#[test]
fn test_read_all_stops_at_eof() {
    let ctx = IoContext::new();
    let (writer, reader) = pipe_with_chunk(&ctx, 3);

    spawn(&ctx, move || async move {
        let _ = async_write_with(&writer, b"abcdefgh", transfer_all()).await;
        writer.close();
    });

    let transfer = ctx.block_on(async move {
        let mut buf = [0u8; 64];
        let transfer = async_read_with(&reader, &mut buf, transfer_all()).await;
        assert_eq!(&buf[..transfer.bytes], b"abcdefgh");
        transfer
    });

    assert_eq!(transfer.bytes, 8);
    assert!(transfer.error.is_some_and(|e| e.is_eof()));
}

#[test]
fn test_write_to_closed_peer_fails() {
    let ctx = IoContext::new();
    let (writer, reader) = pipe(&ctx);
    reader.close();

    let transfer = ctx.block_on(async move { async_write(&writer, b"lost").await });

    assert_eq!(transfer.bytes, 0);
    assert!(matches!(transfer.error, Some(corio::Error::Io(_))));
}

#[test]
fn test_close_aborts_own_pending_read() {
    let ctx = IoContext::new();
    let (_writer, reader) = pipe(&ctx);

    let aborted = Arc::new(Mutex::new(false));

    let closer = reader.clone();
    let out = aborted.clone();
    spawn(&ctx, move || async move {
        let mut buf = [0u8; 8];
        let transfer = async_read(&reader, &mut buf).await;
        *out.lock().unwrap() = transfer.error.is_some_and(|e| e.is_aborted());
    });
    spawn(&ctx, move || async move {
        closer.close();
    });

    ctx.run();
    assert!(*aborted.lock().unwrap());
}
