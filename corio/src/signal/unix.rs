//! Process signal plumbing.
//!
//! The installed handler only writes the signal number into a self-pipe.
//! A dispatcher thread reads the pipe and delivers each signal to every
//! registered set listening for it.

use super::set::SignalShared;

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::io::{self, Read};
use std::mem;
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;
use std::ptr;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use std::thread;
use tracing::{debug, warn};

struct Registration {
    signo: i32,
    set: Weak<SignalShared>,
}

/// Sets listening to each signal.
static REGISTRY: Mutex<Vec<Registration>> = Mutex::new(Vec::new());

/// Signals whose process handler is installed, with the disposition it
/// replaced.
///
/// Taken before [`REGISTRY`] whenever both are held.
static INSTALLED: Mutex<BTreeMap<i32, libc::sigaction>> = Mutex::new(BTreeMap::new());

/// Write end of the self-pipe, read by the signal handler.
static WRITE_FD: AtomicI32 = AtomicI32::new(-1);

/// Keeps the write end open for the lifetime of the process.
static PIPE: OnceLock<UnixStream> = OnceLock::new();

/// Registers `set` as a listener of `signo`, installing the process handler
/// on first use.
pub(crate) fn register(signo: i32, set: &Arc<SignalShared>) -> io::Result<()> {
    start_dispatcher()?;

    let mut installed = INSTALLED.lock();
    install(&mut installed, signo)?;

    let mut registry = REGISTRY.lock();
    let weak = Arc::downgrade(set);

    if !registry
        .iter()
        .any(|r| r.signo == signo && r.set.ptr_eq(&weak))
    {
        registry.push(Registration { signo, set: weak });
    }

    Ok(())
}

/// Removes `set` from the listeners of `signo`.
///
/// Once no set listens for `signo`, the disposition it had before the first
/// registration is restored.
pub(crate) fn unregister(signo: i32, set: &Arc<SignalShared>) {
    let weak = Arc::downgrade(set);

    let mut installed = INSTALLED.lock();
    let mut registry = REGISTRY.lock();

    registry.retain(|r| !(r.signo == signo && r.set.ptr_eq(&weak)) && r.set.strong_count() > 0);

    if registry.iter().any(|r| r.signo == signo) {
        return;
    }

    drop(registry);
    uninstall(&mut installed, signo);
}

extern "C" fn on_signal(signo: libc::c_int) {
    let fd = WRITE_FD.load(Ordering::Relaxed);

    if fd >= 0 {
        let byte = signo as u8;

        // Safety: write(2) is async-signal-safe; a full pipe drops the byte.
        unsafe {
            libc::write(fd, &byte as *const u8 as *const libc::c_void, 1);
        }
    }
}

fn install(installed: &mut BTreeMap<i32, libc::sigaction>, signo: i32) -> io::Result<()> {
    if installed.contains_key(&signo) {
        return Ok(());
    }

    // Safety: `action` is fully initialized before being passed to
    // sigaction(2), and `on_signal` only performs async-signal-safe calls.
    let previous = unsafe {
        let mut action: libc::sigaction = mem::zeroed();
        action.sa_sigaction = on_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
        action.sa_flags = libc::SA_RESTART;
        libc::sigemptyset(&mut action.sa_mask);

        let mut previous: libc::sigaction = mem::zeroed();

        if libc::sigaction(signo, &action, &mut previous) != 0 {
            return Err(io::Error::last_os_error());
        }

        previous
    };

    debug!(signo, "signal handler installed");
    installed.insert(signo, previous);

    Ok(())
}

fn uninstall(installed: &mut BTreeMap<i32, libc::sigaction>, signo: i32) {
    let Some(previous) = installed.remove(&signo) else {
        return;
    };

    // Safety: `previous` was filled in by sigaction(2) when the handler
    // was installed.
    if unsafe { libc::sigaction(signo, &previous, ptr::null_mut()) } != 0 {
        warn!(signo, error = %io::Error::last_os_error(), "failed to restore signal disposition");
        return;
    }

    debug!(signo, "signal disposition restored");
}

/// Creates the self-pipe and its dispatcher thread, once per process.
fn start_dispatcher() -> io::Result<()> {
    if PIPE.get().is_some() {
        return Ok(());
    }

    let (reader, writer) = UnixStream::pair()?;
    writer.set_nonblocking(true)?;

    let fd: RawFd = writer.as_raw_fd();

    // Lost the race against another thread: drop our pair.
    if PIPE.set(writer).is_err() {
        return Ok(());
    }

    WRITE_FD.store(fd, Ordering::Release);

    thread::Builder::new()
        .name(String::from("corio-signal"))
        .spawn(move || dispatch(reader))?;

    Ok(())
}

fn dispatch(mut reader: UnixStream) {
    let mut byte = [0u8; 1];

    loop {
        match reader.read(&mut byte) {
            Ok(0) => return,
            Ok(_) => deliver(i32::from(byte[0])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!(error = %e, "signal dispatcher stopped");
                return;
            }
        }
    }
}

fn deliver(signo: i32) {
    let sets: Vec<Arc<SignalShared>> = REGISTRY
        .lock()
        .iter()
        .filter(|r| r.signo == signo)
        .filter_map(|r| r.set.upgrade())
        .collect();

    debug!(signo, listeners = sets.len(), "signal received");

    for set in sets {
        set.deliver(signo);
    }
}
