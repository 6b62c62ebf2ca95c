use super::coroutine::Coroutine;

use std::mem;
use std::sync::Arc;
use std::task::{RawWaker, RawWakerVTable, Waker};

/// Returns the `RawWakerVTable` for a coroutine of type `T`.
///
/// # Safety
///
/// All functions in the vtable must uphold the invariants required
/// by [`RawWaker`]: the data pointer always originates from
/// `Arc::into_raw` on an `Arc<Coroutine<T>>` and every waker owns exactly
/// one strong count.
fn vtable<T: Send + 'static>() -> &'static RawWakerVTable {
    &RawWakerVTable::new(
        clone_raw::<T>,
        wake_raw::<T>,
        wake_by_ref_raw::<T>,
        drop_raw::<T>,
    )
}

/// Creates a [`Waker`] resuming `coroutine`.
pub(crate) fn make_waker<T: Send + 'static>(coroutine: Arc<Coroutine<T>>) -> Waker {
    // Safety: the pointer comes from `Arc::into_raw` and the vtable matches
    // its type.
    unsafe {
        Waker::from_raw(RawWaker::new(
            Arc::into_raw(coroutine) as *const (),
            vtable::<T>(),
        ))
    }
}

fn clone_raw<T: Send + 'static>(ptr: *const ()) -> RawWaker {
    let arc = unsafe { Arc::<Coroutine<T>>::from_raw(ptr as *const Coroutine<T>) };
    let cloned = arc.clone();
    mem::forget(arc);

    RawWaker::new(Arc::into_raw(cloned) as *const (), vtable::<T>())
}

fn wake_raw<T: Send + 'static>(ptr: *const ()) {
    let arc = unsafe { Arc::<Coroutine<T>>::from_raw(ptr as *const Coroutine<T>) };
    Coroutine::wake(arc);
}

fn wake_by_ref_raw<T: Send + 'static>(ptr: *const ()) {
    let arc = unsafe { Arc::<Coroutine<T>>::from_raw(ptr as *const Coroutine<T>) };
    Coroutine::wake(arc.clone());
    mem::forget(arc);
}

fn drop_raw<T: Send + 'static>(ptr: *const ()) {
    unsafe { drop(Arc::<Coroutine<T>>::from_raw(ptr as *const Coroutine<T>)) };
}
