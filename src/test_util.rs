use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::executor::{Notify, NotifyHandle, Spawn};
use futures::Async;

use watch::IsActive;

/// A notifier for polling outside of an executor.
pub struct Noop;

impl Notify for Noop {
    fn notify(&self, _id: usize) {}
}

pub fn noop() -> NotifyHandle {
    NotifyHandle::from(Arc::new(Noop))
}

/// Counts how often a parked task is woken.
#[derive(Default)]
pub struct Count(AtomicUsize);

impl Count {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl Notify for Count {
    fn notify(&self, _id: usize) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Appends every immediately-ready value of `watch` to `seen`.
pub fn drain(watch: &mut Spawn<IsActive>, seen: &mut Vec<bool>) {
    loop {
        match watch.poll_stream_notify(&noop(), 0) {
            Ok(Async::Ready(Some(value))) => seen.push(value),
            Ok(Async::Ready(None)) | Ok(Async::NotReady) => return,
            Err(()) => panic!("activity stream never errors"),
        }
    }
}
