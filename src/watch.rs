use std::sync::{Arc, Mutex};

use futures::task;
use futures::{Async, Poll, Stream};

use tracker::Shared;

/// A stream of changes to a tracker's activity state.
///
/// ## Semantics
///
/// - The first poll yields the state at that moment, however late the
///   subscriber arrived.
/// - Later polls yield only values that differ from the previously yielded
///   one; equal consecutive values are suppressed.
/// - Intermediate flips that happen between two polls are coalesced into the
///   latest state. This is a current-value signal, not an event log.
/// - The stream never errors. It ends once every handle of the originating
///   tracker has been dropped.
pub struct IsActive {
    shared: Arc<Mutex<Shared>>,
    id: usize,
    observed: Option<bool>,
}

// ===== impl IsActive =====

impl IsActive {
    pub(crate) fn new(shared: Arc<Mutex<Shared>>, id: usize) -> Self {
        IsActive {
            shared,
            id,
            observed: None,
        }
    }
}

impl Stream for IsActive {
    type Item = bool;
    type Error = ();

    fn poll(&mut self) -> Poll<Option<bool>, ()> {
        let mut shared = self.shared.lock().expect("tracker lock");

        let active = shared.is_active();
        if self.observed != Some(active) {
            self.observed = Some(active);
            return Ok(Async::Ready(Some(active)));
        }

        if shared.is_closed() {
            return Ok(Async::Ready(None));
        }

        shared.park(self.id, task::current());
        Ok(Async::NotReady)
    }
}

impl Drop for IsActive {
    fn drop(&mut self) {
        let mut shared = self.shared.lock().expect("tracker lock");
        shared.unpark(self.id);
    }
}
