use indexmap::IndexMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::task::Task;

use watch::IsActive;

/// Counts the number of asynchronous operations currently in flight.
///
/// Handles are cheap to clone and share one counter. The derived boolean
/// state ("is anything in flight") can be read synchronously with
/// [`ActivityTracker::is_active`] or observed as a stream of changes with
/// [`ActivityTracker::watch`].
pub struct ActivityTracker {
    shared: Arc<Mutex<Shared>>,
}

/// A handle that decrements the number of in-flight operations on drop.
pub struct Active {
    tracker: Option<ActivityTracker>,
}

/// State shared by all handles, guards, and watch streams of a tracker.
///
/// Every mutation of `count` updates `active` under the same lock, so an
/// observer never sees the two disagree. Parked watcher tasks are notified
/// only after the lock has been released.
pub struct Shared {
    count: usize,
    active: bool,
    closed: bool,
    handles: usize,
    next_watch: usize,
    watchers: IndexMap<usize, Task>,
}

// ===== impl ActivityTracker =====

impl ActivityTracker {
    pub fn new() -> Self {
        let shared = Shared {
            count: 0,
            active: false,
            closed: false,
            handles: 1,
            next_watch: 0,
            watchers: IndexMap::new(),
        };
        ActivityTracker {
            shared: Arc::new(Mutex::new(shared)),
        }
    }

    /// Returns true while at least one tracked operation is in flight.
    pub fn is_active(&self) -> bool {
        self.lock().active
    }

    /// Returns the number of operations currently in flight.
    pub fn in_flight(&self) -> usize {
        self.lock().count
    }

    /// Subscribes to changes of the activity state.
    ///
    /// The returned stream yields the current value first, then only values
    /// that differ from the previously yielded one. It ends when the last
    /// tracker handle is dropped.
    pub fn watch(&self) -> IsActive {
        let mut shared = self.lock();
        let id = shared.next_watch;
        shared.next_watch += 1;
        drop(shared);
        IsActive::new(self.shared.clone(), id)
    }

    /// Marks one operation as started until the returned guard is dropped.
    pub fn enter(&self) -> Active {
        self.increment();
        self.guard()
    }

    pub(crate) fn guard(&self) -> Active {
        Active {
            tracker: Some(self.clone()),
        }
    }

    pub(crate) fn increment(&self) {
        let mut shared = self.lock();
        shared.count += 1;
        trace!("activity up; {} in flight", shared.count);
        if shared.count != 1 {
            return;
        }
        shared.active = true;
        let watchers = shared.take_watchers();
        drop(shared);
        notify(watchers);
    }

    /// Increments only when nothing is in flight at this instant.
    pub(crate) fn increment_if_idle(&self) {
        let mut shared = self.lock();
        if shared.active {
            return;
        }
        shared.count += 1;
        shared.active = true;
        trace!("activity up; {} in flight", shared.count);
        let watchers = shared.take_watchers();
        drop(shared);
        notify(watchers);
    }

    pub(crate) fn decrement(&self) {
        let mut shared = self.lock();
        if shared.count == 0 {
            // An unbalanced sequential chain or a stray guard. The count
            // saturates at zero rather than wrapping.
            warn!("activity decremented while idle");
            return;
        }
        shared.count -= 1;
        trace!("activity down; {} in flight", shared.count);
        if shared.count != 0 {
            return;
        }
        shared.active = false;
        let watchers = shared.take_watchers();
        drop(shared);
        notify(watchers);
    }

    fn lock(&self) -> MutexGuard<Shared> {
        self.shared.lock().expect("tracker lock")
    }
}

impl Default for ActivityTracker {
    fn default() -> Self {
        ActivityTracker::new()
    }
}

impl Clone for ActivityTracker {
    fn clone(&self) -> Self {
        self.lock().handles += 1;
        ActivityTracker {
            shared: self.shared.clone(),
        }
    }
}

impl Drop for ActivityTracker {
    fn drop(&mut self) {
        let mut shared = self.lock();
        shared.handles -= 1;
        if shared.handles != 0 {
            return;
        }
        shared.closed = true;
        let watchers = shared.take_watchers();
        drop(shared);
        notify(watchers);
    }
}

impl fmt::Debug for ActivityTracker {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let shared = self.lock();
        f.debug_struct("ActivityTracker")
            .field("in_flight", &shared.count)
            .field("active", &shared.active)
            .finish()
    }
}

// ===== impl Active =====

impl Active {
    /// Disarms the guard so that dropping it releases nothing.
    pub(crate) fn forget(mut self) {
        self.tracker.take();
    }
}

impl Drop for Active {
    fn drop(&mut self) {
        if let Some(tracker) = self.tracker.take() {
            tracker.decrement();
        }
    }
}

impl fmt::Debug for Active {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Active")
            .field("armed", &self.tracker.is_some())
            .finish()
    }
}

// ===== impl Shared =====

impl Shared {
    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn park(&mut self, id: usize, task: Task) {
        self.watchers.insert(id, task);
    }

    pub(crate) fn unpark(&mut self, id: usize) {
        self.watchers.swap_remove(&id);
    }

    fn take_watchers(&mut self) -> Vec<Task> {
        self.watchers.drain(..).map(|(_, task)| task).collect()
    }
}

fn notify(watchers: Vec<Task>) {
    for task in watchers {
        task.notify();
    }
}
