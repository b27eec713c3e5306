use std::mem;

use futures::{Async, Future, Poll, Stream};

use tracker::{Active, ActivityTracker};

/// An operation that updates an [`ActivityTracker`] as a side effect.
///
/// The wrapper is inert until the inner operation is first polled; only then
/// does it count as started. Values and errors pass through unchanged.
/// Dropping the wrapper between its first poll and its terminal outcome
/// counts as cancellation.
pub struct Tracked<T> {
    inner: T,
    tracker: ActivityTracker,
    policy: Policy,
    state: State,
}

/// How a tracked operation contributes to the count.
#[derive(Clone, Copy)]
struct Policy {
    increment: Increment,
    decrement_on_success: bool,
}

#[derive(Clone, Copy)]
enum Increment {
    Always,
    WhileIdle,
}

enum State {
    Pending,
    Started(Active),
    Done,
}

#[derive(Clone, Copy)]
enum Outcome {
    Success,
    Failure,
}

// ===== impl ActivityTracker =====

impl ActivityTracker {
    /// Tracks an operation that contributes to the count on its own.
    ///
    /// The count is incremented when `op` is first polled and decremented on
    /// any terminal outcome: success, failure, or cancellation.
    pub fn track<T>(&self, op: T) -> Tracked<T> {
        Tracked::new(op, self, Policy::independent())
    }

    /// Tracks one step of a chain of dependent operations.
    ///
    /// A chain shows up as one continuous activity period instead of
    /// toggling the state off between steps. Only a step that starts while
    /// the tracker is idle increments the count, and a successful step
    /// releases it only when `is_last` is true. Failure and cancellation
    /// always release it, whatever the position in the chain.
    ///
    /// The caller must mark exactly the final step with `is_last = true` and
    /// must start a next step after every successful intermediate one;
    /// otherwise the tracker stays active forever.
    pub fn track_sequential<T>(&self, op: T, is_last: bool) -> Tracked<T> {
        Tracked::new(op, self, Policy::sequential(is_last))
    }
}

// ===== impl Tracked =====

impl<T> Tracked<T> {
    fn new(inner: T, tracker: &ActivityTracker, policy: Policy) -> Self {
        Tracked {
            inner,
            tracker: tracker.clone(),
            policy,
            state: State::Pending,
        }
    }

    fn start(&mut self) {
        match self.state {
            State::Pending => {}
            _ => return,
        }
        match self.policy.increment {
            Increment::Always => self.tracker.increment(),
            Increment::WhileIdle => self.tracker.increment_if_idle(),
        }
        self.state = State::Started(self.tracker.guard());
    }

    fn finish(&mut self, outcome: Outcome) {
        if let State::Started(guard) = mem::replace(&mut self.state, State::Done) {
            match outcome {
                Outcome::Success if !self.policy.decrement_on_success => guard.forget(),
                _ => drop(guard),
            }
        }
    }
}

impl<T: Future> Future for Tracked<T> {
    type Item = T::Item;
    type Error = T::Error;

    fn poll(&mut self) -> Poll<T::Item, T::Error> {
        self.start();
        match self.inner.poll() {
            Ok(Async::NotReady) => Ok(Async::NotReady),
            Ok(Async::Ready(item)) => {
                self.finish(Outcome::Success);
                Ok(Async::Ready(item))
            }
            Err(e) => {
                self.finish(Outcome::Failure);
                Err(e)
            }
        }
    }
}

impl<T: Stream> Stream for Tracked<T> {
    type Item = T::Item;
    type Error = T::Error;

    fn poll(&mut self) -> Poll<Option<T::Item>, T::Error> {
        self.start();
        match self.inner.poll() {
            Ok(Async::NotReady) => Ok(Async::NotReady),
            Ok(Async::Ready(Some(item))) => Ok(Async::Ready(Some(item))),
            Ok(Async::Ready(None)) => {
                self.finish(Outcome::Success);
                Ok(Async::Ready(None))
            }
            Err(e) => {
                self.finish(Outcome::Failure);
                Err(e)
            }
        }
    }
}

// ===== impl Policy =====

impl Policy {
    fn independent() -> Self {
        Policy {
            increment: Increment::Always,
            decrement_on_success: true,
        }
    }

    fn sequential(is_last: bool) -> Self {
        Policy {
            increment: Increment::WhileIdle,
            decrement_on_success: is_last,
        }
    }
}
