//! Tracks whether any asynchronous operation is currently in flight.
//!
//! An [`ActivityTracker`] counts the operations attached to it and derives
//! a single boolean signal, "is anything in flight," from that count. The
//! signal drives things like a loading indicator that must stay visible
//! while any number of concurrent requests overlap, without the caller
//! bookkeeping each one.
//!
//! Operations are attached by wrapping a `Future` or `Stream`:
//!
//! - [`ActivityTracker::track`] counts the operation independently: it
//!   raises the count when first polled and releases it on success, failure,
//!   or cancellation.
//! - [`ActivityTracker::track_sequential`] presents a chain of dependent
//!   steps as one continuous activity period: only a step that starts while
//!   the tracker is idle raises the count, and only the designated last step
//!   releases it on success.
//!
//! Wrapping has no side effect until the operation is first polled, so
//! wrappers can be built, stored, and composed freely.
//!
//! The signal itself is available synchronously through
//! [`ActivityTracker::is_active`] and as a stream of changes through
//! [`ActivityTracker::watch`]. The stream has current-value semantics: a
//! late subscriber first observes the present state, and equal consecutive
//! values are never delivered twice.
//!
//! ```
//! extern crate futures;
//! extern crate track_activity;
//!
//! use futures::Future;
//! use futures::sync::oneshot;
//! use track_activity::ActivityTracker;
//!
//! fn main() {
//!     let tracker = ActivityTracker::new();
//!
//!     let (tx, rx) = oneshot::channel();
//!     let rx = tracker.track(rx);
//!     // Nothing counts until the wrapped operation is polled.
//!     assert!(!tracker.is_active());
//!
//!     tx.send("done").unwrap();
//!     assert_eq!(rx.wait().unwrap(), "done");
//!     assert!(!tracker.is_active());
//! }
//! ```

extern crate futures;
extern crate indexmap;
#[macro_use]
extern crate log;

#[cfg(test)]
extern crate env_logger;

mod track;
mod tracker;
mod watch;

#[cfg(test)]
mod test_util;

pub use self::track::Tracked;
pub use self::tracker::{Active, ActivityTracker};
pub use self::watch::IsActive;
