//! Main-thread affinity guard.
//!
//! Wayfinder uses a single-threaded cooperative model: every mutating router
//! or screen operation must happen on the thread that installed the host
//! binding. Calling from any other thread is a programming error and fails
//! fast rather than racing.

use std::thread::{self, ThreadId};

/// Marker for the designated main thread.
///
/// Captured once when the host binding is installed and handed down to every
/// router it creates. Cheap to copy and compare.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MainThreadMarker {
    thread: ThreadId,
}

impl MainThreadMarker {
    /// Capture the current thread as the main thread.
    #[must_use]
    pub fn capture() -> Self {
        Self {
            thread: thread::current().id(),
        }
    }

    /// Whether the caller is on the captured thread.
    #[must_use]
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.thread
    }

    /// Panic unless called on the captured thread.
    ///
    /// `operation` names the offending API in the panic message.
    pub fn ensure(&self, operation: &str) {
        assert!(
            self.is_current(),
            "`{operation}` called off the main thread; router and screen state \
             may only be mutated on the thread that installed the host binding"
        );
    }
}
