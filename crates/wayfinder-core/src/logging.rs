//! Logging support.
//!
//! With the `tracing` feature enabled, the crate root re-exports the
//! `tracing` macros used internally (`trace!`, `debug!`, `warn!`). Without
//! the feature, the no-op macros below are exported in their place so call
//! sites compile either way.

#[cfg(not(feature = "tracing"))]
mod noop_macros {
    /// No-op trace macro when tracing is disabled.
    #[macro_export]
    macro_rules! trace {
        ($($arg:tt)*) => {};
    }

    /// No-op debug macro when tracing is disabled.
    #[macro_export]
    macro_rules! debug {
        ($($arg:tt)*) => {};
    }

    /// No-op warn macro when tracing is disabled.
    #[macro_export]
    macro_rules! warn {
        ($($arg:tt)*) => {};
    }
}
