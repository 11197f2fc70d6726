#![forbid(unsafe_code)]

//! Wayfinder public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users. It
//! re-exports common types from the internal crates and offers a
//! lightweight prelude for day-to-day usage.

// --- Core re-exports -------------------------------------------------------

pub use wayfinder_core::{
    ChangeContext, ChangeDone, ChangeHandler, ChangeOutcome, Container, ContainerId,
    INSTANT_HANDLER_KIND, InstantChangeHandler, LifecycleEvent, LifecycleState, MainThreadMarker,
    RetainViewMode, View, ViewId, WeakContainer,
};

// --- Runtime re-exports ----------------------------------------------------

pub use wayfinder_runtime::{
    AttachState, ChangeEvent, ChangeListener, Controller, DetailRouter, DroppedEntry, HostBinding,
    LifecycleObserver, MasterDetail, MasterDetailConfig, MasterRouter, Registry, RestoreReport,
    Router, RouterSavedState, Screen, ScreenCtx, Transaction, save_router,
};

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        ChangeHandler, Container, Controller, HostBinding, InstantChangeHandler, RetainViewMode,
        Router, Screen, ScreenCtx, Transaction, View,
    };

    pub use crate::{core, runtime};
}

pub use wayfinder_core as core;
pub use wayfinder_runtime as runtime;
