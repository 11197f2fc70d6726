#![forbid(unsafe_code)]

//! Wayfinder Core
//!
//! Leaf types shared by the navigation runtime: the abstract view/container
//! model, the screen lifecycle state machine, the change-handler contract
//! used for visual transitions, stable id generation, and the main-thread
//! guard.
//!
//! # Role in Wayfinder
//! `wayfinder-core` knows nothing about routers or backstacks. It models the
//! pieces a host platform would normally provide — view trees, containers,
//! transition handlers — just abstractly enough that the reconciliation
//! engine in `wayfinder-runtime` can be driven entirely from tests.

pub mod change_handler;
pub mod id;
pub mod lifecycle;
pub mod logging;
pub mod thread_guard;
pub mod view;

// With tracing enabled the real macros live at the crate root, mirroring the
// no-op exports from `logging` when it is disabled.
#[cfg(feature = "tracing")]
pub use tracing::{debug, trace, warn};

pub use change_handler::{
    ChangeContext, ChangeDone, ChangeHandler, ChangeOutcome, FinishFn, INSTANT_HANDLER_KIND,
    InstantChangeHandler, SettleHandle,
};
pub use id::{next_id, reserve_ids_through};
pub use lifecycle::{LifecycleEvent, LifecycleState, RetainViewMode};
pub use thread_guard::MainThreadMarker;
pub use view::{Container, ContainerId, View, ViewId, WeakContainer};
