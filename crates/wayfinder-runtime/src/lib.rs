#![forbid(unsafe_code)]

//! Wayfinder Runtime
//!
//! This crate provides the navigation engine that ties the core primitives
//! into a complete backstack framework.
//!
//! # Key Components
//!
//! - [`HostBinding`] - Entry point binding routers to a host's containers
//!   and lifecycle
//! - [`Router`] - One backstack, reconciled against its host container
//! - [`Transaction`] - A backstack entry: screen, transitions, tag
//! - [`Screen`] - Trait for navigable units of UI
//! - [`Controller`] - Engine-side lifecycle machine wrapped around a screen
//! - [`MasterDetail`] - Two logical stacks projected onto one- or two-pane
//!   layouts
//! - [`Registry`] - Factories for restoring screens and change handlers
//!
//! # Role in Wayfinder
//! `wayfinder-runtime` is the orchestrator. It consumes containers and
//! change handlers from `wayfinder-core`, owns every backstack mutation,
//! and guarantees the lifecycle ordering screens rely on: one attached
//! screen per container, outgoing detach before incoming attach, exactly
//! one completion per transition.

pub mod change_coordinator;
pub mod controller;
pub mod host;
pub mod master_detail;
pub mod persistence;
pub mod router;
pub mod screen;
pub mod transaction;

pub use change_coordinator::{ChangeEvent, ChangeListener};
pub use controller::{Controller, LifecycleObserver};
pub use host::HostBinding;
pub use master_detail::{DetailRouter, MasterDetail, MasterDetailConfig, MasterRouter};
pub use persistence::{
    ChildRouterSavedState, ControllerSavedState, DroppedEntry, HandlerSavedState, Registry,
    RestoreReport, RouterSavedState, TransactionSavedState, save_router,
};
pub use router::Router;
pub use screen::{Screen, ScreenCtx};
pub use transaction::{AttachState, Transaction};
