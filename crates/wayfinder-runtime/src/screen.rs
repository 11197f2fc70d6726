//! The `Screen` trait: the unit of navigable UI.
//!
//! A screen owns a view, reacts to lifecycle transitions through hook
//! methods, and may host child routers inside named containers of its view.
//! The runtime wraps every screen in a [`Controller`](crate::Controller),
//! which drives the state machine; screens only ever see their own hooks
//! fire in the documented order.
//!
//! # Hook order
//!
//! Attach: `will_attach` → `on_context_available` (once per context
//! acquisition) → `did_attach`. Detach: `will_detach` → `did_detach`,
//! followed — only when the retain mode releases the view — by
//! `will_destroy_view` → view-state save → `did_destroy_view`. Final
//! destruction fires `will_destroy` → `did_destroy` after every child
//! router has been torn down.

use serde_json::Value;
use wayfinder_core::{Container, RetainViewMode, View};

use crate::controller::Controller;
use crate::router::Router;

/// A navigable unit of UI with its own lifecycle and optional child routers.
///
/// Implementations are `'static` because screens are owned by backstacks
/// that outlive any borrow. All hooks run on the main thread.
pub trait Screen: 'static {
    /// Stable type identifier, used as the persistence key for
    /// reconstructing this screen on state restore.
    fn screen_type(&self) -> &'static str;

    /// Build this screen's view. Declare any child containers on the view
    /// here; child routers are bound to them from `did_attach`.
    fn build_view(&mut self, ctx: &mut ScreenCtx<'_>) -> View;

    /// Host context became available. Fires once per context acquisition,
    /// between `will_attach` and `did_attach` of the first attach.
    fn on_context_available(&mut self, _ctx: &mut ScreenCtx<'_>) {}

    /// Host context was lost (host torn down or recreated). Fires exactly
    /// once per loss, on every screen transitively under the router.
    fn on_context_unavailable(&mut self) {}

    fn will_attach(&mut self, _ctx: &mut ScreenCtx<'_>) {}

    fn did_attach(&mut self, _ctx: &mut ScreenCtx<'_>) {}

    fn will_detach(&mut self, _ctx: &mut ScreenCtx<'_>) {}

    fn did_detach(&mut self, _ctx: &mut ScreenCtx<'_>) {}

    fn will_destroy_view(&mut self) {}

    fn did_destroy_view(&mut self) {}

    fn will_destroy(&mut self) {}

    fn did_destroy(&mut self) {}

    /// Consume a back request. Child routers are consulted first; this hook
    /// only fires if none of them handled it. Return `true` to stop
    /// propagation.
    fn handle_back(&mut self, _ctx: &mut ScreenCtx<'_>) -> bool {
        false
    }

    /// Whether this screen's view survives a detach. Sampled when the
    /// controller is created; changeable later through
    /// [`Controller::set_retain_view_mode`].
    fn retain_view_mode(&self) -> RetainViewMode {
        RetainViewMode::default()
    }

    /// Persist screen state as an opaque blob. `Value::Null` means "no
    /// state"; the registered factory receives the blob on restore.
    fn save_state(&self) -> Value {
        Value::Null
    }

    /// Convenience for factories: repopulate from a blob produced by
    /// [`save_state`](Self::save_state). The runtime itself never calls
    /// this; registered factories are expected to.
    fn restore_state(&mut self, _state: &Value) {}

    /// Persist transient view state (scroll offsets and the like) before
    /// the view is destroyed.
    fn save_view_state(&self, _view: &View) -> Value {
        Value::Null
    }

    /// Repopulate a freshly built view from saved view state.
    fn restore_view_state(&mut self, _view: &mut View, _state: &Value) {}
}

/// Capabilities handed to screen hooks.
///
/// Borrowed from the controller for the duration of one hook invocation;
/// everything it exposes is re-entrant-safe with respect to the running
/// hook (the screen itself is checked out while its hook runs).
pub struct ScreenCtx<'a> {
    controller: &'a Controller,
}

impl<'a> ScreenCtx<'a> {
    pub(crate) fn new(controller: &'a Controller) -> Self {
        Self { controller }
    }

    /// The controller wrapping this screen.
    #[must_use]
    pub fn controller(&self) -> &Controller {
        self.controller
    }

    #[must_use]
    pub fn instance_id(&self) -> u64 {
        self.controller.instance_id()
    }

    /// The router owning this screen, if it is currently in a backstack.
    #[must_use]
    pub fn router(&self) -> Option<Router> {
        self.controller.router()
    }

    /// Get or create the child router bound to `container`.
    ///
    /// Child routers are keyed by container name: asking again with a
    /// recreated container of the same name rebinds the existing router
    /// (and re-attaches anything flagged as needing attach) instead of
    /// creating a new one.
    pub fn child_router(&mut self, container: &Container) -> Router {
        self.controller.ensure_child_router(container)
    }

    /// Look up an existing child router by its container name without
    /// creating or rebinding anything.
    #[must_use]
    pub fn named_child_router(&self, host_name: &str) -> Option<Router> {
        self.controller
            .child_routers()
            .into_iter()
            .find(|r| r.host_name().as_deref() == Some(host_name))
    }

    /// All child routers, in creation order.
    #[must_use]
    pub fn child_routers(&self) -> Vec<Router> {
        self.controller.child_routers()
    }

    /// Run `f` against this screen's view, if one exists. Returns `None`
    /// when no view exists (before `build_view`, or during view
    /// destruction).
    pub fn with_view<R>(&self, f: impl FnOnce(&mut View) -> R) -> Option<R> {
        self.controller.with_view(f)
    }

    /// A named container declared on this screen's view.
    #[must_use]
    pub fn view_container(&self, name: &str) -> Option<Container> {
        self.controller
            .with_view(|view| view.container(name))
            .flatten()
    }
}

impl std::fmt::Debug for ScreenCtx<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreenCtx")
            .field("instance_id", &self.controller.instance_id())
            .finish()
    }
}
