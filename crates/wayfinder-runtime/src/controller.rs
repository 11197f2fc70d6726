//! Controller: the engine-side wrapper around a [`Screen`].
//!
//! A controller owns the screen's lifecycle state machine, its view, and
//! its child routers. Controllers are shared handles (`Rc` internally);
//! cloning one clones the handle, not the screen. All state transitions are
//! driven by the router/coordinator — screens never mutate their own
//! lifecycle.
//!
//! The attached state is granted in exactly one place
//! ([`complete_attach`](Controller::complete_attach), called by the change
//! coordinator), which is what makes the one-attached-screen-per-container
//! invariant structural rather than checked.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;
use wayfinder_core::{LifecycleEvent, LifecycleState, MainThreadMarker, RetainViewMode, View, ViewId};

use crate::router::{Router, WeakRouterState};
use crate::screen::{Screen, ScreenCtx};

/// Observes a controller's lifecycle transitions from outside.
///
/// Observers receive the same transitions as the screen's own hooks, in the
/// same order, immediately before the corresponding hook fires.
pub trait LifecycleObserver {
    fn on_lifecycle(&self, controller: &Controller, event: LifecycleEvent);
}

pub(crate) struct ControllerState {
    instance_id: u64,
    screen_type: &'static str,
    /// `None` only while a hook is running (the screen is checked out).
    screen: Option<Box<dyn Screen>>,
    lifecycle: LifecycleState,
    view: Option<View>,
    retain_view: RetainViewMode,
    needs_attach: bool,
    context_available: bool,
    being_destroyed: bool,
    child_routers: Vec<Router>,
    owning_router: Option<WeakRouterState>,
    observers: Vec<Rc<dyn LifecycleObserver>>,
    saved_view_state: Option<Value>,
}

/// Shared handle to a screen plus its lifecycle machine.
#[derive(Clone)]
pub struct Controller {
    inner: Rc<RefCell<ControllerState>>,
}

impl Controller {
    /// Wrap a screen. The retain-view mode is sampled from the screen.
    #[must_use]
    pub fn new(screen: Box<dyn Screen>) -> Self {
        let retain = screen.retain_view_mode();
        Self::build(screen, wayfinder_core::next_id(), retain, false, None)
    }

    pub(crate) fn restored(
        screen: Box<dyn Screen>,
        instance_id: u64,
        retain: RetainViewMode,
        needs_attach: bool,
        saved_view_state: Option<Value>,
    ) -> Self {
        Self::build(screen, instance_id, retain, needs_attach, saved_view_state)
    }

    fn build(
        screen: Box<dyn Screen>,
        instance_id: u64,
        retain: RetainViewMode,
        needs_attach: bool,
        saved_view_state: Option<Value>,
    ) -> Self {
        let screen_type = screen.screen_type();
        Self {
            inner: Rc::new(RefCell::new(ControllerState {
                instance_id,
                screen_type,
                screen: Some(screen),
                lifecycle: LifecycleState::Initialized,
                view: None,
                retain_view: retain,
                needs_attach,
                context_available: false,
                being_destroyed: false,
                child_routers: Vec::new(),
                owning_router: None,
                observers: Vec::new(),
                saved_view_state,
            })),
        }
    }

    // ── Queries ─────────────────────────────────────────────────────────

    #[must_use]
    pub fn instance_id(&self) -> u64 {
        self.inner.borrow().instance_id
    }

    #[must_use]
    pub fn screen_type(&self) -> &'static str {
        self.inner.borrow().screen_type
    }

    #[must_use]
    pub fn lifecycle(&self) -> LifecycleState {
        self.inner.borrow().lifecycle
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.lifecycle().is_attached()
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.lifecycle().is_destroyed()
    }

    #[must_use]
    pub fn has_view(&self) -> bool {
        self.inner.borrow().view.is_some()
    }

    #[must_use]
    pub fn view_id(&self) -> Option<ViewId> {
        self.inner.borrow().view.as_ref().map(View::id)
    }

    #[must_use]
    pub fn needs_attach(&self) -> bool {
        self.inner.borrow().needs_attach
    }

    pub(crate) fn set_needs_attach(&self, needs: bool) {
        self.inner.borrow_mut().needs_attach = needs;
    }

    #[must_use]
    pub fn retain_view_mode(&self) -> RetainViewMode {
        self.inner.borrow().retain_view
    }

    pub fn set_retain_view_mode(&self, mode: RetainViewMode) {
        self.inner.borrow_mut().retain_view = mode;
    }

    /// The router owning this controller, if it is in a backstack.
    #[must_use]
    pub fn router(&self) -> Option<Router> {
        let weak = self.inner.borrow().owning_router.clone()?;
        weak.upgrade().map(Router::from_state)
    }

    /// Child routers, in creation order.
    #[must_use]
    pub fn child_routers(&self) -> Vec<Router> {
        self.inner.borrow().child_routers.clone()
    }

    /// Identity comparison: two handles to the same controller.
    #[must_use]
    pub fn same_as(&self, other: &Controller) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn add_lifecycle_observer(&self, observer: Rc<dyn LifecycleObserver>) {
        self.inner.borrow_mut().observers.push(observer);
    }

    /// Run `f` against the view, if one exists.
    pub fn with_view<R>(&self, f: impl FnOnce(&mut View) -> R) -> Option<R> {
        self.inner.borrow_mut().view.as_mut().map(f)
    }

    // ── Internal plumbing ───────────────────────────────────────────────

    pub(crate) fn downgrade(&self) -> WeakController {
        WeakController {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub(crate) fn set_owning_router(&self, router: Option<WeakRouterState>) {
        self.inner.borrow_mut().owning_router = router;
    }

    pub(crate) fn owned_by(&self, router: &Router) -> bool {
        match &self.inner.borrow().owning_router {
            Some(weak) => router.is_state(weak),
            None => false,
        }
    }

    pub(crate) fn marker(&self) -> MainThreadMarker {
        match self.router() {
            Some(router) => router.marker(),
            None => MainThreadMarker::capture(),
        }
    }

    pub(crate) fn add_child_router(&self, router: Router) {
        self.inner.borrow_mut().child_routers.push(router);
    }

    /// Check the screen out of the cell, run `f` with it and a hook
    /// context, and check it back in. Hooks for a controller must not
    /// re-enter that same controller's hooks.
    pub(crate) fn with_screen<R>(
        &self,
        f: impl FnOnce(&mut dyn Screen, &mut ScreenCtx<'_>) -> R,
    ) -> R {
        let mut screen = self
            .inner
            .borrow_mut()
            .screen
            .take()
            .expect("screen hook re-entered for the same controller");
        let mut ctx = ScreenCtx::new(self);
        let result = f(screen.as_mut(), &mut ctx);
        self.inner.borrow_mut().screen = Some(screen);
        result
    }

    pub(crate) fn notify(&self, event: LifecycleEvent) {
        let observers = self.inner.borrow().observers.clone();
        for observer in &observers {
            observer.on_lifecycle(self, event);
        }
    }

    /// Get or create the child router for `container`, keyed by container
    /// name.
    pub(crate) fn ensure_child_router(&self, container: &wayfinder_core::Container) -> Router {
        let name = container.name();
        let existing = self
            .child_routers()
            .into_iter()
            .find(|r| r.host_name().as_deref() == Some(name.as_str()));
        match existing {
            Some(router) => {
                router.rebind_host(container);
                router
            }
            None => {
                let router = Router::new_child(self.marker(), self.downgrade(), container);
                self.add_child_router(router.clone());
                if self.is_attached() {
                    router.host_became_available();
                }
                router
            }
        }
    }

    // ── Lifecycle transitions ───────────────────────────────────────────

    /// Build the view if none exists. Returns the view id, or `None` when
    /// the controller is destroyed.
    pub(crate) fn ensure_view(&self) -> Option<ViewId> {
        {
            let state = self.inner.borrow();
            if state.lifecycle.is_destroyed() {
                return None;
            }
            if let Some(view) = &state.view {
                return Some(view.id());
            }
        }
        let mut view = self.with_screen(|screen, ctx| screen.build_view(ctx));
        let saved = self.inner.borrow_mut().saved_view_state.take();
        if let Some(saved) = saved {
            self.with_screen(|screen, _| screen.restore_view_state(&mut view, &saved));
        }
        let id = view.id();
        {
            let mut state = self.inner.borrow_mut();
            state.view = Some(view);
            state.lifecycle = LifecycleState::ViewCreated;
        }
        self.notify(LifecycleEvent::DidCreateView);
        Some(id)
    }

    pub(crate) fn fire_will_attach(&self) {
        if self.is_destroyed() || self.is_attached() {
            return;
        }
        self.notify(LifecycleEvent::WillAttach);
        self.with_screen(|screen, ctx| screen.will_attach(ctx));
    }

    /// Grant the attached state. Only the change coordinator (and rebind
    /// paths that go through it) call this.
    pub(crate) fn complete_attach(&self) {
        {
            let state = self.inner.borrow();
            if state.lifecycle.is_destroyed()
                || state.lifecycle.is_attached()
                || state.view.is_none()
            {
                return;
            }
        }
        let first_context = {
            let mut state = self.inner.borrow_mut();
            !std::mem::replace(&mut state.context_available, true)
        };
        if first_context {
            self.notify(LifecycleEvent::ContextAvailable);
            self.with_screen(|screen, ctx| screen.on_context_available(ctx));
        }
        {
            let mut state = self.inner.borrow_mut();
            state.lifecycle = LifecycleState::Attached;
            state.needs_attach = false;
        }
        self.notify(LifecycleEvent::DidAttach);
        self.with_screen(|screen, ctx| screen.did_attach(ctx));
        for child in self.child_routers() {
            child.host_became_available();
        }
    }

    pub(crate) fn fire_will_detach(&self) {
        if !self.is_attached() {
            return;
        }
        self.notify(LifecycleEvent::WillDetach);
        self.with_screen(|screen, ctx| screen.will_detach(ctx));
    }

    /// Revoke the attached state. Children deactivate first; the view is
    /// released afterwards when `release_per_policy` and the retain mode
    /// says so.
    pub(crate) fn complete_detach(&self, release_per_policy: bool) {
        if !self.is_attached() {
            return;
        }
        for child in self.child_routers() {
            child.host_unavailable();
        }
        self.inner.borrow_mut().lifecycle = LifecycleState::ViewCreated;
        self.notify(LifecycleEvent::DidDetach);
        self.with_screen(|screen, ctx| screen.did_detach(ctx));
        if release_per_policy && self.retain_view_mode().releases_on_detach() {
            self.release_view(true);
        }
    }

    /// Detach immediately, including the visual detach. Used by
    /// reconciliation bookkeeping paths that bypass the coordinator.
    pub(crate) fn force_detach(&self, container: Option<&wayfinder_core::Container>) {
        if !self.is_attached() {
            return;
        }
        self.fire_will_detach();
        if let (Some(container), Some(view)) = (container, self.view_id()) {
            container.detach(view);
        }
        self.complete_detach(true);
    }

    /// Destroy the view (child routers release theirs first), saving view
    /// state when asked. No-op without a view.
    pub(crate) fn release_view(&self, save_state: bool) {
        let Some(mut view) = self.inner.borrow_mut().view.take() else {
            return;
        };
        for child in self.child_routers() {
            child.host_view_releasing(save_state);
        }
        self.notify(LifecycleEvent::WillDestroyView);
        self.with_screen(|screen, _| screen.will_destroy_view());
        if save_state {
            let blob = self.with_screen(|screen, _| screen.save_view_state(&view));
            if !blob.is_null() {
                self.inner.borrow_mut().saved_view_state = Some(blob);
            }
        }
        view.kill_containers();
        drop(view);
        {
            let mut state = self.inner.borrow_mut();
            if !state.lifecycle.is_destroyed() {
                state.lifecycle = LifecycleState::Initialized;
            }
        }
        self.notify(LifecycleEvent::DidDestroyView);
        self.with_screen(|screen, _| screen.did_destroy_view());
    }

    /// Tear the controller down for good. Children are destroyed
    /// depth-first before the destroy hooks fire. Idempotent.
    pub(crate) fn destroy(&self) {
        {
            let mut state = self.inner.borrow_mut();
            if state.lifecycle.is_destroyed() || state.being_destroyed {
                return;
            }
            state.being_destroyed = true;
        }
        if self.is_attached() {
            self.fire_will_detach();
            self.complete_detach(false);
        }
        self.release_view(false);
        let children = std::mem::take(&mut self.inner.borrow_mut().child_routers);
        for child in children {
            child.destroy_router();
        }
        self.notify(LifecycleEvent::WillDestroy);
        self.with_screen(|screen, _| screen.will_destroy());
        {
            let mut state = self.inner.borrow_mut();
            state.lifecycle = LifecycleState::Destroyed;
            state.owning_router = None;
        }
        self.notify(LifecycleEvent::DidDestroy);
        self.with_screen(|screen, _| screen.did_destroy());
    }

    /// Host context lost. Fires the one-shot notification, detaches if
    /// attached (flagging for reattach), recurses into children, and
    /// releases the view per retain mode when `release_views`.
    pub(crate) fn on_context_lost(&self, release_views: bool) {
        if self.is_destroyed() {
            return;
        }
        let had_context = {
            let mut state = self.inner.borrow_mut();
            std::mem::replace(&mut state.context_available, false)
        };
        if self.is_attached() {
            self.fire_will_detach();
            self.complete_detach(false);
            self.set_needs_attach(true);
        }
        if had_context {
            self.notify(LifecycleEvent::ContextUnavailable);
            self.with_screen(|screen, _| screen.on_context_unavailable());
        }
        for child in self.child_routers() {
            child.host_config_lost(release_views);
        }
        if release_views && self.retain_view_mode().releases_on_context_loss() {
            self.release_view(true);
        }
    }

    /// Depth-first back handling: most recently created child router
    /// first, then the screen's own hook.
    #[must_use]
    pub fn handle_back(&self) -> bool {
        if self.is_destroyed() {
            return false;
        }
        let children = self.child_routers();
        for child in children.iter().rev() {
            if child.handle_back() {
                return true;
            }
        }
        self.with_screen(|screen, ctx| screen.handle_back(ctx))
    }

    // ── Persistence support ─────────────────────────────────────────────

    pub(crate) fn screen_state_blob(&self) -> Value {
        self.with_screen(|screen, _| screen.save_state())
    }

    /// Current view state: freshly captured when a view exists, otherwise
    /// whatever was saved at the last view destruction.
    pub(crate) fn view_state_blob(&self) -> Option<Value> {
        if self.has_view() {
            let blob =
                self.with_screen(|screen, ctx| ctx.with_view(|view| screen.save_view_state(view)));
            blob.filter(|b| !b.is_null())
        } else {
            self.inner.borrow().saved_view_state.clone()
        }
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.borrow();
        f.debug_struct("Controller")
            .field("instance_id", &state.instance_id)
            .field("screen_type", &state.screen_type)
            .field("lifecycle", &state.lifecycle)
            .field("needs_attach", &state.needs_attach)
            .field("children", &state.child_routers.len())
            .finish()
    }
}

/// Non-owning handle to a controller.
#[derive(Clone)]
pub(crate) struct WeakController {
    inner: Weak<RefCell<ControllerState>>,
}

impl WeakController {
    pub(crate) fn upgrade(&self) -> Option<Controller> {
        self.inner.upgrade().map(|inner| Controller { inner })
    }
}
