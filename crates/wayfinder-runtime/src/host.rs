//! Binding routers to a host.
//!
//! The host is whatever owns the process's UI surface: it supplies root
//! containers, forwards its own lifecycle (attach, detach, configuration
//! loss, destruction), and routes back requests. A [`HostBinding`] is
//! installed once on the main thread; every root [`Router`] is obtained
//! through it, so all routers under one host share the same thread marker
//! and hear the same lifecycle signals.

use std::cell::RefCell;
use std::rc::Rc;

use wayfinder_core::{Container, MainThreadMarker};

use crate::persistence::{self, Registry, RestoreReport, RouterSavedState};
use crate::router::Router;

struct HostState {
    marker: MainThreadMarker,
    routers: Vec<Router>,
    attached: bool,
    destroyed: bool,
}

/// The single entry point tying routers to a host.
#[derive(Clone)]
pub struct HostBinding {
    state: Rc<RefCell<HostState>>,
}

impl HostBinding {
    /// Install a binding on the current thread. Every operation on the
    /// binding and its routers must happen on this thread afterwards.
    #[must_use]
    pub fn install() -> Self {
        Self {
            state: Rc::new(RefCell::new(HostState {
                marker: MainThreadMarker::capture(),
                routers: Vec::new(),
                attached: false,
                destroyed: false,
            })),
        }
    }

    fn ensure_usable(&self, operation: &str) {
        let state = self.state.borrow();
        state.marker.ensure(operation);
        assert!(
            !state.destroyed,
            "{operation} on a host binding that was already destroyed"
        );
    }

    /// The root router for `container`, created on first request.
    ///
    /// Asking again with the same container returns the same router.
    /// Asking with a recreated container of the same name, after the old
    /// one died, rebinds the existing router to it, which is how a stack
    /// survives the host rebuilding its layout.
    pub fn router(&self, container: &Container) -> Router {
        self.ensure_usable("router");
        let (marker, attached, existing) = {
            let state = self.state.borrow();
            let same = state
                .routers
                .iter()
                .find(|r| r.host_container().is_some_and(|c| c.same_as(container)));
            let name = container.name();
            let by_name = state.routers.iter().find(|r| {
                r.host_container().is_none() && r.host_name().as_deref() == Some(name.as_str())
            });
            (
                state.marker,
                state.attached,
                same.or(by_name).cloned(),
            )
        };
        if let Some(router) = existing {
            if router.host_container().is_none() {
                router.rebind_host(container);
            }
            return router;
        }
        let router = Router::new_root(marker, container, attached);
        self.state.borrow_mut().routers.push(router.clone());
        router
    }

    /// Like [`router`](HostBinding::router), but populates a first-time
    /// router from saved state. A router that already has a backstack (the
    /// host recreated its layout without the process dying) is returned
    /// untouched with a clean report.
    pub fn router_with_state(
        &self,
        container: &Container,
        saved: &RouterSavedState,
        registry: &Registry,
    ) -> (Router, RestoreReport) {
        let router = self.router(container);
        if router.has_root_controller() {
            return (router, RestoreReport::default());
        }
        let report = persistence::restore_router_into(&router, saved, registry);
        (router, report)
    }

    /// All root routers created so far.
    #[must_use]
    pub fn routers(&self) -> Vec<Router> {
        self.state.borrow().routers.clone()
    }

    /// Route a back request to the most recently created root router first.
    /// Returns whether any router consumed it.
    pub fn handle_back(&self) -> bool {
        self.ensure_usable("handle_back");
        let routers = self.routers();
        routers.iter().rev().any(|router| router.handle_back())
    }

    // ── Host lifecycle signals ──────────────────────────────────────────

    /// The host started showing UI. Routers attach whatever their stacks
    /// say should be visible.
    pub fn on_host_attach(&self) {
        self.ensure_usable("on_host_attach");
        self.state.borrow_mut().attached = true;
        for router in self.routers() {
            router.host_became_available();
        }
    }

    /// The host stopped showing UI but may come back. Screens detach and
    /// are flagged for reattach; views are kept.
    pub fn on_host_detach(&self) {
        self.ensure_usable("on_host_detach");
        self.state.borrow_mut().attached = false;
        for router in self.routers() {
            router.host_unavailable();
        }
    }

    /// The host context is being torn down and rebuilt (a configuration
    /// change). Screens get the context-loss notification; views are
    /// released per retain mode when `release_views`.
    pub fn on_host_configuration_lost(&self, release_views: bool) {
        self.ensure_usable("on_host_configuration_lost");
        self.state.borrow_mut().attached = false;
        for router in self.routers() {
            router.host_config_lost(release_views);
        }
    }

    /// The host is going away for good. Every router and controller under
    /// the binding is destroyed; the binding refuses further use.
    pub fn on_host_destroy(&self) {
        {
            let state = self.state.borrow();
            state.marker.ensure("on_host_destroy");
            if state.destroyed {
                return;
            }
        }
        let routers = {
            let mut state = self.state.borrow_mut();
            state.destroyed = true;
            state.attached = false;
            std::mem::take(&mut state.routers)
        };
        for router in routers {
            router.destroy_router();
        }
    }

    /// Serialize every root router, paired with its container name, for
    /// [`router_with_state`](HostBinding::router_with_state) after a
    /// process restart.
    #[must_use]
    pub fn save_state(&self) -> Vec<(Option<String>, RouterSavedState)> {
        self.routers()
            .iter()
            .map(|router| (router.host_name(), persistence::save_router(router)))
            .collect()
    }
}

impl std::fmt::Debug for HostBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("HostBinding")
            .field("routers", &state.routers.len())
            .field("attached", &state.attached)
            .field("destroyed", &state.destroyed)
            .finish()
    }
}
