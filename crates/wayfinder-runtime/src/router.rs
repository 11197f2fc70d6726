//! Routers: backstack owners.
//!
//! A router binds a backstack of [`Transaction`]s to one host container.
//! Every navigation operation, push, pop, replace, or a wholesale
//! [`set_backstack`](Router::set_backstack), funnels into the same
//! reconciliation: diff the old stack against the new one by transaction
//! index, classify the visible change as push or pop, destroy what left the
//! stack, and hand exactly one transition to the change coordinator.
//!
//! Routers are either roots (bound to a host container through
//! [`HostBinding`](crate::HostBinding)) or children (bound to a named
//! container inside a screen's view). Both kinds share this type; a child
//! just tracks its hosting controller and inherits its change listeners.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use wayfinder_core::{ChangeHandler, Container, InstantChangeHandler, MainThreadMarker, WeakContainer};

use crate::change_coordinator::{ChangeCoordinator, ChangeListener, PendingChange};
use crate::controller::{Controller, WeakController};
use crate::transaction::Transaction;

pub(crate) type WeakRouterState = Weak<RefCell<RouterState>>;

pub(crate) struct RouterState {
    marker: MainThreadMarker,
    backstack: Vec<Transaction>,
    host: WeakContainer,
    host_name: Option<String>,
    /// The host is in a state where visual transitions may run. Toggled by
    /// host/parent lifecycle, not by container liveness alone.
    host_available: bool,
    pops_last_view: bool,
    is_detail: bool,
    parent: Option<WeakController>,
    listeners: Vec<(u64, Rc<dyn ChangeListener>)>,
    next_listener_id: u64,
    coordinator: ChangeCoordinator,
    destroyed: bool,
}

/// Shared handle to one backstack and its host container.
#[derive(Clone)]
pub struct Router {
    state: Rc<RefCell<RouterState>>,
}

impl Router {
    fn build(
        marker: MainThreadMarker,
        host: WeakContainer,
        host_name: Option<String>,
        parent: Option<WeakController>,
        host_available: bool,
    ) -> Self {
        Self {
            state: Rc::new(RefCell::new(RouterState {
                marker,
                backstack: Vec::new(),
                host,
                host_name,
                host_available,
                pops_last_view: false,
                is_detail: false,
                parent,
                listeners: Vec::new(),
                next_listener_id: 1,
                coordinator: ChangeCoordinator::new(),
                destroyed: false,
            })),
        }
    }

    /// Root router for a host-owned container.
    pub(crate) fn new_root(
        marker: MainThreadMarker,
        container: &Container,
        host_available: bool,
    ) -> Self {
        Self::build(
            marker,
            container.downgrade(),
            Some(container.name()),
            None,
            host_available,
        )
    }

    /// Child router hosted by a screen, bound to a named container of its
    /// view. Starts unavailable; the hosting controller's attach activates
    /// it.
    pub(crate) fn new_child(
        marker: MainThreadMarker,
        parent: WeakController,
        container: &Container,
    ) -> Self {
        Self::build(
            marker,
            container.downgrade(),
            Some(container.name()),
            Some(parent),
            false,
        )
    }

    /// Child router restored from saved state before its container exists.
    /// It binds to the first same-named container the hosting screen
    /// declares.
    pub(crate) fn new_child_detached(
        marker: MainThreadMarker,
        parent: WeakController,
        host_name: Option<String>,
    ) -> Self {
        Self::build(marker, WeakContainer::dead(), host_name, Some(parent), false)
    }

    pub(crate) fn from_state(state: Rc<RefCell<RouterState>>) -> Self {
        Self { state }
    }

    pub(crate) fn is_state(&self, weak: &WeakRouterState) -> bool {
        weak.upgrade()
            .is_some_and(|state| Rc::ptr_eq(&self.state, &state))
    }

    pub(crate) fn marker(&self) -> MainThreadMarker {
        self.state.borrow().marker
    }

    fn ensure_main(&self, operation: &str) {
        self.state.borrow().marker.ensure(operation);
    }

    fn coordinator(&self) -> ChangeCoordinator {
        self.state.borrow().coordinator.clone()
    }

    // ── Queries ─────────────────────────────────────────────────────────

    /// Snapshot of the backstack, bottom to top.
    #[must_use]
    pub fn backstack(&self) -> Vec<Transaction> {
        self.state.borrow().backstack.clone()
    }

    #[must_use]
    pub fn backstack_len(&self) -> usize {
        self.state.borrow().backstack.len()
    }

    #[must_use]
    pub fn has_root_controller(&self) -> bool {
        self.backstack_len() > 0
    }

    /// The name of the container this router is bound to.
    #[must_use]
    pub fn host_name(&self) -> Option<String> {
        self.state.borrow().host_name.clone()
    }

    pub(crate) fn host_container(&self) -> Option<Container> {
        self.state.borrow().host.upgrade_live()
    }

    /// The controller hosting this router, for child routers.
    #[must_use]
    pub fn parent_controller(&self) -> Option<Controller> {
        let parent = self.state.borrow().parent.clone()?;
        parent.upgrade()
    }

    /// Whether popping the only remaining entry removes its view. Roots of
    /// an app usually leave this `false` so back on the last screen falls
    /// through to the host.
    #[must_use]
    pub fn pops_last_view(&self) -> bool {
        self.state.borrow().pops_last_view
    }

    pub fn set_pops_last_view(&self, pops: bool) {
        self.state.borrow_mut().pops_last_view = pops;
    }

    #[must_use]
    pub fn is_detail(&self) -> bool {
        self.state.borrow().is_detail
    }

    pub(crate) fn set_is_detail(&self, is_detail: bool) {
        self.state.borrow_mut().is_detail = is_detail;
    }

    /// A transition is currently in flight on this router's container.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.state.borrow().coordinator.is_busy()
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.state.borrow().destroyed
    }

    /// Most recently pushed entry with this tag, if any. Tags are not
    /// unique; the topmost match wins.
    #[must_use]
    pub fn controller_with_tag(&self, tag: &str) -> Option<Controller> {
        self.state
            .borrow()
            .backstack
            .iter()
            .rev()
            .find(|t| t.tag_ref() == Some(tag))
            .map(Transaction::controller)
    }

    /// Search this router and every transitive child router for a
    /// controller by instance id.
    #[must_use]
    pub fn controller_with_instance_id(&self, instance_id: u64) -> Option<Controller> {
        for transaction in self.backstack() {
            let controller = transaction.controller();
            if controller.instance_id() == instance_id {
                return Some(controller);
            }
            for child in controller.child_routers() {
                if let Some(found) = child.controller_with_instance_id(instance_id) {
                    return Some(found);
                }
            }
        }
        None
    }

    // ── Listeners ───────────────────────────────────────────────────────

    /// Register a change listener. Returns a handle for removal.
    pub fn add_change_listener(&self, listener: Rc<dyn ChangeListener>) -> u64 {
        let mut state = self.state.borrow_mut();
        let id = state.next_listener_id;
        state.next_listener_id += 1;
        state.listeners.push((id, listener));
        id
    }

    pub fn remove_change_listener(&self, id: u64) {
        self.state.borrow_mut().listeners.retain(|(i, _)| *i != id);
    }

    /// This router's listeners plus those inherited from the hosting
    /// controller's own router, outermost last.
    fn listener_handles(&self) -> Vec<Rc<dyn ChangeListener>> {
        let (mut out, parent) = {
            let state = self.state.borrow();
            (
                state
                    .listeners
                    .iter()
                    .map(|(_, l)| l.clone())
                    .collect::<Vec<_>>(),
                state.parent.clone(),
            )
        };
        if let Some(parent) = parent.and_then(|p| p.upgrade())
            && let Some(router) = parent.router()
        {
            out.extend(router.listener_handles());
        }
        out
    }

    // ── Navigation ──────────────────────────────────────────────────────

    /// Push a new entry on top.
    pub fn push_controller(&self, transaction: Transaction) {
        let mut stack = self.backstack();
        stack.push(transaction);
        self.set_backstack(stack, None);
    }

    /// Pop the top entry.
    ///
    /// Returns `false` when the top is the only entry and
    /// [`pops_last_view`](Router::pops_last_view) is off, so a back request
    /// can keep propagating to the host.
    ///
    /// # Panics
    /// Panics when the backstack is empty.
    pub fn pop_current_controller(&self) -> bool {
        self.ensure_main("pop_current_controller");
        let (len, pops_last) = {
            let state = self.state.borrow();
            (state.backstack.len(), state.pops_last_view)
        };
        assert!(
            len > 0,
            "Trying to pop the current controller when there are none on the backstack"
        );
        if len == 1 && !pops_last {
            return false;
        }
        let mut stack = self.backstack();
        stack.pop();
        self.set_backstack(stack, None);
        true
    }

    /// Pop a specific controller out of the stack, wherever it sits.
    /// Popping a non-top entry is silent bookkeeping. Returns whether the
    /// controller was found.
    pub fn pop_controller(&self, controller: &Controller) -> bool {
        let stack = self.backstack();
        let Some(position) = stack
            .iter()
            .position(|t| t.controller().same_as(controller))
        else {
            return false;
        };
        if position + 1 == stack.len() {
            self.pop_current_controller()
        } else {
            let mut stack = stack;
            stack.remove(position);
            self.set_backstack(stack, None);
            true
        }
    }

    /// Replace the top entry, or act as a root push on an empty stack.
    pub fn replace_top_controller(&self, transaction: Transaction) {
        let mut stack = self.backstack();
        stack.pop();
        stack.push(transaction);
        self.set_backstack(stack, None);
    }

    /// Clear the stack down to this one entry.
    pub fn set_root(&self, transaction: Transaction) {
        self.set_backstack(vec![transaction], None);
    }

    /// Pop everything above the bottom entry. Returns whether anything was
    /// popped.
    pub fn pop_to_root(&self) -> bool {
        let mut stack = self.backstack();
        if stack.len() <= 1 {
            return false;
        }
        stack.truncate(1);
        self.set_backstack(stack, None);
        true
    }

    /// Pop everything above the topmost entry carrying `tag`. Returns
    /// `false` when no entry matches.
    pub fn pop_to_tag(&self, tag: &str) -> bool {
        let stack = self.backstack();
        let Some(position) = stack.iter().rposition(|t| t.tag_ref() == Some(tag)) else {
            return false;
        };
        let mut stack = stack;
        stack.truncate(position + 1);
        self.set_backstack(stack, None);
        true
    }

    /// Pop everything above `transaction`. Returns `false` when the entry
    /// is not in this backstack.
    pub fn pop_to_transaction(&self, transaction: &Transaction) -> bool {
        let stack = self.backstack();
        let Some(position) = stack.iter().position(|t| t.index() == transaction.index()) else {
            return false;
        };
        let mut stack = stack;
        stack.truncate(position + 1);
        self.set_backstack(stack, None);
        true
    }

    /// Route a back request: the top screen (and its children, depth-first)
    /// gets first refusal, then the router pops. Returns whether the
    /// request was consumed.
    pub fn handle_back(&self) -> bool {
        self.ensure_main("handle_back");
        let top = self.state.borrow().backstack.last().map(Transaction::controller);
        let Some(top) = top else {
            return false;
        };
        if top.handle_back() {
            return true;
        }
        self.pop_current_controller()
    }

    // ── Reconciliation ──────────────────────────────────────────────────

    /// Install a whole new backstack and reconcile it against the current
    /// one.
    ///
    /// Entries are matched by transaction index. Entries that leave the
    /// stack are destroyed (unless another router adopted their controller
    /// first). When the top entry is unchanged, no transition runs at all;
    /// otherwise exactly one change is handed to the coordinator, a push
    /// when the new top was not in the old stack and a pop when it was,
    /// using `handler_override` or the relevant entry's own handler.
    ///
    /// On a destroyed router this logs a warning and does nothing.
    pub fn set_backstack(
        &self,
        mut new_backstack: Vec<Transaction>,
        handler_override: Option<Box<dyn ChangeHandler>>,
    ) {
        self.ensure_main("set_backstack");
        if self.state.borrow().destroyed {
            tracing::warn!(
                host = ?self.host_name(),
                "set_backstack on a destroyed router; ignoring"
            );
            return;
        }
        for transaction in &new_backstack {
            transaction.ensure_index();
        }

        let (old, host, host_available, is_detail) = {
            let state = self.state.borrow();
            (
                state.backstack.clone(),
                state.host.clone(),
                state.host_available,
                state.is_detail,
            )
        };

        let new_ids: Vec<u64> = new_backstack.iter().map(Transaction::index).collect();
        {
            let mut deduped = new_ids.clone();
            deduped.sort_unstable();
            deduped.dedup();
            assert!(
                deduped.len() == new_ids.len(),
                "the same transaction appears more than once in the backstack"
            );
        }
        let old_ids: Vec<u64> = old.iter().map(Transaction::index).collect();
        let old_top = old.last().cloned();
        let new_top = new_backstack.last().cloned();
        let top_unchanged = match (&old_top, &new_top) {
            (Some(a), Some(b)) => a.index() == b.index(),
            (None, None) => true,
            _ => false,
        };

        let live = host.upgrade_live();
        let use_coordinator = !top_unchanged && live.is_some() && host_available;

        // The old top is the outgoing controller even when it has not
        // attached yet (a change for it may still be in flight or queued);
        // detach delivery is state-guarded, so a top that never attaches
        // passes through the transition untouched.
        let from = old_top.as_ref().map(Transaction::controller);
        let destroy_from = match &old_top {
            Some(t) => !new_ids.contains(&t.index()) && t.controller().owned_by(self),
            None => false,
        };

        // Adopt the new stack before destroying anything, so controllers
        // handed over from another router (master/detail repartitioning)
        // are seen as adopted by the time the old owner reconciles.
        let weak_self = Rc::downgrade(&self.state);
        for transaction in &mut new_backstack {
            if !old_ids.contains(&transaction.index()) {
                transaction.mark_pushed();
            }
            if is_detail {
                transaction.set_detail_flag(true);
            }
            transaction
                .controller()
                .set_owning_router(Some(weak_self.clone()));
        }
        self.state.borrow_mut().backstack = new_backstack;

        for transaction in &old {
            if new_ids.contains(&transaction.index()) {
                continue;
            }
            let controller = transaction.controller();
            if !controller.owned_by(self) {
                // Another router adopted this controller; it lives on there
                // and stays pushed.
                continue;
            }
            transaction.mark_popped();
            let is_visible_top = old_top
                .as_ref()
                .is_some_and(|t| t.index() == transaction.index());
            if is_visible_top && use_coordinator && from.is_some() {
                // The coordinator destroys the outgoing top once its exit
                // transition completes.
                continue;
            }
            controller.destroy();
        }

        if top_unchanged {
            // No visible change; just make sure nothing below the top is
            // still attached.
            let stack = self.backstack();
            for transaction in stack.iter().rev().skip(1) {
                let controller = transaction.controller();
                if controller.is_attached() {
                    controller.force_detach(live.as_ref());
                }
            }
            return;
        }

        let is_push = match &new_top {
            Some(t) => !old_ids.contains(&t.index()),
            None => false,
        };
        let handler = handler_override.unwrap_or_else(|| {
            let own = if is_push {
                new_top.as_ref().and_then(Transaction::clone_push_handler)
            } else {
                old_top.as_ref().and_then(Transaction::clone_pop_handler)
            };
            own.unwrap_or_else(|| Box::new(InstantChangeHandler))
        });

        if use_coordinator {
            let to = new_top
                .as_ref()
                .map(Transaction::controller)
                .filter(|c| !c.is_destroyed());
            let pending = PendingChange {
                from,
                to,
                is_push,
                handler,
                destroy_from,
                container: host,
                listeners: self.listener_handles(),
            };
            self.coordinator().enqueue(pending);
        } else {
            // The host cannot show anything right now. Record the intent
            // and do the lifecycle bookkeeping directly.
            if let Some(top) = &new_top {
                let controller = top.controller();
                if !controller.is_destroyed() {
                    controller.set_needs_attach(true);
                }
            }
            if let Some(from) = from {
                if destroy_from {
                    if let (Some(container), Some(view)) = (live.as_ref(), from.view_id()) {
                        container.detach(view);
                    }
                    from.destroy();
                } else {
                    from.force_detach(live.as_ref());
                }
            }
        }
    }

    /// Re-attach the top controller if it was flagged as needing attach
    /// (restored stacks, host recreation, master/detail repartitioning).
    pub fn rebind_if_needed(&self) {
        let (available, live, top) = {
            let state = self.state.borrow();
            (
                state.host_available && !state.destroyed,
                state.host.upgrade_live(),
                state.backstack.last().cloned(),
            )
        };
        if !available || live.is_none() {
            return;
        }
        let Some(top) = top else { return };
        let controller = top.controller();
        if controller.is_destroyed() || !controller.needs_attach() {
            return;
        }
        let from = {
            let state = self.state.borrow();
            state
                .backstack
                .iter()
                .rev()
                .skip(1)
                .map(Transaction::controller)
                .find(Controller::is_attached)
        };
        let handler = top
            .clone_push_handler()
            .unwrap_or_else(|| Box::new(InstantChangeHandler));
        let pending = PendingChange {
            from,
            to: Some(controller),
            is_push: true,
            handler,
            destroy_from: false,
            container: self.state.borrow().host.clone(),
            listeners: self.listener_handles(),
        };
        self.coordinator().enqueue(pending);
    }

    // ── Host plumbing ───────────────────────────────────────────────────

    /// Point this router at a recreated container of the same name.
    pub(crate) fn rebind_host(&self, container: &Container) {
        let available = {
            let mut state = self.state.borrow_mut();
            state.host = container.downgrade();
            state.host_name = Some(container.name());
            state.host_available
        };
        if available {
            self.rebind_if_needed();
        }
    }

    /// The host (or hosting screen) can show views again.
    pub(crate) fn host_became_available(&self) {
        self.state.borrow_mut().host_available = true;
        self.rebind_if_needed();
    }

    /// The host stopped showing views. In-flight transitions settle, the
    /// attached screen detaches, and everything detached is flagged for
    /// reattach. Views are kept for a quick return.
    pub(crate) fn host_unavailable(&self) {
        self.coordinator().settle_all();
        let live = {
            let mut state = self.state.borrow_mut();
            state.host_available = false;
            state.host.upgrade_live()
        };
        for transaction in self.backstack() {
            let controller = transaction.controller();
            if controller.is_attached() {
                controller.fire_will_detach();
                if let (Some(container), Some(view)) = (&live, controller.view_id()) {
                    container.detach(view);
                }
                controller.complete_detach(false);
                controller.set_needs_attach(true);
            }
        }
    }

    /// The hosting screen's view is about to be destroyed; release ours
    /// first, saving view state when asked.
    pub(crate) fn host_view_releasing(&self, save_state: bool) {
        self.coordinator().settle_all();
        for transaction in self.backstack() {
            let controller = transaction.controller();
            if controller.is_attached() {
                controller.fire_will_detach();
                controller.complete_detach(false);
                controller.set_needs_attach(true);
            }
            if controller.retain_view_mode().releases_on_context_loss() {
                controller.release_view(save_state);
            }
        }
    }

    /// The host context itself was lost (teardown with possible
    /// recreation). Every controller in the subtree gets the context-loss
    /// treatment.
    pub(crate) fn host_config_lost(&self, release_views: bool) {
        self.coordinator().settle_all();
        self.state.borrow_mut().host_available = false;
        for transaction in self.backstack() {
            transaction.controller().on_context_lost(release_views);
        }
    }

    /// Permanent teardown: settle transitions, destroy every controller top
    /// down, and refuse all further work.
    pub(crate) fn destroy_router(&self) {
        {
            let mut state = self.state.borrow_mut();
            if state.destroyed {
                return;
            }
            state.destroyed = true;
            state.host_available = false;
        }
        self.coordinator().settle_all();
        let (stack, live) = {
            let mut state = self.state.borrow_mut();
            (std::mem::take(&mut state.backstack), state.host.upgrade_live())
        };
        for transaction in stack.iter().rev() {
            transaction.mark_popped();
            let controller = transaction.controller();
            if let (Some(container), Some(view)) = (&live, controller.view_id()) {
                container.detach(view);
            }
            controller.destroy();
        }
    }

    /// Rip the backstack out without destroying anything. The caller is
    /// adopting every entry into another router.
    pub(crate) fn take_backstack_silently(&self) -> Vec<Transaction> {
        std::mem::take(&mut self.state.borrow_mut().backstack)
    }

    /// Install a restored backstack without running transitions. The top
    /// entry is flagged to attach on the next rebind.
    pub(crate) fn install_restored_backstack(&self, backstack: Vec<Transaction>) {
        let weak_self = Rc::downgrade(&self.state);
        for transaction in &backstack {
            transaction.mark_pushed();
            transaction
                .controller()
                .set_owning_router(Some(weak_self.clone()));
        }
        if let Some(top) = backstack.last() {
            top.controller().set_needs_attach(true);
        }
        self.state.borrow_mut().backstack = backstack;
        self.rebind_if_needed();
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Router")
            .field("host", &state.host_name)
            .field("depth", &state.backstack.len())
            .field("available", &state.host_available)
            .field("destroyed", &state.destroyed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::{Screen, ScreenCtx};
    use serde_json::Value;
    use wayfinder_core::View;

    struct Plain(&'static str);

    impl Screen for Plain {
        fn screen_type(&self) -> &'static str {
            self.0
        }
        fn build_view(&mut self, _ctx: &mut ScreenCtx<'_>) -> View {
            View::new(self.0)
        }
        fn save_state(&self) -> Value {
            Value::Null
        }
    }

    fn router(container: &Container) -> Router {
        Router::new_root(MainThreadMarker::capture(), container, true)
    }

    fn entry(name: &'static str) -> Transaction {
        Transaction::with_screen(Box::new(Plain(name)))
    }

    #[test]
    fn push_attaches_and_detaches_previous() {
        let container = Container::new("root");
        let router = router(&container);

        let a = entry("a");
        let a_controller = a.controller();
        router.set_root(a);
        assert!(a_controller.is_attached());
        assert_eq!(container.child_count(), 1);

        let b = entry("b");
        let b_controller = b.controller();
        router.push_controller(b);
        assert!(b_controller.is_attached());
        assert!(!a_controller.is_attached());
        // Default retain mode releases the view on detach.
        assert!(!a_controller.has_view());
        assert_eq!(container.child_count(), 1);
        assert_eq!(container.children(), vec![b_controller.view_id().unwrap()]);
    }

    #[test]
    fn pop_restores_previous_and_destroys_popped() {
        let container = Container::new("root");
        let router = router(&container);
        let a = entry("a");
        let a_controller = a.controller();
        router.set_root(a);
        let b = entry("b");
        let b_controller = b.controller();
        router.push_controller(b);

        assert!(router.pop_current_controller());
        assert!(a_controller.is_attached());
        assert!(b_controller.is_destroyed());
        assert_eq!(router.backstack_len(), 1);
    }

    #[test]
    fn removing_middle_entry_runs_no_transition() {
        let container = Container::new("root");
        let router = router(&container);
        router.set_root(entry("a"));
        let b = entry("b");
        let b_controller = b.controller();
        router.push_controller(b.clone());
        let c = entry("c");
        let c_controller = c.controller();
        router.push_controller(c);

        let mut stack = router.backstack();
        stack.remove(1);
        router.set_backstack(stack, None);

        assert_eq!(router.backstack_len(), 2);
        assert!(c_controller.is_attached());
        assert!(b_controller.is_destroyed());
        assert_eq!(b.attach_state(), crate::transaction::AttachState::Popped);
    }

    #[test]
    #[should_panic(expected = "none on the backstack")]
    fn pop_on_empty_backstack_panics() {
        let container = Container::new("root");
        router(&container).pop_current_controller();
    }

    #[test]
    fn pop_of_last_entry_respects_pops_last_view() {
        let container = Container::new("root");
        let router = router(&container);
        let a = entry("a");
        let a_controller = a.controller();
        router.set_root(a);

        assert!(!router.pop_current_controller());
        assert!(a_controller.is_attached());

        router.set_pops_last_view(true);
        assert!(router.pop_current_controller());
        assert!(a_controller.is_destroyed());
        assert_eq!(container.child_count(), 0);
    }

    #[test]
    fn handle_back_pops_until_root() {
        let container = Container::new("root");
        let router = router(&container);
        router.set_root(entry("a"));
        router.push_controller(entry("b"));

        assert!(router.handle_back());
        assert_eq!(router.backstack_len(), 1);
        // Last entry: unhandled, propagates to the host.
        assert!(!router.handle_back());
        assert_eq!(router.backstack_len(), 1);
    }

    #[test]
    fn duplicate_tags_resolve_to_most_recent() {
        let container = Container::new("root");
        let router = router(&container);
        router.set_root(entry("a").tag("dup"));
        let b = entry("b").tag("dup");
        let b_controller = b.controller();
        router.push_controller(b);

        let found = router.controller_with_tag("dup").unwrap();
        assert!(found.same_as(&b_controller));
        assert!(router.controller_with_tag("missing").is_none());
    }

    #[test]
    fn pop_to_tag_pops_above_topmost_match() {
        let container = Container::new("root");
        let router = router(&container);
        router.set_root(entry("a").tag("home"));
        router.push_controller(entry("b").tag("mid"));
        router.push_controller(entry("c"));

        assert!(router.pop_to_tag("mid"));
        assert_eq!(router.backstack_len(), 2);
        assert!(router.backstack()[1].controller().is_attached());
        assert!(!router.pop_to_tag("gone"));
    }

    #[test]
    fn set_backstack_on_destroyed_router_is_ignored() {
        let container = Container::new("root");
        let router = router(&container);
        router.set_root(entry("a"));
        router.destroy_router();
        assert!(router.is_destroyed());

        router.set_backstack(vec![entry("b")], None);
        assert_eq!(router.backstack_len(), 0);
    }

    #[test]
    fn destroy_router_destroys_top_down() {
        let container = Container::new("root");
        let router = router(&container);
        let a = entry("a");
        let a_controller = a.controller();
        router.set_root(a);
        let b = entry("b");
        let b_controller = b.controller();
        router.push_controller(b);

        router.destroy_router();
        assert!(a_controller.is_destroyed());
        assert!(b_controller.is_destroyed());
        assert_eq!(container.child_count(), 0);
    }

    #[test]
    fn unavailable_host_defers_attach_until_available() {
        let container = Container::new("root");
        let router = Router::new_root(MainThreadMarker::capture(), &container, false);
        let a = entry("a");
        let a_controller = a.controller();
        router.set_root(a);
        assert!(!a_controller.is_attached());
        assert!(a_controller.needs_attach());
        assert_eq!(container.child_count(), 0);

        router.host_became_available();
        assert!(a_controller.is_attached());
        assert!(!a_controller.needs_attach());
        assert_eq!(container.child_count(), 1);
    }

    #[test]
    fn host_unavailable_detaches_and_flags_reattach() {
        let container = Container::new("root");
        let router = router(&container);
        let a = entry("a");
        let a_controller = a.controller();
        router.set_root(a);

        router.host_unavailable();
        assert!(!a_controller.is_attached());
        assert!(a_controller.needs_attach());
        // View kept for the return trip.
        assert!(a_controller.has_view());
        assert_eq!(container.child_count(), 0);

        router.host_became_available();
        assert!(a_controller.is_attached());
        assert_eq!(container.child_count(), 1);
    }

    #[test]
    fn replace_top_swaps_single_entry() {
        let container = Container::new("root");
        let router = router(&container);
        let a = entry("a");
        let a_controller = a.controller();
        router.set_root(a);
        let b = entry("b");
        let b_controller = b.controller();
        router.replace_top_controller(b);

        assert_eq!(router.backstack_len(), 1);
        assert!(a_controller.is_destroyed());
        assert!(b_controller.is_attached());
    }
}
