//! Master/detail composition.
//!
//! One logical master stack and one logical detail stack, projected onto
//! whatever the hosting screen's layout currently offers. In a two-pane
//! layout each logical stack gets its own router and container; in a
//! single-pane layout both share the physical router, with detail entries
//! flagged and kept above the masters. Switching layouts repartitions the
//! physical stacks while every controller survives: going to two panes
//! splits the combined stack, coming back merges the detail stack on top of
//! the masters.
//!
//! The hosting screen calls [`MasterDetail::bind`] from `did_attach` every
//! time its view is (re)built; everything else goes through the
//! [`MasterRouter`] and [`DetailRouter`] facades, which apply the same
//! logical operation to whichever physical arrangement is current.

use std::cell::RefCell;
use std::rc::Rc;

use wayfinder_core::{ChangeHandler, Container, InstantChangeHandler};

use crate::router::Router;
use crate::screen::ScreenCtx;
use crate::transaction::Transaction;

/// Layout-independent knobs for a master/detail composition.
pub struct MasterDetailConfig {
    /// Container name the detail router binds to in two-pane layouts.
    pub detail_container_name: String,
    /// Transition for a detail root installed through
    /// [`DetailRouter::set_root`] when the transaction has none of its own.
    pub root_detail_push_handler: Option<Box<dyn ChangeHandler>>,
    /// Pop counterpart for detail roots without their own pop handler.
    pub root_detail_pop_handler: Option<Box<dyn ChangeHandler>>,
}

impl Default for MasterDetailConfig {
    fn default() -> Self {
        Self {
            detail_container_name: "detail".to_owned(),
            root_detail_push_handler: None,
            root_detail_pop_handler: None,
        }
    }
}

struct SplitState {
    config: MasterDetailConfig,
    physical: Option<Router>,
    detail: Option<Router>,
    /// Recorded while no detail router exists; applied at the next
    /// two-pane bind.
    pending_detail_pops_last_view: Option<bool>,
}

/// The composition root a hosting screen owns.
#[derive(Clone)]
pub struct MasterDetail {
    shared: Rc<RefCell<SplitState>>,
}

impl MasterDetail {
    #[must_use]
    pub fn new(config: MasterDetailConfig) -> Self {
        Self {
            shared: Rc::new(RefCell::new(SplitState {
                config,
                physical: None,
                detail: None,
                pending_detail_pops_last_view: None,
            })),
        }
    }

    /// Bind to the current layout: the master container always, the detail
    /// container when the layout has two panes. Call from the hosting
    /// screen's `did_attach` after each view build; the composition detects
    /// layout switches by comparing against its previous binding and
    /// repartitions the stacks accordingly.
    pub fn bind(&self, ctx: &mut ScreenCtx<'_>, master: &Container, detail: Option<&Container>) {
        let physical = ctx.child_router(master);
        match detail {
            Some(detail_container) => {
                let detail_router = ctx.child_router(detail_container);
                detail_router.set_is_detail(true);
                let needs_split = {
                    let mut state = self.shared.borrow_mut();
                    if let Some(pops) = state.pending_detail_pops_last_view.take() {
                        detail_router.set_pops_last_view(pops);
                    }
                    state.physical = Some(physical.clone());
                    state.detail = Some(detail_router.clone());
                    !detail_router.has_root_controller()
                };
                if needs_split {
                    split(&physical, &detail_router);
                }
            }
            None => {
                let detail_name = self.shared.borrow().config.detail_container_name.clone();
                let old_detail = ctx
                    .named_child_router(&detail_name)
                    .filter(Router::has_root_controller);
                {
                    let mut state = self.shared.borrow_mut();
                    state.physical = Some(physical.clone());
                    state.detail = None;
                }
                if let Some(old_detail) = old_detail {
                    merge(&physical, &old_detail);
                }
            }
        }
    }

    /// Whether the current binding has a separate detail pane.
    #[must_use]
    pub fn is_two_pane(&self) -> bool {
        self.shared.borrow().detail.is_some()
    }

    /// Whether popping the last detail entry removes its view, leaving the
    /// detail pane empty. Takes effect immediately in two-pane mode, at the
    /// next two-pane bind otherwise.
    pub fn set_detail_pops_last_view(&self, pops: bool) {
        let mut state = self.shared.borrow_mut();
        match &state.detail {
            Some(detail) => detail.set_pops_last_view(pops),
            None => state.pending_detail_pops_last_view = Some(pops),
        }
    }

    /// Facade over the logical master stack.
    #[must_use]
    pub fn master(&self) -> MasterRouter {
        MasterRouter {
            shared: self.shared.clone(),
        }
    }

    /// Facade over the logical detail stack.
    #[must_use]
    pub fn detail(&self) -> DetailRouter {
        DetailRouter {
            shared: self.shared.clone(),
        }
    }
}

impl std::fmt::Debug for MasterDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.borrow();
        f.debug_struct("MasterDetail")
            .field("bound", &state.physical.is_some())
            .field("two_pane", &state.detail.is_some())
            .finish()
    }
}

// ── Repartitioning ──────────────────────────────────────────────────────

/// Move the flagged detail entries out of the combined stack into the
/// detail router. Relative order is preserved on both sides. The detail
/// router adopts its entries first, so the physical reconciliation sees
/// them as handed over rather than removed.
fn split(physical: &Router, detail: &Router) {
    let (masters, details): (Vec<Transaction>, Vec<Transaction>) = physical
        .backstack()
        .into_iter()
        .partition(|t| !t.is_detail());
    if details.is_empty() {
        return;
    }
    flag_top_for_attach(&masters);
    flag_top_for_attach(&details);
    detail.set_backstack(details, None);
    physical.set_backstack(masters, None);
}

/// Recombine for a single pane: masters below, details on top, both in
/// their preserved order. The detail router gives its entries up without
/// destroying them.
fn merge(physical: &Router, old_detail: &Router) {
    let mut combined = physical.backstack();
    combined.extend(old_detail.take_backstack_silently());
    flag_top_for_attach(&combined);
    physical.set_backstack(combined, None);
}

fn flag_top_for_attach(stack: &[Transaction]) {
    for (position, transaction) in stack.iter().enumerate() {
        let controller = transaction.controller();
        if !controller.is_destroyed() {
            controller.set_needs_attach(position + 1 == stack.len());
        }
    }
}

fn combine(masters: Vec<Transaction>, details: Vec<Transaction>) -> Vec<Transaction> {
    let mut combined = masters;
    combined.extend(details);
    combined
}

// ── Facades ─────────────────────────────────────────────────────────────

/// Logical master stack.
#[derive(Clone)]
pub struct MasterRouter {
    shared: Rc<RefCell<SplitState>>,
}

impl MasterRouter {
    fn physical(&self) -> (Router, bool) {
        let state = self.shared.borrow();
        let physical = state
            .physical
            .clone()
            .expect("master/detail navigation before MasterDetail::bind");
        (physical, state.detail.is_some())
    }

    /// Partition of the single-pane stack, masters then details.
    fn partitioned(physical: &Router) -> (Vec<Transaction>, Vec<Transaction>) {
        physical.backstack().into_iter().partition(|t| !t.is_detail())
    }

    /// The logical master backstack, bottom to top.
    #[must_use]
    pub fn backstack(&self) -> Vec<Transaction> {
        let (physical, two_pane) = self.physical();
        if two_pane {
            physical.backstack()
        } else {
            Self::partitioned(&physical).0
        }
    }

    #[must_use]
    pub fn backstack_len(&self) -> usize {
        self.backstack().len()
    }

    /// Push a master entry. In a single pane it slots in above the other
    /// masters but below the detail entries, so a visible detail stays on
    /// top.
    pub fn push(&self, transaction: Transaction) {
        let (physical, two_pane) = self.physical();
        if two_pane {
            physical.push_controller(transaction);
            return;
        }
        let (mut masters, details) = Self::partitioned(&physical);
        masters.push(transaction);
        physical.set_backstack(combine(masters, details), None);
    }

    /// Pop the top master entry. Returns `false` when it is the only
    /// master, nothing sits above it, and the physical router keeps its
    /// last view.
    pub fn pop_current(&self) -> bool {
        let (physical, two_pane) = self.physical();
        if two_pane {
            return physical.pop_current_controller();
        }
        let (mut masters, details) = Self::partitioned(&physical);
        assert!(
            !masters.is_empty(),
            "Trying to pop the current controller when there are none on the backstack"
        );
        if masters.len() == 1 && details.is_empty() && !physical.pops_last_view() {
            return false;
        }
        masters.pop();
        physical.set_backstack(combine(masters, details), None);
        true
    }

    /// Pop masters down to the first one. Detail entries are untouched.
    pub fn pop_to_root(&self) -> bool {
        let (physical, two_pane) = self.physical();
        if two_pane {
            return physical.pop_to_root();
        }
        let (mut masters, details) = Self::partitioned(&physical);
        if masters.len() <= 1 {
            return false;
        }
        masters.truncate(1);
        physical.set_backstack(combine(masters, details), None);
        true
    }

    /// Pop masters above the topmost one carrying `tag`.
    pub fn pop_to_tag(&self, tag: &str) -> bool {
        let (physical, two_pane) = self.physical();
        if two_pane {
            return physical.pop_to_tag(tag);
        }
        let (mut masters, details) = Self::partitioned(&physical);
        let Some(position) = masters.iter().rposition(|t| t.tag_ref() == Some(tag)) else {
            return false;
        };
        masters.truncate(position + 1);
        physical.set_backstack(combine(masters, details), None);
        true
    }

    /// Replace the whole master stack with this one entry.
    pub fn set_root(&self, transaction: Transaction) {
        let (physical, two_pane) = self.physical();
        if two_pane {
            physical.set_root(transaction);
            return;
        }
        let (_, details) = Self::partitioned(&physical);
        physical.set_backstack(combine(vec![transaction], details), None);
    }
}

/// Logical detail stack.
#[derive(Clone)]
pub struct DetailRouter {
    shared: Rc<RefCell<SplitState>>,
}

impl DetailRouter {
    fn routers(&self) -> (Router, Option<Router>) {
        let state = self.shared.borrow();
        let physical = state
            .physical
            .clone()
            .expect("master/detail navigation before MasterDetail::bind");
        (physical, state.detail.clone())
    }

    fn detail_entries(physical: &Router) -> Vec<Transaction> {
        physical
            .backstack()
            .into_iter()
            .filter(Transaction::is_detail)
            .collect()
    }

    /// The logical detail backstack, bottom to top.
    #[must_use]
    pub fn backstack(&self) -> Vec<Transaction> {
        match self.routers() {
            (_, Some(detail)) => detail.backstack(),
            (physical, None) => Self::detail_entries(&physical),
        }
    }

    #[must_use]
    pub fn backstack_len(&self) -> usize {
        self.backstack().len()
    }

    #[must_use]
    pub fn has_root(&self) -> bool {
        self.backstack_len() > 0
    }

    /// Push a detail entry on top of the logical detail stack. In a single
    /// pane this is a plain push onto the combined stack.
    pub fn push(&self, transaction: Transaction) {
        let transaction = transaction.detail(true);
        match self.routers() {
            (_, Some(detail)) => detail.push_controller(transaction),
            (physical, None) => physical.push_controller(transaction),
        }
    }

    /// Pop the top detail entry. Returns `false` when the detail stack is
    /// empty or the pop was refused.
    pub fn pop_current(&self) -> bool {
        match self.routers() {
            (_, Some(detail)) => {
                detail.has_root_controller() && detail.pop_current_controller()
            }
            (physical, None) => {
                if Self::detail_entries(&physical).is_empty() {
                    return false;
                }
                physical.pop_current_controller()
            }
        }
    }

    /// Pop details down to the first one. Returns `false` with one or no
    /// detail entries.
    pub fn pop_to_root(&self) -> bool {
        match self.routers() {
            (_, Some(detail)) => detail.pop_to_root(),
            (physical, None) => {
                let details = Self::detail_entries(&physical);
                if details.len() <= 1 {
                    return false;
                }
                physical.pop_to_transaction(&details[0])
            }
        }
    }

    /// Replace the whole detail stack with this one entry. A root detail
    /// without handlers of its own transitions with the configured root
    /// detail handlers.
    pub fn set_root(&self, transaction: Transaction) {
        let mut transaction = transaction.detail(true);
        let (root_push, root_pop) = {
            let state = self.shared.borrow();
            (
                state
                    .config
                    .root_detail_push_handler
                    .as_ref()
                    .map(|h| h.clone_handler()),
                state
                    .config
                    .root_detail_pop_handler
                    .as_ref()
                    .map(|h| h.clone_handler()),
            )
        };
        if let Some(pop) = root_pop {
            transaction.set_pop_handler_if_absent(pop);
        }
        let override_handler = transaction
            .clone_push_handler()
            .or(root_push)
            .unwrap_or_else(|| Box::new(InstantChangeHandler));
        match self.routers() {
            (_, Some(detail)) => {
                detail.set_backstack(vec![transaction], Some(override_handler));
            }
            (physical, None) => {
                let (masters, _) = physical
                    .backstack()
                    .into_iter()
                    .partition::<Vec<Transaction>, _>(|t| !t.is_detail());
                physical.set_backstack(
                    combine(masters, vec![transaction]),
                    Some(override_handler),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_to_detail_container() {
        let config = MasterDetailConfig::default();
        assert_eq!(config.detail_container_name, "detail");
        assert!(config.root_detail_push_handler.is_none());
    }

    #[test]
    fn unbound_composition_is_single_pane() {
        let composition = MasterDetail::new(MasterDetailConfig::default());
        assert!(!composition.is_two_pane());
        // Recording the knob before any bind must not panic.
        composition.set_detail_pops_last_view(true);
    }

    #[test]
    #[should_panic(expected = "before MasterDetail::bind")]
    fn navigation_before_bind_panics() {
        let composition = MasterDetail::new(MasterDetailConfig::default());
        composition.master().pop_current();
    }
}
