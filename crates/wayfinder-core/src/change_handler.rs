//! Change-handler contract for visual transitions.
//!
//! A change handler performs the visual part of a backstack change: it moves
//! the outgoing view out of the container and the incoming view in, possibly
//! over time, and reports completion through [`ChangeDone`]. The runtime's
//! coordinator guarantees at most one handler runs per container and that
//! completion is observed exactly once — even when a handler is abandoned or
//! the container dies mid-transition.
//!
//! Handlers are persistable: each reports a stable [`kind`](ChangeHandler::kind)
//! string plus opaque data, and is reconstructed through the runtime's
//! registry on state restore.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::view::{Container, ViewId};

/// How a change ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeOutcome {
    /// The handler ran to completion.
    Completed,
    /// The change was forced to settle: superseded, abandoned by its
    /// handler, or its container died. The view swap still took effect.
    Aborted,
}

impl ChangeOutcome {
    #[must_use]
    pub fn completed(self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Everything a handler needs to perform one swap.
#[derive(Clone)]
pub struct ChangeContext {
    container: Container,
    from: Option<ViewId>,
    to: Option<ViewId>,
    is_push: bool,
}

impl ChangeContext {
    #[must_use]
    pub fn new(container: Container, from: Option<ViewId>, to: Option<ViewId>, is_push: bool) -> Self {
        Self {
            container,
            from,
            to,
            is_push,
        }
    }

    #[must_use]
    pub fn container(&self) -> &Container {
        &self.container
    }

    #[must_use]
    pub fn from_view(&self) -> Option<ViewId> {
        self.from
    }

    #[must_use]
    pub fn to_view(&self) -> Option<ViewId> {
        self.to
    }

    /// Push semantics (`true`) or pop semantics (`false`).
    #[must_use]
    pub fn is_push(&self) -> bool {
        self.is_push
    }

    /// Perform the swap immediately: detach the outgoing view, attach the
    /// incoming one. Safe on a dead container (the swap degrades to
    /// bookkeeping). Handlers that animate call this when their animation
    /// lands; the coordinator also calls it to settle interrupted changes.
    pub fn swap_now(&self) {
        if let Some(from) = self.from {
            self.container.detach(from);
        }
        if let Some(to) = self.to
            && self.container.is_live()
        {
            self.container.attach(to);
        }
    }
}

impl fmt::Debug for ChangeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeContext")
            .field("container", &self.container.id())
            .field("from", &self.from)
            .field("to", &self.to)
            .field("is_push", &self.is_push)
            .finish()
    }
}

/// Callback invoked exactly once when a change settles.
pub type FinishFn = Box<dyn FnOnce(ChangeOutcome)>;

/// Completion token handed to a handler.
///
/// Fires its callback exactly once: through [`complete`](Self::complete),
/// through the paired [`SettleHandle`], or — if the handler drops the token
/// without completing — on drop, as an abort. A lost token can therefore
/// never stall lifecycle delivery.
pub struct ChangeDone {
    slot: Rc<RefCell<Option<FinishFn>>>,
}

impl ChangeDone {
    /// Create a token plus the coordinator-side handle that can force it.
    #[must_use]
    pub fn pair(finish: FinishFn) -> (ChangeDone, SettleHandle) {
        let slot = Rc::new(RefCell::new(Some(finish)));
        (
            ChangeDone { slot: slot.clone() },
            SettleHandle { slot },
        )
    }

    /// Report normal completion.
    pub fn complete(self) {
        Self::fire(&self.slot, ChangeOutcome::Completed);
    }

    fn fire(slot: &Rc<RefCell<Option<FinishFn>>>, outcome: ChangeOutcome) {
        let finish = slot.borrow_mut().take();
        if let Some(finish) = finish {
            finish(outcome);
        }
    }
}

impl Drop for ChangeDone {
    fn drop(&mut self) {
        // Token lost without completing: settle as aborted.
        Self::fire(&self.slot, ChangeOutcome::Aborted);
    }
}

impl fmt::Debug for ChangeDone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChangeDone(pending: {})", self.slot.borrow().is_some())
    }
}

/// Coordinator-side twin of [`ChangeDone`]: forces an in-flight change to
/// settle when it is superseded or its container dies.
pub struct SettleHandle {
    slot: Rc<RefCell<Option<FinishFn>>>,
}

impl SettleHandle {
    /// Force the change to settle as aborted. No-op if already settled.
    pub fn settle_now(&self) {
        ChangeDone::fire(&self.slot, ChangeOutcome::Aborted);
    }

    /// Whether completion has already fired.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.slot.borrow().is_none()
    }
}

impl fmt::Debug for SettleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SettleHandle(settled: {})", self.is_settled())
    }
}

/// Visual transition between two screens' views in one container.
pub trait ChangeHandler {
    /// Stable identifier for persistence; registered with the runtime's
    /// registry so the handler can be reconstructed on state restore.
    fn kind(&self) -> &'static str;

    /// Perform the swap, then complete `done`. May complete synchronously
    /// or hold `done` and complete later when the host drives an animation
    /// to its end.
    fn perform(&mut self, ctx: ChangeContext, done: ChangeDone);

    /// Called when the change is abandoned before the handler completed it
    /// (superseded by a newer reconciliation, or the container died).
    fn on_abort(&mut self) {}

    /// Clone for reuse; handlers are cloned whenever a transaction is
    /// copied out of a backstack.
    fn clone_handler(&self) -> Box<dyn ChangeHandler>;

    /// Opaque persisted payload. The default is no payload.
    fn save_data(&self) -> Option<String> {
        None
    }

    /// Whether the outgoing view should leave the container on a push.
    /// Handlers for overlay-style pushes return `false`.
    fn removes_from_view_on_push(&self) -> bool {
        true
    }
}

impl fmt::Debug for dyn ChangeHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChangeHandler({})", self.kind())
    }
}

/// The default handler: swaps views synchronously with no animation.
#[derive(Clone, Copy, Debug, Default)]
pub struct InstantChangeHandler;

/// Registry kind for [`InstantChangeHandler`].
pub const INSTANT_HANDLER_KIND: &str = "instant";

impl ChangeHandler for InstantChangeHandler {
    fn kind(&self) -> &'static str {
        INSTANT_HANDLER_KIND
    }

    fn perform(&mut self, ctx: ChangeContext, done: ChangeDone) {
        ctx.swap_now();
        done.complete();
    }

    fn clone_handler(&self) -> Box<dyn ChangeHandler> {
        Box::new(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::View;
    use std::cell::Cell;

    fn recording_finish(outcome_cell: Rc<Cell<Option<ChangeOutcome>>>) -> FinishFn {
        Box::new(move |outcome| {
            assert!(outcome_cell.get().is_none(), "completion fired twice");
            outcome_cell.set(Some(outcome));
        })
    }

    #[test]
    fn instant_handler_swaps_and_completes() {
        let container = Container::new("root");
        let from = View::new("a");
        let to = View::new("b");
        container.attach(from.id());

        let outcome = Rc::new(Cell::new(None));
        let (done, _settle) = ChangeDone::pair(recording_finish(outcome.clone()));
        let ctx = ChangeContext::new(container.clone(), Some(from.id()), Some(to.id()), true);
        InstantChangeHandler.perform(ctx, done);

        assert_eq!(outcome.get(), Some(ChangeOutcome::Completed));
        assert!(!container.contains(from.id()));
        assert!(container.contains(to.id()));
    }

    #[test]
    fn dropped_token_aborts() {
        let outcome = Rc::new(Cell::new(None));
        let (done, settle) = ChangeDone::pair(recording_finish(outcome.clone()));
        drop(done);
        assert_eq!(outcome.get(), Some(ChangeOutcome::Aborted));
        assert!(settle.is_settled());
    }

    #[test]
    fn settle_wins_over_late_complete() {
        let outcome = Rc::new(Cell::new(None));
        let (done, settle) = ChangeDone::pair(recording_finish(outcome.clone()));
        settle.settle_now();
        assert_eq!(outcome.get(), Some(ChangeOutcome::Aborted));
        // the handler completing afterwards must not fire again
        done.complete();
        assert_eq!(outcome.get(), Some(ChangeOutcome::Aborted));
    }

    #[test]
    fn swap_on_dead_container_is_bookkeeping_only() {
        let container = Container::new("root");
        let from = View::new("a");
        container.attach(from.id());
        let to = View::new("b");
        container.kill();
        let ctx = ChangeContext::new(container.clone(), Some(from.id()), Some(to.id()), false);
        ctx.swap_now();
        assert_eq!(container.child_count(), 0);
    }
}
