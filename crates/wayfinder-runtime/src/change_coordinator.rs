//! Transition sequencing.
//!
//! The coordinator owns the per-container discipline: at most one change
//! handler runs at a time, later changes queue behind it (never discarded),
//! and completion is observed exactly once per change — even when a handler
//! abandons its token or the container dies mid-flight. Lifecycle delivery
//! hangs off completion, so these guarantees are what keep screens from
//! getting stuck half-attached.
//!
//! Within one change the order is fixed: change-started listeners →
//! will-detach → view creation + will-attach → handler swap → (on
//! completion) outgoing detach → incoming attach → change-completed
//! listeners. The outgoing screen always detaches before the incoming one
//! attaches.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use wayfinder_core::{
    ChangeContext, ChangeDone, ChangeHandler, ChangeOutcome, Container, FinishFn, SettleHandle,
    WeakContainer,
};

use crate::controller::Controller;

/// Observes backstack changes on a router.
///
/// Listeners are called synchronously on the main thread, in registration
/// order. `on_change_started` fires before any visual mutation;
/// `on_change_completed` fires after lifecycle delivery for the change.
pub trait ChangeListener {
    fn on_change_started(&self, _event: &ChangeEvent) {}
    fn on_change_completed(&self, _event: &ChangeEvent) {}
}

/// One backstack change, as seen by listeners.
pub struct ChangeEvent {
    pub from: Option<Controller>,
    pub to: Option<Controller>,
    pub is_push: bool,
    /// The container, when it was still alive at notification time.
    pub container: Option<Container>,
    pub handler_kind: String,
    /// `None` while the change is starting; set on completion.
    pub outcome: Option<ChangeOutcome>,
}

impl fmt::Debug for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeEvent")
            .field("from", &self.from.as_ref().map(Controller::instance_id))
            .field("to", &self.to.as_ref().map(Controller::instance_id))
            .field("is_push", &self.is_push)
            .field("handler_kind", &self.handler_kind)
            .field("outcome", &self.outcome)
            .finish()
    }
}

pub(crate) struct PendingChange {
    pub(crate) from: Option<Controller>,
    pub(crate) to: Option<Controller>,
    pub(crate) is_push: bool,
    pub(crate) handler: Box<dyn ChangeHandler>,
    /// The outgoing controller left the backstack: destroy it on completion.
    pub(crate) destroy_from: bool,
    pub(crate) container: WeakContainer,
    pub(crate) listeners: Vec<Rc<dyn ChangeListener>>,
}

struct InFlight {
    seq: u64,
    settle: SettleHandle,
    /// Stored after `perform` returns, so an abandoned change can still be
    /// told about its abort.
    handler: Option<Box<dyn ChangeHandler>>,
}

struct CoordinatorState {
    next_seq: u64,
    current: Option<InFlight>,
    queue: VecDeque<PendingChange>,
}

/// Per-router change executor.
#[derive(Clone)]
pub(crate) struct ChangeCoordinator {
    state: Rc<RefCell<CoordinatorState>>,
}

impl ChangeCoordinator {
    pub(crate) fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(CoordinatorState {
                next_seq: 0,
                current: None,
                queue: VecDeque::new(),
            })),
        }
    }

    #[must_use]
    pub(crate) fn is_busy(&self) -> bool {
        self.state.borrow().current.is_some()
    }

    /// Run the change now, or queue it behind the one in flight.
    pub(crate) fn enqueue(&self, change: PendingChange) {
        let run_now = {
            let mut state = self.state.borrow_mut();
            if state.current.is_some() {
                state.queue.push_back(change);
                None
            } else {
                Some(change)
            }
        };
        if let Some(change) = run_now {
            Self::run(&self.state, change);
        }
    }

    /// Force everything to settle: the in-flight change aborts (its handler
    /// is told), queued changes run against whatever the container is now —
    /// typically dead, which degrades them to instant bookkeeping. Used on
    /// host teardown so no completion callback is ever lost.
    pub(crate) fn settle_all(&self) {
        loop {
            let current = { self.state.borrow_mut().current.take() };
            if let Some(mut current) = current {
                if let Some(handler) = current.handler.as_mut() {
                    handler.on_abort();
                }
                current.settle.settle_now();
                continue;
            }
            let next = { self.state.borrow_mut().queue.pop_front() };
            match next {
                Some(change) => Self::run(&self.state, change),
                None => break,
            }
        }
    }

    fn run(state: &Rc<RefCell<CoordinatorState>>, change: PendingChange) {
        let PendingChange {
            from,
            to,
            is_push,
            mut handler,
            destroy_from,
            container,
            listeners,
        } = change;

        let seq = {
            let mut st = state.borrow_mut();
            st.next_seq += 1;
            st.next_seq
        };
        let live = container.upgrade_live();
        let handler_kind = handler.kind().to_string();
        tracing::debug!(
            from = from.as_ref().map(Controller::instance_id),
            to = to.as_ref().map(Controller::instance_id),
            is_push,
            handler = %handler_kind,
            live = live.is_some(),
            "change starting"
        );

        let keep_from_view = is_push && !handler.removes_from_view_on_push();

        let finish: FinishFn = {
            let state = state.clone();
            let from = from.clone();
            let to = to.clone();
            let container = container.clone();
            let listeners = listeners.clone();
            let handler_kind = handler_kind.clone();
            Box::new(move |outcome| {
                let live = container.upgrade_live();
                // Visual post-conditions, in case the handler did not (or
                // could not) complete the swap itself.
                if let Some(c) = &live {
                    if !keep_from_view
                        && let Some(from) = &from
                        && let Some(view) = from.view_id()
                        && to.as_ref().and_then(Controller::view_id) != Some(view)
                    {
                        c.detach(view);
                    }
                    if let Some(to) = &to
                        && !to.is_destroyed()
                        && let Some(view) = to.view_id()
                        && !c.contains(view)
                    {
                        c.attach(view);
                    }
                }
                // Outgoing detach strictly before incoming attach.
                if let Some(from) = &from {
                    if destroy_from {
                        // will_detach already fired when the change started.
                        from.complete_detach(false);
                        from.destroy();
                    } else {
                        from.complete_detach(!keep_from_view);
                    }
                }
                if let Some(to) = &to {
                    if live.is_some() && !to.is_destroyed() && to.has_view() {
                        to.complete_attach();
                    } else if !to.is_destroyed() {
                        // Visual attach skipped; redo it when the host is
                        // available again.
                        to.set_needs_attach(true);
                    }
                }
                let completed = ChangeEvent {
                    from,
                    to,
                    is_push,
                    container: live,
                    handler_kind,
                    outcome: Some(outcome),
                };
                for listener in &listeners {
                    listener.on_change_completed(&completed);
                }
                let next = {
                    let mut st = state.borrow_mut();
                    st.current = None;
                    st.queue.pop_front()
                };
                if let Some(next) = next {
                    ChangeCoordinator::run(&state, next);
                }
            })
        };

        let (done, settle) = ChangeDone::pair(finish);
        // In flight from before the first listener or hook fires: navigation
        // re-entering `enqueue` from either lands in the queue.
        {
            state.borrow_mut().current = Some(InFlight {
                seq,
                settle,
                handler: None,
            });
        }

        let started = ChangeEvent {
            from: from.clone(),
            to: to.clone(),
            is_push,
            container: live.clone(),
            handler_kind: handler_kind.clone(),
            outcome: None,
        };
        for listener in &listeners {
            listener.on_change_started(&started);
        }

        if let Some(from) = &from {
            from.fire_will_detach();
        }
        let to_view = if live.is_some() {
            to.as_ref().and_then(Controller::ensure_view)
        } else {
            None
        };
        if live.is_some()
            && let Some(to_c) = &to
            && !to_c.is_destroyed()
        {
            to_c.fire_will_attach();
        }

        match live {
            Some(container) => {
                let from_view = from.as_ref().and_then(Controller::view_id);
                let ctx = ChangeContext::new(container, from_view, to_view, is_push);
                handler.perform(ctx, done);
                // If the handler completed synchronously, `current` now
                // belongs to a different change (or none); only park the
                // handler if this change is still in flight.
                let mut st = state.borrow_mut();
                if let Some(current) = st.current.as_mut()
                    && current.seq == seq
                {
                    current.handler = Some(handler);
                }
            }
            None => {
                // Dead container: no visual work is possible. The drop of
                // the token settles the change as aborted, which still runs
                // the full completion path above.
                handler.on_abort();
                drop(done);
            }
        }
    }
}
