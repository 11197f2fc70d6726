//! Change handlers that wait for the test to drive them.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use wayfinder_core::{ChangeContext, ChangeDone, ChangeHandler};

/// A gate shared by any number of handler instances. Every transition the
/// handlers are asked to perform parks here until the test finishes it,
/// which is how queue-behind-in-flight and abort behavior get exercised.
#[derive(Clone, Default)]
pub struct TransitionGate {
    parked: Rc<RefCell<VecDeque<(ChangeContext, ChangeDone)>>>,
    aborts: Rc<Cell<u32>>,
}

impl TransitionGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A handler wired to this gate. Hand clones of it to as many
    /// transactions as the test needs.
    #[must_use]
    pub fn handler(&self) -> Box<dyn ChangeHandler> {
        Box::new(GatedHandler { gate: self.clone() })
    }

    /// Transitions currently parked.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.parked.borrow().len()
    }

    /// Perform the oldest parked transition's swap and complete it.
    /// Returns `false` when nothing is parked.
    pub fn finish_next(&self) -> bool {
        let Some((ctx, done)) = self.parked.borrow_mut().pop_front() else {
            return false;
        };
        ctx.swap_now();
        done.complete();
        true
    }

    /// Drop the oldest parked transition's token without completing it,
    /// simulating a handler that walks away.
    pub fn abandon_next(&self) -> bool {
        self.parked.borrow_mut().pop_front().is_some()
    }

    /// How many times handlers from this gate were told to abort.
    #[must_use]
    pub fn abort_count(&self) -> u32 {
        self.aborts.get()
    }
}

impl std::fmt::Debug for TransitionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionGate")
            .field("pending", &self.pending())
            .field("aborts", &self.aborts.get())
            .finish()
    }
}

struct GatedHandler {
    gate: TransitionGate,
}

impl ChangeHandler for GatedHandler {
    fn kind(&self) -> &'static str {
        "gated"
    }

    fn perform(&mut self, ctx: ChangeContext, done: ChangeDone) {
        self.gate.parked.borrow_mut().push_back((ctx, done));
    }

    fn on_abort(&mut self) {
        self.gate.aborts.set(self.gate.aborts.get() + 1);
    }

    fn clone_handler(&self) -> Box<dyn ChangeHandler> {
        self.gate.handler()
    }
}
