//! Backstack entries.
//!
//! A [`Transaction`] pairs a controller with its push/pop transition
//! handlers, an optional tag, and the master/detail flag. Its
//! `transaction_index` is the stable identity the reconciliation algorithm
//! diffs by: two transactions are "the same entry" iff their indices match,
//! regardless of cloning.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use wayfinder_core::ChangeHandler;

use crate::controller::Controller;
use crate::screen::Screen;

/// Where a transaction currently stands relative to a backstack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttachState {
    /// Built but never added to a backstack.
    Idle,
    /// Currently part of a backstack.
    Pushed,
    /// Removed from its backstack; its controller is destroyed. Terminal.
    Popped,
}

/// One backstack entry.
///
/// Built fluently:
///
/// ```ignore
/// let transaction = Transaction::with_screen(Box::new(Settings::default()))
///     .push_handler(Box::new(SlideHandler::new()))
///     .tag("settings");
/// ```
pub struct Transaction {
    controller: Controller,
    push_handler: Option<Box<dyn ChangeHandler>>,
    pop_handler: Option<Box<dyn ChangeHandler>>,
    tag: Option<String>,
    is_detail: bool,
    /// 0 means "not yet assigned"; assigned on first entry into a backstack.
    index: Rc<Cell<u64>>,
    attach_state: Rc<Cell<AttachState>>,
}

impl Transaction {
    /// Wrap a screen in a fresh controller.
    #[must_use]
    pub fn with_screen(screen: Box<dyn Screen>) -> Self {
        Self::with_controller(Controller::new(screen))
    }

    /// Build a transaction around an existing controller.
    #[must_use]
    pub fn with_controller(controller: Controller) -> Self {
        Self {
            controller,
            push_handler: None,
            pop_handler: None,
            tag: None,
            is_detail: false,
            index: Rc::new(Cell::new(0)),
            attach_state: Rc::new(Cell::new(AttachState::Idle)),
        }
    }

    pub(crate) fn restored(
        controller: Controller,
        push_handler: Option<Box<dyn ChangeHandler>>,
        pop_handler: Option<Box<dyn ChangeHandler>>,
        tag: Option<String>,
        is_detail: bool,
        index: u64,
    ) -> Self {
        Self {
            controller,
            push_handler,
            pop_handler,
            tag,
            is_detail,
            index: Rc::new(Cell::new(index)),
            attach_state: Rc::new(Cell::new(AttachState::Idle)),
        }
    }

    /// Set the handler used when this entry is pushed on top.
    #[must_use]
    pub fn push_handler(mut self, handler: Box<dyn ChangeHandler>) -> Self {
        self.push_handler = Some(handler);
        self
    }

    /// Set the handler used when this entry is popped off the top.
    #[must_use]
    pub fn pop_handler(mut self, handler: Box<dyn ChangeHandler>) -> Self {
        self.pop_handler = Some(handler);
        self
    }

    /// Tag for lookups. Tags need not be unique; lookups return the most
    /// recently pushed match.
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Mark this entry as belonging to the detail pane of a master/detail
    /// composition.
    #[must_use]
    pub fn detail(mut self, is_detail: bool) -> Self {
        self.is_detail = is_detail;
        self
    }

    // ── Accessors ───────────────────────────────────────────────────────

    #[must_use]
    pub fn controller(&self) -> Controller {
        self.controller.clone()
    }

    #[must_use]
    pub fn tag_ref(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    #[must_use]
    pub fn is_detail(&self) -> bool {
        self.is_detail
    }

    /// Stable diffing identity; 0 until the entry first enters a backstack.
    #[must_use]
    pub fn index(&self) -> u64 {
        self.index.get()
    }

    #[must_use]
    pub fn attach_state(&self) -> AttachState {
        self.attach_state.get()
    }

    #[must_use]
    pub fn clone_push_handler(&self) -> Option<Box<dyn ChangeHandler>> {
        self.push_handler.as_ref().map(|h| h.clone_handler())
    }

    #[must_use]
    pub fn clone_pop_handler(&self) -> Option<Box<dyn ChangeHandler>> {
        self.pop_handler.as_ref().map(|h| h.clone_handler())
    }

    #[must_use]
    pub fn push_handler_ref(&self) -> Option<&dyn ChangeHandler> {
        self.push_handler.as_deref()
    }

    #[must_use]
    pub fn pop_handler_ref(&self) -> Option<&dyn ChangeHandler> {
        self.pop_handler.as_deref()
    }

    // ── Engine plumbing ─────────────────────────────────────────────────

    pub(crate) fn set_detail_flag(&mut self, is_detail: bool) {
        self.is_detail = is_detail;
    }

    pub(crate) fn set_pop_handler_if_absent(&mut self, handler: Box<dyn ChangeHandler>) {
        if self.pop_handler.is_none() {
            self.pop_handler = Some(handler);
        }
    }

    pub(crate) fn ensure_index(&self) {
        if self.index.get() == 0 {
            self.index.set(wayfinder_core::next_id());
        }
    }

    pub(crate) fn mark_pushed(&self) {
        assert!(
            self.attach_state.get() != AttachState::Popped,
            "transaction {} re-entered a backstack after being popped; \
             build a new Transaction for the controller instead",
            self.index.get()
        );
        self.attach_state.set(AttachState::Pushed);
    }

    pub(crate) fn mark_popped(&self) {
        self.attach_state.set(AttachState::Popped);
    }
}

impl Clone for Transaction {
    fn clone(&self) -> Self {
        Self {
            controller: self.controller.clone(),
            push_handler: self.clone_push_handler(),
            pop_handler: self.clone_pop_handler(),
            tag: self.tag.clone(),
            is_detail: self.is_detail,
            index: self.index.clone(),
            attach_state: self.attach_state.clone(),
        }
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("index", &self.index.get())
            .field("screen_type", &self.controller.screen_type())
            .field("tag", &self.tag)
            .field("is_detail", &self.is_detail)
            .field("attach_state", &self.attach_state.get())
            .finish()
    }
}
