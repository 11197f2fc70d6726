//! Saving and restoring navigation state.
//!
//! A backstack serializes to plain data: per entry the screen type, an
//! opaque screen-state blob, saved view state, handler descriptors, and the
//! stable ids that keep reconciliation working across a restore. Screens and
//! handlers come back through a [`Registry`] of factories keyed by type;
//! entries whose screen type has no registered factory are dropped from the
//! restored stack and reported, never silently resurrected as something
//! else.
//!
//! Restored stacks install without transitions. The top entry is flagged as
//! needing attach and appears the next time the host becomes available.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use wayfinder_core::{ChangeHandler, InstantChangeHandler, RetainViewMode, reserve_ids_through};

use crate::controller::Controller;
use crate::router::Router;
use crate::screen::Screen;
use crate::transaction::Transaction;

// ── Saved-state shapes ──────────────────────────────────────────────────

/// Serialized form of one router's backstack.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RouterSavedState {
    pub pops_last_view: bool,
    pub is_detail: bool,
    pub backstack: Vec<TransactionSavedState>,
}

/// Serialized form of one backstack entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransactionSavedState {
    pub index: u64,
    pub tag: Option<String>,
    pub is_detail: bool,
    pub push_handler: Option<HandlerSavedState>,
    pub pop_handler: Option<HandlerSavedState>,
    pub controller: ControllerSavedState,
}

/// A change handler, reduced to its kind id and optional payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HandlerSavedState {
    pub kind: String,
    pub data: Option<String>,
}

/// Serialized form of a controller and its subtree.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ControllerSavedState {
    pub screen_type: String,
    pub instance_id: u64,
    pub retain_view: String,
    pub needs_attach: bool,
    pub screen_state: Value,
    pub view_state: Option<Value>,
    pub child_routers: Vec<ChildRouterSavedState>,
}

/// A child router, keyed by the container name it was bound to.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChildRouterSavedState {
    pub host_name: Option<String>,
    pub router: RouterSavedState,
}

// ── Registry ────────────────────────────────────────────────────────────

type ScreenFactory = Box<dyn Fn(&Value) -> Option<Box<dyn Screen>>>;
type HandlerFactory = Box<dyn Fn(Option<&str>) -> Option<Box<dyn ChangeHandler>>>;

/// Factories for reconstructing screens and change handlers on restore.
///
/// Screen factories receive the blob the screen produced from
/// [`Screen::save_state`] and must return a fully repopulated screen;
/// the runtime does not call `restore_state` on top of what the factory
/// returns. The instant handler is pre-registered.
pub struct Registry {
    screens: HashMap<String, ScreenFactory>,
    handlers: HashMap<String, HandlerFactory>,
}

impl Default for Registry {
    fn default() -> Self {
        let mut registry = Self {
            screens: HashMap::new(),
            handlers: HashMap::new(),
        };
        registry.register_handler(wayfinder_core::INSTANT_HANDLER_KIND, |_| {
            Some(Box::new(InstantChangeHandler))
        });
        registry
    }
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for a screen type. Later registrations replace
    /// earlier ones.
    pub fn register_screen(
        &mut self,
        screen_type: impl Into<String>,
        factory: impl Fn(&Value) -> Option<Box<dyn Screen>> + 'static,
    ) {
        self.screens.insert(screen_type.into(), Box::new(factory));
    }

    /// Register a factory for a change handler kind.
    pub fn register_handler(
        &mut self,
        kind: impl Into<String>,
        factory: impl Fn(Option<&str>) -> Option<Box<dyn ChangeHandler>> + 'static,
    ) {
        self.handlers.insert(kind.into(), Box::new(factory));
    }

    /// Reconstruct a screen from its saved blob, or `None` when the type is
    /// unknown or the factory refuses the blob.
    #[must_use]
    pub fn create_screen(&self, screen_type: &str, state: &Value) -> Option<Box<dyn Screen>> {
        self.screens.get(screen_type)?(state)
    }

    /// Reconstruct a change handler. An unknown kind degrades to the
    /// instant handler; losing an animation is recoverable, losing a screen
    /// is not.
    #[must_use]
    pub fn create_handler(&self, kind: &str, data: Option<&str>) -> Box<dyn ChangeHandler> {
        let made = self.handlers.get(kind).and_then(|factory| factory(data));
        match made {
            Some(handler) => handler,
            None => {
                tracing::warn!(kind, "unknown change handler kind; restoring as instant");
                Box::new(InstantChangeHandler)
            }
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("screens", &self.screens.keys().collect::<Vec<_>>())
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ── Restore reporting ───────────────────────────────────────────────────

/// One backstack entry that could not be restored.
#[derive(Clone, Debug)]
pub struct DroppedEntry {
    pub screen_type: String,
    pub tag: Option<String>,
    pub reason: String,
}

/// Outcome of a restore: how many entries came back, and which were
/// dropped.
#[derive(Clone, Debug, Default)]
pub struct RestoreReport {
    pub restored: usize,
    pub dropped: Vec<DroppedEntry>,
}

impl RestoreReport {
    /// Whether every saved entry was restored.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.dropped.is_empty()
    }
}

// ── Save ────────────────────────────────────────────────────────────────

/// Serialize a router's backstack, including every child router hanging
/// off its controllers.
#[must_use]
pub fn save_router(router: &Router) -> RouterSavedState {
    RouterSavedState {
        pops_last_view: router.pops_last_view(),
        is_detail: router.is_detail(),
        backstack: router.backstack().iter().map(save_transaction).collect(),
    }
}

fn save_transaction(transaction: &Transaction) -> TransactionSavedState {
    TransactionSavedState {
        index: transaction.index(),
        tag: transaction.tag_ref().map(str::to_owned),
        is_detail: transaction.is_detail(),
        push_handler: transaction.push_handler_ref().map(save_handler),
        pop_handler: transaction.pop_handler_ref().map(save_handler),
        controller: save_controller(&transaction.controller()),
    }
}

fn save_handler(handler: &dyn ChangeHandler) -> HandlerSavedState {
    HandlerSavedState {
        kind: handler.kind().to_owned(),
        data: handler.save_data(),
    }
}

fn save_controller(controller: &Controller) -> ControllerSavedState {
    ControllerSavedState {
        screen_type: controller.screen_type().to_owned(),
        instance_id: controller.instance_id(),
        retain_view: controller.retain_view_mode().as_str().to_owned(),
        // An attached screen must come back on top after a restore.
        needs_attach: controller.needs_attach() || controller.is_attached(),
        screen_state: controller.screen_state_blob(),
        view_state: controller.view_state_blob(),
        child_routers: controller
            .child_routers()
            .iter()
            .map(|child| ChildRouterSavedState {
                host_name: child.host_name(),
                router: save_router(child),
            })
            .collect(),
    }
}

// ── Restore ─────────────────────────────────────────────────────────────

/// Rebuild `saved` into `router`, which must be empty. Returns what was
/// restored and what had to be dropped.
pub(crate) fn restore_router_into(
    router: &Router,
    saved: &RouterSavedState,
    registry: &Registry,
) -> RestoreReport {
    let mut report = RestoreReport::default();
    let mut max_id = 0u64;
    restore_backstack(router, saved, registry, &mut report, &mut max_id);
    // Fresh ids must never collide with restored ones.
    reserve_ids_through(max_id);
    report
}

fn restore_backstack(
    router: &Router,
    saved: &RouterSavedState,
    registry: &Registry,
    report: &mut RestoreReport,
    max_id: &mut u64,
) {
    router.set_pops_last_view(saved.pops_last_view);
    router.set_is_detail(saved.is_detail);
    let marker = router.marker();
    let mut stack = Vec::with_capacity(saved.backstack.len());
    for entry in &saved.backstack {
        *max_id = (*max_id).max(entry.index).max(entry.controller.instance_id);
        let Some(controller) =
            restore_controller(&entry.controller, entry.tag.as_deref(), registry, report, max_id, marker)
        else {
            continue;
        };
        let push_handler = entry
            .push_handler
            .as_ref()
            .map(|h| registry.create_handler(&h.kind, h.data.as_deref()));
        let pop_handler = entry
            .pop_handler
            .as_ref()
            .map(|h| registry.create_handler(&h.kind, h.data.as_deref()));
        stack.push(Transaction::restored(
            controller,
            push_handler,
            pop_handler,
            entry.tag.clone(),
            entry.is_detail,
            entry.index,
        ));
        report.restored += 1;
    }
    router.install_restored_backstack(stack);
}

fn restore_controller(
    saved: &ControllerSavedState,
    tag: Option<&str>,
    registry: &Registry,
    report: &mut RestoreReport,
    max_id: &mut u64,
    marker: wayfinder_core::MainThreadMarker,
) -> Option<Controller> {
    let Some(screen) = registry.create_screen(&saved.screen_type, &saved.screen_state) else {
        tracing::warn!(
            screen_type = %saved.screen_type,
            tag = ?tag,
            "dropping backstack entry with no registered screen factory"
        );
        report.dropped.push(DroppedEntry {
            screen_type: saved.screen_type.clone(),
            tag: tag.map(str::to_owned),
            reason: "no registered screen factory".to_owned(),
        });
        return None;
    };
    let controller = Controller::restored(
        screen,
        saved.instance_id,
        RetainViewMode::from_str_lossy(&saved.retain_view),
        saved.needs_attach,
        saved.view_state.clone(),
    );
    for child in &saved.child_routers {
        let child_router =
            Router::new_child_detached(marker, controller.downgrade(), child.host_name.clone());
        controller.add_child_router(child_router.clone());
        restore_backstack(&child_router, &child.router, registry, report, max_id);
    }
    Some(controller)
}
