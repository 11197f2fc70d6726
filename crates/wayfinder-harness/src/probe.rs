//! Screens that record what happens to them.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{Value, json};
use wayfinder_core::{RetainViewMode, View};
use wayfinder_runtime::{Registry, Screen, ScreenCtx, Transaction};

/// Shared, ordered log of events, written by probe screens and read by
/// test assertions. Clones share the same log.
#[derive(Clone, Default)]
pub struct CallLog {
    entries: Rc<RefCell<Vec<String>>>,
}

impl CallLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.entries.borrow_mut().push(entry.into());
    }

    /// Everything recorded so far, in order.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }

    /// Drain the log, returning what was in it. Useful between test
    /// phases.
    #[must_use]
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.entries.borrow_mut())
    }

    #[must_use]
    pub fn contains(&self, entry: &str) -> bool {
        self.entries.borrow().iter().any(|e| e == entry)
    }

    /// Position of the first occurrence, for ordering assertions.
    #[must_use]
    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries.borrow().iter().position(|e| e == entry)
    }

    /// Assert that `earlier` was recorded before `later`.
    ///
    /// # Panics
    /// Panics when either entry is missing or the order is wrong.
    pub fn assert_order(&self, earlier: &str, later: &str) {
        let entries = self.entries();
        let a = entries
            .iter()
            .position(|e| e == earlier)
            .unwrap_or_else(|| panic!("`{earlier}` never recorded; log: {entries:?}"));
        let b = entries
            .iter()
            .position(|e| e == later)
            .unwrap_or_else(|| panic!("`{later}` never recorded; log: {entries:?}"));
        assert!(
            a < b,
            "`{earlier}` (at {a}) should come before `{later}` (at {b}); log: {entries:?}"
        );
    }
}

impl std::fmt::Debug for CallLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.entries.borrow().iter()).finish()
    }
}

/// A screen that records every hook as `"<name>.<hook>"` in its log.
pub struct ProbeScreen {
    name: String,
    log: CallLog,
    retain: RetainViewMode,
    consumes_back: bool,
    containers: Vec<String>,
}

impl ProbeScreen {
    #[must_use]
    pub fn new(name: impl Into<String>, log: &CallLog) -> Self {
        Self {
            name: name.into(),
            log: log.clone(),
            retain: RetainViewMode::default(),
            consumes_back: false,
            containers: Vec::new(),
        }
    }

    /// Override the retain-view mode.
    #[must_use]
    pub fn retain(mut self, mode: RetainViewMode) -> Self {
        self.retain = mode;
        self
    }

    /// Make `handle_back` return `true`.
    #[must_use]
    pub fn consumes_back(mut self) -> Self {
        self.consumes_back = true;
        self
    }

    /// Declare a named container on the built view, for child-router
    /// scenarios.
    #[must_use]
    pub fn with_container(mut self, name: impl Into<String>) -> Self {
        self.containers.push(name.into());
        self
    }

    /// Convenience wrapper for the common case.
    #[must_use]
    pub fn into_transaction(self) -> Transaction {
        Transaction::with_screen(Box::new(self))
    }

    fn log(&self, hook: &str) {
        self.log.record(format!("{}.{hook}", self.name));
    }
}

impl Screen for ProbeScreen {
    fn screen_type(&self) -> &'static str {
        "probe"
    }

    fn build_view(&mut self, _ctx: &mut ScreenCtx<'_>) -> View {
        self.log("build_view");
        let mut view = View::new(self.name.clone());
        for container in &self.containers {
            view.add_container(container.clone());
        }
        view
    }

    fn on_context_available(&mut self, _ctx: &mut ScreenCtx<'_>) {
        self.log("on_context_available");
    }

    fn on_context_unavailable(&mut self) {
        self.log("on_context_unavailable");
    }

    fn will_attach(&mut self, _ctx: &mut ScreenCtx<'_>) {
        self.log("will_attach");
    }

    fn did_attach(&mut self, _ctx: &mut ScreenCtx<'_>) {
        self.log("did_attach");
    }

    fn will_detach(&mut self, _ctx: &mut ScreenCtx<'_>) {
        self.log("will_detach");
    }

    fn did_detach(&mut self, _ctx: &mut ScreenCtx<'_>) {
        self.log("did_detach");
    }

    fn will_destroy_view(&mut self) {
        self.log("will_destroy_view");
    }

    fn did_destroy_view(&mut self) {
        self.log("did_destroy_view");
    }

    fn will_destroy(&mut self) {
        self.log("will_destroy");
    }

    fn did_destroy(&mut self) {
        self.log("did_destroy");
    }

    fn handle_back(&mut self, _ctx: &mut ScreenCtx<'_>) -> bool {
        self.log("handle_back");
        self.consumes_back
    }

    fn retain_view_mode(&self) -> RetainViewMode {
        self.retain
    }

    fn save_state(&self) -> Value {
        json!({
            "name": self.name,
            "retain": self.retain.as_str(),
            "consumes_back": self.consumes_back,
            "containers": self.containers,
        })
    }

    fn save_view_state(&self, view: &View) -> Value {
        json!({ "label": view.label() })
    }

    fn restore_view_state(&mut self, _view: &mut View, state: &Value) {
        self.log.record(format!(
            "{}.restore_view_state({})",
            self.name,
            state["label"].as_str().unwrap_or("?")
        ));
    }
}

/// Register the probe screen factory under the `"probe"` type. The factory
/// writes into `log`, fully rebuilding probes from their saved blobs.
pub fn register_probe(registry: &mut Registry, log: &CallLog) {
    let log = log.clone();
    registry.register_screen("probe", move |state| {
        let name = state["name"].as_str()?;
        let mut screen = ProbeScreen::new(name, &log)
            .retain(RetainViewMode::from_str_lossy(
                state["retain"].as_str().unwrap_or_default(),
            ));
        if state["consumes_back"].as_bool().unwrap_or(false) {
            screen = screen.consumes_back();
        }
        if let Some(containers) = state["containers"].as_array() {
            for container in containers.iter().filter_map(Value::as_str) {
                screen = screen.with_container(container);
            }
        }
        Some(Box::new(screen))
    });
}
