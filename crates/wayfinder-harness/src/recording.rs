//! Listeners and observers that write into a [`CallLog`].

use wayfinder_core::LifecycleEvent;
use wayfinder_runtime::{ChangeEvent, ChangeListener, Controller, LifecycleObserver};

use crate::probe::CallLog;

fn endpoint(controller: Option<&Controller>) -> String {
    match controller {
        Some(c) => format!("#{}", c.instance_id()),
        None => "none".to_owned(),
    }
}

/// Records router changes as
/// `change_started push #from -> #to` and
/// `change_completed push #from -> #to (Completed)`.
pub struct RecordingListener {
    log: CallLog,
}

impl RecordingListener {
    #[must_use]
    pub fn new(log: &CallLog) -> Self {
        Self { log: log.clone() }
    }
}

impl ChangeListener for RecordingListener {
    fn on_change_started(&self, event: &ChangeEvent) {
        self.log.record(format!(
            "change_started {} {} -> {}",
            if event.is_push { "push" } else { "pop" },
            endpoint(event.from.as_ref()),
            endpoint(event.to.as_ref()),
        ));
    }

    fn on_change_completed(&self, event: &ChangeEvent) {
        self.log.record(format!(
            "change_completed {} {} -> {} ({:?})",
            if event.is_push { "push" } else { "pop" },
            endpoint(event.from.as_ref()),
            endpoint(event.to.as_ref()),
            event.outcome.expect("completed event carries an outcome"),
        ));
    }
}

/// Records controller lifecycle transitions as `#id:{event:?}`.
pub struct RecordingObserver {
    log: CallLog,
}

impl RecordingObserver {
    #[must_use]
    pub fn new(log: &CallLog) -> Self {
        Self { log: log.clone() }
    }
}

impl LifecycleObserver for RecordingObserver {
    fn on_lifecycle(&self, controller: &Controller, event: LifecycleEvent) {
        self.log
            .record(format!("#{}:{event:?}", controller.instance_id()));
    }
}
