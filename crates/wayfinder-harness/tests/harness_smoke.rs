//! The harness exercising itself against a real router.

use std::rc::Rc;

use wayfinder_harness::{CallLog, HostSim, ProbeScreen, RecordingListener, TransitionGate};
use wayfinder_runtime::{ChangeListener, Transaction};

#[test]
fn probe_records_full_push_pop_lifecycle() {
    let log = CallLog::new();
    let sim = HostSim::started();
    let router = sim.router("root");

    router.set_root(ProbeScreen::new("home", &log).into_transaction());
    log.assert_order("home.build_view", "home.will_attach");
    log.assert_order("home.will_attach", "home.on_context_available");
    log.assert_order("home.on_context_available", "home.did_attach");

    router.push_controller(ProbeScreen::new("settings", &log).into_transaction());
    log.assert_order("home.will_detach", "settings.did_attach");
    log.assert_order("home.did_detach", "settings.did_attach");

    assert!(router.handle_back());
    log.assert_order("settings.handle_back", "settings.will_detach");
    log.assert_order("settings.did_detach", "settings.did_destroy");
    assert!(log.contains("home.did_attach"));
}

#[test]
fn gated_transition_parks_until_driven() {
    let log = CallLog::new();
    let sim = HostSim::started();
    let router = sim.router("root");
    let gate = TransitionGate::new();

    router.set_root(ProbeScreen::new("home", &log).into_transaction());
    let settings =
        Transaction::with_screen(Box::new(ProbeScreen::new("settings", &log))).push_handler(gate.handler());
    let settings_controller = settings.controller();
    router.push_controller(settings);

    assert_eq!(gate.pending(), 1);
    assert!(router.is_busy());
    assert!(!settings_controller.is_attached());
    assert!(log.contains("settings.will_attach"));
    assert!(!log.contains("settings.did_attach"));

    assert!(gate.finish_next());
    assert!(settings_controller.is_attached());
    assert!(!router.is_busy());
    log.assert_order("home.did_detach", "settings.did_attach");
}

#[test]
fn recording_listener_sees_start_and_completion() {
    let log = CallLog::new();
    let sim = HostSim::started();
    let router = sim.router("root");
    let listener: Rc<dyn ChangeListener> = Rc::new(RecordingListener::new(&log));
    router.add_change_listener(listener);

    let home = ProbeScreen::new("home", &log).into_transaction();
    let id = home.controller().instance_id();
    router.set_root(home);

    assert!(log.contains(&format!("change_started push none -> #{id}")));
    assert!(log.contains(&format!("change_completed push none -> #{id} (Completed)")));
}
