//! Master/detail composition across layout modes: split on going two-pane,
//! merge on coming back, and facade operations in both arrangements.

use std::cell::Cell;
use std::rc::Rc;

use wayfinder_core::View;
use wayfinder_harness::{CallLog, HostSim, ProbeScreen};
use wayfinder_runtime::{
    MasterDetail, MasterDetailConfig, Screen, ScreenCtx, Transaction,
};

/// Hosting screen: one master pane always, a detail pane when the layout
/// flag says so. Re-binds the composition on every attach, as a real
/// hosting screen would.
struct Workspace {
    composition: MasterDetail,
    two_pane: Rc<Cell<bool>>,
}

impl Screen for Workspace {
    fn screen_type(&self) -> &'static str {
        "workspace"
    }

    fn build_view(&mut self, _ctx: &mut ScreenCtx<'_>) -> View {
        let mut view = View::new("workspace");
        view.add_container("master");
        if self.two_pane.get() {
            view.add_container("detail");
        }
        view
    }

    fn did_attach(&mut self, ctx: &mut ScreenCtx<'_>) {
        let master = ctx.view_container("master").expect("declared in build_view");
        let detail = ctx.view_container("detail");
        self.composition.bind(ctx, &master, detail.as_ref());
    }

    fn save_state(&self) -> serde_json::Value {
        serde_json::Value::Null
    }
}

struct Fixture {
    sim: HostSim,
    log: CallLog,
    composition: MasterDetail,
    two_pane: Rc<Cell<bool>>,
}

impl Fixture {
    fn new(two_pane: bool) -> Self {
        let log = CallLog::new();
        let sim = HostSim::started();
        let composition = MasterDetail::new(MasterDetailConfig::default());
        let two_pane = Rc::new(Cell::new(two_pane));
        sim.router("root").set_root(Transaction::with_screen(Box::new(Workspace {
            composition: composition.clone(),
            two_pane: two_pane.clone(),
        })));
        Self {
            sim,
            log,
            composition,
            two_pane,
        }
    }

    fn probe(&self, name: &'static str) -> Transaction {
        ProbeScreen::new(name, &self.log).into_transaction()
    }

    /// Flip the layout flag and rebuild the host, the way a window-size
    /// change rebuilds a real layout.
    fn switch_layout(&self, two_pane: bool) {
        self.two_pane.set(two_pane);
        self.sim.configuration_change();
        let container = self.sim.rebuild_container("root");
        let _ = self.sim.binding().router(&container);
        self.sim.start();
    }

    fn pane_child_count(&self, pane: &str) -> usize {
        self.sim.router("root").backstack()[0]
            .controller()
            .with_view(|view| view.container(pane).map(|c| c.child_count()))
            .flatten()
            .unwrap_or(0)
    }
}

fn ids(stack: &[Transaction]) -> Vec<u64> {
    stack.iter().map(|t| t.controller().instance_id()).collect()
}

#[test]
fn going_two_pane_splits_the_combined_stack() {
    let fixture = Fixture::new(false);
    let master = fixture.composition.master();
    let detail = fixture.composition.detail();
    master.push(fixture.probe("m1"));
    master.push(fixture.probe("m2"));
    detail.push(fixture.probe("d1"));
    detail.push(fixture.probe("d2"));

    let master_ids = ids(&master.backstack());
    let detail_ids = ids(&detail.backstack());
    assert_eq!(master_ids.len(), 2);
    assert_eq!(detail_ids.len(), 2);
    // Single pane: one combined physical stack, detail on top.
    assert!(detail.backstack()[1].controller().is_attached());
    assert_eq!(fixture.pane_child_count("master"), 1);

    fixture.switch_layout(true);

    assert!(fixture.composition.is_two_pane());
    // Same controllers, now partitioned; nothing was destroyed.
    assert_eq!(ids(&master.backstack()), master_ids);
    assert_eq!(ids(&detail.backstack()), detail_ids);
    assert!(!fixture.log.contains("m1.did_destroy"));
    assert!(!fixture.log.contains("d1.did_destroy"));
    // Each pane shows its own top.
    assert!(master.backstack()[1].controller().is_attached());
    assert!(detail.backstack()[1].controller().is_attached());
    assert_eq!(fixture.pane_child_count("master"), 1);
    assert_eq!(fixture.pane_child_count("detail"), 1);
}

#[test]
fn going_single_pane_merges_details_on_top_of_masters() {
    let fixture = Fixture::new(true);
    let master = fixture.composition.master();
    let detail = fixture.composition.detail();
    master.push(fixture.probe("m1"));
    master.push(fixture.probe("m2"));
    detail.push(fixture.probe("d1"));
    detail.push(fixture.probe("d2"));
    let master_ids = ids(&master.backstack());
    let detail_ids = ids(&detail.backstack());

    fixture.switch_layout(false);

    assert!(!fixture.composition.is_two_pane());
    // Physical order: masters below, details above, both in order.
    let combined = ids(&fixture.sim.router("root").backstack()[0].controller().child_routers()[0].backstack());
    let expected: Vec<u64> = master_ids.iter().chain(detail_ids.iter()).copied().collect();
    assert_eq!(combined, expected);
    // The logical facades still see their own stacks.
    assert_eq!(ids(&master.backstack()), master_ids);
    assert_eq!(ids(&detail.backstack()), detail_ids);
    // The detail top is the one visible screen.
    assert!(detail.backstack()[1].controller().is_attached());
    assert!(!master.backstack()[1].controller().is_attached());
    assert_eq!(fixture.pane_child_count("master"), 1);
    assert!(!fixture.log.contains("d2.did_destroy"));
}

#[test]
fn split_then_merge_is_an_identity_on_the_stacks() {
    let fixture = Fixture::new(false);
    let master = fixture.composition.master();
    let detail = fixture.composition.detail();
    master.push(fixture.probe("m1"));
    detail.push(fixture.probe("d1"));
    detail.push(fixture.probe("d2"));
    let before_master = ids(&master.backstack());
    let before_detail = ids(&detail.backstack());

    fixture.switch_layout(true);
    fixture.switch_layout(false);

    assert_eq!(ids(&master.backstack()), before_master);
    assert_eq!(ids(&detail.backstack()), before_detail);
    assert!(detail.backstack()[1].controller().is_attached());
}

#[test]
fn empty_detail_stack_makes_layout_switches_trivial() {
    let fixture = Fixture::new(false);
    let master = fixture.composition.master();
    master.push(fixture.probe("m1"));
    master.push(fixture.probe("m2"));

    fixture.switch_layout(true);
    assert!(fixture.composition.is_two_pane());
    assert!(!fixture.composition.detail().has_root());
    assert!(master.backstack()[1].controller().is_attached());
    assert_eq!(fixture.pane_child_count("detail"), 0);

    fixture.switch_layout(false);
    assert_eq!(master.backstack_len(), 2);
    assert_eq!(fixture.composition.detail().backstack_len(), 0);
    assert!(master.backstack()[1].controller().is_attached());
}

#[test]
fn master_pop_to_root_leaves_details_visible_in_single_pane() {
    let fixture = Fixture::new(false);
    let master = fixture.composition.master();
    let detail = fixture.composition.detail();
    master.push(fixture.probe("m1"));
    master.push(fixture.probe("m2"));
    master.push(fixture.probe("m3"));
    detail.push(fixture.probe("d1"));

    assert!(master.pop_to_root());
    assert_eq!(master.backstack_len(), 1);
    assert!(fixture.log.contains("m2.did_destroy"));
    assert!(fixture.log.contains("m3.did_destroy"));
    // The visible detail never flinched.
    assert!(!fixture.log.contains("d1.will_detach"));
    assert!(detail.backstack()[0].controller().is_attached());
}

#[test]
fn master_push_in_single_pane_slots_below_the_details() {
    let fixture = Fixture::new(false);
    let master = fixture.composition.master();
    let detail = fixture.composition.detail();
    master.push(fixture.probe("m1"));
    detail.push(fixture.probe("d1"));
    let _ = fixture.log.take();

    master.push(fixture.probe("m2"));
    assert_eq!(master.backstack_len(), 2);
    // The detail stays on top and visible; no transition ran.
    assert!(detail.backstack()[0].controller().is_attached());
    assert!(!fixture.log.contains("d1.will_detach"));
    assert!(!fixture.log.contains("m2.did_attach"));

    // Popping the detail reveals the new master top.
    assert!(detail.pop_current());
    assert!(master.backstack()[1].controller().is_attached());
}

#[test]
fn detail_pop_on_empty_stack_reports_false() {
    let fixture = Fixture::new(false);
    fixture.composition.master().push(fixture.probe("m1"));
    assert!(!fixture.composition.detail().pop_current());

    fixture.switch_layout(true);
    assert!(!fixture.composition.detail().pop_current());
}

#[test]
fn detail_set_root_replaces_only_the_detail_stack() {
    let fixture = Fixture::new(true);
    let master = fixture.composition.master();
    let detail = fixture.composition.detail();
    master.push(fixture.probe("m1"));
    detail.push(fixture.probe("d1"));
    detail.push(fixture.probe("d2"));

    detail.set_root(fixture.probe("d3"));
    assert_eq!(detail.backstack_len(), 1);
    assert!(fixture.log.contains("d1.did_destroy"));
    assert!(fixture.log.contains("d2.did_destroy"));
    assert!(detail.backstack()[0].controller().is_attached());
    assert_eq!(master.backstack_len(), 1);
    assert!(master.backstack()[0].controller().is_attached());
}

#[test]
fn detail_pops_last_view_controls_the_empty_pane() {
    let fixture = Fixture::new(false);
    // Recorded before any detail router exists; applied at the two-pane
    // bind.
    fixture.composition.set_detail_pops_last_view(true);
    fixture.composition.master().push(fixture.probe("m1"));
    fixture.composition.detail().push(fixture.probe("d1"));

    fixture.switch_layout(true);
    let detail = fixture.composition.detail();
    assert!(detail.pop_current());
    assert!(!detail.has_root());
    assert_eq!(fixture.pane_child_count("detail"), 0);
    assert!(fixture.log.contains("d1.did_destroy"));
}

#[test]
fn detail_pop_to_root_in_single_pane_keeps_the_first_detail() {
    let fixture = Fixture::new(false);
    let master = fixture.composition.master();
    let detail = fixture.composition.detail();
    master.push(fixture.probe("m1"));
    detail.push(fixture.probe("d1"));
    detail.push(fixture.probe("d2"));
    detail.push(fixture.probe("d3"));

    assert!(detail.pop_to_root());
    assert_eq!(detail.backstack_len(), 1);
    assert!(detail.backstack()[0].controller().is_attached());
    assert!(fixture.log.contains("d2.did_destroy"));
    assert!(fixture.log.contains("d3.did_destroy"));
    assert_eq!(master.backstack_len(), 1);
}
