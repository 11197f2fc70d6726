//! Property-based invariant tests for the router backstack.
//!
//! These tests verify structural invariants that must hold after **any**
//! sequence of navigation and host operations:
//!
//! 1. No operation sequence panics.
//! 2. Exactly the top entry is attached while the host is live, and
//!    nothing is attached while it is not.
//! 3. The host container holds exactly the visible views.
//! 4. Every controller that leaves the backstack is destroyed, and no
//!    controller still on the backstack is.
//! 5. Transaction indices are strictly increasing along the stack.
//! 6. Lifecycle hooks arrive in legal per-screen order.

use proptest::prelude::*;
use wayfinder_harness::{CallLog, HostSim, ProbeScreen};
use wayfinder_runtime::{Controller, Router, Transaction};

// ── Operations ──────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
enum Op {
    Push,
    PopCurrent,
    PopToRoot,
    SetRoot,
    HandleBack,
    /// Remove a buried entry, picked by this seed modulo the stack depth.
    RemoveBuried(usize),
    HostStop,
    HostStart,
    ConfigurationChange,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => Just(Op::Push),
        3 => Just(Op::PopCurrent),
        1 => Just(Op::PopToRoot),
        1 => Just(Op::SetRoot),
        2 => Just(Op::HandleBack),
        2 => (0usize..16).prop_map(Op::RemoveBuried),
        1 => Just(Op::HostStop),
        1 => Just(Op::HostStart),
        1 => Just(Op::ConfigurationChange),
    ]
}

// ── Harness ─────────────────────────────────────────────────────────────

struct Model {
    sim: HostSim,
    log: CallLog,
    started: bool,
    next_name: u32,
    /// Every controller ever placed on the stack, for destruction checks.
    seen: Vec<Controller>,
}

impl Model {
    fn new() -> Self {
        Self {
            sim: HostSim::started(),
            log: CallLog::new(),
            started: true,
            next_name: 0,
            seen: Vec::new(),
        }
    }

    fn router(&self) -> Router {
        self.sim.router("root")
    }

    fn fresh_entry(&mut self) -> Transaction {
        let name = format!("s{}", self.next_name);
        self.next_name += 1;
        let entry = ProbeScreen::new(name, &self.log).into_transaction();
        self.seen.push(entry.controller());
        entry
    }

    fn apply(&mut self, op: Op) {
        let router = self.router();
        match op {
            Op::Push => {
                let entry = self.fresh_entry();
                router.push_controller(entry);
            }
            Op::PopCurrent => {
                if router.backstack_len() > 0 {
                    let _ = router.pop_current_controller();
                }
            }
            Op::PopToRoot => {
                let _ = router.pop_to_root();
            }
            Op::SetRoot => {
                let entry = self.fresh_entry();
                router.set_root(entry);
            }
            Op::HandleBack => {
                let _ = router.handle_back();
            }
            Op::RemoveBuried(seed) => {
                let mut stack = router.backstack();
                if stack.len() >= 2 {
                    stack.remove(seed % (stack.len() - 1));
                    router.set_backstack(stack, None);
                }
            }
            Op::HostStop => {
                if self.started {
                    self.sim.stop();
                    self.started = false;
                }
            }
            Op::HostStart => {
                if !self.started {
                    self.sim.start();
                    self.started = true;
                }
            }
            Op::ConfigurationChange => {
                self.sim.configuration_change();
                let container = self.sim.rebuild_container("root");
                let _ = self.sim.binding().router(&container);
                self.sim.start();
                self.started = true;
            }
        }
    }

    fn check_invariants(&self) {
        let router = self.router();
        let stack = router.backstack();

        // 2. Attachment is exactly the live top.
        for (position, entry) in stack.iter().enumerate() {
            let controller = entry.controller();
            let should_attach = self.started && position == stack.len() - 1;
            assert_eq!(
                controller.is_attached(),
                should_attach,
                "entry {position} of {} attached={} (host started: {})",
                stack.len(),
                controller.is_attached(),
                self.started,
            );
            assert!(!controller.is_destroyed(), "live entry {position} destroyed");
        }

        // 3. The container mirrors attachment.
        let expected_children = usize::from(self.started && !stack.is_empty());
        assert_eq!(
            self.sim.container("root").child_count(),
            expected_children,
            "container children (host started: {}, depth {})",
            self.started,
            stack.len(),
        );

        // 4. Everything that left the stack is destroyed.
        for controller in &self.seen {
            let on_stack = stack
                .iter()
                .any(|entry| entry.controller().same_as(controller));
            if !on_stack {
                assert!(
                    controller.is_destroyed(),
                    "controller #{} left the stack without being destroyed",
                    controller.instance_id(),
                );
            }
        }

        // 5. Indices strictly increase from bottom to top.
        for pair in stack.windows(2) {
            assert!(
                pair[0].index() < pair[1].index(),
                "indices out of order: {} then {}",
                pair[0].index(),
                pair[1].index(),
            );
        }
    }

    // 6. For each screen, the ordered hook stream must be a legal walk of
    // the lifecycle. Checked per name against a tiny state machine.
    fn check_hook_orders(&self) {
        use std::collections::HashMap;

        #[derive(Clone, Copy, PartialEq, Debug)]
        enum Phase {
            Detached,
            Attaching,
            Attached,
            Detaching,
            Destroyed,
        }

        let mut phases: HashMap<String, Phase> = HashMap::new();
        for entry in self.log.entries() {
            let Some((name, hook)) = entry.split_once('.') else {
                continue;
            };
            let phase = phases.entry(name.to_owned()).or_insert(Phase::Detached);
            let next = match (*phase, hook) {
                (Phase::Detached, "will_attach") => Phase::Attaching,
                (Phase::Attaching, "did_attach") => Phase::Attached,
                (Phase::Attached, "will_detach") => Phase::Detaching,
                (Phase::Detaching, "did_detach") => Phase::Detached,
                (Phase::Detached, "will_destroy") => Phase::Destroyed,
                (_, "will_destroy" | "will_attach" | "did_attach" | "will_detach" | "did_detach") => {
                    panic!("{name}: `{hook}` while {phase:?}\nlog: {:#?}", self.log.entries())
                }
                // View and context hooks are checked by the unit suites.
                _ => *phase,
            };
            *phase = next;
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// Random walks over navigation and host lifecycle
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Any operation sequence leaves the router in a consistent state.
    #[test]
    fn random_walk_holds_invariants(ops in proptest::collection::vec(op(), 0..40)) {
        let mut model = Model::new();
        for op in ops {
            model.apply(op);
            model.check_invariants();
        }
        model.check_hook_orders();
    }

    /// Tearing the host down at any point destroys the whole stack,
    /// bottom entries included.
    #[test]
    fn host_destroy_always_drains_everything(ops in proptest::collection::vec(op(), 0..25)) {
        let mut model = Model::new();
        for op in ops {
            model.apply(op);
        }
        model.sim.destroy();
        for controller in &model.seen {
            prop_assert!(controller.is_destroyed());
        }
        model.check_hook_orders();
    }

    /// Pop after push is an identity on the stack shape, regardless of
    /// what happened before.
    #[test]
    fn push_then_pop_restores_depth(ops in proptest::collection::vec(op(), 0..20)) {
        let mut model = Model::new();
        for op in ops {
            model.apply(op);
        }
        if !model.started {
            model.sim.start();
            model.started = true;
        }
        let router = model.router();
        if router.backstack_len() == 0 {
            let entry = model.fresh_entry();
            model.router().set_root(entry);
        }
        let router = model.router();
        let depth = router.backstack_len();
        let entry = model.fresh_entry();
        let pushed = entry.controller();
        router.push_controller(entry);
        prop_assert!(router.pop_current_controller());
        prop_assert_eq!(router.backstack_len(), depth);
        prop_assert!(pushed.is_destroyed());
        model.check_invariants();
    }
}
