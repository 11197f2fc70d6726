#![forbid(unsafe_code)]

//! Test harness for Wayfinder.
//!
//! - **Probe screens**: record every lifecycle hook into a shared
//!   [`CallLog`], so tests assert on ordering instead of on internals.
//! - **Transition gates**: change handlers that park mid-flight until the
//!   test drives them, for exercising queueing and abort paths.
//! - **Host simulation**: a [`HostSim`] that owns containers and replays
//!   host lifecycle (attach, detach, layout rebuilds, destruction).
//!
//! # Quick Start
//!
//! ```ignore
//! use wayfinder_harness::{CallLog, HostSim, ProbeScreen};
//!
//! #[test]
//! fn back_pops_the_stack() {
//!     let log = CallLog::new();
//!     let sim = HostSim::started();
//!     let router = sim.router("root");
//!     router.set_root(ProbeScreen::new("home", &log).into_transaction());
//!     router.push_controller(ProbeScreen::new("settings", &log).into_transaction());
//!     assert!(router.handle_back());
//!     assert!(log.contains("settings.did_detach"));
//! }
//! ```

pub mod host_sim;
pub mod probe;
pub mod recording;
pub mod transition_gate;

pub use host_sim::HostSim;
pub use probe::{CallLog, ProbeScreen, register_probe};
pub use recording::{RecordingListener, RecordingObserver};
pub use transition_gate::TransitionGate;
