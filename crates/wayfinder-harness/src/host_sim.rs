//! A simulated host for driving routers through their lifecycle.

use std::cell::RefCell;

use wayfinder_core::Container;
use wayfinder_runtime::{HostBinding, Router, RouterSavedState};

/// Owns a [`HostBinding`] plus the containers a real host layout would
/// provide, and replays host lifecycle signals on demand.
pub struct HostSim {
    binding: HostBinding,
    containers: RefCell<Vec<Container>>,
}

impl HostSim {
    /// A host that has not attached yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            binding: HostBinding::install(),
            containers: RefCell::new(Vec::new()),
        }
    }

    /// A host that is already showing UI.
    #[must_use]
    pub fn started() -> Self {
        let sim = Self::new();
        sim.binding.on_host_attach();
        sim
    }

    #[must_use]
    pub fn binding(&self) -> &HostBinding {
        &self.binding
    }

    /// The live container with this name, created on first request.
    #[must_use]
    pub fn container(&self, name: &str) -> Container {
        if let Some(container) = self
            .containers
            .borrow()
            .iter()
            .find(|c| c.name() == name && c.is_live())
        {
            return container.clone();
        }
        let container = Container::new(name);
        self.containers.borrow_mut().push(container.clone());
        container
    }

    /// The root router bound to the named container.
    #[must_use]
    pub fn router(&self, name: &str) -> Router {
        self.binding.router(&self.container(name))
    }

    /// Kill the named container and hand out a fresh one, as a host does
    /// when it rebuilds its layout.
    #[must_use]
    pub fn rebuild_container(&self, name: &str) -> Container {
        if let Some(container) = self
            .containers
            .borrow()
            .iter()
            .find(|c| c.name() == name && c.is_live())
        {
            container.kill();
        }
        self.container(name)
    }

    pub fn start(&self) {
        self.binding.on_host_attach();
    }

    pub fn stop(&self) {
        self.binding.on_host_detach();
    }

    /// Full configuration change: context loss for every screen, then all
    /// containers die. Follow with [`start`](Self::start) and fresh
    /// containers.
    pub fn configuration_change(&self) {
        self.binding.on_host_configuration_lost(true);
        for container in self.containers.borrow().iter() {
            container.kill();
        }
    }

    pub fn destroy(&self) {
        self.binding.on_host_destroy();
    }

    /// Saved state of every root router, keyed by container name.
    #[must_use]
    pub fn save(&self) -> Vec<(Option<String>, RouterSavedState)> {
        self.binding.save_state()
    }
}

impl Default for HostSim {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HostSim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostSim")
            .field("binding", &self.binding)
            .field("containers", &self.containers.borrow().len())
            .finish()
    }
}
