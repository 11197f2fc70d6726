//! Abstract view and container model.
//!
//! Wayfinder does not render anything; it only tracks which views are
//! attached where. A [`View`] is the unit a screen owns, and may expose
//! named nested [`Container`]s for child routers (a master/detail layout,
//! for example, exposes `"master"` and usually `"detail"`). A [`Container`]
//! is an ordered set of attached view ids plus a liveness bit: when the host
//! tears a container down, routers holding a [`WeakContainer`] observe the
//! death instead of keeping the dead subtree alive.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::id::next_id;

/// Identity of a [`View`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(u64);

impl ViewId {
    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Identity of a [`Container`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContainerId(u64);

impl ContainerId {
    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// A screen's view: an id, a diagnostic label, and named child containers.
pub struct View {
    id: ViewId,
    label: String,
    containers: Vec<(String, Container)>,
}

impl View {
    /// Build a view with a diagnostic label (usually the screen type name).
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: ViewId(next_id()),
            label: label.into(),
            containers: Vec::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> ViewId {
        self.id
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Declare a named child container inside this view and return a handle
    /// to it. Declaring the same name twice returns the existing container.
    pub fn add_container(&mut self, name: impl Into<String>) -> Container {
        let name = name.into();
        if let Some((_, c)) = self.containers.iter().find(|(n, _)| *n == name) {
            return c.clone();
        }
        let container = Container::new(name.clone());
        self.containers.push((name, container.clone()));
        container
    }

    /// Look up a declared child container by name.
    #[must_use]
    pub fn container(&self, name: &str) -> Option<Container> {
        self.containers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c.clone())
    }

    /// Names of all declared child containers, in declaration order.
    #[must_use]
    pub fn container_names(&self) -> Vec<String> {
        self.containers.iter().map(|(n, _)| n.clone()).collect()
    }

    /// Kill every nested container. Called when the view is destroyed so
    /// child routers observe the loss of their host.
    pub fn kill_containers(&mut self) {
        for (_, container) in &self.containers {
            container.kill();
        }
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("containers", &self.container_names())
            .finish()
    }
}

struct ContainerState {
    id: ContainerId,
    name: String,
    live: bool,
    children: Vec<ViewId>,
}

/// An ordered set of attached views, owned by the host layout or by a
/// screen's view.
///
/// Handles are reference-counted; routers hold a [`WeakContainer`] so a
/// dead host layout is observed rather than retained.
#[derive(Clone)]
pub struct Container {
    state: Rc<RefCell<ContainerState>>,
}

impl Container {
    /// Create a live, empty container.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            state: Rc::new(RefCell::new(ContainerState {
                id: ContainerId(next_id()),
                name: name.into(),
                live: true,
                children: Vec::new(),
            })),
        }
    }

    #[must_use]
    pub fn id(&self) -> ContainerId {
        self.state.borrow().id
    }

    #[must_use]
    pub fn name(&self) -> String {
        self.state.borrow().name.clone()
    }

    /// Whether the container is still usable. Dead containers reject all
    /// attach operations.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.state.borrow().live
    }

    #[must_use]
    pub fn child_count(&self) -> usize {
        self.state.borrow().children.len()
    }

    #[must_use]
    pub fn contains(&self, view: ViewId) -> bool {
        self.state.borrow().children.contains(&view)
    }

    /// Attached view ids, bottom to top.
    #[must_use]
    pub fn children(&self) -> Vec<ViewId> {
        self.state.borrow().children.clone()
    }

    /// Attach a view on top. No-op if already attached.
    ///
    /// # Panics
    /// Panics if the container is dead; attaching into a torn-down host is a
    /// programming error.
    pub fn attach(&self, view: ViewId) {
        let mut state = self.state.borrow_mut();
        assert!(
            state.live,
            "attach into dead container `{}`; the host tore this container down",
            state.name
        );
        if !state.children.contains(&view) {
            crate::trace!(container = %state.name, view = view.as_u64(), "attach view");
            state.children.push(view);
        }
    }

    /// Detach a view. Returns whether it was attached. Safe on dead
    /// containers (detaching from a torn-down host is a benign no-op).
    pub fn detach(&self, view: ViewId) -> bool {
        let mut state = self.state.borrow_mut();
        match state.children.iter().position(|v| *v == view) {
            Some(idx) => {
                crate::trace!(container = %state.name, view = view.as_u64(), "detach view");
                state.children.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Mark the container dead and drop its children. Idempotent.
    pub fn kill(&self) {
        let mut state = self.state.borrow_mut();
        if state.live {
            crate::trace!(container = %state.name, "kill container");
            state.live = false;
            state.children.clear();
        }
    }

    /// Downgrade to a non-owning handle.
    #[must_use]
    pub fn downgrade(&self) -> WeakContainer {
        WeakContainer {
            state: Rc::downgrade(&self.state),
        }
    }

    /// Identity comparison: two handles to the same container.
    #[must_use]
    pub fn same_as(&self, other: &Container) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Container")
            .field("id", &state.id)
            .field("name", &state.name)
            .field("live", &state.live)
            .field("children", &state.children)
            .finish()
    }
}

/// Non-owning handle to a [`Container`].
#[derive(Clone, Default)]
pub struct WeakContainer {
    state: Weak<RefCell<ContainerState>>,
}

impl WeakContainer {
    /// A handle that never upgrades.
    #[must_use]
    pub fn dead() -> Self {
        Self::default()
    }

    /// Upgrade to a live container, or `None` if the container was dropped
    /// or killed.
    #[must_use]
    pub fn upgrade_live(&self) -> Option<Container> {
        let container = Container {
            state: self.state.upgrade()?,
        };
        container.is_live().then_some(container)
    }
}

impl fmt::Debug for WeakContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade_live() {
            Some(c) => write!(f, "WeakContainer({:?})", c.id()),
            None => write!(f, "WeakContainer(dead)"),
        }
    }
}
