//! Screen lifecycle states and transitions.
//!
//! A screen moves through:
//!
//! ```text
//! Initialized ──(view created)──▶ ViewCreated ──(attached)──▶ Attached
//!      ▲                              │  ▲                        │
//!      └──────(view destroyed)────────┘  └──────(detached)────────┘
//!
//! any non-terminal state ──(destroy)──▶ Destroyed
//! ```
//!
//! `Destroyed` is terminal. A detach only destroys the view when the
//! screen's [`RetainViewMode`] says so; retained views skip the
//! create-view/destroy-view pair on the next attach cycle.

/// Lifecycle state of a screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    /// Created, no view yet (or view destroyed again).
    Initialized,
    /// View exists but is not attached to a container.
    ViewCreated,
    /// View is attached to a container; the screen is current.
    Attached,
    /// Torn down. No further transitions are permitted.
    Destroyed,
}

impl LifecycleState {
    /// Whether a view currently exists for this state.
    #[must_use]
    pub fn has_view(self) -> bool {
        matches!(self, Self::ViewCreated | Self::Attached)
    }

    /// Whether the screen is attached to a container.
    #[must_use]
    pub fn is_attached(self) -> bool {
        matches!(self, Self::Attached)
    }

    /// Whether the screen is permanently destroyed.
    #[must_use]
    pub fn is_destroyed(self) -> bool {
        matches!(self, Self::Destroyed)
    }
}

/// Governs whether a detach destroys the screen's view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RetainViewMode {
    /// Destroy the view on every detach. The default.
    #[default]
    ReleaseOnDetach,
    /// Keep the view alive until the screen itself is destroyed, including
    /// across host context loss.
    Retain,
    /// Keep the view across ordinary detaches, but release it when the host
    /// context is lost.
    RetainWhileDetached,
}

impl RetainViewMode {
    /// Whether an ordinary detach (host still alive) releases the view.
    #[must_use]
    pub fn releases_on_detach(self) -> bool {
        matches!(self, Self::ReleaseOnDetach)
    }

    /// Whether losing the host context releases the view.
    #[must_use]
    pub fn releases_on_context_loss(self) -> bool {
        !matches!(self, Self::Retain)
    }

    /// Stable identifier used by persistence.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReleaseOnDetach => "release-on-detach",
            Self::Retain => "retain",
            Self::RetainWhileDetached => "retain-while-detached",
        }
    }

    /// Inverse of [`as_str`](Self::as_str); unknown strings fall back to the
    /// default mode.
    #[must_use]
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "retain" => Self::Retain,
            "retain-while-detached" => Self::RetainWhileDetached,
            _ => Self::ReleaseOnDetach,
        }
    }
}

/// Lifecycle transition notifications, as observed from outside a screen.
///
/// Observers receive the same transitions the screen's own hooks fire, in
/// the same strict order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The screen's view was just built.
    DidCreateView,
    /// About to attach to a container.
    WillAttach,
    /// Attached; the screen is now current.
    DidAttach,
    /// About to detach from its container.
    WillDetach,
    /// Detached; view may or may not survive per retain mode.
    DidDetach,
    /// The view is about to be destroyed (after view-state save).
    WillDestroyView,
    /// The view is gone.
    DidDestroyView,
    /// Final destruction is starting; all child routers are already down.
    WillDestroy,
    /// The screen is destroyed. Terminal.
    DidDestroy,
    /// Host context became available (fires once per context acquisition).
    ContextAvailable,
    /// Host context was lost (fires once per loss).
    ContextUnavailable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_predicates() {
        assert!(!LifecycleState::Initialized.has_view());
        assert!(LifecycleState::ViewCreated.has_view());
        assert!(LifecycleState::Attached.has_view());
        assert!(LifecycleState::Attached.is_attached());
        assert!(!LifecycleState::ViewCreated.is_attached());
        assert!(LifecycleState::Destroyed.is_destroyed());
    }

    #[test]
    fn retain_mode_round_trips_through_str() {
        for mode in [
            RetainViewMode::ReleaseOnDetach,
            RetainViewMode::Retain,
            RetainViewMode::RetainWhileDetached,
        ] {
            assert_eq!(RetainViewMode::from_str_lossy(mode.as_str()), mode);
        }
        assert_eq!(
            RetainViewMode::from_str_lossy("bogus"),
            RetainViewMode::ReleaseOnDetach
        );
    }

    #[test]
    fn retain_mode_release_rules() {
        assert!(RetainViewMode::ReleaseOnDetach.releases_on_detach());
        assert!(!RetainViewMode::Retain.releases_on_detach());
        assert!(!RetainViewMode::RetainWhileDetached.releases_on_detach());
        assert!(RetainViewMode::ReleaseOnDetach.releases_on_context_loss());
        assert!(!RetainViewMode::Retain.releases_on_context_loss());
        assert!(RetainViewMode::RetainWhileDetached.releases_on_context_loss());
    }
}
