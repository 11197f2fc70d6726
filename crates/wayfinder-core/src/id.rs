//! Stable id generation.
//!
//! All Wayfinder identities — controller instance ids, transaction indices,
//! view and container ids — are drawn from one process-wide monotonic
//! counter. Uniqueness is the only requirement; after a state restore the
//! counter is bumped past every persisted id so fresh allocations can never
//! collide with restored ones.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate the next process-unique id. Never returns 0, so 0 can be used
/// as an "unassigned" sentinel by callers.
#[must_use]
pub fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Ensure future ids are strictly greater than `floor`.
///
/// Called during state restore with the largest persisted id.
pub fn reserve_ids_through(floor: u64) {
    NEXT_ID.fetch_max(floor.saturating_add(1), Ordering::Relaxed);
}
