//! Availability checking for lease intervals.
//!
//! Intervals are half-open `[start, end)`, so a lease ending on the day
//! another begins does not conflict. Terminal leases never block a
//! property. The check is only meaningful while the caller holds the
//! property's lock: without it, two concurrent creations could both pass
//! before either persists, which is precisely the race the lock exists to
//! prevent.

use chrono::{DateTime, Utc};
use haven_core::PropertyId;
use haven_store::{Lease, Store, StoreError};

/// True if the half-open intervals `[a_start, a_end)` and `[b_start, b_end)`
/// intersect.
#[must_use]
pub fn intervals_overlap(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Find a non-terminal lease on `property_id` whose interval intersects
/// `[start, end)`, if any.
///
/// Must be called with the property's lock held.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn find_conflict<S: Store>(
    store: &S,
    property_id: &PropertyId,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Option<Lease>, StoreError> {
    let leases = store.list_leases_by_property(property_id)?;

    Ok(leases.into_iter().find(|lease| {
        !lease.state.is_terminal()
            && intervals_overlap(lease.start_date, lease.end_date, start, end)
    }))
}
