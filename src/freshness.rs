//! Day-granularity freshness policy for the cached rate set.
//!
//! Cached data is fresh while the last successful refresh happened on the
//! same local calendar day. This is not a rolling 24-hour window: a fetch
//! at 23:59 is already stale at 00:01 the next day.

use chrono::{DateTime, Local, TimeZone, Utc};

/// Sentinel for "never fetched" in the persisted `lastUpdated` preference.
pub const UNSET_TIMESTAMP: i64 = 0;

/// Whether data saved at `last_saved_millis` is still fresh at
/// `now_millis`, judged against the system's local calendar.
pub fn is_fresh(now_millis: i64, last_saved_millis: i64) -> bool {
    is_fresh_in(&Local, now_millis, last_saved_millis)
}

/// Zone-explicit variant of [`is_fresh`].
///
/// A saved timestamp of [`UNSET_TIMESTAMP`] is never fresh. A saved
/// calendar date ahead of `now` (clock skew) still counts as fresh.
pub fn is_fresh_in<Tz: TimeZone>(tz: &Tz, now_millis: i64, last_saved_millis: i64) -> bool {
    if last_saved_millis == UNSET_TIMESTAMP {
        return false;
    }

    let (Some(now), Some(saved)) = (
        DateTime::<Utc>::from_timestamp_millis(now_millis),
        DateTime::<Utc>::from_timestamp_millis(last_saved_millis),
    ) else {
        return false;
    };

    let now_date = now.with_timezone(tz).date_naive();
    let saved_date = saved.with_timezone(tz).date_naive();
    now_date.signed_duration_since(saved_date).num_days() < 1
}

// ============================================================================
// Tests
// ============================================================================
