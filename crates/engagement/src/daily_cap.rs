//! Daily cap - per-performer engagement count for the current day
//!
//! The count is recomputed on demand from the engagement records themselves.
//! There is deliberately no separate counter to increment: a second piece of
//! mutable state could drift from the records it summarizes.

use crate::engagement::Engagement;
use chrono::{DateTime, Utc};

/// Computes a performer's engagement count within the current day window.
///
/// The window is the UTC calendar day containing `now`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DailyCapTracker;

impl DailyCapTracker {
    /// Count engagements created within the UTC day containing `now`.
    ///
    /// Every claim counts, whatever its current status; a failed attempt
    /// still consumed one of the day's slots.
    pub fn count_today<'a>(
        &self,
        engagements: impl IntoIterator<Item = &'a Engagement>,
        now: DateTime<Utc>,
    ) -> usize {
        let today = now.date_naive();
        engagements
            .into_iter()
            .filter(|e| e.created_at.date_naive() == today)
            .count()
    }
}
