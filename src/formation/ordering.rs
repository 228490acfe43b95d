//! Search ordering for a formation pass
//!
//! Longest waiters come first, then lower skill, then lower latency. The
//! order only decides which combinations fall inside the candidate budget.

use crate::types::Participant;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;

/// Sort participants by waiting time descending, skill ascending, latency ascending
///
/// The sort is stable, so fully tied participants keep their snapshot order.
pub fn order_for_formation(participants: &mut [Participant], now: DateTime<Utc>) {
    participants
        .sort_by_cached_key(|p| (Reverse(p.waiting_time(now)), p.skill, p.latency_ms));
}
