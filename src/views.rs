//! Visit counting with per-client de-duplication.
//!
//! A client is counted at most once per [`DEDUP_WINDOW`]; visit records older
//! than [`RETENTION`] are dropped whenever a new visit is counted.

use crate::game::{Game, ViewRecord};
use chrono::{DateTime, Duration, Utc};

/// A repeat visit from the same client inside this window is not counted.
pub const DEDUP_WINDOW: Duration = Duration::hours(24);
/// Visit records are kept this long.
pub const RETENTION: Duration = Duration::days(30);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Result of registering a visit.
pub struct ViewOutcome {
    /// Visit count after this visit.
    pub click_count: u64,
    /// Whether this visit incremented the count.
    pub counted: bool,
}

/// Counts a visit from `ip` at `now` unless it repeats a recent one.
///
/// The game only changes, and only needs saving, when the visit was counted.
pub fn register_view(game: &mut Game, ip: &str, now: DateTime<Utc>) -> ViewOutcome {
    let window_start = now - DEDUP_WINDOW;
    let recent = game
        .viewed_ips
        .iter()
        .any(|view| view.ip == ip && view.timestamp > window_start);

    if !recent {
        game.click_count += 1;
        game.viewed_ips.push(ViewRecord {
            ip: ip.to_string(),
            timestamp: now,
        });
        let retain_after = now - RETENTION;
        game.viewed_ips.retain(|view| view.timestamp > retain_after);
    }

    ViewOutcome {
        click_count: game.click_count,
        counted: !recent,
    }
}

#[cfg(test)]
#[path = "tests/views.rs"]
mod tests;
