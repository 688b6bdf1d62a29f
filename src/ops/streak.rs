use chrono::{Days, NaiveDate};
use tracing::debug;

use crate::model::activity::{ActivityLedger, ActivityLog};
use crate::model::streak::StreakState;

/// Bring the streak up to date for `today`.
///
/// Safe to call any number of times per day: once today has been counted
/// further calls leave the state alone. Yesterday's streak survives a day
/// with no activity yet; a gap of two or more days resets the current count.
/// `longest` only ever grows.
pub fn recompute(
    streak: &mut StreakState,
    ledger: &ActivityLedger,
    log: &mut ActivityLog,
    today: NaiveDate,
) -> StreakState {
    if streak.last_active_date == Some(today) {
        return *streak;
    }
    let yesterday = today.checked_sub_days(Days::new(1));
    let continues = streak.last_active_date.is_some() && streak.last_active_date == yesterday;

    if !ledger.get(today).is_empty() {
        log.insert(today);
        streak.count = if continues { streak.count.saturating_add(1) } else { 1 };
        streak.last_active_date = Some(today);
        streak.longest = streak.longest.max(streak.count);
    } else if !continues {
        streak.count = 0;
    }

    debug!(count = streak.count, longest = streak.longest, %today, "streak recomputed");
    *streak
}
