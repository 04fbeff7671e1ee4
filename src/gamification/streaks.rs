//! Daily learning streak.

use chrono::NaiveDate;

/// Streak after activity on `today`, given the day of the last recorded activity.
///
/// Same day keeps the count (a fresh profile starts at 1), the following day extends it,
/// any gap restarts at 1.
pub fn next_streak(current: u32, last_active: NaiveDate, today: NaiveDate) -> u32 {
    let days_since = (today - last_active).num_days();
    match days_since {
        0 => current.max(1),
        1 => current + 1,
        _ => 1,
    }
}
