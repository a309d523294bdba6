use chrono::{DateTime, Utc};

use crate::card::RepeatingDays;

pub fn is_any_day_active(days: &RepeatingDays) -> bool {
    days.any_active()
}

/// A card without a due date never expires.
pub fn is_expired(due_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    due_date.is_some_and(|due| due < now)
}

/// Whether the edit form must render its save button disabled.
///
/// Blocked when the date fieldset is open without a concrete date, when the
/// date and repeat fieldsets are open together, or when repeat mode is on
/// with no day selected.
pub fn is_save_blocked(
    is_date_showing: bool,
    due_date: Option<DateTime<Utc>>,
    is_repeating_card: bool,
    active_repeating_days: &RepeatingDays,
) -> bool {
    (is_date_showing && is_repeating_card)
        || (is_date_showing && due_date.is_none())
        || (is_repeating_card && !is_any_day_active(active_repeating_days))
}
