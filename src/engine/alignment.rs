use chrono::{Months, NaiveDate};

use crate::types::{is_crisis_period, Alignment};

/// Days per horizon step. Coarse bucketing, not calendar months.
const DAYS_PER_STEP: i64 = 30;

/// The date a query actually forecasts: one calendar month earlier.
///
/// Days that do not exist in the previous month resolve to its last day,
/// so 2024-03-31 maps to 2024-02-29.
pub fn target_date(query_date: NaiveDate) -> NaiveDate {
    query_date
        .checked_sub_months(Months::new(1))
        .unwrap_or(NaiveDate::MIN)
}

/// `max(1, floor(days_diff / 30) + 1)`
pub fn steps_ahead(days_diff: i64) -> usize {
    let steps = days_diff.div_euclid(DAYS_PER_STEP) + 1;
    steps.max(1) as usize
}

/// Map a query date onto the horizon past `cutoff`. Accepts any date.
pub fn align(query_date: NaiveDate, cutoff: NaiveDate) -> Alignment {
    let target_date = target_date(query_date);
    let days_diff = (target_date - cutoff).num_days();

    Alignment {
        target_date,
        days_diff,
        steps_ahead: steps_ahead(days_diff),
        crisis_period: is_crisis_period(target_date),
    }
}
