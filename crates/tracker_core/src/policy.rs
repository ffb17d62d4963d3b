//! Which days of the tracked month may still be toggled.
//!
//! Inside the current real month, days before today are locked. When the
//! tracked month is not the real month (`today` is `None`) every day stays
//! editable.

use std::ops::RangeInclusive;

pub fn can_toggle(day: u32, today: Option<u32>) -> bool {
    match today {
        Some(today) => day >= today,
        None => true,
    }
}

/// Days of a `days_in_month` month that `can_toggle` accepts.
pub fn editable_days(days_in_month: u32, today: Option<u32>) -> RangeInclusive<u32> {
    let first = today.unwrap_or(1).max(1);
    first..=days_in_month
}
