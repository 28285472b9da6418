//! Priority computation for MONITOR jobs (spec.md §4.3). INITIAL and
//! PRIORITY jobs always use priority `1`; MONITOR jobs scale down as the
//! nearest upcoming notification hour approaches.

use chrono::{NaiveTime, Timelike};

pub const ALWAYS_HIGHEST: i16 = 1;

/// `hoursUntil(t)` against `nearest_hhmm` (already resolved from the
/// tenant's schedule by [`crate::domain::tenant::nearest_upcoming_hour`]),
/// evaluated relative to `current_hhmm`.
pub fn monitor_priority(current_hhmm: &str, nearest_hhmm: &str) -> i16 {
    let hours_until = hours_until(current_hhmm, nearest_hhmm);

    if hours_until < 1.0 {
        1
    } else if hours_until < 3.0 {
        2
    } else if hours_until < 6.0 {
        3
    } else {
        5
    }
}

fn parse_hhmm(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M").unwrap_or_else(|_| NaiveTime::from_hms_opt(23, 59, 0).unwrap())
}

fn hours_until(current_hhmm: &str, target_hhmm: &str) -> f64 {
    let current = parse_hhmm(current_hhmm);
    let target = parse_hhmm(target_hhmm);

    let current_mins = current.hour() as i64 * 60 + current.minute() as i64;
    let mut target_mins = target.hour() as i64 * 60 + target.minute() as i64;

    if target_mins < current_mins {
        target_mins += 24 * 60;
    }

    (target_mins - current_mins) as f64 / 60.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_one_hour_is_highest_priority() {
        assert_eq!(monitor_priority("14:30", "15:00"), 1);
    }

    #[test]
    fn within_three_hours_is_priority_two() {
        assert_eq!(monitor_priority("14:00", "16:30"), 2);
    }

    #[test]
    fn within_six_hours_is_priority_three() {
        assert_eq!(monitor_priority("08:00", "13:00"), 3);
    }

    #[test]
    fn far_out_is_priority_five() {
        assert_eq!(monitor_priority("08:00", "20:00"), 5);
    }

    #[test]
    fn wraps_past_midnight() {
        // current 23:30, nearest 00:30 -> 1 hour away
        assert_eq!(monitor_priority("23:30", "00:30"), 1);
    }
}
