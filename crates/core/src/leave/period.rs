//! Calendar arithmetic for leave requests.
//!
//! All dates are calendar dates; spans are inclusive (`end - start + 1`).

use chrono::{DateTime, Months, NaiveDate, TimeZone, Utc};
use leavedesk_shared::types::Days;

use crate::leave::error::LeaveError;

/// Computes the days a request charges.
///
/// Half day → 0.5, otherwise the inclusive span. The result depends only on
/// the three inputs, so recomputing it from stored columns always yields the
/// stored value.
///
/// # Errors
///
/// - `EndBeforeStart` if `end < start`
/// - `SingleDayRequired` if a half day spans more than one date
pub fn days_count(start: NaiveDate, end: NaiveDate, is_half_day: bool) -> Result<Days, LeaveError> {
    if end < start {
        return Err(LeaveError::EndBeforeStart { start, end });
    }
    if is_half_day {
        if end != start {
            return Err(LeaveError::SingleDayRequired { start, end });
        }
        return Ok(Days::HALF);
    }
    Ok(Days::whole((end - start).num_days() + 1))
}

/// The oldest date a request may start on: exactly one calendar month before
/// `today`. The floor itself is allowed.
#[must_use]
pub fn rolling_floor(today: NaiveDate) -> NaiveDate {
    today.checked_sub_months(Months::new(1)).unwrap_or(NaiveDate::MIN)
}

/// Checks both dates against the rolling floor.
///
/// # Errors
///
/// Returns `DateBeforeFloor` for the first date older than the floor.
pub fn check_floor(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Result<(), LeaveError> {
    let floor = rolling_floor(today);
    for date in [start, end] {
        if date < floor {
            return Err(LeaveError::DateBeforeFloor { date, floor });
        }
    }
    Ok(())
}

/// The calendar date of `now` in `tz`.
#[must_use]
pub fn local_today<Tz: TimeZone>(now: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    now.with_timezone(tz).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case(date(2025, 3, 3), date(2025, 3, 7), false, dec!(5))]
    #[case(date(2025, 3, 3), date(2025, 3, 3), false, dec!(1))]
    #[case(date(2025, 3, 3), date(2025, 3, 3), true, dec!(0.5))]
    #[case(date(2024, 12, 30), date(2025, 1, 2), false, dec!(4))]
    #[case(date(2024, 2, 28), date(2024, 3, 1), false, dec!(3))]
    fn test_days_count(
        #[case] start: NaiveDate,
        #[case] end: NaiveDate,
        #[case] half: bool,
        #[case] expected: rust_decimal::Decimal,
    ) {
        assert_eq!(days_count(start, end, half).unwrap().amount(), expected);
    }

    #[test]
    fn test_days_count_rejects_reversed_range() {
        assert!(matches!(
            days_count(date(2025, 3, 7), date(2025, 3, 3), false),
            Err(LeaveError::EndBeforeStart { .. })
        ));
    }

    #[test]
    fn test_half_day_must_be_single_date() {
        assert!(matches!(
            days_count(date(2025, 3, 3), date(2025, 3, 4), true),
            Err(LeaveError::SingleDayRequired { .. })
        ));
    }

    #[rstest]
    #[case(date(2025, 3, 15), date(2025, 2, 15))]
    #[case(date(2025, 3, 31), date(2025, 2, 28))]
    #[case(date(2024, 3, 31), date(2024, 2, 29))]
    #[case(date(2025, 1, 10), date(2024, 12, 10))]
    fn test_rolling_floor(#[case] today: NaiveDate, #[case] floor: NaiveDate) {
        assert_eq!(rolling_floor(today), floor);
    }

    #[test]
    fn test_floor_date_itself_is_allowed() {
        let today = date(2025, 3, 15);
        assert!(check_floor(date(2025, 2, 15), date(2025, 2, 16), today).is_ok());
        assert!(matches!(
            check_floor(date(2025, 2, 14), date(2025, 2, 16), today),
            Err(LeaveError::DateBeforeFloor { .. })
        ));
    }

    #[test]
    fn test_local_today_uses_timezone() {
        let now = DateTime::parse_from_rfc3339("2025-01-01T20:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        assert_eq!(local_today(now, &Utc), date(2025, 1, 1));
        assert_eq!(local_today(now, &ist), date(2025, 1, 2));
    }
}
