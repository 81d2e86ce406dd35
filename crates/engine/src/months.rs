//! Calendar-month arithmetic shared by recurrences and billing cycles.
//!
//! Every helper clamps the day of month to the length of the target month:
//! the 31st projected onto February becomes the 28th (29th on leap years).

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

/// A calendar month of a specific year.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthYear {
    pub year: i32,
    /// 1-based month.
    pub month: u32,
}

impl MonthYear {
    #[must_use]
    pub fn new(year: i32, month: u32) -> Self {
        Self::from_index(year * 12 + month as i32 - 1)
    }

    #[must_use]
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Months elapsed since year 0, used for ordering and differences.
    #[must_use]
    pub fn index(self) -> i32 {
        self.year * 12 + self.month as i32 - 1
    }

    fn from_index(index: i32) -> Self {
        Self {
            year: index.div_euclid(12),
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    /// Moves by `delta` months, rolling over year boundaries in both
    /// directions.
    #[must_use]
    pub fn shift(self, delta: i32) -> Self {
        Self::from_index(self.index() + delta)
    }

    /// Builds a date in this month, clamping `day` to the month length.
    pub fn with_day(self, day: u32) -> ResultEngine<NaiveDate> {
        clamped_date(self.year, self.month, day)
    }

    pub fn first_day(self) -> ResultEngine<NaiveDate> {
        self.with_day(1)
    }
}

/// Number of days of `month` in `year`.
#[must_use]
pub fn last_day_of_month(year: i32, month: u32) -> u32 {
    (28..=31)
        .rev()
        .find(|day| NaiveDate::from_ymd_opt(year, month, *day).is_some())
        .unwrap_or(28)
}

/// Builds `year-month-day`, clamping `day` to the length of the month.
pub fn clamped_date(year: i32, month: u32, day: u32) -> ResultEngine<NaiveDate> {
    let MonthYear { year, month } = MonthYear::new(year, month);
    let day = day.clamp(1, last_day_of_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| EngineError::InvalidInput(format!("invalid date {year}-{month}-{day}")))
}

/// Shifts `date` by `delta` months keeping its day of month (clamped).
pub fn shift_months(date: NaiveDate, delta: i32) -> ResultEngine<NaiveDate> {
    let shifted = if delta >= 0 {
        date.checked_add_months(Months::new(delta.unsigned_abs()))
    } else {
        date.checked_sub_months(Months::new(delta.unsigned_abs()))
    };
    shifted.ok_or_else(|| EngineError::InvalidInput(format!("date out of range: {date}")))
}

/// Moves `date` into `target` month keeping its day of month (clamped).
pub fn move_to_month(date: NaiveDate, target: MonthYear) -> ResultEngine<NaiveDate> {
    shift_months(date, target.index() - MonthYear::of(date).index())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn clamps_to_february() {
        assert_eq!(clamped_date(2025, 2, 31).unwrap(), date(2025, 2, 28));
        assert_eq!(clamped_date(2024, 2, 31).unwrap(), date(2024, 2, 29));
        assert_eq!(clamped_date(2025, 2, 30).unwrap(), date(2025, 2, 28));
    }

    #[test]
    fn month_rolls_over_years() {
        assert_eq!(MonthYear::new(2025, 13), MonthYear::new(2026, 1));
        assert_eq!(MonthYear::new(2025, 0), MonthYear::new(2024, 12));
        assert_eq!(MonthYear::new(2025, 1).shift(-1), MonthYear::new(2024, 12));
        assert_eq!(MonthYear::new(2025, 12).shift(1), MonthYear::new(2026, 1));
        assert_eq!(MonthYear::new(2025, 6).shift(-18), MonthYear::new(2023, 12));
    }

    #[test]
    fn move_keeps_day_when_possible() {
        let moved = move_to_month(date(2025, 1, 31), MonthYear::new(2025, 4)).unwrap();
        assert_eq!(moved, date(2025, 4, 30));
        let moved = move_to_month(date(2025, 1, 15), MonthYear::new(2024, 11)).unwrap();
        assert_eq!(moved, date(2024, 11, 15));
    }

    #[test]
    fn last_day() {
        assert_eq!(last_day_of_month(2025, 4), 30);
        assert_eq!(last_day_of_month(2025, 12), 31);
        assert_eq!(last_day_of_month(2100, 2), 28);
    }
}
