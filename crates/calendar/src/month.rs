//! Normalized year/month cursor.

use std::{fmt, str::FromStr};

use chrono::{Datelike, Days, NaiveDate};

use crate::{CalendarError, CalendarResult, GRID_CELLS};

/// A normalized (year, month) pair.
///
/// Months are 1-based. Construction accepts any integer month and rolls it
/// over into the neighbouring years, so month 0 is December of the previous
/// year and month 13 is January of the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YearMonth {
    first: NaiveDate,
    grid_start: NaiveDate,
}

impl YearMonth {
    /// Creates a normalized year/month, rolling `month` over year boundaries.
    pub fn new(year: i32, month: i32) -> CalendarResult<Self> {
        let zero_based = i64::from(month) - 1;
        let year = i64::from(year) + zero_based.div_euclid(12);
        // rem_euclid keeps this in 0..12
        let month = (zero_based.rem_euclid(12) + 1) as u32;

        let out_of_range = || CalendarError::OutOfRange { year };
        let first = i32::try_from(year)
            .ok()
            .and_then(|y| NaiveDate::from_ymd_opt(y, month, 1))
            .ok_or_else(out_of_range)?;

        let lead = u64::from(first.weekday().num_days_from_sunday());
        let grid_start = first
            .checked_sub_days(Days::new(lead))
            .ok_or_else(out_of_range)?;
        // The whole grid, and the month after, must be representable.
        grid_start
            .checked_add_days(Days::new(GRID_CELLS as u64))
            .ok_or_else(out_of_range)?;

        Ok(Self { first, grid_start })
    }

    /// Returns the month containing `date`.
    pub fn containing<D: Datelike>(date: &D) -> CalendarResult<Self> {
        Self::new(date.year(), date.month() as i32)
    }

    /// Calendar year.
    pub fn year(&self) -> i32 {
        self.first.year()
    }

    /// Calendar month, 1-based.
    pub fn month(&self) -> u32 {
        self.first.month()
    }

    /// First day of the month.
    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    /// First cell of the six-week grid, always a Sunday.
    pub fn grid_start(&self) -> NaiveDate {
        self.grid_start
    }

    /// Number of days in the month.
    pub fn days_in_month(&self) -> u32 {
        self.first
            .iter_days()
            .take_while(|d| d.month() == self.month())
            .count() as u32
    }

    /// Number of previous-month days shown before the 1st.
    pub fn leading_days(&self) -> u32 {
        self.first.weekday().num_days_from_sunday()
    }

    /// Returns true if `date` falls in this month.
    pub fn contains<D: Datelike>(&self, date: &D) -> bool {
        date.year() == self.year() && date.month() == self.month()
    }

    /// The previous month. Saturates at the earliest representable month.
    pub fn prev(&self) -> Self {
        self.offset(-1)
    }

    /// The next month. Saturates at the latest representable month.
    pub fn next(&self) -> Self {
        self.offset(1)
    }

    fn offset(&self, months: i32) -> Self {
        Self::new(self.year(), self.month() as i32 + months).unwrap_or(*self)
    }

    /// Human-readable label such as `January 2024`.
    pub fn label(&self) -> String {
        self.first.format("%B %Y").to_string()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for YearMonth {
    type Err = CalendarError;

    /// Parses `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CalendarError::InvalidFormat(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: i32 = month.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Self::new(year, month)
    }
}

/// Number of days in a 1-based month.
///
/// Unlike [`YearMonth::new`], months outside 1..=12 are rejected rather than
/// rolled over.
pub fn days_in_month(year: i32, month: u32) -> CalendarResult<u32> {
    if !(1..=12).contains(&month) {
        return Err(CalendarError::InvalidMonth(month));
    }
    Ok(YearMonth::new(year, month as i32)?.days_in_month())
}
