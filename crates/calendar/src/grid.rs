//! Six-week calendar grid.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{CalendarResult, YearMonth};

/// Number of cells in a grid: six weeks of seven days.
pub const GRID_CELLS: usize = 42;

/// Column headers, Sunday first.
pub const WEEKDAY_LABELS: [&str; 7] = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];

/// One cell of the calendar grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    /// The date shown in this cell.
    pub date: NaiveDate,
    /// True if the date belongs to the month before or after the displayed one.
    pub other_month: bool,
}

impl CalendarDay {
    /// Day of month, as printed in the cell.
    pub fn day(&self) -> u32 {
        self.date.day()
    }

    /// Returns true if `selected` falls on this cell's calendar day.
    ///
    /// Only year, month and day are compared; any time of day is ignored.
    pub fn is_selected<D: Datelike>(&self, selected: Option<&D>) -> bool {
        selected.is_some_and(|d| same_day(&self.date, d))
    }

    /// Returns true if the cell can be picked.
    pub fn is_selectable(&self) -> bool {
        !self.other_month
    }
}

/// Returns true if both values share year, month and day.
pub fn same_day<A: Datelike, B: Datelike>(a: &A, b: &B) -> bool {
    a.year() == b.year() && a.month() == b.month() && a.day() == b.day()
}

impl YearMonth {
    /// Builds the 42-cell grid for this month.
    ///
    /// The grid starts on the Sunday on or before the 1st, so it opens with
    /// the previous month's trailing days, then every day of this month, then
    /// as many of the next month's days as needed to fill six weeks.
    pub fn grid(&self) -> Vec<CalendarDay> {
        self.grid_start()
            .iter_days()
            .take(GRID_CELLS)
            .map(|date| CalendarDay {
                date,
                other_month: !self.contains(&date),
            })
            .collect()
    }
}

/// Computes the grid for `(year, month)`, normalizing out-of-range months.
pub fn compute_grid(year: i32, month: i32) -> CalendarResult<Vec<CalendarDay>> {
    Ok(YearMonth::new(year, month)?.grid())
}
