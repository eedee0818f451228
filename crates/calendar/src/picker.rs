//! Date picker state machine.

use chrono::{Datelike, NaiveDate};

use crate::{CalendarDay, CalendarResult, YearMonth};

const DEFAULT_PLACEHOLDER: &str = "Select date";

/// Input events coming from the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerEvent {
    /// The input field was clicked.
    Toggle,
    /// A click landed outside the widget.
    Dismiss,
    /// The "previous month" control was clicked.
    PrevMonth,
    /// The "next month" control was clicked.
    NextMonth,
    /// A grid cell was clicked.
    DayClicked(CalendarDay),
}

/// What changed as a result of a [`PickerEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerOutput {
    /// Nothing the caller needs to react to.
    Unchanged,
    /// The displayed month moved.
    MonthChanged(YearMonth),
    /// A new date was picked.
    DateSelected(NaiveDate),
}

/// State behind a date picker widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatePicker {
    cursor: YearMonth,
    value: Option<NaiveDate>,
    open: bool,
    disabled: bool,
    placeholder: String,
}

impl DatePicker {
    /// Creates a closed picker showing the month of `today`.
    pub fn new<D: Datelike>(today: &D) -> CalendarResult<Self> {
        Ok(Self {
            cursor: YearMonth::containing(today)?,
            value: None,
            open: false,
            disabled: false,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        })
    }

    /// Sets the current value. Any time of day is dropped.
    pub fn with_value<D: Datelike>(mut self, value: Option<&D>) -> Self {
        self.value = value.and_then(|d| NaiveDate::from_ymd_opt(d.year(), d.month(), d.day()));
        self
    }

    /// Sets the text shown when no value is set.
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Disables the picker.
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        if disabled {
            self.open = false;
        }
        self
    }

    /// Month currently displayed.
    pub fn cursor(&self) -> YearMonth {
        self.cursor
    }

    /// Selected date, if any.
    pub fn value(&self) -> Option<NaiveDate> {
        self.value
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Opens or closes the calendar. Ignored while disabled.
    pub fn toggle(&mut self) {
        if !self.disabled {
            self.open = !self.open;
        }
    }

    /// Closes the calendar.
    pub fn dismiss(&mut self) {
        self.open = false;
    }

    /// Moves the display to the previous month.
    pub fn prev_month(&mut self) -> YearMonth {
        self.cursor = self.cursor.prev();
        self.cursor
    }

    /// Moves the display to the next month.
    pub fn next_month(&mut self) -> YearMonth {
        self.cursor = self.cursor.next();
        self.cursor
    }

    /// Picks `day`, closing the calendar.
    ///
    /// Only days of the displayed month are selectable. Adjacent-month cells,
    /// and cells left over from a month no longer displayed, leave the value
    /// and the open state untouched and return `None`.
    pub fn select(&mut self, day: &CalendarDay) -> Option<NaiveDate> {
        if day.other_month || !self.cursor.contains(&day.date) {
            return None;
        }
        self.value = Some(day.date);
        self.open = false;
        self.value
    }

    /// Applies an input event and reports what changed.
    pub fn handle(&mut self, event: PickerEvent) -> PickerOutput {
        let output = match event {
            PickerEvent::Toggle => {
                self.toggle();
                PickerOutput::Unchanged
            }
            PickerEvent::Dismiss => {
                self.dismiss();
                PickerOutput::Unchanged
            }
            PickerEvent::PrevMonth => PickerOutput::MonthChanged(self.prev_month()),
            PickerEvent::NextMonth => PickerOutput::MonthChanged(self.next_month()),
            PickerEvent::DayClicked(day) => match self.select(&day) {
                Some(date) => PickerOutput::DateSelected(date),
                None => PickerOutput::Unchanged,
            },
        };
        tracing::trace!(?event, ?output, cursor = %self.cursor, "Date picker event");
        output
    }

    /// Grid for the displayed month.
    pub fn grid(&self) -> Vec<CalendarDay> {
        self.cursor.grid()
    }

    /// Returns true if `day` is the selected date.
    pub fn is_selected(&self, day: &CalendarDay) -> bool {
        day.is_selected(self.value.as_ref())
    }

    /// Header label, e.g. `January 2024`.
    pub fn month_label(&self) -> String {
        self.cursor.label()
    }

    /// Value as shown in the input field, or an empty string.
    pub fn formatted_value(&self) -> String {
        self.value
            .map(|d| d.format("%m/%d/%Y").to_string())
            .unwrap_or_default()
    }
}
