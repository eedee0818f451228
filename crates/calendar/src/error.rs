//! Calendar error types.

use thiserror::Error;

/// Errors that can occur while building calendar values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    /// The normalized year cannot be represented.
    #[error("Year out of range: {year}")]
    OutOfRange { year: i64 },

    /// A month number outside 1..=12.
    #[error("Invalid month number: {0}")]
    InvalidMonth(u32),

    /// A `YYYY-MM` string could not be parsed.
    #[error("Invalid month '{0}'. Expected YYYY-MM")]
    InvalidFormat(String),
}

/// Result type for calendar operations.
pub type CalendarResult<T> = Result<T, CalendarError>;
