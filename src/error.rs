//! Typed errors for configuration problems the caller must fix.
//!
//! Malformed HTML never produces an error: unusable rows are skipped and a
//! missing table yields no trips. Only invalid settings surface here.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// Window start falls after its end.
    #[error("invalid date window: start {start} is after end {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },

    /// Window length too large to represent as a calendar date.
    #[error("invalid date window: {days} days after {start} is out of range")]
    WindowOutOfRange { start: NaiveDate, days: i64 },

    /// UTC offset outside the range chrono accepts (±24h exclusive).
    #[error("invalid UTC offset: {0} minutes")]
    InvalidUtcOffset(i32),

    /// Unknown IANA time zone name.
    #[error("unknown time zone: {0}")]
    UnknownTimezone(String),
}
