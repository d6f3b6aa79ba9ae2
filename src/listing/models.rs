//! Data models for trips, cabins, date windows and the output report.

use crate::error::ExtractError;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};

/// Represents one bookable expedition departure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    /// Expedition name
    pub expedition: Option<String>,
    /// Departure date
    pub departs: Option<NaiveDate>,
    /// Return date
    pub returns: Option<NaiveDate>,
    /// Lowest advertised price in whole AUD
    pub price_from_aud: Option<u32>,
    /// Availability label
    pub availability: Option<String>,
    /// Cabin breakdown, in page order
    #[serde(default)]
    pub cabins: Vec<Cabin>,
}

/// Identity of a trip for deduplication.
pub type TripKey = (Option<String>, Option<NaiveDate>, Option<NaiveDate>);

impl Trip {
    /// Returns the dedup key `(expedition, departs, returns)`.
    pub fn key(&self) -> TripKey {
        (self.expedition.clone(), self.departs, self.returns)
    }

    /// Ranks how much detail the record carries: cabins first, then price.
    pub fn richness(&self) -> (bool, bool) {
        (!self.cabins.is_empty(), self.price_from_aud.is_some())
    }

    /// Returns the number of nights if both dates are known.
    pub fn nights(&self) -> Option<i64> {
        match (self.departs, self.returns) {
            (Some(departs), Some(returns)) if returns >= departs => {
                Some((returns - departs).num_days())
            }
            _ => None,
        }
    }

    /// Returns the total berths left across cabins that report a count.
    pub fn berths_left(&self) -> Option<u32> {
        self.cabins.iter().filter_map(|c| c.berths_left).reduce(u32::saturating_add)
    }
}

/// One priced cabin category nested under a trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cabin {
    /// Cabin category label
    pub cabin_type: String,
    /// Berths still bookable
    pub berths_left: Option<u32>,
    /// Cabin price in whole AUD
    pub price_aud: Option<u32>,
}

/// Inclusive range of departure dates to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    /// Creates a window, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ExtractError> {
        if start > end {
            return Err(ExtractError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Creates a window of `days` days after `start`. Negative spans are
    /// rejected, as are spans that run past the representable calendar.
    pub fn spanning(start: NaiveDate, days: i64) -> Result<Self, ExtractError> {
        let end = Duration::try_days(days)
            .and_then(|span| start.checked_add_signed(span))
            .ok_or(ExtractError::WindowOutOfRange { start, days })?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Returns true if the date lies within the window, bounds included.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl std::fmt::Display for DateWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// The JSON document written for one extraction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityReport {
    /// Page the HTML came from
    pub source_url: String,
    /// When the report was produced, second precision
    pub generated_at: DateTime<FixedOffset>,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub trips: Vec<Trip>,
}

impl AvailabilityReport {
    /// Creates a report, truncating the timestamp to whole seconds.
    pub fn new(
        source_url: impl Into<String>,
        generated_at: DateTime<FixedOffset>,
        window: DateWindow,
        trips: Vec<Trip>,
    ) -> Self {
        Self {
            source_url: source_url.into(),
            generated_at: generated_at.with_nanosecond(0).unwrap_or(generated_at),
            window_start: window.start(),
            window_end: window.end(),
            trips,
        }
    }

    /// Returns number of trips.
    pub fn count(&self) -> usize {
        self.trips.len()
    }

    /// Returns true if no trips were extracted.
    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }
}
