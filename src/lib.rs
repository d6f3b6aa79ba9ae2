//! dive-avail - Liveaboard dive expedition availability extractor
//!
//! Locates the departures table on an availability page, parses trip rows
//! and their cabin breakdowns, and emits a deduplicated, date-sorted report.

pub mod commands;
pub mod config;
pub mod error;
pub mod format;
pub mod listing;

pub use config::{Config, OutputFormat};
pub use error::ExtractError;
pub use listing::models::{AvailabilityReport, Cabin, DateWindow, Trip};
pub use listing::Parser;
