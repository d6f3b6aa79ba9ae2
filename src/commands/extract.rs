//! Extract command implementation: HTML in, availability report out.

use crate::config::Config;
use crate::format::Formatter;
use crate::listing::{AvailabilityReport, Parser, Trip};
use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use tracing::{debug, info, warn};

/// Extracts trips from already rendered HTML.
pub struct ExtractCommand {
    config: Config,
}

impl ExtractCommand {
    /// Creates a new extract command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Extracts trips and returns formatted output.
    pub fn execute(&self, html: &str, source_url: &str) -> Result<String> {
        let now = self.config.now().context("Failed to resolve current time")?;
        let report = self.report_at(html, source_url, now)?;

        let formatter = Formatter::new(self.config.format);
        Ok(formatter.format_report(&report))
    }

    /// Builds the report as of `now` (for testing).
    pub fn report_at(
        &self,
        html: &str,
        source_url: &str,
        now: DateTime<FixedOffset>,
    ) -> Result<AvailabilityReport> {
        let window = self.config.window(now.date_naive()).context("Failed to resolve window")?;
        debug!("Extracting trips departing {}", window);

        let parser = Parser::new(window).with_availability(self.config.availability);
        let trips = parser.parse_trips(html);

        if trips.is_empty() && !html.trim().is_empty() {
            warn!("No trips extracted from {} bytes of HTML", html.len());
        }

        let extracted = trips.len();
        let trips: Vec<Trip> = trips.into_iter().filter(|trip| self.selects(trip)).collect();
        info!("Found {} trips ({} selected)", extracted, trips.len());

        Ok(AvailabilityReport::new(source_url, now, window, trips))
    }

    /// Expedition selection: the name must contain one of `expeditions` (any
    /// name when that list is empty) and none of `exclude_expeditions`,
    /// ignoring case.
    fn selects(&self, trip: &Trip) -> bool {
        let name = trip.expedition.as_deref().unwrap_or_default().to_lowercase();
        let mentions = |fragments: &[String]| {
            fragments.iter().any(|fragment| name.contains(&fragment.to_lowercase()))
        };

        (self.config.expeditions.is_empty() || mentions(&self.config.expeditions))
            && !mentions(&self.config.exclude_expeditions)
    }
}
