//! Window command: shows which departures an extraction would keep.

use crate::config::{Config, OutputFormat};
use crate::listing::DateWindow;
use anyhow::{Context, Result};
use chrono::NaiveDate;

/// Resolves and prints the departure window.
pub struct WindowCommand {
    config: Config,
}

impl WindowCommand {
    /// Creates a new window command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Resolves the window for today in the configured time zone.
    pub fn execute(&self) -> Result<String> {
        let now = self.config.now().context("Failed to resolve current time")?;
        self.execute_for(now.date_naive())
    }

    /// Resolves the window relative to `today` (for testing).
    pub fn execute_for(&self, today: NaiveDate) -> Result<String> {
        let window = self.config.window(today).context("Failed to resolve window")?;
        Ok(self.render(&window))
    }

    fn render(&self, window: &DateWindow) -> String {
        let days = (window.end() - window.start()).num_days();

        match self.config.format {
            OutputFormat::Json => serde_json::json!({
                "window_start": window.start(),
                "window_end": window.end(),
                "days": days,
            })
            .to_string(),
            OutputFormat::Csv => format!(
                "window_start,window_end,days\n{},{},{}",
                window.start(),
                window.end(),
                days
            ),
            OutputFormat::Table | OutputFormat::Markdown => {
                format!("{} to {} ({} days)", window.start(), window.end(), days)
            }
        }
    }
}
