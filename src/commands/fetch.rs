//! Fetch command implementation.

use crate::commands::ExtractCommand;
use crate::config::Config;
use crate::format::Formatter;
use crate::listing::{HttpPageSource, PageSource};
use anyhow::{Context, Result};
use tracing::{error, info};

/// Fetches the live availability page and extracts its trips.
pub struct FetchCommand {
    config: Config,
}

impl FetchCommand {
    /// Creates a new fetch command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Fetches `url` (or the configured source) and returns formatted output.
    pub async fn execute(&self, url: Option<&str>) -> Result<String> {
        let source = HttpPageSource::new(&self.config).context("Failed to create HTTP client")?;
        let url = url.unwrap_or(&self.config.source_url);

        self.execute_with_source(&source, url).await
    }

    /// Executes with a provided page source (for testing).
    ///
    /// A failed fetch still yields a complete report with no trips.
    pub async fn execute_with_source(&self, source: &impl PageSource, url: &str) -> Result<String> {
        let now = self.config.now().context("Failed to resolve current time")?;
        let window = self.config.window(now.date_naive()).context("Failed to resolve window")?;

        let html = match source.fetch(url, &window).await {
            Ok(html) => html,
            Err(e) => {
                error!("Failed to fetch {}: {:#}", url, e);
                String::new()
            }
        };

        let extract = ExtractCommand::new(self.config.clone());
        let report = extract.report_at(&html, url, now)?;
        info!("Extracted {} trips from {}", report.count(), url);

        let formatter = Formatter::new(self.config.format);
        Ok(formatter.format_report(&report))
    }
}
