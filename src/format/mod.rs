//! Output formatting for availability reports (JSON, table, markdown, CSV).

use crate::config::OutputFormat;
use crate::listing::{AvailabilityReport, Cabin, Trip};

const MARKDOWN_HEADER: &str =
    "| Departs | Returns | Nights | From (AUD) | Expedition | Availability | Cabins |";
const MARKDOWN_RULE: &str =
    "|---------|---------|--------|------------|------------|--------------|--------|";
const CSV_HEADER: &str =
    "expedition,departs,returns,nights,price_from_aud,availability,berths_left,cabins";

/// Formats reports for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a whole report.
    pub fn format_report(&self, report: &AvailabilityReport) -> String {
        match self.format {
            // An empty report is still a complete document
            OutputFormat::Json => self.json_report(report),
            OutputFormat::Csv => self.csv_trips(&report.trips),
            _ if report.is_empty() => format!(
                "No trips found between {} and {}.",
                report.window_start, report.window_end
            ),
            OutputFormat::Table => self.table_report(report),
            OutputFormat::Markdown => self.markdown_report(report),
        }
    }

    // JSON formatting

    fn json_report(&self, report: &AvailabilityReport) -> String {
        serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
    }

    // Table formatting

    fn table_report(&self, report: &AvailabilityReport) -> String {
        let name_width = 40;
        let date_width = 10;
        let price_width = 9;

        let mut lines = Vec::new();

        lines.push(format!("Source:  {}", report.source_url));
        lines.push(format!("Window:  {} to {}", report.window_start, report.window_end));
        lines.push(String::new());

        // Header
        lines.push(format!(
            "{:<date_width$}  {:<date_width$}  {:>price_width$}  {:<name_width$}  {}",
            "Departs", "Returns", "From AUD", "Expedition", "Availability"
        ));
        lines.push(format!(
            "{:-<date_width$}  {:-<date_width$}  {:-<price_width$}  {:-<name_width$}  {:-<12}",
            "", "", "", "", ""
        ));

        // Rows
        for trip in &report.trips {
            let name = truncate(trip.expedition.as_deref().unwrap_or("N/A"), name_width);

            lines.push(format!(
                "{:<date_width$}  {:<date_width$}  {:>price_width$}  {:<name_width$}  {}",
                date_or_na(trip.departs),
                date_or_na(trip.returns),
                money_or_na(trip.price_from_aud),
                name,
                trip.availability.as_deref().unwrap_or("N/A")
            ));

            for cabin in &trip.cabins {
                lines.push(format!("{:>width$}- {}", "", cabin_summary(cabin), width = 24));
            }
        }

        lines.push(String::new());
        lines.push(format!("Total: {} trips", report.count()));

        lines.join("\n")
    }

    // Markdown formatting

    fn markdown_report(&self, report: &AvailabilityReport) -> String {
        let mut lines = Vec::new();

        lines.push(format!(
            "## Availability {} to {}",
            report.window_start, report.window_end
        ));
        lines.push(String::new());
        lines.push(MARKDOWN_HEADER.to_string());
        lines.push(MARKDOWN_RULE.to_string());

        for trip in &report.trips {
            let cabins = trip
                .cabins
                .iter()
                .map(|c| markdown_escape(&cabin_summary(c)))
                .collect::<Vec<_>>()
                .join("<br>");

            lines.push(format!(
                "| {} | {} | {} | {} | {} | {} | {} |",
                date_or_na(trip.departs),
                date_or_na(trip.returns),
                trip.nights().map(|n| n.to_string()).unwrap_or_default(),
                money_or_na(trip.price_from_aud),
                markdown_escape(trip.expedition.as_deref().unwrap_or("N/A")),
                markdown_escape(trip.availability.as_deref().unwrap_or("")),
                cabins
            ));
        }

        lines.push(String::new());
        lines.push(format!("*{} trips found ([source]({}))*", report.count(), report.source_url));

        lines.join("\n")
    }

    // CSV formatting

    fn csv_header(&self) -> String {
        CSV_HEADER.to_string()
    }

    fn csv_trips(&self, trips: &[Trip]) -> String {
        let mut lines = Vec::new();
        lines.push(self.csv_header());

        for trip in trips {
            let expedition =
                trip.expedition.as_deref().map(Self::csv_escape).unwrap_or_default();
            let availability =
                trip.availability.as_deref().map(Self::csv_escape).unwrap_or_default();

            // type:berths:price per cabin, ';' separated
            let cabins = trip
                .cabins
                .iter()
                .map(|c| {
                    format!(
                        "{}:{}:{}",
                        c.cabin_type,
                        opt_to_string(c.berths_left),
                        opt_to_string(c.price_aud)
                    )
                })
                .collect::<Vec<_>>()
                .join(";");

            lines.push(format!(
                "{},{},{},{},{},{},{},{}",
                expedition,
                opt_to_string(trip.departs),
                opt_to_string(trip.returns),
                opt_to_string(trip.nights()),
                opt_to_string(trip.price_from_aud),
                availability,
                opt_to_string(trip.berths_left()),
                Self::csv_escape(&cabins)
            ));
        }

        lines.join("\n")
    }

    fn csv_escape(s: &str) -> String {
        if s.contains(',') || s.contains('"') || s.contains('\n') {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }
}

fn opt_to_string<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn date_or_na(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "N/A".to_string())
}

fn money_or_na(amount: Option<u32>) -> String {
    amount.map(|a| format!("${}", a)).unwrap_or_else(|| "N/A".to_string())
}

fn cabin_summary(cabin: &Cabin) -> String {
    let berths = match cabin.berths_left {
        Some(1) => "1 berth left".to_string(),
        Some(n) => format!("{} berths left", n),
        None => "berths N/A".to_string(),
    };

    format!("{}: {}, {}", cabin.cabin_type, berths, money_or_na(cabin.price_aud))
}

fn markdown_escape(text: &str) -> String {
    text.replace('|', "\\|")
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let kept: String = text.chars().take(width - 3).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}
