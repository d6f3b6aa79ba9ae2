//! Configuration management with TOML, environment variables, and CLI overrides.

use crate::error::ExtractError;
use crate::listing::{AvailabilityPolicy, DateWindow};
use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Local, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Availability page URL
    #[serde(default = "default_source_url")]
    pub source_url: String,

    /// Proxy URL (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Query parameter carrying the window start, if the page accepts one
    #[serde(default)]
    pub start_param: Option<String>,

    /// Query parameter carrying the window end, if the page accepts one
    #[serde(default)]
    pub end_param: Option<String>,

    /// Window length in days when no explicit end is given
    #[serde(default = "default_window_days")]
    pub window_days: i64,

    /// Explicit window start (defaults to today)
    #[serde(default)]
    pub window_start: Option<NaiveDate>,

    /// Explicit window end (defaults to start + window_days)
    #[serde(default)]
    pub window_end: Option<NaiveDate>,

    /// IANA time zone for "today" and report timestamps, or "local"
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Fixed UTC offset that overrides `timezone` when set
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,

    /// Availability label policy
    #[serde(default)]
    pub availability: AvailabilityPolicy,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Write output to this file instead of stdout
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// Expedition names to keep (any match, empty keeps all)
    #[serde(default)]
    pub expeditions: Vec<String>,

    /// Expedition names to drop
    #[serde(default)]
    pub exclude_expeditions: Vec<String>,
}

fn default_source_url() -> String {
    "https://www.mikeball.com/availability-mike-ball-dive-expeditions/".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_window_days() -> i64 {
    186
}

fn default_timezone() -> String {
    "Australia/Sydney".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_url: default_source_url(),
            proxy: None,
            timeout_secs: default_timeout_secs(),
            start_param: None,
            end_param: None,
            window_days: default_window_days(),
            window_start: None,
            window_end: None,
            timezone: default_timezone(),
            utc_offset_minutes: None,
            availability: AvailabilityPolicy::Verbatim,
            format: OutputFormat::Json,
            output: None,
            expeditions: Vec::new(),
            exclude_expeditions: Vec::new(),
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("dive-avail").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(url) = std::env::var("DIVE_AVAIL_URL") {
            self.source_url = url;
        }

        if let Ok(proxy) = std::env::var("DIVE_AVAIL_PROXY") {
            self.proxy = Some(proxy);
        }

        if let Ok(days) = std::env::var("DIVE_AVAIL_WINDOW_DAYS") {
            if let Ok(d) = days.parse() {
                self.window_days = d;
            }
        }

        if let Ok(timezone) = std::env::var("DIVE_AVAIL_TIMEZONE") {
            self.timezone = timezone;
        }

        if let Ok(offset) = std::env::var("DIVE_AVAIL_UTC_OFFSET") {
            if let Ok(minutes) = offset.parse() {
                self.utc_offset_minutes = Some(minutes);
            }
        }

        self
    }

    /// Current time in the configured civil time zone.
    pub fn now(&self) -> Result<DateTime<FixedOffset>, ExtractError> {
        self.local_time(Utc::now())
    }

    /// Converts an instant to the configured civil time zone: the fixed
    /// offset if set, else `timezone`, where "local" means the system zone.
    pub fn local_time(
        &self,
        instant: DateTime<Utc>,
    ) -> Result<DateTime<FixedOffset>, ExtractError> {
        if let Some(minutes) = self.utc_offset_minutes {
            let offset = minutes
                .checked_mul(60)
                .and_then(FixedOffset::east_opt)
                .ok_or(ExtractError::InvalidUtcOffset(minutes))?;
            return Ok(instant.with_timezone(&offset));
        }

        if self.timezone.eq_ignore_ascii_case("local") {
            return Ok(instant.with_timezone(&Local).fixed_offset());
        }

        let tz: Tz = self
            .timezone
            .parse()
            .map_err(|_| ExtractError::UnknownTimezone(self.timezone.clone()))?;
        Ok(instant.with_timezone(&tz).fixed_offset())
    }

    /// Resolves the departure window relative to `today`.
    pub fn window(&self, today: NaiveDate) -> Result<DateWindow, ExtractError> {
        let start = self.window_start.unwrap_or(today);

        match self.window_end {
            Some(end) => DateWindow::new(start, end),
            None => DateWindow::spanning(start, self.window_days),
        }
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
    Markdown,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "table" => Ok(OutputFormat::Table),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use: json, table, markdown, csv", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}
