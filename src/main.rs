//! dive-avail - Liveaboard dive expedition availability extractor
//!
//! Turns the operator's availability page into a clean JSON trip list.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use dive_avail::commands::{ExtractCommand, FetchCommand, WindowCommand};
use dive_avail::config::{Config, OutputFormat};
use dive_avail::listing::AvailabilityPolicy;
use std::io::Read;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "dive-avail",
    version,
    about = "Extract liveaboard dive trip availability",
    long_about = "Parses an expedition availability page into a deduplicated, date-sorted list \
                  of departures with their cabin breakdowns."
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Write output to a file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// First departure date to keep (YYYY-MM-DD, defaults to today)
    #[arg(long, global = true)]
    start: Option<NaiveDate>,

    /// Last departure date to keep (YYYY-MM-DD)
    #[arg(long, global = true)]
    end: Option<NaiveDate>,

    /// Window length in days when no end is given
    #[arg(long, global = true)]
    days: Option<i64>,

    /// Availability label policy (verbatim, normalized)
    #[arg(long, global = true)]
    availability: Option<AvailabilityPolicy>,

    /// Keep only these expeditions (comma-separated name fragments)
    #[arg(long, value_delimiter = ',', global = true)]
    expedition: Option<Vec<String>>,

    /// Drop these expeditions (comma-separated name fragments)
    #[arg(long, value_delimiter = ',', global = true)]
    exclude: Option<Vec<String>>,

    /// IANA time zone for "today" (e.g. Australia/Sydney, or "local")
    #[arg(long, global = true, env = "DIVE_AVAIL_TIMEZONE")]
    timezone: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract trips from saved HTML
    #[command(alias = "x")]
    Extract {
        /// HTML file to read ("-" or omitted for stdin)
        file: Option<PathBuf>,

        /// URL recorded as the report source
        #[arg(long)]
        source_url: Option<String>,
    },

    /// Fetch the availability page and extract trips
    #[command(alias = "f")]
    Fetch {
        /// Page URL (defaults to the configured source)
        url: Option<String>,

        /// Proxy URL (e.g., socks5://host:port)
        #[arg(long, env = "DIVE_AVAIL_PROXY")]
        proxy: Option<String>,
    },

    /// Print the resolved departure window
    Window,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(format) = cli.format {
        config.format = format;
    }
    if let Some(output) = cli.output {
        config.output = Some(output);
    }
    if let Some(start) = cli.start {
        config.window_start = Some(start);
    }
    if let Some(end) = cli.end {
        config.window_end = Some(end);
    }
    if let Some(days) = cli.days {
        config.window_days = days;
    }
    if let Some(policy) = cli.availability {
        config.availability = policy;
    }
    if let Some(names) = cli.expedition {
        config.expeditions = names;
    }
    if let Some(names) = cli.exclude {
        config.exclude_expeditions = names;
    }
    if let Some(timezone) = cli.timezone {
        config.timezone = timezone;
    }

    let output_path = config.output.clone();

    let output = match cli.command {
        Commands::Extract { file, source_url } => {
            let html = read_html(file.as_deref())?;
            let source_url = source_url.unwrap_or_else(|| config.source_url.clone());

            let cmd = ExtractCommand::new(config);
            cmd.execute(&html, &source_url)?
        }

        Commands::Fetch { url, proxy } => {
            if let Some(proxy) = proxy {
                config.proxy = Some(proxy);
            }

            let cmd = FetchCommand::new(config);
            cmd.execute(url.as_deref()).await?
        }

        Commands::Window => WindowCommand::new(config).execute()?,
    };

    match output_path {
        Some(path) => {
            std::fs::write(&path, format!("{}\n", output))
                .with_context(|| format!("Failed to write output: {}", path.display()))?;
            info!("Wrote {} bytes to {}", output.len() + 1, path.display());
        }
        None => println!("{}", output),
    }

    Ok(())
}

/// Reads HTML from a file, or from stdin for `-` or no path.
fn read_html(path: Option<&std::path::Path>) -> Result<String> {
    match path {
        Some(path) if path != std::path::Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read HTML file: {}", path.display())),
        _ => {
            let mut html = String::new();
            std::io::stdin().read_to_string(&mut html).context("Failed to read HTML from stdin")?;
            Ok(html)
        }
    }
}
