//! Page sources that supply the HTML holding the results table.

use crate::config::Config;
use crate::listing::models::DateWindow;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};
use wreq::Client;
use wreq_util::Emulation;

/// Trait for anything that can render the availability page - enables mocking
/// for tests and swapping in a browser-backed renderer.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Returns HTML containing the results table for the given window.
    async fn fetch(&self, url: &str, window: &DateWindow) -> Result<String>;
}

/// Fetches the page over HTTP with browser impersonation.
pub struct HttpPageSource {
    client: Client,
    start_param: Option<String>,
    end_param: Option<String>,
}

impl HttpPageSource {
    /// Creates a new page source with the given configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10));

        // Configure proxy if specified
        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url).context("Failed to configure proxy")?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            start_param: config.start_param.clone(),
            end_param: config.end_param.clone(),
        })
    }

    /// Appends the window as query parameters when parameter names are configured.
    fn request_url(&self, url: &str, window: &DateWindow) -> String {
        let params: Vec<String> = [
            (self.start_param.as_deref(), window.start()),
            (self.end_param.as_deref(), window.end()),
        ]
        .into_iter()
        .filter_map(|(name, date)| {
            name.map(|n| format!("{}={}", urlencoding::encode(n), date.format("%Y-%m-%d")))
        })
        .collect();

        if params.is_empty() {
            return url.to_string();
        }

        let separator = if url.contains('?') { '&' } else { '?' };
        format!("{}{}{}", url, separator, params.join("&"))
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch(&self, url: &str, window: &DateWindow) -> Result<String> {
        let url = self.request_url(url, window);

        info!("Fetching availability: {} (window {})", url, window);

        let response = self
            .client
            .get(url.as_str())
            .emulation(Emulation::Chrome131)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header("Accept-Language", "en-AU,en;q=0.9")
            .header("Cache-Control", "no-cache")
            .header("Sec-Fetch-Dest", "document")
            .header("Sec-Fetch-Mode", "navigate")
            .header("Sec-Fetch-Site", "none")
            .header("Upgrade-Insecure-Requests", "1")
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        debug!("Response status: {}", status);

        if !status.is_success() {
            anyhow::bail!("Request failed with status: {}", status);
        }

        response.text().await.context("Failed to read response body")
    }
}
