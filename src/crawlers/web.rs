use crate::config::PipelineConfig;
use crate::crawlers::crawler::{PageSession, SessionOpener};
use crate::error::FetchError;
use crate::results::RawPage;
use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder};
use serde_json::{Value, json};
use std::time::{Duration, Instant};
use tokio::time::timeout;
use url::Url;

/// How often the page is polled while waiting for network idle
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Reports load state and the number of resource requests issued so far
const NETWORK_PROBE_SCRIPT: &str =
    "return [document.readyState, performance.getEntriesByType('resource').length];";

/// Dynamic-mode opener: one WebDriver browser session per run
#[derive(Debug, Clone)]
pub struct BrowserOpener {
    webdriver_url: String,
    headless: bool,
    navigation_timeout: Duration,
    idle_window: Duration,
}

impl BrowserOpener {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            webdriver_url: config.webdriver_url.clone(),
            headless: config.headless,
            navigation_timeout: config.navigation_timeout(),
            idle_window: config.idle_timeout(),
        }
    }

    fn capabilities(&self) -> serde_json::Map<String, Value> {
        let mut caps = serde_json::Map::new();
        if self.headless {
            caps.insert(
                "goog:chromeOptions".to_string(),
                json!({ "args": ["--headless=new", "--disable-gpu", "--no-sandbox"] }),
            );
            caps.insert(
                "moz:firefoxOptions".to_string(),
                json!({ "args": ["-headless"] }),
            );
        }
        caps
    }

    /// Connects to the configured WebDriver, then to common local defaults
    async fn connect(&self) -> Result<Client, FetchError> {
        let mut last_error = String::new();

        let fallback_urls = [
            "http://localhost:9515", // ChromeDriver default
            "http://127.0.0.1:4444", // Try with IP instead of localhost
        ];
        let candidates = std::iter::once(self.webdriver_url.as_str())
            .chain(fallback_urls.into_iter().filter(|url| *url != self.webdriver_url));

        for url in candidates {
            let mut builder = ClientBuilder::native();
            builder.capabilities(self.capabilities());
            match builder.connect(url).await {
                Ok(client) => {
                    ::log::debug!("Connected to WebDriver at {}", url);
                    return Ok(client);
                }
                Err(e) => {
                    ::log::debug!("WebDriver at {} unavailable: {}", url, e);
                    last_error = e.to_string();
                }
            }
        }

        ::log::error!(
            "Failed to connect to any WebDriver server; set WEBDRIVER_URL to a running instance"
        );
        Err(FetchError::session(self.webdriver_url.as_str(), last_error))
    }
}

#[async_trait]
impl SessionOpener for BrowserOpener {
    async fn open(&self) -> Result<Box<dyn PageSession>, FetchError> {
        let client = self.connect().await?;
        Ok(Box::new(BrowserSession {
            client,
            navigation_timeout: self.navigation_timeout,
            idle_window: self.idle_window,
        }))
    }
}

/// A live browser tab reused for every page of one run
pub struct BrowserSession {
    client: Client,
    navigation_timeout: Duration,
    idle_window: Duration,
}

impl BrowserSession {
    /// Navigate, wait for network idle, and read the rendered DOM along
    /// with the URL the tab ended up on
    async fn render(&self, url: &Url) -> Result<(String, String), FetchError> {
        self.client
            .goto(url.as_str())
            .await
            .map_err(|e| FetchError::navigation(url.as_str(), e))?;

        self.wait_for_network_idle(url).await?;

        let html = self
            .client
            .source()
            .await
            .map_err(|e| FetchError::navigation(url.as_str(), e))?;
        let served_url = match self.client.current_url().await {
            Ok(current) => current.to_string(),
            Err(e) => {
                ::log::debug!("Could not read current URL for {}: {}", url, e);
                url.to_string()
            }
        };
        Ok((html, served_url))
    }

    /// Waits until the document is complete and no new resource requests
    /// have started for a full idle window.
    async fn wait_for_network_idle(&self, url: &Url) -> Result<(), FetchError> {
        let mut last_count: Option<u64> = None;
        let mut quiet_since = Instant::now();

        loop {
            let probe = self
                .client
                .execute(NETWORK_PROBE_SCRIPT, Vec::new())
                .await
                .map_err(|e| FetchError::navigation(url.as_str(), e))?;
            let (ready, count) = parse_probe(&probe);

            if !ready || last_count != Some(count) {
                last_count = Some(count);
                quiet_since = Instant::now();
            } else if quiet_since.elapsed() >= self.idle_window {
                ::log::debug!("Network idle on {} after {} requests", url, count);
                return Ok(());
            }

            tokio::time::sleep(IDLE_POLL_INTERVAL).await;
        }
    }
}

/// Reads `[readyState, resourceCount]` from the probe script result
fn parse_probe(value: &Value) -> (bool, u64) {
    let ready = value.get(0).and_then(Value::as_str) == Some("complete");
    let count = value.get(1).and_then(Value::as_u64).unwrap_or(0);
    (ready, count)
}

#[async_trait]
impl PageSession for BrowserSession {
    async fn fetch(&mut self, url: &Url) -> Result<RawPage, FetchError> {
        let start = Instant::now();
        ::log::debug!("Rendering {}", url);

        let (html, served_url) = match timeout(self.navigation_timeout, self.render(url)).await {
            Ok(result) => result?,
            Err(_) => {
                ::log::error!("Timeout rendering: {}", url);
                return Err(FetchError::timeout(url.as_str()));
            }
        };

        ::log::debug!(
            "Rendered {} in {:.2} seconds",
            url,
            start.elapsed().as_secs_f64()
        );
        Ok(RawPage::html(served_url, html))
    }

    async fn close(self: Box<Self>) {
        let session = *self;
        if let Err(e) = session.client.close().await {
            ::log::warn!("Failed to close browser session: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe() {
        assert_eq!(parse_probe(&json!(["complete", 12])), (true, 12));
        assert_eq!(parse_probe(&json!(["loading", 3])), (false, 3));
        assert_eq!(parse_probe(&json!(null)), (false, 0));
    }

    #[test]
    fn test_headless_capabilities() {
        let mut config = PipelineConfig::default();
        let caps = BrowserOpener::new(&config).capabilities();
        assert!(caps.contains_key("goog:chromeOptions"));

        config.headless = false;
        assert!(BrowserOpener::new(&config).capabilities().is_empty());
    }
}
