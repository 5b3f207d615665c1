//! HTTP retrieval of the fundraiser page.
//!
//! A [`Fetcher`] issues exactly one GET per call, bounded by a timeout, and
//! classifies failures into timeout / network / HTTP-status errors. Retries
//! are left to the polling cadence of the scheduler.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use reqwest::Client;
use tracing::debug;

use crate::config;
use crate::error::{MonitorError, Result};
use crate::models::CampaignTarget;

/// Anything that can produce the raw text of a fundraiser page.
///
/// [`Fetcher`] is the production implementation; tests substitute scripted
/// sources to drive the coordinator without a network.
pub trait PageSource: Send + Sync {
    /// URL the page is read from, used in diagnostics.
    fn url(&self) -> &str;

    /// Retrieve the page once.
    fn fetch_page(&self) -> impl Future<Output = Result<String>> + Send;
}

/// Downloads a single fundraiser page over HTTP.
pub struct Fetcher {
    url: String,
    timeout: Duration,
    client: Client,
}

impl Fetcher {
    /// Create a fetcher for an already-normalized target.
    pub fn new(target: &CampaignTarget, timeout: Duration) -> Result<Self> {
        Self::with_url(target.url.clone(), timeout)
    }

    /// Normalize a slug or URL and create a fetcher for it.
    pub fn for_input(slug_or_url: &str, timeout: Duration) -> Result<Self> {
        let target = CampaignTarget::parse(slug_or_url)?;
        Self::new(&target, timeout)
    }

    /// Create a fetcher for an arbitrary URL (mirrors, local test servers).
    pub fn with_url(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("pl,en;q=0.9"));
        headers.insert(REFERER, HeaderValue::from_static("https://www.siepomaga.pl/"));

        let client = Client::builder()
            .user_agent(config::USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| MonitorError::InvalidConfig(format!("HTTP client: {e}")))?;

        Ok(Self {
            url: url.into(),
            timeout,
            client,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Issue one GET and return the body decoded as UTF-8.
    ///
    /// Invalid byte sequences are replaced rather than rejected; the
    /// extractor decides whether the page is usable.
    pub async fn fetch(&self) -> Result<String> {
        debug!(url = %self.url, "fetching fundraiser page");

        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(MonitorError::HttpStatus {
                url: self.url.clone(),
                code: status.as_u16(),
            });
        }

        let bytes = resp.bytes().await.map_err(|e| self.classify(e))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn classify(&self, err: reqwest::Error) -> MonitorError {
        if err.is_timeout() {
            MonitorError::Timeout {
                url: self.url.clone(),
            }
        } else if let Some(status) = err.status() {
            MonitorError::HttpStatus {
                url: self.url.clone(),
                code: status.as_u16(),
            }
        } else {
            MonitorError::Network {
                url: self.url.clone(),
                message: err.to_string(),
            }
        }
    }
}

impl PageSource for Fetcher {
    fn url(&self) -> &str {
        &self.url
    }

    async fn fetch_page(&self) -> Result<String> {
        self.fetch().await
    }
}
