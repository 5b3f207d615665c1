use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{MonitorError, Result};

pub const BASE_URL: &str = "https://www.siepomaga.pl";
pub const ALLOWED_HOSTS: [&str; 2] = ["siepomaga.pl", "www.siepomaga.pl"];
pub const USER_AGENT: &str = "siepomaga-rs (fundraiser monitor)";

pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(300);
pub const MIN_SCAN_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Marker every genuine fundraiser page carries next to its amounts.
pub const CURRENCY_MARKER: &str = "zł";
/// Currency code reported alongside monetary values.
pub const CURRENCY_CODE: &str = "PLN";

/// Number of distinct dates kept in the daily inflow history.
pub const SERIES_CAPACITY: usize = 31;
/// Maximum number of characters kept in diagnostic excerpts.
pub const EXCERPT_LEN: usize = 400;

// ---------------------------------------------------------------------------
// MonitorConfig — what the host persists and re-supplies across restarts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub slug_or_url: String,
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,
    #[serde(default)]
    pub verbose_errors: bool,
}

fn default_scan_interval_secs() -> u64 {
    DEFAULT_SCAN_INTERVAL.as_secs()
}

impl MonitorConfig {
    pub fn new(slug_or_url: impl Into<String>) -> Self {
        Self {
            slug_or_url: slug_or_url.into(),
            scan_interval_secs: default_scan_interval_secs(),
            verbose_errors: false,
        }
    }

    /// Check the interval floor and that the target normalizes.
    pub fn validate(&self) -> Result<()> {
        crate::models::CampaignTarget::parse(&self.slug_or_url)?;
        self.options().map(|_| ())
    }

    /// The runtime-reconfigurable part of this configuration.
    pub fn options(&self) -> Result<MonitorOptions> {
        MonitorOptions::new(
            Duration::from_secs(self.scan_interval_secs),
            self.verbose_errors,
        )
    }
}

// ---------------------------------------------------------------------------
// MonitorOptions
// ---------------------------------------------------------------------------

/// Options that may change while a monitor is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorOptions {
    pub scan_interval: Duration,
    pub verbose_errors: bool,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            scan_interval: DEFAULT_SCAN_INTERVAL,
            verbose_errors: false,
        }
    }
}

impl MonitorOptions {
    pub fn new(scan_interval: Duration, verbose_errors: bool) -> Result<Self> {
        check_interval(scan_interval)?;
        Ok(Self {
            scan_interval,
            verbose_errors,
        })
    }
}

pub fn check_interval(interval: Duration) -> Result<()> {
    if interval < MIN_SCAN_INTERVAL {
        return Err(MonitorError::InvalidConfig(format!(
            "scan interval {}s is below the minimum of {}s",
            interval.as_secs(),
            MIN_SCAN_INTERVAL.as_secs()
        )));
    }
    Ok(())
}

pub fn default_state_dir() -> PathBuf {
    if let Some(data) = dirs::data_local_dir() {
        data.join("siepomaga")
    } else {
        PathBuf::from(".siepomaga-state")
    }
}
