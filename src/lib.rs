//! SiePomaga fundraiser monitor.
//!
//! Periodically downloads a fundraiser page from siepomaga.pl, extracts its
//! figures (collected and missing amounts, progress, supporters, dates),
//! keeps a 31-day history of daily inflow, and exposes everything as named,
//! unit-tagged values for a host application to display.
//!
//! # Quick start
//!
//! ```no_run
//! use siepomaga::MonitorBuilder;
//!
//! # async fn example() -> siepomaga::Result<()> {
//! let mut monitor = MonitorBuilder::new("dla-stasia").build()?;
//!
//! // One cycle, driven by the caller
//! monitor.refresh().await;
//! for value in monitor.presentation().values {
//!     println!("{}: {}", value.name, value.value);
//! }
//!
//! // Or let the monitor poll on its own
//! let handle = siepomaga::scheduler::spawn(monitor);
//! handle.refresh_now();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod coordinator;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod models;
pub mod presentation;
pub mod scheduler;
pub mod store;
pub mod tracker;

pub use config::{MonitorConfig, MonitorOptions};
pub use coordinator::{Coordinator, CycleState, FailureReport, RefreshOutcome, Status};
pub use error::{FailureKind, MonitorError, Result};
pub use fetcher::{Fetcher, PageSource};
pub use models::{CampaignSnapshot, CampaignTarget, DailySeriesEntry};
pub use presentation::{NamedValue, Presentation, Unit, Value};
pub use scheduler::MonitorHandle;
pub use store::SeriesStore;
pub use tracker::DailySeries;

use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// MonitorBuilder
// ---------------------------------------------------------------------------

/// Builder for a [`Coordinator`] backed by the HTTP [`Fetcher`].
///
/// Use [`MonitorBuilder::new()`] with a fundraiser slug or URL, chain
/// configuration methods, and call [`build()`](MonitorBuilder::build).
pub struct MonitorBuilder {
    slug_or_url: String,
    timeout: Duration,
    options: MonitorOptions,
    state_dir: Option<PathBuf>,
    base_url: Option<String>,
}

impl MonitorBuilder {
    pub fn new(slug_or_url: impl Into<String>) -> Self {
        Self {
            slug_or_url: slug_or_url.into(),
            timeout: config::DEFAULT_TIMEOUT,
            options: MonitorOptions::default(),
            state_dir: None,
            base_url: None,
        }
    }

    /// Start from a host-persisted configuration.
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(config.slug_or_url.clone())
            .scan_interval(Duration::from_secs(config.scan_interval_secs))
            .verbose_errors(config.verbose_errors)
    }

    /// Set the HTTP timeout for a single page fetch.
    ///
    /// Defaults to 20 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the polling interval. Must be at least 30 seconds.
    ///
    /// Defaults to 300 seconds.
    pub fn scan_interval(mut self, interval: Duration) -> Self {
        self.options.scan_interval = interval;
        self
    }

    /// Log a diagnostic (failure kind, message, page excerpt) for every
    /// failed cycle. Defaults to `false`.
    pub fn verbose_errors(mut self, verbose: bool) -> Self {
        self.options.verbose_errors = verbose;
        self
    }

    /// Persist the daily inflow history under `dir`.
    ///
    /// Without a state directory the history lives in memory only.
    pub fn state_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.state_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Fetch from `base_url/<slug>` instead of the public site.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Validate the configuration and build the coordinator.
    ///
    /// Loads any saved history for the fundraiser; no request is made.
    pub fn build(self) -> Result<Coordinator<Fetcher>> {
        config::check_interval(self.options.scan_interval)?;
        let target = CampaignTarget::parse(&self.slug_or_url)?;

        let fetcher = match &self.base_url {
            Some(base) => Fetcher::with_url(
                format!("{}/{}", base.trim_end_matches('/'), target.slug),
                self.timeout,
            )?,
            None => Fetcher::new(&target, self.timeout)?,
        };

        let coordinator = Coordinator::new(target, fetcher, self.options);
        match self.state_dir {
            Some(dir) => coordinator.with_store(SeriesStore::new(dir)?),
            None => Ok(coordinator),
        }
    }

    /// Build the coordinator and start polling on the current tokio runtime.
    pub fn spawn(self) -> Result<MonitorHandle<Fetcher>> {
        Ok(scheduler::spawn(self.build()?))
    }
}
