//! Refresh coordinator: one fetch → extract → track cycle at a time.
//!
//! The coordinator owns the last-known-good snapshot, the one before it, and
//! the daily inflow history. A failed cycle never replaces the snapshot; it
//! only flips availability and bumps the failure counter.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{self, MonitorOptions};
use crate::error::{FailureKind, MonitorError, Result};
use crate::extractor;
use crate::fetcher::PageSource;
use crate::models::{CampaignSnapshot, CampaignTarget};
use crate::presentation::{self, Attributes, Presentation};
use crate::store::SeriesStore;
use crate::tracker::DailySeries;

/// Source of "today" for attributing inflow to a date.
pub type TodayFn = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleState {
    Idle,
    Fetching,
    Extracting,
    Updated,
    Failed,
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CycleState::Idle => "idle",
            CycleState::Fetching => "fetching",
            CycleState::Extracting => "extracting",
            CycleState::Updated => "updated",
            CycleState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// What consumers learn about a failed cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureReport {
    pub kind: FailureKind,
    pub message: String,
    /// Only set for template mismatches.
    pub excerpt: Option<String>,
    pub at: DateTime<Utc>,
}

impl FailureReport {
    fn from_error(err: &MonitorError, at: DateTime<Utc>) -> Self {
        Self {
            kind: err.kind().unwrap_or(FailureKind::Network),
            message: err.to_string(),
            excerpt: err.excerpt().map(str::to_string),
            at,
        }
    }
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)?;
        if let Some(excerpt) = &self.excerpt {
            write!(f, " -- page starts with: {excerpt}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    Updated(Arc<CampaignSnapshot>),
    Failed(FailureReport),
}

impl RefreshOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, RefreshOutcome::Updated(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub state: CycleState,
    /// False after a failed cycle, and before the first success.
    pub available: bool,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_failure: Option<FailureReport>,
    pub consecutive_failures: u32,
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

pub struct Coordinator<S> {
    target: CampaignTarget,
    source: S,
    options: MonitorOptions,
    state: CycleState,
    current: Option<Arc<CampaignSnapshot>>,
    previous: Option<Arc<CampaignSnapshot>>,
    series: DailySeries,
    available: bool,
    last_success_at: Option<DateTime<Utc>>,
    last_failure: Option<FailureReport>,
    consecutive_failures: u32,
    store: Option<SeriesStore>,
    today: TodayFn,
}

impl<S: PageSource> Coordinator<S> {
    pub fn new(target: CampaignTarget, source: S, options: MonitorOptions) -> Self {
        Self {
            target,
            source,
            options,
            state: CycleState::Idle,
            current: None,
            previous: None,
            series: DailySeries::new(),
            available: false,
            last_success_at: None,
            last_failure: None,
            consecutive_failures: 0,
            store: None,
            today: Arc::new(local_today),
        }
    }

    /// Persist the inflow history in `store`, restoring whatever it holds
    /// for this fundraiser.
    pub fn with_store(mut self, store: SeriesStore) -> Result<Self> {
        if let Some(series) = store.load(&self.target.slug)? {
            debug!(slug = %self.target, entries = series.len(), "restored daily series");
            self.series = series;
        }
        self.store = Some(store);
        Ok(self)
    }

    pub fn with_series(mut self, series: DailySeries) -> Self {
        self.series = series;
        self
    }

    /// Override the clock used to pick "today" (tests, other time zones).
    pub fn with_today<F>(mut self, today: F) -> Self
    where
        F: Fn() -> NaiveDate + Send + Sync + 'static,
    {
        self.today = Arc::new(today);
        self
    }

    /// Run one fetch → extract → track cycle.
    ///
    /// Never returns an error: failures are reported in the outcome and in
    /// [`status()`](Self::status), and the previous snapshot stays visible.
    /// If an earlier call was dropped mid-flight, nothing from it was
    /// committed and this call simply starts over.
    pub async fn refresh(&mut self) -> RefreshOutcome {
        if matches!(self.state, CycleState::Fetching | CycleState::Extracting) {
            debug!(slug = %self.target, state = %self.state, "previous cycle was abandoned");
        }

        self.state = CycleState::Fetching;
        let raw = match self.source.fetch_page().await {
            Ok(raw) => raw,
            Err(e) => return self.fail(e),
        };

        self.state = CycleState::Extracting;
        let snapshot = match extractor::extract(&raw, &self.target, Utc::now()) {
            Ok(snapshot) => snapshot,
            Err(e) => return self.fail(e),
        };

        let snapshot = self.commit(snapshot);
        RefreshOutcome::Updated(snapshot)
    }

    fn commit(&mut self, snapshot: CampaignSnapshot) -> Arc<CampaignSnapshot> {
        self.state = CycleState::Updated;
        let today = (self.today)();

        self.series.update(self.current.as_deref(), &snapshot, today);
        if let Some(store) = &self.store {
            if let Err(e) = store.save(&self.target.slug, &self.series) {
                warn!(slug = %self.target, error = %e, "failed to save daily series");
            }
        }

        if let Some(excerpt) = &snapshot.raw_excerpt {
            debug!(slug = %self.target, %excerpt, "some fields were discarded");
        }

        let snapshot = Arc::new(snapshot);
        self.previous = self.current.replace(Arc::clone(&snapshot));
        self.last_success_at = Some(snapshot.fetched_at);
        self.last_failure = None;
        self.consecutive_failures = 0;
        self.available = true;

        debug!(
            slug = %self.target,
            fields = snapshot.field_count(),
            collected = ?snapshot.collected_amount,
            "refresh succeeded"
        );
        self.state = CycleState::Idle;
        snapshot
    }

    fn fail(&mut self, err: MonitorError) -> RefreshOutcome {
        self.state = CycleState::Failed;
        let report = FailureReport::from_error(&err, Utc::now());
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.available = false;

        debug!(
            slug = %self.target,
            kind = %report.kind,
            failures = self.consecutive_failures,
            "refresh failed"
        );
        if self.options.verbose_errors {
            warn!(
                slug = %self.target,
                url = %self.source.url(),
                kind = %report.kind,
                excerpt = report.excerpt.as_deref().unwrap_or(""),
                "{}",
                report.message
            );
        }

        self.last_failure = Some(report.clone());
        self.state = CycleState::Idle;
        RefreshOutcome::Failed(report)
    }

    // -- Reconfiguration ---------------------------------------------------

    /// Change the polling interval. Takes effect for the next scheduled
    /// cycle; the history is kept.
    pub fn set_interval(&mut self, interval: Duration) -> Result<()> {
        config::check_interval(interval)?;
        if interval != self.options.scan_interval {
            info!(
                slug = %self.target,
                from = self.options.scan_interval.as_secs(),
                to = interval.as_secs(),
                "scan interval changed"
            );
        }
        self.options.scan_interval = interval;
        Ok(())
    }

    pub fn set_verbose_errors(&mut self, verbose: bool) {
        self.options.verbose_errors = verbose;
    }

    pub fn apply_options(&mut self, options: MonitorOptions) -> Result<()> {
        self.set_interval(options.scan_interval)?;
        self.set_verbose_errors(options.verbose_errors);
        Ok(())
    }

    // -- Accessors ---------------------------------------------------------

    pub fn options(&self) -> MonitorOptions {
        self.options
    }

    pub fn target(&self) -> &CampaignTarget {
        &self.target
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    /// Last-known-good snapshot, possibly stale.
    pub fn current(&self) -> Option<Arc<CampaignSnapshot>> {
        self.current.clone()
    }

    pub fn previous(&self) -> Option<Arc<CampaignSnapshot>> {
        self.previous.clone()
    }

    pub fn series(&self) -> &DailySeries {
        &self.series
    }

    pub fn today(&self) -> NaiveDate {
        (self.today)()
    }

    pub fn status(&self) -> Status {
        Status {
            state: self.state,
            available: self.available,
            last_success_at: self.last_success_at,
            last_failure: self.last_failure.clone(),
            consecutive_failures: self.consecutive_failures,
        }
    }

    pub fn presentation(&self) -> Presentation {
        let current = self.current.as_deref();
        Presentation {
            values: presentation::present(current, &self.series, self.today()),
            attributes: Attributes {
                slug: self.target.slug.clone(),
                url: self.target.url.clone(),
                title: current.and_then(|s| s.title.clone()),
                available: self.available,
                last_success_at: self.last_success_at,
                consecutive_failures: self.consecutive_failures,
            },
        }
    }
}
