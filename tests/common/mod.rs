//! Shared test fixtures for the fundraiser monitor integration tests.
//!
//! Provides sample pages, a scripted [`PageSource`] that replays canned
//! replies without touching the network, and small builders for snapshots
//! and dates.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use siepomaga::{CampaignSnapshot, CampaignTarget, MonitorError, PageSource, Result};
use tokio::time::Instant;

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

/// A fundraiser page in the layout the live site uses.
pub const FUNDRAISER_PAGE: &str = r#"<!DOCTYPE html>
<html lang="pl">
<head>
<meta charset="utf-8">
<title>
  Pomoc dla Stasia | SiePomaga
</title>
</head>
<body>
<h1>Pomóż Stasiowi wrócić do zdrowia</h1>
<div class="progress"><p>12&nbsp;345 zł (61,72%)</p></div>
<p class="missing">Brakuje 7 655 zł</p>
<p>Wsparło 321 osób</p>
<p><strong>45</strong> Stałych Pomagaczy</p>
<p>Rozpoczęcie: 5 stycznia 2024</p>
<p>Zakończenie: 31.12.2024</p>
<p>Koszt leczenia 20 000 zł</p>
</body>
</html>
"#;

/// Labeled figures on a single line, no dates.
pub const LABELED_PAGE: &str =
    "<p>Zebrano: 1 234,50 zł ... Brakuje: 765,50 zł ... Postęp: 62%</p>";

/// What a consent wall served instead of the fundraiser looks like.
pub const CONSENT_PAGE: &str = r#"<html><head><title>Zgoda</title></head>
<body><div id="consent">Please accept cookies to continue</div></body></html>"#;

/// Page with the given collected amount and nothing else of note.
pub fn page_with_collected(amount: &str) -> String {
    format!("<html><body><p>Zebrano: {amount} zł</p></body></html>")
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub fn target() -> CampaignTarget {
    CampaignTarget::parse("dla-stasia").unwrap()
}

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Day `n` counted from 2024-03-01.
pub fn day(n: i64) -> NaiveDate {
    date(2024, 3, 1) + chrono::Duration::days(n)
}

pub fn snapshot(collected: Option<&str>) -> CampaignSnapshot {
    let t = target();
    let mut s = CampaignSnapshot::empty(&t.slug, &t.url, Utc::now());
    s.collected_amount = collected.map(dec);
    s
}

/// Assert two instants are the given distance apart, give or take a tick.
pub fn assert_gap(earlier: Instant, later: Instant, expected: Duration) {
    let gap = later.duration_since(earlier);
    let diff = if gap > expected { gap - expected } else { expected - gap };
    assert!(
        diff <= Duration::from_millis(10),
        "expected a gap of {expected:?}, got {gap:?}"
    );
}

// ---------------------------------------------------------------------------
// ScriptedSource
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Reply {
    Page(String),
    Timeout,
    Network,
    Status(u16),
}

/// [`PageSource`] that hands out queued replies in order.
///
/// The last reply repeats once the queue runs dry. Every call records the
/// (tokio) instant it started at, so tests on a paused clock can check the
/// schedule.
#[derive(Clone)]
pub struct ScriptedSource {
    url: String,
    replies: Arc<Mutex<VecDeque<Reply>>>,
    last: Arc<Mutex<Option<Reply>>>,
    calls: Arc<Mutex<Vec<Instant>>>,
    latency: Duration,
}

impl ScriptedSource {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            url: target().url,
            replies: Arc::new(Mutex::new(replies.into())),
            last: Arc::new(Mutex::new(None)),
            calls: Arc::new(Mutex::new(Vec::new())),
            latency: Duration::ZERO,
        }
    }

    pub fn pages(pages: &[&str]) -> Self {
        Self::new(pages.iter().map(|p| Reply::Page(p.to_string())).collect())
    }

    /// Every fetch takes `latency` before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn push(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn calls(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn next_reply(&self) -> Reply {
        let mut last = self.last.lock().unwrap();
        if let Some(reply) = self.replies.lock().unwrap().pop_front() {
            *last = Some(reply);
        }
        last.clone().unwrap_or(Reply::Network)
    }
}

impl PageSource for ScriptedSource {
    fn url(&self) -> &str {
        &self.url
    }

    async fn fetch_page(&self) -> Result<String> {
        self.calls.lock().unwrap().push(Instant::now());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match self.next_reply() {
            Reply::Page(body) => Ok(body),
            Reply::Timeout => Err(MonitorError::Timeout {
                url: self.url.clone(),
            }),
            Reply::Network => Err(MonitorError::Network {
                url: self.url.clone(),
                message: "connection refused".into(),
            }),
            Reply::Status(code) => Err(MonitorError::HttpStatus {
                url: self.url.clone(),
                code,
            }),
        }
    }
}
