//! Live smoke test against siepomaga.pl.
//!
//! Fetches a real fundraiser page and runs it through the whole pipeline.
//! The fundraiser defaults to `SIEPOMAGA_SMOKE_SLUG` or a long-running one.
//!
//! Run with:
//! ```sh
//! cargo test --test smoke_test -- --ignored --nocapture
//! ```

use std::time::Duration;

use siepomaga::{MonitorBuilder, RefreshOutcome};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Print a section header to stderr.
fn section(name: &str) {
    eprintln!("\n{}", "=".repeat(60));
    eprintln!("  {}", name);
    eprintln!("{}", "=".repeat(60));
}

/// Counters for pass/fail reporting.
struct Counters {
    pass: usize,
    fail: usize,
}

impl Counters {
    fn new() -> Self {
        Self { pass: 0, fail: 0 }
    }

    fn check(&mut self, label: &str, condition: bool, detail: &str) {
        let status = if condition { "PASS" } else { "FAIL" };
        if condition {
            self.pass += 1;
        } else {
            self.fail += 1;
        }
        if detail.is_empty() {
            eprintln!("  [{}] {}", status, label);
        } else {
            eprintln!("  [{}] {} -- {}", status, label, detail);
        }
    }
}

// ---------------------------------------------------------------------------
// Main smoke test
// ---------------------------------------------------------------------------

#[tokio::test]
#[ignore]
async fn smoke_test() {
    let slug = std::env::var("SIEPOMAGA_SMOKE_SLUG").unwrap_or_else(|_| "pomagamy".to_string());
    let mut monitor = MonitorBuilder::new(slug.as_str())
        .timeout(Duration::from_secs(30))
        .verbose_errors(true)
        .build()
        .unwrap();
    let mut c = Counters::new();

    section("Fetch and extract");

    let outcome = monitor.refresh().await;
    let snapshot = match outcome {
        RefreshOutcome::Updated(snapshot) => snapshot,
        RefreshOutcome::Failed(report) => panic!("live refresh failed: {report}"),
    };
    c.check("slug", snapshot.slug == slug.to_ascii_lowercase(), &snapshot.slug);
    c.check(
        "collected amount",
        snapshot.collected_amount.is_some(),
        &format!("{:?}", snapshot.collected_amount),
    );
    c.check(
        "title",
        snapshot.title.is_some(),
        snapshot.title.as_deref().unwrap_or(""),
    );
    c.check(
        "field count",
        snapshot.field_count() > 0,
        &snapshot.field_count().to_string(),
    );

    section("Presentation");

    let view = monitor.presentation();
    for value in &view.values {
        eprintln!("  {:<20} {}", value.name, value.value);
    }
    c.check("available", view.attributes.available, "");
    c.check(
        "daily inflow seeded",
        view.get("daily_inflow").is_some_and(|v| !v.is_unknown()),
        "",
    );

    section("Summary");
    eprintln!("  pass={} fail={}", c.pass, c.fail);
    assert_eq!(c.fail, 0, "{} smoke checks failed", c.fail);
}
