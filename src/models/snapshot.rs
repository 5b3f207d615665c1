use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CampaignSnapshot — fields extracted from a single fetch
// ---------------------------------------------------------------------------

/// Extracted state of a fundraiser at one point in time.
///
/// Every data field is optional: a page that lacks one figure still yields
/// the others. Snapshots are shared behind `Arc` once committed and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignSnapshot {
    pub slug: String,
    pub url: String,
    pub title: Option<String>,
    pub collected_amount: Option<Decimal>,
    pub missing_amount: Option<Decimal>,
    /// `collected_amount + missing_amount`, only when both are known.
    pub goal_amount: Option<Decimal>,
    /// As printed on the page; not derived from the amounts.
    pub progress_percent: Option<Decimal>,
    pub supporters_count: Option<u64>,
    pub recurring_supporters_count: Option<u64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub fetched_at: DateTime<Utc>,
    /// Text around the first value that matched an anchor but was discarded.
    pub raw_excerpt: Option<String>,
}

impl CampaignSnapshot {
    pub fn empty(slug: &str, url: &str, fetched_at: DateTime<Utc>) -> Self {
        Self {
            slug: slug.to_string(),
            url: url.to_string(),
            title: None,
            collected_amount: None,
            missing_amount: None,
            goal_amount: None,
            progress_percent: None,
            supporters_count: None,
            recurring_supporters_count: None,
            start_date: None,
            end_date: None,
            fetched_at,
            raw_excerpt: None,
        }
    }

    /// Number of data fields that were extracted. The title does not count.
    pub fn field_count(&self) -> usize {
        [
            self.collected_amount.is_some(),
            self.missing_amount.is_some(),
            self.progress_percent.is_some(),
            self.supporters_count.is_some(),
            self.recurring_supporters_count.is_some(),
            self.start_date.is_some(),
            self.end_date.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count()
    }

    pub fn is_empty(&self) -> bool {
        self.field_count() == 0
    }
}
