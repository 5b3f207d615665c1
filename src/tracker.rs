//! Rolling window of daily contribution deltas.
//!
//! The tracker attributes growth of the collected amount to calendar dates.
//! A date's entry is always measured against the total that was observed when
//! that date's attribution began, so refreshing several times a day never
//! counts the same growth twice.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SERIES_CAPACITY;
use crate::models::{CampaignSnapshot, DailySeriesEntry};

/// Total against which one date's inflow is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baseline {
    pub date: NaiveDate,
    pub total: Decimal,
}

/// Persistable form of a [`DailySeries`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesState {
    #[serde(default)]
    pub entries: Vec<DailySeriesEntry>,
    pub baseline: Option<Baseline>,
    pub last_total: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// DailySeries
// ---------------------------------------------------------------------------

/// Date-keyed inflow history, capped at [`SERIES_CAPACITY`] dates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailySeries {
    entries: BTreeMap<NaiveDate, Decimal>,
    baseline: Option<Baseline>,
    last_total: Option<Decimal>,
}

impl DailySeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a freshly extracted snapshot into the series.
    ///
    /// `previous` is the last snapshot committed before `current`, or `None`
    /// on the first observation since startup. Returns today's amount after
    /// the update, or `None` when `current` has no collected amount (the
    /// series is left untouched in that case).
    pub fn update(
        &mut self,
        previous: Option<&CampaignSnapshot>,
        current: &CampaignSnapshot,
        today: NaiveDate,
    ) -> Option<Decimal> {
        let total = current.collected_amount?;

        let opening = match self.baseline {
            Some(b) if b.date == today => b.total,
            _ => {
                let opening = if previous.is_none() && !self.entries.contains_key(&today) {
                    // First sighting: attribute nothing rather than the whole total.
                    total
                } else {
                    self.last_total
                        .or_else(|| previous.and_then(|p| p.collected_amount))
                        .unwrap_or(total)
                };
                self.baseline = Some(Baseline {
                    date: today,
                    total: opening,
                });
                opening
            }
        };

        let amount = (total - opening).max(Decimal::ZERO);
        self.entries.insert(today, amount);
        self.last_total = Some(total);
        self.evict();

        debug!(%today, %total, %opening, %amount, "daily series updated");
        Some(amount)
    }

    fn evict(&mut self) {
        while self.entries.len() > SERIES_CAPACITY {
            self.entries.pop_first();
        }
    }

    /// Entries in ascending date order.
    pub fn entries(&self) -> Vec<DailySeriesEntry> {
        self.entries
            .iter()
            .map(|(date, amount)| DailySeriesEntry {
                date: *date,
                amount: *amount,
            })
            .collect()
    }

    pub fn amount_on(&self, date: NaiveDate) -> Option<Decimal> {
        self.entries.get(&date).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last_total(&self) -> Option<Decimal> {
        self.last_total
    }

    pub fn to_state(&self) -> SeriesState {
        SeriesState {
            entries: self.entries(),
            baseline: self.baseline,
            last_total: self.last_total,
        }
    }

    /// Rebuild a series from persisted state; duplicates keep the last entry
    /// for a date and the window is re-capped.
    pub fn from_state(state: SeriesState) -> Self {
        let mut series = Self {
            entries: state
                .entries
                .into_iter()
                .map(|e| (e.date, e.amount))
                .collect(),
            baseline: state.baseline,
            last_total: state.last_total,
        };
        series.evict();
        series
    }
}
