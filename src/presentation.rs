//! Mapping of snapshot fields to named, unit-tagged values.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::CURRENCY_CODE;
use crate::models::{CampaignSnapshot, DailySeriesEntry};
use crate::tracker::DailySeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Currency,
    Percent,
    Count,
    Date,
    History,
}

impl Unit {
    /// Display symbol, if the unit has one.
    pub fn symbol(&self) -> Option<&'static str> {
        match self {
            Unit::Currency => Some(CURRENCY_CODE),
            Unit::Percent => Some("%"),
            Unit::Count => Some("osób"),
            Unit::Date | Unit::History => None,
        }
    }
}

/// A value, or the explicit absence of one. Zero is never used for absence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    Unknown,
    Amount(Decimal),
    Percent(Decimal),
    Count(u64),
    Date(NaiveDate),
    History(Vec<DailySeriesEntry>),
}

impl Value {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unknown => f.write_str("unknown"),
            Value::Amount(v) | Value::Percent(v) => write!(f, "{v}"),
            Value::Count(n) => write!(f, "{n}"),
            Value::Date(d) => write!(f, "{d}"),
            Value::History(entries) => {
                let parts: Vec<String> = entries
                    .iter()
                    .map(|e| format!("{}={}", e.date, e.amount))
                    .collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedValue {
    pub key: String,
    pub name: String,
    pub unit: Unit,
    pub value: Value,
}

/// Descriptive attributes shown next to the values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    pub slug: String,
    pub url: String,
    pub title: Option<String>,
    pub available: bool,
    pub last_success_at: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
}

/// Everything a consumer needs to render one fundraiser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Presentation {
    pub values: Vec<NamedValue>,
    pub attributes: Attributes,
}

impl Presentation {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.iter().find(|v| v.key == key).map(|v| &v.value)
    }
}

// ---------------------------------------------------------------------------
// present
// ---------------------------------------------------------------------------

fn named(key: &str, name: &str, unit: Unit, value: Value) -> NamedValue {
    NamedValue {
        key: key.to_string(),
        name: name.to_string(),
        unit,
        value,
    }
}

fn or_unknown<T>(field: Option<T>, wrap: impl FnOnce(T) -> Value) -> Value {
    field.map(wrap).unwrap_or(Value::Unknown)
}

/// Map a snapshot and the inflow history to named values.
///
/// `today` selects which history entry is reported as the daily inflow.
pub fn present(
    snapshot: Option<&CampaignSnapshot>,
    series: &DailySeries,
    today: NaiveDate,
) -> Vec<NamedValue> {
    let s = snapshot;
    let history = series.entries();

    vec![
        named(
            "collected",
            "Zebrano",
            Unit::Currency,
            or_unknown(s.and_then(|s| s.collected_amount), Value::Amount),
        ),
        named(
            "missing",
            "Brakuje",
            Unit::Currency,
            or_unknown(s.and_then(|s| s.missing_amount), Value::Amount),
        ),
        named(
            "progress",
            "Postęp",
            Unit::Percent,
            or_unknown(s.and_then(|s| s.progress_percent), Value::Percent),
        ),
        named(
            "goal",
            "Cel",
            Unit::Currency,
            or_unknown(s.and_then(|s| s.goal_amount), Value::Amount),
        ),
        named(
            "daily_inflow",
            "Dzienny wpływ",
            Unit::Currency,
            or_unknown(series.amount_on(today), Value::Amount),
        ),
        named(
            "daily_inflow_history",
            "Historia wpływów",
            Unit::History,
            if history.is_empty() {
                Value::Unknown
            } else {
                Value::History(history)
            },
        ),
        named(
            "supporters",
            "Wspierających",
            Unit::Count,
            or_unknown(s.and_then(|s| s.supporters_count), Value::Count),
        ),
        named(
            "recurring_supporters",
            "Stałych pomagaczy",
            Unit::Count,
            or_unknown(s.and_then(|s| s.recurring_supporters_count), Value::Count),
        ),
        named(
            "start_date",
            "Rozpoczęcie",
            Unit::Date,
            or_unknown(s.and_then(|s| s.start_date), Value::Date),
        ),
        named(
            "end_date",
            "Zakończenie",
            Unit::Date,
            or_unknown(s.and_then(|s| s.end_date), Value::Date),
        ),
    ]
}
