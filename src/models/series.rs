use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DailySeriesEntry — contribution attributed to one calendar date
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySeriesEntry {
    pub date: NaiveDate,
    pub amount: Decimal,
}
