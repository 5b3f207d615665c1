//! Presentation mapping: names, units, unknown vs zero.

mod common;

use common::{date, day, dec, snapshot, target};
use siepomaga::presentation::present;
use siepomaga::{CampaignSnapshot, DailySeries, Unit, Value};

fn full_snapshot() -> CampaignSnapshot {
    let mut s = snapshot(Some("12345"));
    s.missing_amount = Some(dec("7655"));
    s.goal_amount = Some(dec("20000"));
    s.progress_percent = Some(dec("61.72"));
    s.supporters_count = Some(321);
    s.recurring_supporters_count = Some(0);
    s.start_date = Some(date(2024, 1, 5));
    s
}

#[test]
fn every_field_has_a_stable_key_name_and_unit() {
    let values = present(None, &DailySeries::new(), day(0));
    let keys: Vec<(&str, &str, Unit)> = values
        .iter()
        .map(|v| (v.key.as_str(), v.name.as_str(), v.unit))
        .collect();

    assert_eq!(
        keys,
        vec![
            ("collected", "Zebrano", Unit::Currency),
            ("missing", "Brakuje", Unit::Currency),
            ("progress", "Postęp", Unit::Percent),
            ("goal", "Cel", Unit::Currency),
            ("daily_inflow", "Dzienny wpływ", Unit::Currency),
            ("daily_inflow_history", "Historia wpływów", Unit::History),
            ("supporters", "Wspierających", Unit::Count),
            ("recurring_supporters", "Stałych pomagaczy", Unit::Count),
            ("start_date", "Rozpoczęcie", Unit::Date),
            ("end_date", "Zakończenie", Unit::Date),
        ]
    );
    assert!(values.iter().all(|v| v.value.is_unknown()));
}

#[test]
fn absent_fields_are_unknown_and_zero_stays_zero() {
    let s = full_snapshot();
    let values = present(Some(&s), &DailySeries::new(), day(0));
    let get = |key: &str| values.iter().find(|v| v.key == key).unwrap().value.clone();

    assert_eq!(get("collected"), Value::Amount(dec("12345")));
    assert_eq!(get("progress"), Value::Percent(dec("61.72")));
    assert_eq!(get("recurring_supporters"), Value::Count(0));
    assert_eq!(get("start_date"), Value::Date(date(2024, 1, 5)));
    assert_eq!(get("end_date"), Value::Unknown);
    assert_eq!(get("daily_inflow"), Value::Unknown);
    assert_eq!(get("daily_inflow_history"), Value::Unknown);
}

#[test]
fn daily_inflow_comes_from_todays_entry() {
    let a = snapshot(Some("1000"));
    let b = snapshot(Some("1150"));
    let mut series = DailySeries::new();
    series.update(None, &a, day(0));
    series.update(Some(&a), &b, day(0));

    let today = present(Some(&b), &series, day(0));
    let tomorrow = present(Some(&b), &series, day(1));

    assert_eq!(today[4].value, Value::Amount(dec("150")));
    assert_eq!(tomorrow[4].value, Value::Unknown);
    match &today[5].value {
        Value::History(entries) => {
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].date, day(0));
            assert_eq!(entries[0].amount, dec("150"));
        }
        other => panic!("expected history, got {other:?}"),
    }
}

#[test]
fn unit_symbols() {
    assert_eq!(Unit::Currency.symbol(), Some("PLN"));
    assert_eq!(Unit::Percent.symbol(), Some("%"));
    assert_eq!(Unit::Count.symbol(), Some("osób"));
    assert_eq!(Unit::Date.symbol(), None);
    assert_eq!(Unit::History.symbol(), None);
}

#[test]
fn values_display_and_serialize() {
    assert_eq!(Value::Unknown.to_string(), "unknown");
    assert_eq!(Value::Amount(dec("12.50")).to_string(), "12.50");
    assert_eq!(Value::Date(date(2024, 12, 31)).to_string(), "2024-12-31");

    let unknown = serde_json::to_value(Value::Unknown).unwrap();
    assert_eq!(unknown, serde_json::json!({ "kind": "unknown" }));

    let count = serde_json::to_value(Value::Count(0)).unwrap();
    assert_eq!(count, serde_json::json!({ "kind": "count", "value": 0 }));
}

#[test]
fn snapshot_field_count_ignores_title() {
    let t = target();
    let mut s = CampaignSnapshot::empty(&t.slug, &t.url, chrono::Utc::now());
    s.title = Some("Tytuł".into());
    assert!(s.is_empty());

    assert_eq!(full_snapshot().field_count(), 6);
}
