//! Daily series tests: seeding, same-day deltas, day rollover, retention.

mod common;

use common::{day, dec, snapshot};
use siepomaga::DailySeries;

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

#[test]
fn first_update_seeds_today_with_zero() {
    let mut series = DailySeries::new();
    let amount = series.update(None, &snapshot(Some("987654.32")), day(0));

    assert_eq!(amount, Some(dec("0")));
    assert_eq!(series.amount_on(day(0)), Some(dec("0")));
    assert_eq!(series.len(), 1);
}

#[test]
fn absent_collected_amount_leaves_series_unchanged() {
    let mut series = DailySeries::new();
    let first = snapshot(Some("1000"));
    series.update(None, &first, day(0));
    let before = series.clone();

    let amount = series.update(Some(&first), &snapshot(None), day(0));

    assert_eq!(amount, None);
    assert_eq!(series, before);
}

#[test]
fn absent_amount_on_first_observation_does_not_seed() {
    let mut series = DailySeries::new();
    assert_eq!(series.update(None, &snapshot(None), day(0)), None);
    assert!(series.is_empty());
}

// ---------------------------------------------------------------------------
// Same-day refreshes
// ---------------------------------------------------------------------------

#[test]
fn same_day_growth_is_measured_from_the_days_opening_total() {
    let mut series = DailySeries::new();
    let first = snapshot(Some("1000.00"));
    let second = snapshot(Some("1150.00"));

    series.update(None, &first, day(0));
    let amount = series.update(Some(&first), &second, day(0));

    assert_eq!(amount, Some(dec("150.00")));
    assert_eq!(series.amount_on(day(0)), Some(dec("150.00")));
}

#[test]
fn unchanged_total_twice_in_a_day_is_idempotent() {
    let mut series = DailySeries::new();
    let a = snapshot(Some("1000"));
    let b = snapshot(Some("1200"));
    series.update(None, &a, day(0));
    series.update(Some(&a), &b, day(0));

    series.update(Some(&b), &b, day(0));
    series.update(Some(&b), &b, day(0));

    assert_eq!(series.amount_on(day(0)), Some(dec("200")));
}

#[test]
fn dip_and_recovery_within_a_day_is_not_double_counted() {
    let mut series = DailySeries::new();
    let totals = ["1000", "900", "1000", "1100"];
    let mut previous = None;
    for t in totals {
        let s = snapshot(Some(t));
        series.update(previous.as_ref(), &s, day(0));
        previous = Some(s);
    }

    assert_eq!(series.amount_on(day(0)), Some(dec("100")));
}

// ---------------------------------------------------------------------------
// Day rollover
// ---------------------------------------------------------------------------

#[test]
fn new_day_starts_from_previous_days_last_total() {
    let mut series = DailySeries::new();
    let a = snapshot(Some("1000"));
    let b = snapshot(Some("1100"));
    let c = snapshot(Some("1250"));

    series.update(None, &a, day(0));
    series.update(Some(&a), &b, day(0));
    series.update(Some(&b), &c, day(1));

    assert_eq!(series.amount_on(day(0)), Some(dec("100")));
    assert_eq!(series.amount_on(day(1)), Some(dec("150")));
}

#[test]
fn restart_on_same_day_continues_the_days_entry() {
    let mut series = DailySeries::new();
    let a = snapshot(Some("1000"));
    series.update(None, &a, day(0));
    series.update(Some(&a), &snapshot(Some("1100")), day(0));

    let mut restored = DailySeries::from_state(series.to_state());
    restored.update(None, &snapshot(Some("1200")), day(0));

    assert_eq!(restored.amount_on(day(0)), Some(dec("200")));
}

#[test]
fn restart_on_a_new_day_seeds_zero() {
    let mut series = DailySeries::new();
    let a = snapshot(Some("1000"));
    series.update(None, &a, day(0));
    series.update(Some(&a), &snapshot(Some("1100")), day(0));

    let mut restored = DailySeries::from_state(series.to_state());
    restored.update(None, &snapshot(Some("5000")), day(3));

    assert_eq!(restored.amount_on(day(3)), Some(dec("0")));
    assert_eq!(restored.amount_on(day(0)), Some(dec("100")));
}

// ---------------------------------------------------------------------------
// Retention
// ---------------------------------------------------------------------------

#[test]
fn forty_days_keep_the_most_recent_thirty_one_in_order() {
    let mut series = DailySeries::new();
    let mut previous = None;
    for n in 0..40 {
        let s = snapshot(Some(&(1000 + n * 10).to_string()));
        series.update(previous.as_ref(), &s, day(n));
        previous = Some(s);
    }

    let entries = series.entries();
    assert_eq!(entries.len(), 31);
    assert_eq!(entries.first().unwrap().date, day(9));
    assert_eq!(entries.last().unwrap().date, day(39));
    assert!(entries.windows(2).all(|w| w[0].date < w[1].date));
    assert!(entries.iter().all(|e| e.amount == dec("10")));
}

#[test]
fn restored_state_is_sorted_and_capped() {
    let mut series = DailySeries::new();
    let mut previous = None;
    for n in 0..35 {
        let s = snapshot(Some(&(n * 5).to_string()));
        series.update(previous.as_ref(), &s, day(n));
        previous = Some(s);
    }
    let mut state = series.to_state();
    state.entries.reverse();

    let restored = DailySeries::from_state(state);
    let entries = restored.entries();
    assert_eq!(entries.len(), 31);
    assert_eq!(entries.first().unwrap().date, day(4));
    assert!(entries.windows(2).all(|w| w[0].date < w[1].date));
}
