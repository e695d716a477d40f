//! Consumption figures derived from cumulative meter readings.
//!
//! Every function here is pure: it takes an already-materialised slice of
//! readings, sorts a private copy where ordering matters, and never touches
//! storage.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::Reading;

/// Net consumption attributable to calendar month `year`/`month`.
///
/// Readings are sorted by date (stable, so same-date readings keep their input
/// order). The first reading inside the month is measured against the latest
/// reading strictly before it anywhere in the series, or against zero when
/// there is none. Every later in-month reading is measured against the
/// in-month reading before it. Readings after the month never contribute.
///
/// Returns exact zero when no reading falls in the month, which is
/// indistinguishable from a month whose deltas net to zero. Use
/// [`has_readings_in_month`] when that difference matters.
///
/// `month` is not range-checked; an out-of-range month matches nothing.
pub fn consumption_for_month(readings: &[Reading], year: i32, month: u32) -> Decimal {
    let sorted = sorted_by_date(readings);

    let mut total = Decimal::ZERO;
    let mut prev_value: Option<Decimal> = None;

    for m in sorted.iter().filter(|r| r.is_in_month(year, month)) {
        let baseline = match prev_value {
            Some(v) => v,
            None => sorted
                .iter()
                .rev()
                .find(|x| x.date < m.date)
                .map(|x| x.value)
                .unwrap_or(Decimal::ZERO),
        };
        total += m.value - baseline;
        prev_value = Some(m.value);
    }

    total
}

/// Whether at least one reading falls inside `year`/`month`.
pub fn has_readings_in_month(readings: &[Reading], year: i32, month: u32) -> bool {
    readings.iter().any(|r| r.is_in_month(year, month))
}

/// The most recent reading by date, or `None` for an empty series.
///
/// Among readings sharing the latest date, the one listed last wins.
pub fn last_reading(readings: &[Reading]) -> Option<Reading> {
    sorted_by_date(readings).last().copied()
}

/// Difference between `target` and the latest reading dated strictly before it.
///
/// Readings on the same day as `target` are never treated as its predecessor.
/// Returns `None` when nothing precedes `target`.
pub fn consumption_from_previous(readings: &[Reading], target: &Reading) -> Option<Decimal> {
    sorted_by_date(readings)
        .iter()
        .rev()
        .find(|r| r.date < target.date)
        .map(|prev| target.value - prev.value)
}

/// Dates that carry more than one reading, ascending and deduplicated.
///
/// Same-date readings make the monthly figures depend on input order, so
/// callers use this to flag series that need cleaning up.
pub fn duplicate_dates(readings: &[Reading]) -> Vec<NaiveDate> {
    let sorted = sorted_by_date(readings);
    let mut dupes: Vec<NaiveDate> = sorted
        .windows(2)
        .filter(|pair| pair[0].date == pair[1].date)
        .map(|pair| pair[0].date)
        .collect();
    dupes.dedup();
    dupes
}

fn sorted_by_date(readings: &[Reading]) -> Vec<Reading> {
    let mut sorted = readings.to_vec();
    sorted.sort_by_key(|r| r.date);
    sorted
}
