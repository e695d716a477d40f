//! Per-month consumption over a whole reading series.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use meter_core::consumption::{
    consumption_for_month, duplicate_dates, has_readings_in_month, last_reading,
};
use meter_core::error::Result;
use meter_core::models::{Reading, Service};
use meter_core::time_utils::Month;
use rust_decimal::Decimal;
use tracing::warn;

use crate::store::{Ledger, ReadingStore};

// ── MonthlyConsumption ────────────────────────────────────────────────────────

/// Consumption for one calendar month of one series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyConsumption {
    pub month: Month,
    pub consumption: Decimal,
    /// Readings dated inside the month.
    pub readings_count: usize,
}

/// One row per month that holds at least one reading, oldest first.
///
/// Months without readings are skipped rather than reported as zero; their
/// consumption shows up in the next month that has a reading.
pub fn monthly_history(readings: &[Reading]) -> Vec<MonthlyConsumption> {
    let dupes = duplicate_dates(readings);
    if !dupes.is_empty() {
        warn!(
            "{} date(s) carry more than one reading; monthly totals depend on input order",
            dupes.len()
        );
    }

    // BTreeMap keeps months sorted.
    let mut counts: BTreeMap<Month, usize> = BTreeMap::new();
    for r in readings {
        *counts.entry(Month::of(r.date)).or_default() += 1;
    }

    counts
        .into_iter()
        .map(|(month, readings_count)| MonthlyConsumption {
            month,
            consumption: consumption_for_month(readings, month.year, month.month),
            readings_count,
        })
        .collect()
}

/// Sum of the consumption column.
pub fn calculate_totals(rows: &[MonthlyConsumption]) -> Decimal {
    rows.iter().map(|r| r.consumption).sum()
}

// ── ServiceSummary ────────────────────────────────────────────────────────────

/// A month's figure plus whether any reading backed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthFigure {
    pub month: Month,
    pub consumption: Decimal,
    /// `false` means "no data", not "nothing consumed".
    pub has_data: bool,
}

impl MonthFigure {
    fn compute(readings: &[Reading], month: Month) -> Self {
        Self {
            month,
            consumption: consumption_for_month(readings, month.year, month.month),
            has_data: has_readings_in_month(readings, month.year, month.month),
        }
    }
}

/// Dashboard line for one service.
#[derive(Debug, Clone)]
pub struct ServiceSummary {
    pub service: Service,
    pub last_reading: Option<Reading>,
    pub current: MonthFigure,
    pub previous: MonthFigure,
}

/// Summarise one service relative to `today`.
pub fn service_summary(
    ledger: &Ledger,
    service: &Service,
    today: NaiveDate,
) -> Result<ServiceSummary> {
    let readings = ledger.get_readings(service.id)?;
    let current = Month::of(today);

    Ok(ServiceSummary {
        service: service.clone(),
        last_reading: last_reading(&readings),
        current: MonthFigure::compute(&readings, current),
        previous: MonthFigure::compute(&readings, current.previous()),
    })
}

/// Summaries for every service, ordered by service name.
pub fn summarize_all(ledger: &Ledger, today: NaiveDate) -> Result<Vec<ServiceSummary>> {
    ledger
        .services_sorted()
        .into_iter()
        .map(|s| service_summary(ledger, s, today))
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use meter_core::validation::{MeasurementInput, ServiceInput};
    use rust_decimal_macros::dec;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn r(y: i32, m: u32, d: u32, value: Decimal) -> Reading {
        Reading::new(day(y, m, d), value)
    }

    fn month(y: i32, m: u32) -> Month {
        Month::new(y, m).unwrap()
    }

    fn ledger_with(readings: &[(NaiveDate, Decimal)]) -> (Ledger, u64) {
        let mut ledger = Ledger::new();
        let id = ledger
            .add_service(ServiceInput::new("Electricity", "kWh", None).unwrap())
            .unwrap()
            .id;
        for &(date, value) in readings {
            ledger
                .add_measurement(MeasurementInput::new(id, date, value, None).unwrap())
                .unwrap();
        }
        (ledger, id)
    }

    // ── monthly_history ───────────────────────────────────────────────────────

    #[test]
    fn test_monthly_history_groups_and_sorts() {
        let readings = vec![
            r(2025, 3, 1, dec!(200)),
            r(2025, 1, 1, dec!(120)),
            r(2025, 2, 1, dec!(150)),
            r(2025, 2, 20, dec!(180)),
        ];
        let rows = monthly_history(&readings);

        let months: Vec<String> = rows.iter().map(|r| r.month.to_string()).collect();
        assert_eq!(months, vec!["2025-01", "2025-02", "2025-03"]);
        assert_eq!(rows[0].consumption, dec!(120));
        assert_eq!(rows[1].consumption, dec!(60));
        assert_eq!(rows[1].readings_count, 2);
        assert_eq!(rows[2].consumption, dec!(20));
    }

    #[test]
    fn test_monthly_history_skips_empty_months() {
        let readings = vec![r(2024, 11, 30, dec!(10)), r(2025, 2, 5, dec!(18))];
        let rows = monthly_history(&readings);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].month, month(2025, 2));
        assert_eq!(rows[1].consumption, dec!(8));
    }

    #[test]
    fn test_monthly_history_empty() {
        assert!(monthly_history(&[]).is_empty());
    }

    #[test]
    fn test_totals_telescope_to_last_reading() {
        let readings = vec![
            r(2024, 12, 3, dec!(10.5)),
            r(2025, 1, 9, dec!(20.25)),
            r(2025, 1, 28, dec!(22)),
            r(2025, 3, 1, dec!(40.125)),
        ];
        let rows = monthly_history(&readings);
        assert_eq!(calculate_totals(&rows), dec!(40.125));
    }

    #[test]
    fn test_calculate_totals_empty() {
        assert_eq!(calculate_totals(&[]), Decimal::ZERO);
    }

    // ── service_summary ───────────────────────────────────────────────────────

    #[test]
    fn test_service_summary_current_and_previous() {
        let (ledger, id) = ledger_with(&[
            (day(2025, 1, 1), dec!(120.0)),
            (day(2025, 2, 1), dec!(150.0)),
            (day(2025, 2, 20), dec!(180.0)),
            (day(2025, 3, 2), dec!(195.5)),
        ]);
        let service = ledger.service(id).unwrap();
        let summary = service_summary(&ledger, service, day(2025, 3, 15)).unwrap();

        assert_eq!(summary.service.name, "Electricity");
        assert_eq!(summary.last_reading, Some(r(2025, 3, 2, dec!(195.5))));
        assert_eq!(summary.current.month, month(2025, 3));
        assert_eq!(summary.current.consumption, dec!(15.5));
        assert!(summary.current.has_data);
        assert_eq!(summary.previous.consumption, dec!(60.0));
    }

    #[test]
    fn test_service_summary_distinguishes_no_data() {
        let (ledger, id) = ledger_with(&[(day(2025, 1, 1), dec!(120.0))]);
        let service = ledger.service(id).unwrap();
        let summary = service_summary(&ledger, service, day(2025, 3, 15)).unwrap();

        assert_eq!(summary.current.consumption, Decimal::ZERO);
        assert!(!summary.current.has_data);
        assert!(!summary.previous.has_data);
    }

    #[test]
    fn test_service_summary_january_previous_is_december() {
        let (ledger, id) = ledger_with(&[
            (day(2024, 11, 30), dec!(5)),
            (day(2024, 12, 31), dec!(9)),
        ]);
        let service = ledger.service(id).unwrap();
        let summary = service_summary(&ledger, service, day(2025, 1, 10)).unwrap();

        assert_eq!(summary.previous.month, month(2024, 12));
        assert_eq!(summary.previous.consumption, dec!(4));
    }

    #[test]
    fn test_summarize_all_sorted() {
        let (mut ledger, _) = ledger_with(&[]);
        ledger
            .add_service(ServiceInput::new("Water", "m³", None).unwrap())
            .unwrap();
        ledger
            .add_service(ServiceInput::new("Gas", "m³", None).unwrap())
            .unwrap();

        let summaries = summarize_all(&ledger, day(2025, 2, 1)).unwrap();
        let names: Vec<&str> = summaries.iter().map(|s| s.service.name.as_str()).collect();
        assert_eq!(names, vec!["Electricity", "Gas", "Water"]);
        assert!(summaries.iter().all(|s| s.last_reading.is_none()));
    }
}
