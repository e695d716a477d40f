//! Plain-text renderings of the tracker's views.

use std::fmt::Write as _;

use chrono::NaiveDate;
use meter_core::consumption::{
    consumption_for_month, consumption_from_previous, has_readings_in_month,
};
use meter_core::error::Result;
use meter_core::formatting::{format_decimal, format_quantity};
use meter_core::models::Service;
use meter_core::time_utils::Month;
use meter_data::aggregator::{calculate_totals, monthly_history, MonthFigure, ServiceSummary};
use meter_data::store::{Ledger, ReadingStore};

/// Services overview plus the reminders due today.
pub fn render_summary(
    summaries: &[ServiceSummary],
    ledger: &Ledger,
    today: NaiveDate,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Services ({})", today);

    if summaries.is_empty() {
        let _ = writeln!(out, "  no services yet");
    }
    for s in summaries {
        let last = match &s.last_reading {
            Some(r) => format!("{} on {}", format_quantity(r.value, &s.service.unit), r.date),
            None => "no readings".to_string(),
        };
        let _ = writeln!(out, "  {} [{}]", s.service.name, s.service.unit);
        let _ = writeln!(out, "    last reading: {}", last);
        let _ = writeln!(out, "    {}", figure_line(&s.current, &s.service.unit));
        let _ = writeln!(out, "    {}", figure_line(&s.previous, &s.service.unit));
    }

    out.push_str(&render_reminders(ledger, today));
    out
}

/// Reminders that fire on `today`.
pub fn render_reminders(ledger: &Ledger, today: NaiveDate) -> String {
    let mut out = String::new();
    let due = ledger.reminders_due(today);
    if due.is_empty() {
        let _ = writeln!(out, "No reminders for {}", today);
        return out;
    }

    let _ = writeln!(out, "Reminders for {}", today);
    for r in due {
        let names: Vec<&str> = r
            .service_ids
            .iter()
            .filter_map(|&id| ledger.service(id))
            .map(|s| s.name.as_str())
            .collect();
        let time = r
            .time
            .map(|t| t.format("%H:%M").to_string())
            .unwrap_or_else(|| "all day".to_string());
        let _ = writeln!(
            out,
            "  {} {} {}",
            time,
            r.note.as_deref().unwrap_or("read meters"),
            if names.is_empty() {
                String::new()
            } else {
                format!("({})", names.join(", "))
            }
        );
    }
    out
}

/// Month-by-month table for one service.
pub fn render_monthly(ledger: &Ledger, service: &Service) -> Result<String> {
    let readings = ledger.get_readings(service.id)?;
    let rows = monthly_history(&readings);

    let mut out = String::new();
    let _ = writeln!(out, "{} monthly consumption", service.name);
    let _ = writeln!(out, "{:<8} {:>8} {:>20}", "Month", "Readings", "Consumption");
    for row in &rows {
        let _ = writeln!(
            out,
            "{:<8} {:>8} {:>20}",
            row.month.to_string(),
            row.readings_count,
            format_quantity(row.consumption, &service.unit)
        );
    }
    let _ = writeln!(
        out,
        "{:<8} {:>8} {:>20}",
        "Total",
        readings.len(),
        format_quantity(calculate_totals(&rows), &service.unit)
    );
    Ok(out)
}

/// One service's consumption for `month` and its reading history.
pub fn render_service(ledger: &Ledger, service: &Service, month: Month) -> Result<String> {
    let readings = ledger.get_readings(service.id)?;

    let mut out = String::new();
    let _ = writeln!(out, "{} [{}]", service.name, service.unit);
    if let Some(desc) = &service.description {
        let _ = writeln!(out, "  {}", desc);
    }

    let figure = MonthFigure {
        month,
        consumption: consumption_for_month(&readings, month.year, month.month),
        has_data: has_readings_in_month(&readings, month.year, month.month),
    };
    let _ = writeln!(out, "  {}", figure_line(&figure, &service.unit));

    let _ = writeln!(out, "  {:<10} {:>16} {:>12}  Note", "Date", "Value", "Delta");
    for m in ledger.measurements_for(service.id) {
        let delta = consumption_from_previous(&readings, &m.reading())
            .map(|d| format_decimal(d, 3))
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "  {:<10} {:>16} {:>12}  {}",
            m.date.to_string(),
            format_decimal(m.value, 3),
            delta,
            m.note.as_deref().unwrap_or("")
        );
    }
    Ok(out)
}

fn figure_line(figure: &MonthFigure, unit: &str) -> String {
    if figure.has_data {
        format!("{}: {}", figure.month, format_quantity(figure.consumption, unit))
    } else {
        format!("{}: no data", figure.month)
    }
}
