//! Views that change the ledger.
//!
//! Each command validates its flags, applies the change to the in-memory
//! ledger and returns the confirmation line to print. Saving is left to the
//! caller.

use anyhow::{bail, Result};
use chrono::NaiveDate;
use meter_core::error::TrackerError;
use meter_core::settings::Settings;
use meter_core::validation::{
    parse_date, parse_time, parse_value, MeasurementInput, ReminderInput, ServiceInput,
};
use meter_data::store::Ledger;

pub fn add_service(ledger: &mut Ledger, settings: &Settings) -> Result<String> {
    let input = ServiceInput::new(
        require(&settings.service, "--service")?,
        require(&settings.unit, "--unit")?,
        settings.description.as_deref(),
    )?;
    let service = ledger.add_service(input)?;
    Ok(format!("Service '{}' added with id {}", service.name, service.id))
}

/// Rename a service or change its unit or description.
///
/// Fields without a flag keep their current value; an empty `--description`
/// clears it.
pub fn edit_service(ledger: &mut Ledger, settings: &Settings) -> Result<String> {
    let id = require_id(settings.id)?;
    let current = ledger
        .service(id)
        .cloned()
        .ok_or(TrackerError::UnknownService(id))?;

    let name = settings.name.as_deref().unwrap_or(&current.name);
    let unit = settings.unit.as_deref().unwrap_or(&current.unit);
    let description = match &settings.description {
        Some(d) => Some(d.as_str()),
        None => current.description.as_deref(),
    };

    let service = ledger.update_service(id, ServiceInput::new(name, unit, description)?)?;
    Ok(format!("Service {} updated: {} [{}]", id, service.name, service.unit))
}

/// Delete a service with its measurements.
pub fn delete_service(ledger: &mut Ledger, settings: &Settings) -> Result<String> {
    let id = require_id(settings.id)?;
    let before = ledger.measurement_count();
    let service = ledger.delete_service(id)?;
    Ok(format!(
        "Service '{}' deleted with {} measurement(s)",
        service.name,
        before - ledger.measurement_count()
    ))
}

pub fn record(ledger: &mut Ledger, settings: &Settings, today: NaiveDate) -> Result<String> {
    let service_id = ledger
        .find_service(require(&settings.service, "--service")?)?
        .id;
    let value = parse_value(require(&settings.value, "--value")?)?;
    let date = match &settings.date {
        Some(raw) => parse_date(raw)?,
        None => today,
    };
    let input = MeasurementInput::new(service_id, date, value, settings.note.as_deref())?;
    let measurement = ledger.add_measurement(input)?;
    Ok(format!(
        "Recorded {} on {} (measurement {})",
        measurement.value, measurement.date, measurement.id
    ))
}

pub fn delete_measurement(ledger: &mut Ledger, settings: &Settings) -> Result<String> {
    let id = require_id(settings.id)?;
    let measurement = ledger.delete_measurement(id)?;
    Ok(format!(
        "Measurement {} ({} on {}) deleted",
        measurement.id, measurement.value, measurement.date
    ))
}

/// Add a monthly reminder, linked to `--service` when one is given.
pub fn add_reminder(ledger: &mut Ledger, settings: &Settings) -> Result<String> {
    let day = match settings.day {
        Some(d) => d,
        None => bail!("this view needs --day"),
    };
    let time = settings.time.as_deref().map(parse_time).transpose()?;
    let service_ids = match &settings.service {
        Some(s) => vec![ledger.find_service(s)?.id],
        None => Vec::new(),
    };

    let input = ReminderInput::new(day, time, settings.note.as_deref(), service_ids)?;
    let reminder = ledger.add_reminder(input)?;
    Ok(format!(
        "Reminder {} added for day {} of each month",
        reminder.id, reminder.day_of_month
    ))
}

/// Unwrap an optional CLI value that the chosen view cannot do without.
pub fn require<'a>(value: &'a Option<String>, flag: &str) -> Result<&'a str> {
    match value.as_deref() {
        Some(v) => Ok(v),
        None => bail!("this view needs {}", flag),
    }
}

fn require_id(id: Option<u64>) -> Result<u64> {
    match id {
        Some(id) => Ok(id),
        None => bail!("this view needs --id"),
    }
}
