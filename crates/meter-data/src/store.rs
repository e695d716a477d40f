//! In-memory ledger of services, measurements and reminder templates.
//!
//! [`Ledger`] is the reading store the consumption calculations draw from:
//! [`ReadingStore::get_readings`] hands back the full reading set for one
//! service, eagerly, so the calculations never reach back into storage.

use chrono::NaiveDate;
use meter_core::error::{Result, TrackerError};
use meter_core::models::{Measurement, Reading, ReminderTemplate, Service};
use meter_core::validation::{check_value, MeasurementInput, ReminderInput, ServiceInput};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Source of complete reading series.
pub trait ReadingStore {
    /// All readings recorded for `series_id`, in no particular order.
    fn get_readings(&self, series_id: u64) -> Result<Vec<Reading>>;
}

/// Everything the tracker persists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(default)]
    services: Vec<Service>,
    #[serde(default)]
    measurements: Vec<Measurement>,
    #[serde(default)]
    reminders: Vec<ReminderTemplate>,
    #[serde(default)]
    next_ids: NextIds,
}

/// Id counters; ids are never reused, even after deletes.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct NextIds {
    service: u64,
    measurement: u64,
    reminder: u64,
}

impl Default for NextIds {
    fn default() -> Self {
        Self {
            service: 1,
            measurement: 1,
            reminder: 1,
        }
    }
}

impl ReadingStore for Ledger {
    fn get_readings(&self, series_id: u64) -> Result<Vec<Reading>> {
        self.require_service(series_id)?;
        Ok(self
            .measurements
            .iter()
            .filter(|m| m.service_id == series_id)
            .map(Measurement::reading)
            .collect())
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Services ──────────────────────────────────────────────────────────────

    /// Register a new service. Names must be unique.
    pub fn add_service(&mut self, input: ServiceInput) -> Result<&Service> {
        if self.services.iter().any(|s| s.name == input.name) {
            return Err(TrackerError::DuplicateService(input.name));
        }

        let id = allocate(&mut self.next_ids.service, "service")?;
        debug!(id, name = %input.name, "service added");

        self.services.push(Service {
            id,
            name: input.name,
            unit: input.unit,
            description: input.description,
        });
        Ok(&self.services[self.services.len() - 1])
    }

    /// Replace a service's name, unit and description.
    pub fn update_service(&mut self, id: u64, input: ServiceInput) -> Result<&Service> {
        if self
            .services
            .iter()
            .any(|s| s.id != id && s.name == input.name)
        {
            return Err(TrackerError::DuplicateService(input.name));
        }

        let service = self
            .services
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(TrackerError::UnknownService(id))?;
        service.name = input.name;
        service.unit = input.unit;
        service.description = input.description;
        debug!(id, "service updated");
        Ok(service)
    }

    /// Remove a service together with all of its measurements.
    ///
    /// Reminder templates stay but stop referencing the service.
    pub fn delete_service(&mut self, id: u64) -> Result<Service> {
        let pos = self
            .services
            .iter()
            .position(|s| s.id == id)
            .ok_or(TrackerError::UnknownService(id))?;
        let service = self.services.remove(pos);

        let before = self.measurements.len();
        self.measurements.retain(|m| m.service_id != id);
        for reminder in &mut self.reminders {
            reminder.service_ids.retain(|&sid| sid != id);
        }

        debug!(
            id,
            measurements_removed = before - self.measurements.len(),
            "service deleted"
        );
        Ok(service)
    }

    pub fn service(&self, id: u64) -> Option<&Service> {
        self.services.iter().find(|s| s.id == id)
    }

    /// Resolve a service by exact name, falling back to a numeric id.
    pub fn find_service(&self, name_or_id: &str) -> Result<&Service> {
        if let Some(s) = self.services.iter().find(|s| s.name == name_or_id) {
            return Ok(s);
        }
        match name_or_id.trim().parse::<u64>() {
            Ok(id) => self.service(id).ok_or(TrackerError::UnknownService(id)),
            Err(_) => Err(TrackerError::validation(
                "service",
                format!("no service named \"{}\"", name_or_id),
            )),
        }
    }

    /// All services ordered by name.
    pub fn services_sorted(&self) -> Vec<&Service> {
        let mut services: Vec<&Service> = self.services.iter().collect();
        services.sort_by(|a, b| a.name.cmp(&b.name));
        services
    }

    // ── Measurements ──────────────────────────────────────────────────────────

    /// Record a reading for an existing service.
    pub fn add_measurement(&mut self, input: MeasurementInput) -> Result<&Measurement> {
        self.require_service(input.service_id)?;

        let id = allocate(&mut self.next_ids.measurement, "measurement")?;
        debug!(
            id,
            service_id = input.service_id,
            date = %input.date,
            value = %input.value,
            "measurement added"
        );

        self.measurements.push(Measurement {
            id,
            service_id: input.service_id,
            date: input.date,
            value: input.value,
            note: input.note,
        });
        Ok(&self.measurements[self.measurements.len() - 1])
    }

    pub fn delete_measurement(&mut self, id: u64) -> Result<Measurement> {
        let pos = self
            .measurements
            .iter()
            .position(|m| m.id == id)
            .ok_or(TrackerError::UnknownMeasurement(id))?;
        debug!(id, "measurement deleted");
        Ok(self.measurements.remove(pos))
    }

    /// Measurements for one service, latest date first.
    pub fn measurements_for(&self, service_id: u64) -> Vec<&Measurement> {
        let mut ms: Vec<&Measurement> = self
            .measurements
            .iter()
            .filter(|m| m.service_id == service_id)
            .collect();
        ms.sort_by(|a, b| b.date.cmp(&a.date));
        ms
    }

    pub fn measurement_count(&self) -> usize {
        self.measurements.len()
    }

    // ── Reminders ─────────────────────────────────────────────────────────────

    /// Add a reminder template. Every linked service must exist.
    pub fn add_reminder(&mut self, input: ReminderInput) -> Result<&ReminderTemplate> {
        for &sid in &input.service_ids {
            self.require_service(sid)?;
        }

        let id = allocate(&mut self.next_ids.reminder, "reminder")?;
        debug!(id, day = input.day_of_month, "reminder added");

        self.reminders.push(ReminderTemplate {
            id,
            day_of_month: input.day_of_month,
            time: input.time,
            note: input.note,
            service_ids: input.service_ids,
        });
        Ok(&self.reminders[self.reminders.len() - 1])
    }

    /// Reminder templates that fire on `date`.
    pub fn reminders_due(&self, date: NaiveDate) -> Vec<&ReminderTemplate> {
        self.reminders.iter().filter(|r| r.is_due_on(date)).collect()
    }

    /// Reminder templates linked to a service.
    pub fn reminders_for(&self, service_id: u64) -> Vec<&ReminderTemplate> {
        self.reminders
            .iter()
            .filter(|r| r.service_ids.contains(&service_id))
            .collect()
    }

    /// Raise id counters above every id already present.
    ///
    /// Hand-edited ledger files may omit the counters entirely.
    pub(crate) fn sync_next_ids(&mut self) {
        let max_service = self.services.iter().map(|s| s.id).max().unwrap_or(0);
        let max_measurement = self.measurements.iter().map(|m| m.id).max().unwrap_or(0);
        let max_reminder = self.reminders.iter().map(|r| r.id).max().unwrap_or(0);

        self.next_ids.service = self.next_ids.service.max(max_service.saturating_add(1));
        self.next_ids.measurement = self
            .next_ids
            .measurement
            .max(max_measurement.saturating_add(1));
        self.next_ids.reminder = self.next_ids.reminder.max(max_reminder.saturating_add(1));
    }

    /// Apply the input range checks to measurements that did not come
    /// through [`MeasurementInput`], such as a hand-edited ledger file.
    pub(crate) fn check_values(&self) -> Result<()> {
        for m in &self.measurements {
            check_value(m.value).map_err(|e| {
                TrackerError::Config(format!("measurement {}: {}", m.id, e))
            })?;
        }
        Ok(())
    }

    // ── Private ───────────────────────────────────────────────────────────────

    fn require_service(&self, id: u64) -> Result<()> {
        if self.service(id).is_none() {
            return Err(TrackerError::UnknownService(id));
        }
        Ok(())
    }
}

/// Hand out the next id from `counter`.
///
/// `u64::MAX` is never issued, so a saturated counter reports exhaustion
/// instead of repeating an id.
fn allocate(counter: &mut u64, kind: &str) -> Result<u64> {
    if *counter == u64::MAX {
        return Err(TrackerError::Config(format!("{} ids exhausted", kind)));
    }
    let id = *counter;
    *counter += 1;
    Ok(id)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use meter_core::consumption::consumption_for_month;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn add_service(ledger: &mut Ledger, name: &str, unit: &str) -> u64 {
        ledger
            .add_service(ServiceInput::new(name, unit, None).unwrap())
            .unwrap()
            .id
    }

    fn add_reading(ledger: &mut Ledger, service_id: u64, date: NaiveDate, value: Decimal) -> u64 {
        ledger
            .add_measurement(MeasurementInput::new(service_id, date, value, None).unwrap())
            .unwrap()
            .id
    }

    #[test]
    fn test_add_service_assigns_ids() {
        let mut ledger = Ledger::new();
        let water = add_service(&mut ledger, "Water", "m³");
        let gas = add_service(&mut ledger, "Gas", "m³");
        assert_eq!(water, 1);
        assert_eq!(gas, 2);
        assert_eq!(ledger.service(water).unwrap().unit, "m³");
    }

    #[test]
    fn test_add_service_rejects_duplicate_name() {
        let mut ledger = Ledger::new();
        add_service(&mut ledger, "Water", "m³");
        let err = ledger
            .add_service(ServiceInput::new("Water", "L", None).unwrap())
            .unwrap_err();
        assert!(matches!(err, TrackerError::DuplicateService(name) if name == "Water"));
    }

    #[test]
    fn test_update_service() {
        let mut ledger = Ledger::new();
        let id = add_service(&mut ledger, "Power", "kWh");
        add_service(&mut ledger, "Water", "m³");

        let input = ServiceInput::new("Electricity", "kWh", Some("Main meter")).unwrap();
        let updated = ledger.update_service(id, input).unwrap();
        assert_eq!(updated.name, "Electricity");
        assert_eq!(updated.description.as_deref(), Some("Main meter"));

        // Renaming onto another service's name is refused.
        let err = ledger
            .update_service(id, ServiceInput::new("Water", "kWh", None).unwrap())
            .unwrap_err();
        assert!(matches!(err, TrackerError::DuplicateService(_)));

        // Keeping its own name is fine.
        assert!(ledger
            .update_service(id, ServiceInput::new("Electricity", "Wh", None).unwrap())
            .is_ok());
    }

    #[test]
    fn test_update_unknown_service() {
        let mut ledger = Ledger::new();
        let err = ledger
            .update_service(9, ServiceInput::new("X", "u", None).unwrap())
            .unwrap_err();
        assert!(matches!(err, TrackerError::UnknownService(9)));
    }

    #[test]
    fn test_add_measurement_requires_service() {
        let mut ledger = Ledger::new();
        let err = ledger
            .add_measurement(MeasurementInput::new(5, day(2025, 1, 1), dec!(1), None).unwrap())
            .unwrap_err();
        assert!(matches!(err, TrackerError::UnknownService(5)));
    }

    #[test]
    fn test_measurements_for_latest_first() {
        let mut ledger = Ledger::new();
        let id = add_service(&mut ledger, "Water", "m³");
        add_reading(&mut ledger, id, day(2025, 1, 1), dec!(100));
        add_reading(&mut ledger, id, day(2025, 2, 1), dec!(115));

        let ms = ledger.measurements_for(id);
        assert_eq!(ms.len(), 2);
        assert_eq!(ms[0].date, day(2025, 2, 1));
    }

    #[test]
    fn test_get_readings_feeds_consumption() {
        let mut ledger = Ledger::new();
        let heating = add_service(&mut ledger, "Heating", "Gcal");
        let other = add_service(&mut ledger, "Water", "m³");
        add_reading(&mut ledger, heating, day(2025, 1, 15), dec!(10.0));
        add_reading(&mut ledger, heating, day(2025, 2, 1), dec!(15.0));
        add_reading(&mut ledger, heating, day(2025, 2, 20), dec!(18.0));
        add_reading(&mut ledger, other, day(2025, 2, 10), dec!(500));

        let readings = ledger.get_readings(heating).unwrap();
        assert_eq!(readings.len(), 3);
        assert_eq!(consumption_for_month(&readings, 2025, 2), dec!(8.0));
    }

    #[test]
    fn test_get_readings_unknown_service() {
        let ledger = Ledger::new();
        assert!(matches!(
            ledger.get_readings(1),
            Err(TrackerError::UnknownService(1))
        ));
    }

    #[test]
    fn test_get_readings_empty_series() {
        let mut ledger = Ledger::new();
        let id = add_service(&mut ledger, "Water", "m³");
        assert!(ledger.get_readings(id).unwrap().is_empty());
    }

    #[test]
    fn test_delete_service_cascades() {
        let mut ledger = Ledger::new();
        let water = add_service(&mut ledger, "Water", "m³");
        let gas = add_service(&mut ledger, "Gas", "m³");
        add_reading(&mut ledger, water, day(2025, 1, 1), dec!(1));
        add_reading(&mut ledger, water, day(2025, 2, 1), dec!(2));
        add_reading(&mut ledger, gas, day(2025, 2, 1), dec!(3));
        ledger
            .add_reminder(ReminderInput::new(5, None, None, vec![water, gas]).unwrap())
            .unwrap();

        let removed = ledger.delete_service(water).unwrap();
        assert_eq!(removed.name, "Water");
        assert_eq!(ledger.measurement_count(), 1);
        assert!(ledger.service(water).is_none());
        assert!(ledger.reminders_for(water).is_empty());
        assert_eq!(ledger.reminders_for(gas).len(), 1);
    }

    #[test]
    fn test_delete_measurement() {
        let mut ledger = Ledger::new();
        let id = add_service(&mut ledger, "Water", "m³");
        let m = add_reading(&mut ledger, id, day(2025, 1, 1), dec!(1));

        let removed = ledger.delete_measurement(m).unwrap();
        assert_eq!(removed.service_id, id);
        assert!(matches!(
            ledger.delete_measurement(m),
            Err(TrackerError::UnknownMeasurement(_))
        ));
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let mut ledger = Ledger::new();
        let first = add_service(&mut ledger, "A", "u");
        ledger.delete_service(first).unwrap();
        let second = add_service(&mut ledger, "B", "u");
        assert_ne!(first, second);
    }

    #[test]
    fn test_find_service_by_name_or_id() {
        let mut ledger = Ledger::new();
        let id = add_service(&mut ledger, "Electricity", "kWh");

        assert_eq!(ledger.find_service("Electricity").unwrap().id, id);
        assert_eq!(ledger.find_service(&id.to_string()).unwrap().id, id);
        assert!(ledger.find_service("Gas").is_err());
        assert!(matches!(
            ledger.find_service("99"),
            Err(TrackerError::UnknownService(99))
        ));
    }

    #[test]
    fn test_services_sorted_by_name() {
        let mut ledger = Ledger::new();
        add_service(&mut ledger, "Water", "m³");
        add_service(&mut ledger, "Electricity", "kWh");
        add_service(&mut ledger, "Gas", "m³");

        let names: Vec<&str> = ledger
            .services_sorted()
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["Electricity", "Gas", "Water"]);
    }

    #[test]
    fn test_reminders_due() {
        let mut ledger = Ledger::new();
        let id = add_service(&mut ledger, "Heating", "Gcal");
        ledger
            .add_reminder(ReminderInput::new(15, None, Some("Check boiler"), vec![id]).unwrap())
            .unwrap();
        ledger
            .add_reminder(ReminderInput::new(1, None, None, vec![]).unwrap())
            .unwrap();

        let due = ledger.reminders_due(day(2025, 3, 15));
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].note.as_deref(), Some("Check boiler"));
        assert!(ledger.reminders_due(day(2025, 3, 14)).is_empty());
    }

    #[test]
    fn test_sync_next_ids_with_max_id() {
        let mut ledger: Ledger = serde_json::from_str(&format!(
            r#"{{"services": [{{"id": {}, "name": "Gas", "unit": "m³"}}]}}"#,
            u64::MAX
        ))
        .unwrap();
        ledger.sync_next_ids();

        let err = ledger
            .add_service(ServiceInput::new("Water", "m³", None).unwrap())
            .unwrap_err();
        assert!(matches!(err, TrackerError::Config(_)));
        // Other collections are unaffected.
        let gas = ledger.find_service("Gas").unwrap().id;
        assert!(ledger
            .add_measurement(MeasurementInput::new(gas, day(2025, 1, 1), dec!(1), None).unwrap())
            .is_ok());
    }

    #[test]
    fn test_check_values_flags_oversized_measurement() {
        let ledger: Ledger = serde_json::from_str(
            r#"{
                "services": [{"id": 1, "name": "Gas", "unit": "m³"}],
                "measurements": [
                    {"id": 7, "service_id": 1, "date": "2025-01-01", "value": "79228162514264337593543950335"}
                ]
            }"#,
        )
        .unwrap();
        let err = ledger.check_values().unwrap_err();
        assert!(err.to_string().contains("measurement 7"));
    }

    #[test]
    fn test_add_reminder_unknown_service() {
        let mut ledger = Ledger::new();
        let err = ledger
            .add_reminder(ReminderInput::new(1, None, None, vec![3]).unwrap())
            .unwrap_err();
        assert!(matches!(err, TrackerError::UnknownService(3)));
    }
}
