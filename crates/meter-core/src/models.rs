use chrono::{Datelike, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single cumulative meter value on a calendar day.
///
/// Readings are running totals: consumption is only recovered by subtracting
/// one reading from an earlier one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    /// Day the meter was read.
    pub date: NaiveDate,
    /// Cumulative meter value on that day.
    pub value: Decimal,
}

impl Reading {
    pub fn new(date: NaiveDate, value: Decimal) -> Self {
        Self { date, value }
    }

    /// Whether this reading falls inside the given calendar month.
    pub fn is_in_month(&self, year: i32, month: u32) -> bool {
        self.date.year() == year && self.date.month() == month
    }
}

/// A tracked utility (electricity, water, mobile data, ...).
///
/// A service owns one series of [`Measurement`]s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: u64,
    /// Unique display name, e.g. `"Electricity"`.
    pub name: String,
    /// Unit of the meter values, e.g. `"kWh"`.
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A persisted reading belonging to exactly one [`Service`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurement {
    pub id: u64,
    pub service_id: u64,
    pub date: NaiveDate,
    pub value: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Measurement {
    /// Strip storage metadata, leaving the dated value the calculations use.
    pub fn reading(&self) -> Reading {
        Reading::new(self.date, self.value)
    }
}

/// A recurring monthly reminder to read one or more meters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderTemplate {
    pub id: u64,
    /// Day of month the reminder fires on (1-31).
    pub day_of_month: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Services this reminder applies to.
    #[serde(default)]
    pub service_ids: Vec<u64>,
}

impl ReminderTemplate {
    /// A reminder is due when its day of month equals `date`'s day.
    ///
    /// Templates set to day 29-31 simply never fire in shorter months.
    pub fn is_due_on(&self, date: NaiveDate) -> bool {
        u32::from(self.day_of_month) == date.day()
    }
}
