//! Checks applied to user input before it reaches the ledger.
//!
//! The consumption calculations accept any dated decimal values; rejecting
//! blank names, oversized notes, out-of-range values or impossible reminder
//! days happens here.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;

use crate::error::{Result, TrackerError};

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_UNIT_LEN: usize = 20;
pub const MAX_DESCRIPTION_LEN: usize = 250;
pub const MAX_NOTE_LEN: usize = 255;

/// Digits allowed before the decimal point of a meter value.
pub const MAX_VALUE_INTEGER_DIGITS: u32 = 9;
/// Digits allowed after the decimal point of a meter value.
pub const MAX_VALUE_SCALE: u32 = 3;

/// Cleaned fields for creating or renaming a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInput {
    pub name: String,
    pub unit: String,
    pub description: Option<String>,
}

impl ServiceInput {
    /// Trim and validate raw service fields.
    ///
    /// A blank description is stored as `None`.
    pub fn new(name: &str, unit: &str, description: Option<&str>) -> Result<Self> {
        let name = required("name", name, MAX_NAME_LEN)?;
        let unit = required("unit", unit, MAX_UNIT_LEN)?;
        let description = optional("description", description, MAX_DESCRIPTION_LEN)?;
        Ok(Self {
            name,
            unit,
            description,
        })
    }
}

/// Cleaned fields for recording a measurement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementInput {
    pub service_id: u64,
    pub date: NaiveDate,
    pub value: Decimal,
    pub note: Option<String>,
}

impl MeasurementInput {
    pub fn new(
        service_id: u64,
        date: NaiveDate,
        value: Decimal,
        note: Option<&str>,
    ) -> Result<Self> {
        check_value(value)?;
        Ok(Self {
            service_id,
            date,
            value,
            note: optional("note", note, MAX_NOTE_LEN)?,
        })
    }
}

/// Cleaned fields for a reminder template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderInput {
    pub day_of_month: u8,
    pub time: Option<NaiveTime>,
    pub note: Option<String>,
    pub service_ids: Vec<u64>,
}

impl ReminderInput {
    pub fn new(
        day_of_month: u32,
        time: Option<NaiveTime>,
        note: Option<&str>,
        service_ids: Vec<u64>,
    ) -> Result<Self> {
        if !(1..=31).contains(&day_of_month) {
            return Err(TrackerError::validation(
                "day_of_month",
                format!("{} is not between 1 and 31", day_of_month),
            ));
        }
        Ok(Self {
            // Range checked above.
            day_of_month: day_of_month as u8,
            time,
            note: optional("note", note, MAX_NOTE_LEN)?,
            service_ids,
        })
    }
}

/// Parse a meter value such as `"1532.75"` into an exact decimal.
///
/// The result is range-checked with [`check_value`].
pub fn parse_value(raw: &str) -> Result<Decimal> {
    let value = raw
        .trim()
        .parse::<Decimal>()
        .map_err(|e| TrackerError::validation("value", e.to_string()))?;
    check_value(value)?;
    Ok(value)
}

/// Reject meter values with more than 9 integer digits or 3 decimal places.
///
/// Keeping values inside this range means the differences and sums taken by
/// the consumption calculations cannot overflow.
pub fn check_value(value: Decimal) -> Result<()> {
    let value = value.normalize();
    if value.scale() > MAX_VALUE_SCALE {
        return Err(TrackerError::validation(
            "value",
            format!("{} has more than {} decimal places", value, MAX_VALUE_SCALE),
        ));
    }
    let limit = Decimal::from(10_i64.pow(MAX_VALUE_INTEGER_DIGITS));
    if value.abs() >= limit {
        return Err(TrackerError::validation(
            "value",
            format!(
                "{} has more than {} integer digits",
                value, MAX_VALUE_INTEGER_DIGITS
            ),
        ));
    }
    Ok(())
}

/// Parse a reminder time such as `"09:30"`.
pub fn parse_time(raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|e| TrackerError::validation("time", e.to_string()))
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| TrackerError::validation("date", e.to_string()))
}

fn required(field: &'static str, raw: &str, max_len: usize) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TrackerError::validation(field, "must not be empty"));
    }
    check_len(field, trimmed, max_len)?;
    Ok(trimmed.to_string())
}

fn optional(field: &'static str, raw: Option<&str>, max_len: usize) -> Result<Option<String>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => {
            check_len(field, s, max_len)?;
            Ok(Some(s.to_string()))
        }
    }
}

fn check_len(field: &'static str, s: &str, max_len: usize) -> Result<()> {
    let len = s.chars().count();
    if len > max_len {
        return Err(TrackerError::validation(
            field,
            format!("{} characters exceeds the limit of {}", len, max_len),
        ));
    }
    Ok(())
}
