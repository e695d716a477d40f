//! Core domain types and calculations for the meter tracker.
//!
//! Holds the reading model, the monthly consumption calculation, input
//! validation, formatting helpers and CLI settings. Nothing in this crate
//! performs storage I/O apart from the persisted last-used settings.

pub mod consumption;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;
pub mod validation;
