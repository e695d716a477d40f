//! Storage and aggregation layer for the meter tracker.
//!
//! Holds the ledger of services and readings, its JSON file persistence, and
//! the per-month rollups built on top of the core consumption calculation.

pub mod aggregator;
pub mod reader;
pub mod store;

pub use meter_core as core;
