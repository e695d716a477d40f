use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::time_utils::{get_system_timezone, validate_timezone, Month};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Track cumulative utility meter readings and monthly consumption
#[derive(Parser, Debug, Clone)]
#[command(
    name = "meter-tracker",
    about = "Track cumulative utility meter readings and monthly consumption",
    version
)]
pub struct Settings {
    /// Ledger file holding services, measurements and reminders
    #[arg(long, env = "METER_TRACKER_DATA")]
    pub data_file: Option<PathBuf>,

    /// View mode
    #[arg(
        long,
        default_value = "summary",
        value_parser = [
            "summary",
            "monthly",
            "service",
            "reminders",
            "add-service",
            "edit-service",
            "delete-service",
            "record",
            "delete-measurement",
            "add-reminder",
        ]
    )]
    pub view: String,

    /// Service name or numeric id (remembered between runs, except when
    /// adding a service or a reminder)
    #[arg(long)]
    pub service: Option<String>,

    /// Service id (edit-service, delete-service) or measurement id
    /// (delete-measurement)
    #[arg(long)]
    pub id: Option<u64>,

    /// New name for a service (edit-service view)
    #[arg(long)]
    pub name: Option<String>,

    /// Target month as YYYY-MM (defaults to the current month)
    #[arg(long)]
    pub month: Option<Month>,

    /// Service unit (add-service, edit-service views)
    #[arg(long)]
    pub unit: Option<String>,

    /// Service description (add-service, edit-service views)
    #[arg(long)]
    pub description: Option<String>,

    /// Reading date as YYYY-MM-DD (record view, defaults to today)
    #[arg(long)]
    pub date: Option<String>,

    /// Cumulative meter value (record view)
    #[arg(long)]
    pub value: Option<String>,

    /// Free-text note attached to a recorded reading or a reminder
    #[arg(long)]
    pub note: Option<String>,

    /// Day of month a reminder fires on, 1-31 (add-reminder view)
    #[arg(long)]
    pub day: Option<u32>,

    /// Reminder time as HH:MM (add-reminder view)
    #[arg(long)]
    pub time: Option<String>,

    /// Timezone used to decide what "today" is (auto-detected if not specified)
    #[arg(long, default_value = "auto", value_parser = parse_timezone_arg)]
    pub timezone: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.meter-tracker/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".meter-tracker").join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to an explicit path, creating parent
    /// directories if needed.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &std::path::Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, resolve `"auto"` values, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation – accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            return Self::resolve_auto_values(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI (or env for data_file) always wins over persisted values.
        if settings.data_file.is_none() {
            settings.data_file = last.data_file;
        }
        let remembered_service = last.service;
        if settings.service.is_none() && reuses_last_service(&settings.view) {
            settings.service = remembered_service.clone();
        }
        if !is_arg_explicitly_set(&matches, "timezone") {
            if let Some(v) = last.timezone {
                settings.timezone = v;
            }
        }

        settings = Self::resolve_auto_values(settings);

        let mut params = LastUsedParams::from(&settings);
        if params.service.is_none() {
            params.service = remembered_service;
        }
        let _ = params.save_to(config_path);

        settings
    }

    /// Resolve `"auto"` sentinel values and apply the `--debug` flag.
    fn resolve_auto_values(mut settings: Settings) -> Settings {
        if settings.timezone == "auto" {
            settings.timezone = get_system_timezone();
        } else if !validate_timezone(&settings.timezone) {
            // Only a stale last_used.json gets here; clap rejects bad CLI values.
            tracing::warn!(
                "ignoring unknown saved timezone \"{}\"",
                settings.timezone
            );
            settings.timezone = get_system_timezone();
        }

        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        settings
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            data_file: s.data_file.clone(),
            service: s.service.clone(),
            timezone: Some(s.timezone.clone()),
        }
    }
}

/// Views that create something named by `--service` must get it from the
/// command line, never from the previous run.
fn reuses_last_service(view: &str) -> bool {
    !matches!(view, "add-service" | "add-reminder")
}

/// Accept `"auto"` or a known IANA timezone name.
fn parse_timezone_arg(s: &str) -> Result<String, String> {
    if s == "auto" || validate_timezone(s) {
        Ok(s.to_string())
    } else {
        Err(format!("unknown timezone \"{}\"", s))
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
