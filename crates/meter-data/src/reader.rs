//! JSON ledger file loading and saving.

use std::path::Path;

use meter_core::error::{Result, TrackerError};
use tracing::{debug, warn};

use crate::store::Ledger;

/// Load a ledger from `path`.
///
/// A missing file yields an empty ledger so a fresh data file can be started
/// without setup. Any other read failure, malformed JSON, or a measurement
/// value outside the accepted range is an error.
pub fn load_ledger(path: &Path) -> Result<Ledger> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Ledger file {} not found, starting empty", path.display());
            return Ok(Ledger::new());
        }
        Err(source) => {
            return Err(TrackerError::FileRead {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let mut ledger: Ledger = serde_json::from_str(&content)?;
    ledger.sync_next_ids();
    ledger.check_values()?;
    debug!(
        "Loaded ledger from {}: {} services, {} measurements",
        path.display(),
        ledger.services_sorted().len(),
        ledger.measurement_count()
    );
    Ok(ledger)
}

/// Atomically write `ledger` to `path`, creating parent directories if needed.
pub fn save_ledger(ledger: &Ledger, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(ledger)?;

    // Write to a temp file then rename for atomicity.
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json)?;
    std::fs::rename(&tmp, path)?;

    debug!("Saved ledger to {}", path.display());
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
