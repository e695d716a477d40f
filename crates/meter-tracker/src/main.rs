mod bootstrap;
mod commands;
mod views;

use anyhow::{Context, Result};
use commands::require;
use meter_core::settings::Settings;
use meter_core::time_utils::{today_in, Month};
use meter_data::aggregator::summarize_all;
use meter_data::reader::{load_ledger, save_ledger};
use meter_data::store::Ledger;

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref())?;

    tracing::info!("Meter Tracker v{} starting", env!("CARGO_PKG_VERSION"));

    let data_file = settings
        .data_file
        .clone()
        .unwrap_or_else(bootstrap::default_data_file);
    tracing::info!("View: {}, ledger: {}", settings.view, data_file.display());

    let mut ledger = load_ledger(&data_file)
        .with_context(|| format!("loading ledger {}", data_file.display()))?;
    let today = today_in(&settings.timezone);

    let changed = match settings.view.as_str() {
        "summary" => {
            let summaries = summarize_all(&ledger, today)?;
            print!("{}", views::render_summary(&summaries, &ledger, today));
            None
        }

        "reminders" => {
            print!("{}", views::render_reminders(&ledger, today));
            None
        }

        "monthly" => {
            let service = ledger.find_service(require(&settings.service, "--service")?)?;
            print!("{}", views::render_monthly(&ledger, service)?);
            None
        }

        "service" => {
            let service = ledger.find_service(require(&settings.service, "--service")?)?;
            let month = settings.month.unwrap_or_else(|| Month::of(today));
            print!("{}", views::render_service(&ledger, service, month)?);
            None
        }

        "add-service" => Some(commands::add_service(&mut ledger, &settings)?),
        "edit-service" => Some(commands::edit_service(&mut ledger, &settings)?),
        "delete-service" => Some(commands::delete_service(&mut ledger, &settings)?),
        "record" => Some(commands::record(&mut ledger, &settings, today)?),
        "delete-measurement" => Some(commands::delete_measurement(&mut ledger, &settings)?),
        "add-reminder" => Some(commands::add_reminder(&mut ledger, &settings)?),

        unknown => {
            eprintln!("Unknown view mode: {}", unknown);
            None
        }
    };

    if let Some(message) = changed {
        save(&ledger, &data_file)?;
        println!("{}", message);
    }

    Ok(())
}

fn save(ledger: &Ledger, path: &std::path::Path) -> Result<()> {
    save_ledger(ledger, path).with_context(|| format!("saving ledger {}", path.display()))
}
