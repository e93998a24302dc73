//! Initialize command.

use console::style;

use themeharvest::config::Settings;
use themeharvest::repository::migrations::run_migrations;

/// Initialize the data directory and database.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    settings.ensure_directories()?;
    run_migrations(&settings.database_url()).await?;

    println!(
        "{} Initialized themeharvest in {}",
        style("✓").green(),
        settings.data_dir.display()
    );
    println!("  Database: {}", settings.database_path().display());
    println!("  Queue:    {} @ {}", settings.queue_name, settings.broker_url);

    Ok(())
}
