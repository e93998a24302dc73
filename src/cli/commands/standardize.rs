//! Standardize command.

use std::path::Path;

use anyhow::Context;
use console::style;

use themeharvest::config::Settings;
use themeharvest::services::{StandardizeRequest, ThemeStandardizer};

/// Standardize a theme from a JSON request file.
pub async fn cmd_standardize(settings: &Settings, file: &Path) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    let request: StandardizeRequest =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", file.display()))?;

    let standardizer = ThemeStandardizer::new(settings.create_pool());
    let outcome = standardizer.standardize(&request).await?;

    println!(
        "{} Standardized theme {} (dataset {}, table {})",
        style("✓").green(),
        style(&outcome.dataset_name).bold(),
        outcome.dataset_id,
        outcome.table_name
    );
    println!(
        "  Fields: {} total, {} new",
        outcome.fields_total, outcome.fields_created
    );
    for config in &outcome.published {
        println!(
            "  {} source {} -> config {} (version {})",
            style("▸").cyan(),
            config.data_source_id,
            config.config_id,
            config.version
        );
    }
    if outcome.published.is_empty() {
        println!("  {} No source configs published", style("!").yellow());
    }

    Ok(())
}
