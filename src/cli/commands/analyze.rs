//! Analyze command.

use console::style;

use themeharvest::config::Settings;
use themeharvest::models::AnalysisStatus;
use themeharvest::services::AnalysisTrigger;

/// Trigger field-discovery analysis for a source against a theme.
pub async fn cmd_analyze(
    settings: &Settings,
    source_id: i32,
    theme: &str,
    instructions: Option<&str>,
) -> anyhow::Result<()> {
    let repos = settings.repositories();

    let Some(source) = repos.sources.get(source_id).await? else {
        println!("{} Source {} not found", style("✗").red(), source_id);
        return Ok(());
    };

    let trigger = AnalysisTrigger::new(repos.analysis.clone(), settings.analyzer_url.clone());
    let attempt_id = trigger.trigger(source.id, theme, instructions).await?;

    // The attempt row carries the outcome; show where it landed.
    let statuses = repos.analysis.status_for_theme(theme).await?;
    let status = statuses
        .iter()
        .find(|r| r.id == attempt_id)
        .map(|r| r.status)
        .unwrap_or(AnalysisStatus::Processing);

    match status {
        AnalysisStatus::Failed => println!(
            "{} Analysis attempt {} for {} failed to reach the analyzer",
            style("✗").red(),
            attempt_id,
            source.name
        ),
        _ => println!(
            "{} Analysis attempt {} accepted for {} (theme '{}'); results land in the workbench",
            style("✓").green(),
            attempt_id,
            source.name,
            theme
        ),
    }

    Ok(())
}
