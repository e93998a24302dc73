//! Workbench command.

use console::style;

use themeharvest::config::Settings;
use themeharvest::services::WorkbenchService;

/// Show the field workbench for a theme.
pub async fn cmd_workbench(settings: &Settings, theme: &str) -> anyhow::Result<()> {
    let repos = settings.repositories();
    let service = WorkbenchService::new(repos.datasets.clone(), repos.analysis.clone());
    let workbench = service.for_theme(theme).await?;

    println!(
        "\n{} {} ({} contributing sources)",
        style("Workbench:").bold(),
        style(&workbench.theme_name).bold(),
        workbench.contributing_sources
    );

    println!("\n{}", style("Existing fields").underlined());
    if workbench.existing_fields.is_empty() {
        println!("  (none)");
    }
    for field in &workbench.existing_fields {
        println!("  {:<25} {}", field.field_name, field.data_type.as_str());
    }

    println!("\n{}", style("Discovered fields").underlined());
    if workbench.discovered_fields.is_empty() {
        println!("  (none)");
    }
    for field in &workbench.discovered_fields {
        let recommended = workbench.recommendations.contains(&field.field_name);
        let marker = if recommended {
            style("★ recommended").green().to_string()
        } else {
            String::new()
        };
        println!(
            "  {:<25} seen in {} source(s) {}",
            field.field_name, field.presence_count, marker
        );
        for (selector, count) in &field.selector_frequency {
            println!("      {:<30} x{}", selector, count);
        }
    }

    Ok(())
}
