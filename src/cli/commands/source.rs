//! Source management commands.

use console::style;

use themeharvest::config::Settings;
use themeharvest::models::NewDataSource;

use super::helpers::truncate;

/// Add a data source.
pub async fn cmd_source_add(
    settings: &Settings,
    name: &str,
    url: &str,
    description: Option<&str>,
) -> anyhow::Result<()> {
    if let Err(e) = url::Url::parse(url) {
        println!("{} Invalid URL '{}': {}", style("✗").red(), url, e);
        return Ok(());
    }

    let repos = settings.repositories();

    let mut source = NewDataSource::new(name, url);
    source.description = description.map(String::from);
    let created = repos.sources.create(&source).await?;

    println!(
        "{} Added source {} ({})",
        style("✓").green(),
        style(&created.name).bold(),
        created.id
    );
    Ok(())
}

/// List configured sources.
pub async fn cmd_source_list(settings: &Settings) -> anyhow::Result<()> {
    let repos = settings.repositories();
    let sources = repos.sources.get_all().await?;

    if sources.is_empty() {
        println!(
            "{} No sources configured. Add one with 'harvest source add'.",
            style("!").yellow()
        );
        return Ok(());
    }

    println!("\n{}", style("Data Sources").bold());
    println!("{}", "-".repeat(70));
    println!("{:<6} {:<25} {:<30} Added", "ID", "Name", "URL");
    println!("{}", "-".repeat(70));

    for source in sources {
        println!(
            "{:<6} {:<25} {:<30} {}",
            source.id,
            truncate(&source.name, 24),
            truncate(&source.url, 29),
            source.created_at.format("%Y-%m-%d")
        );
    }

    Ok(())
}

/// Remove a source. Historical configs referencing it stay in place.
pub async fn cmd_source_remove(settings: &Settings, id: i32) -> anyhow::Result<()> {
    let repos = settings.repositories();

    match repos.sources.get(id).await? {
        Some(source) => {
            repos.sources.delete(id).await?;
            println!(
                "{} Removed source {} ({}). Historical configs are kept.",
                style("✓").green(),
                style(&source.name).bold(),
                id
            );
        }
        None => {
            println!("{} Source {} not found", style("✗").red(), id);
        }
    }
    Ok(())
}
