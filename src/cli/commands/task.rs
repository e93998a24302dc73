//! Crawl task commands.

use console::style;

use themeharvest::config::Settings;
use themeharvest::queue::AmqpQueue;
use themeharvest::services::TaskDispatcher;

use super::helpers::{join_ids, truncate};

/// Create a crawl task in `pending` state.
pub async fn cmd_task_create(
    settings: &Settings,
    name: &str,
    dataset_name: &str,
    sources: &[i32],
    cron: Option<&str>,
) -> anyhow::Result<()> {
    let repos = settings.repositories();

    let Some(dataset) = repos.datasets.get_by_name(dataset_name).await? else {
        println!(
            "{} Dataset '{}' not found. Standardize the theme first.",
            style("✗").red(),
            dataset_name
        );
        return Ok(());
    };

    let task = repos
        .tasks
        .create(name, dataset.id, sources, cron)
        .await?;

    println!(
        "{} Created task {} ({}) for dataset {} over sources [{}]",
        style("✓").green(),
        style(&task.name).bold(),
        task.id,
        dataset.name,
        join_ids(&task.data_source_ids)
    );
    if let Some(cron) = &task.schedule_cron {
        println!("  Schedule: {}", cron);
    }
    Ok(())
}

/// List crawl tasks.
pub async fn cmd_task_list(settings: &Settings) -> anyhow::Result<()> {
    let repos = settings.repositories();
    let tasks = repos.tasks.get_all().await?;

    if tasks.is_empty() {
        println!("{} No tasks yet.", style("!").yellow());
        return Ok(());
    }

    println!("\n{}", style("Crawl Tasks").bold());
    println!("{}", "-".repeat(78));
    println!(
        "{:<6} {:<22} {:<12} {:<18} {:<10} Schedule",
        "ID", "Name", "Status", "Sources", "Dataset"
    );
    println!("{}", "-".repeat(78));

    for task in tasks {
        println!(
            "{:<6} {:<22} {:<12} {:<18} {:<10} {}",
            task.id,
            truncate(&task.name, 21),
            task.status.as_str(),
            truncate(&join_ids(&task.data_source_ids), 17),
            task.standard_dataset_id,
            task.schedule_cron.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}

/// Dispatch a task: one durable work item per source with an active config.
pub async fn cmd_task_dispatch(settings: &Settings, task_id: i32) -> anyhow::Result<()> {
    let repos = settings.repositories();

    let Some(task) = repos.tasks.get(task_id).await? else {
        println!("{} Task {} not found", style("✗").red(), task_id);
        return Ok(());
    };

    let queue = AmqpQueue::connect(&settings.broker_url, &settings.queue_name).await?;
    let publisher = queue.publisher();

    let dispatcher = TaskDispatcher::new(repos.configs.clone(), repos.tasks.clone());
    let report = dispatcher.dispatch(&task, &publisher).await?;

    println!(
        "{} Dispatched task {}: {} enqueued, {} skipped",
        style("✓").green(),
        task_id,
        report.enqueued.len(),
        report.skipped.len()
    );
    for (source_id, config_id) in &report.enqueued {
        println!(
            "  {} source {} -> config {}",
            style("▸").cyan(),
            source_id,
            config_id
        );
    }
    for source_id in &report.skipped {
        println!(
            "  {} source {} has no active config",
            style("!").yellow(),
            source_id
        );
    }

    Ok(())
}
