//! Dataset inspection commands.

use console::style;

use themeharvest::config::Settings;

/// List datasets with their field catalogs.
pub async fn cmd_dataset_list(settings: &Settings) -> anyhow::Result<()> {
    let repos = settings.repositories();
    let datasets = repos.datasets.get_all().await?;

    if datasets.is_empty() {
        println!(
            "{} No datasets yet. Standardize a theme with 'harvest standardize'.",
            style("!").yellow()
        );
        return Ok(());
    }

    for dataset in datasets {
        println!(
            "\n{} {} (table: {})",
            style("▸").cyan(),
            style(&dataset.name).bold(),
            dataset.table_name
        );
        if let Some(ref description) = dataset.description {
            println!("  {}", description);
        }

        let fields = repos.datasets.fields(dataset.id).await?;
        if fields.is_empty() {
            println!("  (no fields)");
            continue;
        }
        for field in fields {
            println!(
                "  {:<25} {:<10} column: {}",
                field.field_name,
                field.data_type.as_str(),
                field.column_name
            );
        }
    }

    Ok(())
}
