//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific
//! modules.

mod analyze;
mod dataset;
mod helpers;
mod init;
mod source;
mod standardize;
mod task;
mod worker;
mod workbench;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use themeharvest::config::Settings;

#[derive(Parser)]
#[command(name = "harvest")]
#[command(about = "Theme-driven multi-source data collection pipeline")]
#[command(version)]
pub struct Cli {
    /// Data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Manage data sources
    Source {
        #[command(subcommand)]
        command: SourceCommands,
    },

    /// Inspect standardized datasets
    Dataset {
        #[command(subcommand)]
        command: DatasetCommands,
    },

    /// Standardize a theme from a JSON request file
    Standardize {
        /// Path to the standardize request (JSON)
        file: PathBuf,
    },

    /// Manage crawl tasks
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Run an extraction worker against the work queue
    Worker {
        /// Consumer tag shown to the broker (default: generated)
        #[arg(long)]
        tag: Option<String>,
    },

    /// Show the field workbench for a theme
    Workbench {
        /// Theme name
        theme: String,
    },

    /// Trigger field-discovery analysis for a source
    Analyze {
        /// Source ID to analyze
        source_id: i32,
        /// Theme name the analysis belongs to
        theme: String,
        /// Extra instructions for the analyzer
        #[arg(long)]
        instructions: Option<String>,
    },
}

#[derive(Subcommand)]
enum SourceCommands {
    /// Add a data source
    Add {
        /// Human-readable source name
        name: String,
        /// Root URL
        url: String,
        /// Free-form notes
        #[arg(long)]
        description: Option<String>,
    },
    /// List data sources
    List,
    /// Remove a data source (historical configs are kept)
    Remove {
        /// Source ID
        id: i32,
    },
}

#[derive(Subcommand)]
enum DatasetCommands {
    /// List datasets and their field catalogs
    List,
}

#[derive(Subcommand)]
enum TaskCommands {
    /// Create a crawl task
    Create {
        /// Task name
        name: String,
        /// Dataset (theme) name the task collects into
        #[arg(long)]
        dataset: String,
        /// Source ID to fan out to (repeatable)
        #[arg(long = "source", required = true)]
        sources: Vec<i32>,
        /// Optional CRON schedule (stored, not executed here)
        #[arg(long)]
        cron: Option<String>,
    },
    /// List crawl tasks
    List,
    /// Dispatch a task onto the work queue
    Dispatch {
        /// Task ID
        task_id: i32,
    },
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::from_env();
    if let Some(data_dir) = cli.data_dir {
        settings.data_dir = data_dir;
    }

    match cli.command {
        Commands::Init => init::cmd_init(&settings).await,
        Commands::Source { command } => match command {
            SourceCommands::Add {
                name,
                url,
                description,
            } => source::cmd_source_add(&settings, &name, &url, description.as_deref()).await,
            SourceCommands::List => source::cmd_source_list(&settings).await,
            SourceCommands::Remove { id } => source::cmd_source_remove(&settings, id).await,
        },
        Commands::Dataset { command } => match command {
            DatasetCommands::List => dataset::cmd_dataset_list(&settings).await,
        },
        Commands::Standardize { file } => standardize::cmd_standardize(&settings, &file).await,
        Commands::Task { command } => match command {
            TaskCommands::Create {
                name,
                dataset,
                sources,
                cron,
            } => task::cmd_task_create(&settings, &name, &dataset, &sources, cron.as_deref()).await,
            TaskCommands::List => task::cmd_task_list(&settings).await,
            TaskCommands::Dispatch { task_id } => task::cmd_task_dispatch(&settings, task_id).await,
        },
        Commands::Worker { tag } => worker::cmd_worker(&settings, tag.as_deref()).await,
        Commands::Workbench { theme } => workbench::cmd_workbench(&settings, &theme).await,
        Commands::Analyze {
            source_id,
            theme,
            instructions,
        } => analyze::cmd_analyze(&settings, source_id, &theme, instructions.as_deref()).await,
    }
}
