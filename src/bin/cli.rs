use bq_sync::config::{discover_config, load_config, resolve_output_dir};
use bq_sync::{
    ensure_clean, fetch_table_to_file, push_project, BqClient, ExportFormat, GcpSource, GitCli,
    PullOptions, PullReport, Puller, Result, TablePath,
};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "bq-sync")]
#[command(about = "Sync BigQuery resources to a local directory", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch BigQuery resources into local files
    Pull {
        /// Path to bq_sync.toml (default: search upward from the current directory)
        #[arg(long, env = "BQ_SYNC_CONFIG")]
        config: Option<PathBuf>,

        /// Sync a single dataset instead of all configured ones
        #[arg(long)]
        dataset: Option<String>,

        /// Show what would change without writing files
        #[arg(long)]
        dry_run: bool,

        /// Overwrite files regardless of git history
        #[arg(long)]
        force: bool,

        /// Force-fetch only this file (repeatable; path, file name or stem)
        #[arg(long = "force-file", value_name = "FILE")]
        force_file: Vec<String>,
    },

    /// Download a table's rows to CSV or Parquet
    Fetch {
        /// <project>/<dataset>/<table>, or a local model path such as
        /// <project>/<dataset>/models/<table>.yaml
        model: String,

        #[arg(short, long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,

        /// Directory to write into (default: current directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Deploy local resources to BigQuery (not yet implemented)
    Push,
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Resource")]
    kind: String,
    #[tabled(rename = "Fetched")]
    fetched: usize,
    #[tabled(rename = "Skipped")]
    skipped: usize,
    #[tabled(rename = "Warned")]
    warned: usize,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Pull {
            config,
            dataset,
            dry_run,
            force,
            force_file,
        } => {
            let options = PullOptions {
                dry_run,
                force,
                force_files: if force_file.is_empty() {
                    None
                } else {
                    Some(force_file)
                },
            };
            cmd_pull(config, dataset, options).await
        }
        Commands::Fetch {
            model,
            format,
            output_dir,
        } => cmd_fetch(&model, format, output_dir).await,
        Commands::Push => push_project(),
    }
}

async fn cmd_pull(
    config: Option<PathBuf>,
    dataset: Option<String>,
    options: PullOptions,
) -> Result<()> {
    let config_path = match config {
        Some(path) if path.is_absolute() => path,
        Some(path) => std::env::current_dir()?.join(path),
        None => discover_config(std::env::current_dir()?)?,
    };
    let mut config = load_config(&config_path)?;
    if let Some(dataset) = dataset {
        config = config.with_dataset(dataset);
    }

    println!(
        "{} project {} ({})",
        "Pulling".bold(),
        config.project.id.cyan(),
        config.datasets().join(", ")
    );

    // Must run before GcpSource::connect.
    ensure_clean(&GitCli::new(), &resolve_output_dir(&config, &config_path))?;

    let source =
        GcpSource::connect(&config.project.id, config.project.default_region.clone()).await?;
    let puller = Puller::from_config(source, GitCli::new(), &config, &config_path, options);
    let report = puller.run().await?;

    print_summary(&report);
    Ok(())
}

async fn cmd_fetch(model: &str, format: ExportFormat, output_dir: Option<PathBuf>) -> Result<()> {
    let table = TablePath::parse(model)?;
    let output_dir = output_dir.unwrap_or_else(|| PathBuf::from("."));

    let client = BqClient::new(&table.project).await?;
    let dest = fetch_table_to_file(&client, &table, format, &output_dir).await?;

    println!("{} {} -> {}", "Fetched".green(), table, dest.display());
    Ok(())
}

fn print_summary(report: &PullReport) {
    let rows: Vec<SummaryRow> = report
        .iter()
        .map(|(kind, counts)| SummaryRow {
            kind: kind.label().to_string(),
            fetched: counts.fetched,
            skipped: counts.skipped,
            warned: counts.warned,
        })
        .collect();

    if rows.is_empty() {
        println!("{}", "Nothing to sync".dimmed());
        return;
    }

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);

    let totals = report.totals();
    let heading = if report.dry_run {
        "Dry run complete".yellow().bold()
    } else {
        "Pull complete".green().bold()
    };
    println!(
        "{}: {} fetched, {} skipped, {} warned",
        heading, totals.fetched, totals.skipped, totals.warned
    );
    if report.has_warnings() {
        println!(
            "{}",
            "Some resources need attention; see the warnings above".yellow()
        );
    }
}
