use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use scholar_harvest::config::{find_config_file, load_config, save_config, HarvestConfig};
use scholar_harvest::models::{ProfileRecord, PROFILE_COLUMNS};
use scholar_harvest::sources::{HarvestOutcome, HarvestStatus, ScholarHarvester};
use scholar_harvest::ui::{self, HarvestSpinner, Status};
use scholar_harvest::utils::{read_delimited, write_delimited};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Scholar Harvest - collect Google Scholar author profiles by research label and organization
#[derive(Parser, Debug)]
#[command(name = "scholar-harvest")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Collect Google Scholar author profiles by research label and organization", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Interface language sent as `hl`
    #[arg(long, global = true)]
    language: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Where harvested rows are written
#[derive(Args, Debug)]
struct OutputArgs {
    /// Directory for the output file
    #[arg(long, short, default_value = ".")]
    out_dir: PathBuf,

    /// Output file name (default derived from the query)
    #[arg(long, short)]
    file: Option<String>,
}

/// Pagination overrides for multi-page harvests
#[derive(Args, Debug)]
struct PagingArgs {
    /// Delay between page requests in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Stop after this many pages
    #[arg(long)]
    max_pages: Option<usize>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Harvest every author profile for a label at an organization
    #[command(alias = "h")]
    Harvest {
        /// Research label, e.g. "physics"
        label: String,

        /// Organization, e.g. "Michigan University"
        organization: String,

        #[command(flatten)]
        output: OutputArgs,

        #[command(flatten)]
        paging: PagingArgs,
    },

    /// Harvest every author tagged with a research field, any organization
    #[command(alias = "f")]
    Field {
        /// Research field, e.g. "quantum computing"
        field: String,

        #[command(flatten)]
        output: OutputArgs,

        #[command(flatten)]
        paging: PagingArgs,
    },

    /// Search authors by name (first result page)
    #[command(alias = "n")]
    Name {
        /// Author name, matched as a quoted phrase
        name: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Look up a single profile by Scholar user id and print it as JSON
    #[command(alias = "p")]
    Profile {
        /// Scholar user id (the `user` parameter of a profile link)
        user_id: String,
    },

    /// Print the rows of a delimited file
    Read {
        /// File to read
        file: PathBuf,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,

    /// Write a configuration file with default values
    Init {
        /// Destination (default: ./scholar-harvest.toml)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// `["physics", "Michigan University"]` gives `physics_michigan_university.csv`.
fn default_file_name(parts: &[&str]) -> String {
    let slug = parts
        .join(" ")
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_");
    format!("{}.csv", slug)
}

fn apply_paging(config: &mut HarvestConfig, paging: &PagingArgs) {
    if let Some(delay_ms) = paging.delay_ms {
        config.page_delay_ms = delay_ms;
    }
    if paging.max_pages.is_some() {
        config.max_pages = paging.max_pages;
    }
}

/// Cancelled on Ctrl-C so a harvest stops with what it has.
fn interrupt_token() -> CancellationToken {
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing with partial results");
            on_signal.cancel();
        }
    });
    cancel
}

fn write_records(records: &[ProfileRecord], output: &OutputArgs, default_name: String) -> Result<PathBuf> {
    let rows: Vec<Vec<String>> = records.iter().map(|r| r.to_row()).collect();
    let file_name = output.file.clone().unwrap_or(default_name);
    write_delimited(&rows, &output.out_dir, &file_name, &PROFILE_COLUMNS[..])
        .with_context(|| format!("failed to write {}", output.out_dir.join(&file_name).display()))
}

fn print_records(records: &[ProfileRecord]) {
    for (i, record) in records.iter().enumerate() {
        ui::print_record(i + 1, record);
    }
}

/// Report a finished harvest; exits non-zero when it failed.
fn report_outcome(outcome: &HarvestOutcome, path: &Path, started: Instant, quiet: bool) {
    if !quiet {
        print_records(&outcome.records);
        ui::print_outcome(outcome, started.elapsed());
        ui::print_status(Status::Info, &format!("Saved to {}", path.display()));
    }

    if outcome.status == HarvestStatus::Failed {
        std::process::exit(1);
    }
}

fn spinner(quiet: bool, target: &str) -> HarvestSpinner {
    if quiet {
        HarvestSpinner::hidden()
    } else {
        HarvestSpinner::new(target)
    }
}

fn resolve_config(cli: &Cli) -> Result<HarvestConfig> {
    let path = match &cli.config {
        Some(path) => Some(path.clone()),
        None => find_config_file(),
    };
    if let Some(path) = &path {
        tracing::info!("Using config file: {}", path.display());
    }

    let mut config = load_config(path.as_deref())?;
    if let Some(language) = &cli.language {
        config.language = language.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| format!("scholar_harvest={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = resolve_config(&cli)?;

    match cli.command {
        Commands::Harvest {
            label,
            organization,
            output,
            paging,
        } => {
            apply_paging(&mut config, &paging);
            let cancel = interrupt_token();
            let progress = spinner(cli.quiet, &format!("{} at {}", label, organization));

            let started = Instant::now();
            let outcome = ScholarHarvester::new(config)
                .harvest_observed(&label, &organization, &cancel, &progress)
                .await?;

            let path = write_records(
                &outcome.records,
                &output,
                default_file_name(&[label.as_str(), organization.as_str()]),
            )?;
            report_outcome(&outcome, &path, started, cli.quiet);
        }

        Commands::Field {
            field,
            output,
            paging,
        } => {
            apply_paging(&mut config, &paging);
            let cancel = interrupt_token();
            let progress = spinner(cli.quiet, &field);

            let started = Instant::now();
            let outcome = ScholarHarvester::new(config)
                .harvest_field(&field, &cancel, &progress)
                .await?;

            let path = write_records(&outcome.records, &output, default_file_name(&[field.as_str()]))?;
            report_outcome(&outcome, &path, started, cli.quiet);
        }

        Commands::Name { name, output } => {
            let records = ScholarHarvester::new(config).search_by_name(&name).await?;
            let path = write_records(&records, &output, default_file_name(&[name.as_str()]))?;

            if !cli.quiet {
                print_records(&records);
                ui::print_status(
                    Status::Info,
                    &format!("{} profiles saved to {}", records.len(), path.display()),
                );
            }
        }

        Commands::Profile { user_id } => {
            let harvester = ScholarHarvester::new(config);
            let details = harvester.fetch_profile(&user_id).await?;

            if !cli.quiet {
                ui::print_profile(&details);
                ui::print_divider();
            }
            println!("{}", serde_json::to_string_pretty(&details)?);
        }

        Commands::Read { file } => {
            let rows = read_delimited(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            for row in &rows {
                println!("{}", row.join(" | "));
            }
            if !cli.quiet {
                ui::print_status(Status::Info, &format!("{} lines", rows.len()));
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let content = toml::to_string_pretty(&config)
                    .context("failed to render configuration")?;
                println!("{}", content);
            }
            ConfigAction::Init { path, force } => {
                let path = path.unwrap_or_else(|| {
                    PathBuf::from(scholar_harvest::config::CONFIG_FILE_NAME)
                });
                if path.exists() && !force {
                    anyhow::bail!(
                        "{} already exists, pass --force to overwrite",
                        path.display()
                    );
                }
                save_config(&HarvestConfig::default(), &path)?;
                ui::print_status(
                    Status::Success,
                    &format!("Wrote default configuration to {}", path.display()),
                );
            }
        },
    }

    Ok(())
}
