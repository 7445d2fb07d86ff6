//! zarrcheck - Checks whether a folder is a Zarr hierarchy holding valid GEFF data.
//!
//! Usage:
//!   zarrcheck check [PATH]   Validate a folder
//!   zarrcheck tree [PATH]    Print the folder's file tree
//!   zarrcheck --help         Show help

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use zarrcheck_core::{
    DEFAULT_SCHEMA_SOURCE, FileRecord, FolderSummary, PathTree, ScanConfig, ValidateConfig,
    summarize,
};
use zarrcheck_scan::{collect_files, fs_entry, traverse};
use zarrcheck_validate::{OverallResult, ValidationOrchestrator};

#[derive(Parser)]
#[command(
    name = "zarrcheck",
    version,
    about = "Checks Zarr folders for valid GEFF metadata",
    long_about = "zarrcheck lists a folder, classifies its Zarr layout and validates every \
                  GEFF metadata block it finds against a JSON Schema."
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a folder
    Check {
        /// Folder to check
        #[arg(default_value = ".")]
        path: PathBuf,

        /// JSON Schema file or http(s) URL
        #[arg(short, long, default_value = DEFAULT_SCHEMA_SOURCE)]
        schema: String,

        /// How the folder is listed
        #[arg(short, long, default_value = "drop")]
        mode: IngestMode,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Also print the file tree
        #[arg(short, long)]
        tree: bool,

        #[command(flatten)]
        listing: ListingArgs,
    },

    /// Print the file tree of a folder
    Tree {
        /// Folder to list
        #[arg(default_value = ".")]
        path: PathBuf,

        #[command(flatten)]
        listing: ListingArgs,
    },
}

#[derive(Args)]
struct ListingArgs {
    /// Leave out dotfiles, as some drag-and-drop hosts do
    #[arg(long)]
    skip_hidden: bool,

    /// Glob patterns for entry names to skip
    #[arg(short, long)]
    ignore: Vec<String>,

    /// Maximum depth to descend
    #[arg(long)]
    max_depth: Option<u32>,

    /// Follow symbolic links
    #[arg(long)]
    follow_symlinks: bool,
}

impl ListingArgs {
    fn scan_config(&self, path: &Path) -> Result<ScanConfig> {
        ScanConfig::builder()
            .root(path)
            .include_hidden(!self.skip_hidden)
            .ignore_patterns(self.ignore.clone())
            .max_depth(self.max_depth)
            .follow_symlinks(self.follow_symlinks)
            .build()
            .context("Invalid listing options")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
enum IngestMode {
    /// Walk the folder as a dropped entry graph, batch by batch
    #[default]
    Drop,
    /// List the folder in one pass, as a folder picker does
    Browse,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Serialize)]
struct Report<'a> {
    folder: &'a FolderSummary,
    result: &'a OverallResult,
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;

    match cli.command {
        Command::Check {
            path,
            schema,
            mode,
            format,
            tree,
            listing,
        } => {
            let scan_config = listing.scan_config(&path)?;
            let validate_config = ValidateConfig::builder()
                .schema(schema)
                .omits_hidden_files(listing.skip_hidden)
                .build()
                .context("Invalid validation options")?;
            runtime.block_on(run_check(&scan_config, &validate_config, mode, format, tree))
        }
        Command::Tree { path, listing } => {
            let scan_config = listing.scan_config(&path)?;
            let files = runtime.block_on(list_files(&scan_config, IngestMode::Browse))?;
            print!("{}", PathTree::from_records(&files).render());
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Install the stderr subscriber: `ZARRCHECK_LOG`, then `RUST_LOG`, then flags.
fn init_tracing(verbose: u8, quiet: bool) {
    let default = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env("ZARRCHECK_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Turn the folder into a flat file listing.
async fn list_files(config: &ScanConfig, mode: IngestMode) -> Result<Vec<FileRecord>> {
    match mode {
        IngestMode::Drop => {
            let root = fs_entry(&config.root, config)
                .await
                .context("Cannot open folder")?;
            Ok(traverse(root, String::new()).await)
        }
        IngestMode::Browse => {
            let outcome = collect_files(config).context("Cannot list folder")?;
            if !outcome.warnings.is_empty() {
                eprintln!("{} entries could not be read", outcome.warnings.len());
            }
            Ok(outcome.files)
        }
    }
}

async fn run_check(
    scan_config: &ScanConfig,
    validate_config: &ValidateConfig,
    mode: IngestMode,
    format: OutputFormat,
    show_tree: bool,
) -> Result<ExitCode> {
    eprintln!("Reading {}...", scan_config.root.display());

    let files = list_files(scan_config, mode).await?;
    let folder = summarize(&files);

    let orchestrator = ValidationOrchestrator::from_config(validate_config);
    let result = orchestrator.orchestrate(&files).await;

    match format {
        OutputFormat::Text => {
            print_report(&folder, &result);
            if show_tree {
                println!(" File tree:");
                for line in PathTree::from_records(&files).render().lines() {
                    println!("   {line}");
                }
                println!();
            }
        }
        OutputFormat::Json => {
            let report = Report {
                folder: &folder,
                result: &result,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(if result.status.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_report(folder: &FolderSummary, result: &OverallResult) {
    println!();
    println!("{}", "─".repeat(70));
    println!(" {} - {} files, {}", folder.name, folder.file_count, folder.total_size);
    println!("{}", "─".repeat(70));
    println!();
    println!(" Status:  {}", result.status);
    println!(" Message: {}", result.message);
    println!(" Version: {}", result.version);
    println!(
        " Zarr:    {} arrays, {} groups",
        result.array_count, result.group_count
    );
    println!();

    let Some(geff) = &result.geff_validation else {
        return;
    };
    if geff.geff_folders.is_empty() {
        return;
    }

    println!(
        " GEFF folders ({} of {} valid):",
        geff.valid_folders, geff.total_folders
    );
    for folder in &geff.geff_folders {
        let details = &folder.validation.details;
        let marker = if folder.is_valid() { "✓" } else { "✗" };
        let directed = match &details.directed {
            Some(Value::Bool(true)) => "directed".to_string(),
            Some(Value::Bool(false)) => "undirected".to_string(),
            Some(other) => format!("directed: {other}"),
            None => "directedness unknown".to_string(),
        };
        println!(
            "   {} {} (version {}, {}, {} axes)",
            marker,
            display_folder(folder.folder_path()),
            details.version,
            directed,
            details.axes_count
        );

        for axis in &details.axes {
            println!(
                "       {:<8} {:<8} {} .. {} {}",
                axis.name,
                axis.kind.as_deref().unwrap_or("-"),
                format_bound(axis.min),
                format_bound(axis.max),
                axis.unit.as_deref().unwrap_or("")
            );
        }
        for error in &folder.validation.errors {
            println!("       {error}");
        }
    }
    println!();
}

fn display_folder(path: &str) -> &str {
    if path.is_empty() { "/" } else { path }
}

fn format_bound(bound: Option<f64>) -> String {
    bound.map_or_else(|| "?".to_string(), |b| b.to_string())
}
