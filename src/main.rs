//! duopane - headless driver for the duopane file operation engine.
//!
//! Usage:
//!   duopane copy SOURCES... --to DIR      Copy items into a directory
//!   duopane move SOURCES... --to DIR      Move items into a directory
//!   duopane trash ITEMS...                Move items to the trash
//!   duopane rm ITEMS...                   Delete items permanently
//!   duopane rename ITEM NAME              Rename an item in place
//!   duopane duplicate ITEMS...            Duplicate items next to themselves
//!   duopane mkdir DIR [NAME]              Create a folder
//!   duopane touch DIR [NAME]              Create an empty file
//!   duopane --help                        Show help

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{eyre, Context, Result};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use duopane_core::{EngineConfig, OperationError, OperationOutcome, OperationRequest, OperationType};
use duopane_ops::{
    present_error, ConflictResolution, ErrorPresentation, EventBroadcaster, FixedPolicy,
    OperationEvent, OperationQueue,
};

#[derive(Parser)]
#[command(
    name = "duopane",
    version,
    about = "Copy, move, trash, rename and create files the way a two-pane file manager does",
    long_about = "duopane runs file operations through the same queued engine a two-pane \
                  file manager uses: batches run one at a time, name collisions are \
                  settled by a conflict policy, and failures are reported per item."
)]
struct Cli {
    /// What to do when a destination name is already taken
    #[arg(long, global = true, value_enum, default_value_t = OnConflict::Skip)]
    on_conflict: OnConflict,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Engine configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Batches with more items than this show progress
    #[arg(long, global = true)]
    progress_threshold: Option<usize>,

    /// Copy the targets of symbolic links instead of the links themselves
    #[arg(long, global = true)]
    follow_symlinks: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Copy items into a directory
    Copy {
        /// Items to copy
        #[arg(required = true)]
        sources: Vec<PathBuf>,

        /// Destination directory
        #[arg(short = 't', long = "to")]
        destination: PathBuf,
    },

    /// Move items into a directory
    Move {
        /// Items to move
        #[arg(required = true)]
        sources: Vec<PathBuf>,

        /// Destination directory
        #[arg(short = 't', long = "to")]
        destination: PathBuf,
    },

    /// Move items to the trash
    Trash {
        /// Items to trash
        #[arg(required = true)]
        items: Vec<PathBuf>,
    },

    /// Delete items permanently
    Rm {
        /// Items to delete
        #[arg(required = true)]
        items: Vec<PathBuf>,
    },

    /// Rename an item within its directory
    Rename {
        /// Item to rename
        item: PathBuf,

        /// New name (a single path component)
        new_name: String,
    },

    /// Duplicate items next to themselves
    Duplicate {
        /// Items to duplicate
        #[arg(required = true)]
        items: Vec<PathBuf>,
    },

    /// Create a folder, numbering the name if it is taken
    Mkdir {
        /// Directory to create the folder in
        directory: PathBuf,

        /// Folder name
        #[arg(default_value = "New Folder")]
        name: String,
    },

    /// Create an empty file, numbering the name if it is taken
    Touch {
        /// Directory to create the file in
        directory: PathBuf,

        /// File name
        #[arg(default_value = "Untitled")]
        name: String,
    },
}

impl Command {
    fn into_request(self) -> OperationRequest {
        match self {
            Self::Copy {
                sources,
                destination,
            } => OperationRequest::copy(sources, destination),
            Self::Move {
                sources,
                destination,
            } => OperationRequest::move_to(sources, destination),
            Self::Trash { items } => OperationRequest::delete(items),
            Self::Rm { items } => OperationRequest::delete_immediately(items),
            Self::Rename { item, new_name } => OperationRequest::rename(item, new_name),
            Self::Duplicate { items } => OperationRequest::duplicate(items),
            Self::Mkdir { directory, name } => OperationRequest::create_folder(directory, name),
            Self::Touch { directory, name } => OperationRequest::create_file(directory, name),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OnConflict {
    Skip,
    Replace,
    KeepBoth,
}

impl From<OnConflict> for ConflictResolution {
    fn from(choice: OnConflict) -> Self {
        match choice {
            OnConflict::Skip => Self::Skip,
            OnConflict::Replace => Self::Replace,
            OnConflict::KeepBoth => Self::KeepBoth,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Machine-readable result of one invocation.
#[derive(Serialize)]
struct RunSummary {
    operation: OperationType,
    succeeded: Vec<PathBuf>,
    skipped: Vec<PathBuf>,
    cancelled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorPresentation>,
}

impl RunSummary {
    fn new(operation: OperationType, result: &Result<OperationOutcome, OperationError>) -> Self {
        let mut report = Self {
            operation,
            succeeded: Vec::new(),
            skipped: Vec::new(),
            cancelled: false,
            error: None,
        };
        match result {
            Ok(outcome) => {
                report.succeeded = outcome.succeeded.clone();
                report.skipped = outcome.skipped.clone();
            }
            Err(err) => {
                if let OperationError::PartialFailure { succeeded, .. } = err {
                    report.succeeded = succeeded.clone();
                }
                report.cancelled = err.is_cancelled();
                report.error = present_error(err);
            }
        }
        report
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let config = load_config(&cli)?;
    let request = cli.command.into_request();
    let operation = request.operation_type();

    let broadcaster = EventBroadcaster::from_config(&config);
    let reporter = matches!(cli.format, OutputFormat::Text)
        .then(|| tokio::spawn(report_progress(broadcaster.subscribe())));

    let queue = OperationQueue::new(
        config,
        Arc::new(FixedPolicy::new(cli.on_conflict.into())),
        Arc::new(broadcaster),
    );

    let cancel = queue.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, cancelling after the current item");
            cancel.cancel();
        }
    });

    let pending = queue.submit(request);
    queue.shutdown().await;
    let result = pending.await;

    if let Some(reporter) = reporter {
        reporter.await.context("Progress reporter failed")?;
    }

    let report = RunSummary::new(operation, &result);
    match cli.format {
        OutputFormat::Text => print_text(operation, &result, &report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(OperationError::Cancelled) => ExitCode::from(130),
        Err(_) => ExitCode::FAILURE,
    })
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| eyre!("Failed to install the log subscriber: {e}"))?;
    Ok(())
}

fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => EngineConfig::default(),
    };

    if let Some(threshold) = cli.progress_threshold {
        config.progress_threshold = threshold;
    }
    if cli.follow_symlinks {
        config.copy_symlinks_as_links = false;
    }

    // Re-run validation over the merged settings.
    EngineConfig::builder()
        .progress_threshold(config.progress_threshold)
        .channel_size(config.channel_size)
        .copy_symlinks_as_links(config.copy_symlinks_as_links)
        .build()
        .context("Invalid engine configuration")
}

/// Print progress lines to stderr for batches large enough to show them.
async fn report_progress(mut events: tokio::sync::broadcast::Receiver<OperationEvent>) {
    let mut visible = false;
    let mut last_item: Option<PathBuf> = None;
    loop {
        match events.recv().await {
            Ok(OperationEvent::Started {
                present_progress, ..
            }) => visible = present_progress,
            Ok(OperationEvent::Progress(snapshot)) => {
                if !visible || snapshot.current_item == last_item {
                    continue;
                }
                if let Some(item) = &snapshot.current_item {
                    eprintln!(
                        "[{}/{}] {:>3.0}% {}",
                        snapshot.completed_count + 1,
                        snapshot.total_count,
                        snapshot.percentage(),
                        item.display()
                    );
                }
                last_item = snapshot.current_item;
            }
            Ok(OperationEvent::Finished { .. }) => visible = false,
            Err(RecvError::Lagged(missed)) => debug!(missed, "Progress reporter fell behind"),
            Err(RecvError::Closed) => break,
        }
    }
}

fn print_text(
    operation: OperationType,
    result: &Result<OperationOutcome, OperationError>,
    report: &RunSummary,
) {
    match result {
        Ok(outcome) => {
            println!("{}", outcome.summary(operation));
            for path in &outcome.succeeded {
                println!("  {}", path.display());
            }
            for path in &outcome.skipped {
                println!("  skipped {}", path.display());
            }
        }
        Err(_) => {
            for path in &report.succeeded {
                println!("  {}", path.display());
            }
            match &report.error {
                Some(presentation) => eprintln!("{presentation}"),
                None => eprintln!("{operation} cancelled"),
            }
        }
    }
}
