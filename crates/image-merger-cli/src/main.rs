use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use image_merger_core::config::LogLevel;
use image_merger_core::discovery::{scan_for_images, MagicSniffer};
use image_merger_core::progress::{DenseUpdater, UpdateKind};
use image_merger_core::{
    init_logger, CancellationToken, Config, ImageMerger, MergeEvent, MergeReport, Notifier,
    Phase, Resolution,
};

#[derive(Parser)]
#[command(name = "image-merger")]
#[command(about = "Merge new images into an existing collection without creating duplicates")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare new images against a collection and report what would be kept
    Merge {
        /// Image files or directories to merge into the collection
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Root directory of the existing collection
        #[arg(long)]
        collection: PathBuf,

        /// Directory for rotating log files (overrides the configuration)
        #[arg(long)]
        log_dir: Option<PathBuf>,

        /// Verbosity level
        #[arg(short, long, action = clap::ArgAction::Count)]
        verbose: u8,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Generate default configuration file
    GenerateConfig {
        /// Path to save configuration file
        #[arg(default_value = "image-merger.json")]
        path: PathBuf,
    },
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Merge {
            inputs,
            collection,
            log_dir,
            verbose,
            config,
        } => {
            let mut config = if let Some(config_path) = config {
                Config::from_file(&config_path)?
            } else {
                Config::default()
            };

            if log_dir.is_some() {
                config.log_dir = log_dir;
            }
            match verbose {
                0 => {}
                1 => config.log_level = LogLevel::Debug,
                _ => config.log_level = LogLevel::Trace,
            }

            init_logging(&config)?;

            // Validates the configuration
            let merger = ImageMerger::new(config)?;

            let cancel = CancellationToken::new();
            let handler_token = cancel.clone();
            ctrlc::set_handler(move || {
                eprintln!("Cancelling, finishing current phase...");
                handler_token.cancel();
            })
            .context("Failed to install Ctrl-C handler")?;

            let inputs = expand_inputs(&inputs, &cancel, merger.config().scan_interval());
            info!("Starting merge of {} input images", inputs.len());

            let (notifier, events) = Notifier::channel();
            let worker = thread::Builder::new()
                .name("merge-worker".to_string())
                .spawn(move || merger.merge(&inputs, &collection, notifier, cancel))
                .context("Failed to start merge worker")?;

            render_events(events);

            let report = worker
                .join()
                .map_err(|_| anyhow!("Merge worker panicked"))??;

            print_report(&report);
            info!("Merge complete");
            Ok(())
        }

        Commands::GenerateConfig { path } => {
            let config = Config::default();
            config.save_to_file(&path)?;
            println!("Configuration file generated at: {}", path.display());
            Ok(())
        }
    }
}

/// Log to rotating files when a log directory is configured, otherwise to stderr
fn init_logging(config: &Config) -> anyhow::Result<()> {
    match &config.log_dir {
        Some(dir) => init_logger(dir, config.log_level.into())?,
        None => env_logger::Builder::new()
            .filter_level(config.log_level.into())
            .parse_default_env()
            .init(),
    }
    Ok(())
}

/// Replace every directory argument by the supported images found below it
fn expand_inputs(paths: &[PathBuf], cancel: &CancellationToken, interval: Duration) -> Vec<PathBuf> {
    let mut expanded = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut updater = DenseUpdater::new(Notifier::silent(), interval);
            let scan = scan_for_images(path, &MagicSniffer, cancel, &mut updater);
            updater.update(scan.images.len(), scan.folder_count, UpdateKind::Final);
            info!(
                "Expanded {} to {} images",
                path.display(),
                scan.images.len()
            );
            expanded.extend(scan.images);
        } else if path.exists() {
            expanded.push(path.clone());
        } else {
            warn!("Skipping missing input: {}", path.display());
        }
    }

    expanded
}

/// Draw merge notifications until the worker drops its end of the channel
fn render_events(events: crossbeam::channel::Receiver<MergeEvent>) {
    let bar = ProgressBar::new_spinner();
    let spinner_style = ProgressStyle::with_template("{spinner} {prefix:>12} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    let bar_style = ProgressStyle::with_template("{prefix:>12} [{bar:40}] {pos:>3}%")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");

    bar.set_style(spinner_style);
    bar.enable_steady_tick(Duration::from_millis(100));

    for event in events {
        match event {
            MergeEvent::PhaseChanged(Phase::Scan) => {
                bar.set_prefix(Phase::Scan.to_string());
            }
            MergeEvent::PhaseChanged(phase) => {
                bar.disable_steady_tick();
                bar.set_style(bar_style.clone());
                bar.set_length(100);
                bar.set_prefix(phase.to_string());
            }
            MergeEvent::InputCountChanged { files, folders } => {
                bar.set_message(format!("{} images in {} folders", files, folders));
            }
            MergeEvent::ProgressChanged(percent) => {
                bar.set_position(u64::from(percent));
            }
        }
    }

    bar.finish_and_clear();
}

fn print_report(report: &MergeReport) {
    if report.cancelled {
        println!("Merge cancelled; results are partial.");
    }

    println!(
        "Scanned {} collection images in {} folders",
        report.scan.images.len(),
        report.scan.folder_count
    );

    for path in &report.excluded_inputs {
        println!("  already in collection: {}", path.display());
    }

    for item in &report.discarded {
        let label = match item.resolution {
            Resolution::CollectionDuplicate => "duplicate in collection",
            Resolution::InputDiscarded => "input discarded",
            Resolution::CollectionReplaced => "collection image replaced",
        };
        println!(
            "  {}: {} (kept {})",
            label,
            item.record.path().display(),
            display_name(&item.survivor)
        );
    }

    println!("{} new images to add:", report.inputs.len());
    for path in report.inputs.paths() {
        println!("  {}", path.display());
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
