/*!
 * Command-line interface for flatpack
 */

use std::fs;
use std::io::{self, Write};
use std::process;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Local;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use rayon::ThreadPoolBuilder;

use flatpack::collector::EntryCollector;
use flatpack::config::{Args, Config, Mode};
use flatpack::error::{FlatpackError, Result};
use flatpack::git::{discover_root, GitRepository};
use flatpack::redact::RedactFile;
use flatpack::report::{ReportFormat, Reporter, RunSummary};
use flatpack::snapshot::{SnapshotBuilder, SnapshotOptions};

fn main() {
    let args = Args::parse();
    let config = Config::from_args(args);

    env_logger::Builder::new()
        .filter_level(config.log_level())
        .parse_default_env()
        .init();

    if let Err(e) = run(&config) {
        eprintln!("error: {}", e);
        process::exit(exit_code(&e));
    }
}

/// Process exit status for a fatal error
fn exit_code(error: &FlatpackError) -> i32 {
    match error {
        FlatpackError::MalformedPattern { .. } => 5,
        FlatpackError::NotAGitRepository(_) => 3,
        FlatpackError::GitQuery(_) => 4,
        _ => 1,
    }
}

fn run(config: &Config) -> Result<()> {
    config.validate()?;

    if let Err(e) = ThreadPoolBuilder::new()
        .num_threads(config.num_threads)
        .build_global()
    {
        warn!("Failed to set thread pool size: {}", e);
    }

    let start_time = Instant::now();

    let root = discover_root(&config.repo)?;
    let redact = RedactFile::load(&root)?;
    let repository = GitRepository::open(&root)?;

    let progress = ProgressBar::new(0);
    progress.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} {prefix:.bold.cyan} {wide_msg:.dim.white} {pos}/{len} ({percent}%)",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    progress.enable_steady_tick(Duration::from_millis(100));
    progress.set_prefix("📊 Hashing");
    progress.set_message(format!("📂 {}", root.display()));

    let collector = EntryCollector::new(repository, config.include_untracked, Arc::new(progress));
    let entries = collector.collect();
    collector.progress.finish_and_clear();
    let entries = entries?;

    let root_name = root
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string());

    let options = SnapshotOptions {
        root_name,
        include_untracked: config.include_untracked,
        generated_at: config.timestamp.then(|| Local::now().to_rfc3339()),
    };
    let builder = SnapshotBuilder::new(&root, &redact, options);

    // Render fully before touching the destination
    let mut document = Vec::new();
    match config.mode {
        Mode::FullDump => builder.build_full_dump(&entries, &mut document)?,
        Mode::Plan => builder.build_plan(&entries, &mut document)?,
    }

    let destination = match &config.output {
        Some(path) => {
            fs::write(path, &document)?;
            info!("wrote {} from repo root {}", path.display(), root.display());
            path.display().to_string()
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&document)?;
            stdout.flush()?;
            "-".to_string()
        }
    };

    if config.summary {
        let summary =
            RunSummary::from_entries(&entries, &redact, destination, start_time.elapsed());
        Reporter::new(ReportFormat::ConsoleTable).print_report(&summary);
    }

    Ok(())
}
