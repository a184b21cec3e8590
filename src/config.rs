/*!
 * Configuration handling for flatpack
 */

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::ensure;
use crate::error::Result;

/// Command-line arguments for flatpack
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "flatpack",
    version = env!("CARGO_PKG_VERSION"),
    about = "Flatten a Git work tree into a single reviewable text document",
    long_about = "Writes the tracked (and optionally untracked) files of a Git work tree into one deterministic text document, withholding file bodies selected by a root .flatpackredact file."
)]
pub struct Args {
    /// Path inside the work tree to snapshot
    #[clap(long, default_value = ".", global = true)]
    pub repo: String,

    /// Output file (stdout when omitted, ignored by plan)
    #[clap(short, long, global = true)]
    pub output: Option<String>,

    /// Include untracked, non-ignored files (true/false/yes/no/on/off/1/0)
    #[clap(
        long,
        value_name = "BOOL",
        value_parser = parse_bool,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value = "true",
        default_missing_value = "true",
        global = true
    )]
    pub include_untracked: bool,

    /// Number of threads to use for hashing
    #[clap(long, default_value = "4", global = true)]
    pub threads: usize,

    /// Omit the Generated: header line
    #[clap(long, global = true)]
    pub no_timestamp: bool,

    /// Print a run summary to stderr
    #[clap(long, global = true)]
    pub summary: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[clap(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[clap(subcommand)]
    pub command: Option<Command>,
}

/// Optional subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List the redaction decision for every entry without reading bodies
    Plan,
}

/// Which document to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Header, tree and every file block
    FullDump,
    /// Header, tree and one decision line per entry
    Plan,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Path the work tree is discovered from
    pub repo: PathBuf,

    /// Output file; `None` writes to stdout
    pub output: Option<PathBuf>,

    /// Whether untracked files are collected
    pub include_untracked: bool,

    /// Number of threads to use for hashing
    pub num_threads: usize,

    /// Whether the Generated: line is written
    pub timestamp: bool,

    /// Whether a summary table is printed
    pub summary: bool,

    /// Log verbosity from repeated -v
    pub verbose: u8,

    /// Document to produce
    pub mode: Mode,
}

impl Config {
    /// Create configuration from command-line arguments
    pub fn from_args(args: Args) -> Self {
        let mode = match args.command {
            Some(Command::Plan) => Mode::Plan,
            None => Mode::FullDump,
        };

        Self {
            repo: PathBuf::from(args.repo),
            // A plan always goes to stdout
            output: match mode {
                Mode::Plan => None,
                Mode::FullDump => args.output.map(PathBuf::from),
            },
            include_untracked: args.include_untracked,
            num_threads: args.threads,
            timestamp: !args.no_timestamp,
            summary: args.summary,
            verbose: args.verbose,
            mode,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.repo.is_dir(),
            Config,
            "Repository path not found: {}",
            self.repo.display()
        );

        if let Some(parent) = self.output.as_ref().and_then(|o| o.parent()) {
            ensure!(
                parent.as_os_str().is_empty() || parent.is_dir(),
                Config,
                "Output directory not found: {}",
                parent.display()
            );
        }

        ensure!(
            self.num_threads >= 1,
            Config,
            "thread count must be at least 1, got {}",
            self.num_threads
        );

        Ok(())
    }

    /// Default log filter for the configured verbosity
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

/// Parse a boolean flag value
pub fn parse_bool(value: &str) -> std::result::Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
        _ => Err(format!("invalid boolean value: {}", value)),
    }
}
