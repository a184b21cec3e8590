/*!
 * Reporting functionality for flatpack
 *
 * Summarizes a finished run as console tables rendered with the tabled
 * library.
 */

use std::time::Duration;

use tabled::{
    settings::{object::Columns, Alignment, Modify, Padding, Style},
    Table, Tabled,
};

use crate::redact::RedactFile;
use crate::types::{Entry, EntryKind};
use crate::utils::format_file_size;

/// Largest files listed when the snapshot holds many entries
const TOP_FILES: usize = 10;

/// Counts for one finished run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Output destination (`-` for stdout)
    pub output: String,
    /// Wall time spent collecting and rendering
    pub duration: Duration,
    /// Total entries in the snapshot
    pub entries: usize,
    /// Tracked files
    pub tracked: usize,
    /// Untracked files
    pub untracked: usize,
    /// Submodule leaves
    pub submodules: usize,
    /// Entries whose bodies are withheld
    pub redacted: usize,
    /// Entries that could not be read
    pub unreadable: usize,
    /// Bytes of bodies that are emitted
    pub included_bytes: u64,
    /// Included files as (path, size), largest first
    pub largest: Vec<(String, u64)>,
}

impl RunSummary {
    /// Tally the entries of a run against the redaction rules
    pub fn from_entries(
        entries: &[Entry],
        redact: &RedactFile,
        output: impl Into<String>,
        duration: Duration,
    ) -> Self {
        let mut summary = Self {
            output: output.into(),
            duration,
            entries: entries.len(),
            ..Self::default()
        };

        for entry in entries {
            match entry.kind {
                EntryKind::Tracked => summary.tracked += 1,
                EntryKind::Untracked => summary.untracked += 1,
                EntryKind::Submodule => {
                    summary.submodules += 1;
                    continue;
                }
            }

            if redact.decide(&entry.path, entry.is_dir).is_redacted() {
                summary.redacted += 1;
            } else if entry.is_unreadable() {
                summary.unreadable += 1;
            } else {
                summary.included_bytes += entry.size;
                summary.largest.push((entry.path.clone(), entry.size));
            }
        }

        summary
            .largest
            .sort_by(|(pa, a), (pb, b)| b.cmp(a).then_with(|| pa.cmp(pb)));
        summary
    }
}

/// Format of the report output
pub enum ReportFormat {
    /// Console table output
    ConsoleTable,
}

/// Report generator for run summaries
pub struct Reporter {
    format: ReportFormat,
}

impl Reporter {
    /// Create a new reporter
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    /// Generate a report string
    pub fn generate_report(&self, summary: &RunSummary) -> String {
        match self.format {
            ReportFormat::ConsoleTable => self.generate_console_report(summary),
        }
    }

    /// Print the report to stderr so it never mixes with a document on stdout
    pub fn print_report(&self, summary: &RunSummary) {
        eprintln!("\n{}", self.generate_report(summary));
    }

    fn create_summary_table(&self, summary: &RunSummary) -> String {
        #[derive(Tabled)]
        struct SummaryRow {
            #[tabled(rename = "Metric")]
            key: String,

            #[tabled(rename = "Value")]
            value: String,
        }

        let row = |key: &str, value: String| SummaryRow {
            key: key.to_string(),
            value,
        };

        let rows = vec![
            row("📂 Output", summary.output.clone()),
            row("⏱️ Process Time", format!("{:.4?}", summary.duration)),
            row("📄 Entries", summary.entries.to_string()),
            row("🟢 Tracked", summary.tracked.to_string()),
            row("🟡 Untracked", summary.untracked.to_string()),
            row("🔗 Submodules", summary.submodules.to_string()),
            row("🔒 Redacted", summary.redacted.to_string()),
            row("⚠️ Unreadable", summary.unreadable.to_string()),
            row("📦 Included Bytes", format_file_size(summary.included_bytes)),
        ];

        let mut table = Table::new(rows);
        table
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(..)).with(Alignment::left()));

        table.to_string()
    }

    fn create_files_table(&self, summary: &RunSummary) -> String {
        #[derive(Tabled)]
        struct FileRow {
            #[tabled(rename = "File Path")]
            path: String,

            #[tabled(rename = "Size")]
            size: String,
        }

        let rows: Vec<FileRow> = summary
            .largest
            .iter()
            .take(TOP_FILES)
            .map(|(path, size)| FileRow {
                path: path.clone(),
                size: format_file_size(*size),
            })
            .collect();

        let mut table = Table::new(rows);
        table
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(..)).with(Alignment::left()));

        table.to_string()
    }

    fn generate_console_report(&self, summary: &RunSummary) -> String {
        let summary_table = self.create_summary_table(summary);
        let files_table = self.create_files_table(summary);

        let files_title = if summary.largest.len() > TOP_FILES {
            "📋  TOP 10 LARGEST INCLUDED FILES"
        } else {
            "📋  INCLUDED FILES"
        };

        format!(
            "{}\n{}\n\n✅  SNAPSHOT COMPLETE\n{}",
            files_title, files_table, summary_table
        )
    }
}
