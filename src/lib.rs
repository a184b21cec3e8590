/*!
 * flatpack - Flatten a Git work tree into a single text document
 *
 * This library collects the tracked, untracked and submodule entries of a
 * work tree, decides per entry whether its body is redacted by the root
 * `.flatpackredact` file, and renders either a full dump or a plan.
 */

pub mod collector;
pub mod config;
pub mod error;
pub mod git;
pub mod pattern;
pub mod redact;
pub mod report;
pub mod snapshot;
pub mod tree;
pub mod types;
pub mod utils;

#[cfg(test)]
mod tests;

// Re-export main components for easier access
pub use collector::EntryCollector;
pub use config::Config;
pub use error::{FlatpackError, Result};
pub use git::{GitRepository, ListedSource, RepoSource};
pub use pattern::{PatternRule, PatternSet, Polarity};
pub use redact::{decide, Decision, RedactFile, REDACT_FILE_NAME};
pub use report::{ReportFormat, Reporter, RunSummary};
pub use snapshot::{SnapshotBuilder, SnapshotOptions};
pub use tree::TreeNode;
pub use types::{Entry, EntryKind};
pub use utils::format_file_size;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
