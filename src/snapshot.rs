/*!
 * Document rendering: full dump and plan
 */

use std::fs;
use std::io::Write;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::warn;

use crate::error::{FlatpackError, Result};
use crate::redact::{Decision, RedactFile, REDACT_FILE_NAME};
use crate::tree::TreeNode;
use crate::types::{Entry, EntryKind};

/// Opens a per-file block
pub const SEP_BEGIN: &str = "===== BEGIN FILE =====";
/// Separates block headers from the body
pub const SEP_CONTENT: &str = "----- CONTENT -----";
/// Closes a per-file block
pub const SEP_END: &str = "===== END FILE =====";
/// Opens the tree block
pub const TREE_BEGIN: &str = "===== REPO TREE =====";
/// Closes the tree block
pub const TREE_END: &str = "===== END TREE =====";
/// Label of the only run-dependent header line
pub const GENERATED_LABEL: &str = "Generated:";

/// Run-wide settings echoed into the document header
#[derive(Debug, Clone)]
pub struct SnapshotOptions {
    /// Name shown on the `Root:` line
    pub root_name: String,
    /// Whether untracked files were collected
    pub include_untracked: bool,
    /// Timestamp for the `Generated:` line; omitted when `None`
    pub generated_at: Option<String>,
}

/// Body of one file block
enum Body {
    Text(String),
    Binary(String),
    Placeholder(String),
}

impl Body {
    fn mode(&self) -> &'static str {
        match self {
            Body::Text(_) => "text",
            Body::Binary(_) => "binary",
            Body::Placeholder(_) => "-",
        }
    }

    fn encoding(&self) -> &'static str {
        match self {
            Body::Text(_) => "utf-8",
            Body::Binary(_) => "base64",
            Body::Placeholder(_) => "-",
        }
    }

    fn content(&self) -> &str {
        match self {
            Body::Text(s) | Body::Binary(s) | Body::Placeholder(s) => s,
        }
    }
}

/// Renders entries into a full dump or a plan
pub struct SnapshotBuilder<'a> {
    /// Work tree root file bodies are read from
    root: &'a Path,
    /// Control file and its rules
    redact: &'a RedactFile,
    /// Header settings
    options: SnapshotOptions,
}

impl<'a> SnapshotBuilder<'a> {
    /// Create a new builder
    pub fn new(root: &'a Path, redact: &'a RedactFile, options: SnapshotOptions) -> Self {
        Self {
            root,
            redact,
            options,
        }
    }

    /// Header, tree and one block per entry with its body or a placeholder
    pub fn build_full_dump<W: Write>(&self, entries: &[Entry], out: &mut W) -> Result<()> {
        self.write_header(entries, out)?;

        for entry in entries {
            let decision = self.redact.decide(&entry.path, entry.is_dir);
            let (body, read_warning) = self.body_for(entry, &decision);
            let warning = entry.warning.as_deref().or(read_warning.as_deref());

            writeln!(out, "{}", SEP_BEGIN)?;
            writeln!(out, "Path: {}", entry.path)?;
            writeln!(out, "Kind: {}", entry.kind)?;
            writeln!(out, "Mode: {}", body.mode())?;
            writeln!(out, "Encoding: {}", body.encoding())?;
            writeln!(out, "Size: {}", entry.size)?;
            writeln!(out, "Hash: {}", hash_field(entry.hash.as_deref()))?;
            writeln!(out, "Decision: {}", decision)?;
            if let Some(warning) = warning {
                writeln!(out, "Warning: {}", warning)?;
            }
            writeln!(out, "{}", SEP_CONTENT)?;

            let content = body.content();
            out.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                writeln!(out)?;
            }
            writeln!(out, "{}", SEP_END)?;
            writeln!(out)?;
        }

        Ok(())
    }

    /// Header, tree and one decision line per entry. Bodies are never read.
    pub fn build_plan<W: Write>(&self, entries: &[Entry], out: &mut W) -> Result<()> {
        self.write_header(entries, out)?;

        for entry in entries {
            let decision = self.redact.decide(&entry.path, entry.is_dir);
            writeln!(out, "{} {}", decision, entry.path)?;
        }

        Ok(())
    }

    fn write_header<W: Write>(&self, entries: &[Entry], out: &mut W) -> Result<()> {
        if let Some(generated_at) = &self.options.generated_at {
            writeln!(out, "{} {}", GENERATED_LABEL, generated_at)?;
        }

        let status = if self.redact.found() { "found" } else { "absent" };
        writeln!(out, "Redact-File: {} ({})", REDACT_FILE_NAME, status)?;
        writeln!(out, "Redact-File-Hash: {}", hash_field(self.redact.hash.as_deref()))?;
        writeln!(
            out,
            "Resolved: include_untracked = {}",
            self.options.include_untracked
        )?;
        writeln!(out)?;

        let count = |kind: EntryKind| entries.iter().filter(|e| e.kind == kind).count();
        writeln!(out, "{}", TREE_BEGIN)?;
        writeln!(out, "Root: {}", self.options.root_name)?;
        writeln!(
            out,
            "Files: {}   Tracked: {}   Untracked: {}   Submodules: {}",
            entries.len(),
            count(EntryKind::Tracked),
            count(EntryKind::Untracked),
            count(EntryKind::Submodule)
        )?;
        writeln!(out, "Legend: [T]=tracked [U]=untracked [S]=submodule")?;
        writeln!(out)?;
        for line in TreeNode::from_entries(entries).render() {
            writeln!(out, "{}", line)?;
        }
        writeln!(out, "{}", TREE_END)?;
        writeln!(out)?;

        Ok(())
    }

    /// Body for one entry, plus a warning when reading it failed
    fn body_for(&self, entry: &Entry, decision: &Decision<'_>) -> (Body, Option<String>) {
        if entry.kind == EntryKind::Submodule {
            return (Body::Placeholder("<submodule: not expanded>".to_string()), None);
        }
        if let Decision::Redact(rule) = decision {
            return (Body::Placeholder(format!("<redacted: {}>", rule.raw())), None);
        }
        if let Some(warning) = &entry.warning {
            return (Body::Placeholder(format!("<unreadable: {}>", warning)), None);
        }

        match fs::read(self.root.join(&entry.path)) {
            Ok(data) => match String::from_utf8(data) {
                Ok(text) => (Body::Text(text), None),
                Err(e) => (Body::Binary(STANDARD.encode(e.as_bytes())), None),
            },
            Err(source) => {
                let error = FlatpackError::UnreadableFile {
                    path: entry.path.clone(),
                    source,
                };
                warn!("{}", error);
                let message = error.to_string();
                (
                    Body::Placeholder(format!("<unreadable: {}>", message)),
                    Some(message),
                )
            }
        }
    }
}

/// `sha256:<hex>` or `-`
fn hash_field(hash: Option<&str>) -> String {
    match hash {
        Some(hash) => format!("sha256:{}", hash),
        None => "-".to_string(),
    }
}

/// Drop the `Generated:` line so two documents can be compared
pub fn strip_generated_line(document: &str) -> String {
    document
        .lines()
        .filter(|line| !line.starts_with(GENERATED_LABEL))
        .collect::<Vec<_>>()
        .join("\n")
}
