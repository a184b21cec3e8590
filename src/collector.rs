/*!
 * Entry collection: tracked, untracked and submodule paths with sizes and hashes
 */

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use indicatif::ProgressBar;
use log::{debug, info, warn};
use rayon::prelude::*;

use crate::error::{FlatpackError, Result};
use crate::git::RepoSource;
use crate::types::{Entry, EntryKind};
use crate::utils::{compare_paths, normalize_path, sha256_file};

/// Enumerates and hashes every entry of a work tree
pub struct EntryCollector<S: RepoSource> {
    /// Repository query backend
    source: S,
    /// Whether untracked, non-ignored files are part of the snapshot
    include_untracked: bool,
    /// Progress bar advanced once per hashed entry
    pub progress: Arc<ProgressBar>,
}

impl<S: RepoSource> EntryCollector<S> {
    /// Create a new collector
    pub fn new(source: S, include_untracked: bool, progress: Arc<ProgressBar>) -> Self {
        Self {
            source,
            include_untracked,
            progress,
        }
    }

    /// Collect all entries in tree order.
    ///
    /// Listing failures are fatal. Files that cannot be read are kept with a
    /// warning instead of aborting the run.
    pub fn collect(&self) -> Result<Vec<Entry>> {
        let candidates = self.classify()?;
        let root = self.source.root();
        let progress = &self.progress;

        progress.set_length(candidates.len() as u64);

        let mut entries: Vec<Entry> = candidates
            .into_par_iter()
            .filter_map(|(path, kind)| {
                let entry = match kind {
                    EntryKind::Submodule => Some(Entry::submodule(path)),
                    _ => inspect_file(root, path, kind),
                };
                progress.inc(1);
                entry
            })
            .collect();

        // Parallel completion order is arbitrary
        entries.sort_by(|a, b| compare_paths(&a.path, &b.path));

        info!(
            "Collected {} entries from {}",
            entries.len(),
            root.display()
        );
        Ok(entries)
    }

    /// Merge the three listings into one classified, de-duplicated set.
    ///
    /// Submodules win over every other classification and tracked wins over
    /// untracked. Nothing below a submodule path is kept.
    fn classify(&self) -> Result<Vec<(String, EntryKind)>> {
        let submodules: BTreeSet<String> = self
            .source
            .list_submodules()?
            .iter()
            .map(|p| clean(p))
            .collect();

        let inside_submodule = |path: &str| {
            submodules.iter().any(|sub| {
                path.strip_prefix(sub.as_str())
                    .map_or(false, |rest| rest.starts_with('/'))
            })
        };

        let tracked: BTreeSet<String> = self
            .source
            .list_tracked()?
            .iter()
            .map(|p| clean(p))
            .filter(|p| !submodules.contains(p) && !inside_submodule(p.as_str()))
            .collect();

        let untracked: BTreeSet<String> = if self.include_untracked {
            self.source
                .list_untracked()?
                .iter()
                .map(|p| clean(p))
                .filter(|p| !submodules.contains(p) && !tracked.contains(p))
                .filter(|p| !inside_submodule(p.as_str()))
                .collect()
        } else {
            BTreeSet::new()
        };

        debug!(
            "Classified {} tracked, {} untracked, {} submodule path(s)",
            tracked.len(),
            untracked.len(),
            submodules.len()
        );

        let mut candidates = Vec::with_capacity(tracked.len() + untracked.len() + submodules.len());
        candidates.extend(tracked.into_iter().map(|p| (p, EntryKind::Tracked)));
        candidates.extend(untracked.into_iter().map(|p| (p, EntryKind::Untracked)));
        candidates.extend(submodules.iter().cloned().map(|p| (p, EntryKind::Submodule)));
        Ok(candidates)
    }
}

/// Repo-relative path with `/` separators and no `./` prefix
fn clean(path: &str) -> String {
    normalize_path(&path.replace('\\', "/")).to_string()
}

/// Stat and hash one leaf. Returns `None` when the path is not on disk.
fn inspect_file(root: &Path, path: String, kind: EntryKind) -> Option<Entry> {
    let abs_path = root.join(&path);

    match fs::metadata(&abs_path) {
        Ok(metadata) if metadata.is_file() => {
            let (hash, warning) = match sha256_file(&abs_path) {
                Ok(hash) => (Some(hash), None),
                Err(source) => (None, Some(unreadable(&path, source))),
            };
            Some(Entry {
                path,
                kind,
                is_dir: false,
                size: metadata.len(),
                hash,
                warning,
            })
        }
        Ok(_) => {
            debug!("Skipping {}: not a regular file", path);
            None
        }
        Err(source) => {
            // A dangling symlink still belongs in the listing
            if fs::symlink_metadata(&abs_path).is_ok() {
                let warning = unreadable(&path, source);
                Some(Entry {
                    path,
                    kind,
                    is_dir: false,
                    size: 0,
                    hash: None,
                    warning: Some(warning),
                })
            } else {
                debug!("Skipping {}: not present in the working tree", path);
                None
            }
        }
    }
}

fn unreadable(path: &str, source: std::io::Error) -> String {
    let error = FlatpackError::UnreadableFile {
        path: path.to_string(),
        source,
    };
    warn!("{}", error);
    error.to_string()
}
