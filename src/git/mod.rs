/*!
 * Git repository queries behind a narrow capability trait
 */

mod repository;

pub use repository::{discover_root, GitRepository};

use std::path::{Path, PathBuf};

use crate::error::Result;

/// Mode of a gitlink (submodule) entry in the index
pub const GITLINK_MODE: u32 = 0o160000;

/// What the entry collector needs to know about a repository.
///
/// All paths are repo-relative and use `/` separators.
pub trait RepoSource {
    /// Work tree root the listed paths are relative to
    fn root(&self) -> &Path;

    /// Tracked files (index entries that are not gitlinks)
    fn list_tracked(&self) -> Result<Vec<String>>;

    /// Untracked files not excluded by the repository's ignore rules
    fn list_untracked(&self) -> Result<Vec<String>>;

    /// Gitlink entries (mode 160000)
    fn list_submodules(&self) -> Result<Vec<String>>;
}

/// Source backed by fixed path lists, for callers that already know the
/// classification (and for tests that run without a repository).
#[derive(Debug, Clone, Default)]
pub struct ListedSource {
    /// Work tree root
    pub root: PathBuf,
    /// Tracked paths
    pub tracked: Vec<String>,
    /// Untracked, non-ignored paths
    pub untracked: Vec<String>,
    /// Gitlink paths
    pub submodules: Vec<String>,
}

impl ListedSource {
    /// Empty listing rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }
}

impl RepoSource for ListedSource {
    fn root(&self) -> &Path {
        &self.root
    }

    fn list_tracked(&self) -> Result<Vec<String>> {
        Ok(self.tracked.clone())
    }

    fn list_untracked(&self) -> Result<Vec<String>> {
        Ok(self.untracked.clone())
    }

    fn list_submodules(&self) -> Result<Vec<String>> {
        Ok(self.submodules.clone())
    }
}
