/*!
 * Git repository operations
 */

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use git2::{ErrorCode, Repository as Git2Repository, Status, StatusOptions};
use log::{debug, warn};

use super::{RepoSource, GITLINK_MODE};
use crate::error::{FlatpackError, Result};

/// Work tree of a local repository, queried through libgit2
pub struct GitRepository {
    /// Inner git2 repository instance
    inner: Git2Repository,
    /// Work tree root as given by the caller
    root: PathBuf,
}

impl GitRepository {
    /// Open the repository whose work tree is exactly `root`.
    ///
    /// Parent directories are not searched; use [`discover_root`] first when
    /// starting from an arbitrary path.
    pub fn open(root: &Path) -> Result<Self> {
        let inner = Git2Repository::open(root).map_err(|e| match e.code() {
            ErrorCode::NotFound => FlatpackError::NotAGitRepository(root.to_path_buf()),
            _ => FlatpackError::GitQuery(e),
        })?;

        if inner.workdir().is_none() {
            return Err(FlatpackError::NotAGitRepository(root.to_path_buf()));
        }

        Ok(Self {
            inner,
            root: root.to_path_buf(),
        })
    }

    /// Split index entries into regular files and gitlinks
    fn index_paths(&self) -> Result<(Vec<String>, Vec<String>)> {
        let index = self.inner.index()?;
        let mut files = BTreeSet::new();
        let mut gitlinks = BTreeSet::new();

        for entry in index.iter() {
            let mode = entry.mode;
            let path = match String::from_utf8(entry.path) {
                Ok(path) => path,
                Err(e) => {
                    warn!(
                        "Skipping index entry with non UTF-8 path: {}",
                        String::from_utf8_lossy(e.as_bytes())
                    );
                    continue;
                }
            };

            // Conflicted paths appear once per stage; the sets collapse them
            if mode == GITLINK_MODE {
                gitlinks.insert(path);
            } else {
                files.insert(path);
            }
        }

        Ok((files.into_iter().collect(), gitlinks.into_iter().collect()))
    }
}

impl RepoSource for GitRepository {
    fn root(&self) -> &Path {
        &self.root
    }

    fn list_tracked(&self) -> Result<Vec<String>> {
        let (files, _) = self.index_paths()?;
        debug!("Index lists {} tracked file(s)", files.len());
        Ok(files)
    }

    fn list_untracked(&self) -> Result<Vec<String>> {
        let mut options = StatusOptions::new();
        options
            .include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false)
            .include_unmodified(false)
            .exclude_submodules(true);

        let statuses = self.inner.statuses(Some(&mut options))?;
        let mut paths = BTreeSet::new();
        for status in statuses.iter() {
            if !status.status().contains(Status::WT_NEW) {
                continue;
            }
            match status.path() {
                // A nested repository is reported as its directory
                Some(path) if path.ends_with('/') => {
                    debug!("Skipping nested repository {}", path);
                }
                Some(path) => {
                    paths.insert(path.to_string());
                }
                None => warn!(
                    "Skipping untracked path that is not UTF-8: {}",
                    String::from_utf8_lossy(status.path_bytes())
                ),
            }
        }

        debug!("Status lists {} untracked file(s)", paths.len());
        Ok(paths.into_iter().collect())
    }

    fn list_submodules(&self) -> Result<Vec<String>> {
        let (_, gitlinks) = self.index_paths()?;
        debug!("Index lists {} submodule(s)", gitlinks.len());
        Ok(gitlinks)
    }
}

/// Resolve the top-level work tree containing `path`
pub fn discover_root(path: &Path) -> Result<PathBuf> {
    let repo = Git2Repository::discover(path).map_err(|e| match e.code() {
        ErrorCode::NotFound => FlatpackError::NotAGitRepository(path.to_path_buf()),
        _ => FlatpackError::GitQuery(e),
    })?;

    let workdir = repo
        .workdir()
        .ok_or_else(|| FlatpackError::NotAGitRepository(path.to_path_buf()))?;

    Ok(workdir.to_path_buf())
}
