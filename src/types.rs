/*!
 * Core types and data structures for flatpack
 */

use std::fmt;

/// How git classifies an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Recorded in the index
    Tracked,
    /// Present in the working tree, not tracked and not ignored
    Untracked,
    /// Gitlink to another repository; never recursed into
    Submodule,
}

impl EntryKind {
    /// Short marker used in tree listings
    pub fn marker(self) -> &'static str {
        match self {
            EntryKind::Tracked => "[T]",
            EntryKind::Untracked => "[U]",
            EntryKind::Submodule => "[S]",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntryKind::Tracked => "tracked",
            EntryKind::Untracked => "untracked",
            EntryKind::Submodule => "submodule",
        };
        f.write_str(name)
    }
}

/// One path considered for the snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Repo-relative path with `/` separators
    pub path: String,
    /// Git classification
    pub kind: EntryKind,
    /// Always false for collected leaves, submodules included
    pub is_dir: bool,
    /// Size in bytes (0 for submodules)
    pub size: u64,
    /// Hex SHA-256 of the on-disk bytes; `None` for submodules and unreadable files
    pub hash: Option<String>,
    /// Read problem found while hashing
    pub warning: Option<String>,
}

impl Entry {
    /// A zero-size, hashless submodule leaf
    pub fn submodule(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Submodule,
            is_dir: false,
            size: 0,
            hash: None,
            warning: None,
        }
    }

    /// Whether the entry failed to read while collecting
    pub fn is_unreadable(&self) -> bool {
        self.warning.is_some()
    }
}
