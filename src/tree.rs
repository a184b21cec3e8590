/*!
 * Directory tree rendering for the document header
 */

use crate::types::{Entry, EntryKind};
use crate::utils::format_file_size;

/// A node of the display tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    /// Directory derived from path segments
    Directory {
        /// Directory name
        name: String,
        /// Children in entry order
        children: Vec<TreeNode>,
    },
    /// One collected entry
    Leaf {
        /// File or submodule name
        name: String,
        /// Git classification
        kind: EntryKind,
        /// Size in bytes
        size: u64,
    },
}

impl TreeNode {
    /// Group a pre-ordered entry list into a tree rooted at an unnamed directory.
    ///
    /// Only path segments are used; the filesystem is not consulted.
    pub fn from_entries(entries: &[Entry]) -> Self {
        let mut root = TreeNode::Directory {
            name: String::new(),
            children: Vec::new(),
        };

        for entry in entries {
            let segments: Vec<&str> = entry.path.split('/').collect();
            let (leaf, dirs) = match segments.split_last() {
                Some(split) => split,
                None => continue,
            };

            let mut node = &mut root;
            for dir in dirs {
                node = node.child_dir(dir);
            }
            if let TreeNode::Directory { children, .. } = node {
                children.push(TreeNode::Leaf {
                    name: leaf.to_string(),
                    kind: entry.kind,
                    size: entry.size,
                });
            }
        }

        root
    }

    /// Node name
    pub fn name(&self) -> &str {
        match self {
            TreeNode::Directory { name, .. } | TreeNode::Leaf { name, .. } => name,
        }
    }

    /// Find or create the child directory `name`
    fn child_dir(&mut self, name: &str) -> &mut TreeNode {
        let children = match self {
            TreeNode::Directory { children, .. } => children,
            TreeNode::Leaf { .. } => unreachable!("leaves never receive children"),
        };

        let index = match children
            .iter()
            .position(|c| matches!(c, TreeNode::Directory { name: n, .. } if n == name))
        {
            Some(index) => index,
            None => {
                children.push(TreeNode::Directory {
                    name: name.to_string(),
                    children: Vec::new(),
                });
                children.len() - 1
            }
        };
        &mut children[index]
    }

    /// Render the children of this node as box-drawing lines
    pub fn render(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let TreeNode::Directory { children, .. } = self {
            render_children(children, "", &mut lines);
        }
        lines
    }
}

fn render_children(children: &[TreeNode], prefix: &str, lines: &mut Vec<String>) {
    for (index, child) in children.iter().enumerate() {
        let last = index == children.len() - 1;
        let branch = if last { "└── " } else { "├── " };

        match child {
            TreeNode::Directory { name, children } => {
                lines.push(format!("{}{}{}/", prefix, branch, name));
                let child_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
                render_children(children, &child_prefix, lines);
            }
            TreeNode::Leaf { name, kind, size } => {
                lines.push(format!(
                    "{}{}{} {} ({})",
                    prefix,
                    branch,
                    name,
                    kind.marker(),
                    format_file_size(*size)
                ));
            }
        }
    }
}
