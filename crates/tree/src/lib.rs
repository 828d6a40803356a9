//! Projection of a flat descriptor list into a renderable directory tree.
//!
//! A tree is rebuilt from scratch for every listing; nothing here is mutated
//! incrementally. Siblings are ordered by case-insensitive name with files and
//! directories intermixed, so the output does not depend on input order.

use context_protocol::{DirectoryNode, FileDescriptor, FileNode, TreeNode, SEPARATOR};
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Default)]
struct DirBuilder {
    dirs: HashMap<String, DirBuilder>,
    files: HashMap<String, FileDescriptor>,
}

impl DirBuilder {
    // Recursion depth equals the number of path segments.
    fn into_nodes(self, prefix: &str) -> Vec<TreeNode> {
        let mut nodes = Vec::with_capacity(self.dirs.len() + self.files.len());
        for (name, dir) in self.dirs {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}{SEPARATOR}{name}")
            };
            let children = dir.into_nodes(&path);
            nodes.push(TreeNode::Directory(DirectoryNode {
                name,
                path,
                children,
            }));
        }
        for (_, descriptor) in self.files {
            nodes.push(TreeNode::File(FileNode { descriptor }));
        }
        nodes.sort_by(compare_siblings);
        nodes
    }
}

/// Build the root-level nodes for `descriptors`.
///
/// Repeated directory prefixes share one node. A descriptor without a
/// directory segment becomes a root-level file.
pub fn build(descriptors: &[FileDescriptor]) -> Vec<TreeNode> {
    let mut root = DirBuilder::default();
    for descriptor in descriptors {
        let segments: Vec<&str> = descriptor
            .relative_path()
            .split(SEPARATOR)
            .filter(|segment| !segment.is_empty())
            .collect();
        let Some((file_name, parents)) = segments.split_last() else {
            continue;
        };

        let mut current = &mut root;
        for segment in parents {
            current = current.dirs.entry((*segment).to_string()).or_default();
        }
        current
            .files
            .entry((*file_name).to_string())
            .or_insert_with(|| descriptor.clone());
    }
    root.into_nodes("")
}

/// Sibling order: case-insensitive name, then exact name, then directories first.
pub fn compare_siblings(a: &TreeNode, b: &TreeNode) -> Ordering {
    a.name()
        .to_lowercase()
        .cmp(&b.name().to_lowercase())
        .then_with(|| a.name().cmp(b.name()))
        .then_with(|| b.is_directory().cmp(&a.is_directory()))
}

/// File paths in tree order.
pub fn flatten_paths(nodes: &[TreeNode]) -> Vec<String> {
    let mut paths = Vec::new();
    let mut stack: Vec<&TreeNode> = nodes.iter().rev().collect();
    while let Some(node) = stack.pop() {
        match node {
            TreeNode::Directory(dir) => stack.extend(dir.children.iter().rev()),
            TreeNode::File(file) => paths.push(file.descriptor.relative_path().to_string()),
        }
    }
    paths
}

pub fn render_text(nodes: &[TreeNode]) -> String {
    if nodes.is_empty() {
        return "No files found\n".to_string();
    }
    let mut out = String::new();
    render_level(nodes, "", &mut out);
    out
}

fn render_level(nodes: &[TreeNode], prefix: &str, out: &mut String) {
    for (index, node) in nodes.iter().enumerate() {
        let last = index + 1 == nodes.len();
        let (branch, indent) = if last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        out.push_str(prefix);
        out.push_str(branch);
        out.push_str(node.name());
        match node {
            TreeNode::Directory(dir) => {
                out.push_str("/\n");
                render_level(&dir.children, &format!("{prefix}{indent}"), out);
            }
            TreeNode::File(_) => out.push('\n'),
        }
    }
}
