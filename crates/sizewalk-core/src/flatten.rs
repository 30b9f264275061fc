//! Flattened, size-ordered views of a scanned tree.

use crate::entry::DirectoryEntry;

/// Collect every directory of the tree in pre-order: a node, then each
/// child's flattened sequence in child-list order.
pub fn flatten(root: &DirectoryEntry) -> Vec<&DirectoryEntry> {
    let mut out = Vec::with_capacity(root.dir_count() as usize + 1);
    push_pre_order(root, &mut out);
    out
}

fn push_pre_order<'a>(node: &'a DirectoryEntry, out: &mut Vec<&'a DirectoryEntry>) {
    out.push(node);
    for child in node.children() {
        push_pre_order(child, out);
    }
}

/// [`flatten`] followed by a stable sort by size, largest first.
///
/// Directories of equal size keep their pre-order relative position.
pub fn flatten_by_size(root: &DirectoryEntry) -> Vec<&DirectoryEntry> {
    let mut dirs = flatten(root);
    dirs.sort_by(|a, b| b.size().cmp(&a.size()));
    dirs
}
