//! Dotted ancestor paths for diagnostics.

use crate::document::{Document, NodeId};

/// Builds the dotted path of `node`, root first: `root.book.title`.
///
/// Follows parent back-references until a node without a parent. Attributes
/// appear under their owning element by name.
pub fn full_path(doc: &Document, node: NodeId) -> String {
    let mut names = vec![doc.name(node)];
    let mut current = doc.parent(node);
    while let Some(id) = current {
        names.push(doc.name(id));
        current = doc.parent(id);
    }
    names.reverse();
    names.join(".")
}
