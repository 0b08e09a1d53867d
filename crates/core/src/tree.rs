//! Iterative traversal over a per-user document forest.
//!
//! Stores hand back the parent/child edges reachable from a root as flat
//! [`TreeEdge`] rows; [`Subtree`] turns them into an adjacency list and walks
//! it with an explicit stack. Every walk keeps a visited set, so a corrupted
//! parent chain (a cycle) terminates instead of looping.

use std::collections::{HashMap, HashSet};

use crate::types::DocumentId;

/// Child ids grouped by parent id.
pub type Adjacency = HashMap<DocumentId, Vec<DocumentId>>;

/// One `(child, parent)` link as stored in the `parent_document` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeEdge {
    pub id: DocumentId,
    pub parent: DocumentId,
}

/// Group edges by parent, preserving the order children were supplied in.
pub fn build_adjacency(edges: impl IntoIterator<Item = TreeEdge>) -> Adjacency {
    let mut adjacency: Adjacency = HashMap::new();
    for edge in edges {
        adjacency.entry(edge.parent).or_default().push(edge.id);
    }
    adjacency
}

/// Every id below `root` in depth-first pre-order. `root` is excluded.
pub fn descendants(adjacency: &Adjacency, root: DocumentId) -> Vec<DocumentId> {
    walk_descendants(root, |id| children(adjacency, id).to_vec())
}

/// Depth-first pre-order walk below `root`, asking `children_of` for the
/// children of each visited node. `root` is excluded from the result.
pub fn walk_descendants<F>(root: DocumentId, mut children_of: F) -> Vec<DocumentId>
where
    F: FnMut(DocumentId) -> Vec<DocumentId>,
{
    let mut out = Vec::new();
    let mut visited = HashSet::from([root]);
    let mut stack: Vec<DocumentId> = children_of(root).into_iter().rev().collect();

    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        out.push(id);
        stack.extend(children_of(id).into_iter().rev());
    }
    out
}

/// `root` and everything below it, ordered so each child precedes its parent.
///
/// This is the order deletions must run in: `root` is always last.
pub fn post_order(adjacency: &Adjacency, root: DocumentId) -> Vec<DocumentId> {
    let mut order = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = vec![root];

    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        order.push(id);
        stack.extend(children(adjacency, id).iter().copied());
    }
    // Reversed root-first order places every node after all of its descendants.
    order.reverse();
    order
}

fn children(adjacency: &Adjacency, id: DocumentId) -> &[DocumentId] {
    adjacency.get(&id).map(Vec::as_slice).unwrap_or(&[])
}

/// A root document plus the edges of everything beneath it.
#[derive(Debug, Clone)]
pub struct Subtree {
    root: DocumentId,
    adjacency: Adjacency,
}

impl Subtree {
    pub fn new(root: DocumentId, edges: impl IntoIterator<Item = TreeEdge>) -> Self {
        Self {
            root,
            adjacency: build_adjacency(edges),
        }
    }

    pub fn root(&self) -> DocumentId {
        self.root
    }

    /// Ids strictly below the root.
    pub fn descendants(&self) -> Vec<DocumentId> {
        descendants(&self.adjacency, self.root)
    }

    /// Root included, children before parents.
    pub fn deletion_order(&self) -> Vec<DocumentId> {
        post_order(&self.adjacency, self.root)
    }
}
