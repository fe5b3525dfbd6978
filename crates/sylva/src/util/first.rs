use crate::types::{NodeId, NodeStore};

/// Leftmost node below `root`.
pub fn first<T, S: NodeStore<T> + ?Sized>(store: &S, root: Option<NodeId>) -> Option<NodeId> {
    let mut curr = root;
    while let Some(idx) = curr {
        match store.left(idx) {
            Some(l) => curr = Some(l),
            None => return Some(idx),
        }
    }
    curr
}

/// Rightmost node below `root`.
pub fn last<T, S: NodeStore<T> + ?Sized>(store: &S, root: Option<NodeId>) -> Option<NodeId> {
    let mut curr = root;
    while let Some(idx) = curr {
        match store.right(idx) {
            Some(r) => curr = Some(r),
            None => return Some(idx),
        }
    }
    curr
}
