use crate::types::{NodeId, NodeStore};

use super::first::{first, last};

/// In-order successor.
pub fn next<T, S: NodeStore<T> + ?Sized>(store: &S, mut curr: NodeId) -> Option<NodeId> {
    if let Some(r) = store.right(curr) {
        return first(store, Some(r));
    }

    let mut p = store.parent(curr);
    while let Some(pi) = p {
        if store.right(pi) == Some(curr) {
            curr = pi;
            p = store.parent(pi);
        } else {
            return Some(pi);
        }
    }
    None
}

/// In-order predecessor.
pub fn prev<T, S: NodeStore<T> + ?Sized>(store: &S, mut curr: NodeId) -> Option<NodeId> {
    if let Some(l) = store.left(curr) {
        return last(store, Some(l));
    }

    let mut p = store.parent(curr);
    while let Some(pi) = p {
        if store.left(pi) == Some(curr) {
            curr = pi;
            p = store.parent(pi);
        } else {
            return Some(pi);
        }
    }
    None
}
