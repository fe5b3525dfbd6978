//! Stackless traversal over parent/child links.

mod first;
mod next;

pub use first::{first, last};
pub use next::{next, prev};

use crate::types::{NodeId, NodeStore};

/// Number of edges between `id` and the root of its tree.
pub fn depth<T, S: NodeStore<T> + ?Sized>(store: &S, id: NodeId) -> usize {
    let mut depth = 0;
    let mut curr = store.parent(id);
    while let Some(p) = curr {
        depth += 1;
        curr = store.parent(p);
    }
    depth
}

/// Root of the tree that contains `id`.
pub fn root_of<T, S: NodeStore<T> + ?Sized>(store: &S, mut id: NodeId) -> NodeId {
    while let Some(p) = store.parent(id) {
        id = p;
    }
    id
}

/// Whether `a` comes before `b` in order. Both must be linked into the same
/// tree. O(depth).
pub fn precedes<T, S: NodeStore<T> + ?Sized>(store: &S, a: NodeId, b: NodeId) -> bool {
    let (mut x, mut y) = (a, b);
    let (mut dx, mut dy) = (depth::<T, S>(store, a), depth::<T, S>(store, b));
    // Child of `x` (resp. `y`) on the way up from `a` (resp. `b`).
    let (mut from_x, mut from_y) = (None, None);
    while x != y {
        if dx >= dy {
            let Some(p) = store.parent(x) else {
                return false;
            };
            from_x = Some(x);
            x = p;
            dx -= 1;
        } else {
            let Some(p) = store.parent(y) else {
                return false;
            };
            from_y = Some(y);
            y = p;
            dy -= 1;
        }
    }
    match (from_x, from_y) {
        (Some(cx), _) => store.left(x) == Some(cx),
        (None, Some(cy)) => store.right(x) == Some(cy),
        (None, None) => false,
    }
}
