//! Balancer-independent binary search tree primitives.
//!
//! Every function works on a [`NodeStore`] and a root slot owned by the
//! caller. Balancers compose them; none of them allocate.

mod iter;

pub use iter::Iter;

use std::cmp::Ordering;

use log::trace;

use crate::augment::Augment;
use crate::error::TreeError;
use crate::types::{NodeId, NodeStore, NodeStoreMut};
use crate::util::{first, next};

/// Where a new leaf goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    Root,
    Left(NodeId),
    Right(NodeId),
}

/// What [`detach`] left behind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Detached<M> {
    /// Parent of the spliced position.
    pub parent: Option<NodeId>,
    /// Node that moved up into the spliced position.
    pub child: Option<NodeId>,
    /// Metadata of the spliced position (after any successor swap).
    pub meta: M,
}

/// First node for which `probe` is not `Greater`.
///
/// `probe(n)` orders the searched key relative to node `n`.
pub fn lower_bound_by<T, S, F>(store: &S, root: Option<NodeId>, mut probe: F) -> Option<NodeId>
where
    S: NodeStore<T> + ?Sized,
    F: FnMut(NodeId) -> Ordering,
{
    let mut curr = root;
    let mut found = None;
    while let Some(n) = curr {
        if probe(n) == Ordering::Greater {
            curr = store.right(n);
        } else {
            found = Some(n);
            curr = store.left(n);
        }
    }
    found
}

/// First node for which `probe` is `Less`.
pub fn upper_bound_by<T, S, F>(store: &S, root: Option<NodeId>, mut probe: F) -> Option<NodeId>
where
    S: NodeStore<T> + ?Sized,
    F: FnMut(NodeId) -> Ordering,
{
    let mut curr = root;
    let mut found = None;
    while let Some(n) = curr {
        if probe(n) == Ordering::Less {
            found = Some(n);
            curr = store.left(n);
        } else {
            curr = store.right(n);
        }
    }
    found
}

/// Leftmost node for which `probe` is `Equal`.
pub fn find_by<T, S, F>(store: &S, root: Option<NodeId>, mut probe: F) -> Option<NodeId>
where
    S: NodeStore<T> + ?Sized,
    F: FnMut(NodeId) -> Ordering,
{
    let candidate = lower_bound_by::<T, S, _>(store, root, &mut probe)?;
    (probe(candidate) == Ordering::Equal).then_some(candidate)
}

/// Descends to the leaf slot of a new node.
///
/// `goes_after(store, n)` tells whether the new node belongs after `n`.
pub fn locate<T, S, F>(store: &S, root: Option<NodeId>, mut goes_after: F) -> Slot
where
    S: NodeStore<T> + ?Sized,
    F: FnMut(&S, NodeId) -> bool,
{
    let Some(mut curr) = root else {
        return Slot::Root;
    };
    loop {
        if goes_after(store, curr) {
            match store.right(curr) {
                Some(r) => curr = r,
                None => return Slot::Right(curr),
            }
        } else {
            match store.left(curr) {
                Some(l) => curr = l,
                None => return Slot::Left(curr),
            }
        }
    }
}

/// Marks `id` linked with no neighbours. Metadata is left to the balancer.
pub fn init_links<T, S: NodeStoreMut<T> + ?Sized>(store: &mut S, id: NodeId) {
    let links = store.links_mut(id);
    links.p = None;
    links.l = None;
    links.r = None;
    links.linked = true;
}

/// Resets the link block of `id` and returns its old metadata.
pub fn unlink<T, S>(store: &mut S, id: NodeId) -> S::Meta
where
    S: NodeStoreMut<T> + ?Sized,
    S::Meta: Default,
{
    let links = store.links_mut(id);
    links.p = None;
    links.l = None;
    links.r = None;
    links.linked = false;
    std::mem::take(&mut links.meta)
}

/// Hangs a freshly initialised `id` at `slot`.
pub fn attach<T, S: NodeStoreMut<T> + ?Sized>(
    store: &mut S,
    root: &mut Option<NodeId>,
    id: NodeId,
    slot: Slot,
) {
    init_links::<T, S>(store, id);
    match slot {
        Slot::Root => *root = Some(id),
        Slot::Left(p) => {
            store.set_parent(id, Some(p));
            store.set_left(p, Some(id));
        }
        Slot::Right(p) => {
            store.set_parent(id, Some(p));
            store.set_right(p, Some(id));
        }
    }
}

/// Plain BST insertion of `id` as a leaf, aggregates included.
pub fn insert_leaf<T, S, A, F>(
    store: &mut S,
    root: &mut Option<NodeId>,
    id: NodeId,
    goes_after: F,
    aug: &A,
) -> Slot
where
    S: NodeStoreMut<T> + ?Sized,
    A: Augment<T, S> + ?Sized,
    F: FnMut(&S, NodeId) -> bool,
{
    let slot = locate::<T, S, F>(store, *root, goes_after);
    attach::<T, S>(store, root, id, slot);
    aug.rebuild(store, id);
    let parent = store.parent(id);
    propagate_changed::<T, S, A>(store, parent, aug);
    slot
}

/// Points the child slot of `parent` that held `old` at `new`.
pub fn replace_child<T, S: NodeStoreMut<T> + ?Sized>(
    store: &mut S,
    root: &mut Option<NodeId>,
    parent: Option<NodeId>,
    old: NodeId,
    new: Option<NodeId>,
) {
    match parent {
        None => *root = new,
        Some(p) => {
            if store.left(p) == Some(old) {
                store.set_left(p, new);
            } else {
                store.set_right(p, new);
            }
        }
    }
}

/// Rotates `x` down to the left. Returns the node that took its place.
pub fn rotate_left<T, S, A>(store: &mut S, root: &mut Option<NodeId>, x: NodeId, aug: &A) -> NodeId
where
    S: NodeStoreMut<T> + ?Sized,
    A: Augment<T, S> + ?Sized,
{
    let Some(y) = store.right(x) else {
        debug_assert!(false, "rotate_left needs a right child at node {x}");
        return x;
    };
    let inner = store.left(y);
    let p = store.parent(x);

    store.set_right(x, inner);
    if let Some(b) = inner {
        store.set_parent(b, Some(x));
    }
    store.set_left(y, Some(x));
    store.set_parent(x, Some(y));
    store.set_parent(y, p);
    replace_child::<T, S>(store, root, p, x, Some(y));

    aug.rebuild(store, x);
    aug.rebuild(store, y);
    trace!("rotated node {x} left under {y}");
    y
}

/// Rotates `x` down to the right. Returns the node that took its place.
pub fn rotate_right<T, S, A>(store: &mut S, root: &mut Option<NodeId>, x: NodeId, aug: &A) -> NodeId
where
    S: NodeStoreMut<T> + ?Sized,
    A: Augment<T, S> + ?Sized,
{
    let Some(y) = store.left(x) else {
        debug_assert!(false, "rotate_right needs a left child at node {x}");
        return x;
    };
    let inner = store.right(y);
    let p = store.parent(x);

    store.set_left(x, inner);
    if let Some(b) = inner {
        store.set_parent(b, Some(x));
    }
    store.set_right(y, Some(x));
    store.set_parent(x, Some(y));
    store.set_parent(y, p);
    replace_child::<T, S>(store, root, p, x, Some(y));

    aug.rebuild(store, x);
    aug.rebuild(store, y);
    trace!("rotated node {x} right under {y}");
    y
}

/// Exchanges the tree positions (links and metadata) of `a` and its
/// descendant `b`.
pub fn swap_positions<T, S>(store: &mut S, root: &mut Option<NodeId>, a: NodeId, b: NodeId)
where
    S: NodeStoreMut<T> + ?Sized,
    S::Meta: Default,
{
    let (pa, la, ra) = (store.parent(a), store.left(a), store.right(a));
    let (pb, lb, rb) = (store.parent(b), store.left(b), store.right(b));
    let fix = |x: Option<NodeId>| {
        if x == Some(a) {
            Some(b)
        } else if x == Some(b) {
            Some(a)
        } else {
            x
        }
    };

    let (new_a, new_b) = ((fix(pb), fix(lb), fix(rb)), (fix(pa), fix(la), fix(ra)));
    {
        let links = store.links_mut(a);
        (links.p, links.l, links.r) = new_a;
    }
    {
        let links = store.links_mut(b);
        (links.p, links.l, links.r) = new_b;
    }

    match pa {
        None => *root = Some(b),
        Some(p) if store.left(p) == Some(a) => store.set_left(p, Some(b)),
        Some(p) => store.set_right(p, Some(b)),
    }
    if let Some(p) = pb.filter(|&p| p != a) {
        if store.left(p) == Some(b) {
            store.set_left(p, Some(a));
        } else {
            store.set_right(p, Some(a));
        }
    }
    for c in [new_a.1, new_a.2].into_iter().flatten() {
        store.set_parent(c, Some(a));
    }
    for c in [new_b.1, new_b.2].into_iter().flatten() {
        store.set_parent(c, Some(b));
    }

    let meta_a = std::mem::take(store.meta_mut(a));
    let meta_b = std::mem::replace(store.meta_mut(b), meta_a);
    *store.meta_mut(a) = meta_b;
}

/// Unlinks `id`, swapping it with its successor first when it has two
/// children, and refreshes aggregates up to the root.
pub fn detach<T, S, A>(
    store: &mut S,
    root: &mut Option<NodeId>,
    id: NodeId,
    aug: &A,
) -> Detached<S::Meta>
where
    S: NodeStoreMut<T> + ?Sized,
    S::Meta: Default,
    A: Augment<T, S> + ?Sized,
{
    if let (Some(_), Some(r)) = (store.left(id), store.right(id)) {
        let successor = first::<T, S>(store, Some(r)).unwrap_or(r);
        swap_positions::<T, S>(store, root, id, successor);
    }

    let parent = store.parent(id);
    let child = store.left(id).or(store.right(id));
    if let Some(c) = child {
        store.set_parent(c, parent);
    }
    replace_child::<T, S>(store, root, parent, id, child);
    let meta = unlink::<T, S>(store, id);
    propagate::<T, S, A>(store, parent, aug);
    Detached {
        parent,
        child,
        meta,
    }
}

/// Rebuilds aggregates from `from` up to the root.
pub fn propagate<T, S, A>(store: &mut S, from: Option<NodeId>, aug: &A)
where
    S: NodeStoreMut<T> + ?Sized,
    A: Augment<T, S> + ?Sized,
{
    let mut curr = from;
    while let Some(n) = curr {
        aug.rebuild(store, n);
        curr = store.parent(n);
    }
}

/// Like [`propagate`], but stops at the first ancestor whose value did not
/// change.
pub fn propagate_changed<T, S, A>(store: &mut S, from: Option<NodeId>, aug: &A)
where
    S: NodeStoreMut<T> + ?Sized,
    A: Augment<T, S> + ?Sized,
{
    let mut curr = from;
    while let Some(n) = curr {
        if !aug.rebuild(store, n) {
            break;
        }
        curr = store.parent(n);
    }
}

/// Unlinks every node below `root` without rebalancing, calling `visit` on
/// each node right after it is unlinked. Returns the number of nodes.
pub fn unlink_all<T, S, F>(store: &mut S, root: Option<NodeId>, mut visit: F) -> usize
where
    S: NodeStoreMut<T> + ?Sized,
    S::Meta: Default,
    F: FnMut(&mut S, NodeId),
{
    let mut count = 0;
    let mut curr = root;
    while let Some(n) = curr {
        if let Some(l) = store.left(n) {
            curr = Some(l);
            continue;
        }
        if let Some(r) = store.right(n) {
            curr = Some(r);
            continue;
        }
        let parent = store.parent(n);
        if let Some(p) = parent {
            if store.left(p) == Some(n) {
                store.set_left(p, None);
            } else {
                store.set_right(p, None);
            }
        }
        unlink::<T, S>(store, n);
        visit(store, n);
        count += 1;
        curr = parent;
    }
    count
}

/// Checks parent/child symmetry and returns the node count.
pub fn verify_links<T, S>(store: &S, root: Option<NodeId>) -> Result<usize, TreeError>
where
    S: NodeStore<T> + ?Sized,
{
    if let Some(r) = root {
        if store.parent(r).is_some() {
            return Err(TreeError::BrokenLink(r));
        }
    }
    let mut count = 0;
    let mut curr = first::<T, S>(store, root);
    while let Some(n) = curr {
        if !store.is_linked(n) {
            return Err(TreeError::BrokenLink(n));
        }
        for child in [store.left(n), store.right(n)].into_iter().flatten() {
            if store.parent(child) != Some(n) {
                return Err(TreeError::BrokenLink(child));
            }
        }
        count += 1;
        curr = next::<T, S>(store, n);
    }
    Ok(count)
}

/// Checks that the in-order sequence is sorted by `cmp`.
pub fn verify_order<T, S, F>(
    store: &S,
    root: Option<NodeId>,
    allow_equal: bool,
    mut cmp: F,
) -> Result<(), TreeError>
where
    S: NodeStore<T> + ?Sized,
    F: FnMut(NodeId, NodeId) -> Ordering,
{
    let mut prev = None;
    let mut curr = first::<T, S>(store, root);
    while let Some(n) = curr {
        if let Some(p) = prev {
            match cmp(p, n) {
                Ordering::Greater => return Err(TreeError::OrderViolation(n)),
                Ordering::Equal if !allow_equal => return Err(TreeError::OrderViolation(n)),
                _ => {}
            }
        }
        prev = Some(n);
        curr = next::<T, S>(store, n);
    }
    Ok(())
}

/// Checks that every cached aggregate is fresh.
pub fn verify_augment<T, S, A>(store: &S, root: Option<NodeId>, aug: &A) -> Result<(), TreeError>
where
    S: NodeStore<T> + ?Sized,
    A: Augment<T, S> + ?Sized,
{
    let mut curr = first::<T, S>(store, root);
    while let Some(n) = curr {
        if !aug.check(store, n) {
            return Err(TreeError::StaleAggregate(n));
        }
        curr = next::<T, S>(store, n);
    }
    Ok(())
}
