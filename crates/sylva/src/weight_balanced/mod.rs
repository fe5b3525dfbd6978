//! Weight-balanced trees (bounded balance), parameterised by `DELTA` and
//! `GAMMA` from [`TreeOptions`].
//!
//! The subtree count doubles as an order-statistic index, see [`nth`] and
//! [`rank_of`].

use std::marker::PhantomData;

use log::trace;

use crate::augment::Augment;
use crate::balance::Balancer;
use crate::bst;
use crate::error::TreeError;
use crate::options::{DefaultOptions, TreeOptions};
use crate::types::{NodeId, NodeStore, NodeStoreMut};
use crate::util::{first, next};

/// Number of nodes in the subtree rooted at a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Weight(pub(crate) u32);

impl Weight {
    pub fn count(self) -> usize {
        self.0 as usize
    }
}

pub struct WeightBalanced<O = DefaultOptions>(PhantomData<O>);

impl<O> WeightBalanced<O> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<O> Default for WeightBalanced<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O> Clone for WeightBalanced<O> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<O> std::fmt::Debug for WeightBalanced<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WeightBalanced")
    }
}

#[inline]
fn size<T, S>(store: &S, id: Option<NodeId>) -> u64
where
    S: NodeStore<T, Meta = Weight> + ?Sized,
{
    id.map_or(0, |n| u64::from(store.meta(n).0))
}

#[inline]
fn weight<T, S>(store: &S, id: Option<NodeId>) -> u64
where
    S: NodeStore<T, Meta = Weight> + ?Sized,
{
    size::<T, S>(store, id) + 1
}

fn update<T, S>(store: &mut S, id: NodeId)
where
    S: NodeStoreMut<T, Meta = Weight> + ?Sized,
{
    let total = 1 + size::<T, S>(store, store.left(id)) + size::<T, S>(store, store.right(id));
    store.meta_mut(id).0 = total as u32;
}

impl<O: TreeOptions> WeightBalanced<O> {
    /// `heavy > DELTA * light`.
    #[inline]
    fn too_heavy(heavy: u64, light: u64) -> bool {
        let (num, den) = O::WBT_DELTA;
        heavy * den > light * num
    }

    /// `inner < GAMMA * outer`: a single rotation suffices.
    #[inline]
    fn single(inner: u64, outer: u64) -> bool {
        let (num, den) = O::WBT_GAMMA;
        inner * den < outer * num
    }

    fn rotate_left<T, S, A>(store: &mut S, root: &mut Option<NodeId>, x: NodeId, aug: &A) -> NodeId
    where
        S: NodeStoreMut<T, Meta = Weight> + ?Sized,
        A: Augment<T, S> + ?Sized,
    {
        let y = bst::rotate_left::<T, S, A>(store, root, x, aug);
        update::<T, S>(store, x);
        update::<T, S>(store, y);
        y
    }

    fn rotate_right<T, S, A>(store: &mut S, root: &mut Option<NodeId>, x: NodeId, aug: &A) -> NodeId
    where
        S: NodeStoreMut<T, Meta = Weight> + ?Sized,
        A: Augment<T, S> + ?Sized,
    {
        let y = bst::rotate_right::<T, S, A>(store, root, x, aug);
        update::<T, S>(store, x);
        update::<T, S>(store, y);
        y
    }

    fn rebalance<T, S, A>(store: &mut S, root: &mut Option<NodeId>, n: NodeId, aug: &A)
    where
        S: NodeStoreMut<T, Meta = Weight> + ?Sized,
        A: Augment<T, S> + ?Sized,
    {
        let (l, r) = (store.left(n), store.right(n));
        let (wl, wr) = (weight::<T, S>(store, l), weight::<T, S>(store, r));
        if Self::too_heavy(wr, wl) {
            let Some(r) = r else {
                return;
            };
            let inner = weight::<T, S>(store, store.left(r));
            let outer = weight::<T, S>(store, store.right(r));
            if Self::single(inner, outer) {
                Self::rotate_left::<T, S, A>(store, root, n, aug);
            } else {
                trace!("double rotation at node {n}");
                Self::rotate_right::<T, S, A>(store, root, r, aug);
                Self::rotate_left::<T, S, A>(store, root, n, aug);
            }
        } else if Self::too_heavy(wl, wr) {
            let Some(l) = l else {
                return;
            };
            let inner = weight::<T, S>(store, store.right(l));
            let outer = weight::<T, S>(store, store.left(l));
            if Self::single(inner, outer) {
                Self::rotate_right::<T, S, A>(store, root, n, aug);
            } else {
                trace!("double rotation at node {n}");
                Self::rotate_left::<T, S, A>(store, root, l, aug);
                Self::rotate_right::<T, S, A>(store, root, n, aug);
            }
        }
    }

    /// Recounts and rebalances every node from `from` to the root.
    fn fix_upwards<T, S, A>(store: &mut S, root: &mut Option<NodeId>, from: Option<NodeId>, aug: &A)
    where
        S: NodeStoreMut<T, Meta = Weight> + ?Sized,
        A: Augment<T, S> + ?Sized,
    {
        let mut curr = from;
        while let Some(n) = curr {
            update::<T, S>(store, n);
            let parent = store.parent(n);
            Self::rebalance::<T, S, A>(store, root, n, aug);
            curr = parent;
        }
    }
}

impl<O: TreeOptions> Balancer for WeightBalanced<O> {
    type Meta = Weight;

    fn insert<T, S, A, F>(
        &mut self,
        store: &mut S,
        root: &mut Option<NodeId>,
        id: NodeId,
        goes_after: F,
        aug: &A,
    ) where
        S: NodeStoreMut<T, Meta = Weight> + ?Sized,
        A: Augment<T, S> + ?Sized,
        F: FnMut(&S, NodeId) -> bool,
    {
        *store.meta_mut(id) = Weight(1);
        bst::insert_leaf::<T, S, A, F>(store, root, id, goes_after, aug);
        let parent = store.parent(id);
        Self::fix_upwards::<T, S, A>(store, root, parent, aug);
    }

    fn remove<T, S, A>(&mut self, store: &mut S, root: &mut Option<NodeId>, id: NodeId, aug: &A)
    where
        S: NodeStoreMut<T, Meta = Weight> + ?Sized,
        A: Augment<T, S> + ?Sized,
    {
        let detached = bst::detach::<T, S, A>(store, root, id, aug);
        Self::fix_upwards::<T, S, A>(store, root, detached.parent, aug);
    }

    fn verify<T, S>(&self, store: &S, root: Option<NodeId>) -> Result<(), TreeError>
    where
        S: NodeStore<T, Meta = Weight> + ?Sized,
    {
        let mut curr = first::<T, S>(store, root);
        while let Some(n) = curr {
            let (l, r) = (store.left(n), store.right(n));
            let expected = 1 + size::<T, S>(store, l) + size::<T, S>(store, r);
            if u64::from(store.meta(n).0) != expected {
                return Err(TreeError::WrongWeight(n));
            }
            let (wl, wr) = (weight::<T, S>(store, l), weight::<T, S>(store, r));
            if Self::too_heavy(wl, wr) || Self::too_heavy(wr, wl) {
                return Err(TreeError::WeightImbalance(n));
            }
            curr = next::<T, S>(store, n);
        }
        Ok(())
    }
}

/// The `k`-th node in order (zero based).
pub fn nth<T, S>(store: &S, root: Option<NodeId>, mut k: usize) -> Option<NodeId>
where
    S: NodeStore<T, Meta = Weight> + ?Sized,
{
    let mut curr = root;
    while let Some(n) = curr {
        let left = size::<T, S>(store, store.left(n)) as usize;
        if k < left {
            curr = store.left(n);
        } else if k == left {
            return Some(n);
        } else {
            k -= left + 1;
            curr = store.right(n);
        }
    }
    None
}

/// Zero-based in-order position of a linked node.
pub fn rank_of<T, S>(store: &S, id: NodeId) -> usize
where
    S: NodeStore<T, Meta = Weight> + ?Sized,
{
    let mut rank = size::<T, S>(store, store.left(id)) as usize;
    let mut curr = id;
    while let Some(p) = store.parent(curr) {
        if store.right(p) == Some(curr) {
            rank += size::<T, S>(store, store.left(p)) as usize + 1;
        }
        curr = p;
    }
    rank
}
