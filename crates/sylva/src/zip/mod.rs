//! Zip trees: randomized ranks kept in heap order, with insertion by
//! unzipping the search path and removal by zipping the two subtrees.

use log::trace;
use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::augment::Augment;
use crate::balance::Balancer;
use crate::bst;
use crate::error::TreeError;
use crate::types::{NodeId, NodeStore, NodeStoreMut};
use crate::util::{first, next};

/// Seed used by [`Zip::default`].
pub const DEFAULT_SEED: u64 = 0x5EED_2179_C0DE_0001;

/// Geometrically distributed node rank.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rank(pub(crate) u8);

impl Rank {
    pub fn get(self) -> u8 {
        self.0
    }
}

/// Zip-tree balancer owning its random source.
#[derive(Clone, Debug)]
pub struct Zip<R = Xoshiro256PlusPlus> {
    rng: R,
}

impl<R: SeedableRng> Zip<R> {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: R::seed_from_u64(seed),
        }
    }
}

impl<R> Zip<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: SeedableRng> Default for Zip<R> {
    fn default() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }
}

impl<R: RngCore> Zip<R> {
    /// P(rank = k) = 2^-(k+1).
    fn draw_rank(&mut self) -> Rank {
        Rank(self.rng.next_u64().trailing_zeros() as u8)
    }
}

#[inline]
fn rank<T, S>(store: &S, id: NodeId) -> Rank
where
    S: NodeStore<T, Meta = Rank> + ?Sized,
{
    *store.meta(id)
}

/// Splits the subtree at `start` into the left and right spines of `x`.
///
/// Nodes that `x` goes after end up on the left spine, the rest on the
/// right one. `x` must have no children yet.
fn unzip<T, S, A, F>(store: &mut S, x: NodeId, start: NodeId, goes_after: &mut F, aug: &A)
where
    S: NodeStoreMut<T, Meta = Rank> + ?Sized,
    A: Augment<T, S> + ?Sized,
    F: FnMut(&S, NodeId) -> bool,
{
    let mut left_tail: Option<NodeId> = None;
    let mut right_tail: Option<NodeId> = None;
    let mut curr = Some(start);
    while let Some(c) = curr {
        if goes_after(&*store, c) {
            match left_tail {
                None => store.set_left(x, Some(c)),
                Some(t) => store.set_right(t, Some(c)),
            }
            store.set_parent(c, Some(left_tail.unwrap_or(x)));
            left_tail = Some(c);
            curr = store.right(c);
        } else {
            match right_tail {
                None => store.set_right(x, Some(c)),
                Some(t) => store.set_left(t, Some(c)),
            }
            store.set_parent(c, Some(right_tail.unwrap_or(x)));
            right_tail = Some(c);
            curr = store.left(c);
        }
    }
    if let Some(t) = left_tail {
        store.set_right(t, None);
        rebuild_spine::<T, S, A>(store, t, x, aug);
    }
    if let Some(t) = right_tail {
        store.set_left(t, None);
        rebuild_spine::<T, S, A>(store, t, x, aug);
    }
    aug.rebuild(store, x);
    trace!("unzipped subtree {start} under node {x}");
}

/// Rebuilds aggregates from `tail` up to, not including, `top`.
fn rebuild_spine<T, S, A>(store: &mut S, tail: NodeId, top: NodeId, aug: &A)
where
    S: NodeStoreMut<T, Meta = Rank> + ?Sized,
    A: Augment<T, S> + ?Sized,
{
    let mut curr = Some(tail);
    while let Some(n) = curr.filter(|&n| n != top) {
        aug.rebuild(store, n);
        curr = store.parent(n);
    }
}

#[derive(Clone, Copy)]
enum Hole {
    Left(NodeId),
    Right(NodeId),
}

fn fill<T, S>(store: &mut S, top: &mut Option<NodeId>, hole: Option<Hole>, node: NodeId)
where
    S: NodeStoreMut<T, Meta = Rank> + ?Sized,
{
    match hole {
        None => *top = Some(node),
        Some(Hole::Left(p)) => {
            store.set_left(p, Some(node));
            store.set_parent(node, Some(p));
        }
        Some(Hole::Right(p)) => {
            store.set_right(p, Some(node));
            store.set_parent(node, Some(p));
        }
    }
}

/// Merges two subtrees whose keys are ordered `left < right`. Returns the
/// new subtree root and the deepest node whose children changed.
fn zip<T, S>(
    store: &mut S,
    mut left: Option<NodeId>,
    mut right: Option<NodeId>,
) -> (Option<NodeId>, Option<NodeId>)
where
    S: NodeStoreMut<T, Meta = Rank> + ?Sized,
{
    let mut top = None;
    let mut hole = None;
    let mut deepest = None;
    loop {
        let picked = match (left, right) {
            (Some(a), Some(b)) => {
                if rank::<T, S>(store, a) > rank::<T, S>(store, b) {
                    left = store.right(a);
                    (a, Hole::Right(a))
                } else {
                    right = store.left(b);
                    (b, Hole::Left(b))
                }
            }
            (Some(rest), None) | (None, Some(rest)) => {
                fill::<T, S>(store, &mut top, hole, rest);
                return (top, deepest);
            }
            (None, None) => {
                match hole {
                    Some(Hole::Left(p)) => store.set_left(p, None),
                    Some(Hole::Right(p)) => store.set_right(p, None),
                    None => {}
                }
                return (top, deepest);
            }
        };
        fill::<T, S>(store, &mut top, hole, picked.0);
        hole = Some(picked.1);
        deepest = Some(picked.0);
    }
}

impl<R: RngCore> Balancer for Zip<R> {
    type Meta = Rank;

    fn insert<T, S, A, F>(
        &mut self,
        store: &mut S,
        root: &mut Option<NodeId>,
        id: NodeId,
        mut goes_after: F,
        aug: &A,
    ) where
        S: NodeStoreMut<T, Meta = Rank> + ?Sized,
        A: Augment<T, S> + ?Sized,
        F: FnMut(&S, NodeId) -> bool,
    {
        let new_rank = self.draw_rank();
        bst::init_links::<T, S>(store, id);
        *store.meta_mut(id) = new_rank;

        let Some(top) = *root else {
            *root = Some(id);
            aug.rebuild(store, id);
            return;
        };
        if new_rank > rank::<T, S>(store, top) {
            *root = Some(id);
            unzip::<T, S, A, F>(store, id, top, &mut goes_after, aug);
            return;
        }

        let mut parent = top;
        let mut after = goes_after(&*store, parent);
        loop {
            let child = if after {
                store.right(parent)
            } else {
                store.left(parent)
            };
            match child {
                Some(c) if rank::<T, S>(store, c) >= new_rank => {
                    parent = c;
                    after = goes_after(&*store, parent);
                }
                _ => break,
            }
        }

        let displaced = if after {
            store.right(parent)
        } else {
            store.left(parent)
        };
        store.set_parent(id, Some(parent));
        if after {
            store.set_right(parent, Some(id));
        } else {
            store.set_left(parent, Some(id));
        }
        match displaced {
            Some(d) => unzip::<T, S, A, F>(store, id, d, &mut goes_after, aug),
            None => {
                aug.rebuild(store, id);
            }
        }
        bst::propagate_changed::<T, S, A>(store, Some(parent), aug);
    }

    fn remove<T, S, A>(&mut self, store: &mut S, root: &mut Option<NodeId>, id: NodeId, aug: &A)
    where
        S: NodeStoreMut<T, Meta = Rank> + ?Sized,
        A: Augment<T, S> + ?Sized,
    {
        let parent = store.parent(id);
        let (l, r) = (store.left(id), store.right(id));
        let (merged, deepest) = zip::<T, S>(store, l, r);
        bst::replace_child::<T, S>(store, root, parent, id, merged);
        if let Some(m) = merged {
            store.set_parent(m, parent);
        }
        bst::unlink::<T, S>(store, id);
        trace!("zipped children of node {id}");
        bst::propagate::<T, S, A>(store, deepest.or(parent), aug);
    }

    fn verify<T, S>(&self, store: &S, root: Option<NodeId>) -> Result<(), TreeError>
    where
        S: NodeStore<T, Meta = Rank> + ?Sized,
    {
        let mut curr = first::<T, S>(store, root);
        while let Some(n) = curr {
            for child in [store.left(n), store.right(n)].into_iter().flatten() {
                if rank::<T, S>(store, child) > rank::<T, S>(store, n) {
                    return Err(TreeError::RankOrder(child));
                }
            }
            curr = next::<T, S>(store, n);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_are_geometric() {
        let mut zip = Zip::<Xoshiro256PlusPlus>::with_seed(1);
        let mut histogram = [0usize; 8];
        for _ in 0..20_000 {
            let rank = zip.draw_rank().get() as usize;
            if rank < histogram.len() {
                histogram[rank] += 1;
            }
        }
        // Each rank is about half as likely as the one below it.
        assert!((9_000..11_000).contains(&histogram[0]), "{histogram:?}");
        assert!((4_300..5_700).contains(&histogram[1]), "{histogram:?}");
        assert!((2_000..3_000).contains(&histogram[2]), "{histogram:?}");
    }

    #[test]
    fn same_seed_same_ranks() {
        let mut a = Zip::<Xoshiro256PlusPlus>::with_seed(77);
        let mut c = Zip::<Xoshiro256PlusPlus>::with_seed(77);
        let from_a: Vec<Rank> = (0..64).map(|_| a.draw_rank()).collect();
        let from_c: Vec<Rank> = (0..64).map(|_| c.draw_rank()).collect();
        assert_eq!(from_a, from_c);
    }
}
