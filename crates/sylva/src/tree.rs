//! The intrusive search tree front end shared by every balancer.

use std::cmp::Ordering;
use std::marker::PhantomData;

use log::{debug, error};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::augment::{Augment, NoAugment};
use crate::balance::Balancer;
use crate::bst::{self, Iter};
use crate::compare::{ByKey, Compare, Lookup};
use crate::error::TreeError;
use crate::options::{DefaultOptions, TreeOptions};
use crate::red_black::RedBlack;
use crate::types::{DefaultTag, Linked, NodeId, NodeStore};
use crate::util;
use crate::weight_balanced::{self, Weight, WeightBalanced};
use crate::zip::Zip;

/// Intrusive search tree over nodes of type `N` stored in a caller-owned
/// slice.
///
/// The tree keeps only the root index, an optional count and the balancer
/// state. Every operation borrows the node slice; the same slice must be
/// passed to every call.
///
/// - `B`: balancing strategy ([`RedBlack`], [`WeightBalanced`], [`Zip`])
/// - `T`: tag selecting which [`Linked`] block of `N` this tree uses
/// - `O`: compile-time [`TreeOptions`]
/// - `C`: node ordering
/// - `A`: subtree aggregate hook
pub struct SearchTree<
    N,
    B,
    T = DefaultTag,
    O = DefaultOptions,
    C = ByKey,
    A = NoAugment,
> {
    root: Option<NodeId>,
    len: usize,
    balancer: B,
    comparator: C,
    augment: A,
    _marker: PhantomData<fn() -> (N, T, O)>,
}

pub type RbTree<N, T = DefaultTag, O = DefaultOptions, C = ByKey, A = NoAugment> =
    SearchTree<N, RedBlack, T, O, C, A>;

pub type WbTree<N, T = DefaultTag, O = DefaultOptions, C = ByKey, A = NoAugment> =
    SearchTree<N, WeightBalanced<O>, T, O, C, A>;

pub type ZipTree<
    N,
    T = DefaultTag,
    O = DefaultOptions,
    C = ByKey,
    A = NoAugment,
    R = Xoshiro256PlusPlus,
> = SearchTree<N, Zip<R>, T, O, C, A>;

impl<N, B: Default, T, O, C: Default, A: Default> Default for SearchTree<N, B, T, O, C, A> {
    fn default() -> Self {
        Self::from_parts(B::default(), C::default(), A::default())
    }
}

impl<N, B, T, O, C, A> SearchTree<N, B, T, O, C, A> {
    pub fn new() -> Self
    where
        B: Default,
        C: Default,
        A: Default,
    {
        Self::default()
    }

    pub fn with_comparator(comparator: C) -> Self
    where
        B: Default,
        A: Default,
    {
        Self::from_parts(B::default(), comparator, A::default())
    }

    pub fn from_parts(balancer: B, comparator: C, augment: A) -> Self {
        Self {
            root: None,
            len: 0,
            balancer,
            comparator,
            augment,
            _marker: PhantomData,
        }
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn comparator(&self) -> &C {
        &self.comparator
    }

    pub fn augment(&self) -> &A {
        &self.augment
    }

    pub fn balancer(&self) -> &B {
        &self.balancer
    }
}

impl<N, T, O, C, A, R: SeedableRng> SearchTree<N, Zip<R>, T, O, C, A> {
    /// Zip tree whose rank sequence is reproducible from `seed`.
    pub fn with_seed(seed: u64) -> Self
    where
        C: Default,
        A: Default,
    {
        Self::from_parts(Zip::with_seed(seed), C::default(), A::default())
    }
}

impl<N, B, T, O, C, A> SearchTree<N, B, T, O, C, A>
where
    N: Linked<T, Meta = B::Meta>,
    B: Balancer,
    O: TreeOptions,
    C: Compare<N>,
    A: Augment<T, [N]>,
{
    /// Links `id` into the tree.
    ///
    /// `id` must not be linked under this tag. Without `MULTIPLE`, no node
    /// in the tree may compare equal to it. Use [`Self::try_insert`] for a
    /// checked version.
    pub fn insert(&mut self, nodes: &mut [N], id: NodeId) {
        debug_assert!(
            !NodeStore::<T>::is_linked(&*nodes, id),
            "node {id} is already linked"
        );
        debug_assert!(
            O::MULTIPLE || self.find_equal(nodes, id).is_none(),
            "node {id} duplicates a key"
        );
        let comparator = &self.comparator;
        let goes_after = |store: &[N], existing: NodeId| {
            comparator.compare(&store[id as usize], &store[existing as usize]) != Ordering::Less
        };
        self.balancer
            .insert::<T, [N], A, _>(nodes, &mut self.root, id, goes_after, &self.augment);
        if O::CONSTANT_TIME_SIZE {
            self.len += 1;
        }
        self.after_mutation(nodes);
    }

    /// Links `id` directly before the live node `hint` among the nodes
    /// comparing equal to `id`. Nodes with other keys still decide the
    /// position; a `hint` with another key puts `id` at the matching end of
    /// its equal run.
    pub fn insert_with_hint(&mut self, nodes: &mut [N], id: NodeId, hint: NodeId) {
        debug_assert!(
            !NodeStore::<T>::is_linked(&*nodes, id),
            "node {id} is already linked"
        );
        debug_assert!(self.contains(nodes, hint), "hint {hint} is not a member");
        debug_assert!(
            O::MULTIPLE || self.find_equal(nodes, id).is_none(),
            "node {id} duplicates a key"
        );
        // Balancers may relink nodes while still asking for directions, so
        // the decisions along the search path are taken up front.
        let path = self.hinted_path(nodes, id, hint);
        let comparator = &self.comparator;
        let goes_after = |store: &[N], existing: NodeId| {
            match path.iter().find(|step| step.0 == existing) {
                Some(&(_, after)) => after,
                None => {
                    comparator.compare(&store[id as usize], &store[existing as usize])
                        != Ordering::Less
                }
            }
        };
        self.balancer
            .insert::<T, [N], A, _>(nodes, &mut self.root, id, goes_after, &self.augment);
        if O::CONSTANT_TIME_SIZE {
            self.len += 1;
        }
        self.after_mutation(nodes);
    }

    /// Search path of `id` in front of `hint`, with the direction taken at
    /// each node.
    fn hinted_path(&self, nodes: &[N], id: NodeId, hint: NodeId) -> Vec<(NodeId, bool)> {
        let node = &nodes[id as usize];
        let mut path = Vec::new();
        let mut curr = self.root;
        while let Some(n) = curr {
            let after = match self.comparator.compare(node, &nodes[n as usize]) {
                Ordering::Less => false,
                Ordering::Greater => true,
                Ordering::Equal => util::precedes::<T, [N]>(nodes, n, hint),
            };
            path.push((n, after));
            curr = if after {
                NodeStore::<T>::right(nodes, n)
            } else {
                NodeStore::<T>::left(nodes, n)
            };
        }
        path
    }

    pub fn try_insert(&mut self, nodes: &mut [N], id: NodeId) -> Result<(), TreeError> {
        if NodeStore::<T>::is_linked(&*nodes, id) {
            return Err(TreeError::AlreadyLinked(id));
        }
        if !O::MULTIPLE {
            if let Some(existing) = self.find_equal(nodes, id) {
                return Err(TreeError::DuplicateKey { node: id, existing });
            }
        }
        self.insert(nodes, id);
        Ok(())
    }

    /// Unlinks `id`, which must be a member of this tree.
    pub fn remove(&mut self, nodes: &mut [N], id: NodeId) {
        debug_assert!(
            NodeStore::<T>::is_linked(&*nodes, id),
            "node {id} is not linked"
        );
        self.balancer
            .remove::<T, [N], A>(nodes, &mut self.root, id, &self.augment);
        if O::CONSTANT_TIME_SIZE {
            self.len = self.len.saturating_sub(1);
        }
        self.after_mutation(nodes);
    }

    pub fn try_remove(&mut self, nodes: &mut [N], id: NodeId) -> Result<(), TreeError> {
        if !NodeStore::<T>::is_linked(&*nodes, id) {
            return Err(TreeError::NotLinked(id));
        }
        if !self.contains(nodes, id) {
            return Err(TreeError::NotMember(id));
        }
        self.remove(nodes, id);
        Ok(())
    }

    /// Unlinks the leftmost node equal to `key` and returns it.
    pub fn erase<Q: ?Sized>(&mut self, nodes: &mut [N], key: &Q) -> Option<NodeId>
    where
        C: Lookup<Q, N>,
    {
        let id = self.find(nodes, key)?;
        self.remove(nodes, id);
        Some(id)
    }

    /// Unlinks every node, leaving the nodes themselves untouched.
    pub fn clear(&mut self, nodes: &mut [N]) {
        bst::unlink_all::<T, [N], _>(nodes, self.root, |_, _| {});
        self.root = None;
        self.len = 0;
    }

    /// Leftmost node equal to `key`.
    pub fn find<Q: ?Sized>(&self, nodes: &[N], key: &Q) -> Option<NodeId>
    where
        C: Lookup<Q, N>,
    {
        bst::find_by::<T, [N], _>(nodes, self.root, |n| {
            self.comparator.compare_key(key, &nodes[n as usize])
        })
    }

    /// First node not less than `key`.
    pub fn lower_bound<Q: ?Sized>(&self, nodes: &[N], key: &Q) -> Option<NodeId>
    where
        C: Lookup<Q, N>,
    {
        bst::lower_bound_by::<T, [N], _>(nodes, self.root, |n| {
            self.comparator.compare_key(key, &nodes[n as usize])
        })
    }

    /// First node greater than `key`.
    pub fn upper_bound<Q: ?Sized>(&self, nodes: &[N], key: &Q) -> Option<NodeId>
    where
        C: Lookup<Q, N>,
    {
        bst::upper_bound_by::<T, [N], _>(nodes, self.root, |n| {
            self.comparator.compare_key(key, &nodes[n as usize])
        })
    }

    /// Leftmost node for which `probe` returns `Equal`. `probe` orders the
    /// sought key relative to a node and must agree with the comparator.
    pub fn find_by<F>(&self, nodes: &[N], mut probe: F) -> Option<NodeId>
    where
        F: FnMut(&N) -> Ordering,
    {
        bst::find_by::<T, [N], _>(nodes, self.root, |n| probe(&nodes[n as usize]))
    }

    fn find_equal(&self, nodes: &[N], id: NodeId) -> Option<NodeId> {
        let node = &nodes[id as usize];
        bst::find_by::<T, [N], _>(nodes, self.root, |n| {
            self.comparator.compare(node, &nodes[n as usize])
        })
    }

    pub fn first(&self, nodes: &[N]) -> Option<NodeId> {
        util::first::<T, [N]>(nodes, self.root)
    }

    pub fn last(&self, nodes: &[N]) -> Option<NodeId> {
        util::last::<T, [N]>(nodes, self.root)
    }

    pub fn next(&self, nodes: &[N], id: NodeId) -> Option<NodeId> {
        util::next::<T, [N]>(nodes, id)
    }

    pub fn prev(&self, nodes: &[N], id: NodeId) -> Option<NodeId> {
        util::prev::<T, [N]>(nodes, id)
    }

    pub fn iter<'a>(&self, nodes: &'a [N]) -> Iter<'a, T, [N]> {
        Iter::new(nodes, self.first(nodes), self.last(nodes))
    }

    /// Iterator starting at the live node `id` and running to the end. O(1).
    pub fn iter_from<'a>(&self, nodes: &'a [N], id: NodeId) -> Iter<'a, T, [N]> {
        debug_assert!(
            NodeStore::<T>::is_linked(nodes, id),
            "node {id} is not linked"
        );
        Iter::from_front(nodes, Some(id))
    }

    /// Whether `id` is linked into this tree (not just any tree with the
    /// same tag). O(depth).
    pub fn contains(&self, nodes: &[N], id: NodeId) -> bool {
        NodeStore::<T>::is_linked(nodes, id)
            && Some(util::root_of::<T, [N]>(nodes, id)) == self.root
    }

    /// Node count. O(1) with `CONSTANT_TIME_SIZE`, O(n) otherwise.
    pub fn size(&self, nodes: &[N]) -> usize {
        if O::CONSTANT_TIME_SIZE {
            self.len
        } else {
            self.iter(nodes).count()
        }
    }

    pub fn depth(&self, nodes: &[N], id: NodeId) -> usize {
        util::depth::<T, [N]>(nodes, id)
    }

    /// Checks links, order, the balancer invariant, aggregates and count.
    pub fn verify(&self, nodes: &[N]) -> Result<(), TreeError> {
        let actual = bst::verify_links::<T, [N]>(nodes, self.root)?;
        bst::verify_order::<T, [N], _>(nodes, self.root, O::MULTIPLE, |a, b| {
            self.comparator
                .compare(&nodes[a as usize], &nodes[b as usize])
        })?;
        self.balancer.verify::<T, [N]>(nodes, self.root)?;
        bst::verify_augment::<T, [N], A>(nodes, self.root, &self.augment)?;
        if O::CONSTANT_TIME_SIZE && actual != self.len {
            return Err(TreeError::SizeMismatch {
                expected: self.len,
                actual,
            });
        }
        debug!("verified tree of {actual} nodes");
        Ok(())
    }

    fn after_mutation(&self, nodes: &[N]) {
        if !O::DEBUG_VERIFY {
            return;
        }
        if let Err(err) = self.verify(nodes) {
            error!("tree verification failed: {err}");
            panic!("tree invariant violated: {err}");
        }
    }
}

impl<N, T, O, C, A, P> SearchTree<N, WeightBalanced<P>, T, O, C, A>
where
    N: Linked<T, Meta = Weight>,
{
    /// The `k`-th node in order (zero based). O(log n).
    pub fn nth(&self, nodes: &[N], k: usize) -> Option<NodeId> {
        weight_balanced::nth::<T, [N]>(nodes, self.root, k)
    }

    /// Zero-based in-order position of the linked node `id`. O(log n).
    pub fn rank_of(&self, nodes: &[N], id: NodeId) -> usize {
        weight_balanced::rank_of::<T, [N]>(nodes, id)
    }
}
