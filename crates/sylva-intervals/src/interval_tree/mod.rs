//! Interval tree: a red-black tree ordered by lower endpoint whose nodes
//! cache the furthest-reaching upper endpoint of their subtree.

mod overlaps;

pub use overlaps::Overlaps;

use std::cmp::Ordering;
use std::marker::PhantomData;

use log::trace;
use sylva::{
    Color, Combined, Combiner, Compare, DefaultOptions, DefaultTag, Linked, NodeId, RbTree,
    TreeError, TreeOptions,
};

use crate::error::IntervalError;
use crate::interval::{self, cmp_lower, Bounds, Interval, UpperEndpoint};

/// Cached max-upper aggregate of a subtree. `None` until first linked.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaxUpper<K>(pub(crate) Option<UpperEndpoint<K>>);

impl<K> Default for MaxUpper<K> {
    fn default() -> Self {
        Self(None)
    }
}

impl<K: Copy> MaxUpper<K> {
    pub fn get(&self) -> Option<UpperEndpoint<K>> {
        self.0
    }
}

/// Node stored in an [`IntervalTree`] under tag `T`.
///
/// The node provides a red-black link block through `Linked<T>` and a slot
/// for the subtree aggregate.
pub trait IntervalNode<T = DefaultTag>: Interval + Linked<T, Meta = Color> {
    fn max_upper(&self) -> &MaxUpper<Self::Key>;
    fn max_upper_mut(&mut self) -> &mut MaxUpper<Self::Key>;
}

/// Orders nodes by lower endpoint, closed before open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ByLower;

impl<N: Interval> Compare<N> for ByLower {
    fn compare(&self, a: &N, b: &N) -> Ordering {
        cmp_lower(a, b)
    }
}

/// Combines upper endpoints: the aggregate reaches as far as the furthest
/// interval in the subtree.
pub struct MaxUpperCombiner<T = DefaultTag>(PhantomData<fn() -> T>);

impl<T> Default for MaxUpperCombiner<T> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<T, N: IntervalNode<T>> Combiner<N> for MaxUpperCombiner<T> {
    type Value = MaxUpper<N::Key>;

    fn contribution(&self, node: &N) -> MaxUpper<N::Key> {
        MaxUpper(Some(UpperEndpoint::of(node)))
    }

    fn combine(
        &self,
        left: Option<&MaxUpper<N::Key>>,
        own: MaxUpper<N::Key>,
        right: Option<&MaxUpper<N::Key>>,
    ) -> MaxUpper<N::Key> {
        let mut best = own.0;
        for side in [left, right].into_iter().flatten() {
            best = match (best, side.0) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (a, b) => a.or(b),
            };
        }
        MaxUpper(best)
    }

    fn value<'a>(&self, node: &'a N) -> &'a MaxUpper<N::Key> {
        node.max_upper()
    }

    fn store(&self, node: &mut N, value: MaxUpper<N::Key>) {
        *node.max_upper_mut() = value;
    }
}

type Inner<N, T, O> = RbTree<N, T, O, ByLower, Combined<MaxUpperCombiner<T>>>;

/// Intrusive interval tree over a caller-owned node slice.
pub struct IntervalTree<N, T = DefaultTag, O = DefaultOptions> {
    tree: Inner<N, T, O>,
}

impl<N, T, O> Default for IntervalTree<N, T, O> {
    fn default() -> Self {
        Self {
            tree: Inner::default(),
        }
    }
}

impl<N, T, O> IntervalTree<N, T, O>
where
    N: IntervalNode<T>,
    O: TreeOptions,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Links `id`. Its interval must not be malformed (`lower > upper`).
    pub fn insert(&mut self, nodes: &mut [N], id: NodeId) {
        debug_assert!(
            !interval::is_malformed(&nodes[id as usize]),
            "node {id} holds a malformed interval"
        );
        self.tree.insert(nodes, id);
        trace!("interval node {id} linked");
    }

    pub fn try_insert(&mut self, nodes: &mut [N], id: NodeId) -> Result<(), IntervalError> {
        if interval::is_malformed(&nodes[id as usize]) {
            return Err(IntervalError::Malformed(id));
        }
        self.tree.try_insert(nodes, id)?;
        trace!("interval node {id} linked");
        Ok(())
    }

    pub fn remove(&mut self, nodes: &mut [N], id: NodeId) {
        self.tree.remove(nodes, id);
        trace!("interval node {id} unlinked");
    }

    pub fn try_remove(&mut self, nodes: &mut [N], id: NodeId) -> Result<(), IntervalError> {
        self.tree.try_remove(nodes, id)?;
        trace!("interval node {id} unlinked");
        Ok(())
    }

    /// Lazily yields every linked node whose interval overlaps `probe`, in
    /// lower-endpoint order.
    pub fn query<'a, Q>(&self, nodes: &'a [N], probe: &Q) -> Overlaps<'a, N, T>
    where
        Q: Interval<Key = N::Key>,
    {
        Overlaps::new(nodes, self.tree.root(), Bounds::of(probe))
    }

    /// Nodes containing `key`.
    pub fn stabbing<'a>(&self, nodes: &'a [N], key: N::Key) -> Overlaps<'a, N, T> {
        Overlaps::new(nodes, self.tree.root(), Bounds::point(key))
    }

    /// Furthest upper endpoint over all linked intervals.
    pub fn max_upper(&self, nodes: &[N]) -> Option<UpperEndpoint<N::Key>> {
        self.tree
            .root()
            .and_then(|r| nodes[r as usize].max_upper().get())
    }

    pub fn iter<'a>(&self, nodes: &'a [N]) -> sylva::Iter<'a, T, [N]> {
        self.tree.iter(nodes)
    }

    pub fn size(&self, nodes: &[N]) -> usize {
        self.tree.size(nodes)
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn contains(&self, nodes: &[N], id: NodeId) -> bool {
        self.tree.contains(nodes, id)
    }

    pub fn clear(&mut self, nodes: &mut [N]) {
        self.tree.clear(nodes);
    }

    pub fn verify(&self, nodes: &[N]) -> Result<(), TreeError> {
        self.tree.verify(nodes)
    }

    /// The underlying red-black tree.
    pub fn inner(&self) -> &Inner<N, T, O> {
        &self.tree
    }
}
