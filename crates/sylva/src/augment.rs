//! Subtree aggregates maintained alongside the tree structure.

use crate::types::{Linked, NodeId, NodeStore};

/// Hook invoked whenever the children of a node may have changed.
///
/// Trees call `rebuild` on every node whose subtree changed, children
/// before parents, and on both nodes of a rotation (lower one first).
pub trait Augment<T, S: ?Sized + NodeStore<T>> {
    /// Recomputes the cached value of `id`. Returns whether it changed.
    fn rebuild(&self, store: &mut S, id: NodeId) -> bool;

    /// Whether the cached value of `id` matches a fresh recomputation.
    fn check(&self, store: &S, id: NodeId) -> bool;
}

/// No aggregate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoAugment;

impl<T, S: ?Sized + NodeStore<T>> Augment<T, S> for NoAugment {
    #[inline]
    fn rebuild(&self, _store: &mut S, _id: NodeId) -> bool {
        false
    }

    #[inline]
    fn check(&self, _store: &S, _id: NodeId) -> bool {
        true
    }
}

impl<T, S, A, B> Augment<T, S> for (A, B)
where
    S: ?Sized + NodeStore<T>,
    A: Augment<T, S>,
    B: Augment<T, S>,
{
    fn rebuild(&self, store: &mut S, id: NodeId) -> bool {
        let a = self.0.rebuild(store, id);
        let b = self.1.rebuild(store, id);
        a | b
    }

    fn check(&self, store: &S, id: NodeId) -> bool {
        self.0.check(store, id) && self.1.check(store, id)
    }
}

impl<T, S, A, B, C> Augment<T, S> for (A, B, C)
where
    S: ?Sized + NodeStore<T>,
    A: Augment<T, S>,
    B: Augment<T, S>,
    C: Augment<T, S>,
{
    fn rebuild(&self, store: &mut S, id: NodeId) -> bool {
        let a = self.0.rebuild(store, id);
        let b = self.1.rebuild(store, id);
        let c = self.2.rebuild(store, id);
        a | b | c
    }

    fn check(&self, store: &S, id: NodeId) -> bool {
        self.0.check(store, id) && self.1.check(store, id) && self.2.check(store, id)
    }
}

/// A per-node aggregate cached in the node itself.
///
/// `value(n) = combine(value(n.left), contribution(n), value(n.right))`.
pub trait Combiner<N> {
    type Value: PartialEq;

    fn contribution(&self, node: &N) -> Self::Value;

    fn combine(
        &self,
        left: Option<&Self::Value>,
        own: Self::Value,
        right: Option<&Self::Value>,
    ) -> Self::Value;

    /// The cached value stored in `node`.
    fn value<'a>(&self, node: &'a N) -> &'a Self::Value;

    fn store(&self, node: &mut N, value: Self::Value);
}

/// Adapts a [`Combiner`] to the [`Augment`] hook of trees over `[N]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Combined<C>(pub C);

impl<C> Combined<C> {
    pub fn new(combiner: C) -> Self {
        Self(combiner)
    }

    pub fn combiner(&self) -> &C {
        &self.0
    }

    fn compute<T, N>(&self, store: &[N], id: NodeId) -> C::Value
    where
        N: Linked<T>,
        C: Combiner<N>,
    {
        let node = &store[id as usize];
        let links = Linked::<T>::links(node);
        let left = links.left().map(|l| self.0.value(&store[l as usize]));
        let right = links.right().map(|r| self.0.value(&store[r as usize]));
        self.0.combine(left, self.0.contribution(node), right)
    }
}

impl<T, N, C> Augment<T, [N]> for Combined<C>
where
    N: Linked<T>,
    C: Combiner<N>,
{
    fn rebuild(&self, store: &mut [N], id: NodeId) -> bool {
        let value = self.compute::<T, N>(store, id);
        let node = &mut store[id as usize];
        if *self.0.value(node) == value {
            return false;
        }
        self.0.store(node, value);
        true
    }

    fn check(&self, store: &[N], id: NodeId) -> bool {
        *self.0.value(&store[id as usize]) == self.compute::<T, N>(store, id)
    }
}
