use std::iter::FusedIterator;
use std::marker::PhantomData;

use sylva::{Linked, NodeId};

use super::IntervalNode;
use crate::interval::{self, Bounds, Interval};

/// Overlap query iterator.
///
/// Walks the tree through parent links, skipping subtrees whose cached
/// max-upper endpoint ends before the probe starts, and stops at the first
/// node that starts after the probe ends.
pub struct Overlaps<'a, N: Interval, T> {
    nodes: &'a [N],
    probe: Bounds<N::Key>,
    next: Option<NodeId>,
    _tag: PhantomData<fn() -> T>,
}

impl<'a, N, T> Overlaps<'a, N, T>
where
    N: IntervalNode<T>,
{
    pub(crate) fn new(nodes: &'a [N], root: Option<NodeId>, probe: Bounds<N::Key>) -> Self {
        let mut iter = Self {
            nodes,
            probe,
            next: None,
            _tag: PhantomData,
        };
        if !interval::is_empty(&probe) {
            iter.next = iter.reaching(root).map(|n| iter.leftmost(n));
        }
        iter
    }

    /// `id` if its subtree reaches the probe's lower endpoint.
    fn reaching(&self, id: Option<NodeId>) -> Option<NodeId> {
        id.filter(|&n| {
            self.nodes[n as usize]
                .max_upper()
                .get()
                .is_some_and(|upper| upper.reaches(&self.probe.lower, self.probe.lower_closed))
        })
    }

    fn left(&self, id: NodeId) -> Option<NodeId> {
        Linked::<T>::links(&self.nodes[id as usize]).left()
    }

    fn right(&self, id: NodeId) -> Option<NodeId> {
        Linked::<T>::links(&self.nodes[id as usize]).right()
    }

    fn parent(&self, id: NodeId) -> Option<NodeId> {
        Linked::<T>::links(&self.nodes[id as usize]).parent()
    }

    fn leftmost(&self, mut id: NodeId) -> NodeId {
        while let Some(l) = self.reaching(self.left(id)) {
            id = l;
        }
        id
    }

    /// In-order successor restricted to subtrees that reach the probe.
    fn advance(&self, from: NodeId) -> Option<NodeId> {
        if let Some(r) = self.reaching(self.right(from)) {
            return Some(self.leftmost(r));
        }
        let mut curr = from;
        while let Some(p) = self.parent(curr) {
            if self.left(p) == Some(curr) {
                return Some(p);
            }
            curr = p;
        }
        None
    }
}

impl<N, T> Clone for Overlaps<'_, N, T>
where
    N: Interval,
{
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes,
            probe: self.probe,
            next: self.next,
            _tag: PhantomData,
        }
    }
}

impl<N, T> Iterator for Overlaps<'_, N, T>
where
    N: IntervalNode<T>,
{
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some(id) = self.next {
            let node = &self.nodes[id as usize];
            let starts_in_time = interval::starts_before_end(
                &node.lower(),
                node.is_lower_closed(),
                &self.probe.upper,
                self.probe.upper_closed,
            );
            if !starts_in_time {
                self.next = None;
                return None;
            }
            self.next = self.advance(id);
            if interval::overlaps(node, &self.probe) {
                return Some(id);
            }
        }
        None
    }
}

impl<N, T> FusedIterator for Overlaps<'_, N, T> where N: IntervalNode<T> {}
