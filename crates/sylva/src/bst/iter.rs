use std::iter::FusedIterator;
use std::marker::PhantomData;

use crate::types::{NodeId, NodeStore};
use crate::util::{last, next, prev, root_of};

/// In-order iterator over node ids between two live nodes (inclusive).
///
/// Walks parent/child links only, so it needs no stack and is cheap to
/// clone or restart.
pub struct Iter<'a, T, S: ?Sized> {
    store: &'a S,
    front: Option<NodeId>,
    back: Option<NodeId>,
    /// `back` is meaningful. Unbounded iterators find it on first use.
    bounded: bool,
    _tag: PhantomData<fn() -> T>,
}

impl<'a, T, S: ?Sized> Iter<'a, T, S> {
    /// `front` and `back` must both be `None` or both belong to one tree
    /// with `front` not after `back`.
    pub fn new(store: &'a S, front: Option<NodeId>, back: Option<NodeId>) -> Self {
        Self {
            store,
            front,
            back,
            bounded: true,
            _tag: PhantomData,
        }
    }

    /// Runs from `front` to the end of its tree. O(1); the back end is
    /// located only if the iterator is driven from the back.
    pub fn from_front(store: &'a S, front: Option<NodeId>) -> Self {
        Self {
            store,
            front,
            back: None,
            bounded: false,
            _tag: PhantomData,
        }
    }
}

impl<T, S: ?Sized> Clone for Iter<'_, T, S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store,
            front: self.front,
            back: self.back,
            bounded: self.bounded,
            _tag: PhantomData,
        }
    }
}

impl<T, S: NodeStore<T> + ?Sized> Iterator for Iter<'_, T, S> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let curr = self.front?;
        if self.bounded && self.front == self.back {
            self.front = None;
            self.back = None;
        } else {
            self.front = next::<T, S>(self.store, curr);
        }
        Some(curr)
    }
}

impl<T, S: NodeStore<T> + ?Sized> DoubleEndedIterator for Iter<'_, T, S> {
    fn next_back(&mut self) -> Option<NodeId> {
        if !self.bounded {
            let front = self.front?;
            self.back = last::<T, S>(self.store, Some(root_of::<T, S>(self.store, front)));
            self.bounded = true;
        }
        let curr = self.back?;
        if self.front == self.back {
            self.front = None;
            self.back = None;
        } else {
            self.back = prev::<T, S>(self.store, curr);
        }
        Some(curr)
    }
}

impl<T, S: NodeStore<T> + ?Sized> FusedIterator for Iter<'_, T, S> {}
