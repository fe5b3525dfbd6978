use std::fmt;

use crate::augment::Augment;
use crate::error::TreeError;
use crate::types::{NodeId, NodeStore, NodeStoreMut};

/// Balancing strategy plugged into the generic search tree.
///
/// A balancer owns the metadata stored in each link block and keeps its
/// invariant across insertions and removals. Orderings come in through
/// `goes_after`, which tells whether the inserted node belongs after an
/// existing one.
pub trait Balancer {
    type Meta: Default + Clone + fmt::Debug;

    fn insert<T, S, A, F>(
        &mut self,
        store: &mut S,
        root: &mut Option<NodeId>,
        id: NodeId,
        goes_after: F,
        aug: &A,
    ) where
        S: NodeStoreMut<T, Meta = Self::Meta> + ?Sized,
        A: Augment<T, S> + ?Sized,
        F: FnMut(&S, NodeId) -> bool;

    fn remove<T, S, A>(&mut self, store: &mut S, root: &mut Option<NodeId>, id: NodeId, aug: &A)
    where
        S: NodeStoreMut<T, Meta = Self::Meta> + ?Sized,
        A: Augment<T, S> + ?Sized;

    /// Checks the balancer's own invariant. Links and order are checked by
    /// the caller.
    fn verify<T, S>(&self, store: &S, root: Option<NodeId>) -> Result<(), TreeError>
    where
        S: NodeStore<T, Meta = Self::Meta> + ?Sized;
}
