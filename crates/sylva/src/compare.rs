use std::cmp::Ordering;

/// Nodes that expose a sort key.
pub trait Keyed {
    type Key: ?Sized;

    fn key(&self) -> &Self::Key;
}

/// Strict weak ordering over nodes.
pub trait Compare<N: ?Sized> {
    fn compare(&self, a: &N, b: &N) -> Ordering;
}

/// Ordering of a lookup key relative to a node, consistent with the tree's
/// [`Compare`].
pub trait Lookup<Q: ?Sized, N: ?Sized> {
    fn compare_key(&self, key: &Q, node: &N) -> Ordering;
}

/// Orders nodes by [`Keyed::key`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ByKey;

impl<N> Compare<N> for ByKey
where
    N: Keyed,
    N::Key: Ord,
{
    #[inline]
    fn compare(&self, a: &N, b: &N) -> Ordering {
        a.key().cmp(b.key())
    }
}

impl<N> Lookup<N::Key, N> for ByKey
where
    N: Keyed,
    N::Key: Ord,
{
    #[inline]
    fn compare_key(&self, key: &N::Key, node: &N) -> Ordering {
        key.cmp(node.key())
    }
}

impl<N, F> Compare<N> for F
where
    F: Fn(&N, &N) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &N, b: &N) -> Ordering {
        self(a, b)
    }
}
