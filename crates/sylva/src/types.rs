/// Index of a node inside the caller's node slice.
pub type NodeId = u32;

/// Tag for nodes that take part in a single tree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DefaultTag;

/// Link block embedded in a node, one per tree membership.
///
/// `M` is the balancer's per-node metadata (color, weight or rank).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Links<M> {
    pub(crate) p: Option<NodeId>,
    pub(crate) l: Option<NodeId>,
    pub(crate) r: Option<NodeId>,
    pub(crate) linked: bool,
    pub(crate) meta: M,
}

impl<M: Default> Links<M> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<M> Links<M> {
    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.p
    }

    #[inline]
    pub fn left(&self) -> Option<NodeId> {
        self.l
    }

    #[inline]
    pub fn right(&self) -> Option<NodeId> {
        self.r
    }

    #[inline]
    pub fn is_linked(&self) -> bool {
        self.linked
    }

    #[inline]
    pub fn meta(&self) -> &M {
        &self.meta
    }
}

/// Exposes the link block a node reserves for trees tagged `T`.
pub trait Linked<T = DefaultTag> {
    type Meta;

    fn links(&self) -> &Links<Self::Meta>;
    fn links_mut(&mut self) -> &mut Links<Self::Meta>;
}

/// Read access to link blocks by node id.
///
/// Implemented for `[N]` whenever `N: Linked<T>`; other stores (such as the
/// two events a segment tree keeps per node) implement it directly.
pub trait NodeStore<T> {
    type Meta;

    fn links(&self, id: NodeId) -> &Links<Self::Meta>;

    #[inline]
    fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.links(id).p
    }

    #[inline]
    fn left(&self, id: NodeId) -> Option<NodeId> {
        self.links(id).l
    }

    #[inline]
    fn right(&self, id: NodeId) -> Option<NodeId> {
        self.links(id).r
    }

    #[inline]
    fn meta(&self, id: NodeId) -> &Self::Meta {
        &self.links(id).meta
    }

    #[inline]
    fn is_linked(&self, id: NodeId) -> bool {
        self.links(id).linked
    }
}

pub trait NodeStoreMut<T>: NodeStore<T> {
    fn links_mut(&mut self, id: NodeId) -> &mut Links<Self::Meta>;

    #[inline]
    fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) {
        self.links_mut(id).p = parent;
    }

    #[inline]
    fn set_left(&mut self, id: NodeId, left: Option<NodeId>) {
        self.links_mut(id).l = left;
    }

    #[inline]
    fn set_right(&mut self, id: NodeId, right: Option<NodeId>) {
        self.links_mut(id).r = right;
    }

    #[inline]
    fn meta_mut(&mut self, id: NodeId) -> &mut Self::Meta {
        &mut self.links_mut(id).meta
    }
}

impl<T, N: Linked<T>> NodeStore<T> for [N] {
    type Meta = N::Meta;

    #[inline]
    fn links(&self, id: NodeId) -> &Links<N::Meta> {
        Linked::<T>::links(&self[id as usize])
    }
}

impl<T, N: Linked<T>> NodeStoreMut<T> for [N] {
    #[inline]
    fn links_mut(&mut self, id: NodeId) -> &mut Links<N::Meta> {
        Linked::<T>::links_mut(&mut self[id as usize])
    }
}
