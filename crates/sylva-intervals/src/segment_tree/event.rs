use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;

use sylva::{Links, NodeId, NodeStore, NodeStoreMut};

use super::summary::Summary;
use super::SegmentNode;
use crate::interval::{cmp_keys, Interval};

/// Kind of an interval boundary. The declaration order is the order of
/// events sharing a point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    OpenEnd,
    ClosedStart,
    ClosedEnd,
    OpenStart,
}

impl EventKind {
    pub fn start(closed: bool) -> Self {
        if closed {
            Self::ClosedStart
        } else {
            Self::OpenStart
        }
    }

    pub fn end(closed: bool) -> Self {
        if closed {
            Self::ClosedEnd
        } else {
            Self::OpenEnd
        }
    }

    pub fn is_start(self) -> bool {
        matches!(self, Self::ClosedStart | Self::OpenStart)
    }

    /// Takes effect at its point; the other kinds take effect just after it.
    pub fn applies_at_point(self) -> bool {
        matches!(self, Self::OpenEnd | Self::ClosedStart)
    }
}

/// Position of an event: a point plus the kind that orders events at it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EventKey<K> {
    pub point: K,
    pub kind: EventKind,
}

impl<K: PartialOrd + fmt::Debug> EventKey<K> {
    pub fn new(point: K, kind: EventKind) -> Self {
        Self { point, kind }
    }

    /// Total order over event positions.
    pub fn order(&self, other: &Self) -> Ordering {
        cmp_keys(&self.point, &other.point).then(self.kind.cmp(&other.kind))
    }

    /// No key lies between the two events, so no segment separates them.
    pub(crate) fn same_position(&self, other: &Self) -> bool {
        cmp_keys(&self.point, &other.point) == Ordering::Equal
            && self.kind.applies_at_point() == other.kind.applies_at_point()
    }
}

/// One boundary event embedded in a segment node.
#[derive(Clone, Debug)]
pub struct EventHook<K, V, C, M> {
    pub(crate) links: Links<M>,
    pub(crate) entry: Option<(EventKey<K>, V)>,
    pub(crate) summary: Option<Summary<K, V, C>>,
}

impl<K, V, C, M: Default> Default for EventHook<K, V, C, M> {
    fn default() -> Self {
        Self {
            links: Links::default(),
            entry: None,
            summary: None,
        }
    }
}

/// Link state a node needs to live in a dynamic segment tree: one tree
/// position for its start event and one for its end event.
#[derive(Clone, Debug)]
pub struct SegmentHook<K, V, C, M = sylva::Color> {
    pub(crate) start: EventHook<K, V, C, M>,
    pub(crate) end: EventHook<K, V, C, M>,
}

impl<K, V, C, M: Default> Default for SegmentHook<K, V, C, M> {
    fn default() -> Self {
        Self {
            start: EventHook::default(),
            end: EventHook::default(),
        }
    }
}

impl<K, V, C, M: Default> SegmentHook<K, V, C, M> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K, V, C, M> SegmentHook<K, V, C, M> {
    pub fn is_linked(&self) -> bool {
        self.start.links.is_linked()
    }
}

pub(crate) type HookOf<N, T> = EventHook<
    <N as Interval>::Key,
    <N as SegmentNode<T>>::Value,
    <N as SegmentNode<T>>::Combiner,
    <N as SegmentNode<T>>::Meta,
>;

pub(crate) type SummaryOf<N, T> =
    Summary<<N as Interval>::Key, <N as SegmentNode<T>>::Value, <N as SegmentNode<T>>::Combiner>;

/// Event ids interleave the two events of each node: `2 * node` is the
/// start, `2 * node + 1` the end.
pub(crate) const NODE_LIMIT: NodeId = 1 << 31;

#[inline]
pub(crate) fn start_event(node: NodeId) -> NodeId {
    node << 1
}

#[inline]
pub(crate) fn end_event(node: NodeId) -> NodeId {
    (node << 1) | 1
}

#[inline]
pub(crate) fn owner(event: NodeId) -> NodeId {
    event >> 1
}

#[inline]
pub(crate) fn is_end(event: NodeId) -> bool {
    event & 1 == 1
}

#[inline]
pub(crate) fn hook<T, N: SegmentNode<T>>(nodes: &[N], event: NodeId) -> &HookOf<N, T> {
    let hook = SegmentNode::<T>::segment_hook(&nodes[owner(event) as usize]);
    if is_end(event) {
        &hook.end
    } else {
        &hook.start
    }
}

#[inline]
pub(crate) fn hook_mut<T, N: SegmentNode<T>>(nodes: &mut [N], event: NodeId) -> &mut HookOf<N, T> {
    let hook = SegmentNode::<T>::segment_hook_mut(&mut nodes[owner(event) as usize]);
    if is_end(event) {
        &mut hook.end
    } else {
        &mut hook.start
    }
}

/// Position of an event; `None` when its node is not linked.
#[inline]
pub(crate) fn key_of<T, N: SegmentNode<T>>(nodes: &[N], event: NodeId) -> Option<EventKey<N::Key>> {
    hook::<T, N>(nodes, event).entry.map(|(key, _)| key)
}

/// Summary of the subtree rooted at `event`, from its children's cached
/// summaries.
pub(crate) fn summarize<T, N: SegmentNode<T>>(
    nodes: &[N],
    event: NodeId,
) -> Option<SummaryOf<N, T>> {
    let own = hook::<T, N>(nodes, event);
    let (key, delta) = own.entry?;
    let cached = |child: Option<NodeId>| child.and_then(|c| hook::<T, N>(nodes, c).summary.as_ref());
    Some(Summary::node(
        cached(own.links.left()),
        key,
        delta,
        cached(own.links.right()),
    ))
}

/// Read-only view of the event tree embedded in a node slice.
pub(crate) struct EventView<'a, N, T> {
    pub(crate) nodes: &'a [N],
    _tag: PhantomData<fn() -> T>,
}

impl<'a, N, T> EventView<'a, N, T> {
    pub(crate) fn new(nodes: &'a [N]) -> Self {
        Self {
            nodes,
            _tag: PhantomData,
        }
    }
}

impl<N, T> Clone for EventView<'_, N, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<N, T> Copy for EventView<'_, N, T> {}

impl<N: SegmentNode<T>, T> NodeStore<T> for EventView<'_, N, T> {
    type Meta = N::Meta;

    #[inline]
    fn links(&self, id: NodeId) -> &Links<N::Meta> {
        &hook::<T, N>(self.nodes, id).links
    }
}

/// Mutable event tree handed to the balancer.
pub(crate) struct EventStore<'a, N, T> {
    pub(crate) nodes: &'a mut [N],
    _tag: PhantomData<fn() -> T>,
}

impl<'a, N, T> EventStore<'a, N, T> {
    pub(crate) fn new(nodes: &'a mut [N]) -> Self {
        Self {
            nodes,
            _tag: PhantomData,
        }
    }
}

impl<N: SegmentNode<T>, T> EventStore<'_, N, T> {
    pub(crate) fn key(&self, event: NodeId) -> Option<EventKey<N::Key>> {
        key_of::<T, N>(self.nodes, event)
    }
}

impl<N: SegmentNode<T>, T> NodeStore<T> for EventStore<'_, N, T> {
    type Meta = N::Meta;

    #[inline]
    fn links(&self, id: NodeId) -> &Links<N::Meta> {
        &hook::<T, N>(self.nodes, id).links
    }
}

impl<N: SegmentNode<T>, T> NodeStoreMut<T> for EventStore<'_, N, T> {
    #[inline]
    fn links_mut(&mut self, id: NodeId) -> &mut Links<N::Meta> {
        &mut hook_mut::<T, N>(self.nodes, id).links
    }
}
