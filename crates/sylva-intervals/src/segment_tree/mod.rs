//! Dynamic segment tree over intervals with additive values.
//!
//! Each linked node contributes a start event (`+value`) and an end event
//! (`-value`) to one balanced tree ordered by event position. The value at
//! a key is the prefix sum of the deltas before it, and every event caches
//! a summary of its subtree so point and range queries take O(log n).
//! Segment boundaries exist only where events do, so removing an interval
//! merges the segments it separated without any extra step.

mod combiner;
mod event;
mod iter;
mod summary;

pub use combiner::{MaxCombiner, RangedMaxCombiner, Segment, SegmentCombiner};
pub use event::{EventHook, EventKey, EventKind, SegmentHook};
pub use iter::{Event, EventIter, Segments};

use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Add, Neg};

use log::{debug, error, trace};
use sylva::{
    bst, util, Augment, Balancer, DefaultOptions, DefaultTag, NodeId, NodeStore, RedBlack,
    TreeError, TreeOptions, WeightBalanced,
};

use self::event::{
    end_event, hook, hook_mut, key_of, start_event, summarize, EventStore, EventView, SummaryOf,
    NODE_LIMIT,
};
use self::summary::Summary;
use crate::error::IntervalError;
use crate::interval::{self, Interval};

/// Values that can be attached to intervals.
pub trait SegmentValue:
    Copy + Default + PartialOrd + fmt::Debug + Add<Output = Self> + Neg<Output = Self>
{
}

impl<V> SegmentValue for V where
    V: Copy + Default + PartialOrd + fmt::Debug + Add<Output = V> + Neg<Output = V>
{
}

/// Node stored in a [`DynamicSegmentTree`] under tag `T`.
pub trait SegmentNode<T = DefaultTag>: Interval {
    type Value: SegmentValue;
    type Combiner: SegmentCombiner<Self::Key, Self::Value>;
    /// Balancer metadata of the two event link blocks.
    type Meta: Default + Clone + fmt::Debug;

    fn value(&self) -> Self::Value;

    fn segment_hook(&self) -> &SegmentHook<Self::Key, Self::Value, Self::Combiner, Self::Meta>;

    fn segment_hook_mut(
        &mut self,
    ) -> &mut SegmentHook<Self::Key, Self::Value, Self::Combiner, Self::Meta>;
}

/// Rebuilds event summaries for the balancer.
#[derive(Clone, Copy, Debug, Default)]
struct SummaryAugment;

impl<'a, T, N: SegmentNode<T>> Augment<T, EventStore<'a, N, T>> for SummaryAugment {
    fn rebuild(&self, store: &mut EventStore<'a, N, T>, id: NodeId) -> bool {
        let summary = summarize::<T, N>(store.nodes, id);
        hook_mut::<T, N>(store.nodes, id).summary = summary;
        true
    }

    fn check(&self, store: &EventStore<'a, N, T>, id: NodeId) -> bool {
        summarize::<T, N>(store.nodes, id) == hook::<T, N>(store.nodes, id).summary
    }
}

/// Upper limit of a range query over event positions.
#[derive(Clone, Copy)]
enum Limit<K> {
    Through(EventKey<K>),
    Before(EventKey<K>),
}

impl<K: PartialOrd + fmt::Debug> Limit<K> {
    fn admits(&self, key: &EventKey<K>) -> bool {
        match self {
            Self::Through(limit) => key.order(limit) != Ordering::Greater,
            Self::Before(limit) => key.order(limit) == Ordering::Less,
        }
    }
}

/// Positions of the start and end events of `node`. Empty intervals get
/// both events at the start position so their deltas cancel in place.
fn event_keys<T, N: SegmentNode<T>>(node: &N) -> (EventKey<N::Key>, EventKey<N::Key>) {
    let start = EventKey::new(node.lower(), EventKind::start(node.is_lower_closed()));
    let end = EventKey::new(node.upper(), EventKind::end(node.is_upper_closed()));
    if end.order(&start) == Ordering::Less {
        (start, start)
    } else {
        (start, end)
    }
}

/// Intrusive dynamic segment tree. `B` balances the event tree.
///
/// Node ids must stay below `2^31`. A weight-balanced event tree reads its
/// parameters from its own options type, see [`WbSegmentTree`].
pub struct DynamicSegmentTree<N, B = RedBlack, T = DefaultTag, O = DefaultOptions> {
    root: Option<NodeId>,
    len: usize,
    balancer: B,
    _marker: PhantomData<fn() -> (N, T, O)>,
}

/// Segment tree whose weight-balanced event tree uses the parameters of `O`.
pub type WbSegmentTree<N, T = DefaultTag, O = DefaultOptions> =
    DynamicSegmentTree<N, WeightBalanced<O>, T, O>;

impl<N, B: Default, T, O> Default for DynamicSegmentTree<N, B, T, O> {
    fn default() -> Self {
        Self::with_balancer(B::default())
    }
}

impl<N, B, T, O> DynamicSegmentTree<N, B, T, O> {
    pub fn new() -> Self
    where
        B: Default,
    {
        Self::default()
    }

    pub fn with_balancer(balancer: B) -> Self {
        Self {
            root: None,
            len: 0,
            balancer,
            _marker: PhantomData,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of linked intervals.
    pub fn size(&self) -> usize {
        self.len
    }
}

impl<N, B, T, O> DynamicSegmentTree<N, B, T, O>
where
    N: SegmentNode<T>,
    B: Balancer<Meta = N::Meta>,
    O: TreeOptions,
{
    /// Links the interval of node `id` with its current value.
    ///
    /// The interval must not be malformed and the node must not be linked.
    /// Its bounds and value must stay unchanged while it is linked.
    pub fn insert(&mut self, nodes: &mut [N], id: NodeId) {
        debug_assert!(id < NODE_LIMIT, "node {id} is beyond the id range");
        let node = &nodes[id as usize];
        debug_assert!(
            !interval::is_malformed(node),
            "node {id} holds a malformed interval"
        );
        debug_assert!(
            !node.segment_hook().is_linked(),
            "node {id} is already linked"
        );
        let value = node.value();
        let (start, end) = event_keys::<T, N>(node);
        {
            let hook = SegmentNode::<T>::segment_hook_mut(&mut nodes[id as usize]);
            hook.start.entry = Some((start, value));
            hook.end.entry = Some((end, -value));
        }

        let mut store = EventStore::<N, T>::new(nodes);
        for (event, key) in [(start_event(id), start), (end_event(id), end)] {
            self.balancer.insert::<T, EventStore<'_, N, T>, SummaryAugment, _>(
                &mut store,
                &mut self.root,
                event,
                |events, existing| {
                    events
                        .key(existing)
                        .map_or(true, |other| key.order(&other) != Ordering::Less)
                },
                &SummaryAugment,
            );
        }
        self.len += 1;
        trace!("linked events of segment node {id}");
        self.after_mutation(nodes);
    }

    pub fn try_insert(&mut self, nodes: &mut [N], id: NodeId) -> Result<(), IntervalError> {
        if id >= NODE_LIMIT {
            return Err(IntervalError::IdOutOfRange(id));
        }
        let node = &nodes[id as usize];
        if interval::is_malformed(node) {
            return Err(IntervalError::Malformed(id));
        }
        if SegmentNode::<T>::segment_hook(node).is_linked() {
            return Err(TreeError::AlreadyLinked(id).into());
        }
        self.insert(nodes, id);
        Ok(())
    }

    /// Unlinks the interval of node `id`, which must be linked here.
    pub fn remove(&mut self, nodes: &mut [N], id: NodeId) {
        debug_assert!(
            SegmentNode::<T>::segment_hook(&nodes[id as usize]).is_linked(),
            "node {id} is not linked"
        );
        let mut store = EventStore::<N, T>::new(nodes);
        for event in [start_event(id), end_event(id)] {
            self.balancer.remove::<T, EventStore<'_, N, T>, SummaryAugment>(
                &mut store,
                &mut self.root,
                event,
                &SummaryAugment,
            );
        }
        let segment = SegmentNode::<T>::segment_hook_mut(&mut nodes[id as usize]);
        for hook in [&mut segment.start, &mut segment.end] {
            hook.entry = None;
            hook.summary = None;
        }
        self.len = self.len.saturating_sub(1);
        trace!("unlinked events of segment node {id}");
        self.after_mutation(nodes);
    }

    pub fn try_remove(&mut self, nodes: &mut [N], id: NodeId) -> Result<(), IntervalError> {
        if !SegmentNode::<T>::segment_hook(&nodes[id as usize]).is_linked() {
            return Err(TreeError::NotLinked(id).into());
        }
        if !self.contains(nodes, id) {
            return Err(TreeError::NotMember(id).into());
        }
        self.remove(nodes, id);
        Ok(())
    }

    /// Whether node `id` is linked into this tree.
    pub fn contains(&self, nodes: &[N], id: NodeId) -> bool {
        let view = EventView::<N, T>::new(nodes);
        view.is_linked(start_event(id))
            && Some(util::root_of::<T, _>(&view, start_event(id))) == self.root
    }

    /// Unlinks every interval.
    pub fn clear(&mut self, nodes: &mut [N]) {
        let mut store = EventStore::<N, T>::new(nodes);
        bst::unlink_all::<T, EventStore<'_, N, T>, _>(&mut store, self.root, |events, id| {
            let event = hook_mut::<T, N>(events.nodes, id);
            event.entry = None;
            event.summary = None;
        });
        self.root = None;
        self.len = 0;
    }

    /// Summed value of the intervals containing `key`.
    pub fn query(&self, nodes: &[N], key: N::Key) -> N::Value {
        self.prefix_through(nodes, &EventKey::new(key, EventKind::ClosedStart))
    }

    /// Combiner over every elementary segment between the first and the
    /// last event. Empty when no interval is linked.
    pub fn combined(&self, nodes: &[N]) -> N::Combiner {
        self.root
            .and_then(|r| hook::<T, N>(nodes, r).summary.as_ref())
            .map_or_else(N::Combiner::empty, |s| s.combiner.clone())
    }

    /// Combiner over the keys of `range`, including the partial segments
    /// at its borders. Empty for an empty range.
    pub fn combined_in<I>(&self, nodes: &[N], range: &I) -> N::Combiner
    where
        I: Interval<Key = N::Key>,
    {
        if interval::is_empty(range) {
            return N::Combiner::empty();
        }
        let from = EventKey::new(range.lower(), EventKind::start(range.is_lower_closed()));
        let limit = if range.is_upper_closed() {
            Limit::Through(EventKey::new(range.upper(), EventKind::ClosedStart))
        } else {
            Limit::Before(EventKey::new(range.upper(), EventKind::OpenEnd))
        };
        let base = self.prefix_through(nodes, &from);
        let whole = Segment {
            lower: range.lower(),
            upper: range.upper(),
            lower_closed: range.is_lower_closed(),
            upper_closed: range.is_upper_closed(),
        };

        match self.fold(nodes, self.root, Some(&from), Some(&limit)) {
            None => N::Combiner::segment(base, whole),
            Some(inside) => {
                let head = Segment {
                    upper: inside.first.point,
                    upper_closed: !inside.first.kind.applies_at_point(),
                    ..whole
                };
                let tail = Segment {
                    lower: inside.last.point,
                    lower_closed: inside.last.kind.applies_at_point(),
                    ..whole
                };
                N::Combiner::segment(base, head)
                    .then(&inside.combiner.shifted(base))
                    .then(&N::Combiner::segment(base + inside.sum, tail))
            }
        }
    }

    /// Elementary segments with their values, in key order.
    pub fn segments<'a>(&self, nodes: &'a [N]) -> Segments<'a, N, T> {
        Segments::new(nodes, self.root)
    }

    /// Start and end events in position order.
    pub fn events<'a>(&self, nodes: &'a [N]) -> EventIter<'a, N, T> {
        EventIter::new(nodes, self.root)
    }

    /// Events positioned at `key` or later: the first is the lowest event
    /// whose point is not below `key`.
    pub fn events_from<'a>(&self, nodes: &'a [N], key: N::Key) -> EventIter<'a, N, T> {
        let view = EventView::<N, T>::new(nodes);
        let sought = EventKey::new(key, EventKind::OpenEnd);
        let start = bst::lower_bound_by::<T, _, _>(&view, self.root, |id| {
            key_of::<T, N>(nodes, id).map_or(Ordering::Less, |k| sought.order(&k))
        });
        EventIter::starting_at(nodes, start)
    }

    /// Events whose point lies strictly above `key`.
    pub fn events_after<'a>(&self, nodes: &'a [N], key: N::Key) -> EventIter<'a, N, T> {
        let view = EventView::<N, T>::new(nodes);
        let sought = EventKey::new(key, EventKind::OpenStart);
        let start = bst::upper_bound_by::<T, _, _>(&view, self.root, |id| {
            key_of::<T, N>(nodes, id).map_or(Ordering::Less, |k| sought.order(&k))
        });
        EventIter::starting_at(nodes, start)
    }

    /// Checks event links, order, the balancer invariant, every cached
    /// summary and the interval count.
    pub fn verify(&self, nodes: &[N]) -> Result<(), IntervalError> {
        let view = EventView::<N, T>::new(nodes);
        let events = bst::verify_links::<T, _>(&view, self.root)?;
        let position = |id| key_of::<T, N>(nodes, id);
        bst::verify_order::<T, _, _>(&view, self.root, true, |a, b| {
            match (position(a), position(b)) {
                (Some(a), Some(b)) => a.order(&b),
                _ => Ordering::Greater,
            }
        })?;
        self.balancer.verify::<T, _>(&view, self.root)?;

        let mut curr = util::first::<T, _>(&view, self.root);
        while let Some(id) = curr {
            if summarize::<T, N>(nodes, id) != hook::<T, N>(nodes, id).summary {
                return Err(IntervalError::StaleSummary(id));
            }
            curr = util::next::<T, _>(&view, id);
        }
        if events != 2 * self.len {
            return Err(TreeError::SizeMismatch {
                expected: 2 * self.len,
                actual: events,
            }
            .into());
        }
        debug!("verified segment tree of {} intervals", self.len);
        Ok(())
    }

    /// Sum of the deltas of every event positioned at or before `through`.
    fn prefix_through(&self, nodes: &[N], through: &EventKey<N::Key>) -> N::Value {
        let view = EventView::<N, T>::new(nodes);
        let mut acc = N::Value::default();
        let mut curr = self.root;
        while let Some(id) = curr {
            let Some((key, delta)) = hook::<T, N>(nodes, id).entry else {
                break;
            };
            if key.order(through) == Ordering::Greater {
                curr = view.left(id);
            } else {
                let left = view
                    .left(id)
                    .and_then(|l| hook::<T, N>(nodes, l).summary.as_ref())
                    .map_or_else(N::Value::default, |s| s.sum);
                acc = acc + left + delta;
                curr = view.right(id);
            }
        }
        acc
    }

    /// Summary of the events strictly after `from` and admitted by `limit`
    /// within the subtree at `id`. Cached summaries cover whole subtrees,
    /// so only the two boundary paths are visited.
    fn fold(
        &self,
        nodes: &[N],
        id: Option<NodeId>,
        from: Option<&EventKey<N::Key>>,
        limit: Option<&Limit<N::Key>>,
    ) -> Option<SummaryOf<N, T>> {
        let id = id?;
        let own = hook::<T, N>(nodes, id);
        if from.is_none() && limit.is_none() {
            return own.summary.clone();
        }
        let (key, delta) = own.entry?;
        let (left, right) = (own.links.left(), own.links.right());
        if from.is_some_and(|f| key.order(f) != Ordering::Greater) {
            return self.fold(nodes, right, from, limit);
        }
        if limit.is_some_and(|l| !l.admits(&key)) {
            return self.fold(nodes, left, from, limit);
        }
        let before = self.fold(nodes, left, from, None);
        let after = self.fold(nodes, right, None, limit);
        Some(Summary::node(before.as_ref(), key, delta, after.as_ref()))
    }

    fn after_mutation(&self, nodes: &[N]) {
        if !O::DEBUG_VERIFY {
            return;
        }
        if let Err(err) = self.verify(nodes) {
            error!("segment tree verification failed: {err}");
            panic!("segment tree invariant violated: {err}");
        }
    }
}
