use std::iter::FusedIterator;

use sylva::{util, NodeId};

use super::combiner::Segment;
use super::event::{self, EventKey, EventView};
use super::SegmentNode;

/// A start or end event as seen by [`EventIter`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Event<K, V> {
    /// Node the event belongs to.
    pub node: NodeId,
    pub is_start: bool,
    /// Ordering position. An empty interval reports both of its events at
    /// its start position.
    pub key: EventKey<K>,
    /// `+value` for a start, `-value` for an end.
    pub delta: V,
}

/// Every linked event in position order.
pub struct EventIter<'a, N, T> {
    view: EventView<'a, N, T>,
    next: Option<NodeId>,
}

impl<'a, N: SegmentNode<T>, T> EventIter<'a, N, T> {
    pub(crate) fn new(nodes: &'a [N], root: Option<NodeId>) -> Self {
        let view = EventView::new(nodes);
        Self::starting_at(nodes, util::first::<T, _>(&view, root))
    }

    /// Runs from the live event `start` to the last one.
    pub(crate) fn starting_at(nodes: &'a [N], start: Option<NodeId>) -> Self {
        Self {
            view: EventView::new(nodes),
            next: start,
        }
    }
}

impl<N: SegmentNode<T>, T> Iterator for EventIter<'_, N, T> {
    type Item = Event<N::Key, N::Value>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        self.next = util::next::<T, _>(&self.view, id);
        let (key, delta) = event::hook::<T, N>(self.view.nodes, id).entry?;
        Some(Event {
            node: event::owner(id),
            is_start: !event::is_end(id),
            key,
            delta,
        })
    }
}

impl<N: SegmentNode<T>, T> FusedIterator for EventIter<'_, N, T> {}

/// Elementary segments between the first and the last event, each with the
/// summed value of the intervals covering it.
pub struct Segments<'a, N: SegmentNode<T>, T> {
    view: EventView<'a, N, T>,
    next: Option<NodeId>,
    prev: Option<EventKey<N::Key>>,
    acc: N::Value,
}

impl<'a, N: SegmentNode<T>, T> Segments<'a, N, T> {
    pub(crate) fn new(nodes: &'a [N], root: Option<NodeId>) -> Self {
        let view = EventView::new(nodes);
        Self {
            view,
            next: util::first::<T, _>(&view, root),
            prev: None,
            acc: N::Value::default(),
        }
    }
}

impl<N: SegmentNode<T>, T> Iterator for Segments<'_, N, T> {
    type Item = (Segment<N::Key>, N::Value);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.next {
            self.next = util::next::<T, _>(&self.view, id);
            let (key, delta) = event::hook::<T, N>(self.view.nodes, id).entry?;
            let emitted = match self.prev {
                Some(prev) if !prev.same_position(&key) => {
                    Some((Segment::between(&prev, &key), self.acc))
                }
                _ => None,
            };
            self.acc = self.acc + delta;
            self.prev = Some(key);
            if emitted.is_some() {
                return emitted;
            }
        }
        None
    }
}

impl<N: SegmentNode<T>, T> FusedIterator for Segments<'_, N, T> {}
