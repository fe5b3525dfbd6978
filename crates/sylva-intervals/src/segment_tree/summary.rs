use std::fmt;

use super::combiner::{Segment, SegmentCombiner};
use super::event::EventKey;
use super::SegmentValue;

/// Cached aggregate of an event subtree.
///
/// `sum` is the total delta of the subtree's events, `first` and `last` its
/// outermost event positions, and `combiner` covers the segments strictly
/// between them with values relative to the subtree's start.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Summary<K, V, C> {
    pub(crate) sum: V,
    pub(crate) first: EventKey<K>,
    pub(crate) last: EventKey<K>,
    pub(crate) combiner: C,
}

impl<K, V, C> Summary<K, V, C>
where
    K: Copy + PartialOrd + fmt::Debug,
    V: SegmentValue,
    C: SegmentCombiner<K, V>,
{
    pub(crate) fn leaf(key: EventKey<K>, delta: V) -> Self {
        Self {
            sum: delta,
            first: key,
            last: key,
            combiner: C::empty(),
        }
    }

    /// Events of `self` followed by those of `next`. A segment separates
    /// them unless their facing events share a position.
    pub(crate) fn then(&self, next: &Self) -> Self {
        let mut combiner = self.combiner.clone();
        if !self.last.same_position(&next.first) {
            let gap = Segment::between(&self.last, &next.first);
            combiner = combiner.then(&C::segment(self.sum, gap));
        }
        combiner = combiner.then(&next.combiner.shifted(self.sum));
        Self {
            sum: self.sum + next.sum,
            first: self.first,
            last: next.last,
            combiner,
        }
    }

    pub(crate) fn node(left: Option<&Self>, key: EventKey<K>, delta: V, right: Option<&Self>) -> Self {
        let own = Self::leaf(key, delta);
        let with_left = match left {
            Some(l) => l.then(&own),
            None => own,
        };
        match right {
            Some(r) => with_left.then(r),
            None => with_left,
        }
    }
}
