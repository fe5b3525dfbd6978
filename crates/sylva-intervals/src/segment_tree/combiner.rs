use std::cmp::Ordering;
use std::fmt;

use super::event::EventKey;
use super::SegmentValue;
use crate::interval::Interval;

/// An elementary segment: a maximal key range over which the covering set
/// does not change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment<K> {
    pub lower: K,
    pub upper: K,
    pub lower_closed: bool,
    pub upper_closed: bool,
}

impl<K: Copy + PartialOrd + fmt::Debug> Segment<K> {
    /// Keys after the event `start` takes effect and before `end` does.
    pub(crate) fn between(start: &EventKey<K>, end: &EventKey<K>) -> Self {
        Self {
            lower: start.point,
            upper: end.point,
            lower_closed: start.kind.applies_at_point(),
            upper_closed: !end.kind.applies_at_point(),
        }
    }

    /// Union of `self` and the segment that directly follows it.
    pub fn join(self, next: Self) -> Self {
        Self {
            lower: self.lower,
            upper: next.upper,
            lower_closed: self.lower_closed,
            upper_closed: next.upper_closed,
        }
    }
}

impl<K: Copy + PartialOrd + fmt::Debug> Interval for Segment<K> {
    type Key = K;

    fn lower(&self) -> K {
        self.lower
    }

    fn upper(&self) -> K {
        self.upper
    }

    fn is_lower_closed(&self) -> bool {
        self.lower_closed
    }

    fn is_upper_closed(&self) -> bool {
        self.upper_closed
    }
}

/// Aggregate over a run of consecutive elementary segments, each carrying
/// the summed value of the intervals covering it.
///
/// Implementations must make `then` associative with `empty` as identity,
/// and `shifted` must distribute over `then`.
pub trait SegmentCombiner<K, V>: Clone + PartialEq + fmt::Debug {
    /// Aggregate over no segment.
    fn empty() -> Self;

    /// Aggregate over a single segment with the given value.
    fn segment(value: V, segment: Segment<K>) -> Self;

    /// Adds `offset` to every segment value.
    fn shifted(&self, offset: V) -> Self;

    /// Aggregate over the segments of `self` followed by those of `next`.
    fn then(&self, next: &Self) -> Self;
}

#[inline]
fn greater<V: PartialOrd>(a: &V, b: &V) -> bool {
    a.partial_cmp(b) == Some(Ordering::Greater)
}

/// Largest segment value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaxCombiner<V> {
    max: Option<V>,
}

impl<V: Copy> MaxCombiner<V> {
    /// `None` over no segment.
    pub fn value(&self) -> Option<V> {
        self.max
    }
}

impl<K, V: SegmentValue> SegmentCombiner<K, V> for MaxCombiner<V> {
    fn empty() -> Self {
        Self { max: None }
    }

    fn segment(value: V, _segment: Segment<K>) -> Self {
        Self { max: Some(value) }
    }

    fn shifted(&self, offset: V) -> Self {
        Self {
            max: self.max.map(|m| m + offset),
        }
    }

    fn then(&self, next: &Self) -> Self {
        let max = match (self.max, next.max) {
            (Some(a), Some(b)) => Some(if greater(&b, &a) { b } else { a }),
            (a, b) => a.or(b),
        };
        Self { max }
    }
}

/// A maximal stretch of consecutive segments sharing one value.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Run<K, V> {
    value: V,
    range: Segment<K>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Runs<K, V> {
    /// Leftmost run with the largest value.
    best: Run<K, V>,
    /// Run touching the left edge.
    first: Run<K, V>,
    /// Run touching the right edge.
    last: Run<K, V>,
    /// All segments share one value.
    single: bool,
}

/// Largest segment value together with the range where it is attained.
///
/// Adjacent segments with equal values are merged, so the reported range
/// is the leftmost maximal run and its borders carry the closedness of the
/// segments that bound it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RangedMaxCombiner<K, V> {
    runs: Option<Runs<K, V>>,
}

impl<K: Copy, V: Copy> RangedMaxCombiner<K, V> {
    pub fn value(&self) -> Option<V> {
        self.runs.map(|r| r.best.value)
    }

    /// Range where the maximum is attained.
    pub fn range(&self) -> Option<Segment<K>> {
        self.runs.map(|r| r.best.range)
    }

    pub fn lower_border(&self) -> Option<(K, bool)> {
        self.range().map(|s| (s.lower, s.lower_closed))
    }

    pub fn upper_border(&self) -> Option<(K, bool)> {
        self.range().map(|s| (s.upper, s.upper_closed))
    }
}

impl<K, V> SegmentCombiner<K, V> for RangedMaxCombiner<K, V>
where
    K: Copy + PartialOrd + fmt::Debug,
    V: SegmentValue,
{
    fn empty() -> Self {
        Self { runs: None }
    }

    fn segment(value: V, range: Segment<K>) -> Self {
        let run = Run { value, range };
        Self {
            runs: Some(Runs {
                best: run,
                first: run,
                last: run,
                single: true,
            }),
        }
    }

    fn shifted(&self, offset: V) -> Self {
        let shift = |run: Run<K, V>| Run {
            value: run.value + offset,
            range: run.range,
        };
        Self {
            runs: self.runs.map(|r| Runs {
                best: shift(r.best),
                first: shift(r.first),
                last: shift(r.last),
                single: r.single,
            }),
        }
    }

    fn then(&self, next: &Self) -> Self {
        let (a, b) = match (self.runs, next.runs) {
            (Some(a), Some(b)) => (a, b),
            (a, b) => return Self { runs: a.or(b) },
        };

        let joined = (a.last.value == b.first.value).then(|| Run {
            value: a.last.value,
            range: a.last.range.join(b.first.range),
        });
        let first = match joined {
            Some(run) if a.single => run,
            _ => a.first,
        };
        let last = match joined {
            Some(run) if b.single => run,
            _ => b.last,
        };

        let mut best = a.best;
        if let Some(run) = joined {
            // The joined run extends `a.last`, which may itself be `a.best`.
            let extends_best = run.value == best.value && run.range.lower == best.range.lower;
            if greater(&run.value, &best.value) || extends_best {
                best = run;
            }
        }
        if greater(&b.best.value, &best.value) {
            best = b.best;
        }

        Self {
            runs: Some(Runs {
                best,
                first,
                last,
                single: a.single && b.single && joined.is_some(),
            }),
        }
    }
}

impl<K, V, A, B> SegmentCombiner<K, V> for (A, B)
where
    K: Copy,
    V: Copy,
    A: SegmentCombiner<K, V>,
    B: SegmentCombiner<K, V>,
{
    fn empty() -> Self {
        (A::empty(), B::empty())
    }

    fn segment(value: V, segment: Segment<K>) -> Self {
        (A::segment(value, segment), B::segment(value, segment))
    }

    fn shifted(&self, offset: V) -> Self {
        (self.0.shifted(offset), self.1.shifted(offset))
    }

    fn then(&self, next: &Self) -> Self {
        (self.0.then(&next.0), self.1.then(&next.1))
    }
}
