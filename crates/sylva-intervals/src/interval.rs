//! Intervals with independently open or closed endpoints.

use std::cmp::Ordering;
use std::fmt;

/// A range of keys. Endpoints are closed at the lower end and open at the
/// upper end unless overridden.
pub trait Interval {
    type Key: Copy + PartialOrd + fmt::Debug;

    fn lower(&self) -> Self::Key;
    fn upper(&self) -> Self::Key;

    fn is_lower_closed(&self) -> bool {
        true
    }

    fn is_upper_closed(&self) -> bool {
        false
    }
}

/// Plain interval value, mostly used as a query probe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds<K> {
    pub lower: K,
    pub upper: K,
    pub lower_closed: bool,
    pub upper_closed: bool,
}

impl<K> Bounds<K> {
    pub fn new(lower: K, upper: K, lower_closed: bool, upper_closed: bool) -> Self {
        Self {
            lower,
            upper,
            lower_closed,
            upper_closed,
        }
    }

    /// `[lower, upper)`
    pub fn closed_open(lower: K, upper: K) -> Self {
        Self::new(lower, upper, true, false)
    }

    /// `[lower, upper]`
    pub fn closed(lower: K, upper: K) -> Self {
        Self::new(lower, upper, true, true)
    }

    /// `(lower, upper)`
    pub fn open(lower: K, upper: K) -> Self {
        Self::new(lower, upper, false, false)
    }

    /// `(lower, upper]`
    pub fn open_closed(lower: K, upper: K) -> Self {
        Self::new(lower, upper, false, true)
    }
}

impl<K: Copy> Bounds<K> {
    /// `[key, key]`
    pub fn point(key: K) -> Self {
        Self::closed(key, key)
    }

    pub fn of<I: Interval<Key = K>>(interval: &I) -> Self {
        Self::new(
            interval.lower(),
            interval.upper(),
            interval.is_lower_closed(),
            interval.is_upper_closed(),
        )
    }
}

impl<K: Copy + PartialOrd + fmt::Debug> Interval for Bounds<K> {
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

/// Total order over keys. Incomparable keys (NaN) are a contract violation.
#[inline]
pub(crate) fn cmp_keys<K: PartialOrd + fmt::Debug>(a: &K, b: &K) -> Ordering {
    match a.partial_cmp(b) {
        Some(ord) => ord,
        None => {
            debug_assert!(false, "incomparable keys {a:?} and {b:?}");
            Ordering::Equal
        }
    }
}

/// Orders intervals by lower endpoint; a closed lower endpoint comes before
/// an open one at the same key.
pub fn cmp_lower<I, J>(a: &I, b: &J) -> Ordering
where
    I: Interval,
    J: Interval<Key = I::Key>,
{
    cmp_keys(&a.lower(), &b.lower()).then_with(|| b.is_lower_closed().cmp(&a.is_lower_closed()))
}

/// `lower > upper` (or incomparable endpoints).
pub fn is_malformed<I: Interval>(interval: &I) -> bool {
    !matches!(
        interval.lower().partial_cmp(&interval.upper()),
        Some(Ordering::Less | Ordering::Equal)
    )
}

/// Contains no key at all.
pub fn is_empty<I: Interval>(interval: &I) -> bool {
    match interval.lower().partial_cmp(&interval.upper()) {
        Some(Ordering::Less) => false,
        Some(Ordering::Equal) => !(interval.is_lower_closed() && interval.is_upper_closed()),
        _ => true,
    }
}

/// Whether a range starting at `start` begins no later than a range ending
/// at `end`, so the two can share a key.
#[inline]
pub(crate) fn starts_before_end<K: PartialOrd + fmt::Debug>(
    start: &K,
    start_closed: bool,
    end: &K,
    end_closed: bool,
) -> bool {
    match cmp_keys(start, end) {
        Ordering::Less => true,
        Ordering::Equal => start_closed && end_closed,
        Ordering::Greater => false,
    }
}

/// Whether `a` and `b` share at least one key.
pub fn overlaps<I, J>(a: &I, b: &J) -> bool
where
    I: Interval,
    J: Interval<Key = I::Key>,
{
    !is_empty(a)
        && !is_empty(b)
        && starts_before_end(&a.lower(), a.is_lower_closed(), &b.upper(), b.is_upper_closed())
        && starts_before_end(&b.lower(), b.is_lower_closed(), &a.upper(), a.is_upper_closed())
}

pub fn contains_point<I: Interval>(interval: &I, key: I::Key) -> bool {
    starts_before_end(&interval.lower(), interval.is_lower_closed(), &key, true)
        && starts_before_end(&key, true, &interval.upper(), interval.is_upper_closed())
}

/// Upper endpoint with its closedness. At equal keys a closed endpoint
/// reaches further than an open one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UpperEndpoint<K> {
    pub key: K,
    pub closed: bool,
}

impl<K: PartialOrd + fmt::Debug> UpperEndpoint<K> {
    pub fn of<I: Interval<Key = K>>(interval: &I) -> Self {
        Self {
            key: interval.upper(),
            closed: interval.is_upper_closed(),
        }
    }

    /// The endpoint that reaches further.
    pub fn max(self, other: Self) -> Self {
        match cmp_keys(&self.key, &other.key) {
            Ordering::Less => other,
            Ordering::Greater => self,
            Ordering::Equal if other.closed && !self.closed => other,
            Ordering::Equal => self,
        }
    }

    /// Whether a range ending here can share a key with one starting at
    /// `start`.
    pub fn reaches(&self, start: &K, start_closed: bool) -> bool {
        starts_before_end(start, start_closed, &self.key, self.closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_endpoints_overlap_only_when_both_closed() {
        assert!(!overlaps(&Bounds::closed_open(0, 5), &Bounds::closed_open(5, 10)));
        assert!(overlaps(&Bounds::closed(0, 5), &Bounds::closed_open(5, 10)));
        assert!(!overlaps(&Bounds::closed(0, 5), &Bounds::open(5, 10)));
        assert!(overlaps(&Bounds::open(0, 10), &Bounds::point(3)));
        assert!(!overlaps(&Bounds::open(0, 10), &Bounds::point(10)));
    }

    #[test]
    fn empty_intervals_overlap_nothing() {
        assert!(is_empty(&Bounds::closed_open(4, 4)));
        assert!(is_empty(&Bounds::open(4, 4)));
        assert!(!is_empty(&Bounds::point(4)));
        assert!(is_empty(&Bounds::closed(5, 4)));
        assert!(is_malformed(&Bounds::closed(5, 4)));
        assert!(!is_malformed(&Bounds::open(4, 4)));
        assert!(!overlaps(&Bounds::closed_open(4, 4), &Bounds::closed(0, 10)));
    }

    #[test]
    fn lower_order_puts_closed_first() {
        assert_eq!(cmp_lower(&Bounds::closed(1, 2), &Bounds::open(1, 2)), Ordering::Less);
        assert_eq!(cmp_lower(&Bounds::open(1, 2), &Bounds::closed(1, 9)), Ordering::Greater);
        assert_eq!(cmp_lower(&Bounds::open(0, 2), &Bounds::closed(1, 9)), Ordering::Less);
        assert_eq!(cmp_lower(&Bounds::closed(1, 2), &Bounds::closed(1, 9)), Ordering::Equal);
    }

    #[test]
    fn closed_upper_reaches_further() {
        let open = UpperEndpoint { key: 5, closed: false };
        let closed = UpperEndpoint { key: 5, closed: true };
        assert_eq!(open.max(closed), closed);
        assert_eq!(closed.max(open), closed);
        assert!(closed.reaches(&5, true));
        assert!(!open.reaches(&5, true));
        assert!(contains_point(&Bounds::open_closed(1.0, 2.0), 2.0));
        assert!(!contains_point(&Bounds::open_closed(1.0, 2.0), 1.0));
    }
}
