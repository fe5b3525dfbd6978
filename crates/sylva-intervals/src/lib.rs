//! Interval containers built on `sylva`'s intrusive trees.
//!
//! - [`IntervalTree`]: overlap queries over intervals ordered by lower
//!   endpoint, pruned with a max-upper-endpoint aggregate.
//! - [`DynamicSegmentTree`]: additive values over intervals with point and
//!   range queries, kept as a balanced tree of start/end events.

pub mod error;
pub mod interval;
pub mod interval_tree;
pub mod segment_tree;

pub use error::IntervalError;
pub use interval::{Bounds, Interval, UpperEndpoint};
pub use interval_tree::{ByLower, IntervalNode, IntervalTree, MaxUpper, MaxUpperCombiner, Overlaps};
pub use segment_tree::{
    DynamicSegmentTree, Event, EventIter, EventKey, EventKind, MaxCombiner, RangedMaxCombiner,
    Segment, SegmentCombiner, SegmentHook, SegmentNode, SegmentValue, Segments, WbSegmentTree,
};
