use std::fmt::Debug;

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use sylva::{
    Balancer, Color, DefaultOptions, Rank, RedBlack, TreeError, VerifiedOptions,
    Weight, WeightBalanced, Zip,
};
use sylva_intervals::interval::contains_point;
use sylva_intervals::{
    Bounds, DynamicSegmentTree, EventIter, Interval, IntervalError, MaxCombiner,
    RangedMaxCombiner, Segment, SegmentCombiner, SegmentHook, SegmentNode, WbSegmentTree,
};

struct Tag;

type Agg = (MaxCombiner<i64>, RangedMaxCombiner<f64, i64>);

#[derive(Clone, Debug)]
struct Job<M> {
    bounds: Bounds<f64>,
    value: i64,
    hook: SegmentHook<f64, i64, Agg, M>,
}

impl<M: Default> Job<M> {
    fn new(bounds: Bounds<f64>, value: i64) -> Self {
        Self {
            bounds,
            value,
            hook: SegmentHook::new(),
        }
    }
}

impl<M> Interval for Job<M> {
    type Key = f64;

    fn lower(&self) -> f64 {
        self.bounds.lower
    }

    fn upper(&self) -> f64 {
        self.bounds.upper
    }

    fn is_lower_closed(&self) -> bool {
        self.bounds.lower_closed
    }

    fn is_upper_closed(&self) -> bool {
        self.bounds.upper_closed
    }
}

impl<M: Default + Clone + Debug> SegmentNode<Tag> for Job<M> {
    type Value = i64;
    type Combiner = Agg;
    type Meta = M;

    fn value(&self) -> i64 {
        self.value
    }

    fn segment_hook(&self) -> &SegmentHook<f64, i64, Agg, M> {
        &self.hook
    }

    fn segment_hook_mut(&mut self) -> &mut SegmentHook<f64, i64, Agg, M> {
        &mut self.hook
    }
}

type Tree<M, B, O = DefaultOptions> = DynamicSegmentTree<Job<M>, B, Tag, O>;

fn nothing() -> Agg {
    <Agg as SegmentCombiner<f64, i64>>::empty()
}

fn closed_open(lower: f64, upper: f64) -> Bounds<f64> {
    Bounds::closed_open(lower, upper)
}

fn brute_value<M>(nodes: &[Job<M>], x: f64) -> i64 {
    nodes
        .iter()
        .filter(|n| n.hook.is_linked() && contains_point(*n, x))
        .map(|n| n.value)
        .sum()
}

/// Points of `range` at integers and half-integers. With integral
/// endpoints every elementary segment holds at least one of them.
fn samples(range: &Bounds<f64>) -> Vec<f64> {
    let lo = range.lower.floor() as i64 * 2;
    let hi = range.upper.ceil() as i64 * 2;
    (lo..=hi)
        .map(|h| h as f64 / 2.0)
        .filter(|&x| contains_point(range, x))
        .collect()
}

fn brute_max<M>(nodes: &[Job<M>], range: &Bounds<f64>) -> Option<i64> {
    samples(range).into_iter().map(|x| brute_value(nodes, x)).max()
}

/// Leftmost maximal run of the largest value over `range`, as
/// `(value, lower border, upper border)`.
fn brute_ranged_max<M>(
    nodes: &[Job<M>],
    range: &Bounds<f64>,
) -> Option<(i64, (f64, bool), (f64, bool))> {
    let values: Vec<(f64, i64)> = samples(range)
        .into_iter()
        .map(|x| (x, brute_value(nodes, x)))
        .collect();
    let max = values.iter().map(|&(_, v)| v).max()?;
    let start = values.iter().position(|&(_, v)| v == max)?;
    let run = values[start..].iter().take_while(|&&(_, v)| v == max).count();
    let (first, last) = (values[start].0, values[start + run - 1].0);
    // A half-integer sample stands for the open stretch around it.
    let lower = if first.fract() == 0.0 {
        (first, true)
    } else {
        (first - 0.5, false)
    };
    let upper = if last.fract() == 0.0 {
        (last, true)
    } else {
        (last + 0.5, false)
    };
    Some((max, lower, upper))
}

fn random_bounds(rng: &mut Xoshiro256PlusPlus) -> Bounds<f64> {
    let lower = rng.gen_range(0..120);
    let upper = lower + rng.gen_range(0..30);
    Bounds::new(
        lower as f64,
        upper as f64,
        rng.gen_bool(0.5),
        rng.gen_bool(0.5),
    )
}

#[test]
fn overlapping_values_add_up() {
    let mut nodes = vec![
        Job::<Color>::new(closed_open(0.0, 10.0), 5),
        Job::<Color>::new(closed_open(5.0, 15.0), 3),
    ];
    let mut tree: Tree<Color, RedBlack> = DynamicSegmentTree::new();
    tree.insert(&mut nodes, 0);
    tree.insert(&mut nodes, 1);
    tree.verify(&nodes).unwrap();

    assert_eq!(tree.query(&nodes, 7.0), 8);
    assert_eq!(tree.query(&nodes, 2.0), 5);
    assert_eq!(tree.query(&nodes, 12.0), 3);
    assert_eq!(tree.query(&nodes, 20.0), 0);
    assert_eq!(tree.query(&nodes, 10.0), 3);
    assert_eq!(tree.query(&nodes, 15.0), 0);

    tree.remove(&mut nodes, 0);
    tree.verify(&nodes).unwrap();
    assert_eq!(tree.query(&nodes, 7.0), 3);
    assert_eq!(tree.query(&nodes, 2.0), 0);
    assert_eq!(tree.size(), 1);
}

fn stress<M, B>(mut tree: Tree<M, B>, seed: u64)
where
    M: Default + Clone + Debug,
    B: Balancer<Meta = M>,
{
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut nodes: Vec<Job<M>> = (0..120)
        .map(|_| Job::new(random_bounds(&mut rng), 0))
        .collect();
    let mut linked = 0;

    for step in 0..10_000 {
        let i = rng.gen_range(0..nodes.len());
        if nodes[i].hook.is_linked() {
            tree.remove(&mut nodes, i as u32);
            linked -= 1;
        } else {
            nodes[i].bounds = random_bounds(&mut rng);
            nodes[i].value = rng.gen_range(-20..=50);
            tree.insert(&mut nodes, i as u32);
            linked += 1;
        }
        assert_eq!(tree.size(), linked);

        let x = rng.gen_range(0..300) as f64 / 2.0;
        assert_eq!(tree.query(&nodes, x), brute_value(&nodes, x), "step {step} at {x}");

        tree.verify(&nodes).unwrap();

        let range = random_bounds(&mut rng);
        let (max, ranged) = tree.combined_in(&nodes, &range);
        assert_eq!(max.value(), brute_max(&nodes, &range), "step {step} range {range:?}");
        let reported = ranged
            .value()
            .zip(ranged.lower_border())
            .zip(ranged.upper_border())
            .map(|((v, lower), upper)| (v, lower, upper));
        assert_eq!(
            reported,
            brute_ranged_max(&nodes, &range),
            "step {step} range {range:?}"
        );

        let whole = tree.combined(&nodes);
        let over_segments = tree.segments(&nodes).map(|(_, v)| v).max();
        assert_eq!(whole.0.value(), over_segments, "step {step}");
    }
}

#[test]
fn stress_red_black() {
    stress::<Color, RedBlack>(DynamicSegmentTree::new(), 0x5E6_0001);
}

#[test]
fn stress_weight_balanced() {
    stress::<Weight, WeightBalanced>(DynamicSegmentTree::new(), 0x5E6_0002);
}

#[test]
fn stress_zip() {
    stress::<Rank, Zip>(DynamicSegmentTree::with_balancer(Zip::with_seed(9)), 0x5E6_0003);
}

#[test]
fn segments_partition_the_event_span() {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(31);
    let mut nodes: Vec<Job<Color>> = (0..60)
        .map(|_| Job::new(random_bounds(&mut rng), rng.gen_range(1..10)))
        .collect();
    let mut tree: Tree<Color, RedBlack> = DynamicSegmentTree::new();
    for id in 0..nodes.len() as u32 {
        tree.insert(&mut nodes, id);
    }

    let segments: Vec<_> = tree.segments(&nodes).collect();
    assert!(!segments.is_empty());
    for pair in segments.windows(2) {
        let ((a, _), (b, _)) = (pair[0], pair[1]);
        assert_eq!(a.upper, b.lower);
        assert_ne!(a.upper_closed, b.lower_closed, "{a:?} then {b:?}");
    }
    for (segment, value) in &segments {
        let point = if segment.lower == segment.upper {
            segment.lower
        } else {
            (segment.lower + segment.upper) / 2.0
        };
        assert_eq!(tree.query(&nodes, point), *value, "segment {segment:?}");
    }

    let events: Vec<_> = tree.events(&nodes).collect();
    assert_eq!(events.len(), 2 * nodes.len());
    assert_eq!(events.iter().map(|e| e.delta).sum::<i64>(), 0);
    for pair in events.windows(2) {
        assert!(pair[0].key.order(&pair[1].key).is_le());
    }
}

#[test]
fn ranged_max_merges_equal_runs() {
    let mut nodes = vec![
        Job::<Color>::new(closed_open(0.0, 10.0), 5),
        Job::<Color>::new(closed_open(5.0, 15.0), 3),
        Job::<Color>::new(Bounds::closed(10.0, 12.0), 5),
    ];
    let mut tree: Tree<Color, RedBlack> = DynamicSegmentTree::new();
    tree.insert(&mut nodes, 0);
    tree.insert(&mut nodes, 1);

    let (max, ranged) = tree.combined(&nodes);
    assert_eq!(max.value(), Some(8));
    assert_eq!(
        ranged.range(),
        Some(Segment {
            lower: 5.0,
            upper: 10.0,
            lower_closed: true,
            upper_closed: false,
        })
    );

    tree.insert(&mut nodes, 2);
    let (_, ranged) = tree.combined(&nodes);
    assert_eq!(ranged.value(), Some(8));
    assert_eq!(ranged.lower_border(), Some((5.0, true)));
    assert_eq!(ranged.upper_border(), Some((12.0, true)));

    // The range splits again once the bridging interval leaves.
    tree.remove(&mut nodes, 2);
    let (_, ranged) = tree.combined(&nodes);
    assert_eq!(ranged.upper_border(), Some((10.0, false)));
}

#[test]
fn combined_in_clips_border_segments() {
    let mut nodes = vec![
        Job::<Color>::new(closed_open(0.0, 10.0), 5),
        Job::<Color>::new(closed_open(5.0, 15.0), 3),
    ];
    let mut tree: Tree<Color, RedBlack> = DynamicSegmentTree::new();
    tree.insert(&mut nodes, 0);
    tree.insert(&mut nodes, 1);

    let (max, ranged) = tree.combined_in(&nodes, &Bounds::closed(2.0, 7.0));
    assert_eq!(max.value(), Some(8));
    assert_eq!(ranged.lower_border(), Some((5.0, true)));
    assert_eq!(ranged.upper_border(), Some((7.0, true)));

    let (_, ranged) = tree.combined_in(&nodes, &Bounds::open(11.0, 20.0));
    assert_eq!(ranged.value(), Some(3));
    assert_eq!(ranged.lower_border(), Some((11.0, false)));
    assert_eq!(ranged.upper_border(), Some((15.0, false)));

    // Entirely before the first event.
    let (max, ranged) = tree.combined_in(&nodes, &Bounds::closed(-4.0, -1.0));
    assert_eq!(max.value(), Some(0));
    assert_eq!(ranged.lower_border(), Some((-4.0, true)));

    assert_eq!(tree.combined_in(&nodes, &Bounds::open(3.0, 3.0)), nothing());
}

#[test]
fn empty_and_point_intervals() {
    let mut nodes = vec![
        Job::<Color>::new(closed_open(4.0, 4.0), 7),
        Job::<Color>::new(Bounds::open(4.0, 4.0), 7),
        Job::<Color>::new(Bounds::point(6.0), 2),
    ];
    let mut tree: Tree<Color, RedBlack> = DynamicSegmentTree::new();
    for id in 0..3 {
        tree.insert(&mut nodes, id);
    }
    tree.verify(&nodes).unwrap();

    assert_eq!(tree.query(&nodes, 4.0), 0);
    assert_eq!(tree.query(&nodes, 6.0), 2);
    assert_eq!(tree.query(&nodes, 6.5), 0);
    assert_eq!(tree.query(&nodes, 5.5), 0);

    let segments: Vec<_> = tree.segments(&nodes).collect();
    assert!(segments.iter().any(|(s, v)| s.lower == 6.0 && s.upper == 6.0 && *v == 2));
    assert!(segments.iter().all(|(_, v)| *v == 0 || *v == 2));
}

#[test]
fn checked_operations_report_errors() {
    let mut nodes = vec![
        Job::<Color>::new(Bounds::closed(5.0, 1.0), 1),
        Job::<Color>::new(Bounds::closed(1.0, 5.0), 1),
        Job::<Color>::new(Bounds::closed(2.0, 3.0), 1),
    ];
    let mut tree: Tree<Color, RedBlack> = DynamicSegmentTree::new();
    let mut other: Tree<Color, RedBlack> = DynamicSegmentTree::new();

    assert_eq!(tree.try_insert(&mut nodes, 0), Err(IntervalError::Malformed(0)));
    tree.try_insert(&mut nodes, 1).unwrap();
    assert_eq!(
        tree.try_insert(&mut nodes, 1),
        Err(IntervalError::Tree(TreeError::AlreadyLinked(1)))
    );
    assert_eq!(
        tree.try_remove(&mut nodes, 2),
        Err(IntervalError::Tree(TreeError::NotLinked(2)))
    );
    other.insert(&mut nodes, 2);
    assert_eq!(
        tree.try_remove(&mut nodes, 2),
        Err(IntervalError::Tree(TreeError::NotMember(2)))
    );
    assert!(tree.contains(&nodes, 1));
    assert!(!tree.contains(&nodes, 2));
    assert!(other.contains(&nodes, 2));

    tree.try_remove(&mut nodes, 1).unwrap();
    assert!(tree.is_empty());
}

#[test]
fn clear_resets_every_hook() {
    let mut nodes: Vec<Job<Weight>> = (0..30)
        .map(|i| Job::new(Bounds::closed(i as f64, i as f64 + 4.0), 1))
        .collect();
    let mut tree: Tree<Weight, WeightBalanced> = DynamicSegmentTree::new();
    for id in 0..30 {
        tree.insert(&mut nodes, id);
    }
    assert_eq!(tree.query(&nodes, 10.0), 5);

    tree.clear(&mut nodes);
    assert!(tree.is_empty());
    assert_eq!(tree.size(), 0);
    assert!(nodes.iter().all(|n| !n.hook.is_linked()));
    assert_eq!(tree.query(&nodes, 10.0), 0);
    assert_eq!(tree.combined(&nodes), nothing());

    tree.insert(&mut nodes, 3);
    tree.verify(&nodes).unwrap();
    assert_eq!(tree.query(&nodes, 5.0), 1);
}

#[test]
fn verified_options_check_every_mutation() {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(77);
    let mut nodes: Vec<Job<Rank>> = (0..40)
        .map(|_| Job::new(random_bounds(&mut rng), rng.gen_range(1..5)))
        .collect();
    let mut tree: Tree<Rank, Zip, VerifiedOptions> = DynamicSegmentTree::new();
    for _ in 0..400 {
        let id = rng.gen_range(0..40u32);
        if nodes[id as usize].hook.is_linked() {
            tree.remove(&mut nodes, id);
        } else {
            tree.insert(&mut nodes, id);
        }
    }
}

#[test]
fn events_from_and_after_a_key() {
    let mut nodes = vec![
        Job::<Color>::new(closed_open(0.0, 10.0), 5),
        Job::<Color>::new(Bounds::closed(5.0, 10.0), 3),
        Job::<Color>::new(Bounds::open(10.0, 12.0), 1),
    ];
    let mut tree: Tree<Color, RedBlack> = DynamicSegmentTree::new();
    for id in 0..3 {
        tree.insert(&mut nodes, id);
    }

    let points = |events: EventIter<'_, Job<Color>, Tag>| {
        events
            .map(|e| (e.key.point, e.node, e.is_start))
            .collect::<Vec<_>>()
    };
    // At 10: open end, closed end, open start.
    assert_eq!(
        points(tree.events_from(&nodes, 10.0)),
        vec![
            (10.0, 0, false),
            (10.0, 1, false),
            (10.0, 2, true),
            (12.0, 2, false)
        ]
    );
    assert_eq!(points(tree.events_after(&nodes, 10.0)), vec![(12.0, 2, false)]);
    assert_eq!(points(tree.events_from(&nodes, 6.0)).len(), 4);
    assert_eq!(points(tree.events_from(&nodes, -3.0)).len(), 6);
    assert!(tree.events_from(&nodes, 12.5).next().is_none());
    assert!(tree.events_after(&nodes, 12.0).next().is_none());
}

#[test]
fn events_from_matches_a_filtered_scan() {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(404);
    let mut nodes: Vec<Job<Rank>> = (0..80)
        .map(|_| Job::new(random_bounds(&mut rng), 1))
        .collect();
    let mut tree: Tree<Rank, Zip> = DynamicSegmentTree::new();
    for id in 0..nodes.len() as u32 {
        tree.insert(&mut nodes, id);
    }

    let all: Vec<_> = tree.events(&nodes).collect();
    for half in 0..300 {
        let key = half as f64 / 2.0;
        let from: Vec<_> = tree.events_from(&nodes, key).collect();
        let expected: Vec<_> = all.iter().copied().filter(|e| e.key.point >= key).collect();
        assert_eq!(from, expected, "from {key}");
        let after: Vec<_> = tree.events_after(&nodes, key).collect();
        let expected: Vec<_> = all.iter().copied().filter(|e| e.key.point > key).collect();
        assert_eq!(after, expected, "after {key}");
    }
}

#[test]
fn ids_beyond_the_event_range_are_rejected() {
    let mut nodes = vec![Job::<Color>::new(Bounds::closed(0.0, 1.0), 1)];
    let mut tree: Tree<Color, RedBlack> = DynamicSegmentTree::new();
    assert_eq!(
        tree.try_insert(&mut nodes, 1 << 31),
        Err(IntervalError::IdOutOfRange(1 << 31))
    );
    assert!(tree.is_empty());
}

#[test]
fn weight_balanced_alias_follows_tree_options() {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);
    let mut nodes: Vec<Job<Weight>> = (0..50)
        .map(|_| Job::new(random_bounds(&mut rng), 2))
        .collect();
    let mut tree: WbSegmentTree<Job<Weight>, Tag, VerifiedOptions> = WbSegmentTree::new();
    for id in 0..nodes.len() as u32 {
        tree.insert(&mut nodes, id);
    }
    for id in (0..nodes.len() as u32).step_by(3) {
        tree.remove(&mut nodes, id);
    }
    tree.verify(&nodes).unwrap();
    let x = 60.0;
    assert_eq!(tree.query(&nodes, x), brute_value(&nodes, x));
}
