use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use sylva::{
    Augment, Balancer, ByKey, Color, Combined, Combiner, DefaultOptions, Keyed, Linked, Links,
    NodeId, Rank, RedBlack, SearchTree, TreeError, Weight, WeightBalanced, Zip,
};

struct ByRb;
struct ByWb;
struct ByZip;

#[derive(Clone, Debug, Default)]
struct Entry {
    key: i64,
    amount: i64,
    sums: [i64; 3],
    counts: [u32; 3],
    rb: Links<Color>,
    wb: Links<Weight>,
    zip: Links<Rank>,
}

impl Keyed for Entry {
    type Key = i64;

    fn key(&self) -> &i64 {
        &self.key
    }
}

impl Linked<ByRb> for Entry {
    type Meta = Color;

    fn links(&self) -> &Links<Color> {
        &self.rb
    }

    fn links_mut(&mut self) -> &mut Links<Color> {
        &mut self.rb
    }
}

impl Linked<ByWb> for Entry {
    type Meta = Weight;

    fn links(&self) -> &Links<Weight> {
        &self.wb
    }

    fn links_mut(&mut self) -> &mut Links<Weight> {
        &mut self.wb
    }
}

impl Linked<ByZip> for Entry {
    type Meta = Rank;

    fn links(&self) -> &Links<Rank> {
        &self.zip
    }

    fn links_mut(&mut self) -> &mut Links<Rank> {
        &mut self.zip
    }
}

/// Sum of `amount` over a subtree, cached in `sums[slot]`.
#[derive(Clone, Copy, Debug, Default)]
struct AmountSum {
    slot: usize,
}

impl Combiner<Entry> for AmountSum {
    type Value = i64;

    fn contribution(&self, node: &Entry) -> i64 {
        node.amount
    }

    fn combine(&self, left: Option<&i64>, own: i64, right: Option<&i64>) -> i64 {
        left.copied().unwrap_or(0) + own + right.copied().unwrap_or(0)
    }

    fn value<'a>(&self, node: &'a Entry) -> &'a i64 {
        &node.sums[self.slot]
    }

    fn store(&self, node: &mut Entry, value: i64) {
        node.sums[self.slot] = value;
    }
}

/// Subtree node count, cached in `counts[slot]`.
#[derive(Clone, Copy, Debug, Default)]
struct NodeCount {
    slot: usize,
}

impl Combiner<Entry> for NodeCount {
    type Value = u32;

    fn contribution(&self, _node: &Entry) -> u32 {
        1
    }

    fn combine(&self, left: Option<&u32>, own: u32, right: Option<&u32>) -> u32 {
        left.copied().unwrap_or(0) + own + right.copied().unwrap_or(0)
    }

    fn value<'a>(&self, node: &'a Entry) -> &'a u32 {
        &node.counts[self.slot]
    }

    fn store(&self, node: &mut Entry, value: u32) {
        node.counts[self.slot] = value;
    }
}

type Pack = (Combined<AmountSum>, Combined<NodeCount>);
type Augmented<B, T> = SearchTree<Entry, B, T, DefaultOptions, ByKey, Pack>;

fn pack(slot: usize) -> Pack {
    (
        Combined::new(AmountSum { slot }),
        Combined::new(NodeCount { slot }),
    )
}

/// Sum of `amount` over nodes with key below `bound`, read off the cached
/// aggregates along one root-to-leaf path.
fn sum_below<B, T>(tree: &Augmented<B, T>, nodes: &[Entry], bound: i64) -> i64
where
    Entry: Linked<T, Meta = B::Meta>,
    B: Balancer,
{
    let slot = tree.augment().0.combiner().slot;
    let mut total = 0;
    let mut curr = tree.root();
    while let Some(id) = curr {
        let node = &nodes[id as usize];
        let links = Linked::<T>::links(node);
        if node.key < bound {
            total += links.left().map_or(0, |l| nodes[l as usize].sums[slot]) + node.amount;
            curr = links.right();
        } else {
            curr = links.left();
        }
    }
    total
}

fn fuzz_aggregates<B, T>(mut tree: Augmented<B, T>, slot: usize, seed: u64)
where
    Entry: Linked<T, Meta = B::Meta>,
    B: Balancer,
    Pack: Augment<T, [Entry]>,
{
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut nodes = vec![Entry::default(); 80];
    let mut model: BTreeMap<NodeId, (i64, i64)> = BTreeMap::new();

    for round in 0..1_500 {
        let id = rng.gen_range(0..nodes.len()) as NodeId;
        if model.remove(&id).is_some() {
            tree.remove(&mut nodes, id);
        } else {
            let node = &mut nodes[id as usize];
            node.key = rng.gen_range(0..40);
            node.amount = rng.gen_range(-50..50);
            model.insert(id, (node.key, node.amount));
            tree.insert(&mut nodes, id);
        }
        tree.verify(&nodes).unwrap();

        let root_sum = tree.root().map_or(0, |r| nodes[r as usize].sums[slot]);
        let root_count = tree.root().map_or(0, |r| nodes[r as usize].counts[slot]);
        assert_eq!(root_sum, model.values().map(|&(_, a)| a).sum::<i64>());
        assert_eq!(root_count as usize, model.len());

        if round % 25 == 0 {
            for bound in [0, 7, 20, 33, 41] {
                let expected: i64 = model
                    .values()
                    .filter(|&&(k, _)| k < bound)
                    .map(|&(_, a)| a)
                    .sum();
                assert_eq!(sum_below(&tree, &nodes, bound), expected);
            }
        }
    }
}

#[test]
fn red_black_aggregates_matrix() {
    fuzz_aggregates(Augmented::<RedBlack, ByRb>::from_parts(RedBlack, ByKey, pack(0)), 0, 17);
}

#[test]
fn weight_balanced_aggregates_matrix() {
    fuzz_aggregates(
        Augmented::<WeightBalanced, ByWb>::from_parts(WeightBalanced::new(), ByKey, pack(1)),
        1,
        18,
    );
}

#[test]
fn zip_aggregates_matrix() {
    fuzz_aggregates(
        Augmented::<Zip, ByZip>::from_parts(Zip::with_seed(19), ByKey, pack(2)),
        2,
        19,
    );
}

#[test]
fn stale_aggregate_is_reported_matrix() {
    let mut nodes: Vec<Entry> = (0..6)
        .map(|i| Entry {
            key: i,
            amount: i * 10,
            ..Entry::default()
        })
        .collect();
    let mut tree = Augmented::<RedBlack, ByRb>::from_parts(RedBlack, ByKey, pack(0));
    for id in 0..6 {
        tree.insert(&mut nodes, id);
    }
    tree.verify(&nodes).unwrap();
    let root = tree.root().unwrap();
    assert_eq!(nodes[root as usize].sums[0], 150);

    // Sequential inserts leave node 0 as the leftmost leaf.
    assert_eq!(tree.first(&nodes), Some(0));
    assert_eq!(nodes[0].rb.left(), None);
    nodes[0].sums[0] += 1;
    assert_eq!(tree.verify(&nodes), Err(TreeError::StaleAggregate(0)));
}
