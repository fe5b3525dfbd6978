use proptest::prelude::*;
use sylva::{
    Balancer, Color, Keyed, Linked, Links, NodeId, Rank, RedBlack, SearchTree, Weight,
    WeightBalanced, Zip,
};

struct Tag;

#[derive(Clone, Debug, Default)]
struct Slot<M> {
    key: u16,
    links: Links<M>,
}

impl<M> Keyed for Slot<M> {
    type Key = u16;

    fn key(&self) -> &u16 {
        &self.key
    }
}

impl<M> Linked<Tag> for Slot<M> {
    type Meta = M;

    fn links(&self) -> &Links<M> {
        &self.links
    }

    fn links_mut(&mut self) -> &mut Links<M> {
        &mut self.links
    }
}

#[derive(Clone, Debug)]
enum Op {
    Toggle(usize, u16),
}

fn ops() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec((0usize..48, 0u16..32).prop_map(|(i, k)| Op::Toggle(i, k)), 0..300)
}

/// Applies toggles (insert when unlinked, remove when linked) and checks the
/// tree against a sorted vector after each step.
fn replay<B>(mut tree: SearchTree<Slot<B::Meta>, B, Tag>, ops: &[Op]) -> Result<(), TestCaseError>
where
    B: Balancer,
{
    let mut nodes: Vec<Slot<B::Meta>> = vec![Slot::default(); 48];
    let mut model: Vec<(u16, NodeId)> = Vec::new();

    for op in ops {
        let Op::Toggle(i, key) = *op;
        let id = i as NodeId;
        if nodes[i].links.is_linked() {
            model.retain(|&(_, m)| m != id);
            tree.remove(&mut nodes, id);
        } else {
            nodes[i].key = key;
            let at = model.partition_point(|&(k, _)| k <= key);
            model.insert(at, (key, id));
            tree.insert(&mut nodes, id);
        }
        prop_assert_eq!(tree.verify(&nodes), Ok(()));
        let seen: Vec<NodeId> = tree.iter(&nodes).collect();
        let expected: Vec<NodeId> = model.iter().map(|&(_, id)| id).collect();
        prop_assert_eq!(seen, expected);
    }
    Ok(())
}

proptest! {
    #[test]
    fn prop_red_black_matches_sorted_model(ops in ops()) {
        replay(SearchTree::<Slot<Color>, RedBlack, Tag>::new(), &ops)?;
    }

    #[test]
    fn prop_weight_balanced_matches_sorted_model(ops in ops()) {
        replay(SearchTree::<Slot<Weight>, WeightBalanced, Tag>::new(), &ops)?;
    }

    #[test]
    fn prop_zip_matches_sorted_model(ops in ops(), seed in any::<u64>()) {
        replay(SearchTree::<Slot<Rank>, Zip, Tag>::with_seed(seed), &ops)?;
    }
}
