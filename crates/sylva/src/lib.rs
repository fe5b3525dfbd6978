//! Intrusive balanced binary search trees.
//!
//! Nodes live in a caller-owned slice and carry one [`Links`] block per tree
//! they belong to. Trees store only the root index plus balancer state, so a
//! node can sit in several trees at once (one tag type per membership) and
//! removing it never moves or frees it.

pub mod augment;
pub mod balance;
pub mod bst;
pub mod compare;
pub mod error;
pub mod options;
pub mod red_black;
pub mod tree;
pub mod types;
pub mod util;
pub mod weight_balanced;
pub mod zip;

pub use augment::{Augment, Combined, Combiner, NoAugment};
pub use balance::Balancer;
pub use bst::Iter;
pub use compare::{ByKey, Compare, Keyed, Lookup};
pub use error::TreeError;
pub use options::{DefaultOptions, TreeOptions, UniqueOptions, VerifiedOptions};
pub use red_black::{Color, RedBlack};
pub use tree::{RbTree, SearchTree, WbTree, ZipTree};
pub use types::{DefaultTag, Linked, Links, NodeId, NodeStore, NodeStoreMut};
pub use weight_balanced::{Weight, WeightBalanced};
pub use zip::{Rank, Zip};
