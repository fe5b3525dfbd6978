use thiserror::Error;

use crate::types::NodeId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("node {0} is already linked")]
    AlreadyLinked(NodeId),
    #[error("node {0} is not linked")]
    NotLinked(NodeId),
    #[error("node {0} is linked into a different tree")]
    NotMember(NodeId),
    #[error("node {node} compares equal to node {existing}")]
    DuplicateKey { node: NodeId, existing: NodeId },
    #[error("broken parent/child link at node {0}")]
    BrokenLink(NodeId),
    #[error("node {0} is out of order")]
    OrderViolation(NodeId),
    #[error("root {0} is red")]
    RedRoot(NodeId),
    #[error("red node {0} has a red child")]
    RedRed(NodeId),
    #[error("black height differs below node {0}")]
    BlackHeight(NodeId),
    #[error("subtrees of node {0} violate the weight ratio")]
    WeightImbalance(NodeId),
    #[error("stored weight of node {0} does not match its subtree")]
    WrongWeight(NodeId),
    #[error("rank of node {0} exceeds the rank of its parent")]
    RankOrder(NodeId),
    #[error("cached aggregate of node {0} is stale")]
    StaleAggregate(NodeId),
    #[error("tree reports {expected} nodes but holds {actual}")]
    SizeMismatch { expected: usize, actual: usize },
}
