use sylva::{NodeId, TreeError};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IntervalError {
    #[error("interval of node {0} has its lower bound above its upper bound")]
    Malformed(NodeId),
    #[error("node {0} is beyond the segment tree's id range")]
    IdOutOfRange(NodeId),
    #[error("summary of event {0} is stale")]
    StaleSummary(NodeId),
    #[error(transparent)]
    Tree(#[from] TreeError),
}
