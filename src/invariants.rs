//! Structural invariant violations reported by the engines' `validate()`
//!
//! Every engine exposes `validate(&self) -> Result<(), InvariantError>`,
//! which walks the whole structure. It is O(n) and meant for tests, fuzzing
//! and the `check-invariants` feature, which runs it after every mutation.

use thiserror::Error;

use crate::rank::Rank;

/// A broken structural invariant, naming the first offending tree or node
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantError {
    /// A child's key is smaller than its parent's
    #[error("heap order violated below a node of order/degree {parent_rank}")]
    HeapOrder { parent_rank: Rank },

    /// Two roots share an order where only one is allowed
    #[error("two trees of order {order} in the forest")]
    DuplicateOrder { order: Rank },

    /// Forest orders are not in the required sequence
    #[error("forest orders out of sequence: {orders:?}")]
    OrderSequence { orders: Vec<Rank> },

    /// A binomial tree of order k does not hold 2^k nodes
    #[error("binomial tree of order {order} has {nodes} nodes")]
    BinomialSize { order: Rank, nodes: usize },

    /// A recorded order or degree disagrees with the node's children
    #[error("node records rank {recorded} but has {actual} children")]
    DegreeMismatch { recorded: Rank, actual: usize },

    /// `next`/`prev` links of a ring do not mirror each other
    #[error("circular sibling ring is broken")]
    BrokenRing,

    /// A node's parent link does not name the node whose ring holds it
    #[error("parent link does not match the owning node")]
    ParentLink,

    /// A Fibonacci subtree is smaller than F(degree + 2)
    #[error("subtree of degree {degree} has only {nodes} nodes")]
    DegreeBound { degree: Rank, nodes: usize },

    /// A root carries a mark bit
    #[error("root node is marked")]
    MarkedRoot,

    /// The cached minimum is missing, not a root, or not minimal
    #[error("cached minimum does not point at a minimal root")]
    StaleMinimum,

    /// The number of reachable nodes differs from the recorded length
    #[error("reached {reachable} nodes but length is {len}")]
    LengthMismatch { reachable: usize, len: usize },
}

/// Runs `validate` after a mutation when the `check-invariants` feature is on.
macro_rules! check_invariants {
    ($heap:expr) => {
        #[cfg(feature = "check-invariants")]
        {
            if let Err(err) = $heap.validate() {
                panic!("heap invariant violated: {err}");
            }
        }
    };
}

pub(crate) use check_invariants;
