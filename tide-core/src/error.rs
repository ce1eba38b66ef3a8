//! Error type shared by every fallible operation in the crate.
//!
//! Most variants describe a broken caller contract (an adjacency pair that is
//! not an edge, a claim on an already-claimed node, a handle that does not sit
//! in a node's blossom chain). They are surfaced as values so the run driver
//! can abort the current decoding run, never to be retried.

use crate::flooder::types::{NodeIdx, RegionIdx};

/// Errors produced while building or driving a [`MatchingGraph`](crate::MatchingGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FloodError {
    /// `target` is not present in the adjacency list that was searched.
    #[error("failed to find neighbor {target}")]
    NeighborNotFound {
        /// Node that was looked for.
        target: NodeIdx,
    },

    /// An edge lookup named a pair of nodes that are not adjacent.
    #[error("({u}, {v}) is not an edge of the graph")]
    NotAnEdge {
        /// Node whose adjacency list was searched.
        u: NodeIdx,
        /// Node that was looked for.
        v: NodeIdx,
    },

    /// The backing arena cannot satisfy an allocation.
    #[error("arena exhausted: requested {requested} bytes, {available} available")]
    ArenaExhausted {
        /// Bytes requested, including alignment padding.
        requested: usize,
        /// Bytes left in the buffer.
        available: usize,
    },

    /// Every region slot is live.
    #[error("region pool exhausted (capacity {capacity})")]
    RegionPoolExhausted {
        /// Configured pool capacity.
        capacity: usize,
    },

    /// A node handle does not address a node of this graph.
    #[error("node {node} out of range (graph has {num_nodes} nodes)")]
    NodeOutOfRange {
        /// Offending handle.
        node: NodeIdx,
        /// Number of nodes in the graph.
        num_nodes: usize,
    },

    /// An edge connects a node to itself.
    #[error("self-loop at node {node}")]
    SelfLoop {
        /// Node with the loop.
        node: NodeIdx,
    },

    /// The same pair of endpoints appears twice in the edge list.
    #[error("duplicate edge ({u}, {v})")]
    DuplicateEdge {
        /// First endpoint.
        u: NodeIdx,
        /// Second endpoint.
        v: NodeIdx,
    },

    /// An edge flips an observable the graph was not configured with.
    #[error("observable {observable} out of range (graph has {num_observables} observables)")]
    ObservableOutOfRange {
        /// Highest observable index set in the edge mask.
        observable: usize,
        /// Configured number of observables.
        num_observables: usize,
    },

    /// The node was already claimed during this run.
    #[error("node {node} is already claimed")]
    AlreadyClaimed {
        /// Claimed node.
        node: NodeIdx,
    },

    /// The node has not been claimed during this run.
    #[error("node {node} is not claimed")]
    NotClaimed {
        /// Unclaimed node.
        node: NodeIdx,
    },

    /// `region` is not an ancestor of the region that claimed `node`.
    #[error("region {region} is not in the blossom chain of node {node}")]
    RegionNotInChain {
        /// Node being re-stamped.
        node: NodeIdx,
        /// Proposed top region.
        region: RegionIdx,
    },

    /// A blossom operation named a region that is nested in another blossom.
    #[error("region {region} is not top-level")]
    RegionNotTopLevel {
        /// Nested region.
        region: RegionIdx,
    },

    /// A handle refers to a region slot that has been returned to the pool.
    #[error("region {region} has been reclaimed")]
    RegionReclaimed {
        /// Stale handle.
        region: RegionIdx,
    },
}
