//! # tide-core: Detector-Node Core for Growing-Region Matching Decoders
//!
//! `tide-core` is a `no_std`, zero-allocation library holding the per-vertex
//! state of a minimum-weight perfect matching decoder for quantum error
//! correction that works by growing regions around detection events.
//!
//! ## Overview
//!
//! A matching decoder of this kind floods the decoding graph:
//!
//! 1. **Regions grow** around every detection event at unit speed.
//! 2. **Regions claim nodes** as their radius reaches them.
//! 3. **Colliding regions merge** into nested blossoms whose radius restarts
//!    from zero while earlier growth is kept as a frozen offset.
//!
//! This crate provides the node side of that process. Each [`DetectorNode`]
//! remembers who claimed it and at what radius, and computes its current
//! distance from its source from the live radii of its blossom chain without
//! ever being updated as time passes. The event scheduler, blossom logic and
//! matching extraction that drive it live outside this crate.
//!
//! ## Quick Start
//!
//! ```
//! use tide_core::{Arena, GraphBuilder, NodeIdx, Varying32, testing_graphs::TestGraphs};
//!
//! let config = TestGraphs::REPETITION_5;
//! let edges: Vec<_> = config.edges().collect();
//! let builder = GraphBuilder::new(config.num_nodes()).edges(&edges).num_observables(1);
//!
//! let mut buffer = vec![0u8; builder.required_buffer_size()];
//! let mut arena = Arena::new(&mut buffer);
//! let (mut graph, mut regions) = builder.build_with_regions(&mut arena).unwrap();
//!
//! // A region grows from node 2, starting at t = 0, and reaches node 3 at t = 2.
//! let r = regions.alloc(Varying32::growing_varying_with_zero_distance_at_time(0)).unwrap();
//! graph.claim(NodeIdx(2), NodeIdx(2), r, &regions, 0, 0).unwrap();
//! graph.claim(NodeIdx(3), NodeIdx(2), r, &regions, 2, 0).unwrap();
//!
//! let node = graph.node(NodeIdx(3)).unwrap();
//! assert_eq!(node.local_radius(&regions).get_distance_at_time(5), 3);
//!
//! graph.reset();
//! regions.clear();
//! ```
//!
//! ## Module Organization
//!
//! - [`arena`] - Bump allocator backing every structure
//! - [`flooder`] - Detector nodes, regions, Varying radii and the graph
//! - [`error`] - The crate error type
//! - [`testing_graphs`] - Standard decoding graphs for tests and benchmarks

#![no_std]
#![deny(missing_docs)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Arena-based memory allocator for no_std environments.
pub mod arena;

/// Error type for graph construction and claim bookkeeping.
pub mod error;

/// Detector nodes, growing regions and the decoding graph.
pub mod flooder;

/// Pre-configured decoding graphs for testing and benchmarks.
pub mod testing_graphs;

/// Kani formal verification proofs for arena allocation.
#[cfg(kani)]
mod arena_kani;

// =============================================================================
// Convenience Re-exports
// =============================================================================

// Memory allocation and sizing
pub use arena::{required_buffer_size, Arena};

// Errors
pub use error::FloodError;

// Graph construction
pub use flooder::{EdgeSpec, GraphBuilder, MatchingGraph};

// Node and region state
pub use flooder::{
    DequeueDecision, DetectorNode, GraphFillRegion, NodeEventTracker, RegionArena, RegionTree,
    Varying32,
};

// Handles and scalar types
pub use flooder::{NodeIdx, ObsMask, Radius, RegionIdx, Time, Weight, MAX_OBSERVABLES};
