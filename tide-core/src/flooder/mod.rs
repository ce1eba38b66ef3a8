// =============================================================================
// Flooder Submodules
// =============================================================================

/// Graph construction from an edge list.
pub mod builder;

/// Per-vertex claim state and radius queries.
pub mod detector_node;

/// Scheduler-owned per-node event bookkeeping.
pub mod event_tracker;

/// CSR decoding graph with sparse reset.
pub mod graph;

/// Growing regions, blossoms and the region pool.
pub mod region;

/// Handles and scalar type aliases.
pub mod types;

/// Linear-in-time radius values.
pub mod varying;

/// Kani formal verification proofs for radius arithmetic.
#[cfg(kani)]
mod kani_proofs;

// =============================================================================
// Public Re-exports
// =============================================================================

pub use builder::GraphBuilder;
pub use detector_node::DetectorNode;
pub use event_tracker::{DequeueDecision, NodeEventTracker};
pub use graph::MatchingGraph;
pub use region::{GraphFillRegion, RegionArena, RegionTree};
pub use types::{EdgeSpec, NodeIdx, ObsMask, Radius, RegionIdx, Time, Weight, MAX_OBSERVABLES};
pub use varying::Varying32;
