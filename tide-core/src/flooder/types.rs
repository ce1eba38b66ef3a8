// =============================================================================
// Handles and Scalar Types
// =============================================================================

use core::fmt;

/// Observable bitmask. Bit `k` set means observable `k` is flipped.
pub type ObsMask = u64;

/// Integer edge weight.
pub type Weight = u32;

/// Signed radius / distance in weight units.
pub type Radius = i32;

/// Global flooding time. Every [`Varying32`](crate::Varying32) is evaluated
/// against the same shared clock.
pub type Time = i32;

/// Maximum number of observables an [`ObsMask`] can carry.
pub const MAX_OBSERVABLES: usize = ObsMask::BITS as usize;

/// Handle of a detector node inside a [`MatchingGraph`](crate::MatchingGraph).
///
/// Handles are plain indices into the graph's node slice, so they stay valid
/// across [`reset`](crate::MatchingGraph::reset) and can be compared cheaply.
/// [`NodeIdx::BOUNDARY`] stands for the virtual boundary in adjacency lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct NodeIdx(pub u32);

impl NodeIdx {
    /// Sentinel for a boundary edge endpoint.
    pub const BOUNDARY: NodeIdx = NodeIdx(u32::MAX);

    /// Returns `true` for the boundary sentinel.
    #[inline(always)]
    pub const fn is_boundary(self) -> bool {
        self.0 == u32::MAX
    }

    /// The handle as a slice index.
    #[inline(always)]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_boundary() {
            f.write_str("boundary")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Handle of a growing region inside a [`RegionArena`](crate::RegionArena).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct RegionIdx(pub u32);

impl RegionIdx {
    /// The handle as a slice index.
    #[inline(always)]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for RegionIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// One entry of the edge list handed to [`GraphBuilder`](crate::GraphBuilder).
///
/// Set `v` to [`NodeIdx::BOUNDARY`] for an edge from `u` to the boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeSpec {
    /// First endpoint (always a real node).
    pub u: NodeIdx,
    /// Second endpoint, or [`NodeIdx::BOUNDARY`].
    pub v: NodeIdx,
    /// Edge weight.
    pub weight: Weight,
    /// Observables flipped when a path crosses this edge.
    pub observables: ObsMask,
}

impl EdgeSpec {
    /// Edge between two detector nodes.
    #[must_use]
    pub const fn new(u: u32, v: u32, weight: Weight, observables: ObsMask) -> Self {
        Self {
            u: NodeIdx(u),
            v: NodeIdx(v),
            weight,
            observables,
        }
    }

    /// Edge from `u` to the boundary.
    #[must_use]
    pub const fn boundary(u: u32, weight: Weight, observables: ObsMask) -> Self {
        Self {
            u: NodeIdx(u),
            v: NodeIdx::BOUNDARY,
            weight,
            observables,
        }
    }
}
