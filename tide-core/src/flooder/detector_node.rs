//! Per-vertex state of the decoding graph.
//!
//! A [`DetectorNode`] records whether a growing region has claimed it, which
//! leaf region did so, which region currently owns it at the top of the
//! blossom hierarchy, and how far the claiming region had grown at the time.
//! From that record alone, plus the live radii of the regions in its blossom
//! chain, the node can answer "how far am I from my source right now".
//!
//! # Radius Bookkeeping
//!
//! When a blossom forms, the radius each child had reached is frozen into
//! the child as a constant, and the blossom grows from zero. The distance
//! covered below the current top region is therefore the sum of the frozen
//! intercepts of every region strictly below the top, minus the part of the
//! claiming region's radius that was already spent reaching this node:
//!
//! ```text
//! wrapped = Σ y_intercept(r)  for r in [region_that_arrived .. top)
//!           - radius_of_arrival
//! local   = radius(top) + wrapped
//! ```
//!
//! Both are O(chain depth) and independent of elapsed time.

use super::event_tracker::NodeEventTracker;
use super::region::RegionTree;
use super::types::{NodeIdx, ObsMask, Radius, RegionIdx};
use super::varying::Varying32;
use crate::error::FloodError;

/// The per-vertex record of the decoding graph.
///
/// Adjacency is fixed at construction; everything else describes the claim
/// made during the current decoding run and is cleared by [`reset`](Self::reset).
///
/// # Invariants
///
/// * `reached_from_source`, `region_that_arrived` and `region_that_arrived_top`
///   are either all `None` (unclaimed, with `radius_of_arrival == 0`) or all set.
/// * Following blossom parents from `region_that_arrived` reaches
///   `region_that_arrived_top` in zero or more steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectorNode<'a> {
    /// Adjacent nodes. Position `k` indexes the graph's per-edge arrays;
    /// [`NodeIdx::BOUNDARY`] marks a boundary edge.
    pub neighbors: &'a [NodeIdx],
    /// Detection event whose growth reached this node, `None` if unclaimed.
    pub reached_from_source: Option<NodeIdx>,
    /// Radius of the claiming region at the moment of the claim.
    pub radius_of_arrival: Radius,
    /// Leaf region that claimed this node. Never changes until reset.
    pub region_that_arrived: Option<RegionIdx>,
    /// Topmost region of the blossom chain above `region_that_arrived`.
    pub region_that_arrived_top: Option<RegionIdx>,
    /// Observables crossed on the path from the source to this node.
    pub observables_crossed_from_source: ObsMask,
    /// Last computed [`compute_wrapped_radius`](Self::compute_wrapped_radius).
    pub accumulated_radius_cached: Radius,
    /// Scheduler-owned event bookkeeping.
    pub node_event_tracker: NodeEventTracker,
}

impl<'a> DetectorNode<'a> {
    /// Creates an unclaimed node with the given adjacency.
    #[must_use]
    pub fn new(neighbors: &'a [NodeIdx]) -> Self {
        Self {
            neighbors,
            ..Self::default()
        }
    }

    /// Returns `true` once a region has claimed this node in the current run.
    #[inline(always)]
    pub fn is_claimed(&self) -> bool {
        self.reached_from_source.is_some()
    }

    /// Distance covered below the current top region, net of the claiming
    /// region's radius at arrival. Zero for an unclaimed node.
    pub fn compute_wrapped_radius<R: RegionTree + ?Sized>(&self, regions: &R) -> Radius {
        let (Some(_), Some(mut r), Some(top)) = (
            self.reached_from_source,
            self.region_that_arrived,
            self.region_that_arrived_top,
        ) else {
            return 0;
        };

        let mut total: Radius = 0;
        while r != top {
            total = total.wrapping_add(regions.radius(r).y_intercept());
            match regions.blossom_parent(r) {
                Some(parent) => r = parent,
                None => {
                    debug_assert!(false, "top region {top} not in blossom chain");
                    break;
                }
            }
        }
        total.wrapping_sub(self.radius_of_arrival)
    }

    /// Current distance from this node's source, as a function of time.
    ///
    /// Frozen at zero for an unclaimed node.
    pub fn local_radius<R: RegionTree + ?Sized>(&self, regions: &R) -> Varying32 {
        match self.region_that_arrived_top {
            None => Varying32::frozen(0),
            Some(top) => regions.radius(top) + self.compute_wrapped_radius(regions),
        }
    }

    /// [`local_radius`](Self::local_radius) using the cached wrapped radius.
    ///
    /// O(1). Valid as long as the cache was refreshed after the last claim or
    /// re-stamp, which [`MatchingGraph`](crate::MatchingGraph) guarantees.
    #[inline]
    pub fn local_radius_cached<R: RegionTree + ?Sized>(&self, regions: &R) -> Varying32 {
        match self.region_that_arrived_top {
            None => Varying32::frozen(0),
            Some(top) => regions.radius(top) + self.accumulated_radius_cached,
        }
    }

    /// Recomputes the wrapped radius and stores it in the cache.
    pub fn refresh_radius_cache<R: RegionTree + ?Sized>(&mut self, regions: &R) -> Radius {
        self.accumulated_radius_cached = self.compute_wrapped_radius(regions);
        self.accumulated_radius_cached
    }

    /// Returns `true` if both nodes are currently owned by the same top region.
    ///
    /// Two unclaimed nodes compare equal, mirroring the Union-Find "same set"
    /// test on their (absent) representatives.
    #[inline(always)]
    pub fn has_same_owner_as(&self, other: &DetectorNode<'_>) -> bool {
        self.region_that_arrived_top == other.region_that_arrived_top
    }

    /// Clears the claim and event state so the node can join a new run.
    ///
    /// Adjacency is kept. Idempotent.
    pub fn reset(&mut self) {
        self.observables_crossed_from_source = 0;
        self.reached_from_source = None;
        self.radius_of_arrival = 0;
        self.region_that_arrived = None;
        self.region_that_arrived_top = None;
        self.accumulated_radius_cached = 0;
        self.node_event_tracker.clear();
    }

    /// Position of `target` in this node's adjacency list.
    ///
    /// # Errors
    ///
    /// [`FloodError::NeighborNotFound`] if `target` is not adjacent. This is a
    /// caller bug (a lookup on a pair that is not an edge) and must abort the run.
    #[inline]
    pub fn index_of_neighbor(&self, target: NodeIdx) -> Result<usize, FloodError> {
        self.neighbors
            .iter()
            .position(|&n| n == target)
            .ok_or(FloodError::NeighborNotFound { target })
    }
}
