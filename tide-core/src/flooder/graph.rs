//! The decoding graph: detector nodes plus per-edge data.
//!
//! Adjacency is stored in compressed sparse row form. Node `i` owns slots
//! `offsets[i]..offsets[i + 1]` of the flat neighbor, weight and observable
//! arrays, and its [`DetectorNode::neighbors`] slice views exactly those
//! slots, so position `k` in a node's neighbor list is also the position of
//! that edge's weight and observables.
//!
//! ```text
//! offsets:     [0,    2,       5,   6]
//! neighbors:   [1, B, 0, 2, B, 1]        B = NodeIdx::BOUNDARY
//! weights:     [4, 2, 4, 6, 2, 6]
//!               \__/  \_____/  |
//!              node 0  node 1  node 2
//! ```
//!
//! # Sparse Reset
//!
//! A decoding run usually touches a small fraction of the graph. Every node
//! written through the graph is flagged in a dirty bitmask, and
//! [`MatchingGraph::reset`] clears only flagged nodes, giving O(touched)
//! reuse between runs.

use super::detector_node::DetectorNode;
use super::event_tracker::NodeEventTracker;
use super::region::RegionTree;
use super::types::{NodeIdx, ObsMask, RegionIdx, Time, Weight};
use crate::error::FloodError;

/// Arena-backed decoding graph. Build it with [`GraphBuilder`](crate::GraphBuilder).
pub struct MatchingGraph<'a> {
    pub(crate) nodes: &'a mut [DetectorNode<'a>],
    pub(crate) offsets: &'a [u32],
    pub(crate) weights: &'a [Weight],
    pub(crate) observables: &'a [ObsMask],
    pub(crate) dirty_mask: &'a mut [u64],
    pub(crate) num_observables: usize,
}

impl<'a> MatchingGraph<'a> {
    /// Number of detector nodes.
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of observables edges may flip.
    #[inline]
    pub fn num_observables(&self) -> usize {
        self.num_observables
    }

    /// Number of nodes claimed in the current run. O(touched).
    pub fn num_claimed(&self) -> usize {
        self.claimed_nodes().count()
    }

    /// All detector nodes, indexed by [`NodeIdx`].
    #[inline]
    pub fn nodes(&self) -> &[DetectorNode<'a>] {
        self.nodes
    }

    #[inline(always)]
    fn check(&self, node: NodeIdx) -> Result<usize, FloodError> {
        let i = node.index();
        if i < self.nodes.len() {
            Ok(i)
        } else {
            Err(FloodError::NodeOutOfRange {
                node,
                num_nodes: self.nodes.len(),
            })
        }
    }

    #[inline(always)]
    fn mark_node_dirty(&mut self, i: usize) {
        self.dirty_mask[i >> 6] |= 1 << (i & 63);
    }

    /// The node behind `node`.
    ///
    /// # Errors
    ///
    /// [`FloodError::NodeOutOfRange`] for a handle outside the graph.
    #[inline]
    pub fn node(&self, node: NodeIdx) -> Result<&DetectorNode<'a>, FloodError> {
        let i = self.check(node)?;
        Ok(&self.nodes[i])
    }

    /// Mutable access to a node, for schedulers that write claim fields directly.
    ///
    /// The node is flagged for the next sparse [`reset`](Self::reset). Callers
    /// that change `region_that_arrived_top` must call
    /// [`DetectorNode::refresh_radius_cache`] afterwards.
    ///
    /// # Errors
    ///
    /// [`FloodError::NodeOutOfRange`] for a handle outside the graph.
    pub fn node_mut(&mut self, node: NodeIdx) -> Result<&mut DetectorNode<'a>, FloodError> {
        let i = self.check(node)?;
        self.mark_node_dirty(i);
        Ok(&mut self.nodes[i])
    }

    /// Event tracker of `node`, flagged for the next sparse reset.
    ///
    /// # Errors
    ///
    /// [`FloodError::NodeOutOfRange`] for a handle outside the graph.
    pub fn event_tracker_mut(&mut self, node: NodeIdx) -> Result<&mut NodeEventTracker, FloodError> {
        Ok(&mut self.node_mut(node)?.node_event_tracker)
    }

    /// Weight of the `k`-th edge of `node`, or `None` if out of range.
    #[inline]
    pub fn neighbor_weight(&self, node: NodeIdx, k: usize) -> Option<Weight> {
        self.slot(node, k).map(|s| self.weights[s])
    }

    /// Observables of the `k`-th edge of `node`, or `None` if out of range.
    #[inline]
    pub fn neighbor_observables(&self, node: NodeIdx, k: usize) -> Option<ObsMask> {
        self.slot(node, k).map(|s| self.observables[s])
    }

    #[inline(always)]
    fn slot(&self, node: NodeIdx, k: usize) -> Option<usize> {
        let i = node.index();
        if i >= self.nodes.len() || k >= self.nodes[i].neighbors.len() {
            return None;
        }
        Some(self.offsets[i] as usize + k)
    }

    /// Slot of edge `(u, v)` in the per-edge arrays, as seen from `u`.
    fn edge_slot(&self, u: NodeIdx, v: NodeIdx) -> Result<usize, FloodError> {
        let i = self.check(u)?;
        let k = self.nodes[i]
            .index_of_neighbor(v)
            .map_err(|_| FloodError::NotAnEdge { u, v })?;
        Ok(self.offsets[i] as usize + k)
    }

    /// Weight of edge `(u, v)`. `v` may be [`NodeIdx::BOUNDARY`].
    ///
    /// # Errors
    ///
    /// [`FloodError::NotAnEdge`] if `v` is not adjacent to `u`.
    pub fn edge_weight(&self, u: NodeIdx, v: NodeIdx) -> Result<Weight, FloodError> {
        Ok(self.weights[self.edge_slot(u, v)?])
    }

    /// Observables flipped by edge `(u, v)`. `v` may be [`NodeIdx::BOUNDARY`].
    ///
    /// # Errors
    ///
    /// [`FloodError::NotAnEdge`] if `v` is not adjacent to `u`.
    pub fn edge_observables(&self, u: NodeIdx, v: NodeIdx) -> Result<ObsMask, FloodError> {
        Ok(self.observables[self.edge_slot(u, v)?])
    }

    /// Records that `region`, grown from `source`, reached `node` at `time`.
    ///
    /// The arrival radius is the claiming region's radius at `time`, the top
    /// region is looked up through the blossom chain, and the radius cache is
    /// filled.
    ///
    /// # Errors
    ///
    /// * [`FloodError::NodeOutOfRange`] for a handle outside the graph.
    /// * [`FloodError::AlreadyClaimed`] if the node was claimed in this run.
    pub fn claim<R: RegionTree + ?Sized>(
        &mut self,
        node: NodeIdx,
        source: NodeIdx,
        region: RegionIdx,
        regions: &R,
        time: Time,
        observables: ObsMask,
    ) -> Result<(), FloodError> {
        let i = self.check(node)?;
        if self.nodes[i].is_claimed() {
            return Err(FloodError::AlreadyClaimed { node });
        }

        let n = &mut self.nodes[i];
        n.reached_from_source = Some(source);
        n.radius_of_arrival = regions.radius(region).get_distance_at_time(time);
        n.region_that_arrived = Some(region);
        n.region_that_arrived_top = Some(regions.top_region(region));
        n.observables_crossed_from_source = observables;
        n.refresh_radius_cache(regions);

        self.mark_node_dirty(i);
        Ok(())
    }

    /// Moves the owner of a claimed node to `top`, an ancestor of the region
    /// that claimed it, and refreshes the radius cache.
    ///
    /// # Errors
    ///
    /// * [`FloodError::NotClaimed`] if the node is unclaimed.
    /// * [`FloodError::RegionNotInChain`] if `top` is not in the node's blossom chain.
    pub fn restamp_top<R: RegionTree + ?Sized>(
        &mut self,
        node: NodeIdx,
        top: RegionIdx,
        regions: &R,
    ) -> Result<(), FloodError> {
        let i = self.check(node)?;
        let Some(arrived) = self.nodes[i].region_that_arrived else {
            return Err(FloodError::NotClaimed { node });
        };
        if !regions.is_in_chain(arrived, top) {
            return Err(FloodError::RegionNotInChain { node, region: top });
        }

        let n = &mut self.nodes[i];
        n.region_that_arrived_top = Some(top);
        n.refresh_radius_cache(regions);
        self.mark_node_dirty(i);
        Ok(())
    }

    /// Re-stamps every claimed node with the current top of its blossom chain.
    ///
    /// Call after blossoms are formed or shattered. Returns the number of
    /// nodes whose owner changed.
    pub fn refresh_tops<R: RegionTree + ?Sized>(&mut self, regions: &R) -> usize {
        let mut changed = 0;
        for word_idx in 0..self.dirty_mask.len() {
            let mut w = self.dirty_mask[word_idx];
            while w != 0 {
                let bit = w.trailing_zeros() as usize;
                w &= w - 1;
                let n = &mut self.nodes[word_idx * 64 + bit];
                let Some(arrived) = n.region_that_arrived else {
                    continue;
                };
                let top = Some(regions.top_region(arrived));
                if n.region_that_arrived_top != top {
                    n.region_that_arrived_top = top;
                    changed += 1;
                }
                n.refresh_radius_cache(regions);
            }
        }
        changed
    }

    /// Nodes claimed in the current run, in index order.
    pub fn claimed_nodes(&self) -> impl Iterator<Item = NodeIdx> + '_ {
        self.dirty_nodes()
            .filter(|&i| self.nodes[i].is_claimed())
            .map(|i| NodeIdx(i as u32))
    }

    fn dirty_nodes(&self) -> impl Iterator<Item = usize> + '_ {
        self.dirty_mask
            .iter()
            .enumerate()
            .flat_map(|(word_idx, &word)| {
                let mut w = word;
                core::iter::from_fn(move || {
                    if w == 0 {
                        return None;
                    }
                    let bit = w.trailing_zeros() as usize;
                    w &= w - 1;
                    Some(word_idx * 64 + bit)
                })
            })
    }

    /// First claimed node whose cached wrapped radius disagrees with a
    /// from-scratch recomputation, or `None` if every cache is current.
    pub fn find_stale_radius_cache<R: RegionTree + ?Sized>(&self, regions: &R) -> Option<NodeIdx> {
        self.claimed_nodes().find(|&n| {
            let node = &self.nodes[n.index()];
            node.accumulated_radius_cached != node.compute_wrapped_radius(regions)
        })
    }

    /// Resets the nodes touched since the last reset.
    ///
    /// O(touched). Adjacency and per-edge data are kept.
    pub fn reset(&mut self) {
        let mut cleared = 0usize;
        for word_idx in 0..self.dirty_mask.len() {
            let mut w = self.dirty_mask[word_idx];
            self.dirty_mask[word_idx] = 0;
            while w != 0 {
                let bit = w.trailing_zeros() as usize;
                w &= w - 1;
                self.nodes[word_idx * 64 + bit].reset();
                cleared += 1;
            }
        }
        tracing::debug!(cleared, "sparse graph reset");
    }

    /// Resets every node regardless of dirty tracking.
    ///
    /// O(nodes). Prefer [`reset`](Self::reset) between runs.
    pub fn reset_all(&mut self) {
        for node in self.nodes.iter_mut() {
            node.reset();
        }
        self.dirty_mask.fill(0);
        tracing::debug!(nodes = self.nodes.len(), "full graph reset");
    }
}
