//! Builder for [`MatchingGraph`] construction.
//!
//! The builder validates an edge list, lays it out in compressed sparse row
//! form inside an [`Arena`], and wires every [`DetectorNode`] to its slice of
//! the neighbor list. All checks happen here, once, so the per-run operations
//! can assume a well-formed graph.
//!
//! # Example
//!
//! ```
//! use tide_core::{Arena, EdgeSpec, GraphBuilder, NodeIdx};
//!
//! let edges = [
//!     EdgeSpec::boundary(0, 2, 0b1),
//!     EdgeSpec::new(0, 1, 4, 0),
//!     EdgeSpec::new(1, 2, 6, 0),
//! ];
//! let builder = GraphBuilder::new(3).edges(&edges).num_observables(1);
//!
//! let mut buffer = vec![0u8; builder.required_buffer_size()];
//! let mut arena = Arena::new(&mut buffer);
//! let graph = builder.build(&mut arena).unwrap();
//!
//! assert_eq!(graph.edge_weight(NodeIdx(1), NodeIdx(2)), Ok(6));
//! assert_eq!(graph.edge_observables(NodeIdx(0), NodeIdx::BOUNDARY), Ok(0b1));
//! ```

use super::detector_node::DetectorNode;
use super::graph::MatchingGraph;
use super::region::RegionArena;
use super::types::{EdgeSpec, NodeIdx, ObsMask, MAX_OBSERVABLES};
use crate::arena::{required_buffer_size, Arena};
use crate::error::FloodError;

/// Builder for a [`MatchingGraph`] and its [`RegionArena`].
#[derive(Debug, Clone, Copy)]
pub struct GraphBuilder<'e> {
    num_nodes: usize,
    edges: &'e [EdgeSpec],
    num_observables: usize,
    region_capacity: Option<usize>,
}

impl<'e> GraphBuilder<'e> {
    /// Starts a graph with `num_nodes` detector nodes and no edges.
    #[must_use]
    pub const fn new(num_nodes: usize) -> Self {
        Self {
            num_nodes,
            edges: &[],
            num_observables: 0,
            region_capacity: None,
        }
    }

    /// Sets the edge list. Order is preserved in each node's adjacency.
    #[must_use]
    pub const fn edges(mut self, edges: &'e [EdgeSpec]) -> Self {
        self.edges = edges;
        self
    }

    /// Sets the number of observables edge masks may use.
    #[must_use]
    pub const fn num_observables(mut self, num_observables: usize) -> Self {
        self.num_observables = num_observables;
        self
    }

    /// Sets the region pool capacity.
    ///
    /// Defaults to twice the node count: one leaf region per detection event
    /// plus at most one blossom per merge.
    #[must_use]
    pub const fn region_capacity(mut self, capacity: usize) -> Self {
        self.region_capacity = Some(capacity);
        self
    }

    /// Configured region capacity, or the default.
    #[must_use]
    pub const fn effective_region_capacity(&self) -> usize {
        match self.region_capacity {
            Some(c) => c,
            None => self.num_nodes * 2,
        }
    }

    /// Buffer size sufficient for [`build_with_regions`](Self::build_with_regions).
    #[must_use]
    pub const fn required_buffer_size(&self) -> usize {
        required_buffer_size(
            self.num_nodes,
            self.edges.len(),
            self.effective_region_capacity(),
        )
    }

    fn validate(&self) -> Result<(), FloodError> {
        if self.num_observables > MAX_OBSERVABLES {
            return Err(FloodError::ObservableOutOfRange {
                observable: self.num_observables - 1,
                num_observables: MAX_OBSERVABLES,
            });
        }

        for e in self.edges {
            if e.u.is_boundary() || e.u.index() >= self.num_nodes {
                return Err(FloodError::NodeOutOfRange {
                    node: e.u,
                    num_nodes: self.num_nodes,
                });
            }
            if !e.v.is_boundary() && e.v.index() >= self.num_nodes {
                return Err(FloodError::NodeOutOfRange {
                    node: e.v,
                    num_nodes: self.num_nodes,
                });
            }
            if e.u == e.v {
                return Err(FloodError::SelfLoop { node: e.u });
            }
            if self.num_observables < MAX_OBSERVABLES && e.observables >> self.num_observables != 0 {
                return Err(FloodError::ObservableOutOfRange {
                    observable: (ObsMask::BITS - 1 - e.observables.leading_zeros()) as usize,
                    num_observables: self.num_observables,
                });
            }
        }
        Ok(())
    }

    /// Validates the edge list and builds the graph.
    ///
    /// # Errors
    ///
    /// * [`FloodError::NodeOutOfRange`], [`FloodError::SelfLoop`],
    ///   [`FloodError::DuplicateEdge`] or [`FloodError::ObservableOutOfRange`]
    ///   for a malformed edge list.
    /// * [`FloodError::ArenaExhausted`] if the arena is too small.
    pub fn build<'a>(&self, arena: &mut Arena<'a>) -> Result<MatchingGraph<'a>, FloodError> {
        self.validate()?;
        let n = self.num_nodes;

        // Degree count into offsets[1..], then prefix sum to row starts.
        let offsets = arena.alloc_slice::<u32>(n + 1, 0)?;
        for e in self.edges {
            offsets[e.u.index() + 1] += 1;
            if !e.v.is_boundary() {
                offsets[e.v.index() + 1] += 1;
            }
        }
        for i in 0..n {
            offsets[i + 1] += offsets[i];
        }
        let num_slots = offsets[n] as usize;

        let neighbor_list = arena.alloc_slice_aligned(num_slots, 64, NodeIdx::BOUNDARY)?;
        let weights = arena.alloc_slice(num_slots, 0)?;
        let observables = arena.alloc_slice::<ObsMask>(num_slots, 0)?;

        // offsets[i] doubles as the write cursor of row i, ending at row i + 1's start.
        for e in self.edges {
            let s = offsets[e.u.index()] as usize;
            neighbor_list[s] = e.v;
            weights[s] = e.weight;
            observables[s] = e.observables;
            offsets[e.u.index()] += 1;

            if !e.v.is_boundary() {
                let s = offsets[e.v.index()] as usize;
                neighbor_list[s] = e.u;
                weights[s] = e.weight;
                observables[s] = e.observables;
                offsets[e.v.index()] += 1;
            }
        }
        for i in (1..=n).rev() {
            offsets[i] = offsets[i - 1];
        }
        offsets[0] = 0;

        let neighbor_list: &'a [NodeIdx] = neighbor_list;
        let nodes = arena.alloc_slice_aligned(n, 64, DetectorNode::default())?;
        for (i, node) in nodes.iter_mut().enumerate() {
            let row = &neighbor_list[offsets[i] as usize..offsets[i + 1] as usize];
            for (k, &a) in row.iter().enumerate() {
                if row[..k].contains(&a) {
                    return Err(FloodError::DuplicateEdge {
                        u: NodeIdx(i as u32),
                        v: a,
                    });
                }
            }
            node.neighbors = row;
        }

        let dirty_mask = arena.alloc_slice_aligned::<u64>(n.div_ceil(64), 64, 0)?;

        tracing::debug!(
            nodes = n,
            edges = self.edges.len(),
            observables = self.num_observables,
            bytes = arena.used(),
            "matching graph built"
        );

        Ok(MatchingGraph {
            nodes,
            offsets,
            weights,
            observables,
            dirty_mask,
            num_observables: self.num_observables,
        })
    }

    /// Builds the graph and a region pool of the configured capacity from
    /// the same arena.
    ///
    /// # Errors
    ///
    /// Same as [`build`](Self::build).
    pub fn build_with_regions<'a>(
        &self,
        arena: &mut Arena<'a>,
    ) -> Result<(MatchingGraph<'a>, RegionArena<'a>), FloodError> {
        let graph = self.build(arena)?;
        let regions = RegionArena::new(arena, self.effective_region_capacity())?;
        Ok((graph, regions))
    }
}
