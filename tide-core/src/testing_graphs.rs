//! Standard decoding graphs for tests and benchmarks.
//!
//! Edge lists are produced lazily so they can be consumed without an
//! allocator; collect them into a `Vec` on `std` targets.

use crate::flooder::types::{EdgeSpec, NodeIdx, Weight};

/// Configuration of a square-lattice decoding graph with open left/right
/// boundaries, the matching graph of one round of a surface code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphConfig {
    /// Columns of detector nodes.
    pub width: usize,
    /// Rows of detector nodes.
    pub height: usize,
    /// Weight of every edge.
    pub weight: Weight,
}

impl GraphConfig {
    /// A `width x height` lattice with uniform edge weight.
    #[must_use]
    pub const fn new(width: usize, height: usize, weight: Weight) -> Self {
        Self {
            width,
            height,
            weight,
        }
    }

    /// A repetition code of `num_nodes` detectors: a single row.
    #[must_use]
    pub const fn repetition(num_nodes: usize, weight: Weight) -> Self {
        Self::new(num_nodes, 1, weight)
    }

    /// Number of detector nodes.
    #[must_use]
    pub const fn num_nodes(&self) -> usize {
        self.width * self.height
    }

    /// Number of edges, boundary edges included.
    #[must_use]
    pub const fn num_edges(&self) -> usize {
        if self.width == 0 || self.height == 0 {
            return 0;
        }
        let horizontal = (self.width - 1) * self.height;
        let vertical = self.width * (self.height - 1);
        let boundary = 2 * self.height;
        horizontal + vertical + boundary
    }

    /// Handle of the node at column `x`, row `y`.
    #[must_use]
    pub const fn node(&self, x: usize, y: usize) -> NodeIdx {
        NodeIdx((y * self.width + x) as u32)
    }

    /// Edge list in row-major order.
    ///
    /// For each node: its left boundary edge (column 0, flips observable 0),
    /// its right neighbor or right boundary edge, then its lower neighbor.
    pub fn edges(&self) -> impl Iterator<Item = EdgeSpec> + '_ {
        let w = self.width;
        let h = self.height;
        let weight = self.weight;
        (0..h).flat_map(move |y| {
            (0..w).flat_map(move |x| {
                let u = (y * w + x) as u32;
                let left = (x == 0).then(|| EdgeSpec::boundary(u, weight, 1));
                let right = if x + 1 < w {
                    Some(EdgeSpec::new(u, u + 1, weight, 0))
                } else {
                    Some(EdgeSpec::boundary(u, weight, 0))
                };
                let down = (y + 1 < h).then(|| EdgeSpec::new(u, u + w as u32, weight, 0));
                left.into_iter().chain(right).chain(down)
            })
        })
    }
}

/// Preset graphs, smallest first.
pub struct TestGraphs;

impl TestGraphs {
    /// 5-node repetition code.
    pub const REPETITION_5: GraphConfig = GraphConfig::repetition(5, 2);
    /// 17-node repetition code.
    pub const REPETITION_17: GraphConfig = GraphConfig::repetition(17, 2);
    /// 8x8 lattice.
    pub const TINY: GraphConfig = GraphConfig::new(8, 8, 2);
    /// 32x32 lattice.
    pub const MEDIUM: GraphConfig = GraphConfig::new(32, 32, 2);
    /// 64x64 lattice.
    pub const LARGE: GraphConfig = GraphConfig::new(64, 64, 2);

    /// All presets.
    pub const ALL: [GraphConfig; 5] = [
        Self::REPETITION_5,
        Self::REPETITION_17,
        Self::TINY,
        Self::MEDIUM,
        Self::LARGE,
    ];
}
