//! Kani formal verification proofs for radius arithmetic.
//!
//! These proofs cover the packed [`Varying32`] encoding and the detector-node
//! radius formulas that depend on it:
//! - Intercept/state packing is lossless in the representable range
//! - Adding a constant never disturbs the growth state
//! - State transitions preserve the value at the transition time
//! - A node claimed directly by a top-level region telescopes to
//!   `radius(top) - radius_of_arrival`
//!
//! Run with: `cargo kani --package tide-core`

use super::detector_node::DetectorNode;
use super::region::RegionTree;
use super::types::{NodeIdx, RegionIdx};
use super::varying::Varying32;

/// Largest intercept magnitude that survives the 2-bit state shift.
const MAX_INTERCEPT: i32 = 1 << 28;
/// Time range explored by the proofs.
const MAX_TIME: i32 = 1 << 20;

/// Three-level blossom chain backed by fixed arrays.
struct ChainFixture {
    radii: [Varying32; 3],
    parents: [Option<RegionIdx>; 3],
}

impl RegionTree for ChainFixture {
    fn radius(&self, region: RegionIdx) -> Varying32 {
        self.radii[region.index()]
    }

    fn blossom_parent(&self, region: RegionIdx) -> Option<RegionIdx> {
        self.parents[region.index()]
    }
}

// ============================================================================
// Proof 1: Packing round-trip
// ============================================================================
// File: varying.rs (pack, y_intercept, slope)
// What: y_intercept() and slope() recover the constructor arguments
// Why: A lost bit → every radius query downstream is wrong

/// Verify that every constructor round-trips through the packed word.
#[kani::proof]
fn verify_packing_round_trip() {
    let y: i32 = kani::any();
    kani::assume(y > -MAX_INTERCEPT && y < MAX_INTERCEPT);

    let g = Varying32::growing(y);
    let s = Varying32::shrinking(y);
    let f = Varying32::frozen(y);

    kani::assert(g.y_intercept() == y && g.slope() == 1, "growing round-trip");
    kani::assert(s.y_intercept() == y && s.slope() == -1, "shrinking round-trip");
    kani::assert(f.y_intercept() == y && f.slope() == 0, "frozen round-trip");
}

// ============================================================================
// Proof 2: Constant addition keeps the state
// ============================================================================
// File: varying.rs (Add<Radius>)
// What: (v + c).y_intercept() == v.y_intercept() + c, same slope
// Why: local_radius adds the wrapped radius to the top region's radius

/// Verify that adding a constant shifts the intercept only.
#[kani::proof]
fn verify_add_constant_preserves_state() {
    let y: i32 = kani::any();
    let c: i32 = kani::any();
    let state: u8 = kani::any();
    kani::assume(y > -MAX_INTERCEPT && y < MAX_INTERCEPT);
    kani::assume(c > -MAX_INTERCEPT && c < MAX_INTERCEPT);
    kani::assume(state < 3);

    let v = match state {
        0 => Varying32::frozen(y),
        1 => Varying32::growing(y),
        _ => Varying32::shrinking(y),
    };
    let sum = v + c;

    kani::assert(sum.y_intercept() == y + c, "intercept shifted by c");
    kani::assert(sum.slope() == v.slope(), "slope unchanged");
}

// ============================================================================
// Proof 3: Transitions are continuous
// ============================================================================
// File: varying.rs (then_frozen_at_time, then_growing_at_time, then_shrinking_at_time)
// What: The new line passes through the old value at the transition time
// Why: Blossom formation freezes children; a jump would corrupt offsets

/// Verify that state transitions keep the value at the transition time.
#[kani::proof]
fn verify_transitions_continuous() {
    let y: i32 = kani::any();
    let t: i32 = kani::any();
    kani::assume(y > -MAX_INTERCEPT / 2 && y < MAX_INTERCEPT / 2);
    kani::assume(t >= 0 && t < MAX_TIME);

    let v = Varying32::growing(y);
    let at_t = v.get_distance_at_time(t);

    kani::assert(v.then_frozen_at_time(t).get_distance_at_time(t) == at_t, "freeze");
    kani::assert(v.then_growing_at_time(t).get_distance_at_time(t) == at_t, "grow");
    kani::assert(v.then_shrinking_at_time(t).get_distance_at_time(t) == at_t, "shrink");
}

// ============================================================================
// Proof 4: Telescoping for direct claims
// ============================================================================
// File: detector_node.rs (compute_wrapped_radius, local_radius)
// What: arrived == top ⇒ wrapped == -radius_of_arrival
// Why: The common case must not pick up offsets from unrelated regions

/// Verify the telescoping property for a node claimed by a top-level region.
#[kani::proof]
fn verify_direct_claim_telescopes() {
    let roa: i32 = kani::any();
    let claim_time: i32 = kani::any();
    let now: i32 = kani::any();
    kani::assume(roa >= 0 && roa < MAX_TIME);
    kani::assume(claim_time >= 0 && claim_time < MAX_TIME);
    kani::assume(now >= claim_time && now < MAX_TIME);

    let fixture = ChainFixture {
        radii: [
            Varying32::growing_varying_with_zero_distance_at_time(0),
            Varying32::frozen(kani::any()),
            Varying32::frozen(kani::any()),
        ],
        parents: [None, None, None],
    };
    let node = DetectorNode {
        reached_from_source: Some(NodeIdx(0)),
        radius_of_arrival: roa,
        region_that_arrived: Some(RegionIdx(0)),
        region_that_arrived_top: Some(RegionIdx(0)),
        ..DetectorNode::default()
    };

    kani::assert(node.compute_wrapped_radius(&fixture) == -roa, "wrapped == -roa");
    kani::assert(
        node.local_radius(&fixture).get_distance_at_time(now) == now - roa,
        "local == radius(top) - roa",
    );
}

// ============================================================================
// Proof 5: Nested claim sums frozen offsets
// ============================================================================
// File: detector_node.rs (compute_wrapped_radius)
// What: leaf -> blossom -> top chain sums the two frozen intercepts
// Why: Each nesting level must contribute exactly once

/// Verify the wrapped radius over a two-step blossom chain.
#[kani::proof]
fn verify_nested_chain_sums_offsets() {
    let leaf_offset: i32 = kani::any();
    let mid_offset: i32 = kani::any();
    let roa: i32 = kani::any();
    kani::assume(leaf_offset >= 0 && leaf_offset < MAX_TIME);
    kani::assume(mid_offset >= 0 && mid_offset < MAX_TIME);
    kani::assume(roa >= 0 && roa <= leaf_offset);

    let fixture = ChainFixture {
        radii: [
            Varying32::frozen(leaf_offset),
            Varying32::frozen(mid_offset),
            Varying32::growing(0),
        ],
        parents: [Some(RegionIdx(1)), Some(RegionIdx(2)), None],
    };
    let node = DetectorNode {
        reached_from_source: Some(NodeIdx(0)),
        radius_of_arrival: roa,
        region_that_arrived: Some(RegionIdx(0)),
        region_that_arrived_top: Some(RegionIdx(2)),
        ..DetectorNode::default()
    };

    kani::assert(
        node.compute_wrapped_radius(&fixture) == leaf_offset + mid_offset - roa,
        "wrapped == sum of offsets - roa",
    );
}
