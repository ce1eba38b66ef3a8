//! Tests for MatchingGraph construction, edge lookups and claim bookkeeping.
//!
//! Covers:
//! - CSR adjacency order and per-edge data
//! - Edge-list validation errors
//! - Claim, restamp and refresh_tops through blossom formation and shattering
//! - Sparse reset versus full reset

#[path = "../common/mod.rs"]
mod common;

use common::{edges_of, with_graph};

use tide_core::testing_graphs::{GraphConfig, TestGraphs};
use tide_core::{
    required_buffer_size, Arena, EdgeSpec, FloodError, GraphBuilder, NodeIdx, RegionIdx,
    RegionTree, Varying32,
};

const B: NodeIdx = NodeIdx::BOUNDARY;

// =============================================================================
// Construction
// =============================================================================

#[test]
fn test_repetition_adjacency_order() {
    with_graph(&TestGraphs::REPETITION_5, |graph, _| {
        assert_eq!(graph.num_nodes(), 5);
        assert_eq!(graph.num_observables(), 1);

        let expected: [&[NodeIdx]; 5] = [
            &[B, NodeIdx(1)],
            &[NodeIdx(0), NodeIdx(2)],
            &[NodeIdx(1), NodeIdx(3)],
            &[NodeIdx(2), NodeIdx(4)],
            &[NodeIdx(3), B],
        ];
        for (i, want) in expected.iter().enumerate() {
            assert_eq!(graph.nodes()[i].neighbors, *want, "node {i}");
        }
    });
}

#[test]
fn test_lattice_degrees() {
    let config = TestGraphs::TINY;
    with_graph(&config, |graph, _| {
        // Corners on the open sides have a boundary edge, two lattice edges.
        assert_eq!(graph.node(config.node(0, 0)).unwrap().neighbors.len(), 3);
        assert_eq!(graph.node(config.node(7, 7)).unwrap().neighbors.len(), 3);
        // Interior nodes have four lattice edges.
        assert_eq!(graph.node(config.node(3, 4)).unwrap().neighbors.len(), 4);

        let total: usize = graph.nodes().iter().map(|n| n.neighbors.len()).sum();
        let boundary = 2 * config.height;
        assert_eq!(total, 2 * config.num_edges() - boundary);
    });
}

#[test]
fn test_edge_data_matches_position() {
    let edges = [
        EdgeSpec::boundary(0, 3, 0b01),
        EdgeSpec::new(0, 1, 5, 0b10),
        EdgeSpec::new(2, 1, 7, 0b11),
    ];
    let builder = GraphBuilder::new(3).edges(&edges).num_observables(2);
    let mut buffer = vec![0u8; builder.required_buffer_size()];
    let mut arena = Arena::new(&mut buffer);
    let graph = builder.build(&mut arena).unwrap();

    let one = NodeIdx(1);
    let node = graph.node(one).unwrap();
    assert_eq!(node.neighbors, &[NodeIdx(0), NodeIdx(2)]);
    assert_eq!(graph.neighbor_weight(one, 0), Some(5));
    assert_eq!(graph.neighbor_weight(one, 1), Some(7));
    assert_eq!(graph.neighbor_observables(one, 1), Some(0b11));
    assert_eq!(graph.neighbor_weight(one, 2), None);
    assert_eq!(graph.neighbor_weight(NodeIdx(9), 0), None);

    // Both directions see the same edge data.
    assert_eq!(graph.edge_weight(NodeIdx(2), one), Ok(7));
    assert_eq!(graph.edge_weight(one, NodeIdx(2)), Ok(7));
    assert_eq!(graph.edge_observables(NodeIdx(0), B), Ok(0b01));
}

#[test]
fn test_edge_lookup_not_an_edge() {
    with_graph(&TestGraphs::REPETITION_5, |graph, _| {
        assert_eq!(
            graph.edge_weight(NodeIdx(0), NodeIdx(2)),
            Err(FloodError::NotAnEdge {
                u: NodeIdx(0),
                v: NodeIdx(2)
            })
        );
        assert_eq!(
            graph.edge_observables(NodeIdx(2), B),
            Err(FloodError::NotAnEdge { u: NodeIdx(2), v: B })
        );
        assert!(matches!(
            graph.edge_weight(NodeIdx(5), NodeIdx(4)),
            Err(FloodError::NodeOutOfRange { .. })
        ));
    });
}

#[test]
fn test_isolated_nodes_and_empty_graph() {
    let builder = GraphBuilder::new(4);
    let mut buffer = vec![0u8; builder.required_buffer_size()];
    let mut arena = Arena::new(&mut buffer);
    let graph = builder.build(&mut arena).unwrap();
    assert!(graph.nodes().iter().all(|n| n.neighbors.is_empty()));

    let empty = GraphBuilder::new(0);
    let mut buffer = vec![0u8; empty.required_buffer_size()];
    let mut arena = Arena::new(&mut buffer);
    assert_eq!(empty.build(&mut arena).unwrap().num_nodes(), 0);
}

// =============================================================================
// Validation
// =============================================================================

fn build_err(num_nodes: usize, edges: &[EdgeSpec], num_observables: usize) -> FloodError {
    let builder = GraphBuilder::new(num_nodes)
        .edges(edges)
        .num_observables(num_observables);
    let mut buffer = vec![0u8; builder.required_buffer_size()];
    let mut arena = Arena::new(&mut buffer);
    match builder.build(&mut arena) {
        Ok(_) => panic!("edge list should be rejected"),
        Err(e) => e,
    }
}

#[test]
fn test_rejects_out_of_range_node() {
    assert_eq!(
        build_err(2, &[EdgeSpec::new(0, 2, 1, 0)], 0),
        FloodError::NodeOutOfRange {
            node: NodeIdx(2),
            num_nodes: 2
        }
    );
    // The boundary is only valid as the second endpoint.
    assert!(matches!(
        build_err(2, &[EdgeSpec::new(u32::MAX, 0, 1, 0)], 0),
        FloodError::NodeOutOfRange { .. }
    ));
}

#[test]
fn test_rejects_self_loop() {
    assert_eq!(
        build_err(3, &[EdgeSpec::new(1, 1, 1, 0)], 0),
        FloodError::SelfLoop { node: NodeIdx(1) }
    );
}

#[test]
fn test_rejects_duplicate_edges() {
    assert_eq!(
        build_err(3, &[EdgeSpec::new(0, 1, 1, 0), EdgeSpec::new(1, 0, 2, 0)], 0),
        FloodError::DuplicateEdge {
            u: NodeIdx(0),
            v: NodeIdx(1)
        }
    );
    assert_eq!(
        build_err(3, &[EdgeSpec::boundary(2, 1, 0), EdgeSpec::boundary(2, 1, 0)], 0),
        FloodError::DuplicateEdge { u: NodeIdx(2), v: B }
    );
}

#[test]
fn test_rejects_unknown_observables() {
    assert_eq!(
        build_err(2, &[EdgeSpec::new(0, 1, 1, 0b100)], 2),
        FloodError::ObservableOutOfRange {
            observable: 2,
            num_observables: 2
        }
    );
    assert!(matches!(
        build_err(2, &[], 65),
        FloodError::ObservableOutOfRange { .. }
    ));
}

#[test]
fn test_all_64_observables_accepted() {
    let edges = [EdgeSpec::new(0, 1, 1, u64::MAX)];
    let builder = GraphBuilder::new(2).edges(&edges).num_observables(64);
    let mut buffer = vec![0u8; builder.required_buffer_size()];
    let mut arena = Arena::new(&mut buffer);
    let graph = builder.build(&mut arena).unwrap();
    assert_eq!(graph.edge_observables(NodeIdx(0), NodeIdx(1)), Ok(u64::MAX));
}

#[test]
fn test_undersized_arena_fails() {
    let config = TestGraphs::TINY;
    let edges = edges_of(&config);
    let builder = GraphBuilder::new(config.num_nodes())
        .edges(&edges)
        .num_observables(1);
    let mut buffer = vec![0u8; 256];
    let mut arena = Arena::new(&mut buffer);
    assert!(matches!(
        builder.build(&mut arena),
        Err(FloodError::ArenaExhausted { .. })
    ));
}

#[test]
fn test_required_buffer_size_covers_every_preset() {
    for config in TestGraphs::ALL {
        let edges = edges_of(&config);
        let builder = GraphBuilder::new(config.num_nodes())
            .edges(&edges)
            .num_observables(1);
        let size = required_buffer_size(
            config.num_nodes(),
            edges.len(),
            builder.effective_region_capacity(),
        );
        assert_eq!(size, builder.required_buffer_size());

        let mut buffer = vec![0u8; size];
        let mut arena = Arena::new(&mut buffer);
        let (_, regions) = builder.build_with_regions(&mut arena).unwrap();
        assert_eq!(regions.capacity(), 2 * config.num_nodes());
        assert!(arena.used() <= size);
    }
}

// =============================================================================
// Claims
// =============================================================================

#[test]
fn test_claim_records_arrival() {
    with_graph(&TestGraphs::REPETITION_5, |graph, regions| {
        let r = regions
            .alloc(Varying32::growing_varying_with_zero_distance_at_time(2))
            .unwrap();
        graph
            .claim(NodeIdx(3), NodeIdx(2), r, &*regions, 6, 0b1)
            .unwrap();

        let n = graph.node(NodeIdx(3)).unwrap();
        assert!(n.is_claimed());
        assert_eq!(n.reached_from_source, Some(NodeIdx(2)));
        assert_eq!(n.radius_of_arrival, 4);
        assert_eq!(n.region_that_arrived, Some(r));
        assert_eq!(n.region_that_arrived_top, Some(r));
        assert_eq!(n.observables_crossed_from_source, 0b1);
        assert_eq!(n.accumulated_radius_cached, -4);
        assert_eq!(n.local_radius(&*regions).get_distance_at_time(9), 3);
        assert_eq!(graph.num_claimed(), 1);
    });
}

#[test]
fn test_claim_under_blossom_records_top() {
    with_graph(&TestGraphs::REPETITION_5, |graph, regions| {
        let a = regions.alloc(Varying32::growing(0)).unwrap();
        let b = regions.alloc(Varying32::growing(0)).unwrap();
        let blossom = regions.wrap_into_blossom(&[a, b], 3).unwrap();

        graph.claim(NodeIdx(1), NodeIdx(0), a, &*regions, 5, 0).unwrap();
        let n = graph.node(NodeIdx(1)).unwrap();
        // `a` is frozen at 3, so the arrival radius is 3 and nothing is wrapped.
        assert_eq!(n.radius_of_arrival, 3);
        assert_eq!(n.region_that_arrived_top, Some(blossom));
        assert_eq!(n.compute_wrapped_radius(&*regions), 0);
        assert_eq!(n.local_radius(&*regions).get_distance_at_time(5), 2);
    });
}

#[test]
fn test_double_claim_fails() {
    with_graph(&TestGraphs::REPETITION_5, |graph, regions| {
        let r = regions.alloc(Varying32::growing(0)).unwrap();
        graph.claim(NodeIdx(0), NodeIdx(0), r, &*regions, 0, 0).unwrap();
        assert_eq!(
            graph.claim(NodeIdx(0), NodeIdx(1), r, &*regions, 1, 0),
            Err(FloodError::AlreadyClaimed { node: NodeIdx(0) })
        );
        assert_eq!(
            graph.claim(NodeIdx(7), NodeIdx(1), r, &*regions, 1, 0),
            Err(FloodError::NodeOutOfRange {
                node: NodeIdx(7),
                num_nodes: 5
            })
        );
    });
}

#[test]
fn test_restamp_top() {
    with_graph(&TestGraphs::REPETITION_5, |graph, regions| {
        let a = regions.alloc(Varying32::growing(0)).unwrap();
        let other = regions.alloc(Varying32::growing(0)).unwrap();
        graph.claim(NodeIdx(2), NodeIdx(2), a, &*regions, 2, 0).unwrap();

        assert_eq!(
            graph.restamp_top(NodeIdx(1), a, &*regions),
            Err(FloodError::NotClaimed { node: NodeIdx(1) })
        );
        assert_eq!(
            graph.restamp_top(NodeIdx(2), other, &*regions),
            Err(FloodError::RegionNotInChain {
                node: NodeIdx(2),
                region: other
            })
        );

        let blossom = regions.wrap_into_blossom(&[a, other], 6).unwrap();
        // The recorded top is still in the chain, so the cache stays consistent.
        assert_eq!(graph.find_stale_radius_cache(&*regions), None);

        graph.restamp_top(NodeIdx(2), blossom, &*regions).unwrap();
        let n = graph.node(NodeIdx(2)).unwrap();
        assert_eq!(n.region_that_arrived_top, Some(blossom));
        assert_eq!(n.accumulated_radius_cached, 6 - 2);
        assert_eq!(graph.find_stale_radius_cache(&*regions), None);
    });
}

#[test]
fn test_refresh_tops_through_wrap_and_shatter() {
    with_graph(&TestGraphs::REPETITION_17, |graph, regions| {
        let left = regions.alloc(Varying32::growing(0)).unwrap();
        let right = regions.alloc(Varying32::growing(0)).unwrap();
        for (node, source, region, time) in [(4, 4, left, 0), (5, 4, left, 2), (9, 9, right, 0)] {
            graph
                .claim(NodeIdx(node), NodeIdx(source), region, &*regions, time, 0)
                .unwrap();
        }

        let blossom = regions.wrap_into_blossom(&[left, right], 4).unwrap();
        assert_eq!(graph.refresh_tops(&*regions), 3);
        assert_eq!(graph.refresh_tops(&*regions), 0);
        assert_eq!(graph.find_stale_radius_cache(&*regions), None);
        for n in graph.claimed_nodes() {
            assert_eq!(graph.node(n).unwrap().region_that_arrived_top, Some(blossom));
        }
        // Node 5: left frozen at 4, claimed at radius 2, blossom grown by 3.
        let five = graph.node(NodeIdx(5)).unwrap();
        assert_eq!(five.local_radius(&*regions).get_distance_at_time(7), 2 + 3);

        regions.shatter_blossom(blossom, 7).unwrap();
        assert!(!regions.is_live(blossom));
        assert_eq!(graph.refresh_tops(&*regions), 3);
        assert_eq!(graph.find_stale_radius_cache(&*regions), None);

        // `left` resumes growing from 4 at t = 7.
        let five = graph.node(NodeIdx(5)).unwrap();
        assert_eq!(five.region_that_arrived_top, Some(left));
        assert_eq!(five.local_radius(&*regions).get_distance_at_time(9), 6 - 2);
        assert_eq!(
            five.local_radius_cached(&*regions),
            five.local_radius(&*regions)
        );
    });
}

#[test]
fn test_nodes_claimed_by_blossom_released_before_shatter() {
    with_graph(&TestGraphs::REPETITION_17, |graph, regions| {
        let left = regions.alloc(Varying32::growing(0)).unwrap();
        let right = regions.alloc(Varying32::growing(0)).unwrap();
        graph.claim(NodeIdx(4), NodeIdx(4), left, &*regions, 0, 0).unwrap();
        graph.claim(NodeIdx(8), NodeIdx(8), right, &*regions, 0, 0).unwrap();

        let blossom = regions.wrap_into_blossom(&[left, right], 2).unwrap();
        graph.refresh_tops(&*regions);
        graph.claim(NodeIdx(6), NodeIdx(4), blossom, &*regions, 5, 0).unwrap();
        assert_eq!(graph.num_claimed(), 3);

        // Node 6 has no child region to fall back to once the blossom is gone.
        graph.node_mut(NodeIdx(6)).unwrap().reset();
        regions.shatter_blossom(blossom, 7).unwrap();
        assert_eq!(graph.refresh_tops(&*regions), 2);
        assert_eq!(graph.find_stale_radius_cache(&*regions), None);
        assert_eq!(graph.num_claimed(), 2);
        assert!(!graph.node(NodeIdx(6)).unwrap().is_claimed());
        assert_eq!(graph.node(NodeIdx(8)).unwrap().region_that_arrived_top, Some(right));
    });
}

#[test]
fn test_same_owner_after_blossom() {
    with_graph(&TestGraphs::REPETITION_5, |graph, regions| {
        let a = regions.alloc(Varying32::growing(0)).unwrap();
        let b = regions.alloc(Varying32::growing(0)).unwrap();
        graph.claim(NodeIdx(0), NodeIdx(0), a, &*regions, 0, 0).unwrap();
        graph.claim(NodeIdx(4), NodeIdx(4), b, &*regions, 0, 0).unwrap();

        let (n0, n4) = (graph.nodes()[0], graph.nodes()[4]);
        assert!(!n0.has_same_owner_as(&n4));

        regions.wrap_into_blossom(&[a, b], 1).unwrap();
        graph.refresh_tops(&*regions);
        let (n0, n4) = (graph.nodes()[0], graph.nodes()[4]);
        assert!(n0.has_same_owner_as(&n4));
        assert_ne!(n0.region_that_arrived, n4.region_that_arrived);
    });
}

// =============================================================================
// Reset
// =============================================================================

#[test]
fn test_sparse_reset_clears_touched_nodes() {
    let config = TestGraphs::MEDIUM;
    with_graph(&config, |graph, regions| {
        let r = regions.alloc(Varying32::growing(0)).unwrap();
        let touched = [config.node(0, 0), config.node(31, 0), config.node(17, 30)];
        for (t, &n) in touched.iter().enumerate() {
            graph.claim(n, touched[0], r, &*regions, t as i32, 0).unwrap();
        }
        let _ = graph
            .event_tracker_mut(config.node(5, 5))
            .unwrap()
            .set_desired_event(40);
        assert_eq!(graph.num_claimed(), 3);

        graph.reset();
        regions.clear();

        assert_eq!(graph.num_claimed(), 0);
        for node in graph.nodes() {
            assert!(!node.is_claimed());
            assert!(node.node_event_tracker.is_empty());
            assert_eq!(node.accumulated_radius_cached, 0);
        }
        // Adjacency survives the reset.
        assert_eq!(graph.node(config.node(3, 3)).unwrap().neighbors.len(), 4);
        assert_eq!(regions.num_live(), 0);
    });
}

#[test]
fn test_reset_all_matches_sparse_reset() {
    with_graph(&TestGraphs::TINY, |graph, regions| {
        let r = regions.alloc(Varying32::growing(0)).unwrap();
        graph.claim(NodeIdx(10), NodeIdx(10), r, &*regions, 0, 0).unwrap();
        // Direct writes through node_mut are flagged too.
        graph.node_mut(NodeIdx(20)).unwrap().radius_of_arrival = 9;

        graph.reset_all();
        assert_eq!(graph.num_claimed(), 0);
        assert!(graph.nodes().iter().all(|n| n.radius_of_arrival == 0));

        // Repeated resets are no-ops.
        graph.reset();
        graph.reset_all();
        assert_eq!(graph.num_claimed(), 0);
    });
}

#[test]
fn test_graph_reused_across_runs() {
    with_graph(&TestGraphs::REPETITION_17, |graph, regions| {
        for run in 0..5 {
            let r = regions.alloc(Varying32::growing(run)).unwrap();
            assert_eq!(r, RegionIdx(0));
            for i in 0..17u32 {
                graph
                    .claim(NodeIdx(i), NodeIdx(0), r, &*regions, i as i32, 0)
                    .unwrap();
            }
            assert_eq!(graph.num_claimed(), 17);
            assert_eq!(regions.top_region(r), r);
            graph.reset();
            regions.clear();
        }
    });
}

#[test]
fn test_lattice_config_builds() {
    // Reverse entries land in edge-list order: the upper neighbor's edge is
    // listed before the left neighbor's.
    let config = GraphConfig::new(3, 4, 1);
    with_graph(&config, |graph, _| {
        assert_eq!(
            graph.node(config.node(1, 1)).unwrap().neighbors,
            &[
                config.node(1, 0),
                config.node(0, 1),
                config.node(2, 1),
                config.node(1, 2)
            ]
        );
    });
}
