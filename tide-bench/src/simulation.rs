//! Randomized flooding driver and its reference checks.
//!
//! The driver stands in for a matching scheduler: it seeds growing regions at
//! random detector nodes, expands claims one hop per time step, and randomly
//! wraps top-level regions into blossoms or shatters them again. It never
//! looks at collision times, so the blossom structure it produces is arbitrary
//! but always well formed.

use std::time::{Duration, Instant};

use anyhow::{bail, ensure, Context, Result};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use tide_core::{
    MatchingGraph, NodeIdx, Radius, RegionArena, RegionIdx, RegionTree, Time, Varying32,
};

/// Knobs of one simulated decoding run.
#[derive(Debug, Clone, Copy)]
pub struct SimulationParams {
    pub sources: usize,
    pub steps: Time,
    pub wrap_probability: f64,
    pub shatter_probability: f64,
}

/// Outcome of one simulated run.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunReport {
    pub claimed: usize,
    pub wraps: usize,
    pub shatters: usize,
    pub max_depth: usize,
    pub checked: usize,
    pub uncached_time: Duration,
    pub cached_time: Duration,
}

/// A graph and region pool driven through randomized runs.
pub struct FloodSimulation<'a> {
    graph: MatchingGraph<'a>,
    regions: RegionArena<'a>,
    rng: Xoshiro256PlusPlus,
    params: SimulationParams,
}

impl<'a> FloodSimulation<'a> {
    pub fn new(
        graph: MatchingGraph<'a>,
        regions: RegionArena<'a>,
        seed: u64,
        params: SimulationParams,
    ) -> Self {
        Self {
            graph,
            regions,
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
            params,
        }
    }

    /// Runs one decoding run from an empty graph and resets it afterwards.
    pub fn run(&mut self) -> Result<RunReport> {
        let mut report = RunReport::default();
        self.seed_sources()?;

        for t in 1..=self.params.steps {
            self.mutate_blossoms(t, &mut report)?;
            self.graph.refresh_tops(&self.regions);
            self.expand_claims(t)?;
            report.checked += self.verify(t)?;
        }

        let t = self.params.steps;
        report.claimed = self.graph.num_claimed();
        report.max_depth = self
            .graph
            .claimed_nodes()
            .filter_map(|n| self.graph.nodes()[n.index()].region_that_arrived)
            .map(|r| self.regions.chain_depth(r))
            .max()
            .unwrap_or(0);
        (report.uncached_time, report.cached_time) = self.time_queries(t);

        self.graph.reset();
        self.regions.clear();
        ensure!(self.graph.num_claimed() == 0, "sparse reset left claimed nodes");
        Ok(report)
    }

    fn seed_sources(&mut self) -> Result<()> {
        let num_nodes = self.graph.num_nodes() as u32;
        for _ in 0..self.params.sources {
            let n = NodeIdx(self.rng.gen_range(0..num_nodes));
            if self.graph.node(n)?.is_claimed() {
                continue;
            }
            let r = self
                .regions
                .alloc(Varying32::growing_varying_with_zero_distance_at_time(0))?;
            self.graph.claim(n, n, r, &self.regions, 0, 0)?;
        }
        Ok(())
    }

    fn mutate_blossoms(&mut self, t: Time, report: &mut RunReport) -> Result<()> {
        let tops: Vec<RegionIdx> = self.regions.top_level_regions().collect();
        if tops.len() >= 2 && self.rng.gen_bool(self.params.wrap_probability) {
            let a = tops[self.rng.gen_range(0..tops.len())];
            let b = tops[self.rng.gen_range(0..tops.len())];
            if a != b {
                let blossom = self.regions.wrap_into_blossom(&[a, b], t)?;
                tracing::trace!(%a, %b, %blossom, t, "wrapped");
                report.wraps += 1;
            }
        }

        let blossoms: Vec<RegionIdx> = self
            .regions
            .top_level_regions()
            .filter(|&r| self.regions.get(r).is_blossom())
            .collect();
        if !blossoms.is_empty() && self.rng.gen_bool(self.params.shatter_probability) {
            let blossom = blossoms[self.rng.gen_range(0..blossoms.len())];
            self.regions.shatter_blossom(blossom, t)?;
            tracing::trace!(%blossom, t, "shattered");
            report.shatters += 1;
        }
        Ok(())
    }

    fn expand_claims(&mut self, t: Time) -> Result<()> {
        let frontier: Vec<NodeIdx> = self.graph.claimed_nodes().collect();
        for n in frontier {
            let node = *self.graph.node(n)?;
            let (Some(source), Some(region)) = (node.reached_from_source, node.region_that_arrived)
            else {
                bail!("claimed node {n} has no claim record");
            };
            for (k, &nb) in node.neighbors.iter().enumerate() {
                if nb.is_boundary() || self.graph.node(nb)?.is_claimed() {
                    continue;
                }
                let crossed = self
                    .graph
                    .neighbor_observables(n, k)
                    .with_context(|| format!("edge {k} of node {n}"))?;
                self.graph.claim(
                    nb,
                    source,
                    region,
                    &self.regions,
                    t,
                    node.observables_crossed_from_source ^ crossed,
                )?;
            }
        }
        Ok(())
    }

    /// Checks every claimed node against the region tree and a reference
    /// radius. Returns the number of nodes checked.
    fn verify(&self, t: Time) -> Result<usize> {
        if let Some(n) = self.graph.find_stale_radius_cache(&self.regions) {
            bail!("stale radius cache at node {n}, t = {t}");
        }

        let mut checked = 0;
        for n in self.graph.claimed_nodes() {
            let node = self.graph.node(n)?;
            let (Some(arrived), Some(top)) = (node.region_that_arrived, node.region_that_arrived_top)
            else {
                bail!("claimed node {n} has no owner");
            };
            ensure!(
                top == self.regions.top_region(arrived),
                "node {n} owned by {top}, chain top is {}",
                self.regions.top_region(arrived)
            );

            let cached = node.local_radius_cached(&self.regions);
            let uncached = node.local_radius(&self.regions);
            ensure!(
                cached == uncached,
                "node {n} at t = {t}: cached {cached} vs recomputed {uncached}"
            );
            for dt in [0, 5] {
                let expected =
                    reference_radius(&self.regions, arrived, top, node.radius_of_arrival, t + dt);
                let got = uncached.get_distance_at_time(t + dt);
                ensure!(
                    got == expected,
                    "node {n} at t = {}: radius {got}, reference {expected}",
                    t + dt
                );
            }
            checked += 1;
        }
        Ok(checked)
    }

    /// Times one pass of uncached and one pass of cached radius queries over
    /// the whole graph.
    fn time_queries(&self, t: Time) -> (Duration, Duration) {
        let nodes = self.graph.nodes();

        let start = Instant::now();
        let mut acc: Radius = 0;
        for node in nodes {
            acc = acc.wrapping_add(node.local_radius(&self.regions).get_distance_at_time(t));
        }
        std::hint::black_box(acc);
        let uncached = start.elapsed();

        let start = Instant::now();
        let mut acc: Radius = 0;
        for node in nodes {
            acc = acc.wrapping_add(node.local_radius_cached(&self.regions).get_distance_at_time(t));
        }
        std::hint::black_box(acc);
        (uncached, start.elapsed())
    }
}

/// Distance of a node from its source at `time`, summed region by region.
///
/// Every region strictly below the top is frozen, so its distance at any time
/// is the radius it had when it was wrapped.
fn reference_radius<R: RegionTree>(
    regions: &R,
    arrived: RegionIdx,
    top: RegionIdx,
    radius_of_arrival: Radius,
    time: Time,
) -> Radius {
    let mut total = regions.radius(top).get_distance_at_time(time) - radius_of_arrival;
    let mut r = arrived;
    while r != top {
        total += regions.radius(r).get_distance_at_time(time);
        match regions.blossom_parent(r) {
            Some(parent) => r = parent,
            None => break,
        }
    }
    total
}
