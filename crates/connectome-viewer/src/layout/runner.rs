//! Owns the running simulations and the published positions.
//!
//! Small inputs are relaxed synchronously. Above `time_slice_threshold` nodes a job is
//! created instead and advanced a few iterations per frame by [`LayoutRunner::tick`], so
//! a single frame never pays for more than `iterations_per_frame` iterations.

use bevy::math::Vec2;
use connectome_core::{EdgeDefinition, NodeDefinition, NodeId, ZoneId};
use std::collections::HashMap;

use crate::layout::force::ForceSimulation;
use crate::layout::graph::graph_simulation;
use crate::layout::zones::{collect_layout, iteration_budget, zoned_simulation, ZoneLayout};
use crate::util::config::LayoutConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Zoned,
    Graph,
}

struct LayoutJob {
    kind: JobKind,
    nodes: Vec<NodeDefinition>,
    seeds: Vec<Vec2>,
    sim: ForceSimulation,
    /// Zoned jobs run a fixed number of ticks; graph jobs may stop early on convergence.
    budget: usize,
}

impl LayoutJob {
    fn step(&mut self, iterations: usize) {
        let remaining = self.budget.saturating_sub(self.sim.ticks());
        let n = iterations.min(remaining);
        match self.kind {
            JobKind::Zoned => {
                for _ in 0..n {
                    self.sim.tick();
                }
            }
            JobKind::Graph => {
                self.sim.advance(n);
            }
        }
    }

    fn finished(&self) -> bool {
        self.sim.ticks() >= self.budget || (self.kind == JobKind::Graph && self.sim.converged())
    }

    fn publish(&self, out: &mut HashMap<NodeId, Vec2>) {
        for l in collect_layout(&self.nodes, &self.seeds, &self.sim) {
            out.insert(l.node_id, l.center);
        }
    }
}

/// What changed during one [`LayoutRunner::tick`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub progressed: bool,
    /// A graph layout completed on this tick; the view should fit to its bounds.
    pub graph_settled: bool,
}

/// Identity of one layout input; a change restarts the affected jobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutKey {
    pub defs_revision: u64,
    pub zone_scale: f32,
}

pub struct LayoutInput<'a> {
    pub key: LayoutKey,
    pub zones: &'a [ZoneLayout],
    pub zoned_nodes: &'a [NodeDefinition],
    pub graph_nodes: &'a [NodeDefinition],
    pub edges: &'a [EdgeDefinition],
}

#[derive(Default)]
pub struct LayoutRunner {
    positions: HashMap<NodeId, Vec2>,
    jobs: Vec<LayoutJob>,
    key: Option<LayoutKey>,
    revision: u64,
    pending: TickOutcome,
}

impl LayoutRunner {
    pub fn positions(&self) -> &HashMap<NodeId, Vec2> {
        &self.positions
    }

    pub fn position(&self, id: &NodeId) -> Option<Vec2> {
        self.positions.get(id).copied()
    }

    /// Bumped whenever published positions change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_running(&self) -> bool {
        !self.jobs.is_empty()
    }

    /// Drops every in-flight job; published positions stay as they are.
    pub fn cancel(&mut self) {
        if !self.jobs.is_empty() {
            tracing::debug!(jobs = self.jobs.len(), "layout jobs cancelled");
        }
        self.jobs.clear();
    }

    /// True when `key` is what the runner last synced against.
    pub fn is_current(&self, key: LayoutKey) -> bool {
        self.key == Some(key)
    }

    /// Restarts layout when `input.key` differs from the last synced key; otherwise no-op.
    pub fn sync(&mut self, input: LayoutInput<'_>, cfg: &LayoutConfig) {
        if self.is_current(input.key) {
            return;
        }
        self.key = Some(input.key);
        self.cancel();
        self.positions.clear();

        if !input.zoned_nodes.is_empty() {
            let (seeds, sim) = zoned_simulation(input.zoned_nodes, input.zones, input.edges, cfg);
            self.start(
                LayoutJob {
                    kind: JobKind::Zoned,
                    nodes: input.zoned_nodes.to_vec(),
                    seeds,
                    sim,
                    budget: iteration_budget(input.zoned_nodes.len()),
                },
                cfg,
            );
        }

        if !input.graph_nodes.is_empty() {
            let center = input
                .zones
                .iter()
                .find(|z| z.zone_id == ZoneId::Graph)
                .map(|z| z.center())
                .unwrap_or(Vec2::new(cfg.center_x, cfg.center_y));
            let (seeds, sim) = graph_simulation(input.graph_nodes, input.edges, center, cfg);
            self.start(
                LayoutJob {
                    kind: JobKind::Graph,
                    nodes: input.graph_nodes.to_vec(),
                    seeds,
                    sim,
                    budget: cfg.graph_max_iterations,
                },
                cfg,
            );
        }
        self.revision += 1;
    }

    fn start(&mut self, mut job: LayoutJob, cfg: &LayoutConfig) {
        let n = job.nodes.len();
        if n <= cfg.time_slice_threshold {
            job.step(job.budget);
            job.publish(&mut self.positions);
            tracing::debug!(kind = ?job.kind, nodes = n, iterations = job.sim.ticks(), "layout finished");
            if job.kind == JobKind::Graph {
                self.pending.graph_settled = true;
            }
            return;
        }
        tracing::info!(kind = ?job.kind, nodes = n, budget = job.budget, "layout job started");
        job.publish(&mut self.positions);
        self.jobs.push(job);
    }

    /// Advances every running job by `cfg.iterations_per_frame` and republishes positions.
    pub fn tick(&mut self, cfg: &LayoutConfig) -> TickOutcome {
        let mut out = std::mem::take(&mut self.pending);
        if self.jobs.is_empty() {
            return out;
        }
        let per_frame = cfg.iterations_per_frame.max(1);
        for job in self.jobs.iter_mut() {
            job.step(per_frame);
            job.publish(&mut self.positions);
        }
        out.progressed = true;
        self.revision += 1;

        let mut i = 0;
        while i < self.jobs.len() {
            if self.jobs[i].finished() {
                let job = self.jobs.swap_remove(i);
                tracing::info!(kind = ?job.kind, nodes = job.nodes.len(), iterations = job.sim.ticks(), "layout job finished");
                if job.kind == JobKind::Graph {
                    out.graph_settled = true;
                }
            } else {
                i += 1;
            }
        }
        out
    }

    /// Bounds of the published positions for the given ids.
    pub fn bounds_of<'a>(&self, ids: impl IntoIterator<Item = &'a NodeId>) -> Option<(Vec2, Vec2)> {
        let mut min = Vec2::splat(f32::INFINITY);
        let mut max = Vec2::splat(f32::NEG_INFINITY);
        for id in ids {
            if let Some(p) = self.positions.get(id) {
                min = min.min(*p);
                max = max.max(*p);
            }
        }
        min.is_finite().then_some((min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::zones::compute_zones;
    use connectome_core::{NodeType, RenderHint, Slot};

    fn node(id: &str, zone: ZoneId) -> NodeDefinition {
        NodeDefinition {
            node_id: NodeId::new(id),
            zone_id: Some(zone),
            node_type: NodeType::Module,
            title: id.to_string(),
            file_path: None,
            energy_value: None,
            steps: Vec::new(),
            slot: Slot::default(),
            hint: RenderHint::default(),
        }
    }

    fn key(rev: u64) -> LayoutKey {
        LayoutKey {
            defs_revision: rev,
            zone_scale: 1.0,
        }
    }

    #[test]
    fn small_inputs_settle_synchronously() {
        let zones = compute_zones(1600.0);
        let zoned = vec![node("a", ZoneId::Frontend), node("b", ZoneId::Backend)];
        let graph = vec![node("g1", ZoneId::Graph), node("g2", ZoneId::Graph)];
        let cfg = LayoutConfig::default();
        let mut runner = LayoutRunner::default();
        runner.sync(
            LayoutInput {
                key: key(1),
                zones: &zones,
                zoned_nodes: &zoned,
                graph_nodes: &graph,
                edges: &[],
            },
            &cfg,
        );
        assert!(!runner.is_running());
        assert_eq!(runner.positions().len(), 4);
        let out = runner.tick(&cfg);
        assert!(out.graph_settled);
        assert!(!out.progressed);
    }

    #[test]
    fn large_inputs_are_time_sliced() {
        let zones = compute_zones(1600.0);
        let graph: Vec<_> = (0..40).map(|i| node(&format!("g{i}"), ZoneId::Graph)).collect();
        let cfg = LayoutConfig {
            time_slice_threshold: 10,
            iterations_per_frame: 5,
            graph_max_iterations: 20,
            ..Default::default()
        };
        let mut runner = LayoutRunner::default();
        runner.sync(
            LayoutInput {
                key: key(1),
                zones: &zones,
                zoned_nodes: &[],
                graph_nodes: &graph,
                edges: &[],
            },
            &cfg,
        );
        assert!(runner.is_running());
        assert_eq!(runner.positions().len(), 40);

        let mut frames = 0;
        let mut settled = false;
        while runner.is_running() {
            let out = runner.tick(&cfg);
            assert!(out.progressed);
            settled |= out.graph_settled;
            frames += 1;
            assert!(frames <= 4);
        }
        assert!(settled);
        assert!(runner.positions().values().all(|p| p.is_finite()));
    }

    #[test]
    fn same_key_does_not_restart() {
        let zones = compute_zones(1600.0);
        let zoned = vec![node("a", ZoneId::Frontend)];
        let cfg = LayoutConfig::default();
        let mut runner = LayoutRunner::default();
        let input = |k| LayoutInput {
            key: k,
            zones: &zones,
            zoned_nodes: &zoned,
            graph_nodes: &[],
            edges: &[],
        };
        assert!(!runner.is_current(key(1)));
        runner.sync(input(key(1)), &cfg);
        assert!(runner.is_current(key(1)));
        let rev = runner.revision();
        runner.sync(input(key(1)), &cfg);
        assert_eq!(runner.revision(), rev);
        assert!(!runner.is_current(key(2)));
        runner.sync(input(key(2)), &cfg);
        assert!(runner.revision() > rev);
        assert!(runner.is_current(key(2)));
    }

    #[test]
    fn cancel_stops_in_flight_jobs() {
        let zones = compute_zones(1600.0);
        let graph: Vec<_> = (0..20).map(|i| node(&format!("g{i}"), ZoneId::Graph)).collect();
        let cfg = LayoutConfig {
            time_slice_threshold: 5,
            ..Default::default()
        };
        let mut runner = LayoutRunner::default();
        runner.sync(
            LayoutInput {
                key: key(1),
                zones: &zones,
                zoned_nodes: &[],
                graph_nodes: &graph,
                edges: &[],
            },
            &cfg,
        );
        assert!(runner.is_running());
        runner.cancel();
        assert!(!runner.is_running());
        assert_eq!(runner.tick(&cfg), TickOutcome::default());
    }
}
