//! Velocity-Verlet style force simulation over node centers.
//!
//! The simulation owns its position/velocity arrays. Callers seed it once, then drive it
//! with [`ForceSimulation::advance`] either to completion or a few iterations per frame.

use bevy::math::Vec2;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceParams {
    /// Negative values repel.
    pub charge_strength: f32,
    pub charge_distance_max: f32,
    pub link_distance: f32,
    pub link_strength: f32,
    pub center: Option<Vec2>,
    /// Minimum separation between node centers, when set.
    pub collision_radius: Option<f32>,
    pub alpha_min: f32,
    pub alpha_decay: f32,
    pub velocity_decay: f32,
}

impl Default for ForceParams {
    fn default() -> Self {
        Self {
            charge_strength: -30.0,
            charge_distance_max: f32::INFINITY,
            link_distance: 30.0,
            link_strength: 1.0,
            center: None,
            collision_radius: None,
            alpha_min: 0.001,
            alpha_decay: 1.0 - 0.001f32.powf(1.0 / 300.0),
            velocity_decay: 0.4,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Body {
    pos: Vec2,
    vel: Vec2,
}

pub struct ForceSimulation {
    bodies: Vec<Body>,
    links: Vec<(usize, usize)>,
    link_bias: Vec<f32>,
    params: ForceParams,
    alpha: f32,
    ticks: usize,
    jiggle_state: u32,
}

impl ForceSimulation {
    /// `links` index into `seeds`; out-of-range pairs are dropped.
    pub fn new(seeds: &[Vec2], links: &[(usize, usize)], params: ForceParams) -> Self {
        let bodies: Vec<Body> = seeds
            .iter()
            .map(|p| Body {
                pos: *p,
                vel: Vec2::ZERO,
            })
            .collect();
        let n = bodies.len();
        let links: Vec<(usize, usize)> = links
            .iter()
            .copied()
            .filter(|(a, b)| *a < n && *b < n && a != b)
            .collect();

        let mut degree = vec![0u32; n];
        for (a, b) in links.iter() {
            degree[*a] += 1;
            degree[*b] += 1;
        }
        let link_bias = links
            .iter()
            .map(|(a, b)| degree[*a] as f32 / (degree[*a] + degree[*b]) as f32)
            .collect();

        Self {
            bodies,
            links,
            link_bias,
            params,
            alpha: 1.0,
            ticks: 0,
            jiggle_state: 0x9E37_79B9,
        }
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn ticks(&self) -> usize {
        self.ticks
    }

    pub fn converged(&self) -> bool {
        self.alpha < self.params.alpha_min
    }

    pub fn position(&self, i: usize) -> Option<Vec2> {
        self.bodies.get(i).map(|b| b.pos)
    }

    pub fn positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.bodies.iter().map(|b| b.pos)
    }

    /// Runs up to `iterations` ticks, stopping early once converged.
    /// Returns the number of ticks actually run.
    pub fn advance(&mut self, iterations: usize) -> usize {
        let mut ran = 0;
        while ran < iterations && !self.converged() {
            self.tick();
            ran += 1;
        }
        ran
    }

    pub fn tick(&mut self) {
        self.alpha += (0.0 - self.alpha) * self.params.alpha_decay;
        let alpha = self.alpha;

        self.apply_links(alpha);
        self.apply_charge(alpha);
        if let Some(r) = self.params.collision_radius {
            self.apply_collision(r);
        }

        let keep = 1.0 - self.params.velocity_decay;
        for b in self.bodies.iter_mut() {
            b.vel *= keep;
            b.pos += b.vel;
        }

        if let Some(c) = self.params.center {
            self.apply_center(c);
        }
        self.ticks += 1;
    }

    fn jiggle(&mut self) -> f32 {
        // xorshift32
        let mut x = self.jiggle_state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.jiggle_state = x;
        ((x as f32 / u32::MAX as f32) - 0.5) * 1e-6
    }

    fn apply_links(&mut self, alpha: f32) {
        let dist = self.params.link_distance;
        let strength = self.params.link_strength;
        for k in 0..self.links.len() {
            let (s, t) = self.links[k];
            let src = self.bodies[s];
            let dst = self.bodies[t];
            let mut d = (dst.pos + dst.vel) - (src.pos + src.vel);
            if d.x == 0.0 {
                d.x = self.jiggle();
            }
            if d.y == 0.0 {
                d.y = self.jiggle();
            }
            let len = d.length();
            let l = (len - dist) / len * alpha * strength;
            let d = d * l;
            let bias = self.link_bias[k];
            self.bodies[t].vel -= d * bias;
            self.bodies[s].vel += d * (1.0 - bias);
        }
    }

    fn apply_charge(&mut self, alpha: f32) {
        let strength = self.params.charge_strength;
        if strength == 0.0 || self.bodies.len() < 2 {
            return;
        }
        let max = self.params.charge_distance_max;
        let max2 = max * max;

        let grid = SpatialGrid::build(&self.bodies, max);
        let mut deltas = vec![Vec2::ZERO; self.bodies.len()];
        for i in 0..self.bodies.len() {
            let pi = self.bodies[i].pos;
            let mut acc = Vec2::ZERO;
            grid.for_each_near(pi, |j| {
                if j == i {
                    return;
                }
                let mut d = self.bodies[j].pos - pi;
                if d == Vec2::ZERO {
                    // coincident bodies: push apart along a fixed axis per pair ordering
                    d = if j > i { Vec2::X } else { -Vec2::X } * 1e-3;
                }
                let mut l = d.length_squared();
                if l >= max2 {
                    return;
                }
                if l < 1.0 {
                    l = l.sqrt();
                }
                acc += d * (strength * alpha / l);
            });
            deltas[i] = acc;
        }
        for (b, d) in self.bodies.iter_mut().zip(deltas) {
            b.vel += d;
        }
    }

    fn apply_collision(&mut self, radius: f32) {
        let min = radius * 2.0;
        let min2 = min * min;
        let grid = SpatialGrid::build(&self.bodies, min);
        let mut deltas = vec![Vec2::ZERO; self.bodies.len()];
        for i in 0..self.bodies.len() {
            let pi = self.bodies[i].pos + self.bodies[i].vel;
            grid.for_each_near(self.bodies[i].pos, |j| {
                if j <= i {
                    return;
                }
                let pj = self.bodies[j].pos + self.bodies[j].vel;
                let mut d = pi - pj;
                let l2 = d.length_squared();
                if l2 >= min2 {
                    return;
                }
                if l2 == 0.0 {
                    d = Vec2::new(1e-3, 0.0);
                }
                let l = d.length();
                let push = d * ((min - l) / l * 0.5);
                deltas[i] += push;
                deltas[j] -= push;
            });
        }
        for (b, d) in self.bodies.iter_mut().zip(deltas) {
            b.vel += d;
        }
    }

    fn apply_center(&mut self, center: Vec2) {
        if self.bodies.is_empty() {
            return;
        }
        let sum: Vec2 = self.bodies.iter().map(|b| b.pos).sum();
        let shift = center - sum / self.bodies.len() as f32;
        if !shift.is_finite() {
            return;
        }
        for b in self.bodies.iter_mut() {
            b.pos += shift;
        }
    }
}

/// Uniform bucket grid; a query visits the 3x3 block of cells around a point.
struct SpatialGrid {
    cell: f32,
    buckets: HashMap<(i32, i32), Vec<usize>>,
    all: Vec<usize>,
}

impl SpatialGrid {
    fn build(bodies: &[Body], cell: f32) -> Self {
        let cell = if cell.is_finite() && cell > 0.0 {
            cell
        } else {
            0.0
        };
        let mut buckets: HashMap<(i32, i32), Vec<usize>> = HashMap::new();
        let mut all = Vec::new();
        for (i, b) in bodies.iter().enumerate() {
            if cell == 0.0 || !b.pos.is_finite() {
                all.push(i);
            } else {
                buckets.entry(Self::key(b.pos, cell)).or_default().push(i);
            }
        }
        Self { cell, buckets, all }
    }

    fn key(p: Vec2, cell: f32) -> (i32, i32) {
        ((p.x / cell).floor() as i32, (p.y / cell).floor() as i32)
    }

    fn for_each_near(&self, p: Vec2, mut f: impl FnMut(usize)) {
        for &i in self.all.iter() {
            f(i);
        }
        if self.cell == 0.0 || !p.is_finite() {
            for list in self.buckets.values() {
                for &i in list {
                    f(i);
                }
            }
            return;
        }
        let (cx, cy) = Self::key(p, self.cell);
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(list) = self.buckets.get(&(cx + dx, cy + dy)) {
                    for &i in list {
                        f(i);
                    }
                }
            }
        }
    }
}
