//! Basin-of-attraction field
//!
//! One pendulum per pixel, all released at rest on a uniform grid covering
//! the visible window. Every tick advances each particle independently by one
//! fixed-size Cash–Karp step, reading the current buffer and writing the next,
//! then swaps the two. Particles never interact, so the write phase runs in
//! parallel over the grid.

use log::info;
use rayon::prelude::*;

use super::forces::{Coordinates, PendulumForces};
use super::integrator::CashKarp;
use super::params::Parameters;
use super::states::{Magnet, NVec2, NVec4};

/// Pixel grid and the physical window it covers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub rmax_x: f64, // half-width in length units
    pub rmax_y: f64, // half-height in length units
}

impl Viewport {
    /// Window of `width x height` pixels around the pivot.
    /// The vertical half-extent is `l * sin(maxTheta)`, the horizontal one
    /// is stretched by the aspect ratio.
    pub fn new(width: u32, height: u32, params: &Parameters) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let rmax = params.rmax();
        let aspect = width as f64 / height as f64;
        Self {
            width,
            height,
            rmax_x: rmax * aspect,
            rmax_y: rmax,
        }
    }

    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Center of grid cell `(col, row)`; row 0 is the bottom of the window
    pub fn cell_center(&self, col: u32, row: u32) -> NVec2 {
        let xstep = 2.0 * self.rmax_x / self.width as f64;
        let ystep = 2.0 * self.rmax_y / self.height as f64;
        NVec2::new(
            -self.rmax_x + col as f64 * xstep + 0.5 * xstep,
            -self.rmax_y + row as f64 * ystep + 0.5 * ystep,
        )
    }

    /// Window pixel (origin top-left, y down) to plane position
    pub fn pixel_to_position(&self, px: f64, py: f64) -> NVec2 {
        let w = self.width as f64;
        let h = self.height as f64;
        NVec2::new(
            (px - 0.5 * w) / w * self.rmax_x * 2.0,
            (0.5 * h - py) / h * self.rmax_y * 2.0,
        )
    }

    /// Plane position to window pixel (origin top-left, y down)
    pub fn position_to_pixel(&self, p: &NVec2) -> (f64, f64) {
        let w = self.width as f64;
        let h = self.height as f64;
        (
            p.x / (2.0 * self.rmax_x) * w + 0.5 * w,
            0.5 * h - p.y / (2.0 * self.rmax_y) * h,
        )
    }

    /// Cell centers in row-major order, bottom row first
    pub fn grid(&self) -> Vec<NVec2> {
        (0..self.height)
            .flat_map(|row| (0..self.width).map(move |col| (col, row)))
            .map(|(col, row)| self.cell_center(col, row))
            .collect()
    }
}

/// Two buffers in fixed roles: `current` is read, `next` is written,
/// `swap` exchanges them
#[derive(Debug, Clone)]
pub struct PingPong<T> {
    current: T,
    next: T,
}

impl<T> PingPong<T> {
    pub fn new(current: T, next: T) -> Self {
        Self { current, next }
    }

    pub fn current(&self) -> &T {
        &self.current
    }

    pub fn current_mut(&mut self) -> &mut T {
        &mut self.current
    }

    pub fn next_mut(&mut self) -> &mut T {
        &mut self.next
    }

    /// Read the current buffer while writing the next one
    pub fn split(&mut self) -> (&T, &mut T) {
        (&self.current, &mut self.next)
    }

    pub fn swap(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
    }
}

/// Index of the magnet closest to `p` in the plane
pub fn nearest_magnet(p: &NVec2, magnets: &[Magnet]) -> Option<usize> {
    magnets
        .iter()
        .enumerate()
        .map(|(i, m)| (i, (p.x - m.pos.x).powi(2) + (p.y - m.pos.y).powi(2)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

/// The per-pixel particle field
#[derive(Debug, Clone)]
pub struct FieldEvolver {
    viewport: Viewport,
    seeds: Vec<NVec4>, // initial states, kept for reset
    states: PingPong<Vec<NVec4>>,
    settled: Vec<Option<u64>>, // tick since which the particle has stayed slow
    pub step: f64, // fixed integration step
    pub settle_speed: f64,
    ticks: u64,
}

impl FieldEvolver {
    /// Lay out one particle per cell of `viewport`, at rest
    pub fn new(viewport: Viewport, coords: Coordinates, params: &Parameters, step: f64, settle_speed: f64) -> Self {
        let seeds: Vec<NVec4> = viewport
            .grid()
            .into_iter()
            .map(|p| coords.seed_state(p.x, p.y, params))
            .collect();
        info!(
            "field reset with {} particles ({}x{})",
            seeds.len(),
            viewport.width,
            viewport.height
        );
        Self::from_seeds(viewport, seeds, step, settle_speed)
    }

    /// Field over explicit initial states
    pub fn from_seeds(viewport: Viewport, seeds: Vec<NVec4>, step: f64, settle_speed: f64) -> Self {
        let n = seeds.len();
        Self {
            viewport,
            states: PingPong::new(seeds.clone(), vec![NVec4::zeros(); n]),
            settled: vec![None; n],
            seeds,
            step,
            settle_speed,
            ticks: 0,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }

    /// Ticks since the last reset
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn seeds(&self) -> &[NVec4] {
        &self.seeds
    }

    /// Valid particle states, row-major, bottom row first
    pub fn current(&self) -> &[NVec4] {
        self.states.current()
    }

    /// Per particle: tick since which its speed stayed below `settle_speed`
    pub fn settle_ticks(&self) -> &[Option<u64>] {
        &self.settled
    }

    /// Put every particle back on its seed
    pub fn reset(&mut self) {
        self.states.current_mut().copy_from_slice(&self.seeds);
        self.settled.iter_mut().for_each(|s| *s = None);
        self.ticks = 0;
    }

    /// Advance every particle by one fixed step
    pub fn tick(&mut self, coords: Coordinates, params: &Parameters, magnets: &[Magnet]) {
        let forces = PendulumForces::new(coords, params, magnets);
        let h = self.step;
        let settle_speed = self.settle_speed;
        let tick = self.ticks + 1;

        let (current, next) = self.states.split();
        next.par_iter_mut()
            .zip(current.par_iter())
            .zip(self.settled.par_iter_mut())
            .for_each_init(
                || (CashKarp::new(4), NVec4::zeros()),
                |(stepper, yerr), ((out, y), settled)| {
                    let dydx = forces.eval(y);
                    stepper.step(&forces, y.as_slice(), dydx.as_slice(), h, out.as_mut_slice(), yerr.as_mut_slice());

                    if coords.speed(out, params) < settle_speed {
                        settled.get_or_insert(tick);
                    } else {
                        *settled = None;
                    }
                },
            );

        self.states.swap();
        self.ticks = tick;
    }

    /// Nearest magnet of every particle's current position
    pub fn basins(&self, coords: Coordinates, params: &Parameters, magnets: &[Magnet]) -> Vec<Option<usize>> {
        self.current()
            .par_iter()
            .map(|s| nearest_magnet(&coords.plane_position(s, params), magnets))
            .collect()
    }
}
