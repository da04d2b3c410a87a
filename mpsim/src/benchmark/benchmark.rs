use std::time::Instant;

use crate::simulation::field::{FieldEvolver, Viewport};
use crate::simulation::forces::{Coordinates, PendulumForces};
use crate::simulation::params::Parameters;
use crate::simulation::states::{Magnet, Trajectory};
use crate::simulation::trajectory::Tracer;

/// Deterministic ring of `n` magnets, no rand needed
fn make_magnets(n: usize) -> Vec<Magnet> {
    (0..n)
        .map(|i| {
            let phi = i as f64 / n as f64 * std::f64::consts::TAU;
            Magnet::new(0.03 * phi.cos(), 0.03 * phi.sin(), 1.0, [1.0, 1.0, 1.0], i)
        })
        .collect()
}

/// Cost of one derivative evaluation against the magnet count
pub fn bench_rhs() {
    let params = Parameters::default();
    let evals = 100_000;

    for n in [1, 3, 6, 12, 24, 48] {
        let magnets = make_magnets(n);
        for coords in [Coordinates::Planar, Coordinates::Spherical] {
            let forces = PendulumForces::new(coords, &params, &magnets);
            let mut y = coords.seed_state(0.011, -0.007, &params);

            let t0 = Instant::now();
            for _ in 0..evals {
                let d = forces.eval(&y);
                // feed back so the loop is not optimized away
                y += d * 1.0e-12;
            }
            let ns = t0.elapsed().as_secs_f64() * 1.0e9 / evals as f64;
            println!("magnets = {n:3}, {coords:?}: {ns:8.1} ns/eval");
        }
    }
}

/// Full adaptive traces from a few seeds
pub fn bench_trace() {
    let params = Parameters::default();
    let magnets = make_magnets(3);
    let mut tracer = Tracer::default();

    for capacity in [500, 1500, 6000] {
        let mut traj = Trajectory::with_capacity(capacity);
        let t0 = Instant::now();
        for k in 0..10 {
            let x = 0.02 * (k as f64 * 0.7).cos();
            let y = 0.02 * (k as f64 * 0.7).sin();
            tracer.trace(Coordinates::Planar, &params, &magnets, x, y, &mut traj);
        }
        let ms = t0.elapsed().as_secs_f64() * 1000.0 / 10.0;
        println!("points = {capacity:5}, trace = {ms:8.3} ms");
    }
}

/// Field tick time against grid size
/// Paste output directly into a spreadsheet to graph
pub fn bench_field_tick() {
    let params = Parameters::default();
    let magnets = make_magnets(3);

    println!("particles,ms_per_tick");
    for side in [50u32, 100, 200, 400, 800] {
        let vp = Viewport::new(side, side, &params);
        let mut field = FieldEvolver::new(vp, Coordinates::Planar, &params, 0.005, 1.0e-3);

        // Warm up the thread pool
        field.tick(Coordinates::Planar, &params, &magnets);

        let ticks = if side <= 200 { 20 } else { 3 };
        let t0 = Instant::now();
        for _ in 0..ticks {
            field.tick(Coordinates::Planar, &params, &magnets);
        }
        let ms = t0.elapsed().as_secs_f64() * 1000.0 / ticks as f64;
        println!("{},{:.6}", vp.len(), ms);
    }
}

