//! Trajectory tracing from a seed position
//!
//! Integrates a single bob from rest with the adaptive Cash–Karp
//! controller and records every accepted step into a [`Trajectory`].

use log::debug;

use super::forces::{Coordinates, Derivatives, PendulumForces};
use super::integrator::{StepController, MIN_STEP};
use super::params::Parameters;
use super::states::{Magnet, NVec4, Trajectory};

/// Tracer settings
#[derive(Debug, Clone, PartialEq)]
pub struct TracerConfig {
    pub initial_step: f64, // first trial step
    pub tolerance: f64, // relative error tolerance for each step
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            initial_step: 0.005,
            tolerance: 1.0e-8,
        }
    }
}

/// Reusable tracer; owns the controller scratch so retracing on every
/// pointer move doesn't allocate
#[derive(Debug, Clone)]
pub struct Tracer {
    pub config: TracerConfig,
    controller: StepController,
}

impl Tracer {
    pub fn new(config: TracerConfig) -> Self {
        Self {
            config,
            controller: StepController::new(4),
        }
    }

    /// Overwrite `traj` with the path of a bob released at rest above `(x0, y0)`.
    ///
    /// Stops after `traj.capacity()` samples, or earlier once the suggested
    /// next step underflows [`MIN_STEP`]. Returns the number of samples.
    pub fn trace(
        &mut self,
        coords: Coordinates,
        params: &Parameters,
        magnets: &[Magnet],
        x0: f64,
        y0: f64,
        traj: &mut Trajectory,
    ) -> usize {
        let forces = PendulumForces::new(coords, params, magnets);

        let mut y = coords.seed_state(x0, y0, params);
        let mut dydx = NVec4::zeros();
        let mut yscal = NVec4::zeros();
        let mut h = self.config.initial_step;
        let mut t = 0.0;

        traj.clear();

        while !traj.is_full() {
            let p = coords.plane_position(&y, params);
            traj.push(NVec4::new(p.x, p.y, y[2], y[3]), t);

            forces.rhs(y.as_slice(), dydx.as_mut_slice());
            StepController::error_scale(y.as_slice(), dydx.as_slice(), h, yscal.as_mut_slice());

            let outcome = self.controller.step(
                &forces,
                y.as_mut_slice(),
                dydx.as_slice(),
                &mut t,
                h,
                self.config.tolerance,
                yscal.as_slice(),
            );

            if outcome.hnext.abs() < MIN_STEP {
                break;
            }
            h = outcome.hnext;
        }

        debug!(
            "traced ({x0:.4}, {y0:.4}): {} samples over t = {:.3}",
            traj.len(),
            traj.times().last().copied().unwrap_or(0.0)
        );
        traj.len()
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::new(TracerConfig::default())
    }
}
