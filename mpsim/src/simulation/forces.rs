//! Right-hand side of the pendulum ODE
//!
//! Defines the [`Derivatives`] contract used by the integrators and the
//! pendulum force model in its two coordinate systems (planar small-angle
//! and full spherical)

use serde::Deserialize;

use crate::simulation::params::Parameters;
use crate::simulation::states::{Magnet, NVec2, NVec4};

/// A first-order ODE system `dy/dt = f(y)`
/// Implementations write `f(y)` into `dydx`; both slices have `dimension()` entries
pub trait Derivatives {
    fn dimension(&self) -> usize;
    fn rhs(&self, y: &[f64], dydx: &mut [f64]);
}

/// Which state representation a run uses, fixed when the simulation is built
/// `coordinates: "planar"` or `coordinates: "spherical"`
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Coordinates {
    #[default]
    #[serde(rename = "planar")] // (x, y, dx, dy), small-angle restoring force
    Planar,

    #[serde(rename = "spherical")] // (theta, phi, dtheta, dphi), singular at theta = 0
    Spherical,
}

impl Coordinates {
    /// State at rest for a bob released above plane point `(x, y)`
    pub fn seed_state(&self, x: f64, y: f64, params: &Parameters) -> NVec4 {
        match self {
            Coordinates::Planar => NVec4::new(x, y, 0.0, 0.0),
            Coordinates::Spherical => {
                let r = x.hypot(y);
                let s = (r / params.pendulum_length).min(1.0);
                NVec4::new(s.asin(), y.atan2(x), 0.0, 0.0)
            }
        }
    }

    /// Planar projection of the bob position
    pub fn plane_position(&self, state: &NVec4, params: &Parameters) -> NVec2 {
        match self {
            Coordinates::Planar => NVec2::new(state[0], state[1]),
            Coordinates::Spherical => {
                let l = params.pendulum_length;
                let (sth, _) = state[0].sin_cos();
                let (sph, cph) = state[1].sin_cos();
                NVec2::new(l * sth * cph, l * sth * sph)
            }
        }
    }

    /// Speed of the bob in length units per time
    pub fn speed(&self, state: &NVec4, params: &Parameters) -> f64 {
        match self {
            Coordinates::Planar => state[2].hypot(state[3]),
            Coordinates::Spherical => {
                let l = params.pendulum_length;
                let sth = state[0].sin();
                l * state[2].hypot(sth * state[3])
            }
        }
    }
}

/// Gravity, damping and magnets acting on the bob
/// Borrows the parameters and magnets for the duration of one integration
pub struct PendulumForces<'a> {
    pub coords: Coordinates,
    pub params: &'a Parameters,
    pub magnets: &'a [Magnet],
}

impl<'a> PendulumForces<'a> {
    pub fn new(coords: Coordinates, params: &'a Parameters, magnets: &'a [Magnet]) -> Self {
        Self { coords, params, magnets }
    }

    /// Evaluate at a state vector, returning the derivative
    pub fn eval(&self, y: &NVec4) -> NVec4 {
        let mut out = NVec4::zeros();
        self.rhs(y.as_slice(), out.as_mut_slice());
        out
    }
}

impl Derivatives for PendulumForces<'_> {
    fn dimension(&self) -> usize {
        4
    }

    fn rhs(&self, y: &[f64], dydx: &mut [f64]) {
        match self.coords {
            Coordinates::Planar => planar_rhs(self.params, self.magnets, y, dydx),
            Coordinates::Spherical => spherical_rhs(self.params, self.magnets, y, dydx),
        }
    }
}

/// Small-angle pendulum in the rest plane
fn planar_rhs(p: &Parameters, magnets: &[Magnet], y: &[f64], dydx: &mut [f64]) {
    let l = p.pendulum_length;
    let (xx, yy, dx, dy) = (y[0], y[1], y[2], y[3]);

    dydx[0] = dx;
    dydx[1] = dy;
    dydx[2] = -p.damping * dx - p.gravity / l * xx;
    dydx[3] = -p.damping * dy - p.gravity / l * yy;

    let mut m1 = 0.0;
    let mut m2 = 0.0;
    for mag in magnets {
        let alpha = mag.alpha * p.mag_factor;

        // offset from magnet to the bob's projection on its rest plane
        let rx = xx - mag.pos.x;
        let ry = yy - mag.pos.y;
        let rz = p.rest_gap() - mag.pos.z;

        let numer = (rx * rx + ry * ry + rz * rz).sqrt().powf(-2.0 - p.kappa);
        m1 += p.kappa * alpha * rx * numer;
        m2 += p.kappa * alpha * ry * numer;
    }
    dydx[2] -= m1;
    dydx[3] -= m2;
}

/// Full pendulum in colatitude/azimuth.
/// The `cot(theta)` coupling and the `1/sin(theta)` magnet term are singular
/// at theta = 0 and are left unregularized.
fn spherical_rhs(p: &Parameters, magnets: &[Magnet], y: &[f64], dydx: &mut [f64]) {
    let l = p.pendulum_length;
    let z0 = p.pendulum_height;
    let gamma = p.damping;
    let (theta, phi, dth, dph) = (y[0], y[1], y[2], y[3]);

    let (sth, cth) = theta.sin_cos();
    let (sph, cph) = phi.sin_cos();

    dydx[0] = dth;
    dydx[1] = dph;
    dydx[2] = dph * dph * sth * cth - p.gravity / l * sth - gamma / l * dth;
    dydx[3] = -2.0 * dth * dph * cth / sth - gamma / l * dph;

    let mut m1 = 0.0;
    let mut m2 = 0.0;
    for mag in magnets {
        let alpha = mag.alpha * p.mag_factor;

        let rx = l * sth * cph - mag.pos.x;
        let ry = l * sth * sph - mag.pos.y;
        let rz = z0 - l * cth - mag.pos.z;

        let numer = (rx * rx + ry * ry + rz * rz).sqrt().powf(-2.0 - p.kappa);
        m1 += p.kappa * alpha / l * (rx * cth * cph + ry * cth * sph + rz * sth) * numer;
        m2 += p.kappa * alpha / (l * sth) * (-rx * sph + ry * cph) * numer;
    }
    dydx[2] -= m1;
    dydx[3] -= m2;
}
