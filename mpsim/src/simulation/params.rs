//! Physical parameters of the pendulum and magnets
//!
//! `Parameters` is read by every force evaluation and only changed between
//! integration runs:
//! - pendulum length and pivot height,
//! - gravity and linear damping,
//! - magnetic falloff exponent `kappa` and force scale `mag_factor`,
//! - maximum swing angle, which sizes the visible window

#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    pub pendulum_length: f64, // l
    pub pendulum_height: f64, // pivot height above the magnet plane, z0
    pub gravity: f64, // g
    pub damping: f64, // gamma
    pub kappa: f64, // falloff exponent, force ~ r^-(1 + kappa)
    pub mag_factor: f64, // global magnet strength scale
    pub max_theta: f64, // max swing angle in degrees
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            pendulum_length: 2.0,
            pendulum_height: 2.02,
            gravity: 9.81,
            damping: 1.0,
            kappa: 1.0,
            mag_factor: 0.01,
            max_theta: 5.0,
        }
    }
}

impl Parameters {
    /// Radius of the visible disc: `l * sin(maxTheta)`
    pub fn rmax(&self) -> f64 {
        self.pendulum_length * self.max_theta.to_radians().sin()
    }

    /// Height of the bob's rest plane above the magnet plane
    pub fn rest_gap(&self) -> f64 {
        self.pendulum_height - self.pendulum_length
    }
}
