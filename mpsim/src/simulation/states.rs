//! Core state types for the magnetic pendulum.
//!
//! - `NVec4` is the 4-component ODE state, either `(x, y, dx, dy)` or
//!   `(theta, phi, dtheta, dphi)` depending on the active coordinates
//! - `Magnet` is one fixed attractor below the bob
//! - `Trajectory` is one traced path: samples plus cumulative times

use nalgebra::{Vector2, Vector3, Vector4};
pub type NVec2 = Vector2<f64>;
pub type NVec3 = Vector3<f64>;
pub type NVec4 = Vector4<f64>;

/// Magnet ids start here so they never collide with other pickable objects
pub const MAGNET_ID_OFFSET: u32 = 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct Magnet {
    pub pos: NVec3, // position, z is normally 0
    pub alpha: f64, // attraction strength
    pub color: [f32; 3], // display color, rgb in 0..1
    pub id: u32, // unique picking id
}

impl Magnet {
    pub fn new(x: f64, y: f64, alpha: f64, color: [f32; 3], index: usize) -> Self {
        Self {
            pos: NVec3::new(x, y, 0.0),
            alpha,
            color,
            id: MAGNET_ID_OFFSET + index as u32,
        }
    }
}

/// The three magnets installed at startup and whenever a load yields none
pub fn default_magnets() -> Vec<Magnet> {
    vec![
        Magnet::new(-0.03, -0.03, 1.0, [1.0, 0.0, 0.0], 0),
        Magnet::new(0.03, -0.03, 1.0, [0.0, 1.0, 0.0], 1),
        Magnet::new(0.0, 0.03 * 2f64.sqrt(), 1.0, [0.0, 0.0, 1.0], 2),
    ]
}

/// One traced path.
///
/// `samples[i]` is `(x, y, vx, vy)` with `(x, y)` always the planar bob
/// position, `times[i]` the simulation time of that sample. Both grow in
/// lockstep and never exceed `capacity`.
#[derive(Debug, Clone)]
pub struct Trajectory {
    samples: Vec<NVec4>,
    times: Vec<f64>,
    capacity: usize,
}

impl Trajectory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
            times: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() >= self.capacity
    }

    pub fn samples(&self) -> &[NVec4] {
        &self.samples
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Planar position of sample `i`
    pub fn position(&self, i: usize) -> NVec2 {
        let s = &self.samples[i];
        NVec2::new(s[0], s[1])
    }

    pub fn last(&self) -> Option<(&NVec4, f64)> {
        self.samples.last().zip(self.times.last().copied())
    }

    /// Append a sample; returns false (and drops it) once full
    pub fn push(&mut self, sample: NVec4, t: f64) -> bool {
        if self.is_full() {
            return false;
        }
        self.samples.push(sample);
        self.times.push(t);
        true
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.times.clear();
    }
}
