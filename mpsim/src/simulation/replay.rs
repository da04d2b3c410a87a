//! Replay of a traced trajectory
//!
//! The clock runs in simulation time: every tick advances it by
//! `real_dt * animation_scale` and moves the cursor forward to the sample
//! interval that contains it.

use super::states::{NVec2, Trajectory};

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayClock {
    pub animation_scale: f64, // simulation seconds per real second
    index: usize, // left sample of the current interval
    fraction: f64, // position inside [t_index, t_index+1)
    time: f64, // elapsed animation time
    position: NVec2, // interpolated bob position
}

impl ReplayClock {
    pub fn new(animation_scale: f64) -> Self {
        Self {
            animation_scale,
            index: 0,
            fraction: 0.0,
            time: 0.0,
            position: NVec2::zeros(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn position(&self) -> NVec2 {
        self.position
    }

    /// Back to the first sample of `traj` (or the origin if it is empty)
    pub fn reset(&mut self, traj: &Trajectory) {
        self.index = 0;
        self.fraction = 0.0;
        self.time = 0.0;
        self.position = if traj.is_empty() { NVec2::zeros() } else { traj.position(0) };
    }

    /// Advance by `real_dt` seconds of wall time.
    ///
    /// Returns true while the clock is inside the trajectory. Once it reaches
    /// the last sample time the cursor parks on that sample and every further
    /// call returns false.
    pub fn advance(&mut self, traj: &Trajectory, real_dt: f64) -> bool {
        let n = traj.len();
        if n <= 1 {
            self.index = 0;
            self.fraction = 0.0;
            self.time = 0.0;
            self.position = if n == 1 { traj.position(0) } else { NVec2::zeros() };
            return false;
        }
        if self.index >= n - 1 {
            return false;
        }

        self.time += real_dt.max(0.0) * self.animation_scale;

        let times = traj.times();
        let mut i = self.index;
        while i < n - 1 {
            if self.time >= times[i] && self.time < times[i + 1] {
                let f = (self.time - times[i]) / (times[i + 1] - times[i]);
                let p1 = traj.position(i);
                let p2 = traj.position(i + 1);
                self.index = i;
                self.fraction = f;
                self.position = p1 + f * (p2 - p1);
                return true;
            }
            i += 1;
        }

        // past the end
        self.index = n - 1;
        self.fraction = 0.0;
        self.position = traj.position(n - 1);
        false
    }
}

impl Default for ReplayClock {
    fn default() -> Self {
        Self::new(1.0)
    }
}
