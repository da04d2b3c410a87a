//! High-level runtime engine settings and the play/step state machine
//!
//! `Engine` selects the coordinates and integration settings used when
//! building a `Simulation`. `Transport` is the Stopped/Running/SingleStepping
//! machine that gates both the field ticks and the replay ticks.

use super::forces::Coordinates;
use super::trajectory::TracerConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct Engine {
    pub coordinates: Coordinates, // planar or spherical, fixed per run
    pub tracer: TracerConfig, // adaptive settings for single trajectories
    pub max_points: usize, // trajectory capacity
    pub field_step: f64, // fixed step of the basin field
    pub settle_speed: f64, // speed below which a field particle counts as settled
    pub animation_scale: f64, // replay speed, simulation seconds per real second
    pub replay_interval_ms: u64, // replay timer period
    pub field_downsample: u32, // window pixels per field particle along each axis
    pub field_width: u32, // field columns before the first resize
    pub field_height: u32, // field rows before the first resize
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            coordinates: Coordinates::Planar,
            tracer: TracerConfig::default(),
            max_points: 1500,
            field_step: 0.005,
            settle_speed: 1.0e-3,
            animation_scale: 1.0,
            replay_interval_ms: 10,
            field_downsample: 4,
            field_width: 200,
            field_height: 150,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Stopped,
    Running,
    SingleStepping,
}

/// Play/pause/step control for one ticking subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Transport {
    state: RunState,
}

impl Transport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    /// Toggle between Stopped and Running
    pub fn play(&mut self) {
        self.state = match self.state {
            RunState::Running => RunState::Stopped,
            _ => RunState::Running,
        };
    }

    pub fn pause(&mut self) {
        self.state = RunState::Stopped;
    }

    /// Request exactly one tick; ignored while running
    pub fn step(&mut self) {
        if self.state == RunState::Stopped {
            self.state = RunState::SingleStepping;
        }
    }

    /// Natural end of playback
    pub fn finish(&mut self) {
        self.pause();
    }

    /// Called once per timer tick; true if the subsystem should advance.
    /// A single step is consumed here and drops back to Stopped.
    pub fn take_tick(&mut self) -> bool {
        match self.state {
            RunState::Stopped => false,
            RunState::Running => true,
            RunState::SingleStepping => {
                self.state = RunState::Stopped;
                true
            }
        }
    }
}
