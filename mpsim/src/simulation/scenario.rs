//! Build and drive a fully-initialized pendulum simulation
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces the runtime bundle
//! [`Simulation`], which owns:
//! - engine settings (`Engine`) and physical parameters (`Parameters`)
//! - the magnet list
//! - the traced trajectory and its replay clock
//! - the basin field and the two transports that gate its ticks
//!
//! All mutation goes through `&mut Simulation`, so parameters and magnets
//! can only change between ticks. The bundle is inserted into Bevy as a
//! `Resource` and consumed by the viewer systems.

use std::path::Path;

use bevy::prelude::Resource;
use log::info;

use crate::configuration::config::{MagnetConfig, ScenarioConfig};
use crate::configuration::param_file::{self, ParamFileError};
use crate::simulation::engine::{Engine, Transport};
use crate::simulation::field::{FieldEvolver, Viewport};
use crate::simulation::forces::Coordinates;
use crate::simulation::params::Parameters;
use crate::simulation::replay::ReplayClock;
use crate::simulation::states::{default_magnets, Magnet, NVec2, Trajectory, MAGNET_ID_OFFSET};
use crate::simulation::trajectory::{Tracer, TracerConfig};

/// Bevy resource holding the whole simulation state
#[derive(Resource)]
pub struct Simulation {
    pub engine: Engine,
    parameters: Parameters,
    magnets: Vec<Magnet>,
    tracer: Tracer,
    trajectory: Trajectory,
    seed: Option<NVec2>, // release point of the current trajectory
    replay: ReplayClock,
    field: FieldEvolver,
    pub field_transport: Transport,
    pub replay_transport: Transport,
}

impl Simulation {
    /// New simulation; an empty magnet list is replaced by the defaults
    pub fn new(engine: Engine, parameters: Parameters, magnets: Vec<Magnet>) -> Self {
        let magnets = if magnets.is_empty() { default_magnets() } else { renumber(magnets) };
        let viewport = Viewport::new(engine.field_width, engine.field_height, &parameters);
        let field = FieldEvolver::new(
            viewport,
            engine.coordinates,
            &parameters,
            engine.field_step,
            engine.settle_speed,
        );

        Self {
            tracer: Tracer::new(engine.tracer.clone()),
            trajectory: Trajectory::with_capacity(engine.max_points),
            seed: None,
            replay: ReplayClock::new(engine.animation_scale),
            field,
            field_transport: Transport::new(),
            replay_transport: Transport::new(),
            engine,
            parameters,
            magnets,
        }
    }

    pub fn build_scenario(cfg: ScenarioConfig) -> Self {
        // Engine (runtime) from EngineConfig
        let e_cfg = cfg.engine;
        let engine = Engine {
            coordinates: e_cfg.coordinates,
            tracer: TracerConfig {
                initial_step: e_cfg.initial_step,
                tolerance: e_cfg.tolerance,
            },
            max_points: e_cfg.max_points,
            field_step: e_cfg.field_step,
            settle_speed: e_cfg.settle_speed,
            animation_scale: e_cfg.animation_scale,
            replay_interval_ms: e_cfg.replay_interval_ms,
            field_downsample: e_cfg.field_downsample.max(1),
            field_width: e_cfg.field_width,
            field_height: e_cfg.field_height,
        };

        // Parameters (runtime) from ParametersConfig
        let p_cfg = cfg.parameters;
        let parameters = Parameters {
            pendulum_length: p_cfg.pendulum_length,
            pendulum_height: p_cfg.pendulum_height,
            gravity: p_cfg.gravity,
            damping: p_cfg.damping,
            kappa: p_cfg.kappa,
            mag_factor: p_cfg.mag_factor,
            max_theta: p_cfg.max_theta,
        };

        // Magnets: map `MagnetConfig` -> runtime `Magnet`
        let magnets: Vec<Magnet> = cfg
            .magnets
            .iter()
            .enumerate()
            .map(|(i, mc): (usize, &MagnetConfig)| Magnet::new(mc.x, mc.y, mc.alpha, mc.color, i))
            .collect();

        Self::new(engine, parameters, magnets)
    }

    // ------------------------------------------------------------------
    // read access for the renderer
    // ------------------------------------------------------------------

    pub fn coordinates(&self) -> Coordinates {
        self.engine.coordinates
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn magnets(&self) -> &[Magnet] {
        &self.magnets
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    /// Planar positions of the trajectory, for drawing a line strip
    pub fn trajectory_positions(&self) -> Vec<NVec2> {
        (0..self.trajectory.len()).map(|i| self.trajectory.position(i)).collect()
    }

    pub fn seed(&self) -> Option<NVec2> {
        self.seed
    }

    pub fn replay(&self) -> &ReplayClock {
        &self.replay
    }

    pub fn field(&self) -> &FieldEvolver {
        &self.field
    }

    /// Nearest magnet per field particle
    pub fn basins(&self) -> Vec<Option<usize>> {
        self.field.basins(self.engine.coordinates, &self.parameters, &self.magnets)
    }

    // ------------------------------------------------------------------
    // trajectory and replay
    // ------------------------------------------------------------------

    /// Release the bob above `(x, y)`: retrace and rewind the replay
    pub fn set_seed(&mut self, x: f64, y: f64) -> usize {
        self.seed = Some(NVec2::new(x, y));
        self.retrace()
    }

    /// Drop the trajectory entirely
    pub fn clear_trajectory(&mut self) {
        self.seed = None;
        self.trajectory.clear();
        self.replay.reset(&self.trajectory);
        self.replay_transport.pause();
    }

    fn retrace(&mut self) -> usize {
        let Some(seed) = self.seed else {
            return 0;
        };
        let n = self.tracer.trace(
            self.engine.coordinates,
            &self.parameters,
            &self.magnets,
            seed.x,
            seed.y,
            &mut self.trajectory,
        );
        self.replay.reset(&self.trajectory);
        n
    }

    pub fn reset_replay(&mut self) {
        self.replay.reset(&self.trajectory);
    }

    /// One replay timer tick of `real_dt` seconds.
    /// Returns true if the bob moved; reaching the end stops the transport.
    pub fn replay_tick(&mut self, real_dt: f64) -> bool {
        if !self.replay_transport.take_tick() {
            return false;
        }
        let alive = self.replay.advance(&self.trajectory, real_dt);
        if !alive {
            self.replay_transport.finish();
        }
        alive
    }

    // ------------------------------------------------------------------
    // field
    // ------------------------------------------------------------------

    /// One field timer tick; returns true if the field advanced
    pub fn field_tick(&mut self) -> bool {
        if !self.field_transport.take_tick() {
            return false;
        }
        self.field
            .tick(self.engine.coordinates, &self.parameters, &self.magnets);
        true
    }

    /// New viewport size in field cells; zero-sized requests are ignored
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.rebuild_field(Viewport::new(width, height, &self.parameters));
    }

    /// Put the field back at its seeds, relaying the grid if the window
    /// extent changed with the parameters
    pub fn reset_field(&mut self) {
        let vp = self.field.viewport();
        let viewport = Viewport::new(vp.width, vp.height, &self.parameters);
        if viewport == *vp {
            self.field.reset();
        } else {
            self.rebuild_field(viewport);
        }
    }

    // window extent and spherical seeds both depend on the parameters
    fn relayout_field(&mut self) {
        let vp = self.field.viewport();
        let viewport = Viewport::new(vp.width, vp.height, &self.parameters);
        self.rebuild_field(viewport);
    }

    fn rebuild_field(&mut self, viewport: Viewport) {
        self.field = FieldEvolver::new(
            viewport,
            self.engine.coordinates,
            &self.parameters,
            self.engine.field_step,
            self.engine.settle_speed,
        );
    }

    // ------------------------------------------------------------------
    // configuration updates, only ever between ticks
    // ------------------------------------------------------------------

    /// Replace the parameters; the current trajectory is retraced and the
    /// field is laid out again over the new window
    pub fn set_parameters(&mut self, parameters: Parameters) {
        self.parameters = parameters;
        self.retrace();
        self.relayout_field();
    }

    /// Replace all magnets; an empty list installs the defaults
    pub fn set_magnets(&mut self, magnets: Vec<Magnet>) {
        self.magnets = if magnets.is_empty() { default_magnets() } else { renumber(magnets) };
        self.retrace();
    }

    /// Index of the magnet with picking id `id`
    pub fn magnet_index(&self, id: u32) -> Option<usize> {
        self.magnets.iter().position(|m| m.id == id)
    }

    /// Move magnet `index` in the plane, keeping its height
    pub fn move_magnet(&mut self, index: usize, x: f64, y: f64) -> bool {
        let Some(m) = self.magnets.get_mut(index) else {
            return false;
        };
        m.pos.x = x;
        m.pos.y = y;
        self.retrace();
        true
    }

    pub fn set_magnet_alpha(&mut self, index: usize, alpha: f64) -> bool {
        let Some(m) = self.magnets.get_mut(index) else {
            return false;
        };
        m.alpha = alpha;
        self.retrace();
        true
    }

    pub fn set_magnet_color(&mut self, index: usize, color: [f32; 3]) -> bool {
        let Some(m) = self.magnets.get_mut(index) else {
            return false;
        };
        m.color = color;
        true
    }

    /// Default parameters and magnets, empty trajectory, field at its seeds
    pub fn reset(&mut self) {
        self.parameters = Parameters::default();
        self.magnets = default_magnets();
        self.clear_trajectory();
        self.field_transport.pause();
        self.relayout_field();
    }

    // ------------------------------------------------------------------
    // parameter files
    // ------------------------------------------------------------------

    /// Load a parameter file; magnets are replaced wholesale
    pub fn load_params<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ParamFileError> {
        let set = param_file::load_params(path, &self.parameters)?;
        self.parameters = set.parameters;
        self.magnets = set.magnets;
        self.retrace();
        self.relayout_field();
        info!("parameters now {:?}", self.parameters);
        Ok(())
    }

    pub fn save_params<P: AsRef<Path>>(&self, path: P) -> Result<(), ParamFileError> {
        param_file::save_params(path, &self.parameters, &self.magnets)
    }
}

// keep ids in step with list order
fn renumber(mut magnets: Vec<Magnet>) -> Vec<Magnet> {
    for (i, m) in magnets.iter_mut().enumerate() {
        m.id = MAGNET_ID_OFFSET + i as u32;
    }
    magnets
}
