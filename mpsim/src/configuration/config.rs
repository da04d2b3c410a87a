//! Configuration types for loading simulation scenarios from YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! pendulum scenario. A scenario consists of:
//!
//! - [`EngineConfig`]     – coordinates, tolerances, trajectory and field settings
//! - [`ParametersConfig`] – physical constants of pendulum and magnets
//! - [`MagnetConfig`]     – one entry per magnet
//! - [`ScenarioConfig`]   – top-level wrapper, optionally pointing at a parameter file
//!
//! Every field has a default, so an empty document is a valid scenario.
//!
//! # YAML format
//!
//! ```yaml
//! engine:
//!   coordinates: "planar"   # or "spherical"
//!   tolerance: 1.0e-8       # relative error per adaptive step
//!   initial_step: 0.005     # first trial step of a trace
//!   max_points: 1500        # trajectory capacity
//!   field_step: 0.005       # fixed step of the basin field
//!   settle_speed: 1.0e-3    # field particles slower than this count as settled
//!   animation_scale: 1.0    # replay speed
//!   replay_interval_ms: 10
//!   field_downsample: 4     # viewer: window pixels per field particle
//!   field_width: 200        # headless field size
//!   field_height: 150
//!
//! parameters:
//!   pendulum_length: 2.0
//!   pendulum_height: 2.02
//!   gravity: 9.81
//!   damping: 1.0
//!   kappa: 1.0
//!   mag_factor: 0.01
//!   max_theta: 5.0          # degrees
//!
//! magnets:
//!   - { x: -0.03, y: -0.03, color: [1.0, 0.0, 0.0], alpha: 1.0 }
//!   - { x:  0.03, y: -0.03, color: [0.0, 1.0, 0.0], alpha: 1.0 }
//!
//! param_file: "three_magnets.par"   # optional, applied on top
//! ```

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::simulation::engine::Engine;
use crate::simulation::forces::Coordinates;
use crate::simulation::params::Parameters;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read scenario {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid scenario: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Engine-level configuration
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct EngineConfig {
    pub coordinates: Coordinates, // state representation, fixed per run
    pub tolerance: f64, // adaptive step tolerance
    pub initial_step: f64, // first trial step of a trace
    pub max_points: usize, // trajectory capacity
    pub field_step: f64, // fixed step of the field
    pub settle_speed: f64, // settled-particle threshold
    pub animation_scale: f64, // replay speed
    pub replay_interval_ms: u64, // replay timer period
    pub field_downsample: u32, // viewer pixels per particle
    pub field_width: u32, // headless field columns
    pub field_height: u32, // headless field rows
}

impl Default for EngineConfig {
    fn default() -> Self {
        let e = Engine::default();
        Self {
            coordinates: e.coordinates,
            tolerance: e.tracer.tolerance,
            initial_step: e.tracer.initial_step,
            max_points: e.max_points,
            field_step: e.field_step,
            settle_speed: e.settle_speed,
            animation_scale: e.animation_scale,
            replay_interval_ms: e.replay_interval_ms,
            field_downsample: e.field_downsample,
            field_width: e.field_width,
            field_height: e.field_height,
        }
    }
}

/// Physical parameters
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ParametersConfig {
    pub pendulum_length: f64,
    pub pendulum_height: f64,
    pub gravity: f64,
    pub damping: f64,
    pub kappa: f64,
    pub mag_factor: f64,
    pub max_theta: f64, // degrees
}

impl Default for ParametersConfig {
    fn default() -> Self {
        let p = Parameters::default();
        Self {
            pendulum_length: p.pendulum_length,
            pendulum_height: p.pendulum_height,
            gravity: p.gravity,
            damping: p.damping,
            kappa: p.kappa,
            mag_factor: p.mag_factor,
            max_theta: p.max_theta,
        }
    }
}

/// One magnet in the rest plane
#[derive(Deserialize, Debug, Clone)]
pub struct MagnetConfig {
    pub x: f64,
    pub y: f64,
    #[serde(default = "MagnetConfig::default_color")]
    pub color: [f32; 3],
    #[serde(default = "MagnetConfig::default_alpha")]
    pub alpha: f64,
}

impl MagnetConfig {
    fn default_color() -> [f32; 3] {
        [1.0, 1.0, 1.0]
    }

    fn default_alpha() -> f64 {
        1.0
    }
}

/// Top-level scenario configuration loaded from YAML
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ScenarioConfig {
    pub engine: EngineConfig,
    pub parameters: ParametersConfig,
    pub magnets: Vec<MagnetConfig>, // empty means the three default magnets
    pub param_file: Option<PathBuf>, // line-oriented parameter file applied after building
}

impl ScenarioConfig {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_reader(reader)?)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load a scenario file. A relative `param_file` inside it is resolved
    /// against the scenario's directory.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut cfg = Self::from_reader(BufReader::new(file))?;

        if let (Some(pf), Some(dir)) = (cfg.param_file.as_mut(), path.parent()) {
            if pf.is_relative() {
                *pf = dir.join(&*pf);
            }
        }
        Ok(cfg)
    }
}
