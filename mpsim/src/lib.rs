pub mod simulation;
pub mod configuration;
pub mod visualization;
pub mod benchmark;

pub use simulation::states::{Magnet, Trajectory, NVec2, NVec3, NVec4, default_magnets};
pub use simulation::params::Parameters;
pub use simulation::forces::{Coordinates, Derivatives, PendulumForces};
pub use simulation::integrator::{CashKarp, StepController, StepOutcome};
pub use simulation::trajectory::{Tracer, TracerConfig};
pub use simulation::replay::ReplayClock;
pub use simulation::field::{FieldEvolver, PingPong, Viewport, nearest_magnet};
pub use simulation::engine::{Engine, RunState, Transport};
pub use simulation::scenario::Simulation;

pub use configuration::config::{ConfigError, EngineConfig, ParametersConfig, MagnetConfig, ScenarioConfig};
pub use configuration::param_file::{ParamFileError, ParamSet, parse_params, format_params, load_params, save_params};

pub use visualization::mpsim_vis2d::{run_2d, window_title};

pub use benchmark::benchmark::{bench_rhs, bench_trace, bench_field_tick};
