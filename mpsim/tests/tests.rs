use approx::{assert_abs_diff_eq, assert_relative_eq};

use mpsim::simulation::field::{FieldEvolver, PingPong, Viewport};
use mpsim::simulation::forces::{Coordinates, Derivatives, PendulumForces};
use mpsim::simulation::integrator::{CashKarp, StepController, MIN_STEP};
use mpsim::simulation::params::Parameters;
use mpsim::simulation::replay::ReplayClock;
use mpsim::simulation::states::{default_magnets, Magnet, NVec2, NVec4, Trajectory};
use mpsim::simulation::trajectory::Tracer;
use mpsim::{format_params, parse_params, Engine, RunState, ScenarioConfig, Simulation, Transport};

/// A system with no forces at all
struct ZeroForce;

impl Derivatives for ZeroForce {
    fn dimension(&self) -> usize {
        4
    }

    fn rhs(&self, _y: &[f64], dydx: &mut [f64]) {
        dydx.iter_mut().for_each(|d| *d = 0.0);
    }
}

/// dy/dt = -sign(y): every stage lands on the other side of zero, so the
/// embedded error estimate stays proportional to h
struct Chatter;

impl Derivatives for Chatter {
    fn dimension(&self) -> usize {
        1
    }

    fn rhs(&self, y: &[f64], dydx: &mut [f64]) {
        dydx[0] = if y[0] >= 0.0 { -1.0 } else { 1.0 };
    }
}

fn magnet(x: f64, y: f64) -> Magnet {
    Magnet::new(x, y, 1.0, [1.0, 1.0, 1.0], 0)
}

/// Three equal magnets 120 degrees apart around the origin
fn three_fold_magnets() -> Vec<Magnet> {
    let s = 0.03 * 30f64.to_radians().cos();
    vec![
        Magnet::new(0.0, 0.03, 1.0, [1.0, 0.0, 0.0], 0),
        Magnet::new(-s, -0.015, 1.0, [0.0, 1.0, 0.0], 1),
        Magnet::new(s, -0.015, 1.0, [0.0, 0.0, 1.0], 2),
    ]
}

fn trace(coords: Coordinates, magnets: &[Magnet], x: f64, y: f64, points: usize) -> Trajectory {
    let params = Parameters::default();
    let mut tracer = Tracer::default();
    let mut traj = Trajectory::with_capacity(points);
    tracer.trace(coords, &params, magnets, x, y, &mut traj);
    traj
}

fn sample_speed(s: &NVec4) -> f64 {
    s[2].hypot(s[3])
}

// ==================================================================================
// Force model tests
// ==================================================================================

#[test]
fn planar_acceleration_points_toward_magnet() {
    let mut p = Parameters::default();
    p.gravity = 0.0;
    let magnets = [magnet(-0.02, 0.01)];
    let forces = PendulumForces::new(Coordinates::Planar, &p, &magnets);

    let y = NVec4::new(0.01, 0.005, 0.0, 0.0);
    let d = forces.eval(&y);

    let a = NVec2::new(d[2], d[3]);
    let to_magnet = NVec2::new(-0.02 - y[0], 0.01 - y[1]);

    assert!(a.norm() > 0.0);
    assert!(a.dot(&to_magnet) > 0.0, "Acceleration is not toward the magnet");
    let cross = a.x * to_magnet.y - a.y * to_magnet.x;
    assert!(cross.abs() < 1e-12 * a.norm(), "Acceleration is not along the line of sight");
}

#[test]
fn planar_velocity_is_state_derivative() {
    let p = Parameters::default();
    let magnets = default_magnets();
    let forces = PendulumForces::new(Coordinates::Planar, &p, &magnets);

    let y = NVec4::new(0.01, -0.02, 0.3, -0.7);
    let d = forces.eval(&y);
    assert_eq!(d[0], 0.3);
    assert_eq!(d[1], -0.7);
}

#[test]
fn centroid_of_symmetric_magnets_is_force_free() {
    let p = Parameters::default();
    let magnets = three_fold_magnets();
    let forces = PendulumForces::new(Coordinates::Planar, &p, &magnets);

    let d = forces.eval(&NVec4::zeros());
    assert!(d[2].abs() < 1e-12, "net x force {}", d[2]);
    assert!(d[3].abs() < 1e-12, "net y force {}", d[3]);
}

#[test]
fn spherical_seed_maps_back_to_plane() {
    let p = Parameters::default();
    let y = Coordinates::Spherical.seed_state(0.02, -0.01, &p);
    let pos = Coordinates::Spherical.plane_position(&y, &p);

    assert_relative_eq!(pos.x, 0.02, epsilon = 1e-12);
    assert_relative_eq!(pos.y, -0.01, epsilon = 1e-12);
    assert_eq!(y[2], 0.0);
    assert_eq!(y[3], 0.0);
}

// ==================================================================================
// Integrator tests
// ==================================================================================

#[test]
fn cash_karp_zero_force_is_noop() {
    let mut stepper = CashKarp::new(4);
    let y = [0.01, -0.02, 0.0, 0.0];
    let dydx = [0.0; 4];

    for h in [1e-6, 1e-3, 0.1, 1.0, -0.5] {
        let mut yout = [f64::NAN; 4];
        let mut yerr = [f64::NAN; 4];
        stepper.step(&ZeroForce, &y, &dydx, h, &mut yout, &mut yerr);

        assert_eq!(yout, y, "state changed for h = {h}");
        assert!(yerr.iter().all(|e| *e == 0.0), "nonzero error for h = {h}");
    }
}

#[test]
fn controller_grows_step_on_trivial_system() {
    let mut ctl = StepController::new(4);
    let mut y = [0.01, -0.02, 0.0, 0.0];
    let dydx = [0.0; 4];
    let mut yscal = [0.0; 4];
    StepController::error_scale(&y, &dydx, 0.01, &mut yscal);

    let mut t = 0.0;
    let out = ctl.step(&ZeroForce, &mut y, &dydx, &mut t, 0.01, 1e-8, &yscal);

    assert_eq!(out.hdid, 0.01);
    assert_relative_eq!(out.hnext, 0.05);
    assert!(!out.forced());
    assert_relative_eq!(t, 0.01);
}

#[test]
fn tighter_tolerance_never_grows_next_step() {
    let p = Parameters::default();
    let magnets = [magnet(-0.03, -0.03), magnet(0.03, -0.03)];
    let forces = PendulumForces::new(Coordinates::Planar, &p, &magnets);
    let y0 = NVec4::new(0.01, 0.02, 0.1, -0.05);
    let dydx = forces.eval(&y0);

    for htry in [0.005, 0.05, 0.2] {
        let mut yscal = NVec4::zeros();
        StepController::error_scale(y0.as_slice(), dydx.as_slice(), htry, yscal.as_mut_slice());

        let mut prev = f64::INFINITY;
        for eps in [1e-4, 1e-6, 1e-8, 1e-10] {
            let mut ctl = StepController::new(4);
            let mut y = y0;
            let mut t = 0.0;
            let out = ctl.step(&forces, y.as_mut_slice(), dydx.as_slice(), &mut t, htry, eps, yscal.as_slice());

            assert!(out.hnext <= prev, "htry {htry}: eps {eps} gave hnext {} > {prev}", out.hnext);
            prev = out.hnext;
        }
    }
}

#[test]
fn controller_forces_step_below_min_step() {
    let mut ctl = StepController::new(1);
    let mut y = [0.0];
    let mut dydx = [0.0];
    Chatter.rhs(&y, &mut dydx);
    let mut yscal = [0.0];
    StepController::error_scale(&y, &dydx, 0.01, &mut yscal);

    let mut t = 0.0;
    let out = ctl.step(&Chatter, &mut y, &dydx, &mut t, 0.01, 1e-8, &yscal);

    assert!(out.forced(), "errmax {} should exceed 1", out.errmax);
    assert!(out.hdid < MIN_STEP, "hdid {}", out.hdid);
    assert!(out.hnext < MIN_STEP, "hnext {}", out.hnext);
    assert_eq!(t, out.hdid);
}

// ==================================================================================
// Tracer tests
// ==================================================================================

#[test]
fn tracer_is_deterministic() {
    let magnets = default_magnets();
    let a = trace(Coordinates::Planar, &magnets, 0.017, -0.004, 1500);
    let b = trace(Coordinates::Planar, &magnets, 0.017, -0.004, 1500);

    assert_eq!(a.samples(), b.samples());
    assert_eq!(a.times(), b.times());
}

#[test]
fn trace_starts_at_rest_on_seed() {
    let traj = trace(Coordinates::Planar, &default_magnets(), 0.01, 0.005, 200);

    assert_eq!(traj.len(), 200);
    assert_eq!(traj.samples()[0], NVec4::new(0.01, 0.005, 0.0, 0.0));
    assert_eq!(traj.times()[0], 0.0);
    assert!(traj.times().windows(2).all(|w| w[1] > w[0]), "times not increasing");
}

#[test]
fn on_axis_seed_stops_trace_early() {
    // y and dy/dt both start at exactly zero, so the error scale of that
    // component is TINY and the first step is forced through
    let traj = trace(Coordinates::Planar, &default_magnets(), 0.01, 0.0, 200);

    assert!(!traj.is_empty());
    assert!(traj.len() < traj.capacity(), "traced all {} points", traj.len());
    assert_eq!(traj.samples()[0], NVec4::new(0.01, 0.0, 0.0, 0.0));
}

#[test]
fn retracing_reuses_trajectory() {
    let params = Parameters::default();
    let magnets = default_magnets();
    let mut tracer = Tracer::default();
    let mut traj = Trajectory::with_capacity(300);

    tracer.trace(Coordinates::Planar, &params, &magnets, 0.02, 0.02, &mut traj);
    let n = tracer.trace(Coordinates::Planar, &params, &magnets, -0.01, 0.0, &mut traj);

    assert_eq!(n, traj.len());
    assert_eq!(traj.position(0), NVec2::new(-0.01, 0.0));
}

#[test]
fn single_magnet_trajectory_settles() {
    let traj = trace(Coordinates::Planar, &[magnet(-0.03, -0.03)], 0.01, 0.0, 1500);
    assert!(traj.len() > 1);

    let peak = traj.samples().iter().map(sample_speed).fold(0.0, f64::max);
    let (last, _) = traj.last().unwrap();
    let final_speed = sample_speed(last);

    assert!(final_speed < 0.05, "final speed {final_speed}");
    assert!(final_speed < peak / 10.0, "final {final_speed} vs peak {peak}");
}

#[test]
fn longer_trace_comes_to_rest_over_magnet() {
    let traj = trace(Coordinates::Planar, &[magnet(-0.03, -0.03)], 0.01, 0.0, 6000);
    let (last, _) = traj.last().unwrap();

    assert!(sample_speed(last) < 1e-3, "final speed {}", sample_speed(last));
    let end = NVec2::new(last[0], last[1]);
    assert!((end - NVec2::new(-0.03, -0.03)).norm() < 0.01, "ended at {end:?}");
}

#[test]
fn spherical_trace_ends_near_magnet() {
    let traj = trace(Coordinates::Spherical, &[magnet(-0.03, -0.03)], 0.01, 0.0, 1500);
    let end = traj.position(traj.len() - 1);

    assert!((end - NVec2::new(-0.03, -0.03)).norm() < 0.005, "ended at {end:?}");
}

// ==================================================================================
// Trajectory buffer and replay tests
// ==================================================================================

#[test]
fn trajectory_drops_samples_past_capacity() {
    let mut traj = Trajectory::with_capacity(2);
    assert!(traj.push(NVec4::zeros(), 0.0));
    assert!(traj.push(NVec4::zeros(), 0.1));
    assert!(!traj.push(NVec4::zeros(), 0.2));
    assert_eq!(traj.len(), 2);
    assert!(traj.is_full());
}

#[test]
fn replay_index_never_decreases_and_terminates() {
    let traj = trace(Coordinates::Planar, &default_magnets(), 0.02, 0.01, 400);
    let mut clock = ReplayClock::new(1.0);
    clock.reset(&traj);

    let mut prev = 0;
    let mut ticks = 0;
    while clock.advance(&traj, 0.01) {
        assert!(clock.index() >= prev, "index went back");
        assert!(clock.fraction() >= 0.0 && clock.fraction() < 1.0);
        prev = clock.index();
        ticks += 1;
        assert!(ticks < 1_000_000, "replay never ended");
    }

    assert_eq!(clock.index(), traj.len() - 1);
    assert_eq!(clock.position(), traj.position(traj.len() - 1));
    assert!(!clock.advance(&traj, 0.01));
}

#[test]
fn replay_interpolates_between_samples() {
    let mut traj = Trajectory::with_capacity(3);
    traj.push(NVec4::new(0.0, 0.0, 0.0, 0.0), 0.0);
    traj.push(NVec4::new(1.0, 2.0, 0.0, 0.0), 1.0);
    traj.push(NVec4::new(3.0, 2.0, 0.0, 0.0), 2.0);

    let mut clock = ReplayClock::new(0.5);
    clock.reset(&traj);

    assert!(clock.advance(&traj, 0.5)); // t = 0.25
    assert_eq!(clock.index(), 0);
    assert_abs_diff_eq!(clock.position().x, 0.25, epsilon = 1e-12);
    assert_abs_diff_eq!(clock.position().y, 0.5, epsilon = 1e-12);

    assert!(clock.advance(&traj, 2.0)); // t = 1.25
    assert_eq!(clock.index(), 1);
    assert_abs_diff_eq!(clock.position().x, 1.5, epsilon = 1e-12);

    // negative time never rewinds
    assert!(clock.advance(&traj, -5.0));
    assert_eq!(clock.index(), 1);
    assert_relative_eq!(clock.time(), 1.25);

    assert!(!clock.advance(&traj, 2.0));
    assert_eq!(clock.position(), NVec2::new(3.0, 2.0));
}

#[test]
fn replay_of_empty_trajectory_is_finished() {
    let traj = Trajectory::with_capacity(10);
    let mut clock = ReplayClock::default();
    assert!(!clock.advance(&traj, 0.01));
    assert_eq!(clock.position(), NVec2::zeros());
}

// ==================================================================================
// Field tests
// ==================================================================================

#[test]
fn ping_pong_swap_exchanges_roles() {
    let mut pp = PingPong::new(vec![1, 2], vec![0, 0]);
    {
        let (cur, next) = pp.split();
        next[0] = cur[0] * 10;
        next[1] = cur[1] * 10;
    }
    assert_eq!(pp.current(), &vec![1, 2]);

    pp.swap();
    assert_eq!(pp.current(), &vec![10, 20]);
    assert_eq!(pp.next_mut(), &mut vec![1, 2]);
}

#[test]
fn grid_is_centered_and_bottom_up() {
    let p = Parameters::default();
    let vp = Viewport::new(4, 3, &p);
    let grid = vp.grid();

    assert_eq!(grid.len(), 12);
    assert_relative_eq!(vp.rmax_y, p.rmax());
    assert_relative_eq!(vp.rmax_x, p.rmax() * 4.0 / 3.0);

    // point symmetric about the origin
    for (a, b) in grid.iter().zip(grid.iter().rev()) {
        assert_abs_diff_eq!(a.x, -b.x, epsilon = 1e-15);
        assert_abs_diff_eq!(a.y, -b.y, epsilon = 1e-15);
    }
    // first row is the bottom one
    assert!(grid[0].y < 0.0 && grid[0].x < 0.0);
    assert!(grid[11].y > 0.0 && grid[11].x > 0.0);
}

#[test]
fn pixel_mapping_round_trips() {
    let p = Parameters::default();
    let vp = Viewport::new(200, 100, &p);

    let center = vp.pixel_to_position(100.0, 50.0);
    assert_abs_diff_eq!(center.x, 0.0, epsilon = 1e-15);
    assert_abs_diff_eq!(center.y, 0.0, epsilon = 1e-15);

    let corner = vp.pixel_to_position(0.0, 0.0);
    assert_relative_eq!(corner.x, -vp.rmax_x);
    assert_relative_eq!(corner.y, vp.rmax_y);

    let q = vp.pixel_to_position(37.0, 81.0);
    let (px, py) = vp.position_to_pixel(&q);
    assert_relative_eq!(px, 37.0, epsilon = 1e-9);
    assert_relative_eq!(py, 81.0, epsilon = 1e-9);
}

#[test]
fn centroid_particle_stays_put() {
    let p = Parameters::default();
    let magnets = three_fold_magnets();
    let vp = Viewport::new(1, 1, &p);
    let mut field = FieldEvolver::new(vp, Coordinates::Planar, &p, 0.005, 1e-3);
    assert_eq!(field.current()[0], NVec4::zeros());

    for _ in 0..2000 {
        field.tick(Coordinates::Planar, &p, &magnets);
    }
    let s = field.current()[0];
    assert!(s.x.abs() < 1e-9 && s.y.abs() < 1e-9, "drifted to {s:?}");
    assert_eq!(field.ticks(), 2000);
}

#[test]
fn field_particle_settles_in_magnet_basin() {
    let p = Parameters::default();
    let magnets = [magnet(-0.03, -0.03)];
    let vp = Viewport::new(1, 1, &p);
    let seeds = vec![Coordinates::Planar.seed_state(0.01, 0.0, &p)];
    let mut field = FieldEvolver::from_seeds(vp, seeds, 0.005, 1e-3);

    for _ in 0..4000 {
        field.tick(Coordinates::Planar, &p, &magnets);
    }

    assert_eq!(field.basins(Coordinates::Planar, &p, &magnets), vec![Some(0)]);
    assert!(field.settle_ticks()[0].is_some());
    let s = field.current()[0];
    assert!((NVec2::new(s.x, s.y) - NVec2::new(-0.03, -0.03)).norm() < 0.01);
}

#[test]
fn field_reset_restores_seeds() {
    let p = Parameters::default();
    let magnets = default_magnets();
    let vp = Viewport::new(8, 6, &p);
    let mut field = FieldEvolver::new(vp, Coordinates::Planar, &p, 0.005, 1e-3);

    for _ in 0..10 {
        field.tick(Coordinates::Planar, &p, &magnets);
    }
    assert_ne!(field.current(), field.seeds());

    field.reset();
    assert_eq!(field.current(), field.seeds());
    assert_eq!(field.ticks(), 0);
    assert!(field.settle_ticks().iter().all(|s| s.is_none()));
}

// ==================================================================================
// Transport tests
// ==================================================================================

#[test]
fn transport_transitions() {
    let mut tr = Transport::new();
    assert_eq!(tr.state(), RunState::Stopped);
    assert!(!tr.take_tick());

    // single step is consumed by exactly one tick
    tr.step();
    assert_eq!(tr.state(), RunState::SingleStepping);
    assert!(tr.take_tick());
    assert_eq!(tr.state(), RunState::Stopped);
    assert!(!tr.take_tick());

    // play toggles
    tr.play();
    assert!(tr.is_running());
    assert!(tr.take_tick());
    assert!(tr.take_tick());

    // stepping while running is ignored
    tr.step();
    assert_eq!(tr.state(), RunState::Running);

    tr.play();
    assert_eq!(tr.state(), RunState::Stopped);

    tr.play();
    tr.finish();
    assert_eq!(tr.state(), RunState::Stopped);
}

// ==================================================================================
// Parameter file tests
// ==================================================================================

#[test]
fn param_file_round_trip() {
    let params = Parameters {
        pendulum_length: 1.5,
        pendulum_height: 1.5 + 0.1 + 0.2,
        gravity: 9.80665,
        damping: 0.3,
        kappa: 1.0,
        mag_factor: 0.0125,
        max_theta: 7.5,
    };
    let magnets = vec![
        Magnet::new(0.1 / 3.0, -0.02, 1.5, [0.25, 0.5, 1.0], 0),
        Magnet::new(-0.015, 0.04, 0.75, [1.0, 0.0, 0.125], 1),
    ];

    let text = format_params(&params, &magnets);
    let set = parse_params(&text, &Parameters::default());

    assert_eq!(set.parameters, params);
    assert_eq!(set.magnets, magnets);
}

#[test]
fn param_file_save_and_load() {
    let path = std::env::temp_dir().join(format!("mpsim_params_{}.par", std::process::id()));
    let mut params = Parameters::default();
    params.damping = 0.42;
    let magnets = vec![Magnet::new(0.01, 0.02, 2.0, [0.5, 0.5, 0.5], 0)];

    mpsim::save_params(&path, &params, &magnets).unwrap();
    let set = mpsim::load_params(&path, &Parameters::default()).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(set.parameters.damping, 0.42);
    assert_eq!(set.magnets, magnets);
}

#[test]
fn missing_param_file_is_io_error() {
    let err = mpsim::load_params("/nonexistent/dir/params.par", &Parameters::default());
    assert!(matches!(err, Err(mpsim::ParamFileError::Io { .. })));
}

#[test]
fn empty_param_file_installs_default_magnets() {
    let base = Parameters::default();
    let set = parse_params("# nothing here\n\n", &base);

    assert_eq!(set.parameters, base);
    assert_eq!(set.magnets, default_magnets());
}

#[test]
fn malformed_param_lines_are_skipped() {
    let text = "gravity abc\n\
                magnet 1 2 3\n\
                damping 0.25\n\
                foo 3\n\
                maxTheta\n\
                magnet 0.01 0.02 1 0 0 2\n\
                magnet 0.01 x 1 0 0 2\n";
    let set = parse_params(text, &Parameters::default());

    assert_eq!(set.parameters.damping, 0.25);
    assert_eq!(set.parameters.gravity, 9.81);
    assert_eq!(set.parameters.max_theta, 5.0);
    assert_eq!(set.magnets.len(), 1);
    assert_eq!(set.magnets[0].alpha, 2.0);
    assert_eq!(set.magnets[0].color, [1.0, 0.0, 0.0]);
}

// ==================================================================================
// Scenario tests
// ==================================================================================

#[test]
fn yaml_defaults() {
    let cfg = ScenarioConfig::from_yaml_str("{}").unwrap();
    assert!(cfg.magnets.is_empty());
    assert!(cfg.param_file.is_none());

    let sim = Simulation::build_scenario(cfg);
    assert_eq!(sim.engine, Engine::default());
    assert_eq!(sim.parameters(), &Parameters::default());
    assert_eq!(sim.magnets(), default_magnets().as_slice());
}

#[test]
fn yaml_partial_sections() {
    let text = "engine:\n  coordinates: spherical\n  max_points: 300\n\
                parameters:\n  damping: 0.5\n\
                magnets:\n  - { x: 0.01, y: 0.02 }\n";
    let cfg = ScenarioConfig::from_yaml_str(text).unwrap();
    let sim = Simulation::build_scenario(cfg);

    assert_eq!(sim.coordinates(), Coordinates::Spherical);
    assert_eq!(sim.engine.max_points, 300);
    assert_eq!(sim.engine.tracer.tolerance, 1e-8);
    assert_eq!(sim.parameters().damping, 0.5);
    assert_eq!(sim.parameters().gravity, 9.81);
    assert_eq!(sim.magnets().len(), 1);
    assert_eq!(sim.magnets()[0].alpha, 1.0);
}

#[test]
fn bad_yaml_is_an_error() {
    assert!(ScenarioConfig::from_yaml_str("engine: [1, 2").is_err());
    assert!(ScenarioConfig::from_yaml_str("engine:\n  coordinates: polar\n").is_err());
}

#[test]
fn simulation_seed_and_replay() {
    let mut sim = Simulation::build_scenario(ScenarioConfig::default());
    let n = sim.set_seed(0.02, -0.01);
    assert_eq!(n, sim.trajectory().len());
    assert_eq!(sim.trajectory_positions()[0], NVec2::new(0.02, -0.01));

    // stopped transport ignores ticks
    assert!(!sim.replay_tick(0.01));

    sim.replay_transport.step();
    assert!(sim.replay_tick(0.01));
    assert_eq!(sim.replay_transport.state(), RunState::Stopped);

    sim.replay_transport.play();
    while sim.replay_tick(1.0) {}
    assert_eq!(sim.replay_transport.state(), RunState::Stopped);

    sim.clear_trajectory();
    assert!(sim.trajectory().is_empty());
    assert!(sim.seed().is_none());
}

#[test]
fn simulation_magnet_edits() {
    let mut sim = Simulation::build_scenario(ScenarioConfig::default());
    sim.set_seed(0.01, 0.005);
    assert!(sim.trajectory().len() > 1);
    let before = sim.trajectory().samples().to_vec();

    let id = sim.magnets()[1].id;
    assert_eq!(sim.magnet_index(id), Some(1));
    assert_eq!(sim.magnet_index(7), None);

    assert!(!sim.move_magnet(17, 0.0, 0.0));
    assert!(sim.move_magnet(1, 0.02, -0.02));
    assert_eq!(sim.magnets()[1].pos.x, 0.02);
    assert_ne!(sim.trajectory().samples(), before.as_slice());

    assert!(sim.set_magnet_color(0, [0.1, 0.2, 0.3]));
    assert!(!sim.set_magnet_alpha(3, 2.0));

    sim.set_magnets(Vec::new());
    assert_eq!(sim.magnets(), default_magnets().as_slice());
}

#[test]
fn simulation_field_ticks_follow_transport() {
    let mut engine = Engine::default();
    engine.field_width = 6;
    engine.field_height = 4;
    let mut sim = Simulation::new(engine, Parameters::default(), Vec::new());
    assert_eq!(sim.field().len(), 24);

    assert!(!sim.field_tick());
    sim.field_transport.step();
    assert!(sim.field_tick());
    assert!(!sim.field_tick());
    assert_eq!(sim.field().ticks(), 1);
    assert_eq!(mpsim::window_title(&sim), "mpsim | field steps: 1");

    sim.resize(0, 10);
    assert_eq!(sim.field().len(), 24);
    sim.resize(3, 2);
    assert_eq!(sim.field().len(), 6);
    assert_eq!(sim.field().ticks(), 0);

    sim.field_transport.play();
    sim.field_tick();
    sim.reset();
    assert_eq!(sim.field().ticks(), 0);
    assert_eq!(sim.field_transport.state(), RunState::Stopped);
}

#[test]
fn parameter_change_relays_field() {
    let mut engine = Engine::default();
    engine.field_width = 6;
    engine.field_height = 4;
    let mut sim = Simulation::new(engine, Parameters::default(), Vec::new());
    sim.field_transport.step();
    sim.field_tick();

    let mut p = Parameters::default();
    p.max_theta = 40.0;
    sim.set_parameters(p);

    let vp = *sim.field().viewport();
    assert_eq!((vp.width, vp.height), (6, 4));
    assert_relative_eq!(vp.rmax_y, sim.parameters().rmax());
    assert_eq!(sim.field().ticks(), 0);
    assert_eq!(sim.field().current(), sim.field().seeds());
    let corner = sim.field().seeds()[0];
    assert_relative_eq!(corner.y, vp.cell_center(0, 0).y);
}

#[test]
fn loading_params_relays_spherical_field() {
    let path = std::env::temp_dir().join(format!("mpsim_relay_{}.par", std::process::id()));
    std::fs::write(&path, "maxTheta 20\npendulumLength 3\n").unwrap();

    let cfg = ScenarioConfig::from_yaml_str("engine:\n  coordinates: spherical\n  field_width: 5\n  field_height: 5\n").unwrap();
    let mut sim = Simulation::build_scenario(cfg);
    let result = sim.load_params(&path);
    std::fs::remove_file(&path).ok();
    result.unwrap();

    let p = sim.parameters().clone();
    assert_eq!(p.pendulum_length, 3.0);
    let vp = *sim.field().viewport();
    assert_relative_eq!(vp.rmax_y, p.rmax());

    // seeds sit on the new grid, in the new pendulum's angles
    let expected = Coordinates::Spherical.seed_state(vp.cell_center(0, 0).x, vp.cell_center(0, 0).y, &p);
    assert_eq!(sim.field().seeds()[0], expected);
}

