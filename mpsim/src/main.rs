use mpsim::{ScenarioConfig, Simulation};
use mpsim::run_2d;
use mpsim::{bench_field_tick, bench_rhs, bench_trace};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(about = "Magnetic pendulum simulator")]
struct Args {
    /// Scenario YAML, looked up under scenarios/ unless it is an existing path
    #[arg(short, default_value = "default.yaml")]
    scenario: String,

    /// Parameter file applied on top of the scenario
    #[arg(short)]
    params: Option<PathBuf>,

    /// Trace one bob released above (X, Y) and print it as CSV
    #[arg(long, num_args = 2, value_names = ["X", "Y"], allow_negative_numbers = true)]
    trace: Option<Vec<f64>>,

    /// Evolve the basin field headless for TICKS ticks and print a histogram
    #[arg(long, value_name = "TICKS")]
    basin: Option<u64>,

    /// Write the effective parameters to PATH
    #[arg(long, value_name = "PATH")]
    save_params: Option<PathBuf>,

    /// Run the timing sweeps
    #[arg(long)]
    bench: bool,
}

// resolve here to keep main clean
fn scenario_path(name: &str) -> PathBuf {
    let direct = PathBuf::from(name);
    if direct.exists() {
        return direct;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(name)
}

fn load_simulation(args: &Args) -> Result<Simulation> {
    let path = scenario_path(&args.scenario);
    let cfg = ScenarioConfig::from_path(&path)
        .with_context(|| format!("failed to load scenario {}", path.display()))?;
    info!("scenario {} loaded", path.display());

    let param_file = cfg.param_file.clone();
    let mut sim = Simulation::build_scenario(cfg);

    for file in param_file.iter().chain(args.params.iter()) {
        sim.load_params(file)?;
    }
    Ok(sim)
}

fn print_trace(sim: &mut Simulation, x: f64, y: f64) {
    sim.set_seed(x, y);
    let traj = sim.trajectory();
    println!("t,x,y,vx,vy");
    for (s, t) in traj.samples().iter().zip(traj.times()) {
        println!("{},{},{},{},{}", t, s[0], s[1], s[2], s[3]);
    }
}

fn print_basins(sim: &mut Simulation, ticks: u64) {
    sim.field_transport.play();
    for _ in 0..ticks {
        sim.field_tick();
    }
    sim.field_transport.pause();

    let basins = sim.basins();
    let settled = sim.field().settle_ticks().iter().filter(|s| s.is_some()).count();

    println!("magnet,x,y,particles");
    for (k, m) in sim.magnets().iter().enumerate() {
        let count = basins.iter().filter(|b| **b == Some(k)).count();
        println!("{},{},{},{}", k, m.pos.x, m.pos.y, count);
    }
    println!("# {} of {} particles settled after {} ticks", settled, basins.len(), sim.field().ticks());
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.bench {
        bench_rhs();
        bench_trace();
        bench_field_tick();
        return Ok(());
    }

    let mut sim = load_simulation(&args)?;
    let mut headless = false;

    if let Some(path) = &args.save_params {
        sim.save_params(path)?;
        headless = true;
    }
    if let Some(xy) = &args.trace {
        print_trace(&mut sim, xy[0], xy[1]);
        headless = true;
    }
    if let Some(ticks) = args.basin {
        print_basins(&mut sim, ticks);
        headless = true;
    }

    if !headless {
        run_2d(sim);
    }

    Ok(())
}
