use nbody::{bench_forces, bench_integrators};
use nbody::{CsvSnapshotWriter, IntegratorConfig, NullSink, Scenario, ScenarioConfig, Simulation, SnapshotSink};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "nbody", about = "Direct-sum gravitational N-body simulator")]
struct Args {
    /// Scenario file (.yaml or .json); looked up in scenarios/ if not found
    #[arg(default_value = "two_body.yaml")]
    scenario: PathBuf,

    /// Expected spatial dimensionality of every particle
    #[arg(short, long)]
    dimensions: Option<usize>,

    /// Integrator, overriding the scenario
    #[arg(short, long, value_enum)]
    integrator: Option<IntegratorConfig>,

    /// Step size up to which `auto` picks explicit Euler
    #[arg(long)]
    threshold: Option<f64>,

    /// Directory for snapshot CSV files
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Snapshot file name prefix
    #[arg(long)]
    prefix: Option<String>,

    /// Skip the energy diagnostic
    #[arg(long)]
    no_energy: bool,

    /// Do not write snapshots
    #[arg(long)]
    no_output: bool,

    /// Run the timing benchmarks instead of a scenario
    #[arg(long)]
    bench: bool,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }
}

// resolve here to keep main clean
fn load_scenario(args: &Args) -> Result<ScenarioConfig> {
    let path = if args.scenario.exists() {
        args.scenario.clone()
    } else {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(&args.scenario)
    };

    let mut cfg = ScenarioConfig::from_path(&path)
        .with_context(|| format!("failed to load scenario {}", args.scenario.display()))?;

    // command line wins over the file
    if let Some(d) = args.dimensions {
        cfg.engine.dimensions = Some(d);
    }
    if let Some(integrator) = args.integrator {
        cfg.engine.integrator = integrator;
    }
    if let Some(threshold) = args.threshold {
        cfg.engine.threshold = threshold;
    }
    if let Some(dir) = &args.output_dir {
        cfg.output.directory = dir.clone();
    }
    if let Some(prefix) = &args.prefix {
        cfg.output.prefix = prefix.clone();
    }
    if args.no_energy {
        cfg.engine.energy = false;
    }

    Ok(cfg)
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    if args.bench {
        bench_forces()?;
        bench_integrators()?;
        return Ok(());
    }

    let cfg = load_scenario(&args)?;
    let scenario = Scenario::build_scenario(cfg).context("invalid scenario")?;

    let mut sink: Box<dyn SnapshotSink> = if args.no_output {
        Box::new(NullSink)
    } else {
        let writer = CsvSnapshotWriter::new(scenario.output.directory.clone(), scenario.output.prefix.clone())?;
        info!(directory = %writer.directory().display(), "writing snapshots");
        Box::new(writer)
    };

    let mut sim = Simulation::from_scenario(scenario);
    let summary = sim.run(sink.as_mut()).context("simulation aborted")?;

    println!(
        "{} steps with {} up to t = {}",
        summary.steps,
        sim.integrator_name(),
        summary.final_time
    );
    match (summary.final_drift, summary.max_drift) {
        (Some(drift), Some(max)) => println!("relative energy drift: final {drift:.3e}, max {max:.3e}"),
        (Some(_), None) => println!("relative energy drift: undefined (initial energy is zero)"),
        _ => {}
    }

    Ok(())
}
