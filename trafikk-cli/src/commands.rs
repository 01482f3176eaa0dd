use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info, instrument};

use trafikk_config::TrafikkConfig;
use trafikk_core::SimulationConfig;
use trafikk_simulator::{DriverError, FlowCurve, Simulator, Sweep};
use trafikk_telemetry::{EventLogger, MetricsRecorder};

#[derive(Parser)]
#[command(version, about = "Single-lane traffic simulation (Nagel–Schreckenberg)")]
pub struct Cli {
    /// Configuration file; defaults and `config/trafikk.yaml` are used otherwise.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print Prometheus metrics when the command finishes.
    #[arg(long, global = true)]
    pub metrics: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record the occupancy of every step as a space-time matrix
    Trace(TraceArgs),
    /// Measure the mean flow after a transient
    Flow(FlowArgs),
    /// Measure flow over the configured density/probability grid
    Sweep(SweepArgs),
}

/// Overrides for the configured road parameters.
#[derive(Args, Debug, Clone, Default)]
pub struct RoadArgs {
    /// Number of cells on the ring road
    #[arg(long)]
    pub length: Option<usize>,
    /// Fraction of cells occupied at start
    #[arg(long)]
    pub density: Option<f64>,
    #[arg(long)]
    pub max_speed: Option<u16>,
    /// Slow-down probability
    #[arg(short, long)]
    pub probability: Option<f64>,
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct TraceArgs {
    #[command(flatten)]
    pub road: RoadArgs,
    /// Rows to record, the initial road included
    #[arg(long)]
    pub steps: Option<usize>,
    /// Write the matrix here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Fail unless the trace checksum equals this value
    #[arg(long)]
    pub validate_hash: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct FlowArgs {
    #[command(flatten)]
    pub road: RoadArgs,
    #[arg(long)]
    pub steps: Option<usize>,
    /// Leading steps left out of the average
    #[arg(long)]
    pub transient: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct SweepArgs {
    #[arg(long)]
    pub seed: Option<u64>,
    /// Worker threads, one per CPU by default
    #[arg(long)]
    pub workers: Option<usize>,
    /// Write the YAML table here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Serialize)]
struct SweepReport {
    length: usize,
    max_speed: u16,
    steps: usize,
    transient: usize,
    seed: u64,
    curves: Vec<FlowCurve>,
}

pub fn run_command(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => TrafikkConfig::load_from_path(path),
        None => TrafikkConfig::load(),
    }
    .context("failed to load configuration")?;

    EventLogger::init(&config.telemetry.log_level, config.telemetry.json_logs)
        .context("failed to initialise logging")?;
    let metrics = MetricsRecorder::new().context("failed to register metrics")?;

    let outcome = match cli.command {
        Commands::Trace(args) => run_trace_mode(&config, args, &metrics),
        Commands::Flow(args) => run_flow_mode(&config, args, &metrics),
        Commands::Sweep(args) => run_sweep_mode(&config, args, &metrics),
    };

    if let Err(err) = &outcome {
        if is_invariant_violation(err) {
            metrics.record_invariant_failure();
        }
        error!(error = %err, "command failed");
    }

    if cli.metrics || config.telemetry.metrics {
        let text = metrics.gather_metrics().context("failed to gather metrics")?;
        eprint!("{text}");
    }
    outcome
}

/// Applies command-line overrides on top of the loaded configuration.
fn apply_road_args(config: &TrafikkConfig, road: &RoadArgs) -> TrafikkConfig {
    let mut config = config.clone();
    if let Some(length) = road.length {
        config.road.length = length;
    }
    if let Some(density) = road.density {
        config.road.density = density;
    }
    if let Some(max_speed) = road.max_speed {
        config.road.max_speed = max_speed;
    }
    if let Some(probability) = road.probability {
        config.road.slowdown_probability = probability;
    }
    if let Some(seed) = road.seed {
        config.road.seed = seed;
    }
    config
}

fn trace_config(config: &TrafikkConfig, steps: usize) -> Result<SimulationConfig> {
    SimulationConfig::new(
        config.road.length,
        config.road.density,
        config.road.max_speed,
        config.road.slowdown_probability,
        steps,
        0,
    )
    .context("invalid trace parameters")
}

#[instrument(level = "info", name = "trace_command", skip_all)]
fn run_trace_mode(config: &TrafikkConfig, args: TraceArgs, metrics: &MetricsRecorder) -> Result<()> {
    let config = apply_road_args(config, &args.road);
    let steps = args.steps.unwrap_or(config.run.trace_steps);
    let simulation = trace_config(&config, steps)?;

    let mut simulator = Simulator::seeded(simulation, config.road.seed)?;
    let trace = simulator.trace()?;
    metrics.record_run(simulator.step_count());

    match &args.output {
        Some(path) => trace.write_matrix(create_output(path)?)?,
        None => trace.write_matrix(io::stdout().lock())?,
    }

    let checksum = trace.checksum();
    info!(rows = trace.steps(), checksum = %checksum, "space-time recorded");
    EventLogger::log_event(
        "trace_complete",
        &[
            ("seed", config.road.seed.to_string()),
            ("rows", trace.steps().to_string()),
            ("checksum", checksum.clone()),
        ],
    );
    report_checksum(
        &checksum,
        args.output.is_none(),
        io::stdout().lock(),
        io::stderr().lock(),
    )?;

    if let Some(expected) = &args.validate_hash {
        trace
            .verify_checksum(expected)
            .context("trace does not replay the expected run")?;
        info!("checksum validated");
    }
    Ok(())
}

#[instrument(level = "info", name = "flow_command", skip_all)]
fn run_flow_mode(config: &TrafikkConfig, args: FlowArgs, metrics: &MetricsRecorder) -> Result<()> {
    let mut config = apply_road_args(config, &args.road);
    if let Some(steps) = args.steps {
        config.run.steps = steps;
    }
    if let Some(transient) = args.transient {
        config.run.transient = transient;
    }
    let simulation = config.simulation().context("invalid flow parameters")?;

    let flow = Simulator::seeded(simulation, config.road.seed)?.measure_flow()?;
    metrics.record_run(simulation.steps());
    metrics.record_flow(flow);

    EventLogger::log_event(
        "flow_complete",
        &[
            ("density", simulation.density().to_string()),
            ("p", simulation.slowdown_probability().to_string()),
            ("flow", flow.to_string()),
        ],
    );
    println!("{flow}");
    Ok(())
}

#[instrument(level = "info", name = "sweep_command", skip_all)]
fn run_sweep_mode(config: &TrafikkConfig, args: SweepArgs, metrics: &MetricsRecorder) -> Result<()> {
    let base = config.simulation().context("invalid sweep parameters")?;
    let seed = args.seed.unwrap_or(config.road.seed);
    let mut sweep = Sweep::new(
        &base,
        &config.sweep.densities(),
        &config.sweep.probabilities,
        seed,
    )?;
    if let Some(workers) = args.workers.or(config.sweep.workers) {
        sweep = sweep.with_workers(workers);
    }

    let result = sweep.run()?;
    for point in &result.points {
        metrics.record_run(base.steps());
        metrics.record_flow(point.flow);
    }

    let report = SweepReport {
        length: base.length(),
        max_speed: base.max_speed(),
        steps: base.steps(),
        transient: base.transient(),
        seed,
        curves: result.curves(),
    };
    let yaml = serde_yaml::to_string(&report).context("failed to serialise sweep")?;
    match &args.output {
        Some(path) => {
            let mut out = create_output(path)?;
            out.write_all(yaml.as_bytes())?;
            out.flush()?;
        }
        None => print!("{yaml}"),
    }
    Ok(())
}

/// Prints the trace checksum on stdout, or on stderr when stdout already
/// carries the matrix.
fn report_checksum<O: Write, E: Write>(
    checksum: &str,
    matrix_on_stdout: bool,
    mut stdout: O,
    mut stderr: E,
) -> io::Result<()> {
    if matrix_on_stdout {
        writeln!(stderr, "{checksum}")
    } else {
        writeln!(stdout, "{checksum}")
    }
}

fn create_output(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn is_invariant_violation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<DriverError>(),
            Some(DriverError::Simulation(
                trafikk_core::SimulationError::InvariantViolation(_)
            ))
        )
    })
}
