//! u-dispatch - command-line front end.
//!
//! Solves scenario files with the heuristic dispatcher, tunes its weights
//! with GA or PSO, and produces new scenarios (random or time-shifted).

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use u_dispatch::dispatching::{DeviationMode, Dispatcher, HeuristicParams};
use u_dispatch::evaluation::verify_schedule;
use u_dispatch::models::PriorityClass;
use u_dispatch::scenario::{
    load, shift_scenario, GeneratorConfig, ScenarioDocument, ScenarioGenerator, ShiftOptions,
};
use u_dispatch::tuning::ga::{GaConfig, GaTuner};
use u_dispatch::tuning::pso::{PsoConfig, PsoTuner};
use u_dispatch::tuning::{HeuristicObjective, ScenarioFileSink, SearchSpace, TuningResult};
use u_dispatch::validation::validate_scenario;

/// Deadline-aware job-shop dispatcher.
#[derive(Debug, Parser)]
#[command(name = "u-dispatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Dispatch a scenario and write the solved scenario.
    Solve(SolveArgs),

    /// Tune dispatcher weights with a genetic algorithm.
    TuneGa(TuneArgs),

    /// Tune dispatcher weights with particle swarm optimization.
    TunePso(TuneArgs),

    /// Generate a random scenario.
    Generate(GenerateArgs),

    /// Move a solved scenario to a later time origin for replanning.
    Shift(ShiftArgs),

    /// Validate a scenario file.
    Check(CheckArgs),
}

#[derive(Debug, Args)]
struct SolveArgs {
    /// Scenario file.
    scenario: PathBuf,

    /// Where to write the solved scenario.
    #[arg(short, long)]
    output: PathBuf,

    /// Dispatcher parameters (JSON); defaults apply to missing fields.
    #[arg(long)]
    params: Option<PathBuf>,

    /// Where to write schedule statistics; stdout if omitted.
    #[arg(long)]
    stats: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct TuneArgs {
    /// Scenario file.
    scenario: PathBuf,

    /// Where to write the best solved scenario.
    #[arg(long)]
    solution_out: PathBuf,

    /// Where to write statistics of the best schedule.
    #[arg(long)]
    stats_out: PathBuf,

    /// Search configuration (JSON); defaults apply to missing fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of generations or iterations.
    #[arg(long)]
    iterations: Option<usize>,

    /// Random seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Score the earlier-plan deviation symmetrically.
    #[arg(long)]
    symmetric_deviation: bool,

    /// Evaluate candidates on one thread.
    #[arg(long)]
    sequential: bool,
}

#[derive(Debug, Args)]
struct GenerateArgs {
    /// Where to write the scenario.
    #[arg(short, long)]
    output: PathBuf,

    /// Generator configuration (JSON); defaults apply to missing fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of jobs.
    #[arg(long)]
    jobs: Option<usize>,

    /// Machines per task type.
    #[arg(long)]
    machines_per_type: Option<usize>,

    /// Seed for machine constants.
    #[arg(long)]
    machine_seed: Option<u64>,

    /// Seed for jobs and tasks.
    #[arg(long)]
    instance_seed: Option<u64>,
}

#[derive(Debug, Args)]
struct ShiftArgs {
    /// Solved scenario file.
    scenario: PathBuf,

    /// Time of the disruption.
    #[arg(long)]
    by: f64,

    /// Where to write the shifted scenario.
    #[arg(short, long)]
    output: PathBuf,

    /// Extra deadline reduction, as JOB=AMOUNT (repeatable).
    #[arg(long, value_parser = parse_pair::<f64>)]
    reduce_deadline: Vec<(i64, f64)>,

    /// Priority override, as JOB=CLASS (repeatable).
    #[arg(long, value_parser = parse_pair::<PriorityClass>)]
    priority: Vec<(i64, PriorityClass)>,
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Scenario file.
    scenario: PathBuf,
}

fn parse_pair<T>(s: &str) -> std::result::Result<(i64, T), String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected JOB=VALUE, got `{s}`"))?;
    let job = key
        .trim()
        .parse()
        .map_err(|e| format!("bad job id `{key}`: {e}"))?;
    let value = value
        .trim()
        .parse()
        .map_err(|e| format!("bad value `{value}`: {e}"))?;
    Ok((job, value))
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

fn read_scenario(path: &Path) -> Result<ScenarioDocument> {
    ScenarioDocument::from_path(path)
        .with_context(|| format!("failed to read scenario {}", path.display()))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("invalid JSON: {}", path.display()))
}

fn write_json<T: Serialize>(value: &T, path: Option<&Path>) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    match path {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
        }
        None => {
            println!("{text}");
            Ok(())
        }
    }
}

fn solve(args: SolveArgs) -> Result<()> {
    let doc = read_scenario(&args.scenario)?;
    let problem = load(&doc).context("failed to build problem")?;
    let params: HeuristicParams = match &args.params {
        Some(path) => read_json(path)?,
        None => HeuristicParams::default(),
    };

    let mut dispatcher = Dispatcher::new(&problem).with_params(params)?;
    dispatcher.run()?;

    let violations = verify_schedule(&problem, dispatcher.schedule()?);
    for v in violations.iter().filter(|v| v.is_hard()) {
        warn!(kind = ?v.violation_type, entity = v.entity_id, "{}", v.message);
    }
    if violations.iter().any(|v| v.is_hard()) {
        return Err(anyhow!("schedule failed verification"));
    }

    let stats = dispatcher.stats()?;
    let mut solved = doc;
    let written = dispatcher.export_solutions(&mut solved)?;
    solved
        .write_to(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    info!(
        tasks = written,
        objective = stats.objective(problem.objective_weights()),
        output = %args.output.display(),
        "solved"
    );
    write_json(&stats, args.stats.as_deref())
}

fn tune(args: TuneArgs, use_pso: bool) -> Result<()> {
    let doc = read_scenario(&args.scenario)?;
    let problem = load(&doc).context("failed to build problem")?;
    let mode = if args.symmetric_deviation {
        DeviationMode::Symmetric
    } else {
        DeviationMode::Signed
    };
    let objective = HeuristicObjective::new(&problem).with_deviation_mode(mode);
    let mut sink = ScenarioFileSink::new(doc, &args.solution_out, &args.stats_out);

    let result: TuningResult = if use_pso {
        let mut config: PsoConfig = match &args.config {
            Some(path) => read_json(path)?,
            None => PsoConfig::default(),
        };
        if let Some(n) = args.iterations {
            config.max_iterations = n;
        }
        if let Some(seed) = args.seed {
            config.seed = seed;
        }
        config.parallel &= !args.sequential;
        PsoTuner::new(config, SearchSpace::default())?.run(&objective, &mut sink)?
    } else {
        let mut config: GaConfig = match &args.config {
            Some(path) => read_json(path)?,
            None => GaConfig::default(),
        };
        if let Some(n) = args.iterations {
            config.max_generations = n;
        }
        if let Some(seed) = args.seed {
            config.seed = seed;
        }
        config.parallel &= !args.sequential;
        GaTuner::new(config, SearchSpace::default())?.run(&objective, &mut sink)?
    };

    info!(
        best = result.best_objective,
        evaluations = result.evaluations,
        improvements = sink.writes(),
        "tuning finished"
    );
    write_json(&result, None)
}

fn generate(args: GenerateArgs) -> Result<()> {
    let mut config: GeneratorConfig = match &args.config {
        Some(path) => read_json(path)?,
        None => GeneratorConfig::default(),
    };
    if let Some(n) = args.jobs {
        config.job_count = n;
    }
    if let Some(n) = args.machines_per_type {
        config.machines_per_type = n;
    }
    if let Some(seed) = args.machine_seed {
        config.machine_seed = seed;
    }
    if let Some(seed) = args.instance_seed {
        config.instance_seed = seed;
    }

    let doc = ScenarioGenerator::new(config)?.generate()?;
    doc.write_to(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    info!(
        jobs = doc.jobs.len(),
        tasks = doc.task_count(),
        output = %args.output.display(),
        "generated"
    );
    Ok(())
}

fn shift(args: ShiftArgs) -> Result<()> {
    let doc = read_scenario(&args.scenario)?;
    let mut options = ShiftOptions::new(args.by);
    for (job, amount) in args.reduce_deadline {
        options = options.reduce_deadline(job, amount);
    }
    for (job, class) in args.priority {
        options = options.override_priority(job, class);
    }

    let shifted = shift_scenario(&doc, &options)?;
    shifted
        .write_to(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    info!(
        jobs = shifted.jobs.len(),
        tasks = shifted.task_count(),
        output = %args.output.display(),
        "shifted"
    );
    Ok(())
}

fn check(args: CheckArgs) -> Result<()> {
    let doc = read_scenario(&args.scenario)?;
    match validate_scenario(&doc) {
        Ok(()) => {
            println!(
                "OK: {} machines, {} jobs, {} tasks",
                doc.machines.len(),
                doc.jobs.len(),
                doc.task_count()
            );
            Ok(())
        }
        Err(errors) => {
            for e in &errors {
                println!("{:?}: {}", e.kind, e.message);
            }
            Err(anyhow!("{} validation errors", errors.len()))
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json);

    match cli.command {
        Commands::Solve(args) => solve(args),
        Commands::TuneGa(args) => tune(args, false),
        Commands::TunePso(args) => tune(args, true),
        Commands::Generate(args) => generate(args),
        Commands::Shift(args) => shift(args),
        Commands::Check(args) => check(args),
    }
}
