use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{error, info};
use serde::Serialize;

use dispatch_core::logging;
use dispatch_core::scenario::{
    load_scenario, random_scenario, run_scenario, RandomScenarioConfig, ScenarioParams,
    ScenarioRun, StepRecord,
};
use dispatch_core::telemetry::WorldSnapshot;
use dispatch_core::telemetry_export::write_completed_rides_csv_file;

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "dispatch_sim",
    about = "Grid ride dispatch simulator",
    long_about = "Runs a scripted or seeded ride dispatch scenario and prints\n\
                  the final world snapshot as JSON."
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Also write completed rides to this CSV file
    #[arg(long, global = true)]
    csv: Option<PathBuf>,

    /// Include the per-command step log in the output
    #[arg(long, global = true)]
    steps: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario JSON file
    Run {
        /// Path to the scenario file
        scenario: PathBuf,
    },
    /// Generate and run a seeded random scenario
    Random {
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value_t = 20)]
        drivers: usize,
        #[arg(long, default_value_t = 50)]
        riders: usize,
        /// Probability that a rider's first offer is rejected
        #[arg(long, default_value_t = 0.2)]
        reject_probability: f64,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let params = match &cli.command {
        Commands::Run { scenario } => match load_scenario(scenario) {
            Ok(params) => params,
            Err(err) => {
                error!("{err}");
                return ExitCode::FAILURE;
            }
        },
        Commands::Random {
            seed,
            drivers,
            riders,
            reject_probability,
        } => random_scenario(RandomScenarioConfig {
            reject_probability: *reject_probability,
            ..RandomScenarioConfig::default()
                .with_seed(*seed)
                .with_counts(*drivers, *riders)
        }),
    };

    match execute(&cli, &params) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

#[derive(Serialize)]
struct Output<'a> {
    snapshot: &'a WorldSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    steps: Option<&'a [StepRecord]>,
}

fn execute(cli: &Cli, params: &ScenarioParams) -> Result<(), Box<dyn std::error::Error>> {
    let run = run_scenario(params)?;
    report(&run);

    if let Some(path) = &cli.csv {
        write_completed_rides_csv_file(path, run.simulation.telemetry())?;
        info!("wrote completed rides to {}", path.display());
    }

    let snapshot = run.simulation.snapshot();
    let output = Output {
        snapshot: &snapshot,
        steps: cli.steps.then_some(run.steps.as_slice()),
    };
    let text = if cli.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{text}");
    Ok(())
}

fn report(run: &ScenarioRun) {
    let telemetry = run.simulation.telemetry();
    info!(
        "{} ticks, {} offers ({} rejected), {} assigned, {} completed, {} failed, {} refused commands",
        run.simulation.tick_count(),
        telemetry.offers_made,
        telemetry.offers_rejected,
        telemetry.rides_assigned,
        telemetry.rides_completed(),
        telemetry.requests_failed,
        run.rejected_steps().count()
    );
}
