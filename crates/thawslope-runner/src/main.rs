//! `thawslope` command-line interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thawslope_diffusion::DiffusionParams;
use thawslope_forcing::{ActiveLayerSolver, ForcingLookup, StefanSolver, DEFAULT_SNOW_DENSITY_RATIO};
use thawslope_runner::workflow::load_forcing;
use thawslope_runner::{execute, ForcingFormat, Result, RunError, RunState, SimulationConfig};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Permafrost hillslope evolution by depth-dependent soil diffusion
#[derive(Parser)]
#[command(name = "thawslope")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Permafrost hillslope diffusion simulator", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation from a YAML config
    Run {
        /// Path to the run config
        config: PathBuf,

        /// Override the output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override the number of steps
        #[arg(short, long)]
        steps: Option<u64>,
    },
    /// Print active-layer thickness per forcing year
    Alt {
        /// Forcing JSON file
        forcing: PathBuf,

        /// Input holds monthly temperature and SWE records
        #[arg(long)]
        monthly: bool,

        /// Only this year
        #[arg(long)]
        year: Option<i32>,
    },
    /// Print the explicit stability bound for a grid spacing and diffusivity
    Stability {
        /// Cell size (m)
        #[arg(long)]
        spacing: f64,

        /// Diffusivity (m²/yr)
        #[arg(long)]
        diffusivity: f64,

        /// Configured time step (yr), to report the sub-step count
        #[arg(long)]
        dt: Option<f64>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    thawslope_metrics::describe_metrics();

    let result = match cli.command {
        Commands::Run {
            config,
            output,
            steps,
        } => cmd_run(config, output, steps),
        Commands::Alt {
            forcing,
            monthly,
            year,
        } => cmd_alt(forcing, monthly, year),
        Commands::Stability {
            spacing,
            diffusivity,
            dt,
        } => cmd_stability(spacing, diffusivity, dt),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_run(config_path: PathBuf, output: Option<PathBuf>, steps: Option<u64>) -> Result<ExitCode> {
    let mut config = SimulationConfig::from_yaml_file(&config_path)?;
    if let Some(dir) = output {
        config.output.dir = dir;
    }
    if let Some(steps) = steps {
        config.run.steps = steps;
    }
    config.validate()?;

    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    if let Err(e) = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    }) {
        warn!("Could not install Ctrl-C handler: {}", e);
    }

    info!("Starting run '{}' from {}", config.name, config_path.display());
    let summary = execute(&config, &cancel)?;
    println!(
        "{}: {} steps ({} yr), {} snapshots in {}",
        config.name,
        summary.steps_completed,
        summary.elapsed_years,
        summary.manifest.snapshots.len(),
        config.output.dir.display()
    );

    // 130 is the shell convention for termination by SIGINT
    Ok(match summary.state {
        RunState::Cancelled => ExitCode::from(130),
        _ => ExitCode::SUCCESS,
    })
}

fn cmd_alt(forcing: PathBuf, monthly: bool, year: Option<i32>) -> Result<ExitCode> {
    let format = if monthly {
        ForcingFormat::Monthly
    } else {
        ForcingFormat::Annual
    };
    let series = load_forcing(&forcing, format, DEFAULT_SNOW_DENSITY_RATIO)?;
    let solver = StefanSolver::default();

    let years: Vec<i32> = match year {
        Some(y) => vec![y],
        None => series.years().collect(),
    };
    println!("year\tmean_c\tamplitude_c\tsnow_m\talt_m");
    for y in years {
        let f = series.forcing_for_year(y)?;
        let alt = solver.active_layer_thickness(&f)?;
        println!(
            "{}\t{:.2}\t{:.2}\t{:.3}\t{:.3}",
            y, f.temperature_mean, f.temperature_amplitude, f.snow_thickness, alt
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_stability(spacing: f64, diffusivity: f64, dt: Option<f64>) -> Result<ExitCode> {
    if !(spacing.is_finite() && spacing > 0.0) {
        return Err(RunError::InvalidParameter(format!(
            "spacing must be positive, got {}",
            spacing
        )));
    }
    let params = DiffusionParams::new(diffusivity, 1.0, dt.unwrap_or(1.0))?;
    println!("max stable dt: {} yr", params.max_stable_dt(spacing));
    if dt.is_some() {
        println!("sub-steps per step: {}", params.substeps(spacing)?);
    }
    Ok(ExitCode::SUCCESS)
}
