//! The command line interface.
use crate::assembly::assemble;
use crate::log;
use crate::model::Model;
use crate::settings::Settings;
use crate::solver::solve;
use ::log::info;
use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

/// The command line interface for the model builder.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Assemble and solve a model.
    Run {
        /// Path to the model directory.
        model_dir: PathBuf,
        /// Solver time limit in seconds, overriding the settings file.
        #[arg(long)]
        time_limit: Option<f64>,
    },
    /// Load and assemble a model without solving it.
    Validate {
        /// The path to the model directory.
        model_dir: PathBuf,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Run {
                model_dir,
                time_limit,
            } => handle_run_command(&model_dir, time_limit, None),
            Self::Validate { model_dir } => handle_validate_command(&model_dir, None),
        }
    }
}

/// Parse CLI arguments and run the requested command
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Load settings from the model directory, if not provided, and initialise the logger
fn setup(model_path: &Path, settings: Option<Settings>) -> Result<Settings> {
    let settings = if let Some(settings) = settings {
        settings
    } else {
        Settings::load(model_path).context("Failed to load settings.")?
    };

    log::init(Some(&settings.log_level)).context("Failed to initialise logging.")?;

    Ok(settings)
}

/// Handle the `run` command.
///
/// Fails if the problem has no optimal solution, after logging the solver status.
pub fn handle_run_command(
    model_path: &Path,
    time_limit: Option<f64>,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = setup(model_path, settings)?;

    let model = Model::from_path(model_path).context("Failed to load model.")?;
    info!("Loaded model from {}", model_path.display());

    let problem = assemble(&model).context("Failed to assemble model.")?;
    let outcome = solve(&problem, time_limit.or(settings.time_limit))?;
    let Some(solution) = outcome.solution else {
        bail!("No optimal solution found: {:?}", outcome.status);
    };

    for (cost_type, value) in solution.iter_costs() {
        info!("{cost_type} costs: {value}");
    }
    info!("Objective value: {}", solution.objective());

    Ok(())
}

/// Handle the `validate` command.
pub fn handle_validate_command(model_path: &Path, settings: Option<Settings>) -> Result<()> {
    setup(model_path, settings)?;

    let model = Model::from_path(model_path).context("Failed to validate model.")?;
    assemble(&model).context("Failed to validate model.")?;
    info!("Model validation successful!");

    Ok(())
}
