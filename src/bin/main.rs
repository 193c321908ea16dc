//! posvm Command Line Interface
//!
//! Runs the position classification pipeline, or inspects a saved model.

use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::{error, info};
use posvm::core::Result;
use posvm::persistence::ModelStore;
use posvm::pipeline::{self, FinalModel, PipelineConfig};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "posvm")]
#[command(about = "Predict basketball player positions with a support vector classifier")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "posvm contributors")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Player statistics CSV
    #[arg(long)]
    data: Option<PathBuf>,

    /// Model file to write
    #[arg(long)]
    model: Option<PathBuf>,

    /// JSON file with pipeline settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fit the final model with the grid search winner
    #[arg(long)]
    use_tuned: bool,

    /// Standardize inside each cross-validation fold
    #[arg(long)]
    scale_cv: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Display model information
    Info(InfoArgs),
}

#[derive(Args)]
struct InfoArgs {
    /// Model file
    #[arg(short, long, default_value = "svm_model.json")]
    model: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let result = match &cli.command {
        Some(Commands::Info(args)) => info_command(args),
        None => run_command(&cli),
    };

    if let Err(e) = result {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn build_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            info!("Reading settings from {}", path.display());
            PipelineConfig::from_file(path)?
        }
        None => PipelineConfig::default(),
    };

    if let Some(data) = &cli.data {
        config.data_path = data.clone();
    }
    if let Some(model) = &cli.model {
        config.model_path = model.clone();
    }
    if cli.use_tuned {
        config.final_model = FinalModel::Tuned;
    }
    if cli.scale_cv {
        config.scale_cv = true;
    }
    Ok(config)
}

fn run_command(cli: &Cli) -> Result<()> {
    let config = build_config(cli)?;
    info!(
        "Running pipeline: {} -> {}",
        config.data_path.display(),
        config.model_path.display()
    );

    let report = pipeline::run(&config)?;
    println!("{report}");
    info!("Model saved to {}", report.model_path.display());
    Ok(())
}

fn info_command(args: &InfoArgs) -> Result<()> {
    let model = ModelStore::new(&args.model).load()?;
    println!("{}", model.summary());
    Ok(())
}
