//! Tower Defense - Development Tools

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use td_tools::validate::{
    convert_level, validate_config_file, validate_data_directory, validate_level_file, Report,
    ValidationError,
};

#[derive(Parser)]
#[command(name = "td-tools")]
#[command(about = "Development tools for the tower-defense workspace")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate every level and config under a data directory
    Validate {
        /// Path to data directory (with `levels/` and `config/`)
        #[arg(default_value = "assets")]
        path: PathBuf,
    },
    /// Validate one level file
    Level {
        /// Level file (.json or .ron)
        path: PathBuf,
    },
    /// Validate one RON config file
    Config {
        /// Config file
        path: PathBuf,
    },
    /// Convert a level between JSON and RON
    Convert {
        /// Source level
        input: PathBuf,
        /// Destination; the extension picks the format
        output: PathBuf,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { path } => {
            tracing::info!("Validating data files in: {}", path.display());
            validate_data_directory(&path).map(|reports| {
                tracing::info!("Validation passed ({} documents)", reports.len());
            })
        }
        Commands::Level { path } => validate_level_file(&path).and_then(print_report),
        Commands::Config { path } => validate_config_file(&path).and_then(print_report),
        Commands::Convert { input, output } => {
            convert_level(&input, &output).map(|level| {
                tracing::info!(
                    "Wrote '{}' ({}x{}) to {}",
                    level.name,
                    level.width,
                    level.height,
                    output.display()
                );
            })
        }
    };

    if let Err(e) = result {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn print_report(report: Report) -> Result<(), ValidationError> {
    println!("{report}");
    if report.is_ok() {
        Ok(())
    } else {
        Err(ValidationError::Failed {
            failed: 1,
            checked: 1,
        })
    }
}
