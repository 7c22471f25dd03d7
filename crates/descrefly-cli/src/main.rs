use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use descrefly_cli::{
    check_model_has_description, generate_model_properties_file, tracker_from_config,
    HasDescriptionArgs, PropertiesFileArgs,
};
use descrefly_core::config::DISABLE_TRACKING_ENV;
use descrefly_core::Config;

/// descrefly - pre-commit hooks keeping dbt models documented
#[derive(Parser)]
#[command(name = "descrefly")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: descrefly.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fail when a changed model has no description
    CheckModelHasDescription(HasDescriptionArgs),

    /// Write skeleton properties for changed models without a properties file
    GenerateModelPropertiesFile(PropertiesFileArgs),
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let config = load_config(cli.config.as_deref(), cli.verbose)?;

    let mut stdout = std::io::stdout().lock();
    let (hook, status) = match &cli.command {
        Commands::CheckModelHasDescription(args) => {
            let env_value = std::env::var(DISABLE_TRACKING_ENV).ok();
            let tracker = tracker_from_config(&config.telemetry, env_value.as_deref());
            tracing::debug!(tracker = tracker.name(), "hook tracker selected");

            let status = check_model_has_description(args, &config, tracker.as_ref(), &mut stdout).await?;
            (descrefly_cli::HAS_DESCRIPTION_HOOK, status)
        }
        Commands::GenerateModelPropertiesFile(args) => {
            let status = generate_model_properties_file(args, &mut stdout)?;
            (descrefly_cli::PROPERTIES_FILE_HOOK, status)
        }
    };

    if cli.verbose {
        if status == 0 {
            eprintln!("{} {}", "✓".green(), hook);
        } else {
            eprintln!("{} {} (exit {})", "✗".red(), hook, status);
        }
    }

    Ok(ExitCode::from(u8::try_from(status).unwrap_or(1)))
}

/// Explicit `--config`, else `descrefly.toml` in the working directory, else defaults
fn load_config(path: Option<&Path>, verbose: bool) -> Result<Config> {
    if let Some(config_path) = path {
        return Ok(Config::from_file(config_path)?);
    }

    let default_path = Path::new("descrefly.toml");
    if default_path.exists() {
        return Ok(Config::from_file(default_path)?);
    }

    if verbose {
        eprintln!("{}", "No config file found, using defaults".yellow());
    }
    Ok(Config::default())
}
