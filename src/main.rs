use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use ha_refcheck::cli::{Cli, Command};
use ha_refcheck::config::{Config, ConfigManager};
use ha_refcheck::explorer;
use ha_refcheck::file_discovery::FileDiscovery;
use ha_refcheck::output::Output;
use ha_refcheck::validator::ReferenceValidator;

/// Exit status for usage, configuration and I/O failures of the tool itself
const EXIT_USAGE: u8 = 2;

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let command = Cli::parse_args().into_command();

    match run(command).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(EXIT_USAGE)
        }
    }
}

async fn run(command: Command) -> Result<ExitCode> {
    let config = ConfigManager::load_config(&command)
        .await
        .context("invalid configuration")?;
    init_tracing(&config.logging.level);
    debug!(?config, "effective configuration");

    match command {
        Command::Check(_) => check(&config).await,
        Command::Entities(args) => {
            let rendered = explorer::explore(&config.validation.config_dir, &args)?;
            print!("{rendered}");
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn check(config: &Config) -> Result<ExitCode> {
    let discovery = FileDiscovery::new()
        .with_follow_symlinks(config.files.follow_symlinks)
        .with_exclude_patterns(config.files.exclude_patterns.clone())?;
    let mut validator = ReferenceValidator::new(&config.validation.config_dir)
        .with_discovery(discovery)
        .with_structure_checks(config.validation.check_structure);

    let all_valid = validator
        .validate_all()
        .await
        .with_context(|| format!("cannot scan {}", config.validation.config_dir.display()))?;
    let report = validator.into_report();

    let rendered = Output::new(config.verbosity()).render(&report, config.output.format)?;
    print!("{rendered}");

    if all_valid && report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
