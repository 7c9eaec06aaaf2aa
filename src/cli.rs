use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default configuration directory when none is given
pub const DEFAULT_CONFIG_DIR: &str = "config";

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Errors and the final verdict only
    Quiet,
    #[default]
    Normal,
    /// Also show file counts
    Verbose,
}

/// Report rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

/// Validate entity, device and area references in a Home Assistant configuration
#[derive(Parser, Debug, Clone)]
#[command(name = "ha-refcheck")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub check: CheckArgs,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Validate references (the default)
    Check(CheckArgs),
    /// Browse the entity registry
    Entities(EntitiesArgs),
}

/// Options shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Configuration file (TOML or JSON)
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `ha_refcheck=trace`
    #[arg(long = "log-level", value_name = "FILTER")]
    pub log_level: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CheckArgs {
    /// Home Assistant configuration directory
    #[arg(value_name = "CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Output format
    #[arg(long = "format", value_enum)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Only print errors and the verdict
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,

    /// Skip files matching a glob, relative to the configuration directory
    #[arg(long = "exclude", value_name = "GLOB", action = clap::ArgAction::Append)]
    pub exclude_patterns: Vec<String>,

    /// Skip symbolic links while discovering files
    #[arg(long = "no-follow-symlinks")]
    pub no_follow_symlinks: bool,

    /// Skip the shape checks of configuration, automations and scripts files
    #[arg(long = "no-structure")]
    pub no_structure: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct EntitiesArgs {
    /// Home Assistant configuration directory
    #[arg(value_name = "CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Show entities of one domain
    #[arg(short = 'd', long = "domain")]
    pub domain: Option<String>,

    /// Show entities of one area (name or id)
    #[arg(short = 'a', long = "area")]
    pub area: Option<String>,

    /// Search entity ids and names
    #[arg(short = 's', long = "search")]
    pub search: Option<String>,

    /// List every entity instead of a summary
    #[arg(short = 'f', long = "full")]
    pub full: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The selected command, defaulting to validation
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Check(self.check))
    }
}

impl Command {
    pub fn common(&self) -> &CommonArgs {
        match self {
            Command::Check(args) => &args.common,
            Command::Entities(args) => &args.common,
        }
    }
}

impl CheckArgs {
    pub fn verbosity(&self) -> Option<VerbosityLevel> {
        if self.quiet {
            Some(VerbosityLevel::Quiet)
        } else if self.verbose {
            Some(VerbosityLevel::Verbose)
        } else {
            None
        }
    }
}
