use crate::cli::{CheckArgs, Command, DEFAULT_CONFIG_DIR, OutputFormat, VerbosityLevel};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Trait for abstracting environment variable access
pub trait EnvProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// System environment variable provider for production use
pub struct SystemEnvProvider;

impl EnvProvider for SystemEnvProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Environment variable error: {0}")]
    Environment(String),

    #[error("Unsupported configuration file format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

const CONFIG_FILE_NAMES: [&str; 4] = [
    "ha-refcheck.toml",
    "ha-refcheck.json",
    ".ha-refcheck.toml",
    ".ha-refcheck.json",
];

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub validation: ValidationConfig,
    pub output: OutputConfig,
    pub files: FileConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ValidationConfig {
    /// Home Assistant configuration directory
    pub config_dir: PathBuf,
    /// Shape checks of `configuration.yaml`, `automations.yaml` and `scripts.yaml`
    pub check_structure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub verbose: bool,
    /// Errors and verdict only
    pub quiet: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    /// Exclude patterns (glob syntax, relative to the configuration directory)
    pub exclude_patterns: Vec<String>,
    pub follow_symlinks: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive
    pub level: String,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            check_structure: true,
        }
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            exclude_patterns: Vec::new(),
            follow_symlinks: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Config {
    pub fn verbosity(&self) -> VerbosityLevel {
        if self.output.quiet {
            VerbosityLevel::Quiet
        } else if self.output.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }
}

/// Configuration manager for loading and merging configurations
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration with precedence: defaults -> file -> environment -> CLI
    pub async fn load_config(command: &Command) -> Result<Config> {
        Self::load_config_with(&SystemEnvProvider, command).await
    }

    pub async fn load_config_with(env: &impl EnvProvider, command: &Command) -> Result<Config> {
        let mut config = match &command.common().config {
            Some(config_path) => Self::load_from_file(config_path).await?,
            None => Self::find_config_file().await?.unwrap_or_default(),
        };

        config = Self::apply_environment_overrides_with(env, config)?;
        config = Self::merge_with_cli(config, command);

        Self::validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a file (TOML or JSON)
    pub async fn load_from_file(path: &Path) -> Result<Config> {
        let content = tokio::fs::read_to_string(path).await?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => {
                // Try to parse as TOML first, then JSON
                if let Ok(config) = toml::from_str::<Config>(&content) {
                    Ok(config)
                } else {
                    Ok(serde_json::from_str(&content)?)
                }
            }
        }
    }

    /// Find configuration file in standard locations
    pub async fn find_config_file() -> Result<Option<Config>> {
        for name in &CONFIG_FILE_NAMES {
            let path = PathBuf::from(name);
            if path.exists() {
                return Ok(Some(Self::load_from_file(&path).await?));
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let app_config_dir = config_dir.join("ha-refcheck");
            for name in &CONFIG_FILE_NAMES {
                let path = app_config_dir.join(name);
                if path.exists() {
                    return Ok(Some(Self::load_from_file(&path).await?));
                }
            }
        }

        Ok(None)
    }

    /// Apply environment variable overrides with a custom environment provider
    pub fn apply_environment_overrides_with(
        env: &impl EnvProvider,
        mut config: Config,
    ) -> Result<Config> {
        if let Some(config_dir) = env.get("HA_REFCHECK_CONFIG_DIR") {
            config.validation.config_dir = PathBuf::from(config_dir);
        }

        if let Some(verbose) = env.get("HA_REFCHECK_VERBOSE") {
            config.output.verbose = verbose.parse().map_err(|_| {
                ConfigError::Environment(format!("Invalid HA_REFCHECK_VERBOSE value: {}", verbose))
            })?;
        }

        if let Some(quiet) = env.get("HA_REFCHECK_QUIET") {
            config.output.quiet = quiet.parse().map_err(|_| {
                ConfigError::Environment(format!("Invalid HA_REFCHECK_QUIET value: {}", quiet))
            })?;
        }

        if let Some(format) = env.get("HA_REFCHECK_FORMAT") {
            config.output.format = match format.to_lowercase().as_str() {
                "human" => OutputFormat::Human,
                "json" => OutputFormat::Json,
                _ => {
                    return Err(ConfigError::Environment(format!(
                        "Invalid HA_REFCHECK_FORMAT value: {}",
                        format
                    )));
                }
            };
        }

        if let Some(exclude) = env.get("HA_REFCHECK_EXCLUDE") {
            config.files.exclude_patterns = exclude
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Some(level) = env.get("HA_REFCHECK_LOG") {
            config.logging.level = level;
        }

        Ok(config)
    }

    /// Merge CLI arguments with configuration (CLI takes precedence)
    pub fn merge_with_cli(mut config: Config, command: &Command) -> Config {
        match command {
            Command::Check(args) => config = Self::merge_check_args(config, args),
            Command::Entities(args) => {
                if let Some(config_dir) = &args.config_dir {
                    config.validation.config_dir = config_dir.clone();
                }
            }
        }

        if let Some(level) = &command.common().log_level {
            config.logging.level = level.clone();
        }

        config
    }

    fn merge_check_args(mut config: Config, args: &CheckArgs) -> Config {
        if let Some(config_dir) = &args.config_dir {
            config.validation.config_dir = config_dir.clone();
        }
        if let Some(format) = args.format {
            config.output.format = format;
        }
        match args.verbosity() {
            Some(VerbosityLevel::Quiet) => {
                config.output.quiet = true;
                config.output.verbose = false;
            }
            Some(VerbosityLevel::Verbose) => {
                config.output.verbose = true;
                config.output.quiet = false;
            }
            _ => {}
        }
        if !args.exclude_patterns.is_empty() {
            config.files.exclude_patterns = args.exclude_patterns.clone();
        }
        if args.no_follow_symlinks {
            config.files.follow_symlinks = false;
        }
        if args.no_structure {
            config.validation.check_structure = false;
        }
        config
    }

    /// Validate configuration values
    pub fn validate_config(config: &Config) -> Result<()> {
        if config.output.verbose && config.output.quiet {
            return Err(ConfigError::Validation(
                "Cannot enable both verbose and quiet modes".to_string(),
            ));
        }

        if config.validation.config_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "Configuration directory must not be empty".to_string(),
            ));
        }

        for pattern in &config.files.exclude_patterns {
            globset::Glob::new(pattern).map_err(|e| {
                ConfigError::Validation(format!("Invalid exclude pattern '{}': {}", pattern, e))
            })?;
        }

        if config.logging.level.trim().is_empty() {
            return Err(ConfigError::Validation(
                "Log level must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
