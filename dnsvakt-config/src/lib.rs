//! # dnsvakt-config
//!
//! The settings surface. Values may come from CLI flags or from an
//! `appsettings.json` file in the working directory; flags override the file,
//! file keys are matched case-insensitively, and quoted string values are
//! unwrapped. Missing required values fail startup before any thread runs.

mod cli;
mod error;
mod file;

use std::path::Path;

use clap::error::ErrorKind;
use clap::Parser;
use validator::Validate;

use cli::CliArgs;
use file::FileSettings;

pub use error::ConfigError;

/// Settings file read from the working directory when present.
pub const SETTINGS_FILE: &str = "appsettings.json";

pub const DEFAULT_MAX_BATCH_SIZE: u64 = 100_000;
pub const DEFAULT_MAX_CYCLE_COUNT: u64 = 50_000;

/// Fully resolved pipeline settings.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct Settings {
    /// NIC to capture on.
    #[validate(length(min = 1, message = "interface name must not be empty"))]
    pub interface: String,

    /// Total memory budget for the pipeline, in bytes.
    #[validate(range(min = 1, message = "memory budget must be positive"))]
    pub memory_budget_bytes: u64,

    /// Classification store connection string.
    #[validate(length(min = 1, message = "store connection string must not be empty"))]
    pub store_uri: String,

    /// Broker connection string.
    #[validate(length(min = 1, message = "broker connection string must not be empty"))]
    pub broker_uri: String,

    /// Broker destination queue.
    #[validate(length(min = 1, message = "broker queue name must not be empty"))]
    pub broker_queue: String,

    /// Parser worker count.
    #[validate(range(min = 1, message = "at least one parser thread is required"))]
    pub parser_threads: usize,

    /// Classifier flush trigger: unique domains in the pending batch.
    pub max_batch_size: u64,

    /// Classifier flush trigger: accumulated observations.
    pub max_cycle_count: u64,
}

impl Settings {
    /// Loads settings from the process arguments and `./appsettings.json`.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_sources(std::env::args(), Path::new(SETTINGS_FILE))
    }

    /// Loads settings from explicit sources. `args` follows `std::env::args`
    /// conventions (first element is the program name).
    pub fn from_sources<I, S>(args: I, settings_path: &Path) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let cli = CliArgs::try_parse_from(&args).map_err(|error| match error.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                ConfigError::Help(error.to_string())
            }
            _ => ConfigError::Cli(error.to_string()),
        })?;
        let file = FileSettings::load(settings_path)?;

        let settings = Self {
            interface: required_string(cli.interface, &file, "interface")?,
            memory_budget_bytes: cli
                .size
                .or(file.u64("size")?)
                .ok_or(ConfigError::MissingOption("size"))?,
            store_uri: required_string(cli.database, &file, "database")?,
            broker_uri: required_string(cli.rabbitmq, &file, "rabbitmq")?,
            broker_queue: required_string(cli.queue, &file, "queue")?,
            parser_threads: match cli.threads {
                Some(threads) => threads,
                None => file
                    .u64("threads")?
                    .map(|t| t as usize)
                    .unwrap_or_else(default_parser_threads),
            },
            max_batch_size: restore_if_zero(
                cli.max_batch_size.or(file.u64("max-batch-size")?),
                DEFAULT_MAX_BATCH_SIZE,
            ),
            max_cycle_count: restore_if_zero(
                cli.max_cycle_count.or(file.u64("max-cycle-count")?),
                DEFAULT_MAX_CYCLE_COUNT,
            ),
        };

        settings.validate()?;
        Ok(settings)
    }
}

/// Default parser worker count: one core each for capture, classifier and
/// publisher, the rest parse.
pub fn default_parser_threads() -> usize {
    num_cpus::get().saturating_sub(3).max(1)
}

/// Strips one pair of matching single or double quotes.
pub fn trim_quotes(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

fn required_string(
    cli_value: Option<String>,
    file: &FileSettings,
    key: &'static str,
) -> Result<String, ConfigError> {
    match cli_value {
        Some(value) => Ok(trim_quotes(&value).to_string()),
        None => file.string(key)?.ok_or(ConfigError::MissingOption(key)),
    }
}

/// A configured zero restores the default; the thresholds must never be
/// disabled outright.
fn restore_if_zero(configured: Option<u64>, default: u64) -> u64 {
    match configured {
        Some(0) | None => default,
        Some(value) => value,
    }
}
