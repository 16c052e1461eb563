//! Command line definition

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human readable lines
    Text,
    /// One JSON object per event
    Json,
}

/// Parsed invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    /// TOML configuration file
    pub config: Option<PathBuf>,
    /// Overrides `cache_dir` from the configuration
    pub cache_dir: Option<PathBuf>,
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub log_level: String,
    /// Log line format
    pub log_format: LogFormat,
    /// Print the report as JSON instead of bar charts
    pub json: bool,
}

/// `lstats` command
#[must_use]
pub fn command() -> Command {
    Command::new("lstats")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Collect leaderboard users' weekly stats and chart them per dimension")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("cache-dir")
                .long("cache-dir")
                .value_parser(value_parser!(PathBuf))
                .help("Directory holding cached user records"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .default_value("info")
                .help("Log filter directive, overridden by RUST_LOG"),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .default_value("text")
                .value_parser(["text", "json"])
                .help("Log line format"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Output the report as JSON"),
        )
}

impl CliArgs {
    /// Extract arguments from matches produced by [`command`]
    #[must_use]
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let log_format = match matches.get_one::<String>("log-format").map(String::as_str) {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };
        Self {
            config: matches.get_one::<PathBuf>("config").cloned(),
            cache_dir: matches.get_one::<PathBuf>("cache-dir").cloned(),
            log_level: matches
                .get_one::<String>("log-level")
                .cloned()
                .unwrap_or_else(|| "info".to_string()),
            log_format,
            json: matches.get_flag("json"),
        }
    }
}
