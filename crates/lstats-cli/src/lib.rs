//! lstats command line front end
//!
//! Argument parsing, logging setup and console rendering for the `lstats`
//! binary. The collection itself lives in `lstats-core`.

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod args;
pub mod report;

pub use args::{command, CliArgs, LogFormat};
pub use report::{render_report, render_table};

use anyhow::Context;
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber, logging to stderr
///
/// `RUST_LOG` wins over `level` when set.
///
/// # Errors
/// If `level` is not a valid filter directive or a subscriber is already installed
pub fn init_tracing(level: &str, format: LogFormat) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .with_context(|| format!("invalid log level directive '{level}'"))?,
    };
    tracing::subscriber::set_global_default(subscriber(filter, format, std::io::stderr))
        .context("tracing subscriber already installed")
}

/// Formatting subscriber writing `format` lines that pass `filter` to `writer`
pub fn subscriber<W>(
    filter: EnvFilter,
    format: LogFormat,
    writer: W,
) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(writer);
    match format {
        LogFormat::Text => Box::new(builder.finish()),
        LogFormat::Json => Box::new(builder.json().finish()),
    }
}
