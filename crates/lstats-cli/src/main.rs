use anyhow::Context;
use lstats_cache::FsEntityCache;
use lstats_cli::{command, init_tracing, render_report, CliArgs};
use lstats_core::{LimitedTransport, StatsConfig, StatsPipeline};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::from_matches(&command().get_matches());
    init_tracing(&args.log_level, args.log_format)?;

    let mut config = match &args.config {
        Some(path) => StatsConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => StatsConfig::new(),
    };
    if let Some(dir) = &args.cache_dir {
        config = config.with_cache_dir(dir);
    }

    tracing::info!(
        listing = %config.listing_url,
        cache = %config.cache_dir.display(),
        max_connections = config.max_connections,
        "starting collection"
    );

    let transport =
        Arc::new(LimitedTransport::from_config(&config).context("building HTTP transport")?);
    let cache = Arc::new(
        FsEntityCache::open(&config.cache_dir)
            .await
            .with_context(|| format!("opening cache at {}", config.cache_dir.display()))?,
    );

    let report = StatsPipeline::new(&config, transport, cache)?
        .run()
        .await
        .context("collection run failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", render_report(&report));
    }
    Ok(())
}
