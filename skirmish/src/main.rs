//! skirmish entry point.
//!
//! ```text
//! skirmish                          Local session (no networking)
//! skirmish host [--addr ADDR]       Wait for the other player
//! skirmish join [--addr ADDR]       Connect to a hosting player
//! skirmish --ticks N <mode>         Stop after N ticks
//! skirmish --config <path>          Load a custom config TOML
//! skirmish --gen-config             Write default config to stdout
//! ```

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use skirmish::cli::Cli;
use skirmish::config::SkirmishConfig;
use skirmish::runner::SessionRunner;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // --gen-config: dump defaults and exit.
    if cli.gen_config {
        println!("{}", SkirmishConfig::default_toml()?);
        return Ok(());
    }

    let config = SkirmishConfig::load(&cli.config);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mode = cli.session_mode();
    info!("skirmish v{}", env!("CARGO_PKG_VERSION"));
    info!("mode: {mode}");
    info!("tick rate: {}/s", config.session.tick_rate);

    let runner = SessionRunner::new(mode, config);
    let stop = runner.stop_handle();

    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Ctrl-C received, shutting down");
        stop.store(false, std::sync::atomic::Ordering::SeqCst);
    });

    let summary = runner.run(cli.ticks).await?;
    if let Some(stats) = summary.stats {
        info!(
            "sent {} snapshots, received {}, dropped {} stale",
            stats.sent, stats.received, stats.dropped
        );
    }

    Ok(())
}
