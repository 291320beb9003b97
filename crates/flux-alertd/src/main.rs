mod app;

use anyhow::Result;
use clap::Parser;
use flux_config::ConfigLoader;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config/alertd.toml")]
    config: PathBuf,

    /// Run a single evaluation pass and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = ConfigLoader::load(&args.config)?;
    flux_logging::init_logging(&config.logging)?;

    info!(config = ?args.config, "Starting flux-alertd");

    let service = app::build_service(&config).await?;

    if args.once {
        let report = service.run_pass().await?;
        info!(
            checked = report.checked,
            failed = report.failed,
            "Single pass completed"
        );
        return Ok(());
    }

    let delay = config.poll.startup_delay();
    if !delay.is_zero() {
        info!(delay_secs = delay.as_secs(), "Waiting before first pass");
        tokio::time::sleep(delay).await;
    }

    tokio::select! {
        _ = service.run() => {
            warn!("Alert service loop exited");
        }
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("Received shutdown signal, stopping flux-alertd");
        }
    }

    Ok(())
}
