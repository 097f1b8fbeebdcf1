use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};
use tokio::signal::ctrl_c;
use agrisense_simulator::cli::Cli;
use agrisense_simulator::config::Settings;
use agrisense_simulator::controllers::Simulator;
use agrisense_simulator::utils::logging;

/// The main entry point of the AgriSense sensor simulator
#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Application error: {}", e);
        std::process::exit(1);
    }
}


/// The core logic of the simulator
///
/// 1. Parses command line overrides and loads settings from configuration files and the environment
/// 2. Initializes the logging system
/// 3. Builds the simulator for the default sensor fleet
/// 4. Runs the loop in the foreground, or on a background task with `--background`, until Ctrl-C
///
/// # Returns
///
/// * `Ok(())` after a normal shutdown
/// * `Err(anyhow::Error)` if startup fails
async fn run() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.api_url, cli.interval)?;
    let _guard = logging::init_logger(&settings.logging)?;
    debug!("Loaded settings: {:#?}", settings);
    info!("Sending readings to {}", settings.simulator.api_url);

    let simulator = Simulator::from_settings(&settings)?;

    if cli.background {
        let handle = simulator.spawn()?;
        ctrl_c().await?;
        info!("Received shutdown signal. Waiting for the current pass to finish...");
        handle.shutdown().await?;
    } else {
        tokio::select! {
            result = simulator.run() => result?,
            _ = ctrl_c() => {
                simulator.stop();
            }
        }
    }

    info!("🛑 Simulation stopped");
    Ok(())
}
