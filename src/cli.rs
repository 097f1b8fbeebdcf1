use clap::Parser;

/// Fabricates agricultural sensor telemetry and posts it to an ingestion API
#[derive(Debug, Parser)]
#[command(name = "agrisense-simulator", version, about)]
pub struct Cli {
    /// Endpoint receiving the readings; overrides `simulator.api_url`
    #[arg(long)]
    pub api_url: Option<String>,

    /// Seconds between two passes over the sensors; overrides `simulator.interval_secs`
    #[arg(long)]
    pub interval: Option<u64>,

    /// Run the loop on a background task and wait for Ctrl-C on the main task
    #[arg(long)]
    pub background: bool,
}
