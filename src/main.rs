use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use firestation_gateway::{EXAMPLE_CONFIG, GatewayConfig, Supervisor, logging};

/// Bridges alarm contacts to paging, incident APIs and discrete outputs.
#[derive(Parser, Debug)]
#[command(name = "firestation-gateway")]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file.
    #[arg(short, long, env = "FIRESTATION_GW_CONFIG", default_value = "config.yaml")]
    config: PathBuf,

    /// Print an example configuration and exit.
    #[arg(long)]
    generate_config: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if args.generate_config {
        print!("{EXAMPLE_CONFIG}");
        return ExitCode::SUCCESS;
    }

    let cfg = match GatewayConfig::load(&args.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("firestation-gateway: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = logging::init(&cfg.log) {
        eprintln!("firestation-gateway: {e}");
        return ExitCode::FAILURE;
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config.display(),
        "firestation-gateway starting"
    );

    let supervisor = Supervisor::from_config(&cfg);
    match supervisor.run().await {
        Ok(()) => {
            info!("firestation-gateway stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(label = e.as_label(), error = %e, "firestation-gateway stopped with error");
            ExitCode::FAILURE
        }
    }
}
