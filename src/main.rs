//! Single-target HTTP forwarding proxy.
//!
//! ```text
//!  client ──▶ 0.0.0.0:5000 ──▶ interpret body ──▶ re-encode ──▶ localhost:<forwarding_port>
//!  client ◀── status/headers/body as received ◀──────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use passthrough_proxy::config::load_config;
use passthrough_proxy::observability::logging;
use passthrough_proxy::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "passthrough-proxy")]
#[command(about = "Forward every request to a single local upstream", long_about = None)]
struct Cli {
    /// Path to the YAML (or TOML) configuration file.
    #[arg(short, long, default_value = "config.yml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(path = %cli.config.display(), error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        target = %config.target_base(),
        proxy_version_2 = config.proxy_version_2,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
