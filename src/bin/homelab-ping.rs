//! Headless ping API for launchers running on other machines.

use homelab_launcher::logging::init_tracing;
use homelab_launcher::logic::server::{self, ServeError};
use homelab_launcher::logic::{ConfigError, LauncherConfig, Prober};
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Serve(#[from] ServeError),
}

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(err) = run().await {
        error!(error = %err, "homelab-ping exited");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), StartupError> {
    let config = LauncherConfig::from_env()?;
    info!(bind = %config.bind_addr, "starting homelab-ping");

    let (listener, _) = server::bind(config.bind_addr).await?;
    server::serve(listener, Prober::with_reqwest(config.probe_timeout)).await?;
    Ok(())
}
