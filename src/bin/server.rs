use std::sync::Arc;

use tokio::net::TcpListener;

use profile_wizard::config::AppConfig;
use profile_wizard::core::logging::{self, StartupError};
use profile_wizard::database::Database;
use profile_wizard::server::{self, ServerState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load();
    let data_dir = config.data_dir();
    let _log_guard = logging::init(&data_dir);
    tracing::info!(version = profile_wizard::VERSION, "Profile service starting");

    let db = match Database::new(&data_dir).await {
        Ok(db) => db,
        Err(e) => {
            logging::report_fatal(
                StartupError::new(format!("Failed to open database: {e}")).with_help(format!(
                    "Check that {} is writable",
                    data_dir.display()
                )),
            );
            std::process::exit(1);
        }
    };

    let addr = config.server.bind_addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            logging::report_fatal(
                StartupError::new(format!("Failed to bind {addr}: {e}"))
                    .with_help("Set PROFILE_WIZARD_SERVER__PORT to use another port"),
            );
            std::process::exit(1);
        }
    };

    let state = Arc::new(ServerState::new(db));
    server::serve(listener, state, shutdown_signal()).await?;

    tracing::info!("Profile service exited");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
