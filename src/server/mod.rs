//! Profile Backend Service
//!
//! Persists submitted profiles and serves the geography reference tables.
//!
//! ## Endpoints
//! - `GET /` - Health check
//! - `POST /submit-profile` - Store a profile (JSON or multipart with `photo`)
//! - `POST /check-username` - Username availability
//! - `GET /countries` - All countries
//! - `GET /states?countryId=` - States of a country
//! - `GET /cities?stateId=` - Cities of a state

mod error;
mod routes;

pub use error::ServerError;
pub use routes::SubmittedProfile;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};

use crate::core::profile::validators::MAX_PHOTO_BYTES;
use crate::database::Database;

/// Request bodies may carry a maximum-size photo plus the text fields.
const MAX_BODY_BYTES: usize = 2 * MAX_PHOTO_BYTES;

/// Shared handler state
pub struct ServerState {
    pub db: Database,
}

impl ServerState {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

/// Build the router with permissive CORS.
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/submit-profile", post(routes::submit_profile))
        .route("/check-username", post(routes::check_username))
        .route("/countries", get(routes::countries))
        .route("/states", get(routes::states))
        .route("/cities", get(routes::cities))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .with_state(state)
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: Arc<ServerState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Profile service listening on http://{}", addr);
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Background handle around [`serve`], stopped with [`ProfileServer::stop`].
pub struct ProfileServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    local_addr: Option<SocketAddr>,
}

impl ProfileServer {
    pub fn new(db: Database, addr: SocketAddr) -> Self {
        Self {
            addr,
            state: Arc::new(ServerState::new(db)),
            shutdown_tx: None,
            local_addr: None,
        }
    }

    /// Bind and start serving in the background. Returns the bound address,
    /// which differs from the requested one when port 0 was asked for.
    pub async fn start(&mut self) -> Result<SocketAddr, ServerError> {
        if self.shutdown_tx.is_some() {
            return Err(ServerError::AlreadyRunning);
        }

        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: self.addr.to_string(),
                reason: e.to_string(),
            })?;
        let local_addr = listener.local_addr().map_err(|e| ServerError::Bind {
            addr: self.addr.to_string(),
            reason: e.to_string(),
        })?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let state = self.state.clone();

        tokio::spawn(async move {
            let shutdown = async {
                let _ = shutdown_rx.await;
                tracing::info!("Profile service shutting down");
            };
            if let Err(e) = serve(listener, state, shutdown).await {
                tracing::error!(error = %e, "Profile service stopped with error");
            }
        });

        self.shutdown_tx = Some(shutdown_tx);
        self.local_addr = Some(local_addr);
        Ok(local_addr)
    }

    /// Stop the service
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            self.local_addr = None;
            tracing::info!("Profile service stopped");
        }
    }

    /// Check if the service is running
    pub fn is_running(&self) -> bool {
        self.shutdown_tx.is_some()
    }

    /// Base URL of the running service
    pub fn url(&self) -> Option<String> {
        self.local_addr.map(|addr| format!("http://{}", addr))
    }
}
