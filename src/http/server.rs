//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the database handler
//! - Wire up middleware (tracing, request ID, timeout, concurrency cap)
//! - Redirect everything outside the database mount to the home page
//! - Bind server to listener, plain or TLS
//! - Graceful shutdown

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Redirect, Response},
    routing::any,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::auth::{AllowAll, Authenticator, StaticAccounts};
use crate::config::ServerConfig;
use crate::delivery::request::{is_database_path, UpdateRequest};
use crate::delivery::{DeliveryError, DeliveryPipeline};
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::lifecycle::ShutdownSignal;
use crate::net::tls::load_tls_config;
use crate::observability::metrics;
use crate::storage::{DatabaseSource, FsDatabaseSource};

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid bind address '{0}'")]
    InvalidBindAddress(String),

    #[error("TLS setup failed: {0}")]
    Tls(#[source] std::io::Error),

    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<DeliveryPipeline>,
    pub home_page: Arc<str>,
}

impl AppState {
    pub fn new(pipeline: DeliveryPipeline, home_page: impl Into<Arc<str>>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            home_page: home_page.into(),
        }
    }

    /// Wire the built-in collaborators from configuration.
    pub fn from_config(config: &ServerConfig) -> Self {
        let authenticator: Arc<dyn Authenticator> = if config.auth.accounts.is_empty() {
            tracing::warn!("No accounts configured, accepting all credentials");
            Arc::new(AllowAll)
        } else {
            Arc::new(StaticAccounts::new(&config.auth.accounts))
        };
        let source: Arc<dyn DatabaseSource> =
            Arc::new(FsDatabaseSource::new(config.storage.databases_dir.clone()));
        let pipeline = DeliveryPipeline::new(authenticator, source)
            .with_compression_level(config.storage.compression_level);
        Self::new(pipeline, config.home_page.as_str())
    }
}

/// HTTP server for database updates.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a server with the built-in collaborators.
    pub fn new(config: ServerConfig) -> Self {
        let state = AppState::from_config(&config);
        Self::with_state(config, state)
    }

    /// Create a server with caller-supplied collaborators.
    pub fn with_state(config: ServerConfig, state: AppState) -> Self {
        let router = build_router(&config, state);
        Self { router, config }
    }

    /// Run the server on an already bound listener until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.wait().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run with TLS on the configured bind address until `shutdown` fires.
    pub async fn run_tls(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let tls = self
            .config
            .listener
            .tls
            .clone()
            .ok_or_else(|| ServerError::Tls(std::io::Error::other("listener.tls not configured")))?;
        let addr: SocketAddr = self
            .config
            .listener
            .bind_address
            .parse()
            .map_err(|_| ServerError::InvalidBindAddress(self.config.listener.bind_address.clone()))?;

        let rustls = load_tls_config(Path::new(&tls.cert_path), Path::new(&tls.key_path))
            .await
            .map_err(ServerError::Tls)?;

        let handle = axum_server::Handle::new();
        let grace = Duration::from_secs(self.config.timeouts.shutdown_grace_secs);
        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            shutdown.wait().await;
            tracing::info!("Shutdown signal received");
            shutdown_handle.graceful_shutdown(Some(grace));
        });

        tracing::info!(address = %addr, "HTTPS server starting");
        axum_server::bind_rustls(addr, rustls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(config: &ServerConfig, state: AppState) -> Router {
    Router::new()
        .route("/{*path}", any(database_handler))
        .route("/", any(database_handler))
        .with_state(state)
        .layer(GlobalConcurrencyLimitLayer::new(config.listener.max_concurrent_requests))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(set_request_id_layer())
}

/// Single entry point: redirect outside the mount, otherwise validate and deliver.
async fn database_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(&request).to_string();
    let path = request.uri().path().to_string();

    if !is_database_path(&path) {
        tracing::debug!(request_id = %request_id, path = %path, "Redirecting to home page");
        metrics::record_request("redirect", 307, start_time);
        return Redirect::temporary(&state.home_page).into_response();
    }

    let result = match UpdateRequest::parse(request.method(), request.uri(), request.headers()) {
        Ok(update) => {
            tracing::debug!(
                request_id = %request_id,
                edition_id = %update.edition_id,
                account_id = %update.credentials.account_id,
                client_md5 = %update.client_hash,
                "Database requested"
            );
            state.pipeline.deliver(&update).await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(delivery) => {
            let size = delivery.transformed.gzipped.len();
            tracing::info!(
                request_id = %request_id,
                path = %path,
                md5 = %delivery.transformed.md5_hex(),
                bytes = size,
                "Database delivered"
            );
            metrics::record_request("delivered", 200, start_time);
            metrics::record_delivered_bytes(size);
            delivery.into_response()
        }
        Err(e) => {
            log_rejection(&request_id, &path, &e);
            metrics::record_request(e.kind(), e.status().as_u16(), start_time);
            e.into_response()
        }
    }
}

fn log_rejection(request_id: &str, path: &str, err: &DeliveryError) {
    match err {
        DeliveryError::Unclassified(_) => {
            tracing::error!(request_id, path, error = ?err, "Request failed")
        }
        DeliveryError::DatabaseUpToDate => {
            tracing::debug!(request_id, path, "Database up to date")
        }
        _ => tracing::info!(request_id, path, kind = err.kind(), status = %err.status(), "Request rejected"),
    }
}
