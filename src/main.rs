//! GeoIP database update server.
//!
//! # Architecture Overview
//!
//! ```text
//!   geoipupdate client
//!        │  GET /geoip/databases/{edition}/update?db_md5=<hex>  (Basic auth)
//!        ▼
//!   ┌──────────┐   ┌───────────────┐   ┌───────────────┐   ┌──────────────┐
//!   │   http   │──▶│   delivery    │──▶│     auth      │──▶│   storage    │
//!   │  server  │   │ request parse │   │ Authenticator │   │ DatabaseSrc  │
//!   └──────────┘   └───────────────┘   └───────────────┘   └──────┬───────┘
//!        ▲                                                        │ bytes + mtime
//!        │         ┌────────────────────────────┐                 │
//!        └─────────│ transform: gzip + md5, 304 │◀────────────────┘
//!                  └────────────────────────────┘
//!
//!   Anything outside /geoip/databases/ → 307 to the home page.
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use geoipupdate_server::config::{load_config, validate_config, ConfigError, ServerConfig};
use geoipupdate_server::http::{HttpServer, ServerError};
use geoipupdate_server::lifecycle::{wait_for_signal, Shutdown, ShutdownSignal};
use geoipupdate_server::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "geoipupdate-server")]
#[command(about = "Serves MMDB databases to geoipupdate clients", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override storage.databases_dir.
    #[arg(short, long)]
    databases_dir: Option<PathBuf>,

    /// Override home_page.
    #[arg(long)]
    home_page: Option<String>,

    /// Override observability.log_level.
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn load(&self) -> Result<ServerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ServerConfig::default(),
        };

        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        }
        if let Some(dir) = &self.databases_dir {
            config.storage.databases_dir = dir.clone();
        }
        if let Some(home_page) = &self.home_page {
            config.home_page = home_page.clone();
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.load()?;

    logging::init_logging(&config.observability);

    tracing::info!("geoipupdate-server v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        databases_dir = %config.storage.databases_dir.display(),
        home_page = %config.home_page,
        accounts = config.auth.accounts.len(),
        tls = config.listener.tls.is_some(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(config);
    let mut server_task = tokio::spawn(serve(server, server_shutdown));

    tokio::select! {
        _ = wait_for_signal() => shutdown.trigger(),
        result = &mut server_task => {
            result??;
            return Ok(());
        }
    }

    server_task.await??;
    tracing::info!("Shutdown complete");
    Ok(())
}

/// Serve plain HTTP on the configured address, or HTTPS when TLS is set.
async fn serve(server: HttpServer, shutdown: ShutdownSignal) -> Result<(), ServerError> {
    if server.config().listener.tls.is_some() {
        return server.run_tls(shutdown).await;
    }

    let listener = TcpListener::bind(&server.config().listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");
    server.run(listener, shutdown).await
}
