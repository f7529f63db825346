//! Shared utilities for integration tests.

use std::io::Read;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use flate2::read::GzDecoder;
use geoipupdate_server::config::{AccountConfig, ServerConfig};
use geoipupdate_server::http::HttpServer;
use geoipupdate_server::lifecycle::Shutdown;
use tokio::net::TcpListener;

pub const EMPTY_MD5: &str = "d41d8cd98f00b204e9800998ecf8427e";
pub const HOME_PAGE: &str = "https://home.example/";
pub const ACCOUNT_ID: &str = "42";
pub const LICENSE_KEY: &str = "0123456789ab";

/// A running server bound to an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Config pointing at `databases_dir` with one account.
pub fn test_config(databases_dir: &Path) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.home_page = HOME_PAGE.to_string();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.storage.databases_dir = databases_dir.to_path_buf();
    config.auth.accounts.push(AccountConfig {
        account_id: ACCOUNT_ID.into(),
        license_key: LICENSE_KEY.into(),
    });
    config
}

/// Start a server with the built-in filesystem source.
pub async fn start_server(config: ServerConfig) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(config);
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    TestServer { addr, shutdown }
}

/// Client that neither follows redirects nor decompresses.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}

pub fn gunzip(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    GzDecoder::new(data).read_to_end(&mut out).unwrap();
    out
}

#[allow(dead_code)]
pub fn md5_hex(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}
