//! GeoIP database update server library.

pub mod auth;
pub mod config;
pub mod delivery;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod storage;

pub use config::ServerConfig;
pub use delivery::{DeliveryError, DeliveryPipeline};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
