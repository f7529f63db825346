//! Database delivery subsystem.
//!
//! # Data Flow
//! ```text
//! GET /geoip/databases/{edition}/...?db_md5=<hex>   (Basic auth)
//!     → request.rs   (method, hash, edition id, credentials)
//!     → pipeline.rs  (authenticator → database source)
//!     → transform.rs (one read pass: gzip + md5)
//!     → Delivery | DatabaseUpToDate | error.rs
//! ```
//!
//! # Design Decisions
//! - Validation errors short-circuit before any collaborator call
//! - Authentication short-circuits before fetch
//! - Nothing is cached across requests; each request is independent

pub mod error;
pub mod pipeline;
pub mod request;
pub mod transform;

pub use error::{DeliveryError, DeliveryResult};
pub use pipeline::{Delivery, DeliveryPipeline};
pub use request::{ClientHash, Credentials, UpdateRequest};
