//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → request.rs (add/propagate request ID)
//!     → server.rs (Axum setup, redirect or dispatch)
//!     → delivery pipeline
//!     → response.rs (gzip body + headers, or "<code> <message>")
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::X_DATABASE_MD5;
pub use server::{build_router, AppState, HttpServer, ServerError};
