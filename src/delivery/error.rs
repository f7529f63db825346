//! Delivery error taxonomy.
//!
//! Every terminal outcome other than a successful delivery is one of these
//! variants. `Display` renders the exact plain-text wire body (`"<code> <message>"`)
//! and [`DeliveryError::status`] is the only place a variant maps to a status code.

use axum::http::StatusCode;
use thiserror::Error;

/// Boxed error carried by [`DeliveryError::Unclassified`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that end a database update request.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Edition segment missing, empty, or not valid percent-encoded UTF-8.
    #[error("404 Invalid Edition ID")]
    InvalidEditionId,

    /// `db_md5` absent, not hex, or not 16 bytes.
    #[error("404 Invalid Hash")]
    InvalidHash,

    /// The authenticator rejected the credentials.
    #[error("401 {}", message_or(.message, "Unauthorized"))]
    Unauthorized { message: Option<String> },

    /// Anything other than GET under the database prefix.
    #[error("405 Method Not Allowed")]
    MethodNotAllowed,

    /// No stream, no timestamp, or an error from the database source.
    #[error("404 Database Not Found")]
    DatabaseNotFound,

    /// The client already holds the current database.
    #[error("304 Database is Up-to-date")]
    DatabaseUpToDate,

    /// A collaborator-chosen status, e.g. 403 for a suspended account.
    #[error("{}", status_line(.status, .message))]
    Status {
        status: StatusCode,
        message: Option<String>,
    },

    /// Any other collaborator or I/O failure. The cause is never rendered.
    #[error("500 Internal Server Error")]
    Unclassified(#[source] BoxError),
}

/// Result type for delivery operations.
pub type DeliveryResult<T> = Result<T, DeliveryError>;

impl DeliveryError {
    /// Unauthorized with the default message.
    pub fn unauthorized() -> Self {
        Self::Unauthorized { message: None }
    }

    /// Wrap an arbitrary collaborator error.
    pub fn unclassified(err: impl Into<BoxError>) -> Self {
        Self::Unclassified(err.into())
    }

    /// HTTP status code for the wire response.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidEditionId => StatusCode::NOT_FOUND,
            Self::InvalidHash => StatusCode::NOT_FOUND,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::DatabaseNotFound => StatusCode::NOT_FOUND,
            Self::DatabaseUpToDate => StatusCode::NOT_MODIFIED,
            Self::Status { status, .. } => *status,
            Self::Unclassified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used for log fields and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidEditionId => "invalid_edition_id",
            Self::InvalidHash => "invalid_hash",
            Self::Unauthorized { .. } => "unauthorized",
            Self::MethodNotAllowed => "method_not_allowed",
            Self::DatabaseNotFound => "database_not_found",
            Self::DatabaseUpToDate => "up_to_date",
            Self::Status { .. } => "status",
            Self::Unclassified(_) => "unclassified",
        }
    }
}

fn message_or<'a>(message: &'a Option<String>, default: &'a str) -> &'a str {
    match message.as_deref() {
        Some(m) if !m.is_empty() => m,
        _ => default,
    }
}

fn status_line(status: &StatusCode, message: &Option<String>) -> String {
    let reason = status.canonical_reason().unwrap_or("");
    format!("{} {}", status.as_u16(), message_or(message, reason))
}
