//! Wire responses for delivery outcomes.
//!
//! # Responsibilities
//! - Render a `Delivery` as gzip body plus `Last-Modified` and `X-Database-MD5`
//! - Render every `DeliveryError` as a plain-text `"<code> <message>"` body
//!
//! # Design Decisions
//! - 304 responses carry no body
//! - Error bodies never include collaborator diagnostics

use std::time::SystemTime;

use axum::{
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};

use crate::delivery::{Delivery, DeliveryError};

/// Header carrying the MD5 of the uncompressed database.
pub const X_DATABASE_MD5: HeaderName = HeaderName::from_static("x-database-md5");

/// Format a timestamp as an RFC 1123 HTTP date, e.g. `Tue, 14 Nov 2023 22:13:20 GMT`.
pub fn http_date(time: SystemTime) -> String {
    let time: DateTime<Utc> = time.into();
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

impl IntoResponse for Delivery {
    fn into_response(self) -> Response {
        let last_modified = http_date(self.modified);
        let md5 = self.transformed.md5_hex();
        (
            StatusCode::OK,
            [
                (header::CONTENT_ENCODING, HeaderValue::from_static("gzip")),
                (header::CONTENT_TYPE, HeaderValue::from_static("application/octet-stream")),
            ],
            [
                (header::LAST_MODIFIED, last_modified),
                (X_DATABASE_MD5, md5),
            ],
            self.transformed.gzipped,
        )
            .into_response()
    }
}

impl IntoResponse for DeliveryError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::NOT_MODIFIED {
            return status.into_response();
        }
        (
            status,
            [
                (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
                (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
            ],
            self.to_string(),
        )
            .into_response()
    }
}
