//! Update request parsing and validation.
//!
//! # Responsibilities
//! - Decide whether a path belongs to the database mount
//! - Reject non-GET methods before anything else is read
//! - Decode the client hash (`db_md5`) and the edition id
//! - Extract HTTP basic-auth credentials (absent means empty)
//!
//! # Design Decisions
//! - Hash errors take precedence over edition-id errors
//! - Hex decoding errors are not reported separately; they collapse into
//!   `InvalidHash` through the length check
//! - Credentials are never judged here, only passed on

use std::fmt;

use axum::http::{header, HeaderMap, Method, Uri};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use percent_encoding::percent_decode_str;

use crate::delivery::error::{DeliveryError, DeliveryResult};

/// Mount prefix for database downloads.
pub const DATABASE_PATH_PREFIX: &str = "/geoip/databases/";

/// Query parameter carrying the client's hex-encoded MD5.
pub const HASH_QUERY_PARAM: &str = "db_md5";

/// Length of an MD5 digest in bytes.
pub const HASH_LEN: usize = 16;

/// Returns true if the path is served by the delivery pipeline.
pub fn is_database_path(path: &str) -> bool {
    path.starts_with(DATABASE_PATH_PREFIX)
}

/// MD5 of the database the client already has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientHash([u8; HASH_LEN]);

impl ClientHash {
    /// Wrap raw digest bytes.
    pub fn new(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Decode a hex string. Anything that is not exactly 16 bytes of hex is `None`.
    pub fn from_hex(value: &str) -> Option<Self> {
        let bytes = hex::decode(value).unwrap_or_default();
        let bytes: [u8; HASH_LEN] = bytes.try_into().ok()?;
        Some(Self(bytes))
    }

    /// Read `db_md5` from a raw query string (first occurrence wins).
    pub fn from_query(query: Option<&str>) -> Option<Self> {
        let query = query?;
        let value = url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == HASH_QUERY_PARAM)
            .map(|(_, value)| value)?;
        Self::from_hex(&value)
    }

    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Lowercase hex, as sent in `X-Database-MD5`.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ClientHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Basic-auth credentials as presented by the client.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub account_id: String,
    pub license_key: String,
}

impl Credentials {
    pub fn new(account_id: impl Into<String>, license_key: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            license_key: license_key.into(),
        }
    }

    /// Parse an `Authorization: Basic ...` header. Missing or malformed
    /// headers yield empty credentials; the authenticator decides.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_basic_auth)
            .unwrap_or_default()
    }
}

// License keys stay out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("account_id", &self.account_id)
            .field("license_key", &"<redacted>")
            .finish()
    }
}

fn parse_basic_auth(value: &str) -> Option<Credentials> {
    const SCHEME: &str = "basic ";
    let scheme = value.get(..SCHEME.len())?;
    if !scheme.eq_ignore_ascii_case(SCHEME) {
        return None;
    }
    let decoded = STANDARD.decode(value[SCHEME.len()..].trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (account_id, license_key) = decoded.split_once(':')?;
    Some(Credentials::new(account_id, license_key))
}

/// Extract the edition id: the segment right after the prefix, percent-decoded.
pub fn edition_id_from_path(path: &str) -> Option<String> {
    let rest = path.strip_prefix(DATABASE_PATH_PREFIX)?;
    let segment = rest.split('/').next().unwrap_or_default();
    if has_malformed_escape(segment) {
        return None;
    }
    let edition_id = percent_decode_str(segment).decode_utf8().ok()?;
    if edition_id.is_empty() {
        return None;
    }
    Some(edition_id.into_owned())
}

/// True when some `%` is not followed by two hex digits.
///
/// `percent_decode_str` passes such sequences through verbatim, so they are
/// caught here before decoding.
fn has_malformed_escape(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.iter().enumerate().any(|(i, &b)| {
        b == b'%'
            && !matches!(
                bytes.get(i + 1..i + 3),
                Some([hi, lo]) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit()
            )
    })
}

/// A fully validated database update request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    pub edition_id: String,
    pub client_hash: ClientHash,
    pub credentials: Credentials,
}

impl UpdateRequest {
    /// Validate method, hash and edition id, in that order.
    ///
    /// The caller must already have checked [`is_database_path`].
    pub fn parse(method: &Method, uri: &Uri, headers: &HeaderMap) -> DeliveryResult<Self> {
        if *method != Method::GET {
            return Err(DeliveryError::MethodNotAllowed);
        }

        let client_hash = ClientHash::from_query(uri.query());
        let edition_id = edition_id_from_path(uri.path());
        let credentials = Credentials::from_headers(headers);

        let client_hash = client_hash.ok_or(DeliveryError::InvalidHash)?;
        let edition_id = edition_id.ok_or(DeliveryError::InvalidEditionId)?;

        Ok(Self {
            edition_id,
            client_hash,
            credentials,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const EMPTY_MD5: &str = "d41d8cd98f00b204e9800998ecf8427e";

    fn basic(user_pass: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let value = format!("Basic {}", STANDARD.encode(user_pass));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(&value).unwrap());
        headers
    }

    fn parse(method: Method, uri: &str, headers: &HeaderMap) -> DeliveryResult<UpdateRequest> {
        UpdateRequest::parse(&method, &uri.parse().unwrap(), headers)
    }

    #[test]
    fn test_prefix_match() {
        assert!(is_database_path("/geoip/databases/GeoLite2-City/update"));
        assert!(is_database_path("/geoip/databases/"));
        assert!(!is_database_path("/geoip/databases"));
        assert!(!is_database_path("/other/path"));
        assert!(!is_database_path("/"));
    }

    #[test]
    fn test_client_hash_from_hex() {
        let hash = ClientHash::from_hex(EMPTY_MD5).unwrap();
        assert_eq!(hash.to_hex(), EMPTY_MD5);

        let upper = ClientHash::from_hex(&EMPTY_MD5.to_uppercase()).unwrap();
        assert_eq!(upper, hash);

        assert!(ClientHash::from_hex("").is_none());
        assert!(ClientHash::from_hex("abc").is_none());
        assert!(ClientHash::from_hex("zz1d8cd98f00b204e9800998ecf8427e").is_none());
        assert!(ClientHash::from_hex("d41d8cd98f00b204e9800998ecf8427e00").is_none());
    }

    #[test]
    fn test_client_hash_from_query() {
        let query = format!("foo=bar&db_md5={}&db_md5=00", EMPTY_MD5);
        let hash = ClientHash::from_query(Some(&query)).unwrap();
        assert_eq!(hash.to_hex(), EMPTY_MD5);

        assert!(ClientHash::from_query(None).is_none());
        assert!(ClientHash::from_query(Some("md5=abc")).is_none());
    }

    #[test]
    fn test_edition_id_extraction() {
        assert_eq!(
            edition_id_from_path("/geoip/databases/GeoLite2-City/update.tar.gz").as_deref(),
            Some("GeoLite2-City")
        );
        assert_eq!(
            edition_id_from_path("/geoip/databases/GeoIP2%20ISP/update").as_deref(),
            Some("GeoIP2 ISP")
        );
        assert_eq!(
            edition_id_from_path("/geoip/databases/GeoLite2-ASN").as_deref(),
            Some("GeoLite2-ASN")
        );
        assert!(edition_id_from_path("/geoip/databases/").is_none());
        assert!(edition_id_from_path("/geoip/databases//update").is_none());
        assert!(edition_id_from_path("/geoip/databases/%FF%FE/update").is_none());
        assert!(edition_id_from_path("/geoip/databases/%zz/update").is_none());
        assert!(edition_id_from_path("/geoip/databases/%4/update").is_none());
        assert!(edition_id_from_path("/geoip/databases/City%4").is_none());
        assert!(edition_id_from_path("/geoip/databases/City%/update").is_none());
        assert_eq!(
            edition_id_from_path("/geoip/databases/Geo%2d%2DLite/update").as_deref(),
            Some("Geo--Lite")
        );
        assert!(edition_id_from_path("/elsewhere/GeoLite2-City/").is_none());
    }

    #[test]
    fn test_basic_auth() {
        let creds = Credentials::from_headers(&basic("42:secret:with:colons"));
        assert_eq!(creds, Credentials::new("42", "secret:with:colons"));

        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("bAsIc {}", STANDARD.encode("7:key"))).unwrap(),
        );
        assert_eq!(Credentials::from_headers(&headers), Credentials::new("7", "key"));

        assert_eq!(Credentials::from_headers(&HeaderMap::new()), Credentials::default());

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(Credentials::from_headers(&headers), Credentials::default());

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic !!!"));
        assert_eq!(Credentials::from_headers(&headers), Credentials::default());
    }

    #[test]
    fn test_credentials_debug_redacts_key() {
        let creds = Credentials::new("42", "super-secret");
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("42"));
        assert!(!rendered.contains("super-secret"));
    }

    #[test]
    fn test_parse_valid_request() {
        let uri = format!("/geoip/databases/GeoLite2-City/update?db_md5={}", EMPTY_MD5);
        let req = parse(Method::GET, &uri, &basic("42:key")).unwrap();
        assert_eq!(req.edition_id, "GeoLite2-City");
        assert_eq!(req.client_hash.to_hex(), EMPTY_MD5);
        assert_eq!(req.credentials, Credentials::new("42", "key"));
    }

    #[test]
    fn test_parse_rejects_non_get() {
        let uri = format!("/geoip/databases/GeoLite2-City/update?db_md5={}", EMPTY_MD5);
        for method in [Method::POST, Method::PUT, Method::DELETE, Method::HEAD] {
            let err = parse(method, &uri, &HeaderMap::new()).unwrap_err();
            assert!(matches!(err, DeliveryError::MethodNotAllowed));
        }
        // Method is checked before anything else.
        let err = parse(Method::POST, "/geoip/databases/", &HeaderMap::new()).unwrap_err();
        assert!(matches!(err, DeliveryError::MethodNotAllowed));
    }

    #[test]
    fn test_hash_error_precedes_edition_error() {
        let err = parse(Method::GET, "/geoip/databases/?db_md5=nothex", &HeaderMap::new()).unwrap_err();
        assert!(matches!(err, DeliveryError::InvalidHash));

        let err = parse(Method::GET, "/geoip/databases/GeoLite2-City/update", &HeaderMap::new())
            .unwrap_err();
        assert!(matches!(err, DeliveryError::InvalidHash));

        let uri = format!("/geoip/databases/?db_md5={}", EMPTY_MD5);
        let err = parse(Method::GET, &uri, &HeaderMap::new()).unwrap_err();
        assert!(matches!(err, DeliveryError::InvalidEditionId));
    }

    #[test]
    fn test_parse_rejects_malformed_escapes() {
        for edition in ["%zz", "City%4", "City%", "%g0City"] {
            let uri = format!("/geoip/databases/{}/update?db_md5={}", edition, EMPTY_MD5);
            let err = parse(Method::GET, &uri, &basic("42:key")).unwrap_err();
            assert!(matches!(err, DeliveryError::InvalidEditionId), "{}", edition);
        }
    }

    #[test]
    fn test_missing_credentials_pass_through_empty() {
        let uri = format!("/geoip/databases/GeoLite2-City/update?db_md5={}", EMPTY_MD5);
        let req = parse(Method::GET, &uri, &HeaderMap::new()).unwrap();
        assert_eq!(req.credentials, Credentials::default());
    }
}
