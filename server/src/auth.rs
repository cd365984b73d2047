// Shared-secret request authentication
use actix_web::{HttpRequest, Error, error::ErrorUnauthorized};
use log::{debug, warn};

use crate::config::AuthConfig;

/// Header carrying the key directly
pub const API_KEY_HEADER: &str = "X-API-Key";

const BEARER_PREFIX: &str = "bearer ";

/// Extract the bearer token from an Authorization header value
pub fn parse_bearer_token(auth_header: &str) -> Option<&str> {
    let prefix = auth_header.get(..BEARER_PREFIX.len())?;
    if !prefix.eq_ignore_ascii_case(BEARER_PREFIX) {
        return None;
    }
    Some(auth_header[BEARER_PREFIX.len()..].trim())
}

/// Pick the credential presented by the caller.
///
/// A `Bearer` Authorization header wins; otherwise the `X-API-Key` header is used.
pub fn extract_credential(req: &HttpRequest) -> Option<String> {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
    };

    if let Some(token) = header("Authorization").and_then(parse_bearer_token) {
        return Some(token.to_string());
    }

    header(API_KEY_HEADER).map(str::to_string)
}

/// Authenticate a request against the configured secret
pub fn authenticate_request(req: &HttpRequest, auth: &AuthConfig) -> Result<(), Error> {
    if auth.api_key.is_empty() {
        warn!("Rejecting {} {}: no API key configured", req.method(), req.path());
        return Err(ErrorUnauthorized("Unauthorized"));
    }

    match extract_credential(req) {
        Some(credential) if credential == auth.api_key => {
            debug!("Authenticated {} {}", req.method(), req.path());
            Ok(())
        }
        Some(_) => {
            warn!("Rejecting {} {}: invalid credential", req.method(), req.path());
            Err(ErrorUnauthorized("Unauthorized"))
        }
        None => {
            warn!("Rejecting {} {}: missing credential", req.method(), req.path());
            Err(ErrorUnauthorized("Unauthorized"))
        }
    }
}
