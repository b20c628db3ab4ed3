//! Authentication extractor for admin.
//!
//! The admin surface is operator-facing: every `/api` request must carry
//! `Authorization: Bearer <token>` matching `KIRANA_ADMIN_TOKEN`.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use secrecy::ExposeSecret;

use crate::state::AppState;

/// Extractor that requires the admin bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     _auth: RequireAdminToken,
/// ) -> impl IntoResponse {
///     "only with a valid token"
/// }
/// ```
pub struct RequireAdminToken;

/// Rejection for a missing or invalid token. Deliberately does not say which.
pub struct AdminAuthRejection;

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, "unauthorized").into_response()
    }
}

impl FromRequestParts<AppState> for RequireAdminToken {
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_bearer)
            .ok_or(AdminAuthRejection)?;

        if token_matches(token, state.config().admin_token.expose_secret()) {
            Ok(Self)
        } else {
            Err(AdminAuthRejection)
        }
    }
}

/// Extract the token from a `Bearer` authorization header value.
fn parse_bearer(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Compare without short-circuiting on the first mismatched byte.
fn token_matches(candidate: &str, expected: &str) -> bool {
    if candidate.len() != expected.len() {
        return false;
    }
    candidate
        .bytes()
        .zip(expected.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bearer_accepts_valid_header() {
        assert_eq!(parse_bearer("Bearer abc123"), Some("abc123"));
        assert_eq!(parse_bearer("bearer abc123"), Some("abc123"));
        assert_eq!(parse_bearer("Bearer  abc123 "), Some("abc123"));
    }

    #[test]
    fn test_parse_bearer_rejects_other_schemes() {
        assert_eq!(parse_bearer("Basic abc123"), None);
        assert_eq!(parse_bearer("Bearer"), None);
        assert_eq!(parse_bearer("Bearer "), None);
        assert_eq!(parse_bearer(""), None);
    }

    #[test]
    fn test_token_matches() {
        assert!(token_matches("tok-1", "tok-1"));
        assert!(!token_matches("tok-1", "tok-2"));
        assert!(!token_matches("tok", "tok-1"));
        assert!(!token_matches("", "tok-1"));
    }
}
