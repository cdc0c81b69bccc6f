//! Session resolution middleware and extractor
//!
//! Resolves the client's session from the cookie (creating one on first
//! contact), applies the optional operator basic-auth bypass, and stores a
//! [`SessionContext`] in request extensions. New sessions get a Set-Cookie
//! on the way out.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::Engine;
use zapimg_core::models::Session;

use crate::error::ErrorResponse;
use crate::session::SessionStore;
use crate::state::AppState;

/// Handle on the current request's session. Passed explicitly into
/// handlers; there is no ambient session lookup.
#[derive(Clone)]
pub struct SessionContext {
    pub token: String,
    store: Arc<SessionStore>,
}

impl SessionContext {
    pub fn new(token: String, store: Arc<SessionStore>) -> Self {
        Self { token, store }
    }

    /// Clone of the current session state.
    pub fn snapshot(&self) -> Session {
        self.store.snapshot(&self.token)
    }

    /// Apply a mutation to the stored session.
    pub fn update<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        self.store.update(&self.token, f)
    }
}

// Extracted from request parts (not Extension) so it composes with
// body-consuming extractors like Multipart.
impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionContext>()
            .cloned()
            .ok_or_else(|| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        message: "Missing session context".to_string(),
                        code: "INTERNAL_ERROR".to_string(),
                    }),
                )
            })
    }
}

/// Resolve or create the session for this request.
pub async fn session_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let cookie_name = &state.config.session_cookie_name;

    let presented = extract_cookie(request.headers(), cookie_name);
    let (token, is_new) = match presented {
        Some(token) if state.sessions.contains(&token) => (token, false),
        _ => (state.sessions.create(), true),
    };

    // Operator bypass: matching basic-auth credentials authenticate the
    // session up front (used for trusted tooling, not end users).
    if operator_credentials_match(request.headers(), &state) {
        state.sessions.update(&token, |s| s.is_authenticated = true);
    }

    request
        .extensions_mut()
        .insert(SessionContext::new(token.clone(), state.sessions.clone()));

    let mut response = next.run(request).await;

    if is_new {
        let max_age = state.config.session_retention_days * 24 * 60 * 60;
        let attributes = if state.config.is_production() {
            "; Secure; SameSite=None"
        } else {
            "; SameSite=Lax"
        };
        let cookie = format!(
            "{}={}; Path=/; HttpOnly; Max-Age={}{}",
            cookie_name, token, max_age, attributes
        );
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to build session cookie header");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        message: "Internal server error".to_string(),
                        code: "INTERNAL_ERROR".to_string(),
                    }),
                )
                    .into_response();
            }
        }
    }

    response
}

/// Find a cookie value by name in the Cookie header(s).
fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            if key.trim() == name {
                Some(value.trim().to_string())
            } else {
                None
            }
        })
        .next()
}

/// Check an `Authorization: Basic` header against the configured operator
/// credentials. Inactive unless both are configured.
fn operator_credentials_match(headers: &HeaderMap, state: &AppState) -> bool {
    let (Some(expected_user), Some(expected_pass)) = (
        state.config.operator_username.as_deref(),
        state.config.operator_password.as_deref(),
    ) else {
        return false;
    };

    let Some(credentials) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Basic "))
    else {
        return false;
    };

    let Ok(decoded) = base64::engine::general_purpose::STANDARD.decode(credentials.trim()) else {
        return false;
    };
    let Ok(decoded) = String::from_utf8(decoded) else {
        return false;
    };

    match decoded.split_once(':') {
        Some((user, pass)) => user == expected_user && pass == expected_pass,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_cookie_single() {
        let headers = headers_with_cookie("zapimg_sid=abc123");
        assert_eq!(
            extract_cookie(&headers, "zapimg_sid"),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn test_extract_cookie_among_many() {
        let headers = headers_with_cookie("theme=dark; zapimg_sid=tok ; other=1");
        assert_eq!(
            extract_cookie(&headers, "zapimg_sid"),
            Some("tok".to_string())
        );
    }

    #[test]
    fn test_extract_cookie_missing() {
        let headers = headers_with_cookie("theme=dark");
        assert_eq!(extract_cookie(&headers, "zapimg_sid"), None);
        assert_eq!(extract_cookie(&HeaderMap::new(), "zapimg_sid"), None);
    }

    #[test]
    fn test_extract_cookie_name_is_exact() {
        let headers = headers_with_cookie("xzapimg_sid=nope");
        assert_eq!(extract_cookie(&headers, "zapimg_sid"), None);
    }
}
