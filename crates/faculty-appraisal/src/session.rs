//! Per-request session context extracted from the browser's headers.
//!
//! The token is carried explicitly from the request into every backend call;
//! nothing about the session is held in process-wide state.

use std::fmt;

use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::HeaderMap;

use crate::roles::{Role, UnrecognizedRole};

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const ROLE_COOKIE: &str = "role";

/// Cookies cleared on logout when the backend does not name its own list.
pub const DEFAULT_LOGOUT_COOKIES: [&str; 4] = ["access_token", "refresh_token", "user", "role"];

/// Bearer token forwarded to the backend. Debug output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn authorization_value(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub token: BearerToken,
    pub role: Option<Role>,
}

impl SessionContext {
    pub fn new(token: BearerToken, role: Option<Role>) -> Self {
        Self { token, role }
    }

    /// Reads the token from `Authorization: Bearer`, falling back to the
    /// `access_token` cookie, and the role from the `role` cookie.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, SessionError> {
        let token = bearer_from_headers(headers)
            .or_else(|| cookie_value(headers, ACCESS_TOKEN_COOKIE))
            .filter(|token| !token.is_empty())
            .map(BearerToken::new)
            .ok_or(SessionError::MissingToken)?;

        let role = cookie_value(headers, ROLE_COOKIE)
            .filter(|value| !value.is_empty())
            .map(|value| value.parse::<Role>())
            .transpose()?;

        Ok(Self { token, role })
    }

    pub fn require_role(&self) -> Result<Role, SessionError> {
        self.role.ok_or(SessionError::MissingRole)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("no token provided")]
    MissingToken,
    #[error("session carries no role")]
    MissingRole,
    #[error(transparent)]
    UnrecognizedRole(#[from] UnrecognizedRole),
}

fn bearer_from_headers(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") {
        Some(token.trim().to_string())
    } else {
        None
    }
}

/// Finds `name` across every `Cookie` header on the request.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
}

/// `Set-Cookie` value that expires `name` immediately.
pub fn expired_cookie(name: &str) -> String {
    format!("{name}=; path=/; max-age=0; SameSite=Lax")
}

/// RFC 6265 cookie-name token: visible ASCII without separators.
pub fn is_cookie_name(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|byte| {
            byte.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&byte)
        })
}
