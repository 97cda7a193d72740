//! Routes that relay auth, admin and health calls to the backend and expose
//! role routing decisions to the browser.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::backend::{AppraisalBackend, BackendError, RelayEndpoint, RelayRequest, RelayResponse};
use crate::roles::PUBLIC_PATHS;
use crate::session::{
    expired_cookie, is_cookie_name, SessionContext, SessionError, DEFAULT_LOGOUT_COOKIES,
};

pub fn relay_router<B>(backend: Arc<B>) -> Router
where
    B: AppraisalBackend + 'static,
{
    Router::new()
        .route("/api/v1/auth/me", get(me_handler::<B>))
        .route("/api/v1/auth/logout", post(logout_handler::<B>))
        .route(
            "/api/v1/auth/change-password",
            post(change_password_handler::<B>),
        )
        .route(
            "/api/v1/auth/forgot-password",
            post(forgot_password_handler::<B>),
        )
        .route("/api/v1/backend/health", get(backend_health_handler::<B>))
        .route(
            "/api/v1/admin/faculty",
            get(admin_faculties_handler::<B>).delete(admin_delete_user_handler::<B>),
        )
        .route("/api/v1/dashboard", get(dashboard_handler))
        .route("/api/v1/access", get(access_handler::<B>))
        .with_state(backend)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ForgotPasswordRequest {
    #[serde(default)]
    email: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccessQuery {
    path: String,
}

/// Whether the session may open a page, and where to send it otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessDecision {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl AccessDecision {
    pub fn is_public(path: &str) -> bool {
        PUBLIC_PATHS.contains(&path)
    }

    /// Public paths are open. Without a token the browser goes back to login;
    /// a path owned by another role redirects to the caller's own dashboard.
    /// Token validity is checked separately against the backend.
    pub fn evaluate(session: Result<&SessionContext, &SessionError>, path: &str) -> Self {
        if Self::is_public(path) {
            return Self::allow();
        }

        match session {
            Err(_) => Self::redirect("/"),
            Ok(SessionContext { role: None, .. }) => Self::allow(),
            Ok(SessionContext {
                role: Some(role), ..
            }) => {
                if role.permits_path(path) {
                    Self::allow()
                } else {
                    Self::redirect(&role.dashboard_path())
                }
            }
        }
    }

    fn allow() -> Self {
        Self {
            allowed: true,
            redirect: None,
        }
    }

    fn redirect(path: &str) -> Self {
        Self {
            allowed: false,
            redirect: Some(path.to_string()),
        }
    }
}

type Backend<B> = State<Arc<B>>;

pub(crate) async fn me_handler<B>(State(backend): Backend<B>, headers: HeaderMap) -> Response
where
    B: AppraisalBackend + 'static,
{
    let session = match SessionContext::from_headers(&headers) {
        Ok(session) => session,
        Err(err) => return session_error_response(err),
    };
    relay(&*backend, RelayEndpoint::Me, Some(&session), None).await
}

pub(crate) async fn logout_handler<B>(State(backend): Backend<B>, headers: HeaderMap) -> Response
where
    B: AppraisalBackend + 'static,
{
    let session = SessionContext::from_headers(&headers).ok();
    let request = RelayRequest {
        endpoint: RelayEndpoint::Logout,
        token: session.map(|session| session.token),
        body: None,
    };

    // Cookies are cleared even when the backend cannot be reached.
    let outcome = backend.relay(request).await;
    let (status, body) = match &outcome {
        Ok(response) => (status_from(response.status), response.body.clone()),
        Err(err) => {
            error!(error = %err, "logout relay failed");
            (StatusCode::OK, json!({ "message": "logged out" }))
        }
    };

    let mut response = (status, Json(body)).into_response();
    for name in logout_cookie_names(outcome.as_ref().ok()) {
        if let Ok(value) = HeaderValue::from_str(&expired_cookie(&name)) {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }
    info!("session cookies cleared");
    response
}

pub(crate) async fn change_password_handler<B>(
    State(backend): Backend<B>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response
where
    B: AppraisalBackend + 'static,
{
    let session = match SessionContext::from_headers(&headers) {
        Ok(session) => session,
        Err(err) => return session_error_response(err),
    };
    relay(
        &*backend,
        RelayEndpoint::ChangePassword,
        Some(&session),
        Some(body),
    )
    .await
}

pub(crate) async fn forgot_password_handler<B>(
    State(backend): Backend<B>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Response
where
    B: AppraisalBackend + 'static,
{
    let email = request.email.trim();
    if email.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "email is required" })),
        )
            .into_response();
    }

    relay(
        &*backend,
        RelayEndpoint::ForgotPassword,
        None,
        Some(json!({ "email": email })),
    )
    .await
}

pub(crate) async fn backend_health_handler<B>(State(backend): Backend<B>) -> Response
where
    B: AppraisalBackend + 'static,
{
    relay(&*backend, RelayEndpoint::Health, None, None).await
}

pub(crate) async fn admin_faculties_handler<B>(
    State(backend): Backend<B>,
    headers: HeaderMap,
) -> Response
where
    B: AppraisalBackend + 'static,
{
    let session = match SessionContext::from_headers(&headers) {
        Ok(session) => session,
        Err(err) => return session_error_response(err),
    };
    relay(&*backend, RelayEndpoint::AdminFaculties, Some(&session), None).await
}

pub(crate) async fn admin_delete_user_handler<B>(
    State(backend): Backend<B>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response
where
    B: AppraisalBackend + 'static,
{
    let session = match SessionContext::from_headers(&headers) {
        Ok(session) => session,
        Err(err) => return session_error_response(err),
    };
    info!("relaying user deletion");
    relay(
        &*backend,
        RelayEndpoint::AdminDeleteUser,
        Some(&session),
        Some(body),
    )
    .await
}

pub(crate) async fn dashboard_handler(headers: HeaderMap) -> Response {
    let role = match SessionContext::from_headers(&headers).and_then(|s| s.require_role()) {
        Ok(role) => role,
        Err(err) => return session_error_response(err),
    };
    (StatusCode::OK, Json(role.shell())).into_response()
}

pub(crate) async fn access_handler<B>(
    State(backend): Backend<B>,
    headers: HeaderMap,
    Query(query): Query<AccessQuery>,
) -> Response
where
    B: AppraisalBackend + 'static,
{
    let session = SessionContext::from_headers(&headers);
    let token_rejected = match &session {
        Ok(context) if !AccessDecision::is_public(&query.path) => {
            !token_accepted(&*backend, context).await
        }
        _ => false,
    };

    let decision = if token_rejected {
        AccessDecision::redirect("/")
    } else {
        AccessDecision::evaluate(session.as_ref(), &query.path)
    };
    (StatusCode::OK, Json(decision)).into_response()
}

/// Asks the backend whether the token is still valid. An unreachable
/// backend counts as a rejection.
async fn token_accepted<B>(backend: &B, session: &SessionContext) -> bool
where
    B: AppraisalBackend + ?Sized,
{
    let request = RelayRequest {
        endpoint: RelayEndpoint::Me,
        token: Some(session.token.clone()),
        body: None,
    };
    match backend.relay(request).await {
        Ok(response) => response.is_success(),
        Err(err) => {
            warn!(error = %err, "token check failed; treating session as expired");
            false
        }
    }
}

async fn relay<B>(
    backend: &B,
    endpoint: RelayEndpoint,
    session: Option<&SessionContext>,
    body: Option<Value>,
) -> Response
where
    B: AppraisalBackend + ?Sized,
{
    let request = RelayRequest {
        endpoint,
        token: session.map(|session| session.token.clone()),
        body,
    };

    match backend.relay(request).await {
        Ok(response) => (status_from(response.status), Json(response.body)).into_response(),
        Err(err) => backend_error_response(endpoint, err),
    }
}

fn logout_cookie_names(response: Option<&RelayResponse>) -> Vec<String> {
    let named = response
        .filter(|response| response.is_success())
        .and_then(|response| response.body.get("cookies"))
        .and_then(Value::as_array)
        .map(|cookies| {
            cookies
                .iter()
                .filter_map(Value::as_str)
                .filter(|name| is_cookie_name(name))
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .filter(|names| !names.is_empty());

    named.unwrap_or_else(|| {
        DEFAULT_LOGOUT_COOKIES
            .iter()
            .map(|name| name.to_string())
            .collect()
    })
}

fn status_from(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_GATEWAY)
}

fn session_error_response(err: SessionError) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": err.to_string() })),
    )
        .into_response()
}

fn backend_error_response(endpoint: RelayEndpoint, err: BackendError) -> Response {
    error!(?endpoint, error = %err, "relay to backend failed");
    let status = match err {
        BackendError::InvalidUrl(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_GATEWAY,
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::Role;
    use crate::session::BearerToken;

    fn session(role: Option<Role>) -> SessionContext {
        SessionContext::new(BearerToken::new("t"), role)
    }

    #[test]
    fn public_paths_are_open_without_a_session() {
        let missing = SessionError::MissingToken;
        assert!(AccessDecision::evaluate(Err(&missing), "/").allowed);
        assert!(AccessDecision::evaluate(Err(&missing), "/forgot-password").allowed);
    }

    #[test]
    fn missing_session_redirects_to_login() {
        let missing = SessionError::MissingToken;
        let decision = AccessDecision::evaluate(Err(&missing), "/faculty/dashboard");
        assert!(!decision.allowed);
        assert_eq!(decision.redirect.as_deref(), Some("/"));
    }

    #[test]
    fn foreign_role_paths_redirect_to_own_dashboard() {
        let hod = session(Some(Role::Hod));
        let decision = AccessDecision::evaluate(Ok(&hod), "/director/director-verify");
        assert!(!decision.allowed);
        assert_eq!(decision.redirect.as_deref(), Some("/hod/dashboard"));

        assert!(AccessDecision::evaluate(Ok(&hod), "/hod/faculty-forms").allowed);
    }

    #[test]
    fn logout_uses_backend_cookie_list_when_present() {
        let response = RelayResponse {
            status: 200,
            body: json!({ "cookies": ["session", "csrf"] }),
        };
        assert_eq!(logout_cookie_names(Some(&response)), vec!["session", "csrf"]);
        assert_eq!(logout_cookie_names(None).len(), DEFAULT_LOGOUT_COOKIES.len());
    }

    #[test]
    fn logout_drops_cookie_names_that_carry_attributes() {
        let response = RelayResponse {
            status: 200,
            body: json!({ "cookies": ["session", "x; Domain=evil.example", "a=b"] }),
        };
        assert_eq!(logout_cookie_names(Some(&response)), vec!["session"]);

        let only_bad = RelayResponse {
            status: 200,
            body: json!({ "cookies": ["x; Max-Age=99999"] }),
        };
        assert_eq!(
            logout_cookie_names(Some(&only_bad)),
            DEFAULT_LOGOUT_COOKIES
                .iter()
                .map(|name| name.to_string())
                .collect::<Vec<_>>()
        );
    }
}
