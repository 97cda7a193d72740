//! Boundary to the appraisal backend that owns persistence and authority.

mod http;

pub use http::HttpBackend;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::session::{BearerToken, SessionContext};
use crate::workflows::appraisal::domain::{FormStatus, PartLetter, RecordKey};

/// Backend operations the portal depends on. Implementations forward the
/// session's token with every call.
#[async_trait]
pub trait AppraisalBackend: Send + Sync {
    /// Stored payload for one part, `None` when nothing was saved yet.
    async fn fetch_part(
        &self,
        session: &SessionContext,
        key: &RecordKey,
        part: PartLetter,
    ) -> Result<Option<Value>, BackendError>;

    async fn save_part(
        &self,
        session: &SessionContext,
        key: &RecordKey,
        part: PartLetter,
        body: Value,
    ) -> Result<(), BackendError>;

    async fn fetch_status(
        &self,
        session: &SessionContext,
        key: &RecordKey,
    ) -> Result<FormStatus, BackendError>;

    async fn save_interaction_marks(
        &self,
        session: &SessionContext,
        key: &RecordKey,
        body: Value,
    ) -> Result<(), BackendError>;

    async fn mark_director_given(
        &self,
        session: &SessionContext,
        key: &RecordKey,
    ) -> Result<(), BackendError>;

    /// Pass-through call whose status and body go back to the browser as-is.
    async fn relay(&self, request: RelayRequest) -> Result<RelayResponse, BackendError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayMethod {
    Get,
    Post,
    Delete,
}

/// Auth, admin and health calls relayed verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayEndpoint {
    Me,
    Logout,
    ChangePassword,
    ForgotPassword,
    Health,
    AdminFaculties,
    AdminDeleteUser,
}

impl RelayEndpoint {
    pub const fn path(self) -> &'static [&'static str] {
        match self {
            Self::Me => &["auth", "me"],
            Self::Logout => &["auth", "logout"],
            Self::ChangePassword => &["auth", "change-password"],
            Self::ForgotPassword => &["auth", "forgot-password"],
            Self::Health => &["health"],
            Self::AdminFaculties => &["admin", "faculties"],
            Self::AdminDeleteUser => &["admin", "delete-user"],
        }
    }

    pub const fn method(self) -> RelayMethod {
        match self {
            Self::Me | Self::Health | Self::AdminFaculties => RelayMethod::Get,
            Self::Logout | Self::ChangePassword | Self::ForgotPassword => RelayMethod::Post,
            Self::AdminDeleteUser => RelayMethod::Delete,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelayRequest {
    pub endpoint: RelayEndpoint,
    pub token: Option<BearerToken>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelayResponse {
    pub status: u16,
    pub body: Value,
}

impl RelayResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("backend responded {status}: {message}")]
    Status { status: u16, message: String },
    #[error("unexpected backend payload: {0}")]
    Decode(String),
    #[error("invalid backend url: {0}")]
    InvalidUrl(String),
}
