use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use serde_json::{json, Value};

use crate::backend::{AppraisalBackend, BackendError, RelayRequest, RelayResponse};
use crate::roles::Role;
use crate::session::{BearerToken, SessionContext};
use crate::workflows::appraisal::domain::{FormStatus, PartLetter, RecordKey};
use crate::workflows::appraisal::scoring::AcademicScores;
use crate::workflows::appraisal::{appraisal_router, AppraisalService};

pub(super) const TOKEN: &str = "token-abc";

pub(super) fn record_key() -> RecordKey {
    RecordKey::new("CSE", "fac-101")
}

pub(super) fn session(role: Role) -> SessionContext {
    SessionContext::new(BearerToken::new(TOKEN), Some(role))
}

/// Sub-scores summing to 390.
pub(super) fn full_scores() -> AcademicScores {
    AcademicScores {
        result_analysis: 50.0,
        course_outcome: 50.0,
        e_learning: 50.0,
        academic_engagement: 50.0,
        teaching_load: 50.0,
        projects_guided: 40.0,
        student_feedback: 50.0,
        ptg_meetings: 50.0,
    }
}

pub(super) fn stored_portfolio() -> Value {
    json!({
        "D": {
            "portfolioType": "both",
            "selfAwardedMarks": 40,
            "deanMarks": 50,
            "hodMarks": 30,
            "isMarkHOD": true,
            "isMarkDean": true,
            "instituteLevelPortfolio": "NAAC coordinator",
            "departmentLevelPortfolio": "Timetable in-charge",
            "marks": 80
        },
        "isFirstTime": false
    })
}

#[derive(Debug, Clone, PartialEq)]
pub(super) enum RecordedWrite {
    Part {
        key: RecordKey,
        part: PartLetter,
        body: Value,
    },
    Interaction {
        key: RecordKey,
        body: Value,
    },
    DirectorFlag {
        key: RecordKey,
    },
}

/// Backend double keeping parts and statuses in memory and recording every write.
#[derive(Default, Clone)]
pub(super) struct MemoryBackend {
    parts: Arc<Mutex<HashMap<(RecordKey, PartLetter), Value>>>,
    statuses: Arc<Mutex<HashMap<RecordKey, FormStatus>>>,
    writes: Arc<Mutex<Vec<RecordedWrite>>>,
    relays: Arc<Mutex<Vec<RelayRequest>>>,
    relay_response: Arc<Mutex<Option<RelayResponse>>>,
    tokens: Arc<Mutex<Vec<String>>>,
}

impl MemoryBackend {
    pub(super) fn with_status(self, key: &RecordKey, status: FormStatus) -> Self {
        self.statuses
            .lock()
            .expect("status mutex poisoned")
            .insert(key.clone(), status);
        self
    }

    pub(super) fn with_part(self, key: &RecordKey, part: PartLetter, value: Value) -> Self {
        self.parts
            .lock()
            .expect("parts mutex poisoned")
            .insert((key.clone(), part), value);
        self
    }

    pub(super) fn with_relay_response(self, status: u16, body: Value) -> Self {
        *self.relay_response.lock().expect("relay mutex poisoned") =
            Some(RelayResponse { status, body });
        self
    }

    pub(super) fn writes(&self) -> Vec<RecordedWrite> {
        self.writes.lock().expect("writes mutex poisoned").clone()
    }

    pub(super) fn part_writes(&self, part: PartLetter) -> Vec<Value> {
        self.writes()
            .into_iter()
            .filter_map(|write| match write {
                RecordedWrite::Part { part: written, body, .. } if written == part => Some(body),
                _ => None,
            })
            .collect()
    }

    pub(super) fn relays(&self) -> Vec<RelayRequest> {
        self.relays.lock().expect("relay mutex poisoned").clone()
    }

    pub(super) fn tokens(&self) -> Vec<String> {
        self.tokens.lock().expect("token mutex poisoned").clone()
    }

    fn seen(&self, session: &SessionContext) {
        self.tokens
            .lock()
            .expect("token mutex poisoned")
            .push(session.token.as_str().to_string());
    }

    fn record(&self, write: RecordedWrite) {
        self.writes.lock().expect("writes mutex poisoned").push(write);
    }
}

#[async_trait]
impl AppraisalBackend for MemoryBackend {
    async fn fetch_part(
        &self,
        session: &SessionContext,
        key: &RecordKey,
        part: PartLetter,
    ) -> Result<Option<Value>, BackendError> {
        self.seen(session);
        let parts = self.parts.lock().expect("parts mutex poisoned");
        Ok(parts.get(&(key.clone(), part)).cloned())
    }

    async fn save_part(
        &self,
        session: &SessionContext,
        key: &RecordKey,
        part: PartLetter,
        body: Value,
    ) -> Result<(), BackendError> {
        self.seen(session);
        self.parts
            .lock()
            .expect("parts mutex poisoned")
            .insert((key.clone(), part), body.clone());
        self.record(RecordedWrite::Part {
            key: key.clone(),
            part,
            body,
        });
        Ok(())
    }

    async fn fetch_status(
        &self,
        session: &SessionContext,
        key: &RecordKey,
    ) -> Result<FormStatus, BackendError> {
        self.seen(session);
        let statuses = self.statuses.lock().expect("status mutex poisoned");
        Ok(statuses.get(key).copied().unwrap_or(FormStatus::Pending))
    }

    async fn save_interaction_marks(
        &self,
        session: &SessionContext,
        key: &RecordKey,
        body: Value,
    ) -> Result<(), BackendError> {
        self.seen(session);
        self.record(RecordedWrite::Interaction {
            key: key.clone(),
            body,
        });
        Ok(())
    }

    async fn mark_director_given(
        &self,
        session: &SessionContext,
        key: &RecordKey,
    ) -> Result<(), BackendError> {
        self.seen(session);
        self.record(RecordedWrite::DirectorFlag { key: key.clone() });
        Ok(())
    }

    async fn relay(&self, request: RelayRequest) -> Result<RelayResponse, BackendError> {
        self.relays
            .lock()
            .expect("relay mutex poisoned")
            .push(request);
        let configured = self.relay_response.lock().expect("relay mutex poisoned");
        Ok(configured.clone().unwrap_or(RelayResponse {
            status: 200,
            body: json!({ "ok": true }),
        }))
    }
}

/// Backend that cannot be reached at all.
pub(super) struct UnavailableBackend;

#[async_trait]
impl AppraisalBackend for UnavailableBackend {
    async fn fetch_part(
        &self,
        _session: &SessionContext,
        _key: &RecordKey,
        _part: PartLetter,
    ) -> Result<Option<Value>, BackendError> {
        Err(offline())
    }

    async fn save_part(
        &self,
        _session: &SessionContext,
        _key: &RecordKey,
        _part: PartLetter,
        _body: Value,
    ) -> Result<(), BackendError> {
        Err(offline())
    }

    async fn fetch_status(
        &self,
        _session: &SessionContext,
        _key: &RecordKey,
    ) -> Result<FormStatus, BackendError> {
        Err(offline())
    }

    async fn save_interaction_marks(
        &self,
        _session: &SessionContext,
        _key: &RecordKey,
        _body: Value,
    ) -> Result<(), BackendError> {
        Err(offline())
    }

    async fn mark_director_given(
        &self,
        _session: &SessionContext,
        _key: &RecordKey,
    ) -> Result<(), BackendError> {
        Err(offline())
    }

    async fn relay(&self, _request: RelayRequest) -> Result<RelayResponse, BackendError> {
        Err(offline())
    }
}

fn offline() -> BackendError {
    BackendError::Unavailable("connection refused".to_string())
}

/// Backend that reads fine but refuses every write with the given status.
pub(super) struct RejectingBackend {
    pub(super) status: u16,
}

#[async_trait]
impl AppraisalBackend for RejectingBackend {
    async fn fetch_part(
        &self,
        _session: &SessionContext,
        _key: &RecordKey,
        _part: PartLetter,
    ) -> Result<Option<Value>, BackendError> {
        Ok(None)
    }

    async fn save_part(
        &self,
        _session: &SessionContext,
        _key: &RecordKey,
        _part: PartLetter,
        _body: Value,
    ) -> Result<(), BackendError> {
        Err(self.refusal())
    }

    async fn fetch_status(
        &self,
        _session: &SessionContext,
        _key: &RecordKey,
    ) -> Result<FormStatus, BackendError> {
        Ok(FormStatus::Pending)
    }

    async fn save_interaction_marks(
        &self,
        _session: &SessionContext,
        _key: &RecordKey,
        _body: Value,
    ) -> Result<(), BackendError> {
        Err(self.refusal())
    }

    async fn mark_director_given(
        &self,
        _session: &SessionContext,
        _key: &RecordKey,
    ) -> Result<(), BackendError> {
        Err(self.refusal())
    }

    async fn relay(&self, _request: RelayRequest) -> Result<RelayResponse, BackendError> {
        Ok(RelayResponse {
            status: self.status,
            body: json!({ "detail": "refused" }),
        })
    }
}

impl RejectingBackend {
    fn refusal(&self) -> BackendError {
        BackendError::Status {
            status: self.status,
            message: "refused".to_string(),
        }
    }
}

pub(super) fn build_service(backend: MemoryBackend) -> (AppraisalService<MemoryBackend>, MemoryBackend) {
    let handle = backend.clone();
    (AppraisalService::new(Arc::new(backend)), handle)
}

pub(super) fn router_with(backend: MemoryBackend) -> axum::Router {
    appraisal_router(Arc::new(AppraisalService::new(Arc::new(backend))))
}

pub(super) fn json_request(method: &str, uri: &str, role: Option<Role>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"));
    if let Some(role) = role {
        builder = builder.header(header::COOKIE, format!("role={}", role.as_str()));
    }
    builder
        .body(Body::from(serde_json::to_vec(&body).expect("serialize body")))
        .expect("request builds")
}

pub(super) fn get_request(uri: &str, role: Option<Role>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"));
    if let Some(role) = role {
        builder = builder.header(header::COOKIE, format!("role={}", role.as_str()));
    }
    builder.body(Body::empty()).expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
