use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::domain::{PartLetter, RecordKey};
use super::scoring::{
    score_academic, ExtraContribution, InteractionEvaluation, MarkError, PortfolioForm,
    PortfolioScore,
};
use super::service::{AcademicSubmission, AppraisalService, AppraisalServiceError, SaveReceipt};
use crate::backend::{AppraisalBackend, BackendError};
use crate::session::SessionContext;

const RECORD_ROOT: &str = "/api/v1/appraisals/:department/:user_id";

/// Routes for reading, saving and scoring appraisal records.
pub fn appraisal_router<B>(service: Arc<AppraisalService<B>>) -> Router
where
    B: AppraisalBackend + 'static,
{
    let record = |tail: &str| format!("{RECORD_ROOT}{tail}");

    Router::new()
        .route(&record("/status"), get(status_handler::<B>))
        .route(&record("/parts/:part"), get(part_handler::<B>))
        .route(&record("/academic"), post(academic_handler::<B>))
        .route(&record("/portfolio"), post(portfolio_handler::<B>))
        .route(&record("/extra"), post(extra_handler::<B>))
        .route(&record("/verification"), post(verification_handler::<B>))
        .route(&record("/superior-marks"), post(superior_mark_handler::<B>))
        .route(&record("/interaction"), post(interaction_handler::<B>))
        .route(&record("/scorecard"), get(scorecard_handler::<B>))
        .route("/api/v1/score/academic", post(preview_academic_handler))
        .route("/api/v1/score/portfolio", post(preview_portfolio_handler))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct SuperiorMarkRequest {
    marks: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct PortfolioPreview {
    #[serde(flatten)]
    score: PortfolioScore,
    progress_percent: f64,
}

type Service<B> = State<Arc<AppraisalService<B>>>;

pub(crate) async fn status_handler<B>(
    State(service): Service<B>,
    Path((department, user_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response
where
    B: AppraisalBackend + 'static,
{
    let key = RecordKey::new(department, user_id);
    let result = match SessionContext::from_headers(&headers) {
        Ok(session) => service.status(&session, &key).await,
        Err(err) => Err(err.into()),
    };
    respond(result, StatusCode::OK)
}

pub(crate) async fn part_handler<B>(
    State(service): Service<B>,
    Path((department, user_id, part)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Response
where
    B: AppraisalBackend + 'static,
{
    let part = match part.parse::<PartLetter>() {
        Ok(part) => part,
        Err(err) => return error_body(StatusCode::NOT_FOUND, err.to_string()),
    };

    let key = RecordKey::new(department, user_id);
    let result = match SessionContext::from_headers(&headers) {
        Ok(session) => service.load_part(&session, &key, part).await,
        Err(err) => Err(err.into()),
    };
    respond(result, StatusCode::OK)
}

pub(crate) async fn academic_handler<B>(
    State(service): Service<B>,
    Path((department, user_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(submission): Json<AcademicSubmission>,
) -> Response
where
    B: AppraisalBackend + 'static,
{
    let key = RecordKey::new(department, user_id);
    let result = match SessionContext::from_headers(&headers) {
        Ok(session) => service.save_academic(&session, &key, submission).await,
        Err(err) => Err(err.into()),
    };
    respond_saved(result)
}

pub(crate) async fn portfolio_handler<B>(
    State(service): Service<B>,
    Path((department, user_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(form): Json<PortfolioForm>,
) -> Response
where
    B: AppraisalBackend + 'static,
{
    let key = RecordKey::new(department, user_id);
    let result = match SessionContext::from_headers(&headers) {
        Ok(session) => service.save_portfolio(&session, &key, form).await,
        Err(err) => Err(err.into()),
    };
    respond_saved(result)
}

pub(crate) async fn extra_handler<B>(
    State(service): Service<B>,
    Path((department, user_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(contribution): Json<ExtraContribution>,
) -> Response
where
    B: AppraisalBackend + 'static,
{
    let key = RecordKey::new(department, user_id);
    let result = match SessionContext::from_headers(&headers) {
        Ok(session) => service.save_extra(&session, &key, contribution).await,
        Err(err) => Err(err.into()),
    };
    respond_saved(result)
}

pub(crate) async fn verification_handler<B>(
    State(service): Service<B>,
    Path((department, user_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(verified): Json<BTreeMap<String, Value>>,
) -> Response
where
    B: AppraisalBackend + 'static,
{
    let key = RecordKey::new(department, user_id);
    let result = match SessionContext::from_headers(&headers) {
        Ok(session) => service.submit_verification(&session, &key, verified).await,
        Err(err) => Err(err.into()),
    };
    respond(result, StatusCode::OK)
}

pub(crate) async fn superior_mark_handler<B>(
    State(service): Service<B>,
    Path((department, user_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(request): Json<SuperiorMarkRequest>,
) -> Response
where
    B: AppraisalBackend + 'static,
{
    let key = RecordKey::new(department, user_id);
    let result = match SessionContext::from_headers(&headers) {
        Ok(session) => {
            service
                .save_superior_mark(&session, &key, request.marks)
                .await
        }
        Err(err) => Err(err.into()),
    };
    respond(result, StatusCode::OK)
}

pub(crate) async fn interaction_handler<B>(
    State(service): Service<B>,
    Path((department, user_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(evaluation): Json<InteractionEvaluation>,
) -> Response
where
    B: AppraisalBackend + 'static,
{
    let key = RecordKey::new(department, user_id);
    let result = match SessionContext::from_headers(&headers) {
        Ok(session) => service.submit_interaction(&session, &key, evaluation).await,
        Err(err) => Err(err.into()),
    };
    respond(result, StatusCode::OK)
}

pub(crate) async fn scorecard_handler<B>(
    State(service): Service<B>,
    Path((department, user_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response
where
    B: AppraisalBackend + 'static,
{
    let key = RecordKey::new(department, user_id);
    let result = match SessionContext::from_headers(&headers) {
        Ok(session) => service.scorecard(&session, &key).await,
        Err(err) => Err(err.into()),
    };
    respond(result, StatusCode::OK)
}

pub(crate) async fn preview_academic_handler(
    Json(submission): Json<AcademicSubmission>,
) -> Response {
    let outcome = score_academic(&submission.scores, &submission.designation);
    (StatusCode::OK, Json(outcome)).into_response()
}

pub(crate) async fn preview_portfolio_handler(Json(form): Json<PortfolioForm>) -> Response {
    let preview = PortfolioPreview {
        score: form.score(),
        progress_percent: form.progress_percent(),
    };
    (StatusCode::OK, Json(preview)).into_response()
}

fn respond<T: Serialize>(result: Result<T, AppraisalServiceError>, status: StatusCode) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(err) => service_error_response(err),
    }
}

fn respond_saved<S: Serialize>(result: Result<SaveReceipt<S>, AppraisalServiceError>) -> Response {
    match result {
        Ok(receipt) if receipt.created => (StatusCode::CREATED, Json(receipt)).into_response(),
        other => respond(other, StatusCode::OK),
    }
}

fn error_body(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

pub(crate) fn service_error_response(err: AppraisalServiceError) -> Response {
    let status = match &err {
        AppraisalServiceError::Session(_) => StatusCode::UNAUTHORIZED,
        AppraisalServiceError::InvalidKey(_) => StatusCode::BAD_REQUEST,
        AppraisalServiceError::Forbidden { .. } | AppraisalServiceError::NoSuperiorAuthority(_) => {
            StatusCode::FORBIDDEN
        }
        AppraisalServiceError::Locked(locked) => {
            let payload = json!({
                "error": err.to_string(),
                "status": locked.status,
                "locked": true,
            });
            return (StatusCode::LOCKED, Json(payload)).into_response();
        }
        AppraisalServiceError::Marks(MarkError::Incomplete { missing }) => {
            let payload = json!({
                "error": err.to_string(),
                "missing": missing,
            });
            return (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response();
        }
        AppraisalServiceError::Marks(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AppraisalServiceError::PartMissing(_) => StatusCode::NOT_FOUND,
        AppraisalServiceError::Backend(BackendError::Status { status, .. }) => {
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
        }
        AppraisalServiceError::Backend(BackendError::Unavailable(_) | BackendError::Decode(_)) => {
            StatusCode::BAD_GATEWAY
        }
        AppraisalServiceError::Backend(BackendError::InvalidUrl(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_body(status, err.to_string())
}
