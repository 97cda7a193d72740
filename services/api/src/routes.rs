use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use faculty_appraisal::backend::AppraisalBackend;
use faculty_appraisal::relay::relay_router;
use faculty_appraisal::workflows::appraisal::{appraisal_router, AppraisalService};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_appraisal_routes<B>(service: Arc<AppraisalService<B>>) -> axum::Router
where
    B: AppraisalBackend + 'static,
{
    let backend = Arc::clone(service.backend());

    appraisal_router(service)
        .merge(relay_router(backend))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use faculty_appraisal::backend::HttpBackend;
    use faculty_appraisal::config::BackendConfig;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::Ordering;
    use tower::ServiceExt;

    fn app() -> (axum::Router, AppState) {
        let backend = HttpBackend::new(&BackendConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 1,
        })
        .expect("client builds");
        let state = AppState::new(PrometheusBuilder::new().build_recorder().handle());
        let router = with_appraisal_routes(Arc::new(AppraisalService::new(Arc::new(backend))))
            .layer(Extension(state.clone()));
        (router, state)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn readiness_tracks_flag() {
        let (router, state) = app();

        let response = router
            .clone()
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        state.readiness.store(true, Ordering::Release);
        let response = router
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], json!("ready"));
    }

    #[tokio::test]
    async fn health_and_score_preview_are_mounted() {
        let (router, _) = app();

        let response = router
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);

        let request = Request::post("/api/v1/score/academic")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({
                    "designation": "Assistant Professor",
                    "scores": { "resultAnalysis": 40, "courseOutcome": 30 }
                })
                .to_string(),
            ))
            .expect("request");
        let response = router.oneshot(request).await.expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["final_score"], json!(70));
    }

    #[tokio::test]
    async fn relay_routes_share_the_backend() {
        let (router, _) = app();

        let response = router
            .oneshot(
                Request::get("/api/v1/access?path=/faculty/dashboard")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["redirect"], json!("/"));
    }
}
