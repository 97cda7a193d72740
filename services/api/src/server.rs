use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_appraisal_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use faculty_appraisal::backend::HttpBackend;
use faculty_appraisal::config::AppConfig;
use faculty_appraisal::error::AppError;
use faculty_appraisal::telemetry;
use faculty_appraisal::workflows::appraisal::AppraisalService;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(url) = args.backend_url.take() {
        config.backend.set_base_url(&url)?;
    }

    telemetry::init(config.environment, &config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let app_state = AppState::new(prometheus_handle);
    let readiness_flag = app_state.readiness.clone();

    let backend = Arc::new(HttpBackend::new(&config.backend)?);
    let service = Arc::new(AppraisalService::new(backend));

    let app = with_appraisal_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        backend = %config.backend.base_url,
        "faculty appraisal portal ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
