pub mod dto;
pub mod errors;
pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::monitor::MonitorHandle;
use handlers::ApiDoc;

pub fn router(monitor: MonitorHandle) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .route("/status", get(handlers::get_status))
        .route("/readings", get(handlers::get_readings))
        .route("/readings/export.csv", get(handlers::export_readings))
        .route("/readings/refresh", post(handlers::refresh_readings))
        .route("/alerts", get(handlers::get_alerts))
        .route("/alerts/{id}/acknowledge", post(handlers::acknowledge_alert))
        .route(
            "/config/alerts",
            get(handlers::get_alert_config).put(handlers::put_alert_config),
        )
        .route(
            "/schedule",
            get(handlers::get_schedule).put(handlers::put_schedule),
        )
        .route("/schedule/preview", get(handlers::preview_schedule))
        .route("/source", get(handlers::get_source).put(handlers::put_source))
        .with_state(monitor)
        .split_for_parts();

    router
        .route("/health", get(handlers::health))
        .route(
            "/api-docs/openapi.json",
            get(move || async move { axum::Json(api) }),
        )
}
