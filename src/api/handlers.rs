use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use utoipa::OpenApi;
use uuid::Uuid;

use super::{
    dto::{
        AlertListDto, ReadingFilter, RefreshDto, ScheduleParams, SourceDto, SourceRequest,
        StatusDto,
    },
    errors::AppError,
};
use crate::{
    export::readings_to_csv,
    models::{Alert, AlertConfig, DataSource, Reading},
    monitor::MonitorHandle,
    schedule::TurningSchedule,
};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Current incubator status, classified against the active thresholds.
#[utoipa::path(
    get,
    path = "/status",
    responses(
        (status = 200, description = "Live status", body = StatusDto),
    ),
    tag = "status"
)]
pub async fn get_status(State(monitor): State<MonitorHandle>) -> Json<StatusDto> {
    let state = monitor.read().await;
    Json(StatusDto::new(state.status(), state.alert_config()))
}

// ---------------------------------------------------------------------------
// Readings
// ---------------------------------------------------------------------------

/// Reading history, most recent first, narrowed by optional filters.
#[utoipa::path(
    get,
    path = "/readings",
    params(ReadingFilter),
    responses(
        (status = 200, description = "Matching readings", body = Vec<Reading>),
        (status = 400, description = "Malformed filter"),
    ),
    tag = "readings"
)]
pub async fn get_readings(
    State(monitor): State<MonitorHandle>,
    query: Result<Query<ReadingFilter>, QueryRejection>,
) -> Result<Json<Vec<Reading>>, AppError> {
    let Query(filter) = query?;
    let state = monitor.read().await;
    let readings = filter.select(state.readings()).cloned().collect();
    Ok(Json(readings))
}

/// The same selection as `GET /readings`, as a CSV download.
#[utoipa::path(
    get,
    path = "/readings/export.csv",
    params(ReadingFilter),
    responses(
        (status = 200, description = "CSV file", body = String, content_type = "text/csv"),
        (status = 400, description = "Malformed filter"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "readings"
)]
pub async fn export_readings(
    State(monitor): State<MonitorHandle>,
    query: Result<Query<ReadingFilter>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(filter) = query?;
    let csv = {
        let state = monitor.read().await;
        readings_to_csv(filter.select(state.readings()))?
    };

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"incubator_readings.csv\"",
            ),
        ],
        csv,
    ))
}

/// Refresh the history now. Mock mode appends one simulated reading; device
/// mode starts a log fetch and answers before it completes.
#[utoipa::path(
    post,
    path = "/readings/refresh",
    responses(
        (status = 202, description = "Refresh started", body = RefreshDto),
        (status = 503, description = "Monitor engine unavailable"),
    ),
    tag = "readings"
)]
pub async fn refresh_readings(
    State(monitor): State<MonitorHandle>,
) -> Result<(StatusCode, Json<RefreshDto>), AppError> {
    monitor.refresh_logs().await?;
    let state = monitor.read().await;
    let body = RefreshDto {
        data_source: state.source(),
        readings: state.readings().len(),
    };
    Ok((StatusCode::ACCEPTED, Json(body)))
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

/// Retained alerts, most recent first.
#[utoipa::path(
    get,
    path = "/alerts",
    responses(
        (status = 200, description = "Alert list", body = AlertListDto),
    ),
    tag = "alerts"
)]
pub async fn get_alerts(State(monitor): State<MonitorHandle>) -> Json<AlertListDto> {
    let state = monitor.read().await;
    Json(AlertListDto {
        alerts: state.alerts().iter().cloned().collect(),
        unacknowledged: state.alerts().unacknowledged(),
    })
}

/// Acknowledge an alert. Idempotent.
#[utoipa::path(
    post,
    path = "/alerts/{id}/acknowledge",
    params(
        ("id" = Uuid, Path, description = "Alert ID"),
    ),
    responses(
        (status = 200, description = "Acknowledged alert", body = Alert),
        (status = 400, description = "Malformed alert ID"),
        (status = 404, description = "No alert with this ID"),
        (status = 503, description = "Monitor engine unavailable"),
    ),
    tag = "alerts"
)]
pub async fn acknowledge_alert(
    State(monitor): State<MonitorHandle>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Alert>, AppError> {
    let Path(id) = path?;
    let not_found = || AppError::not_found(format!("alert {id} not found"));

    if !monitor.acknowledge_alert(id).await? {
        return Err(not_found());
    }
    let state = monitor.read().await;
    let alert = state.alerts().iter().find(|a| a.id == id).cloned();
    alert.map(Json).ok_or_else(not_found)
}

// ---------------------------------------------------------------------------
// Alert thresholds
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/config/alerts",
    responses(
        (status = 200, description = "Active alert thresholds", body = AlertConfig),
    ),
    tag = "config"
)]
pub async fn get_alert_config(State(monitor): State<MonitorHandle>) -> Json<AlertConfig> {
    Json(*monitor.read().await.alert_config())
}

/// Replace the alert thresholds. Applies from the next measurement change.
#[utoipa::path(
    put,
    path = "/config/alerts",
    request_body = AlertConfig,
    responses(
        (status = 200, description = "Thresholds stored", body = AlertConfig),
        (status = 400, description = "Body is not valid JSON"),
        (status = 422, description = "Missing or mistyped field, minimum above maximum, or non-finite bound"),
    ),
    tag = "config"
)]
pub async fn put_alert_config(
    State(monitor): State<MonitorHandle>,
    body: Result<Json<AlertConfig>, JsonRejection>,
) -> Result<Json<AlertConfig>, AppError> {
    let Json(config) = body?;
    monitor.set_alert_config(config).await?;
    Ok(Json(config))
}

// ---------------------------------------------------------------------------
// Turning schedule
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/schedule",
    responses(
        (status = 200, description = "Saved turning schedule", body = TurningSchedule),
    ),
    tag = "schedule"
)]
pub async fn get_schedule(State(monitor): State<MonitorHandle>) -> Json<TurningSchedule> {
    Json(monitor.read().await.schedule().clone())
}

/// Save a turning schedule. In device mode it is also pushed to the device.
#[utoipa::path(
    put,
    path = "/schedule",
    request_body = ScheduleParams,
    responses(
        (status = 200, description = "Schedule stored", body = TurningSchedule),
        (status = 400, description = "Body is not valid JSON"),
        (status = 422, description = "Parameter missing or out of range"),
    ),
    tag = "schedule"
)]
pub async fn put_schedule(
    State(monitor): State<MonitorHandle>,
    body: Result<Json<ScheduleParams>, JsonRejection>,
) -> Result<Json<TurningSchedule>, AppError> {
    let Json(params) = body?;
    let schedule = monitor
        .save_schedule(params.turns_per_day, params.interval_hours)
        .await?;
    Ok(Json(schedule))
}

/// Compute turn times without saving anything.
#[utoipa::path(
    get,
    path = "/schedule/preview",
    params(ScheduleParams),
    responses(
        (status = 200, description = "Computed schedule", body = TurningSchedule),
        (status = 400, description = "Parameter missing or not a number"),
        (status = 422, description = "Parameter out of range"),
    ),
    tag = "schedule"
)]
pub async fn preview_schedule(
    query: Result<Query<ScheduleParams>, QueryRejection>,
) -> Result<Json<TurningSchedule>, AppError> {
    let Query(params) = query?;
    let schedule = TurningSchedule::new(params.turns_per_day, params.interval_hours)?;
    Ok(Json(schedule))
}

// ---------------------------------------------------------------------------
// Data source
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/source",
    responses(
        (status = 200, description = "Active data source", body = SourceDto),
    ),
    tag = "config"
)]
pub async fn get_source(State(monitor): State<MonitorHandle>) -> Json<SourceDto> {
    Json(monitor.read().await.source().into())
}

/// Switch between simulated and device data. The status refreshes
/// immediately from the new source.
#[utoipa::path(
    put,
    path = "/source",
    request_body = SourceRequest,
    responses(
        (status = 200, description = "Source switched", body = SourceDto),
        (status = 422, description = "Missing or mistyped field"),
        (status = 503, description = "Monitor engine unavailable"),
    ),
    tag = "config"
)]
pub async fn put_source(
    State(monitor): State<MonitorHandle>,
    body: Result<Json<SourceRequest>, JsonRejection>,
) -> Result<Json<SourceDto>, AppError> {
    let Json(req) = body?;
    let source = DataSource::from_use_mock(req.use_mock_data);
    monitor.set_data_source(source).await?;
    Ok(Json(source.into()))
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Returns `200 OK` with `{"status":"ok"}` when the server is running.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
    ),
    tag = "system"
)]
pub async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// OpenAPI document
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(
        get_status,
        get_readings,
        export_readings,
        refresh_readings,
        get_alerts,
        acknowledge_alert,
        get_alert_config,
        put_alert_config,
        get_schedule,
        put_schedule,
        preview_schedule,
        get_source,
        put_source,
        health,
    ),
    components(schemas(
        StatusDto,
        Reading,
        Alert,
        AlertListDto,
        RefreshDto,
        AlertConfig,
        TurningSchedule,
        ScheduleParams,
        SourceDto,
        SourceRequest,
    )),
    tags(
        (name = "status",   description = "Live incubator status"),
        (name = "readings", description = "Reading history and export"),
        (name = "alerts",   description = "Threshold alerts"),
        (name = "config",   description = "Thresholds and data source"),
        (name = "schedule", description = "Egg-turning schedule"),
        (name = "system",   description = "System endpoints"),
    ),
    info(
        title = "Incubator Monitor API",
        version = "0.1.0",
        description = "REST API for egg incubator status, history and alerts"
    )
)]
pub struct ApiDoc;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::http::StatusCode;
    use axum_test::TestServer;
    use chrono::{TimeZone, Utc};
    use rand::{rngs::StdRng, SeedableRng};
    use serde_json::{json, Value};

    use crate::{
        api::router,
        device::DeviceClient,
        models::{DataSource, MotorStatus, Reading, Status},
        monitor::{Engine, MonitorState},
        reading_store::ReadingStore,
    };

    fn reading(hour: u32, temperature: f64, egg_turning: bool) -> Reading {
        Reading {
            id: format!("r{hour}"),
            timestamp: Utc.with_ymd_and_hms(2025, 3, 1, hour, 0, 0).unwrap(),
            temperature,
            humidity: 60.0,
            egg_turning,
            motor_status: if egg_turning {
                MotorStatus::Running
            } else {
                MotorStatus::Idle
            },
        }
    }

    /// Mock-mode server over a fixed status and three readings (10:00
    /// newest). No timers run, so the state only changes through requests.
    fn test_server(temperature: f64) -> TestServer {
        let status = Status {
            temperature,
            humidity: 60.0,
            motor_status: MotorStatus::Idle,
            turns_today: 2,
            next_turn_in: 3900,
            last_updated: Utc::now(),
            connected: true,
        };
        let mut readings = ReadingStore::new();
        readings.replace_all([
            reading(10, 38.0, false),
            reading(9, 37.4, true),
            reading(8, 37.8, false),
        ]);
        let state = MonitorState::new(DataSource::Mock, status, readings);

        let device = DeviceClient::new("http://127.0.0.1:9", Duration::from_millis(200));
        let (engine, handle) = Engine::new(state, device, 20, StdRng::seed_from_u64(1));
        tokio::spawn(engine.run());

        TestServer::new(router(handle)).unwrap()
    }

    async fn first_alert_id(server: &TestServer) -> String {
        // The engine evaluates alerts as it starts; wait for it.
        for _ in 0..50 {
            let body: Value = server.get("/alerts").await.json();
            if let Some(id) = body["alerts"][0]["id"].as_str() {
                return id.to_owned();
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("no alert raised");
    }

    // -----------------------------------------------------------------------
    // GET /status
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn status_includes_levels_and_countdown() {
        let server = test_server(38.9);
        let resp = server.get("/status").await;
        resp.assert_status_ok();

        let body: Value = resp.json();
        assert_eq!(body["temperature"], 38.9);
        assert_eq!(body["temperature_level"], "high");
        assert_eq!(body["humidity_level"], "normal");
        assert_eq!(body["next_turn_display"], "1h 5m");
        assert_eq!(body["connected"], true);
    }

    // -----------------------------------------------------------------------
    // GET /readings
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn readings_are_newest_first() {
        let server = test_server(37.8);
        let body: Vec<Value> = server.get("/readings").await.json();
        let ids: Vec<_> = body.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, ["r10", "r9", "r8"]);
    }

    #[tokio::test]
    async fn readings_filters_combine() {
        let server = test_server(37.8);

        let body: Vec<Value> = server.get("/readings?turning_only=true").await.json();
        assert_eq!(body.len(), 1);
        assert_eq!(body[0]["id"], "r9");

        let body: Vec<Value> = server
            .get("/readings?temp_min=37.5&to=2025-03-01T09:30:00Z")
            .await
            .json();
        assert_eq!(body.len(), 1);
        assert_eq!(body[0]["id"], "r8");

        let body: Vec<Value> = server.get("/readings?limit=2").await.json();
        assert_eq!(body.len(), 2);
    }

    #[tokio::test]
    async fn readings_accept_calendar_dates() {
        let server = test_server(37.8);

        let body: Vec<Value> = server
            .get("/readings?from=2025-03-01&to=2025-03-01")
            .await
            .json();
        assert_eq!(body.len(), 3);

        let body: Vec<Value> = server.get("/readings?from=2025-03-02").await.json();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn readings_page_with_offset() {
        let server = test_server(37.8);
        let body: Vec<Value> = server.get("/readings?offset=1&limit=1").await.json();
        assert_eq!(body.len(), 1);
        assert_eq!(body[0]["id"], "r9");
    }

    #[tokio::test]
    async fn malformed_filter_is_json_error() {
        let server = test_server(37.8);
        let resp = server.get("/readings?limit=abc").await;
        resp.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = resp.json();
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn refresh_appends_mock_reading() {
        let server = test_server(37.8);
        let resp = server.post("/readings/refresh").await;
        resp.assert_status(StatusCode::ACCEPTED);
        let body: Value = resp.json();
        assert_eq!(body, json!({"data_source": "mock", "readings": 4}));

        let readings: Vec<Value> = server.get("/readings").await.json();
        assert_eq!(readings.len(), 4);
        assert_ne!(readings[0]["id"], "r10");
    }

    #[tokio::test]
    async fn export_is_csv_with_header() {
        let server = test_server(37.8);
        let resp = server.get("/readings/export.csv?turning_only=true").await;
        resp.assert_status_ok();

        let content_type = resp.header("content-type");
        assert!(content_type.to_str().unwrap().starts_with("text/csv"));

        let text = resp.text();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines[0],
            "Timestamp,Temperature (°C),Humidity (%),Egg Turning Event,Motor Status"
        );
        assert_eq!(lines[1], "2025-03-01T09:00:00+00:00,37.4,60.0,Yes,running");
        assert_eq!(lines.len(), 2);
    }

    // -----------------------------------------------------------------------
    // Alerts
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn breach_at_startup_is_listed() {
        let server = test_server(39.2);
        first_alert_id(&server).await;

        let body: Value = server.get("/alerts").await.json();
        assert_eq!(body["unacknowledged"], 1);
        assert_eq!(body["alerts"][0]["category"], "temperature");
        assert_eq!(body["alerts"][0]["severity"], "critical");
        assert_eq!(
            body["alerts"][0]["message"],
            "Temperature too high: 39.2°C (max: 38.5°C)"
        );
    }

    #[tokio::test]
    async fn acknowledge_marks_alert() {
        let server = test_server(39.2);
        let id = first_alert_id(&server).await;

        let resp = server.post(&format!("/alerts/{id}/acknowledge")).await;
        resp.assert_status_ok();
        let body: Value = resp.json();
        assert_eq!(body["acknowledged"], true);

        // Idempotent.
        server
            .post(&format!("/alerts/{id}/acknowledge"))
            .await
            .assert_status_ok();

        let body: Value = server.get("/alerts").await.json();
        assert_eq!(body["unacknowledged"], 0);
    }

    #[tokio::test]
    async fn acknowledge_unknown_is_404() {
        let server = test_server(37.8);
        let resp = server
            .post(&format!("/alerts/{}/acknowledge", uuid::Uuid::new_v4()))
            .await;
        resp.assert_status_not_found();
        let body: Value = resp.json();
        assert!(body["error"].as_str().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn malformed_alert_id_is_json_error() {
        let server = test_server(37.8);
        let resp = server.post("/alerts/not-a-uuid/acknowledge").await;
        resp.assert_status(StatusCode::BAD_REQUEST);
        let content_type = resp.header("content-type");
        assert!(content_type.to_str().unwrap().starts_with("application/json"));
        let body: Value = resp.json();
        assert!(body["error"].is_string());
    }

    // -----------------------------------------------------------------------
    // Alert thresholds
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn alert_config_defaults() {
        let server = test_server(37.8);
        let body: Value = server.get("/config/alerts").await.json();
        assert_eq!(
            body,
            json!({"temp_min": 37.0, "temp_max": 38.5, "humidity_min": 55.0, "humidity_max": 65.0})
        );
    }

    #[tokio::test]
    async fn alert_config_update_is_visible() {
        let server = test_server(38.9);
        let new = json!({"temp_min": 36.5, "temp_max": 39.0, "humidity_min": 50.0, "humidity_max": 70.0});

        server.put("/config/alerts").json(&new).await.assert_status_ok();
        let body: Value = server.get("/config/alerts").await.json();
        assert_eq!(body, new);

        // Levels follow the new thresholds.
        let status: Value = server.get("/status").await.json();
        assert_eq!(status["temperature_level"], "normal");
    }

    #[tokio::test]
    async fn inverted_alert_config_is_rejected() {
        let server = test_server(37.8);
        let resp = server
            .put("/config/alerts")
            .json(&json!({"temp_min": 39.0, "temp_max": 38.0, "humidity_min": 55.0, "humidity_max": 65.0}))
            .await;
        resp.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let body: Value = server.get("/config/alerts").await.json();
        assert_eq!(body["temp_min"], 37.0);
    }

    #[tokio::test]
    async fn non_numeric_threshold_is_json_error() {
        let server = test_server(37.8);
        let resp = server
            .put("/config/alerts")
            .json(&json!({"temp_min": "abc", "temp_max": 38.5, "humidity_min": 55.0, "humidity_max": 65.0}))
            .await;
        resp.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let content_type = resp.header("content-type");
        assert!(content_type.to_str().unwrap().starts_with("application/json"));
        let body: Value = resp.json();
        assert!(body["error"].as_str().unwrap().contains("temp_min"));

        let body: Value = server.get("/config/alerts").await.json();
        assert_eq!(body["temp_min"], 37.0);
    }

    // -----------------------------------------------------------------------
    // Turning schedule
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn schedule_defaults_to_three_turns() {
        let server = test_server(37.8);
        let body: Value = server.get("/schedule").await.json();
        assert_eq!(body["times"], json!(["08:00", "16:00", "00:00"]));
    }

    #[tokio::test]
    async fn schedule_save_and_read_back() {
        let server = test_server(37.8);
        let resp = server
            .put("/schedule")
            .json(&json!({"turns_per_day": 4, "interval_hours": 6.0}))
            .await;
        resp.assert_status_ok();
        let body: Value = resp.json();
        assert_eq!(body["times"], json!(["08:00", "14:00", "20:00", "02:00"]));

        let body: Value = server.get("/schedule").await.json();
        assert_eq!(body["turns_per_day"], 4);
    }

    #[tokio::test]
    async fn schedule_out_of_range_is_rejected() {
        let server = test_server(37.8);
        server
            .put("/schedule")
            .json(&json!({"turns_per_day": 30, "interval_hours": 6.0}))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        server
            .put("/schedule")
            .json(&json!({"turns_per_day": 3, "interval_hours": 0.5}))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let body: Value = server.get("/schedule").await.json();
        assert_eq!(body["turns_per_day"], 3);
    }

    #[tokio::test]
    async fn schedule_preview_does_not_save() {
        let server = test_server(37.8);
        let resp = server.get("/schedule/preview?turns_per_day=1&interval_hours=24").await;
        resp.assert_status_ok();
        let body: Value = resp.json();
        assert_eq!(body["times"], json!(["08:00"]));

        let body: Value = server.get("/schedule").await.json();
        assert_eq!(body["turns_per_day"], 3);

        server
            .get("/schedule/preview?turns_per_day=0&interval_hours=8")
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    // -----------------------------------------------------------------------
    // Data source
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn source_switch_round_trip() {
        let server = test_server(37.8);
        let body: Value = server.get("/source").await.json();
        assert_eq!(body, json!({"use_mock_data": true, "data_source": "mock"}));

        let resp = server.put("/source").json(&json!({"use_mock_data": false})).await;
        resp.assert_status_ok();

        let body: Value = server.get("/source").await.json();
        assert_eq!(body, json!({"use_mock_data": false, "data_source": "device"}));

        // No device is listening, so the immediate refresh disconnects.
        for _ in 0..100 {
            let status: Value = server.get("/status").await.json();
            if status["connected"] == false {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("status never reported disconnected");
    }

    // -----------------------------------------------------------------------
    // GET /health
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn health_returns_ok() {
        let server = test_server(37.8);
        let resp = server.get("/health").await;
        resp.assert_status_ok();
        let body: Value = resp.json();
        assert_eq!(body["status"], "ok");
    }

    // -----------------------------------------------------------------------
    // GET /api-docs/openapi.json
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn openapi_document_is_served() {
        let server = test_server(37.8);
        let resp = server.get("/api-docs/openapi.json").await;
        resp.assert_status_ok();
        let body: Value = resp.json();
        assert_eq!(body["info"]["title"], "Incubator Monitor API");
        assert!(body["paths"]["/readings/export.csv"].is_object());
        assert!(body["paths"]["/readings/refresh"]["post"].is_object());
    }
}
