//! HTTP inspection API.
//!
//! JSON endpoints for status, today's tasks and classes, and an on-demand
//! pass trigger, plus the older plain-text `/status` and `/run`. Spawned as a
//! background task by `planner start`, next to the scheduler.

use crate::gateway::{Gateway, PassReport};
use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{Json, Response},
    routing::get,
    Router,
};
use planner_core::config::{ApiConfig, Config};
use planner_core::routine::{parse_weekday, weekday_name};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

/// What `/status` reports about the configuration.
#[derive(Debug, Clone)]
pub struct StatusInfo {
    /// `(variable, is set)` in display order.
    pub env: Vec<(&'static str, bool)>,
    pub cron_schedule: String,
    pub timezone: String,
    pub scheduler_enabled: bool,
    pub problems: Vec<String>,
}

impl StatusInfo {
    pub fn from_config(config: &Config) -> Self {
        let set = |s: &str| !s.trim().is_empty();
        let wa = &config.channel.whatsapp;
        let openrouter_key = config
            .provider
            .openrouter
            .as_ref()
            .is_some_and(|o| set(&o.api_key));

        Self {
            env: vec![
                ("SPREADSHEET_ID", set(&config.sheets.spreadsheet_id)),
                ("WHATSAPP_TOKEN", set(&wa.access_token)),
                ("PHONE_NUMBER_ID", set(&wa.phone_number_id)),
                ("YOUR_PHONE", set(&wa.recipient)),
                ("OPENROUTER_API_KEY", openrouter_key),
                (
                    "GOOGLE_CREDENTIALS",
                    set(&config.sheets.credentials)
                        || set(&config.sheets.credentials_file)
                        || set(&config.sheets.api_key),
                ),
                ("CRON_SECRET", set(&config.api.secret)),
            ],
            cron_schedule: config.scheduler.cron.clone(),
            timezone: config.planner.timezone.clone(),
            scheduler_enabled: config.scheduler.enabled,
            problems: config.problems(),
        }
    }
}

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    /// `None` when the gateway could not be built; data endpoints then fail.
    gateway: Option<Arc<Gateway>>,
    status: Arc<StatusInfo>,
    secret: Option<String>,
}

impl ApiState {
    pub fn new(gateway: Option<Arc<Gateway>>, status: StatusInfo, secret: &str) -> Self {
        let secret = secret.trim();
        Self {
            gateway,
            status: Arc::new(status),
            secret: (!secret.is_empty()).then(|| secret.to_string()),
        }
    }

    fn gateway(&self) -> Result<&Arc<Gateway>, String> {
        self.gateway.as_ref().ok_or_else(|| {
            if self.status.problems.is_empty() {
                "planner is not configured".to_string()
            } else {
                format!("planner is not configured: {}", self.status.problems.join("; "))
            }
        })
    }

    fn authorized(&self, given: Option<&str>) -> bool {
        match &self.secret {
            None => true,
            Some(expected) => given.is_some_and(|g| constant_time_eq(g, expected)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SecretQuery {
    secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DayQuery {
    day: Option<String>,
}

/// Constant-time string comparison for the run secret.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// First error of a pass that did not fully succeed.
fn pass_error(report: &PassReport) -> String {
    report
        .errors
        .iter()
        .cloned()
        .chain(report.deliveries.iter().filter_map(|d| {
            d.error
                .as_ref()
                .map(|e| format!("{} delivery: {e}", d.kind))
        }))
        .next()
        .unwrap_or_else(|| "pass did not complete".to_string())
}

/// `GET /api/status`: configuration flags, schedule, and the last pass.
async fn status(State(state): State<ApiState>) -> Json<Value> {
    let env: serde_json::Map<String, Value> = state
        .status
        .env
        .iter()
        .map(|(k, v)| (k.to_string(), Value::Bool(*v)))
        .collect();

    let last_pass = match &state.gateway {
        Some(gw) => gw.last_pass().await,
        None => None,
    };

    Json(json!({
        "env": env,
        "sys": {
            "cronSchedule": state.status.cron_schedule,
            "timezone": state.status.timezone,
            "schedulerEnabled": state.status.scheduler_enabled,
            "problems": state.status.problems,
        },
        "lastPass": last_pass,
    }))
}

/// `GET /api/tasks`: today's and overdue pending tasks.
async fn tasks(State(state): State<ApiState>) -> (StatusCode, Json<Value>) {
    let result = match state.gateway() {
        Ok(gw) => gw.classified_tasks().await.map_err(|e| e.to_string()),
        Err(e) => Err(e),
    };

    match result {
        Ok(c) => (
            StatusCode::OK,
            Json(json!({"today": c.today, "overdue": c.overdue})),
        ),
        Err(e) => {
            error!("api: /api/tasks failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e, "today": [], "overdue": []})),
            )
        }
    }
}

/// `GET /api/routine?day=`: classes for today or the named weekday.
async fn routine(
    State(state): State<ApiState>,
    Query(query): Query<DayQuery>,
) -> (StatusCode, Json<Value>) {
    let forced = query.day.as_deref().and_then(parse_weekday);
    if query.day.is_some() && forced.is_none() {
        warn!("api: ignoring unknown day {:?}", query.day);
    }

    let result = match state.gateway() {
        Ok(gw) => gw.todays_classes(forced).await.map_err(|e| e.to_string()),
        Err(e) => Err(e),
    };

    match result {
        Ok((day, classes)) => (
            StatusCode::OK,
            Json(json!({"day": weekday_name(day), "classes": classes})),
        ),
        Err(e) => {
            error!("api: /api/routine failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e, "classes": []})),
            )
        }
    }
}

/// Run a pass for an authorized caller. `Err` carries the failure text.
async fn trigger_pass(state: &ApiState) -> Result<PassReport, (Option<PassReport>, String)> {
    let gw = state.gateway().map_err(|e| (None, e))?;
    info!("api: running pass on request");
    let report = gw.run_pass(None).await;
    if report.success() {
        Ok(report)
    } else {
        let e = pass_error(&report);
        Err((Some(report), e))
    }
}

/// `GET /api/run?secret=`: run one pass now.
async fn run(
    State(state): State<ApiState>,
    Query(query): Query<SecretQuery>,
) -> (StatusCode, Json<Value>) {
    if !state.authorized(query.secret.as_deref()) {
        warn!("api: /api/run rejected, invalid secret");
        return (
            StatusCode::FORBIDDEN,
            Json(json!({"success": false, "error": "Forbidden: invalid secret"})),
        );
    }

    match trigger_pass(&state).await {
        Ok(report) => (
            StatusCode::OK,
            Json(json!({"success": true, "message": "Job executed", "report": report})),
        ),
        Err((report, e)) => {
            error!("api: /api/run failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"success": false, "error": e, "report": report})),
            )
        }
    }
}

/// `GET /status`: plain-text status lines.
async fn status_text(State(state): State<ApiState>) -> String {
    let mut lines = vec!["App: running".to_string()];
    lines.extend(
        state
            .status
            .env
            .iter()
            .filter(|(k, _)| *k != "GOOGLE_CREDENTIALS" && *k != "CRON_SECRET")
            .map(|(k, v)| format!("{k} set: {v}")),
    );
    lines.push(format!("Cron schedule: {}", state.status.cron_schedule));
    lines.push(format!("Timezone: {}", state.status.timezone));
    lines.join("\n")
}

/// `GET /run?secret=`: plain-text variant of `/api/run`.
async fn run_text(
    State(state): State<ApiState>,
    Query(query): Query<SecretQuery>,
) -> (StatusCode, String) {
    if !state.authorized(query.secret.as_deref()) {
        return (StatusCode::FORBIDDEN, "Forbidden".to_string());
    }
    match trigger_pass(&state).await {
        Ok(_) => (StatusCode::OK, "Job executed".to_string()),
        Err((_, e)) => {
            error!("api: /run failed: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {e}"))
        }
    }
}

async fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({"error": "Not found"})))
}

/// JSON endpoints may be read from any origin.
async fn allow_any_origin(mut resp: Response) -> Response {
    resp.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    resp
}

pub fn build_router(state: ApiState) -> Router {
    let api = Router::new()
        .route("/api/status", get(status))
        .route("/api/tasks", get(tasks))
        .route("/api/routine", get(routine))
        .route("/api/run", get(run))
        .layer(axum::middleware::map_response(allow_any_origin));

    Router::new()
        .merge(api)
        .route("/status", get(status_text))
        .route("/run", get(run_text))
        .fallback(not_found)
        .with_state(state)
}

/// Start the API server. Returns when the listener fails.
pub async fn serve(config: ApiConfig, state: ApiState) {
    let app = build_router(state);
    let addr = format!("{}:{}", config.host, config.port);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("API server failed to bind to {addr}: {e}");
            return;
        }
    };

    info!("API server listening on {addr}");

    if let Err(e) = axum::serve(listener, app).await {
        error!("API server error: {e}");
    }
}
