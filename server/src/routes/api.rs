use std::fmt::Write as _;

use arcmap_shared::{
    Category, ClickResult, Color, RegionClick, SanctuaryStanding, SelectionError,
};
use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::{AppState, ObservabilitySnapshot};

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let board = state.board.read().await;
    let registry = board.registry();
    let store = board.store();
    let observability = state.observability.snapshot();
    Json(serde_json::json!({
        "status": "ok",
        "seq": state.current_seq(),
        "server_time": chrono::Utc::now().to_rfc3339(),
        "regions": {
            "tiles": registry.len(Category::Tile),
            "gates": registry.len(Category::Gate),
            "shrines": registry.len(Category::Shrine),
        },
        "assigned": {
            "tiles": store.count_in(Category::Tile),
            "gates": store.count_in(Category::Gate),
            "shrines": store.count_in(Category::Shrine),
        },
        "autosave_enabled": state.save_path.is_some(),
        "observability": {
            "clicks_total": observability.clicks_total,
            "capacity_rejections_total": observability.capacity_rejections_total,
            "invalid_requests_total": observability.invalid_requests_total,
            "imports_total": observability.imports_total,
            "import_rejections_total": observability.import_rejections_total,
            "import_dropped_entries_total": observability.import_dropped_entries_total,
            "autosaves_total": observability.autosaves_total,
            "autosave_failures_total": observability.autosave_failures_total,
        }
    }))
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let assigned_regions = state.board.read().await.store().len();
    let observability = state.observability.snapshot();

    let body = render_prometheus_metrics(
        assigned_regions,
        state.save_path.is_some(),
        observability,
    );

    (
        [
            (header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-store"),
        ],
        body,
    )
}

fn render_prometheus_metrics(
    assigned_regions: usize,
    autosave_enabled: bool,
    observability: ObservabilitySnapshot,
) -> String {
    let mut body = String::new();
    write_metric(
        &mut body,
        "arcmap_assigned_regions",
        "gauge",
        "Regions currently carrying a color.",
        assigned_regions as u64,
    );
    write_metric(
        &mut body,
        "arcmap_autosave_enabled",
        "gauge",
        "Whether autosave is configured (1 or 0).",
        u64::from(autosave_enabled),
    );
    write_metric(
        &mut body,
        "arcmap_clicks_total",
        "counter",
        "Total region clicks received.",
        observability.clicks_total,
    );
    write_metric(
        &mut body,
        "arcmap_capacity_rejections_total",
        "counter",
        "Total clicks rejected by the per-color cap.",
        observability.capacity_rejections_total,
    );
    write_metric(
        &mut body,
        "arcmap_invalid_requests_total",
        "counter",
        "Total requests naming an unknown color or region.",
        observability.invalid_requests_total,
    );
    write_metric(
        &mut body,
        "arcmap_imports_total",
        "counter",
        "Total successful document imports.",
        observability.imports_total,
    );
    write_metric(
        &mut body,
        "arcmap_import_rejections_total",
        "counter",
        "Total imports rejected as structurally invalid.",
        observability.import_rejections_total,
    );
    write_metric(
        &mut body,
        "arcmap_import_dropped_entries_total",
        "counter",
        "Total malformed entries skipped during imports.",
        observability.import_dropped_entries_total,
    );
    write_metric(
        &mut body,
        "arcmap_autosaves_total",
        "counter",
        "Total autosave writes.",
        observability.autosaves_total,
    );
    write_metric(
        &mut body,
        "arcmap_autosave_failures_total",
        "counter",
        "Total failed autosave writes.",
        observability.autosave_failures_total,
    );
    body
}

fn write_metric(body: &mut String, name: &str, kind: &str, help: &str, value: u64) {
    let _ = writeln!(body, "# HELP {name} {help}");
    let _ = writeln!(body, "# TYPE {name} {kind}");
    let _ = writeln!(body, "{name} {value}");
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaletteResponse {
    pub colors: Vec<Color>,
    pub active: Color,
}

pub async fn get_palette(State(state): State<AppState>) -> Json<PaletteResponse> {
    let board = state.board.read().await;
    Json(PaletteResponse {
        colors: board.palette().colors().to_vec(),
        active: board.active_color().clone(),
    })
}

#[derive(Debug, Deserialize)]
pub struct ActiveColorRequest {
    pub color: String,
}

pub async fn set_active_color(
    State(state): State<AppState>,
    Json(request): Json<ActiveColorRequest>,
) -> Result<Json<PaletteResponse>, ApiError> {
    let mut board = state.board.write().await;
    if let Err(e) = board.set_active_color(request.color.trim()) {
        state.observability.record_invalid_request();
        return Err(e.into());
    }
    state.publish_snapshot(board.snapshot());
    debug!(color = %board.active_color(), "active color changed");
    Ok(Json(PaletteResponse {
        colors: board.palette().colors().to_vec(),
        active: board.active_color().clone(),
    }))
}

pub async fn click(
    State(state): State<AppState>,
    Json(click): Json<RegionClick>,
) -> Result<Json<ClickResult>, ApiError> {
    state.observability.record_click();
    let mut board = state.board.write().await;
    match board.click(&click) {
        Ok(result) => {
            debug!(
                category = %result.change.category,
                key = %result.change.key,
                color = ?result.change.color,
                "region toggled"
            );
            state.publish_update(vec![result.change.clone()]);
            Ok(Json(result))
        }
        Err(e) => {
            match &e {
                SelectionError::CapacityExceeded { color, max } => {
                    info!(%color, max, "click rejected: color is at capacity");
                    state.observability.record_capacity_rejection();
                }
                _ => state.observability.record_invalid_request(),
            }
            Err(e.into())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LabelRequest {
    pub color: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LabelResponse {
    pub color: Color,
    pub label: String,
}

pub async fn set_label(
    State(state): State<AppState>,
    Json(request): Json<LabelRequest>,
) -> Result<Json<LabelResponse>, ApiError> {
    let mut board = state.board.write().await;
    if let Err(e) = board.set_label(request.color.trim(), &request.text) {
        state.observability.record_invalid_request();
        return Err(e.into());
    }
    let color = board.palette().resolve(request.color.trim())?.clone();
    let label = board.label(&color).to_owned();
    state.publish_snapshot(board.snapshot());
    Ok(Json(LabelResponse { color, label }))
}

pub async fn get_snapshot(State(state): State<AppState>, headers: HeaderMap) -> Response {
    // Read the seq under the lock so it matches the state being serialized.
    let board = state.board.read().await;
    let etag = board_etag(&state.boot_id, state.current_seq());
    if if_none_match_matches(&headers, &etag) {
        return not_modified_response(Some(etag.as_str()));
    }
    match serde_json::to_vec(&board.snapshot()) {
        Ok(json) => json_bytes_response(Bytes::from(json), "no-cache", Some(etag.as_str())),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

pub async fn get_sanctuaries(State(state): State<AppState>) -> Json<Vec<SanctuaryStanding>> {
    Json(state.board.read().await.sanctuary_standings())
}

pub async fn clear(State(state): State<AppState>) -> StatusCode {
    let mut board = state.board.write().await;
    let cleared = board.store().len();
    board.clear_all();
    state.publish_snapshot(board.snapshot());
    info!(cleared, "board cleared");
    StatusCode::NO_CONTENT
}

fn board_etag(boot_id: &str, seq: u64) -> String {
    format!("\"board-{boot_id}-{seq}\"")
}

pub(crate) fn json_bytes_response(
    body: Bytes,
    cache_control: &'static str,
    etag: Option<&str>,
) -> Response {
    let mut response = Response::new(Body::from(body));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(cache_control),
    );
    if let Some(etag) = etag
        && let Ok(etag_header) = HeaderValue::from_str(etag)
    {
        headers.insert(header::ETAG, etag_header);
    }
    response
}

fn not_modified_response(etag: Option<&str>) -> Response {
    let mut response = StatusCode::NOT_MODIFIED.into_response();
    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    if let Some(etag) = etag
        && let Ok(etag_header) = HeaderValue::from_str(etag)
    {
        headers.insert(header::ETAG, etag_header);
    }
    response
}

fn normalize_etag(candidate: &str) -> &str {
    candidate.strip_prefix("W/").unwrap_or(candidate).trim()
}

fn if_none_match_matches(headers: &HeaderMap, etag: &str) -> bool {
    let Some(value) = headers.get(header::IF_NONE_MATCH) else {
        return false;
    };
    let Ok(raw) = value.to_str() else {
        return false;
    };

    raw.split(',').any(|candidate| {
        let candidate = candidate.trim();
        candidate == "*" || normalize_etag(candidate) == normalize_etag(etag)
    })
}
