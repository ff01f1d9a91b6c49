use arcmap_shared::{ImportReport, SelectionError};
use axum::Json;
use axum::extract::State;
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::routes::api::json_bytes_response;
use crate::state::AppState;

pub const EXPORT_FILENAME: &str = "arcmap-selection.json";

pub async fn export(State(state): State<AppState>) -> Response {
    let document = state.board.read().await.export();
    let json = match serde_json::to_vec_pretty(&document) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "failed to serialize selection document");
            return axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let mut response = json_bytes_response(Bytes::from(json), "no-store", None);
    if let Ok(disposition) =
        HeaderValue::from_str(&format!("attachment; filename=\"{EXPORT_FILENAME}\""))
    {
        response
            .headers_mut()
            .insert(header::CONTENT_DISPOSITION, disposition);
    }
    response
}

/// Takes the raw body so malformed JSON or invalid UTF-8 is reported as an
/// invalid document rather than an extractor rejection.
pub async fn import(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ImportReport>, ApiError> {
    let mut board = state.board.write().await;
    let result = parse_document(&body).and_then(|doc| board.import(&doc));
    let report = match result {
        Ok(report) => report,
        Err(e) => {
            state.observability.record_import_rejection();
            warn!(error = %e, "import rejected");
            return Err(e.into());
        }
    };

    state
        .observability
        .record_import(report.dropped.len() as u64);
    if report.has_dropped() {
        warn!(
            dropped = report.dropped.len(),
            "import skipped malformed entries"
        );
    }
    if !report.over_capacity.is_empty() {
        warn!(
            colors = ?report.over_capacity,
            "imported document exceeds the per-color cap"
        );
    }
    info!(
        tiles = report.tiles,
        gates = report.gates,
        shrines = report.shrines,
        labels = report.labels,
        version = ?report.version,
        "selection imported"
    );
    state.publish_snapshot(board.snapshot());
    Ok(Json(report))
}

fn parse_document(body: &[u8]) -> Result<Value, SelectionError> {
    serde_json::from_slice(body)
        .map_err(|e| SelectionError::InvalidDocument(format!("malformed JSON: {e}")))
}
