use std::path::Path;

use axum::{
    Router,
    extract::Request,
    http::{HeaderValue, header},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
};
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;

use crate::config;
use crate::routes;
use crate::state::AppState;

pub(crate) fn build_app(state: AppState) -> Router {
    let static_assets = Router::new()
        .fallback_service(
            ServeDir::new(config::static_dir())
                .precompressed_br()
                .precompressed_gzip(),
        )
        .layer(middleware::from_fn(set_static_cache_control));

    let app = Router::new()
        .route("/api/health", get(routes::api::health))
        .route("/api/metrics", get(routes::api::metrics))
        .route("/api/palette", get(routes::api::get_palette))
        .route("/api/palette/active", put(routes::api::set_active_color))
        .route("/api/click", post(routes::api::click))
        .route("/api/labels", post(routes::api::set_label))
        .route("/api/snapshot", get(routes::api::get_snapshot))
        .route("/api/sanctuaries", get(routes::api::get_sanctuaries))
        .route("/api/clear", post(routes::api::clear))
        .route("/api/export", get(routes::document::export))
        .route("/api/import", post(routes::document::import))
        .route("/api/events", get(routes::sse::board_events));

    app.layer(CompressionLayer::new())
        .fallback_service(static_assets)
        .with_state(state)
}

async fn set_static_cache_control(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let mut response = next.run(request).await;

    if response.status().is_success()
        && let Some(cache_control) = cache_control_for_path(&path)
    {
        response.headers_mut().insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static(cache_control),
        );
    }

    response
}

fn cache_control_for_path(path: &str) -> Option<&'static str> {
    is_hashed_bundle_asset(path).then_some("public, max-age=31536000, immutable")
}

/// Bundler output carries a content hash in the file name, e.g. `index-3f9a1c2b.js`.
fn is_hashed_bundle_asset(path: &str) -> bool {
    let file = Path::new(path);
    let Some(ext) = file.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };
    if !matches!(ext, "js" | "css" | "wasm") {
        return false;
    }
    let Some(stem) = file.file_stem().and_then(|stem| stem.to_str()) else {
        return false;
    };

    let mut segments = stem.split(['-', '_', '.']);
    // The first segment is the chunk name, never the hash.
    segments.next();
    segments.any(is_content_hash)
}

fn is_content_hash(segment: &str) -> bool {
    segment.len() >= 8
        && segment.chars().all(|c| c.is_ascii_alphanumeric())
        && segment.chars().any(|c| c.is_ascii_digit())
}
