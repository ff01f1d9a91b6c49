mod app;
mod config;
mod error;
mod routes;
mod services;
mod state;

use std::path::Path;

use arcmap_shared::{BoardConfig, MapBoard, RegionRegistry, Sanctuaries};
use tokio::signal;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let registry = match config::registry_path() {
        Some(path) => match load_registry(&path) {
            Ok(registry) => {
                tracing::info!(path = %path.display(), "Loaded region registry");
                registry
            }
            Err(e) => {
                tracing::error!(error = %e, path = %path.display(), "failed to load region registry");
                return;
            }
        },
        None => RegionRegistry::builtin(),
    };

    let board_config = BoardConfig {
        palette: config::palette(),
        default_color_index: config::default_color_index(),
        max_per_color: config::max_per_color(),
        registry,
        sanctuaries: Sanctuaries::default(),
    };
    tracing::info!(
        colors = board_config.palette.len(),
        max_per_color = board_config.max_per_color,
        "Board configured"
    );
    let mut board = MapBoard::new(board_config);

    let save_path = config::save_path();
    if let Some(path) = save_path.as_deref() {
        match services::autosave::load(path, &mut board).await {
            Ok(Some(report)) => tracing::info!(
                path = %path.display(),
                regions = report.accepted(),
                dropped = report.dropped.len(),
                "Restored saved selection"
            ),
            Ok(None) => tracing::info!(path = %path.display(), "No saved selection yet"),
            Err(e) => {
                tracing::error!(error = %e, path = %path.display(), "failed to restore saved selection");
                return;
            }
        }
    }

    let state = AppState::new(board, save_path.clone());

    tokio::spawn(services::autosave::run(
        state.clone(),
        config::autosave_interval(),
    ));

    let app = app::build_app(state.clone());

    let addr = format!("0.0.0.0:{}", config::server_port());
    tracing::info!("Arcmap server listening on {addr}");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "failed to bind TCP listener");
            return;
        }
    };
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server failed");
    }

    if let Some(path) = save_path.as_deref() {
        services::autosave::save_if_dirty(&state, path).await;
    }

    tracing::info!("Server shut down gracefully");
}

fn load_registry(path: &Path) -> Result<RegionRegistry, String> {
    let raw = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    RegionRegistry::from_json(&raw).map_err(|e| e.to_string())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                return;
            }
        };
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
