use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::time::Duration;

use arcmap_shared::{ImportReport, MapBoard, SelectionError};
use tracing::{info, warn};

use crate::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize selection document: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Document(#[from] SelectionError),
}

/// Writes the selection document to the save path whenever the board changed
/// since the last write.
pub async fn run(state: AppState, interval: Duration) {
    let Some(path) = state.save_path.clone() else {
        warn!("autosave disabled: no save path configured");
        return;
    };

    info!(
        path = %path.display(),
        interval_secs = interval.as_secs(),
        "Autosave service started"
    );

    let mut interval = tokio::time::interval(interval);
    // The first tick fires immediately and there is nothing new to save yet.
    interval.tick().await;

    loop {
        interval.tick().await;
        save_if_dirty(&state, &path).await;
    }
}

/// Returns true when a document was written.
pub async fn save_if_dirty(state: &AppState, path: &Path) -> bool {
    if !state.dirty.swap(false, Ordering::Relaxed) {
        return false;
    }

    match save(state, path).await {
        Ok(bytes) => {
            state.observability.record_autosave();
            info!(path = %path.display(), bytes, "Saved selection document");
            true
        }
        Err(e) => {
            // Retry on the next tick.
            state.dirty.store(true, Ordering::Relaxed);
            state.observability.record_autosave_failure();
            warn!(error = %e, "autosave failed");
            false
        }
    }
}

/// Export the board and replace `path` atomically. Returns the bytes written.
pub async fn save(state: &AppState, path: &Path) -> Result<usize, PersistError> {
    let document = state.board.read().await.export();
    let json = serde_json::to_vec_pretty(&document)?;

    let tmp_path = temp_path_for(path);
    tokio::fs::write(&tmp_path, &json)
        .await
        .map_err(|source| PersistError::Io {
            path: tmp_path.clone(),
            source,
        })?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|source| PersistError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(json.len())
}

/// Restore a previously saved document. A missing file is not an error and
/// yields `Ok(None)`.
pub async fn load(path: &Path, board: &mut MapBoard) -> Result<Option<ImportReport>, PersistError> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(PersistError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let report = board.import_str(&raw)?;
    for entry in &report.dropped {
        warn!(
            section = ?entry.section,
            key = %entry.key,
            reason = ?entry.reason,
            "dropped entry from saved selection"
        );
    }
    Ok(Some(report))
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
