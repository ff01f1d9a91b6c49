use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use arcmap_shared::{BoardEvent, BoardSnapshot, MapBoard, RegionChange};
use bytes::Bytes;
use tokio::sync::{RwLock, broadcast};
use tracing::warn;

use crate::config::sse_broadcast_buffer;

/// SSE event serialized once per change and shared by every client through an Arc.
#[derive(Debug, Clone)]
pub enum PreSerializedEvent {
    Snapshot { seq: u64, json: Arc<Bytes> },
    Update { seq: u64, json: Arc<Bytes> },
}

#[derive(Clone)]
pub struct AppState {
    /// The one board every front-end reads and mutates. Mutations hold the
    /// write guard across their whole read-check-write sequence.
    pub board: Arc<RwLock<MapBoard>>,
    pub next_seq: Arc<AtomicU64>,
    /// Distinguishes this process's sequence numbers from a previous run's.
    pub boot_id: Arc<str>,
    pub event_tx: broadcast::Sender<PreSerializedEvent>,
    /// Set on every mutation, cleared by the autosave service after a write.
    pub dirty: Arc<AtomicBool>,
    /// Autosave target. None disables persistence.
    pub save_path: Option<PathBuf>,
    pub observability: Arc<ObservabilityCounters>,
}

#[derive(Debug, Default)]
pub struct ObservabilityCounters {
    clicks_total: AtomicU64,
    capacity_rejections_total: AtomicU64,
    invalid_requests_total: AtomicU64,
    imports_total: AtomicU64,
    import_rejections_total: AtomicU64,
    import_dropped_entries_total: AtomicU64,
    autosaves_total: AtomicU64,
    autosave_failures_total: AtomicU64,
}

#[derive(Debug, Clone, Copy)]
pub struct ObservabilitySnapshot {
    pub clicks_total: u64,
    pub capacity_rejections_total: u64,
    pub invalid_requests_total: u64,
    pub imports_total: u64,
    pub import_rejections_total: u64,
    pub import_dropped_entries_total: u64,
    pub autosaves_total: u64,
    pub autosave_failures_total: u64,
}

impl ObservabilityCounters {
    pub fn snapshot(&self) -> ObservabilitySnapshot {
        ObservabilitySnapshot {
            clicks_total: self.clicks_total.load(Ordering::Relaxed),
            capacity_rejections_total: self.capacity_rejections_total.load(Ordering::Relaxed),
            invalid_requests_total: self.invalid_requests_total.load(Ordering::Relaxed),
            imports_total: self.imports_total.load(Ordering::Relaxed),
            import_rejections_total: self.import_rejections_total.load(Ordering::Relaxed),
            import_dropped_entries_total: self
                .import_dropped_entries_total
                .load(Ordering::Relaxed),
            autosaves_total: self.autosaves_total.load(Ordering::Relaxed),
            autosave_failures_total: self.autosave_failures_total.load(Ordering::Relaxed),
        }
    }

    pub fn record_click(&self) {
        self.clicks_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_capacity_rejection(&self) {
        self.capacity_rejections_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalid_request(&self) {
        self.invalid_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_import(&self, dropped_entries: u64) {
        self.imports_total.fetch_add(1, Ordering::Relaxed);
        self.import_dropped_entries_total
            .fetch_add(dropped_entries, Ordering::Relaxed);
    }

    pub fn record_import_rejection(&self) {
        self.import_rejections_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_autosave(&self) {
        self.autosaves_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_autosave_failure(&self) {
        self.autosave_failures_total
            .fetch_add(1, Ordering::Relaxed);
    }
}

impl AppState {
    pub fn new(board: MapBoard, save_path: Option<PathBuf>) -> Self {
        let (event_tx, _) = broadcast::channel(sse_broadcast_buffer());
        Self {
            board: Arc::new(RwLock::new(board)),
            next_seq: Arc::new(AtomicU64::new(0)),
            boot_id: boot_id().into(),
            event_tx,
            dirty: Arc::new(AtomicBool::new(false)),
            save_path,
            observability: Arc::new(ObservabilityCounters::default()),
        }
    }

    pub fn current_seq(&self) -> u64 {
        self.next_seq.load(Ordering::Relaxed)
    }

    /// Mark the board changed and push per-region changes to subscribers.
    pub fn publish_update(&self, changes: Vec<RegionChange>) {
        let seq = self.bump();
        let event = BoardEvent::Update { seq, changes };
        if let Some(json) = serialize_event(&event) {
            // No receivers is the normal idle case.
            let _ = self
                .event_tx
                .send(PreSerializedEvent::Update { seq, json });
        }
    }

    /// Mark the board changed and push a full snapshot to subscribers.
    pub fn publish_snapshot(&self, board: BoardSnapshot) {
        let seq = self.bump();
        let event = BoardEvent::Snapshot { seq, board };
        if let Some(json) = serialize_event(&event) {
            let _ = self
                .event_tx
                .send(PreSerializedEvent::Snapshot { seq, json });
        }
    }

    fn bump(&self) -> u64 {
        self.dirty.store(true, Ordering::Relaxed);
        self.next_seq.fetch_add(1, Ordering::Relaxed) + 1
    }
}

fn boot_id() -> String {
    let now = chrono::Utc::now();
    format!("{:x}", now.timestamp_nanos_opt().unwrap_or(now.timestamp_micros()))
}

pub fn serialize_event(event: &BoardEvent) -> Option<Arc<Bytes>> {
    match serde_json::to_vec(event) {
        Ok(json) => Some(Arc::new(Bytes::from(json))),
        Err(e) => {
            warn!(error = %e, seq = event.seq(), "failed to serialize board event");
            None
        }
    }
}
