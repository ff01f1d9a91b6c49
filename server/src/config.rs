use std::path::PathBuf;
use std::time::Duration;

use arcmap_shared::palette::DEFAULT_ACTIVE_INDEX;
use arcmap_shared::{MAX_PER_COLOR, Palette};
use tracing::warn;

pub const DEFAULT_SERVER_PORT: u16 = 3000;
pub const DEFAULT_STATIC_DIR: &str = "client/dist";
pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_BROADCAST_BUFFER: usize = 256;
pub const SSE_KEEPALIVE_SECS: u64 = 15;

pub fn server_port() -> u16 {
    std::env::var("ARCMAP_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_SERVER_PORT)
}

pub fn max_per_color() -> usize {
    std::env::var("ARCMAP_MAX_PER_COLOR")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(MAX_PER_COLOR)
}

pub fn default_color_index() -> usize {
    std::env::var("ARCMAP_DEFAULT_COLOR_INDEX")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(DEFAULT_ACTIVE_INDEX)
}

/// Configured palette, or the built-in one when unset or invalid.
pub fn palette() -> Palette {
    let Ok(raw) = std::env::var("ARCMAP_PALETTE") else {
        return Palette::default();
    };
    match Palette::parse_list(&raw) {
        Ok(palette) => palette,
        Err(e) => {
            warn!(error = %e, "ignoring ARCMAP_PALETTE, using built-in palette");
            Palette::default()
        }
    }
}

pub fn registry_path() -> Option<PathBuf> {
    non_empty_path("ARCMAP_REGISTRY_PATH")
}

pub fn save_path() -> Option<PathBuf> {
    non_empty_path("ARCMAP_SAVE_PATH")
}

pub fn static_dir() -> PathBuf {
    non_empty_path("ARCMAP_STATIC_DIR").unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR))
}

pub fn autosave_interval() -> Duration {
    std::env::var("ARCMAP_AUTOSAVE_INTERVAL_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_AUTOSAVE_INTERVAL_SECS))
}

pub fn sse_broadcast_buffer() -> usize {
    std::env::var("SSE_BROADCAST_BUFFER")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_BROADCAST_BUFFER)
}

fn non_empty_path(var: &str) -> Option<PathBuf> {
    std::env::var(var)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}
