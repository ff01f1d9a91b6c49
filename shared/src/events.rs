use serde::{Deserialize, Serialize};

use crate::board::BoardSnapshot;
use crate::palette::Color;
use crate::region::{Category, RegionKey};

/// Change pushed to connected front-ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoardEvent {
    /// Full state; sent on connect and after bulk changes (labels, import, clear).
    Snapshot {
        #[serde(default)]
        seq: u64,
        board: BoardSnapshot,
    },
    /// Individual region recolors.
    Update {
        #[serde(default)]
        seq: u64,
        changes: Vec<RegionChange>,
    },
}

impl BoardEvent {
    pub fn seq(&self) -> u64 {
        match self {
            Self::Snapshot { seq, .. } | Self::Update { seq, .. } => *seq,
        }
    }
}

/// New color of one region; `None` means it was deselected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionChange {
    pub category: Category,
    pub key: String,
    pub color: Option<Color>,
}

impl RegionChange {
    pub fn new(key: &RegionKey, color: Option<Color>) -> Self {
        Self {
            category: key.category(),
            key: key.key_string(),
            color,
        }
    }
}
