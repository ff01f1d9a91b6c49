use serde::{Deserialize, Serialize};

use crate::palette::Color;
use crate::region::TileId;
use crate::selection::SelectionStore;

/// A group of tiles worth bonus points to any color holding at least one of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sanctuary {
    pub key: String,
    pub name: String,
    pub tile_ids: Vec<TileId>,
    pub points: u32,
}

impl Sanctuary {
    /// True when `color` holds any tile of this sanctuary.
    pub fn is_owned_by(&self, store: &SelectionStore, color: &Color) -> bool {
        self.tile_ids
            .iter()
            .any(|id| store.tile_color(*id) == Some(color))
    }

    /// Every palette color that owns this sanctuary. Ownership is not
    /// exclusive: a sanctuary spanning several tiles can have several owners.
    pub fn owners(&self, store: &SelectionStore) -> Vec<Color> {
        store
            .palette()
            .colors()
            .iter()
            .filter(|color| self.is_owned_by(store, color))
            .cloned()
            .collect()
    }
}

/// Ordered set of sanctuary definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanctuaries {
    regions: Vec<Sanctuary>,
}

impl Sanctuaries {
    pub fn new(regions: Vec<Sanctuary>) -> Self {
        Self { regions }
    }

    pub fn list(&self) -> &[Sanctuary] {
        &self.regions
    }

    /// Points earned by `color`, recomputed from the current tile assignments.
    pub fn points_for_color(&self, store: &SelectionStore, color: &Color) -> u32 {
        self.regions
            .iter()
            .filter(|s| s.is_owned_by(store, color))
            .map(|s| s.points)
            .sum()
    }
}

impl Default for Sanctuaries {
    fn default() -> Self {
        Self::new(vec![
            Sanctuary {
                key: "north".to_owned(),
                name: "Northern Sanctuary".to_owned(),
                tile_ids: vec![1],
                points: 1500,
            },
            Sanctuary {
                key: "south".to_owned(),
                name: "Southern Sanctuary".to_owned(),
                tile_ids: vec![41],
                points: 1500,
            },
        ])
    }
}
