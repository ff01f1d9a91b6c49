use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::colors::legend_text_color;
use crate::document::{ImportReport, SelectionDocument};
use crate::error::SelectionError;
use crate::events::RegionChange;
use crate::palette::{Color, ColorPicker, DEFAULT_ACTIVE_INDEX, Palette};
use crate::region::{Category, RegionClick, RegionKey, RegionRegistry, TileId};
use crate::sanctuary::Sanctuaries;
use crate::selection::{ColorCount, MAX_PER_COLOR, SelectionStore, ToggleOutcome};

/// Everything needed to build a [`MapBoard`].
#[derive(Debug, Clone)]
pub struct BoardConfig {
    pub palette: Palette,
    pub default_color_index: usize,
    pub max_per_color: usize,
    pub registry: RegionRegistry,
    pub sanctuaries: Sanctuaries,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            palette: Palette::default(),
            default_color_index: DEFAULT_ACTIVE_INDEX,
            max_per_color: MAX_PER_COLOR,
            registry: RegionRegistry::builtin(),
            sanctuaries: Sanctuaries::default(),
        }
    }
}

/// Result of routing one click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickResult {
    pub change: RegionChange,
    pub outcome: ToggleOutcome,
}

/// One legend row per palette color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendRow {
    pub color: Color,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    pub count: usize,
    pub points: u32,
    pub text_color: String,
}

/// Read model handed to renderers: assignments, labels and the legend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub tiles: BTreeMap<String, Color>,
    pub gates: BTreeMap<String, Color>,
    pub shrines: BTreeMap<String, Color>,
    pub labels: BTreeMap<Color, String>,
    pub active_color: Color,
    pub max_per_color: usize,
    pub legend: Vec<LegendRow>,
}

/// Sanctuary with its current owners, for scoreboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanctuaryStanding {
    pub key: String,
    pub name: String,
    pub tile_ids: Vec<TileId>,
    pub points: u32,
    pub owners: Vec<Color>,
}

/// The single owned selection state of one map, shared by every front-end.
#[derive(Debug, Clone)]
pub struct MapBoard {
    registry: Arc<RegionRegistry>,
    sanctuaries: Arc<Sanctuaries>,
    picker: ColorPicker,
    store: SelectionStore,
}

impl MapBoard {
    pub fn new(config: BoardConfig) -> Self {
        Self {
            registry: Arc::new(config.registry),
            sanctuaries: Arc::new(config.sanctuaries),
            picker: ColorPicker::new(config.palette.clone(), config.default_color_index),
            store: SelectionStore::with_capacity(config.palette, config.max_per_color),
        }
    }

    pub fn palette(&self) -> &Palette {
        self.picker.palette()
    }

    pub fn registry(&self) -> &RegionRegistry {
        &self.registry
    }

    pub fn store(&self) -> &SelectionStore {
        &self.store
    }

    pub fn active_color(&self) -> &Color {
        self.picker.active_color()
    }

    pub fn set_active_color(&mut self, token: &str) -> Result<&Color, SelectionError> {
        self.picker.set_active_color(token)
    }

    /// Route a click to a toggle with the active color.
    pub fn click(&mut self, click: &RegionClick) -> Result<ClickResult, SelectionError> {
        let key = click.region_key()?;
        let color = self.active_color().clone();
        self.toggle(key, &color)
    }

    /// Toggle `key` with an explicit color. Keys missing from the registry are refused.
    pub fn toggle(&mut self, key: RegionKey, color: &Color) -> Result<ClickResult, SelectionError> {
        if !self.registry.contains(&key) {
            return Err(SelectionError::UnknownRegion {
                category: key.category(),
                key: key.key_string(),
            });
        }
        let outcome = self.store.toggle(key.clone(), color.as_str())?;
        let current = match &outcome {
            ToggleOutcome::Assigned { .. } => Some(color.clone()),
            ToggleOutcome::Cleared { .. } => None,
        };
        Ok(ClickResult {
            change: RegionChange::new(&key, current),
            outcome,
        })
    }

    pub fn color_of(&self, key: &RegionKey) -> Option<&Color> {
        self.store.color_of(key)
    }

    pub fn counts(&self) -> Vec<ColorCount> {
        self.store.counts()
    }

    pub fn set_label(&mut self, color: &str, text: &str) -> Result<(), SelectionError> {
        self.store.set_label(color, text)
    }

    pub fn label(&self, color: &Color) -> &str {
        self.store.label(color)
    }

    /// Label to print on a tile: its color's label, when one is set.
    pub fn tile_label(&self, id: TileId) -> Option<&str> {
        let color = self.store.tile_color(id)?;
        let label = self.store.label(color);
        (!label.trim().is_empty()).then_some(label)
    }

    /// Fill a renderer should use for a tile: its color, or the registry default.
    pub fn tile_fill(&self, id: TileId) -> Option<&str> {
        self.store
            .tile_color(id)
            .map(Color::as_str)
            .or_else(|| self.registry.tile(id).map(|t| t.default_fill.as_str()))
    }

    pub fn clear_all(&mut self) {
        self.store.clear_all();
    }

    pub fn points_for_color(&self, color: &Color) -> u32 {
        self.sanctuaries.points_for_color(&self.store, color)
    }

    pub fn sanctuary_standings(&self) -> Vec<SanctuaryStanding> {
        self.sanctuaries
            .list()
            .iter()
            .map(|s| SanctuaryStanding {
                key: s.key.clone(),
                name: s.name.clone(),
                tile_ids: s.tile_ids.clone(),
                points: s.points,
                owners: s.owners(&self.store),
            })
            .collect()
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        let legend = self
            .store
            .counts()
            .into_iter()
            .map(|ColorCount { color, count }| LegendRow {
                label: self.store.label(&color).to_owned(),
                points: self.points_for_color(&color),
                text_color: legend_text_color(color.as_str()).to_owned(),
                count,
                color,
            })
            .collect();

        BoardSnapshot {
            tiles: self.store.section(Category::Tile),
            gates: self.store.section(Category::Gate),
            shrines: self.store.section(Category::Shrine),
            labels: self
                .store
                .labels()
                .iter()
                .map(|(c, t)| (c.clone(), t.to_owned()))
                .collect(),
            active_color: self.active_color().clone(),
            max_per_color: self.store.max_per_color(),
            legend,
        }
    }

    pub fn export_at(&self, now: DateTime<Utc>) -> SelectionDocument {
        self.store.export_at(now)
    }

    pub fn export(&self) -> SelectionDocument {
        self.store.export()
    }

    /// Replace the selection with a document. Regions outside the registry
    /// are kept as-is; the document is the authority on what was saved.
    pub fn import(&mut self, doc: &Value) -> Result<ImportReport, SelectionError> {
        self.store.import(doc)
    }

    pub fn import_str(&mut self, json: &str) -> Result<ImportReport, SelectionError> {
        self.store.import_str(json)
    }
}

impl Default for MapBoard {
    fn default() -> Self {
        Self::new(BoardConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CRIMSON: &str = "#DC143C";

    fn crimson_board() -> MapBoard {
        let mut board = MapBoard::default();
        board.set_active_color(CRIMSON).expect("palette color");
        board
    }

    #[test]
    fn click_uses_the_active_color() {
        let mut board = crimson_board();
        let result = board.click(&RegionClick::tile(1)).expect("click tile 1");

        assert_eq!(result.change.category, Category::Tile);
        assert_eq!(result.change.key, "1");
        assert_eq!(result.change.color, Some(Color::new(CRIMSON)));
        assert_eq!(
            board.color_of(&RegionKey::Tile(1)).map(Color::as_str),
            Some(CRIMSON)
        );

        let result = board.click(&RegionClick::tile(1)).expect("click again");
        assert_eq!(result.change.color, None);
        assert_eq!(board.color_of(&RegionKey::Tile(1)), None);
    }

    #[test]
    fn clicks_outside_the_registry_are_rejected() {
        let mut board = crimson_board();
        assert_eq!(
            board.click(&RegionClick::tile(999)),
            Err(SelectionError::UnknownRegion {
                category: Category::Tile,
                key: "999".to_string(),
            })
        );
        assert!(board.click(&RegionClick::gate("gate99")).is_err());
        assert!(board.store().is_empty());
    }

    #[test]
    fn tile_label_follows_the_tile_color() {
        let mut board = crimson_board();
        board.click(&RegionClick::tile(3)).expect("click");
        assert_eq!(board.tile_label(3), None);

        board.set_label(CRIMSON, "Raiders").expect("label");
        assert_eq!(board.tile_label(3), Some("Raiders"));
        assert_eq!(board.tile_label(4), None);
    }

    #[test]
    fn tile_fill_falls_back_to_registry_default() {
        let mut board = crimson_board();
        board.click(&RegionClick::tile(2)).expect("click");
        assert_eq!(board.tile_fill(2), Some(CRIMSON));
        assert_eq!(board.tile_fill(5), Some(crate::region::DEFAULT_TILE_FILL));
        assert_eq!(board.tile_fill(500), None);
    }

    #[test]
    fn snapshot_carries_legend_with_counts_labels_and_points() {
        let mut board = crimson_board();
        board.click(&RegionClick::tile(1)).expect("north sanctuary tile");
        board.click(&RegionClick::shrine("shrine1")).expect("shrine");
        board.set_label(CRIMSON, "Red").expect("label");

        let snapshot = board.snapshot();
        assert_eq!(snapshot.active_color.as_str(), CRIMSON);
        assert_eq!(snapshot.tiles.get("1").map(Color::as_str), Some(CRIMSON));
        assert_eq!(
            snapshot.shrines.get("shrine1").map(Color::as_str),
            Some(CRIMSON)
        );
        assert_eq!(snapshot.max_per_color, MAX_PER_COLOR);

        let row = &snapshot.legend[0];
        assert_eq!(row.color.as_str(), CRIMSON);
        assert_eq!(row.label, "Red");
        assert_eq!(row.count, 2);
        assert_eq!(row.points, 1500);
        assert_eq!(row.text_color, "#FFFFFF");
        assert_eq!(snapshot.legend.len(), board.palette().len());
    }

    #[test]
    fn sanctuary_standings_list_owners() {
        let mut board = crimson_board();
        board.click(&RegionClick::tile(41)).expect("south tile");

        let standings = board.sanctuary_standings();
        assert_eq!(standings.len(), 2);
        assert!(standings[0].owners.is_empty());
        assert_eq!(standings[1].key, "south");
        assert_eq!(standings[1].owners, vec![Color::new(CRIMSON)]);
    }

    #[test]
    fn reset_is_complete() {
        let mut board = crimson_board();
        board.click(&RegionClick::tile(1)).expect("tile");
        board.click(&RegionClick::gate("gate1")).expect("gate");
        board.set_label(CRIMSON, "Red").expect("label");

        board.clear_all();

        assert!(board.counts().iter().all(|c| c.count == 0));
        assert_eq!(board.color_of(&RegionKey::Tile(1)), None);
        assert_eq!(board.color_of(&RegionKey::Gate("gate1".to_string())), None);
        assert_eq!(board.label(&Color::new(CRIMSON)), "");
        assert_eq!(board.points_for_color(&Color::new(CRIMSON)), 0);
    }

    #[test]
    fn capacity_invariant_holds_over_many_clicks() {
        let mut board = MapBoard::new(BoardConfig {
            max_per_color: 5,
            ..BoardConfig::default()
        });
        board.set_active_color(CRIMSON).expect("palette color");

        let mut rejected = 0;
        for id in 1..=20 {
            if board.click(&RegionClick::tile(id)).is_err() {
                rejected += 1;
            }
            for count in board.counts() {
                assert!(count.count <= 5, "{} exceeded the cap", count.color);
            }
        }
        assert_eq!(rejected, 15);
    }

    #[test]
    fn import_round_trip_through_json_text() {
        let mut board = crimson_board();
        board.click(&RegionClick::tile(7)).expect("tile");
        board.click(&RegionClick::gate("gate2")).expect("gate");
        board.set_label(CRIMSON, "Red").expect("label");
        let json = serde_json::to_string(&board.export()).expect("serialize document");

        let mut restored = MapBoard::default();
        let report = restored.import_str(&json).expect("import");

        assert_eq!(report.accepted(), 2);
        assert_eq!(restored.snapshot().tiles, board.snapshot().tiles);
        assert_eq!(restored.snapshot().gates, board.snapshot().gates);
        assert_eq!(restored.snapshot().labels, board.snapshot().labels);
    }
}
