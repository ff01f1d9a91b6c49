use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::SelectionError;
use crate::labels::LabelRegistry;
use crate::palette::{Color, Palette};
use crate::region::{Category, RegionKey, TileId};

/// Default cap on how many regions a single color may occupy.
pub const MAX_PER_COLOR: usize = 50;

/// What a successful toggle did to the clicked region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ToggleOutcome {
    /// The region now carries the requested color.
    Assigned { previous: Option<Color> },
    /// The region already carried the requested color and is now unassigned.
    Cleared { previous: Color },
}

/// Color count for one palette entry, summed across all categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorCount {
    pub color: Color,
    pub count: usize,
}

/// Authoritative region → color mapping plus the color → label registry.
///
/// Every live mutation keeps `count(color) <= max_per_color` for all colors.
/// [`SelectionStore::replace`] is the one path that skips the check, used to
/// restore saved documents.
#[derive(Debug, Clone)]
pub struct SelectionStore {
    palette: Palette,
    max_per_color: usize,
    assignments: BTreeMap<RegionKey, Color>,
    labels: LabelRegistry,
}

impl SelectionStore {
    pub fn new(palette: Palette) -> Self {
        Self::with_capacity(palette, MAX_PER_COLOR)
    }

    pub fn with_capacity(palette: Palette, max_per_color: usize) -> Self {
        Self {
            palette,
            max_per_color,
            assignments: BTreeMap::new(),
            labels: LabelRegistry::default(),
        }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn max_per_color(&self) -> usize {
        self.max_per_color
    }

    /// Click semantics: same color deselects, anything else assigns if the
    /// color still has room.
    pub fn toggle(&mut self, key: RegionKey, color: &str) -> Result<ToggleOutcome, SelectionError> {
        let color = self.palette.resolve(color)?.clone();

        if self.assignments.get(&key) == Some(&color) {
            self.assignments.remove(&key);
            return Ok(ToggleOutcome::Cleared { previous: color });
        }

        // The key's current color (if any) differs from `color`, so it never
        // contributes to this count.
        if self.count(&color) >= self.max_per_color {
            return Err(SelectionError::CapacityExceeded {
                color,
                max: self.max_per_color,
            });
        }

        let previous = self.assignments.insert(key, color);
        Ok(ToggleOutcome::Assigned { previous })
    }

    pub fn color_of(&self, key: &RegionKey) -> Option<&Color> {
        self.assignments.get(key)
    }

    pub fn tile_color(&self, id: TileId) -> Option<&Color> {
        self.assignments.get(&RegionKey::Tile(id))
    }

    /// Regions currently carrying `color`, across every category.
    pub fn count(&self, color: &Color) -> usize {
        self.assignments.values().filter(|c| *c == color).count()
    }

    /// Per-color totals for every palette entry, in palette order.
    pub fn counts(&self) -> Vec<ColorCount> {
        self.palette
            .colors()
            .iter()
            .map(|color| ColorCount {
                color: color.clone(),
                count: self.count(color),
            })
            .collect()
    }

    pub fn count_in(&self, category: Category) -> usize {
        self.assignments(category).count()
    }

    /// Assignments of one category in key order.
    pub fn assignments(&self, category: Category) -> impl Iterator<Item = (&RegionKey, &Color)> {
        self.assignments
            .iter()
            .filter(move |(key, _)| key.category() == category)
    }

    /// One category's assignments keyed by their wire form.
    pub fn section(&self, category: Category) -> BTreeMap<String, Color> {
        self.assignments(category)
            .map(|(key, color)| (key.key_string(), color.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn set_label(&mut self, color: &str, text: &str) -> Result<(), SelectionError> {
        let color = self.palette.resolve(color)?.clone();
        self.labels.set(color, text);
        Ok(())
    }

    pub fn label(&self, color: &Color) -> &str {
        self.labels.get(color)
    }

    pub fn labels(&self) -> &LabelRegistry {
        &self.labels
    }

    /// Forget every assignment and every label.
    pub fn clear_all(&mut self) {
        self.assignments.clear();
        self.labels.clear();
    }

    /// Swap in a complete state wholesale, bypassing the capacity cap.
    pub(crate) fn replace(&mut self, assignments: BTreeMap<RegionKey, Color>, labels: LabelRegistry) {
        self.assignments = assignments;
        self.labels = labels;
    }

    /// Palette colors whose count is above the cap (only reachable through imports).
    pub fn colors_over_capacity(&self) -> Vec<Color> {
        self.counts()
            .into_iter()
            .filter(|c| c.count > self.max_per_color)
            .map(|c| c.color)
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use proptest::prelude::*;

    use super::*;

    const CRIMSON: &str = "#DC143C";
    const BLUE: &str = "#1E90FF";

    fn store() -> SelectionStore {
        SelectionStore::new(Palette::default())
    }

    #[test]
    fn toggle_assigns_then_deselects() {
        let mut store = store();
        let outcome = store
            .toggle(RegionKey::Tile(1), CRIMSON)
            .expect("first toggle assigns");
        assert_eq!(outcome, ToggleOutcome::Assigned { previous: None });
        assert_eq!(store.tile_color(1).map(Color::as_str), Some(CRIMSON));

        let outcome = store
            .toggle(RegionKey::Tile(1), CRIMSON)
            .expect("second toggle clears");
        assert_eq!(
            outcome,
            ToggleOutcome::Cleared {
                previous: Color::new(CRIMSON)
            }
        );
        assert_eq!(store.tile_color(1), None);
        assert!(store.is_empty());
    }

    #[test]
    fn toggle_is_idempotent_for_every_category() {
        let keys = [
            RegionKey::Tile(9),
            RegionKey::Gate("gate1".to_string()),
            RegionKey::Shrine("shrine2".to_string()),
        ];
        for key in keys {
            let mut store = store();
            store.toggle(key.clone(), BLUE).expect("assign");
            store.toggle(key.clone(), BLUE).expect("clear");
            assert_eq!(store.color_of(&key), None, "{key} should be unassigned");
        }
    }

    #[test]
    fn assigning_a_new_color_replaces_the_old_one() {
        let mut store = store();
        store.toggle(RegionKey::Tile(4), CRIMSON).expect("crimson");
        let outcome = store.toggle(RegionKey::Tile(4), BLUE).expect("blue");

        assert_eq!(
            outcome,
            ToggleOutcome::Assigned {
                previous: Some(Color::new(CRIMSON))
            }
        );
        assert_eq!(store.count(&Color::new(CRIMSON)), 0);
        assert_eq!(store.count(&Color::new(BLUE)), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn capacity_boundary_rejects_third_region() {
        let mut store = SelectionStore::with_capacity(Palette::default(), 2);
        store.toggle(RegionKey::Tile(1), CRIMSON).expect("tile 1");
        store.toggle(RegionKey::Tile(2), CRIMSON).expect("tile 2");

        let err = store
            .toggle(RegionKey::Tile(3), CRIMSON)
            .expect_err("third tile exceeds cap");
        assert_eq!(
            err,
            SelectionError::CapacityExceeded {
                color: Color::new(CRIMSON),
                max: 2
            }
        );
        assert_eq!(store.count(&Color::new(CRIMSON)), 2);
        assert_eq!(store.tile_color(3), None);
    }

    #[test]
    fn capacity_is_shared_across_categories() {
        let mut store = SelectionStore::with_capacity(Palette::default(), 2);
        store.toggle(RegionKey::Tile(1), CRIMSON).expect("tile");
        store
            .toggle(RegionKey::Gate("gate1".to_string()), CRIMSON)
            .expect("gate");

        let shrine = RegionKey::Shrine("shrine1".to_string());
        assert!(store.toggle(shrine.clone(), CRIMSON).is_err());
        assert_eq!(store.color_of(&shrine), None);
    }

    #[test]
    fn recoloring_a_full_colors_region_frees_a_slot() {
        let mut store = SelectionStore::with_capacity(Palette::default(), 1);
        store.toggle(RegionKey::Tile(1), CRIMSON).expect("crimson tile 1");
        store.toggle(RegionKey::Tile(1), BLUE).expect("recolor to blue");
        store
            .toggle(RegionKey::Tile(2), CRIMSON)
            .expect("crimson has room again");
    }

    #[test]
    fn deselect_always_succeeds_at_capacity() {
        let mut store = SelectionStore::with_capacity(Palette::default(), 1);
        store.toggle(RegionKey::Tile(1), CRIMSON).expect("assign");
        store.toggle(RegionKey::Tile(1), CRIMSON).expect("deselect at cap");
    }

    #[test]
    fn toggle_rejects_colors_outside_palette() {
        let mut store = store();
        let err = store
            .toggle(RegionKey::Tile(1), "#000001")
            .expect_err("foreign color");
        assert_eq!(err, SelectionError::InvalidColor("#000001".to_string()));
        assert!(store.is_empty());
    }

    #[test]
    fn counts_cover_every_palette_color_in_order() {
        let mut store = store();
        store.toggle(RegionKey::Tile(1), BLUE).expect("tile");
        store
            .toggle(RegionKey::Shrine("shrine1".to_string()), BLUE)
            .expect("shrine");

        let counts = store.counts();
        assert_eq!(counts.len(), Palette::default().len());
        assert_eq!(counts[0].color.as_str(), CRIMSON);
        assert_eq!(counts[0].count, 0);
        assert_eq!(counts[1].count, 2);
        assert_eq!(store.count_in(Category::Tile), 1);
        assert_eq!(store.count_in(Category::Shrine), 1);
        assert_eq!(store.count_in(Category::Gate), 0);
    }

    #[test]
    fn clear_all_resets_assignments_and_labels() {
        let mut store = store();
        store.toggle(RegionKey::Tile(1), CRIMSON).expect("tile");
        store
            .toggle(RegionKey::Gate("gate2".to_string()), BLUE)
            .expect("gate");
        store.set_label(CRIMSON, "Red").expect("label");

        store.clear_all();

        assert!(store.counts().iter().all(|c| c.count == 0));
        assert_eq!(store.tile_color(1), None);
        assert_eq!(store.color_of(&RegionKey::Gate("gate2".to_string())), None);
        assert_eq!(store.label(&Color::new(CRIMSON)), "");
    }

    #[test]
    fn labels_are_independent_of_assignments() {
        let mut store = store();
        store.toggle(RegionKey::Tile(5), CRIMSON).expect("tile");
        store.set_label(CRIMSON, "North team").expect("label");
        store.set_label(CRIMSON, "").expect("unset label");

        assert_eq!(store.tile_color(5).map(Color::as_str), Some(CRIMSON));
        assert_eq!(
            store.set_label("#ABCDEF", "nope"),
            Err(SelectionError::InvalidColor("#ABCDEF".to_string()))
        );
    }

    /// One user action against a store.
    #[derive(Debug, Clone)]
    pub(crate) enum Op {
        Toggle(RegionKey, usize),
        Label(usize, String),
        Clear,
    }

    /// Few regions and few colors, so sequences hit the cap and reassign often.
    fn arb_key() -> impl Strategy<Value = RegionKey> {
        prop_oneof![
            (1u32..=12).prop_map(RegionKey::Tile),
            (1u32..=4).prop_map(|n| RegionKey::Gate(format!("gate{n}"))),
            (1u32..=3).prop_map(|n| RegionKey::Shrine(format!("shrine{n}"))),
        ]
    }

    pub(crate) fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
        let op = prop_oneof![
            8 => (arb_key(), 0usize..3).prop_map(|(key, color)| Op::Toggle(key, color)),
            2 => (0usize..3, "[a-zA-Z ]{0,8}").prop_map(|(color, text)| Op::Label(color, text)),
            1 => Just(Op::Clear),
        ];
        prop::collection::vec(op, 0..120)
    }

    /// Apply `op`; the only acceptable failure is a capacity rejection.
    pub(crate) fn apply(store: &mut SelectionStore, op: &Op) -> Result<(), TestCaseError> {
        let palette = store.palette().clone();
        match op {
            Op::Toggle(key, color) => {
                let color = &palette.colors()[*color];
                match store.toggle(key.clone(), color.as_str()) {
                    Ok(_) => {}
                    Err(SelectionError::CapacityExceeded { max, .. }) => {
                        prop_assert_eq!(max, store.max_per_color());
                        prop_assert_eq!(store.count(color), max);
                    }
                    Err(e) => return Err(TestCaseError::fail(format!("unexpected error: {e}"))),
                }
            }
            Op::Label(color, text) => {
                let color = &palette.colors()[*color];
                prop_assert!(store.set_label(color.as_str(), text).is_ok());
            }
            Op::Clear => store.clear_all(),
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn capacity_holds_after_any_sequence(ops in arb_ops()) {
            let mut store = SelectionStore::with_capacity(Palette::default(), 3);
            for op in &ops {
                apply(&mut store, op)?;
                for ColorCount { color, count } in store.counts() {
                    prop_assert!(count <= 3, "{color} holds {count} regions");
                }
                let total: usize = store.counts().iter().map(|c| c.count).sum();
                prop_assert_eq!(total, store.len());
            }
        }
    }
}
