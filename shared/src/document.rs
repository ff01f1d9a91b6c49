use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SelectionError;
use crate::labels::LabelRegistry;
use crate::palette::{Color, Palette};
use crate::region::{Category, RegionKey};
use crate::selection::SelectionStore;

/// Version written into exported documents. Advisory on import.
pub const DOCUMENT_VERSION: &str = "1.0";

/// Portable snapshot of a selection, as saved to disk or shared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionDocument {
    pub tiles: BTreeMap<String, Color>,
    #[serde(default)]
    pub gates: BTreeMap<String, Color>,
    #[serde(default)]
    pub shrines: BTreeMap<String, Color>,
    #[serde(default)]
    pub labels: BTreeMap<Color, String>,
    pub timestamp: String,
    pub total_tiles: usize,
    pub total_gates: usize,
    pub total_shrines: usize,
    pub version: String,
}

impl SelectionDocument {
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Top-level sections of a document that carry entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Tiles,
    Gates,
    Shrines,
    Labels,
}

impl Section {
    fn name(self) -> &'static str {
        match self {
            Self::Tiles => "tiles",
            Self::Gates => "gates",
            Self::Shrines => "shrines",
            Self::Labels => "labels",
        }
    }

    fn category(self) -> Option<Category> {
        match self {
            Self::Tiles => Some(Category::Tile),
            Self::Gates => Some(Category::Gate),
            Self::Shrines => Some(Category::Shrine),
            Self::Labels => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Tile key not an unsigned integer, or an empty gate/shrine key.
    InvalidKey,
    /// Color missing from the palette.
    UnknownColor,
    /// Entry value is not a string.
    NotAString,
}

/// A single entry skipped during import. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedEntry {
    pub section: Section,
    pub key: String,
    pub reason: DropReason,
}

/// Result of a successful import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub tiles: usize,
    pub gates: usize,
    pub shrines: usize,
    pub labels: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dropped: Vec<DroppedEntry>,
    /// Colors whose restored count is above the live-toggle cap.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub over_capacity: Vec<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ImportReport {
    pub fn has_dropped(&self) -> bool {
        !self.dropped.is_empty()
    }

    pub fn accepted(&self) -> usize {
        self.tiles + self.gates + self.shrines
    }
}

/// A document that passed structural validation, ready to replace a store's state.
#[derive(Debug, Clone)]
pub struct ValidatedDocument {
    pub assignments: BTreeMap<RegionKey, Color>,
    pub labels: LabelRegistry,
    pub report: ImportReport,
}

/// Check `doc` against `palette`. Structural problems reject the whole
/// document; bad individual entries are dropped and listed in the report.
pub fn validate(doc: &Value, palette: &Palette) -> Result<ValidatedDocument, SelectionError> {
    let Some(root) = doc.as_object() else {
        return Err(SelectionError::InvalidDocument(
            "document must be a JSON object".to_owned(),
        ));
    };

    let tiles = required_section(root, Section::Tiles)?;
    let gates = optional_section(root, Section::Gates)?;
    let shrines = optional_section(root, Section::Shrines)?;
    let labels = optional_section(root, Section::Labels)?;

    let mut report = ImportReport {
        version: root
            .get("version")
            .and_then(Value::as_str)
            .map(str::to_owned),
        ..ImportReport::default()
    };
    let mut assignments = BTreeMap::new();

    for (section, entries) in [
        (Section::Tiles, Some(tiles)),
        (Section::Gates, gates),
        (Section::Shrines, shrines),
    ] {
        let Some(category) = section.category() else {
            continue;
        };
        let mut accepted = 0;
        for (raw_key, value) in entries.into_iter().flatten() {
            let Some(key) = RegionKey::parse(category, raw_key) else {
                report.record_drop(section, raw_key, DropReason::InvalidKey);
                continue;
            };
            let color = match palette_color(value, palette) {
                Ok(color) => color,
                Err(reason) => {
                    report.record_drop(section, raw_key, reason);
                    continue;
                }
            };
            assignments.insert(key, color);
            accepted += 1;
        }
        match category {
            Category::Tile => report.tiles = accepted,
            Category::Gate => report.gates = accepted,
            Category::Shrine => report.shrines = accepted,
        }
    }

    let mut label_registry = LabelRegistry::default();
    for (raw_color, value) in labels.into_iter().flatten() {
        let Ok(color) = palette.resolve(raw_color) else {
            report.record_drop(Section::Labels, raw_color, DropReason::UnknownColor);
            continue;
        };
        let Some(text) = value.as_str() else {
            report.record_drop(Section::Labels, raw_color, DropReason::NotAString);
            continue;
        };
        label_registry.set(color.clone(), text);
    }
    report.labels = label_registry.len();

    Ok(ValidatedDocument {
        assignments,
        labels: label_registry,
        report,
    })
}

fn required_section(
    root: &Map<String, Value>,
    section: Section,
) -> Result<&Map<String, Value>, SelectionError> {
    match root.get(section.name()) {
        Some(Value::Object(entries)) => Ok(entries),
        Some(_) => Err(not_an_object(section)),
        None => Err(SelectionError::InvalidDocument(format!(
            "missing `{}` object",
            section.name()
        ))),
    }
}

/// Absent or `null` sections count as empty.
fn optional_section(
    root: &Map<String, Value>,
    section: Section,
) -> Result<Option<&Map<String, Value>>, SelectionError> {
    match root.get(section.name()) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(entries)) => Ok(Some(entries)),
        Some(_) => Err(not_an_object(section)),
    }
}

fn not_an_object(section: Section) -> SelectionError {
    SelectionError::InvalidDocument(format!("`{}` must be an object", section.name()))
}

fn palette_color(value: &Value, palette: &Palette) -> Result<Color, DropReason> {
    let token = value.as_str().ok_or(DropReason::NotAString)?;
    palette
        .resolve(token)
        .cloned()
        .map_err(|_| DropReason::UnknownColor)
}

impl ImportReport {
    fn record_drop(&mut self, section: Section, key: &str, reason: DropReason) {
        self.dropped.push(DroppedEntry {
            section,
            key: key.to_owned(),
            reason,
        });
    }
}

impl SelectionStore {
    /// Document describing the current state, stamped with `now`.
    pub fn export_at(&self, now: DateTime<Utc>) -> SelectionDocument {
        let tiles = self.section(Category::Tile);
        let gates = self.section(Category::Gate);
        let shrines = self.section(Category::Shrine);

        SelectionDocument {
            total_tiles: tiles.len(),
            total_gates: gates.len(),
            total_shrines: shrines.len(),
            tiles,
            gates,
            shrines,
            labels: self
                .labels()
                .iter()
                .map(|(color, text)| (color.clone(), text.to_owned()))
                .collect(),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            version: DOCUMENT_VERSION.to_owned(),
        }
    }

    pub fn export(&self) -> SelectionDocument {
        self.export_at(Utc::now())
    }

    /// Replace the whole state with `doc`. The capacity cap is not enforced
    /// here; colors above it are listed in the report.
    pub fn import(&mut self, doc: &Value) -> Result<ImportReport, SelectionError> {
        let validated = validate(doc, self.palette())?;
        self.replace(validated.assignments, validated.labels);
        let mut report = validated.report;
        report.over_capacity = self.colors_over_capacity();
        Ok(report)
    }

    pub fn import_str(&mut self, json: &str) -> Result<ImportReport, SelectionError> {
        let doc: Value = serde_json::from_str(json)
            .map_err(|e| SelectionError::InvalidDocument(format!("malformed JSON: {e}")))?;
        self.import(&doc)
    }
}
