use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SelectionError;

pub type TileId = u32;

/// Fill used for tiles that do not declare their own.
pub const DEFAULT_TILE_FILL: &str = "#8B6034";

/// The three region namespaces on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Tile,
    Gate,
    Shrine,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Tile, Category::Gate, Category::Shrine];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tile => "tile",
            Self::Gate => "gate",
            Self::Shrine => "shrine",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a single region: its category plus a category-scoped key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RegionKey {
    Tile(TileId),
    Gate(String),
    Shrine(String),
}

impl RegionKey {
    pub fn category(&self) -> Category {
        match self {
            Self::Tile(_) => Category::Tile,
            Self::Gate(_) => Category::Gate,
            Self::Shrine(_) => Category::Shrine,
        }
    }

    /// The key as it appears in documents and on the wire.
    pub fn key_string(&self) -> String {
        match self {
            Self::Tile(id) => id.to_string(),
            Self::Gate(id) | Self::Shrine(id) => id.clone(),
        }
    }

    /// Build a key from its textual form. Tile keys must be unsigned integers,
    /// gate and shrine keys must be non-empty.
    /// Tile keys must be in canonical decimal form, so `"01"` and `"+1"` are
    /// not aliases of tile 1.
    pub fn parse(category: Category, raw: &str) -> Option<Self> {
        match category {
            Category::Tile => raw
                .parse::<TileId>()
                .ok()
                .filter(|id| id.to_string() == raw)
                .map(Self::Tile),
            Category::Gate if !raw.is_empty() => Some(Self::Gate(raw.to_owned())),
            Category::Shrine if !raw.is_empty() => Some(Self::Shrine(raw.to_owned())),
            _ => None,
        }
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.category(), self.key_string())
    }
}

/// Key carried by a click event: renderers report numbers for tiles and
/// strings for gates and shrines, but either form is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClickKey {
    Number(u64),
    Text(String),
}

impl ClickKey {
    fn as_text(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

/// "Region clicked" event as emitted by the rendering surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionClick {
    pub category: Category,
    pub key: ClickKey,
}

impl RegionClick {
    pub fn tile(id: TileId) -> Self {
        Self {
            category: Category::Tile,
            key: ClickKey::Number(u64::from(id)),
        }
    }

    pub fn gate(id: impl Into<String>) -> Self {
        Self {
            category: Category::Gate,
            key: ClickKey::Text(id.into()),
        }
    }

    pub fn shrine(id: impl Into<String>) -> Self {
        Self {
            category: Category::Shrine,
            key: ClickKey::Text(id.into()),
        }
    }

    pub fn region_key(&self) -> Result<RegionKey, SelectionError> {
        let raw = self.key.as_text();
        RegionKey::parse(self.category, raw.trim()).ok_or(SelectionError::UnknownRegion {
            category: self.category,
            key: raw,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileInfo {
    pub id: TileId,
    #[serde(default = "default_tile_fill")]
    pub default_fill: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateInfo {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShrineInfo {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

fn default_tile_fill() -> String {
    DEFAULT_TILE_FILL.to_owned()
}

/// On-disk form of a registry, as loaded from a JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryFile {
    #[serde(default)]
    pub tiles: Vec<TileInfo>,
    #[serde(default)]
    pub gates: Vec<GateInfo>,
    #[serde(default)]
    pub shrines: Vec<ShrineInfo>,
}

/// Static catalog of the regions that exist on the map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionRegistry {
    tiles: BTreeMap<TileId, TileInfo>,
    gates: BTreeMap<String, GateInfo>,
    shrines: BTreeMap<String, ShrineInfo>,
}

impl RegionRegistry {
    /// Catalog of the ARC map shipped with the tool.
    pub fn builtin() -> Self {
        let tiles = (1..=48).map(|id| TileInfo {
            id,
            default_fill: default_tile_fill(),
        });
        let gates = (1..=8).map(|n| GateInfo {
            id: format!("gate{n}"),
        });
        let shrines = [
            "Shrine of the Guardian",
            "Shrine of the Tides",
            "Shrine of the Ember",
            "Shrine of the Grove",
        ]
        .into_iter()
        .enumerate()
        .map(|(i, name)| ShrineInfo {
            id: format!("shrine{}", i + 1),
            name: name.to_owned(),
        });
        Self::from_file(RegistryFile {
            tiles: tiles.collect(),
            gates: gates.collect(),
            shrines: shrines.collect(),
        })
    }

    /// Later duplicates of an id replace earlier ones; blank gate and shrine ids are skipped.
    pub fn from_file(file: RegistryFile) -> Self {
        Self {
            tiles: file.tiles.into_iter().map(|t| (t.id, t)).collect(),
            gates: file
                .gates
                .into_iter()
                .filter(|g| !g.id.is_empty())
                .map(|g| (g.id.clone(), g))
                .collect(),
            shrines: file
                .shrines
                .into_iter()
                .filter(|s| !s.id.is_empty())
                .map(|s| (s.id.clone(), s))
                .collect(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<RegistryFile>(json).map(Self::from_file)
    }

    pub fn contains(&self, key: &RegionKey) -> bool {
        match key {
            RegionKey::Tile(id) => self.tiles.contains_key(id),
            RegionKey::Gate(id) => self.gates.contains_key(id),
            RegionKey::Shrine(id) => self.shrines.contains_key(id),
        }
    }

    pub fn tile(&self, id: TileId) -> Option<&TileInfo> {
        self.tiles.get(&id)
    }

    pub fn shrine(&self, id: &str) -> Option<&ShrineInfo> {
        self.shrines.get(id)
    }

    pub fn tiles(&self) -> impl Iterator<Item = &TileInfo> {
        self.tiles.values()
    }

    pub fn gates(&self) -> impl Iterator<Item = &GateInfo> {
        self.gates.values()
    }

    pub fn shrines(&self) -> impl Iterator<Item = &ShrineInfo> {
        self.shrines.values()
    }

    pub fn len(&self, category: Category) -> usize {
        match category {
            Category::Tile => self.tiles.len(),
            Category::Gate => self.gates.len(),
            Category::Shrine => self.shrines.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty() && self.gates.is_empty() && self.shrines.is_empty()
    }
}
