use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::colors::parse_hex;
use crate::error::SelectionError;

/// Colors offered when no palette is configured.
pub const DEFAULT_PALETTE: [&str; 10] = [
    "#DC143C", "#1E90FF", "#32CD32", "#FFD700", "#8A2BE2", "#FF8C00", "#00CED1", "#FF69B4",
    "#A0522D", "#708090",
];

/// Index of the color that is active when a board starts.
pub const DEFAULT_ACTIVE_INDEX: usize = 2;

/// Opaque color token. Compared by exact string equality.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(String);

impl Color {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Color {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Reasons a configured palette is refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaletteError {
    #[error("palette must contain at least one color")]
    Empty,
    #[error("palette entry {0:?} is not a #RRGGBB color")]
    NotHex(String),
    #[error("palette entry {0} appears more than once")]
    Duplicate(String),
}

/// Fixed, ordered set of assignable colors. Immutable once built and cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Arc<[Color]>,
}

impl Palette {
    pub fn new<I, S>(tokens: I) -> Result<Self, PaletteError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut colors: Vec<Color> = Vec::new();
        for token in tokens {
            let token = token.into().trim().to_owned();
            if parse_hex(&token).is_none() {
                return Err(PaletteError::NotHex(token));
            }
            if colors.iter().any(|existing| existing.as_str() == token) {
                return Err(PaletteError::Duplicate(token));
            }
            colors.push(Color(token));
        }
        if colors.is_empty() {
            return Err(PaletteError::Empty);
        }
        Ok(Self {
            colors: colors.into(),
        })
    }

    /// Parse a comma-separated list such as `#DC143C,#1E90FF`.
    pub fn parse_list(raw: &str) -> Result<Self, PaletteError> {
        Self::new(raw.split(',').map(str::trim).filter(|s| !s.is_empty()))
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.colors.iter().any(|c| c.as_str() == token)
    }

    pub fn position(&self, token: &str) -> Option<usize> {
        self.colors.iter().position(|c| c.as_str() == token)
    }

    /// Look up the palette entry for `token`.
    pub fn resolve(&self, token: &str) -> Result<&Color, SelectionError> {
        self.colors
            .iter()
            .find(|c| c.as_str() == token)
            .ok_or_else(|| SelectionError::InvalidColor(token.to_owned()))
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: DEFAULT_PALETTE.iter().map(|c| Color::new(*c)).collect(),
        }
    }
}

/// Palette plus the "active" pointer applied to the next region click.
#[derive(Debug, Clone)]
pub struct ColorPicker {
    palette: Palette,
    active: usize,
}

impl ColorPicker {
    /// `default_index` past the end of the palette is clamped to the last entry.
    pub fn new(palette: Palette, default_index: usize) -> Self {
        let active = default_index.min(palette.len().saturating_sub(1));
        Self { palette, active }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn active_color(&self) -> &Color {
        &self.palette.colors()[self.active]
    }

    pub fn set_active_color(&mut self, token: &str) -> Result<&Color, SelectionError> {
        let index = self
            .palette
            .position(token)
            .ok_or_else(|| SelectionError::InvalidColor(token.to_owned()))?;
        self.active = index;
        Ok(self.active_color())
    }
}

impl Default for ColorPicker {
    fn default() -> Self {
        Self::new(Palette::default(), DEFAULT_ACTIVE_INDEX)
    }
}
