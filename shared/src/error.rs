use thiserror::Error;

use crate::palette::Color;
use crate::region::Category;

/// Errors returned by board, store and serializer operations.
///
/// None of these is fatal: the state is left exactly as it was before the
/// failing call and stays usable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// The color token is not part of the palette.
    #[error("color {0:?} is not in the palette")]
    InvalidColor(String),

    /// Assigning would push the color past its per-color cap.
    #[error("color {color} already occupies the maximum of {max} regions")]
    CapacityExceeded { color: Color, max: usize },

    /// The document failed top-level structural validation.
    #[error("invalid selection document: {0}")]
    InvalidDocument(String),

    /// The clicked region is not in the region registry.
    #[error("unknown {category} {key:?}")]
    UnknownRegion { category: Category, key: String },
}

impl SelectionError {
    /// Stable machine-readable kind, used in API error bodies and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidColor(_) => "invalid_color",
            Self::CapacityExceeded { .. } => "capacity_exceeded",
            Self::InvalidDocument(_) => "invalid_document",
            Self::UnknownRegion { .. } => "unknown_region",
        }
    }
}
