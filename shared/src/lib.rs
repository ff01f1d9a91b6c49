pub mod board;
pub mod colors;
pub mod document;
pub mod error;
pub mod events;
pub mod labels;
pub mod palette;
pub mod region;
pub mod sanctuary;
pub mod selection;

pub use board::{BoardConfig, BoardSnapshot, ClickResult, LegendRow, MapBoard, SanctuaryStanding};
pub use document::{ImportReport, SelectionDocument};
pub use error::SelectionError;
pub use events::*;
pub use palette::{Color, ColorPicker, Palette};
pub use region::{Category, RegionClick, RegionKey, RegionRegistry, TileId};
pub use sanctuary::{Sanctuaries, Sanctuary};
pub use selection::{MAX_PER_COLOR, SelectionStore, ToggleOutcome};
