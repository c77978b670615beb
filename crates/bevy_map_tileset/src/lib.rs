//! Tileset grid model for bevy_map_editor
//!
//! This crate exposes a tileset's tiles as a row/column grid, independent of
//! any UI toolkit:
//! - `TilesetModel` - Grid addressing, span queries, cell flags, drag payloads
//! - `spans` - Merging and splitting multi-cell atlas tiles
//! - `TilesetDocument` - Applies `TileCommand`s with undo/redo
//! - `WangSet` / `WangId` - Terrain colors assigned to tile edges and corners
//! - `coords` - Conversions between atlas pixels, atlas cells and view cells

pub mod coords;
pub mod spans;

mod command;
mod document;
mod geometry;
mod model;
mod payload;
mod tileset;
mod wang;

pub use command::{CommandBatch, CommandError, DocumentChange, TileCommand};
pub use coords::GridMetrics;
pub use document::{CommandHistory, TilesetDocument, UndoEntry};
pub use geometry::{GridCell, GridRect, PixelRect, SpanSize};
pub use model::{
    span_of_tile, CellFlags, DirtyRegion, GridListener, Invalidation, ListenerId, ModelError,
    TilesetModel, DEFAULT_COLUMN_COUNT,
};
pub use payload::{DropAction, TileDragPayload, TILES_MIME_TYPE};
pub use spans::{create_tile, merge_span, remove_tiles_intersecting, split_span};
pub use tileset::{Frame, Tile, TileId, Tileset, TilesetKind, TilesetOrientation};
pub use wang::{WangColor, WangId, WangIndex, WangSet, WangSetType};
