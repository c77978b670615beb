//! Grid model over a tileset
//!
//! [`TilesetModel`] addresses a tileset's tiles by [`GridCell`]. Atlas
//! tilesets map cells to tiles through the deterministic atlas id; collection
//! tilesets lay out a cached id list row by row. The model holds no tiles
//! itself: every query takes the [`Tileset`] it projects.

use crate::command::{DocumentChange, TileCommand};
use crate::coords::{atlas_to_view, collection_cell, collection_index, view_to_atlas};
use crate::geometry::{GridCell, GridRect, SpanSize};
use crate::payload::{DropAction, TileDragPayload};
use crate::tileset::{Tile, TileId, Tileset};
use std::sync::{Arc, Mutex};

/// Column count used by collections without an override or stored columns
pub const DEFAULT_COLUMN_COUNT: i32 = 5;

/// Receives change notifications from a [`TilesetModel`]
pub trait GridListener: Send + Sync {
    /// Cells in `range` need repainting
    fn range_changed(&mut self, range: GridRect);
    /// Layout or contents changed wholesale
    fn model_reset(&mut self);
}

/// Handle returned by [`TilesetModel::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Interaction capabilities of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellFlags {
    pub selectable: bool,
    pub draggable: bool,
    pub droppable: bool,
}

/// Broken model invariants
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// The tile is not in the cached id list; the cache is stale
    TileNotFound(TileId),
    /// No layout is possible without a positive column count
    NoColumns,
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::TileNotFound(id) => write!(f, "Tile {} not found in tileset model", id),
            ModelError::NoColumns => write!(f, "Tileset model has no columns"),
        }
    }
}

impl std::error::Error for ModelError {}

/// Row/column view of a tileset
pub struct TilesetModel {
    tile_ids: Vec<TileId>,
    column_count_override: i32,
    relocating: bool,
    listeners: Vec<(ListenerId, Box<dyn GridListener>)>,
    next_listener: u64,
}

impl std::fmt::Debug for TilesetModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TilesetModel")
            .field("tile_ids", &self.tile_ids)
            .field("column_count_override", &self.column_count_override)
            .field("relocating", &self.relocating)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl TilesetModel {
    pub fn new(tileset: &Tileset) -> Self {
        Self {
            tile_ids: tileset.tile_ids(),
            column_count_override: 0,
            relocating: false,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    /// Tile ids in display order (collection layout)
    pub fn tile_ids(&self) -> &[TileId] {
        &self.tile_ids
    }

    pub fn column_count(&self, tileset: &Tileset) -> i32 {
        if self.column_count_override > 0 {
            return self.column_count_override;
        }
        if tileset.columns > 0 {
            return tileset.columns;
        }
        DEFAULT_COLUMN_COUNT
    }

    pub fn row_count(&self, tileset: &Tileset) -> i32 {
        let columns = self.column_count(tileset);
        if columns <= 0 {
            return 1;
        }
        if tileset.is_atlas() {
            let total = tileset.rows * tileset.columns;
            return (total + columns - 1) / columns;
        }
        let count = self.tile_ids.len() as i32;
        ((count + columns - 1) / columns).max(1)
    }

    pub fn is_valid_cell(&self, tileset: &Tileset, cell: GridCell) -> bool {
        cell.row >= 0
            && cell.col >= 0
            && cell.row < self.row_count(tileset)
            && cell.col < self.column_count(tileset)
    }

    /// Tile anchored at a cell.
    ///
    /// Cells covered by a larger span, but not its origin, have no tile here;
    /// use [`TilesetModel::find_spanning_tile`] for them.
    pub fn tile_at<'a>(&self, tileset: &'a Tileset, cell: GridCell) -> Option<&'a Tile> {
        if !self.is_valid_cell(tileset, cell) {
            return None;
        }

        if tileset.is_atlas() {
            let atlas = view_to_atlas(cell, self.column_count(tileset), tileset.columns)?;
            if atlas.row >= tileset.rows {
                return None;
            }
            let id = tileset.generate_tile_id(atlas.col, atlas.row);
            return tileset.find_tile(id);
        }

        let index = collection_index(cell, self.column_count(tileset))?;
        let id = *self.tile_ids.get(index)?;
        tileset.find_tile(id)
    }

    /// Cell a tile is shown at
    pub fn tile_index(&self, tileset: &Tileset, tile: &Tile) -> Result<GridCell, ModelError> {
        if tileset.is_atlas() {
            let atlas = tileset.metrics().pixel_to_cell(tile.image_rect);
            return atlas_to_view(atlas, self.column_count(tileset), tileset.columns)
                .ok_or(ModelError::NoColumns);
        }

        let columns = self.column_count(tileset);
        let Some(index) = self.tile_ids.iter().position(|id| *id == tile.id) else {
            tracing::error!("Tile {} missing from the tileset model id cache", tile.id);
            return Err(ModelError::TileNotFound(tile.id));
        };
        collection_cell(index, columns).ok_or(ModelError::NoColumns)
    }

    /// Cell of a tile looked up by id
    pub fn tile_index_of(&self, tileset: &Tileset, id: TileId) -> Result<GridCell, ModelError> {
        let tile = tileset.find_tile(id).ok_or(ModelError::TileNotFound(id))?;
        self.tile_index(tileset, tile)
    }

    /// Cells covered by the tile anchored at `cell` (1x1 for collections)
    pub fn tile_span_size(&self, tileset: &Tileset, cell: GridCell) -> SpanSize {
        if !tileset.is_atlas() {
            return SpanSize::SINGLE;
        }
        match self.tile_at(tileset, cell) {
            Some(tile) => span_of_tile(tileset, tile),
            None => SpanSize::SINGLE,
        }
    }

    /// Multi-cell tile whose span covers `cell`, including its origin cell
    pub fn find_spanning_tile<'a>(&self, tileset: &'a Tileset, cell: GridCell) -> Option<&'a Tile> {
        if !tileset.is_atlas() {
            return None;
        }
        tileset.tiles().iter().find(|tile| {
            let span = span_of_tile(tileset, tile);
            if !span.is_multi_cell() {
                return false;
            }
            match self.tile_index(tileset, tile) {
                Ok(origin) => GridRect::from_span(origin, span).contains(cell),
                Err(_) => false,
            }
        })
    }

    /// True if `cell` lies inside a span without being its origin
    pub fn is_cell_covered_by_span(&self, tileset: &Tileset, cell: GridCell) -> bool {
        self.find_spanning_tile(tileset, cell)
            .and_then(|tile| self.tile_index(tileset, tile).ok())
            .is_some_and(|origin| origin != cell)
    }

    /// Grid rect covered by a tile
    pub fn tile_rect(&self, tileset: &Tileset, tile: &Tile) -> Result<GridRect, ModelError> {
        let origin = self.tile_index(tileset, tile)?;
        let span = if tileset.is_atlas() {
            span_of_tile(tileset, tile)
        } else {
            SpanSize::SINGLE
        };
        Ok(GridRect::from_span(origin, span))
    }

    pub fn cell_flags(&self, tileset: &Tileset, cell: GridCell) -> CellFlags {
        if tileset.is_atlas() {
            if !self.is_valid_cell(tileset, cell) {
                return CellFlags::default();
            }
            return CellFlags {
                selectable: self.relocating || self.tile_at(tileset, cell).is_some(),
                draggable: false,
                droppable: false,
            };
        }

        let valid = self.is_valid_cell(tileset, cell);
        CellFlags {
            selectable: valid,
            draggable: valid && self.tile_at(tileset, cell).is_some(),
            droppable: true,
        }
    }

    /// Drag payload for the tiles at `cells`, in order
    pub fn mime_data(&self, tileset: &Tileset, cells: &[GridCell]) -> Option<TileDragPayload> {
        let ids: Vec<TileId> = cells
            .iter()
            .filter_map(|cell| self.tile_at(tileset, *cell))
            .map(|tile| tile.id)
            .collect();
        if ids.is_empty() {
            return None;
        }
        Some(TileDragPayload::from_ids(&ids))
    }

    /// Relocate command for a drop onto `target` (or empty space).
    ///
    /// Returns `None` when the drop is not handled: atlas tilesets, non-move
    /// actions, foreign or truncated payloads, or no known tiles.
    pub fn drop_mime_data(
        &self,
        tileset: &Tileset,
        payload: &TileDragPayload,
        action: DropAction,
        target: Option<GridCell>,
    ) -> Option<TileCommand> {
        if tileset.is_atlas() || action != DropAction::Move {
            return None;
        }
        let Some(ids) = payload.tile_ids() else {
            tracing::warn!("Rejected malformed tile drag payload");
            return None;
        };

        let tiles: Vec<TileId> = ids
            .into_iter()
            .filter(|id| tileset.find_tile(*id).is_some())
            .collect();
        if tiles.is_empty() || self.tile_ids.is_empty() {
            return None;
        }

        let destination = target
            .and_then(|cell| self.tile_at(tileset, cell))
            .and_then(|tile| self.tile_ids.iter().position(|id| *id == tile.id))
            .unwrap_or(self.tile_ids.len() - 1);

        Some(TileCommand::RelocateTiles {
            tiles,
            location: destination,
        })
    }

    pub fn column_count_override(&self) -> i32 {
        self.column_count_override
    }

    /// Override the column count (0 disables the override)
    pub fn set_column_count_override(&mut self, columns: i32) {
        if self.column_count_override == columns {
            return;
        }
        self.column_count_override = columns;
        self.notify_reset();
    }

    pub fn is_relocating(&self) -> bool {
        self.relocating
    }

    /// While relocating, every atlas cell is selectable
    pub fn set_relocating(&mut self, relocating: bool) {
        if self.relocating == relocating {
            return;
        }
        self.relocating = relocating;
        self.notify_reset();
    }

    /// Rebuild the id cache after the tileset was replaced or reloaded
    pub fn tileset_changed(&mut self, tileset: &Tileset) {
        self.tile_ids = tileset.tile_ids();
        self.notify_reset();
    }

    /// Notify the bounding rect of all cells touched by `ids`
    pub fn tiles_changed(&mut self, tileset: &Tileset, ids: &[TileId]) {
        let mut bounds: Option<GridRect> = None;
        for id in ids {
            let Some(tile) = tileset.find_tile(*id) else {
                continue;
            };
            let Ok(rect) = self.tile_rect(tileset, tile) else {
                continue;
            };
            bounds = Some(match bounds {
                Some(b) => b.union(&rect),
                None => rect,
            });
        }
        if let Some(range) = bounds {
            self.notify_range(range);
        }
    }

    /// Notify the single cell of one tile
    pub fn tile_changed(&mut self, tileset: &Tileset, id: TileId) {
        if let Ok(cell) = self.tile_index_of(tileset, id) {
            self.notify_range(GridRect::from_cell(cell));
        }
    }

    /// Bring the model up to date with applied document changes
    pub fn document_changed(&mut self, tileset: &Tileset, changes: &[DocumentChange]) {
        let structural = changes.iter().any(|c| {
            matches!(
                c,
                DocumentChange::TilesAdded(_)
                    | DocumentChange::TilesRemoved(_)
                    | DocumentChange::TilesRelocated
            )
        });
        if structural {
            self.tileset_changed(tileset);
            return;
        }

        for change in changes {
            match change {
                DocumentChange::TileImageRectsChanged(ids) => {
                    if tileset.is_atlas() {
                        // Spans may have grown or shrunk
                        self.notify_reset();
                    } else {
                        self.tiles_changed(tileset, ids);
                    }
                }
                DocumentChange::WangIdsChanged { tiles, .. } => {
                    if let [single] = tiles.as_slice() {
                        self.tile_changed(tileset, *single);
                    } else {
                        self.tiles_changed(tileset, tiles);
                    }
                }
                _ => {}
            }
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn GridListener>) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, listener));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Tell listeners that `range` changed
    pub fn notify_range(&mut self, range: GridRect) {
        for (_, listener) in self.listeners.iter_mut() {
            listener.range_changed(range);
        }
    }

    fn notify_reset(&mut self) {
        for (_, listener) in self.listeners.iter_mut() {
            listener.model_reset();
        }
    }
}

/// Cell span of a tile from its image rect
pub fn span_of_tile(tileset: &Tileset, tile: &Tile) -> SpanSize {
    let (width, height) = tileset.metrics().span_of(tile.image_rect);
    SpanSize::new(width.max(1), height.max(1))
}

/// Pending invalidation collected by a [`DirtyRegion`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidation {
    Reset,
    Range(GridRect),
}

#[derive(Debug, Default)]
struct DirtyState {
    reset: bool,
    range: Option<GridRect>,
}

/// Listener that accumulates invalidated cells until taken.
///
/// Clones share state, so one clone can be subscribed while another is
/// polled by the view.
#[derive(Debug, Clone, Default)]
pub struct DirtyRegion(Arc<Mutex<DirtyState>>);

impl DirtyRegion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the accumulated invalidation, leaving the region clean
    pub fn take(&self) -> Option<Invalidation> {
        let Ok(mut state) = self.0.lock() else {
            return Some(Invalidation::Reset);
        };
        let reset = std::mem::take(&mut state.reset);
        let range = state.range.take();
        if reset {
            Some(Invalidation::Reset)
        } else {
            range.map(Invalidation::Range)
        }
    }
}

impl GridListener for DirtyRegion {
    fn range_changed(&mut self, range: GridRect) {
        if let Ok(mut state) = self.0.lock() {
            state.range = Some(match state.range {
                Some(existing) => existing.union(&range),
                None => range,
            });
        }
    }

    fn model_reset(&mut self) {
        if let Ok(mut state) = self.0.lock() {
            state.reset = true;
        }
    }
}
