//! Tileset and tile data

use crate::coords::GridMetrics;
use crate::geometry::{GridCell, PixelRect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a tile within its tileset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(pub i32);

impl TileId {
    pub fn raw(self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for TileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One frame of a tile animation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub tile_id: TileId,
    pub duration_ms: u32,
}

/// A single tile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub id: TileId,
    /// Sub-rectangle of the image this tile shows. For atlas tiles this is a
    /// region of the shared atlas image; for collection tiles it covers the
    /// tile's own image.
    pub image_rect: PixelRect,
    /// Own image for collection tiles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub animation: Vec<Frame>,
}

impl Tile {
    pub fn new(id: TileId, image_rect: PixelRect) -> Self {
        Self {
            id,
            image_rect,
            image_path: None,
            animation: Vec::new(),
        }
    }

    /// A collection tile with its own image of the given size
    pub fn with_image(id: TileId, path: impl Into<String>, width: i32, height: i32) -> Self {
        Self {
            id,
            image_rect: PixelRect::new(0, 0, width, height),
            image_path: Some(path.into()),
            animation: Vec::new(),
        }
    }

    pub fn is_animated(&self) -> bool {
        !self.animation.is_empty()
    }

    /// Size in pixels of the displayed image
    pub fn size(&self) -> (i32, i32) {
        (self.image_rect.width, self.image_rect.height)
    }
}

/// Whether tiles share one atlas image or each carry their own image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TilesetKind {
    #[default]
    Atlas,
    Collection,
}

/// Orientation used when drawing terrain overlays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TilesetOrientation {
    #[default]
    Orthogonal,
    Isometric,
}

/// A tileset: configuration plus the tiles it owns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tileset {
    pub id: Uuid,
    pub name: String,
    pub kind: TilesetKind,
    pub tile_width: i32,
    pub tile_height: i32,
    #[serde(default)]
    pub margin: i32,
    #[serde(default)]
    pub spacing: i32,
    /// Atlas column count (0 for collections without a fixed layout)
    pub columns: i32,
    /// Atlas row count
    pub rows: i32,
    #[serde(default)]
    pub orientation: TilesetOrientation,
    /// Grid cell size used for isometric overlays (width, height)
    #[serde(default)]
    pub grid_size: (i32, i32),
    /// Background color (hex format, e.g., "#3C3C50")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    /// Atlas image path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    tiles: Vec<Tile>,
}

impl Tileset {
    /// Create an atlas tileset with one 1x1 tile per cell
    pub fn new_atlas(
        name: String,
        tile_width: i32,
        tile_height: i32,
        columns: i32,
        rows: i32,
    ) -> Self {
        Self::new_atlas_with_spacing(name, tile_width, tile_height, columns, rows, 0, 0)
    }

    /// Create an atlas tileset with margin and spacing, one 1x1 tile per cell
    pub fn new_atlas_with_spacing(
        name: String,
        tile_width: i32,
        tile_height: i32,
        columns: i32,
        rows: i32,
        margin: i32,
        spacing: i32,
    ) -> Self {
        let mut tileset = Self {
            id: Uuid::new_v4(),
            name,
            kind: TilesetKind::Atlas,
            tile_width,
            tile_height,
            margin,
            spacing,
            columns,
            rows,
            orientation: TilesetOrientation::Orthogonal,
            grid_size: (tile_width, tile_height),
            background_color: None,
            image_path: None,
            tiles: Vec::new(),
        };
        let metrics = tileset.metrics();
        for row in 0..rows {
            for col in 0..columns {
                let id = tileset.generate_tile_id(col, row);
                let rect = metrics.cell_to_pixel(crate::GridRect::new(row, col, 1, 1));
                tileset.tiles.push(Tile::new(id, rect));
            }
        }
        tileset
    }

    /// Create an empty collection tileset. `tile_width`/`tile_height` are
    /// the largest tile dimensions and drive dynamic wrapping.
    pub fn new_collection(name: String, tile_width: i32, tile_height: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            kind: TilesetKind::Collection,
            tile_width,
            tile_height,
            margin: 0,
            spacing: 0,
            columns: 0,
            rows: 0,
            orientation: TilesetOrientation::Orthogonal,
            grid_size: (tile_width, tile_height),
            background_color: None,
            image_path: None,
            tiles: Vec::new(),
        }
    }

    pub fn is_atlas(&self) -> bool {
        self.kind == TilesetKind::Atlas
    }

    pub fn is_collection(&self) -> bool {
        self.kind == TilesetKind::Collection
    }

    pub fn metrics(&self) -> GridMetrics {
        GridMetrics::new(self.tile_width, self.tile_height, self.margin, self.spacing)
    }

    /// Deterministic atlas tile id for a cell
    pub fn generate_tile_id(&self, col: i32, row: i32) -> TileId {
        TileId(row * self.columns + col)
    }

    /// Inverse of [`Tileset::generate_tile_id`]; `None` without columns
    pub fn generate_tile_pos(&self, id: TileId) -> Option<GridCell> {
        if self.columns <= 0 {
            return None;
        }
        Some(GridCell::new(id.0 / self.columns, id.0 % self.columns))
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn find_tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.id == id)
    }

    pub fn find_tile_mut(&mut self, id: TileId) -> Option<&mut Tile> {
        self.tiles.iter_mut().find(|t| t.id == id)
    }

    /// Position of a tile in the tile list
    pub fn tile_position(&self, id: TileId) -> Option<usize> {
        self.tiles.iter().position(|t| t.id == id)
    }

    /// One past the highest id in use. Collections allocate from it; atlases
    /// use it for free-form tiles placed past the generated grid ids.
    pub fn next_tile_id(&self) -> TileId {
        TileId(self.tiles.iter().map(|t| t.id.0 + 1).max().unwrap_or(0))
    }

    /// Tile ids in list order
    pub fn tile_ids(&self) -> Vec<TileId> {
        self.tiles.iter().map(|t| t.id).collect()
    }

    /// Append a tile (construction helper; edits go through commands)
    pub fn push_tile(&mut self, tile: Tile) {
        self.tiles.push(tile);
    }

    pub(crate) fn insert_tile(&mut self, index: usize, tile: Tile) {
        let index = index.min(self.tiles.len());
        self.tiles.insert(index, tile);
    }

    pub(crate) fn remove_tile(&mut self, id: TileId) -> Option<(usize, Tile)> {
        let pos = self.tile_position(id)?;
        Some((pos, self.tiles.remove(pos)))
    }

    pub(crate) fn tiles_mut(&mut self) -> &mut Vec<Tile> {
        &mut self.tiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_atlas_generates_cells() {
        let tileset = Tileset::new_atlas_with_spacing("Ground".to_string(), 16, 16, 4, 3, 1, 2);
        assert_eq!(tileset.tile_count(), 12);
        let tile = tileset.find_tile(TileId(6)).unwrap();
        assert_eq!(tile.image_rect, PixelRect::new(1 + 2 * 18, 1 + 18, 16, 16));
    }

    #[test]
    fn test_tile_id_round_trip() {
        let tileset = Tileset::new_atlas("Ground".to_string(), 8, 8, 5, 2);
        let id = tileset.generate_tile_id(3, 1);
        assert_eq!(id, TileId(8));
        assert_eq!(tileset.generate_tile_pos(id), Some(GridCell::new(1, 3)));
    }

    #[test]
    fn test_collection_next_id() {
        let mut tileset = Tileset::new_collection("Props".to_string(), 32, 32);
        assert_eq!(tileset.next_tile_id(), TileId(0));
        tileset.push_tile(Tile::with_image(TileId(4), "props/barrel.png", 24, 32));
        assert_eq!(tileset.next_tile_id(), TileId(5));
        assert!(tileset.is_collection());
        assert_eq!(tileset.generate_tile_pos(TileId(4)), None);
    }
}
