//! Cell geometry of the tileset grid in content coordinates
//!
//! Content coordinates start at the top-left of the first cell and grow
//! right and down; the view adds its scroll offset and screen origin.

use bevy::math::{Rect, Vec2};
use bevy_map_tileset::{GridCell, GridMetrics, GridRect, Tile, Tileset, TilesetModel};

/// Placeholder edge length for tiles whose image is not available
pub const MISSING_IMAGE_SIZE: f32 = 32.0;

/// Column and row boundaries of the grid
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GridLayout {
    column_edges: Vec<f32>,
    row_edges: Vec<f32>,
}

impl GridLayout {
    /// All cells the same size
    pub fn uniform(columns: i32, rows: i32, cell: Vec2) -> Self {
        let widths = vec![cell.x; columns.max(0) as usize];
        let heights = vec![cell.y; rows.max(0) as usize];
        Self::from_sizes(&widths, &heights)
    }

    /// Per-column widths and per-row heights
    pub fn from_sizes(widths: &[f32], heights: &[f32]) -> Self {
        Self {
            column_edges: edges(widths),
            row_edges: edges(heights),
        }
    }

    /// Lay out a tileset for the given zoom and wrapping mode.
    ///
    /// `has_image` tells whether a collection tile's image is available;
    /// tiles without one are sized like the placeholder.
    pub fn compute(
        model: &TilesetModel,
        tileset: &Tileset,
        scale: f32,
        draw_grid: bool,
        dynamic: bool,
        has_image: &dyn Fn(&Tile) -> bool,
    ) -> Self {
        let columns = model.column_count(tileset);
        let rows = model.row_count(tileset);
        let extra = grid_extra(draw_grid);

        if tileset.is_atlas() || dynamic {
            let cell = Vec2::new(
                (tileset.tile_width as f32 * scale).round() + extra,
                (tileset.tile_height as f32 * scale).round() + extra,
            );
            return Self::uniform(columns, rows, cell.max(Vec2::ONE));
        }

        let mut widths = vec![extra.max(1.0); columns.max(0) as usize];
        let mut heights = vec![extra.max(1.0); rows.max(0) as usize];
        for row in 0..rows {
            for col in 0..columns {
                let cell = GridCell::new(row, col);
                let Some(tile) = model.tile_at(tileset, cell) else {
                    continue;
                };
                let size = tile_display_size(tileset, tile, has_image(tile)) * scale;
                let hint = size.round() + Vec2::splat(extra);
                let (c, r) = (col as usize, row as usize);
                widths[c] = widths[c].max(hint.x);
                heights[r] = heights[r].max(hint.y);
            }
        }
        Self::from_sizes(&widths, &heights)
    }

    pub fn columns(&self) -> i32 {
        self.column_edges.len().saturating_sub(1) as i32
    }

    pub fn rows(&self) -> i32 {
        self.row_edges.len().saturating_sub(1) as i32
    }

    pub fn content_size(&self) -> Vec2 {
        Vec2::new(
            self.column_edges.last().copied().unwrap_or(0.0),
            self.row_edges.last().copied().unwrap_or(0.0),
        )
    }

    pub fn cell_rect(&self, cell: GridCell) -> Option<Rect> {
        self.grid_rect(GridRect::from_cell(cell))
    }

    /// Screen-space union of a rect of cells, clipped to the grid
    pub fn grid_rect(&self, rect: GridRect) -> Option<Rect> {
        if rect.is_empty() {
            return None;
        }
        let col0 = rect.col.max(0);
        let row0 = rect.row.max(0);
        let col1 = rect.right().min(self.columns() - 1);
        let row1 = rect.bottom().min(self.rows() - 1);
        if col0 > col1 || row0 > row1 {
            return None;
        }
        Some(Rect::new(
            self.column_edges[col0 as usize],
            self.row_edges[row0 as usize],
            self.column_edges[col1 as usize + 1],
            self.row_edges[row1 as usize + 1],
        ))
    }

    /// Cell under a content position
    pub fn cell_at(&self, pos: Vec2) -> Option<GridCell> {
        let col = edge_index(&self.column_edges, pos.x)?;
        let row = edge_index(&self.row_edges, pos.y)?;
        Some(GridCell::new(row, col))
    }

    /// Cell nearest to a content position, for drags leaving the grid
    pub fn cell_at_clamped(&self, pos: Vec2) -> Option<GridCell> {
        if self.columns() == 0 || self.rows() == 0 {
            return None;
        }
        let size = self.content_size();
        let clamped = Vec2::new(
            pos.x.clamp(0.0, (size.x - 0.5).max(0.0)),
            pos.y.clamp(0.0, (size.y - 0.5).max(0.0)),
        );
        self.cell_at(clamped)
    }

    /// Cells touched by a content rect
    pub fn cells_intersecting(&self, rect: Rect) -> Option<GridRect> {
        let size = self.content_size();
        let clipped = rect.intersect(Rect::from_corners(Vec2::ZERO, size));
        if clipped.is_empty() {
            return None;
        }
        let first = self.cell_at_clamped(clipped.min)?;
        let last = self.cell_at_clamped(clipped.max)?;
        Some(GridRect::from_corners(first, last))
    }

    /// Atlas pixel under a content position, assuming view cells are atlas
    /// cells. The position is clamped into the grid.
    pub fn atlas_pixel(&self, pos: Vec2, metrics: &GridMetrics, extra: f32) -> Option<(i32, i32)> {
        let cell = self.cell_at_clamped(pos)?;
        let rect = self.cell_rect(cell)?;
        let inner = (rect.size() - Vec2::splat(extra)).max(Vec2::ONE);
        let fraction = ((pos - rect.min) / inner).clamp(Vec2::ZERO, Vec2::ONE);
        Some((
            metrics.margin
                + cell.col * metrics.pitch_x()
                + (fraction.x * metrics.tile_width as f32).round() as i32,
            metrics.margin
                + cell.row * metrics.pitch_y()
                + (fraction.y * metrics.tile_height as f32).round() as i32,
        ))
    }
}

fn edges(sizes: &[f32]) -> Vec<f32> {
    let mut edges = Vec::with_capacity(sizes.len() + 1);
    let mut position = 0.0;
    edges.push(position);
    for size in sizes {
        position += size;
        edges.push(position);
    }
    edges
}

fn edge_index(edges: &[f32], value: f32) -> Option<i32> {
    let end = *edges.last()?;
    if value < 0.0 || value >= end {
        return None;
    }
    let index = edges.partition_point(|edge| *edge <= value);
    Some(index as i32 - 1)
}

/// Extra pixels per cell taken by grid lines
pub fn grid_extra(draw_grid: bool) -> f32 {
    if draw_grid {
        1.0
    } else {
        0.0
    }
}

/// Unscaled size a tile is shown at
pub fn tile_display_size(tileset: &Tileset, tile: &Tile, has_image: bool) -> Vec2 {
    if has_image {
        let (width, height) = tile.size();
        return Vec2::new(width as f32, height as f32);
    }
    placeholder_size(tileset)
}

/// Size of the missing-image placeholder
pub fn placeholder_size(tileset: &Tileset) -> Vec2 {
    if tileset.is_collection() {
        return Vec2::splat(MISSING_IMAGE_SIZE);
    }
    let edge = tileset.tile_width.max(tileset.tile_height) as f32;
    Vec2::splat(edge.min(MISSING_IMAGE_SIZE))
}

/// Columns that fit a viewport when wrapping dynamically
pub fn dynamic_column_count(viewport_width: f32, tile_width: i32, scale: f32, draw_grid: bool) -> i32 {
    let cell = (tile_width as f32 * scale).max(1.0) + grid_extra(draw_grid);
    ((viewport_width / cell).floor() as i32).max(1)
}
