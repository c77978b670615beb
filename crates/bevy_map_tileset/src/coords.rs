//! Conversions between atlas pixels, atlas cells and view cells
//!
//! Three coordinate spaces are involved:
//! - atlas pixel rectangles (a tile's image rect, offset by margin and spacing)
//! - atlas cells, derived from pixel rects by rounding to the tile pitch
//! - view cells, which equal atlas cells unless the view overrides the
//!   column count, in which case the linear cell index is re-wrapped

use crate::geometry::{GridCell, GridRect, PixelRect};
use serde::{Deserialize, Serialize};

/// Tile size, margin and spacing of an atlas image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridMetrics {
    pub tile_width: i32,
    pub tile_height: i32,
    pub margin: i32,
    pub spacing: i32,
}

impl GridMetrics {
    pub fn new(tile_width: i32, tile_height: i32, margin: i32, spacing: i32) -> Self {
        Self {
            tile_width,
            tile_height,
            margin,
            spacing,
        }
    }

    /// Horizontal distance between the origins of neighbouring cells
    pub fn pitch_x(&self) -> i32 {
        self.tile_width + self.spacing
    }

    /// Vertical distance between the origins of neighbouring cells
    pub fn pitch_y(&self) -> i32 {
        self.tile_height + self.spacing
    }

    /// Pixel rect covered by a grid rect. The size is a whole number of
    /// tiles; spacing is only applied to the origin.
    pub fn cell_to_pixel(&self, rect: GridRect) -> PixelRect {
        PixelRect::new(
            self.margin + rect.col * self.pitch_x(),
            self.margin + rect.row * self.pitch_y(),
            rect.width * self.tile_width,
            rect.height * self.tile_height,
        )
    }

    /// Atlas cell of a pixel rect's origin
    pub fn pixel_to_cell(&self, rect: PixelRect) -> GridCell {
        self.point_to_cell(rect.x, rect.y)
    }

    /// Atlas cell nearest to a pixel position
    pub fn point_to_cell(&self, x: i32, y: i32) -> GridCell {
        GridCell::new(
            round_div(y - self.margin, self.pitch_y()),
            round_div(x - self.margin, self.pitch_x()),
        )
    }

    /// Atlas cell containing a pixel position (no rounding)
    pub fn cell_containing(&self, x: i32, y: i32) -> GridCell {
        GridCell::new(
            floor_div(y - self.margin, self.pitch_y()),
            floor_div(x - self.margin, self.pitch_x()),
        )
    }

    /// Number of whole cells a pixel rect spans
    pub fn span_of(&self, rect: PixelRect) -> (i32, i32) {
        let w = if self.tile_width > 0 {
            rect.width / self.tile_width
        } else {
            1
        };
        let h = if self.tile_height > 0 {
            rect.height / self.tile_height
        } else {
            1
        };
        (w, h)
    }
}

fn round_div(value: i32, divisor: i32) -> i32 {
    if divisor <= 0 {
        return 0;
    }
    (value as f64 / divisor as f64).round() as i32
}

fn floor_div(value: i32, divisor: i32) -> i32 {
    if divisor <= 0 {
        return 0;
    }
    value.div_euclid(divisor)
}

/// Map a view cell to an atlas cell by re-wrapping the linear index.
///
/// Returns `None` when either column count is not positive.
pub fn view_to_atlas(view: GridCell, view_cols: i32, atlas_cols: i32) -> Option<GridCell> {
    if view_cols <= 0 || atlas_cols <= 0 {
        return None;
    }
    let linear = view.col + view.row * view_cols;
    Some(GridCell::new(linear / atlas_cols, linear % atlas_cols))
}

/// Map an atlas cell to a view cell by re-wrapping the linear index.
///
/// Returns `None` when either column count is not positive.
pub fn atlas_to_view(atlas: GridCell, view_cols: i32, atlas_cols: i32) -> Option<GridCell> {
    if view_cols <= 0 || atlas_cols <= 0 {
        return None;
    }
    let linear = atlas.row * atlas_cols + atlas.col;
    Some(GridCell::new(linear / view_cols, linear % view_cols))
}

/// View cell of the `index`-th tile of a collection laid out in `columns`
pub fn collection_cell(index: usize, columns: i32) -> Option<GridCell> {
    if columns <= 0 {
        return None;
    }
    let index = index as i32;
    Some(GridCell::new(index / columns, index % columns))
}

/// Linear list index of a collection cell, if the column is in range
pub fn collection_index(cell: GridCell, columns: i32) -> Option<usize> {
    if columns <= 0 || cell.row < 0 || cell.col < 0 || cell.col >= columns {
        return None;
    }
    Some((cell.col + cell.row * columns) as usize)
}
