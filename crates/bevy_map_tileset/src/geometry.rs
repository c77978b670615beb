//! Grid and pixel geometry shared by the model, span manager and view

use serde::{Deserialize, Serialize};

/// A cell in view space, addressed by row and column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridCell {
    pub row: i32,
    pub col: i32,
}

impl GridCell {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Offset this cell by a number of rows and columns
    pub fn offset(self, rows: i32, cols: i32) -> Self {
        Self::new(self.row + rows, self.col + cols)
    }
}

/// Size of a span in cells (width = columns, height = rows)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpanSize {
    pub width: i32,
    pub height: i32,
}

impl SpanSize {
    pub const SINGLE: SpanSize = SpanSize {
        width: 1,
        height: 1,
    };

    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// True if the span covers more than one cell
    pub fn is_multi_cell(&self) -> bool {
        self.width > 1 || self.height > 1
    }
}

impl Default for SpanSize {
    fn default() -> Self {
        Self::SINGLE
    }
}

/// A rectangle of grid cells: origin row/column plus height/width in cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridRect {
    pub row: i32,
    pub col: i32,
    pub height: i32,
    pub width: i32,
}

impl GridRect {
    pub const fn new(row: i32, col: i32, height: i32, width: i32) -> Self {
        Self {
            row,
            col,
            height,
            width,
        }
    }

    /// A 1x1 rect at the given cell
    pub fn from_cell(cell: GridCell) -> Self {
        Self::new(cell.row, cell.col, 1, 1)
    }

    /// Rect anchored at `origin` covering `span`
    pub fn from_span(origin: GridCell, span: SpanSize) -> Self {
        Self::new(origin.row, origin.col, span.height, span.width)
    }

    /// Rect spanning two inclusive corner cells, in any order
    pub fn from_corners(a: GridCell, b: GridCell) -> Self {
        let min_row = a.row.min(b.row);
        let max_row = a.row.max(b.row);
        let min_col = a.col.min(b.col);
        let max_col = a.col.max(b.col);
        Self::new(min_row, min_col, max_row - min_row + 1, max_col - min_col + 1)
    }

    pub fn origin(&self) -> GridCell {
        GridCell::new(self.row, self.col)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Last row covered (inclusive)
    pub fn bottom(&self) -> i32 {
        self.row + self.height - 1
    }

    /// Last column covered (inclusive)
    pub fn right(&self) -> i32 {
        self.col + self.width - 1
    }

    pub fn contains(&self, cell: GridCell) -> bool {
        !self.is_empty()
            && cell.row >= self.row
            && cell.row < self.row + self.height
            && cell.col >= self.col
            && cell.col < self.col + self.width
    }

    /// Smallest rect covering both rects. Empty rects are ignored.
    pub fn union(&self, other: &GridRect) -> GridRect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let min_row = self.row.min(other.row);
        let min_col = self.col.min(other.col);
        let max_row = self.bottom().max(other.bottom());
        let max_col = self.right().max(other.right());
        GridRect::new(min_row, min_col, max_row - min_row + 1, max_col - min_col + 1)
    }

    /// Iterate every cell in row-major order
    pub fn cells(&self) -> impl Iterator<Item = GridCell> + '_ {
        let (row, col, height, width) = (self.row, self.col, self.height, self.width);
        (0..height.max(0))
            .flat_map(move |r| (0..width.max(0)).map(move |c| GridCell::new(row + r, col + c)))
    }
}

/// A rectangle in atlas image pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PixelRect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rect spanning two pixel positions, in any order
    pub fn from_points(a: (i32, i32), b: (i32, i32)) -> Self {
        let x = a.0.min(b.0);
        let y = a.1.min(b.1);
        Self::new(x, y, (a.0 - b.0).abs(), (a.1 - b.1).abs())
    }

    pub fn top_left(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Whether a pixel position lies inside (right and bottom edges exclusive)
    pub fn contains_point(&self, (px, py): (i32, i32)) -> bool {
        !self.is_empty()
            && px >= self.x
            && px < self.x + self.width
            && py >= self.y
            && py < self.y + self.height
    }

    pub fn intersects(&self, other: &PixelRect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_rect_from_corners() {
        let rect = GridRect::from_corners(GridCell::new(3, 6), GridCell::new(2, 3));
        assert_eq!(rect, GridRect::new(2, 3, 2, 4));
        assert_eq!(rect.bottom(), 3);
        assert_eq!(rect.right(), 6);
    }

    #[test]
    fn test_grid_rect_contains_and_cells() {
        let rect = GridRect::new(1, 1, 2, 3);
        assert!(rect.contains(GridCell::new(2, 3)));
        assert!(!rect.contains(GridCell::new(3, 1)));
        assert_eq!(rect.cells().count(), 6);
        assert_eq!(rect.cells().next(), Some(GridCell::new(1, 1)));
        assert!(!GridRect::new(0, 0, 0, 4).contains(GridCell::new(0, 0)));
    }

    #[test]
    fn test_grid_rect_union_ignores_empty() {
        let a = GridRect::new(4, 2, 1, 1);
        let b = GridRect::new(1, 5, 2, 1);
        assert_eq!(a.union(&b), GridRect::new(1, 2, 4, 4));
        assert_eq!(GridRect::default().union(&a), a);
    }

    #[test]
    fn test_pixel_rect_intersection() {
        let a = PixelRect::new(0, 0, 32, 32);
        assert!(a.intersects(&PixelRect::new(31, 31, 4, 4)));
        assert!(!a.intersects(&PixelRect::new(32, 0, 4, 4)));
        assert!(a.contains_point((0, 31)));
        assert!(!a.contains_point((32, 0)));
    }
}
