//! Merging and splitting multi-cell atlas tiles
//!
//! A span is a single atlas tile whose image rect covers several grid cells.
//! Nothing here mutates the tileset: each operation returns one
//! [`CommandBatch`] that is applied (and undone) as a single step.

use crate::command::{CommandBatch, TileCommand};
use crate::geometry::{GridCell, GridRect, PixelRect};
use crate::model::{span_of_tile, TilesetModel};
use crate::tileset::{Tile, TileId, Tileset};

/// Spans are edited in atlas cells; a re-wrapped view cannot express them
fn grid_matches_atlas(model: &TilesetModel, tileset: &Tileset) -> bool {
    if !tileset.is_atlas() {
        return false;
    }
    if model.column_count(tileset) != tileset.columns {
        tracing::warn!(
            "Span editing needs the atlas column count ({}), view shows {}",
            tileset.columns,
            model.column_count(tileset)
        );
        return false;
    }
    true
}

/// Merge the cells `min_row..=max_row` x `min_col..=max_col` into one tile.
///
/// The tile anchored at the top-left cell grows to cover the range, or a new
/// tile is created there. Every other tile whose image origin lies inside the
/// merged pixel rect is removed. Returns `None` for an empty or inverted range.
pub fn merge_span(
    model: &TilesetModel,
    tileset: &Tileset,
    min_row: i32,
    max_row: i32,
    min_col: i32,
    max_col: i32,
) -> Option<CommandBatch> {
    if min_row < 0 || min_col < 0 || max_row < min_row || max_col < min_col {
        return None;
    }
    if !grid_matches_atlas(model, tileset) {
        return None;
    }

    let range = GridRect::from_corners(
        GridCell::new(min_row, min_col),
        GridCell::new(max_row, max_col),
    );
    let merge_rect = tileset.metrics().cell_to_pixel(range);
    let target = model.tile_at(tileset, range.origin());

    let to_remove: Vec<TileId> = tileset
        .tiles()
        .iter()
        .filter(|tile| Some(tile.id) != target.map(|t| t.id))
        .filter(|tile| merge_rect.contains_point(tile.image_rect.top_left()))
        .map(|tile| tile.id)
        .collect();

    let mut batch = CommandBatch::new("Merge Tiles");
    if !to_remove.is_empty() {
        batch.push(TileCommand::RemoveTiles(to_remove));
    }
    match target {
        Some(tile) => {
            if tile.image_rect == merge_rect && batch.is_empty() {
                return None;
            }
            batch.push(TileCommand::ChangeImageRects(vec![(tile.id, merge_rect)]));
        }
        None => {
            let id = tileset.generate_tile_id(min_col, min_row);
            batch.push(TileCommand::AddTiles(vec![Tile::new(id, merge_rect)]));
        }
    }

    tracing::debug!(
        "Merge rows {}..={} cols {}..={} into {:?}",
        min_row,
        max_row,
        min_col,
        max_col,
        merge_rect
    );
    Some(batch)
}

/// Edge of a span that a split cuts off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SplitEdge {
    Left,
    Right,
    Top,
    Bottom,
}

/// Edge nearest to a relative cell; ties resolve left, right, top, bottom
fn nearest_edge(rel_row: i32, rel_col: i32, width: i32, height: i32) -> SplitEdge {
    let col_ratio = rel_col as f32 / width as f32;
    let row_ratio = rel_row as f32 / height as f32;
    let left = col_ratio;
    let right = 1.0 - col_ratio;
    let top = row_ratio;
    let bottom = 1.0 - row_ratio;
    let min = left.min(right).min(top).min(bottom);

    if min == left {
        SplitEdge::Left
    } else if min == right {
        SplitEdge::Right
    } else if min == top {
        SplitEdge::Top
    } else {
        SplitEdge::Bottom
    }
}

/// Split a span at the cell `(rel_row, rel_col)` relative to its origin.
///
/// The part between the clicked cell and the nearest edge is broken into
/// 1x1 tiles; the rest stays a span. Clicking the origin cell dissolves the
/// whole span. Returns `None` for 1x1 tiles and clicks outside the span.
pub fn split_span(
    model: &TilesetModel,
    tileset: &Tileset,
    span_tile: TileId,
    rel_row: i32,
    rel_col: i32,
) -> Option<CommandBatch> {
    if !grid_matches_atlas(model, tileset) {
        return None;
    }
    let tile = tileset.find_tile(span_tile)?;
    let base = model.tile_index(tileset, tile).ok()?;
    let span = span_of_tile(tileset, tile);

    if !span.is_multi_cell()
        || rel_col < 0
        || rel_col >= span.width
        || rel_row < 0
        || rel_row >= span.height
    {
        return None;
    }

    let (keep, split) = if rel_row == 0 && rel_col == 0 {
        (
            GridRect::new(base.row, base.col, 0, 0),
            GridRect::from_span(base, span),
        )
    } else {
        match nearest_edge(rel_row, rel_col, span.width, span.height) {
            SplitEdge::Left => (
                GridRect::new(
                    base.row,
                    base.col + rel_col + 1,
                    span.height,
                    span.width - rel_col - 1,
                ),
                GridRect::new(base.row, base.col, span.height, rel_col + 1),
            ),
            SplitEdge::Right => (
                GridRect::new(base.row, base.col, span.height, rel_col),
                GridRect::new(base.row, base.col + rel_col, span.height, span.width - rel_col),
            ),
            SplitEdge::Top => (
                GridRect::new(
                    base.row + rel_row + 1,
                    base.col,
                    span.height - rel_row - 1,
                    span.width,
                ),
                GridRect::new(base.row, base.col, rel_row + 1, span.width),
            ),
            SplitEdge::Bottom => (
                GridRect::new(base.row, base.col, rel_row, span.width),
                GridRect::new(base.row + rel_row, base.col, span.height - rel_row, span.width),
            ),
        }
    };

    let metrics = tileset.metrics();
    let whole = metrics.cell_to_pixel(GridRect::from_span(base, span));
    let mut batch = CommandBatch::new("Split Tiles");

    let to_remove: Vec<TileId> = tileset
        .tiles()
        .iter()
        .filter(|other| other.id != span_tile)
        .filter(|other| whole.contains_point(other.image_rect.top_left()))
        .map(|other| other.id)
        .collect();
    if !to_remove.is_empty() {
        batch.push(TileCommand::RemoveTiles(to_remove));
    }

    let mut new_tiles = Vec::new();
    if split.contains(base) {
        batch.push(TileCommand::ChangeImageRects(vec![(
            span_tile,
            metrics.cell_to_pixel(GridRect::from_cell(base)),
        )]));
        if !keep.is_empty() {
            let id = tileset.generate_tile_id(keep.col, keep.row);
            new_tiles.push(Tile::new(id, metrics.cell_to_pixel(keep)));
        }
    } else {
        batch.push(TileCommand::ChangeImageRects(vec![(
            span_tile,
            metrics.cell_to_pixel(keep),
        )]));
    }

    for cell in split.cells() {
        // The span tile stays at its origin
        if cell == base {
            continue;
        }
        let id = tileset.generate_tile_id(cell.col, cell.row);
        new_tiles.push(Tile::new(id, metrics.cell_to_pixel(GridRect::from_cell(cell))));
    }
    if !new_tiles.is_empty() {
        batch.push(TileCommand::AddTiles(new_tiles));
    }

    tracing::debug!(
        "Split {} at ({}, {}): keep {:?}, split {:?}",
        span_tile,
        rel_row,
        rel_col,
        keep,
        split
    );
    Some(batch)
}

/// Create a free-form atlas tile over a pixel rect.
///
/// Tiles whose image origin lies inside the rect are replaced. The new id is
/// allocated past the generated grid ids so it never collides with a cell.
pub fn create_tile(tileset: &Tileset, rect: PixelRect) -> Option<CommandBatch> {
    if !tileset.is_atlas() || rect.is_empty() {
        return None;
    }

    let to_remove: Vec<TileId> = tileset
        .tiles()
        .iter()
        .filter(|tile| rect.contains_point(tile.image_rect.top_left()))
        .map(|tile| tile.id)
        .collect();

    let grid_end = TileId(tileset.rows * tileset.columns);
    let id = tileset.next_tile_id().max(grid_end);

    let mut batch = CommandBatch::new("Create Tile");
    if !to_remove.is_empty() {
        batch.push(TileCommand::RemoveTiles(to_remove));
    }
    batch.push(TileCommand::AddTiles(vec![Tile::new(id, rect)]));
    Some(batch)
}

/// Remove every tile whose image rect intersects a pixel rect
pub fn remove_tiles_intersecting(tileset: &Tileset, rect: PixelRect) -> Option<CommandBatch> {
    if !tileset.is_atlas() {
        return None;
    }
    let ids: Vec<TileId> = tileset
        .tiles()
        .iter()
        .filter(|tile| tile.image_rect.intersects(&rect))
        .map(|tile| tile.id)
        .collect();
    if ids.is_empty() {
        return None;
    }
    Some(CommandBatch::single("Remove Tiles", TileCommand::RemoveTiles(ids)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::TilesetDocument;
    use crate::geometry::SpanSize;

    fn atlas() -> Tileset {
        Tileset::new_atlas_with_spacing("Ground".to_string(), 16, 16, 8, 6, 2, 1)
    }

    fn apply(doc: &mut TilesetDocument, model: &mut TilesetModel, batch: CommandBatch) {
        let changes = doc.apply_batch(batch).unwrap();
        model.document_changed(doc.tileset(), &changes);
    }

    #[test]
    fn test_nearest_edge_tie_order() {
        assert_eq!(nearest_edge(1, 1, 2, 2), SplitEdge::Left);
        assert_eq!(nearest_edge(0, 2, 3, 1), SplitEdge::Top);
        assert_eq!(nearest_edge(3, 2, 4, 4), SplitEdge::Bottom);
        assert_eq!(nearest_edge(0, 3, 4, 4), SplitEdge::Top);
        assert_eq!(nearest_edge(1, 3, 4, 3), SplitEdge::Right);
    }

    #[test]
    fn test_merge_degenerate_range() {
        let tileset = atlas();
        let model = TilesetModel::new(&tileset);
        assert!(merge_span(&model, &tileset, 3, 2, 0, 0).is_none());
        assert!(merge_span(&model, &tileset, 0, 0, 4, 1).is_none());
        assert!(merge_span(&model, &tileset, -1, 0, 0, 0).is_none());
    }

    #[test]
    fn test_merge_is_rejected_on_rewrapped_grid() {
        let tileset = atlas();
        let mut model = TilesetModel::new(&tileset);
        model.set_column_count_override(3);
        assert!(merge_span(&model, &tileset, 0, 1, 0, 1).is_none());
    }

    #[test]
    fn test_merge_into_empty_origin_creates_tile() {
        let mut tileset = atlas();
        tileset.tiles_mut().retain(|t| t.id != TileId(0));
        let model = TilesetModel::new(&tileset);
        let batch = merge_span(&model, &tileset, 0, 0, 0, 1).unwrap();
        assert_eq!(
            batch.commands,
            vec![
                TileCommand::RemoveTiles(vec![TileId(1)]),
                TileCommand::AddTiles(vec![Tile::new(TileId(0), PixelRect::new(2, 2, 32, 16))]),
            ]
        );
    }

    #[test]
    fn test_split_right_edge_keeps_left_span() {
        let tileset = atlas();
        let mut doc = TilesetDocument::new(tileset);
        let mut model = TilesetModel::new(doc.tileset());
        let batch = merge_span(&model, doc.tileset(), 0, 1, 0, 3).unwrap();
        apply(&mut doc, &mut model, batch);

        // Column 3 of a 4x2 span is nearest the right edge
        let batch = split_span(&model, doc.tileset(), TileId(0), 1, 3).unwrap();
        apply(&mut doc, &mut model, batch);

        let ts = doc.tileset();
        assert_eq!(
            model.tile_span_size(ts, GridCell::new(0, 0)),
            SpanSize::new(3, 2)
        );
        assert!(model.tile_at(ts, GridCell::new(0, 3)).is_some());
        assert!(model.tile_at(ts, GridCell::new(1, 3)).is_some());
        assert!(model.tile_at(ts, GridCell::new(1, 1)).is_none());
    }

    #[test]
    fn test_split_left_edge_moves_span() {
        let tileset = atlas();
        let mut doc = TilesetDocument::new(tileset);
        let mut model = TilesetModel::new(doc.tileset());
        let batch = merge_span(&model, doc.tileset(), 0, 1, 0, 3).unwrap();
        apply(&mut doc, &mut model, batch);

        let batch = split_span(&model, doc.tileset(), TileId(0), 1, 1).unwrap();
        apply(&mut doc, &mut model, batch);

        let ts = doc.tileset();
        assert_eq!(
            model.tile_span_size(ts, GridCell::new(0, 0)),
            SpanSize::SINGLE
        );
        assert!(model.tile_at(ts, GridCell::new(0, 1)).is_some());
        assert_eq!(
            model.tile_span_size(ts, GridCell::new(0, 2)),
            SpanSize::new(2, 2)
        );
        assert_eq!(ts.tile_count(), 8 * 6 - 3);
    }

    #[test]
    fn test_split_rejects_single_and_outside() {
        let tileset = atlas();
        let model = TilesetModel::new(&tileset);
        assert!(split_span(&model, &tileset, TileId(0), 0, 0).is_none());
        assert!(split_span(&model, &tileset, TileId(99), 0, 0).is_none());
    }

    #[test]
    fn test_create_tile_allocates_past_grid() {
        let tileset = atlas();
        let batch = create_tile(&tileset, PixelRect::new(3, 3, 20, 10)).unwrap();
        let last = batch.commands.last().unwrap();
        assert_eq!(
            *last,
            TileCommand::AddTiles(vec![Tile::new(TileId(48), PixelRect::new(3, 3, 20, 10))])
        );
        assert!(create_tile(&tileset, PixelRect::new(0, 0, 0, 5)).is_none());
    }

    #[test]
    fn test_remove_intersecting() {
        let tileset = atlas();
        // Covers the right part of cell (0,0) and the left part of (0,1)
        let batch = remove_tiles_intersecting(&tileset, PixelRect::new(10, 4, 12, 4)).unwrap();
        assert_eq!(
            batch.commands,
            vec![TileCommand::RemoveTiles(vec![TileId(0), TileId(1)])]
        );
        assert!(remove_tiles_intersecting(&tileset, PixelRect::new(500, 500, 4, 4)).is_none());
    }
}
