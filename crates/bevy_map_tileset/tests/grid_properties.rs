//! Cross-module behaviour of the grid model, span editing and the document

use bevy_map_tileset::{
    create_tile, merge_span, split_span, DropAction, GridCell, PixelRect, SpanSize, Tile, TileCommand, TileId,
    Tileset, TilesetDocument, TilesetModel,
};

fn collection(count: i32) -> Tileset {
    let mut tileset = Tileset::new_collection("Props".to_string(), 24, 24);
    for id in 0..count {
        tileset.push_tile(Tile::with_image(TileId(id), format!("props/{}.png", id), 24, 24));
    }
    tileset
}

fn atlas() -> Tileset {
    Tileset::new_atlas_with_spacing("Terrain".to_string(), 16, 12, 10, 8, 3, 2)
}

fn apply(doc: &mut TilesetDocument, model: &mut TilesetModel, commands: Vec<TileCommand>) {
    let mut batch = bevy_map_tileset::CommandBatch::new("Test");
    for command in commands {
        batch.push(command);
    }
    let changes = doc.apply_batch(batch).unwrap();
    model.document_changed(doc.tileset(), &changes);
}

fn apply_batch(
    doc: &mut TilesetDocument,
    model: &mut TilesetModel,
    batch: bevy_map_tileset::CommandBatch,
) {
    let changes = doc.apply_batch(batch).unwrap();
    model.document_changed(doc.tileset(), &changes);
}

fn ids(tileset: &Tileset) -> Vec<i32> {
    let mut ids: Vec<i32> = tileset.tiles().iter().map(|t| t.id.0).collect();
    ids.sort();
    ids
}

#[test]
fn test_collection_rows_follow_tile_count() {
    for count in 1..=23 {
        let tileset = collection(count);
        let model = TilesetModel::new(&tileset);
        assert_eq!(model.column_count(&tileset), 5);
        assert_eq!(model.row_count(&tileset), (count + 4) / 5, "{} tiles", count);
    }
}

#[test]
fn test_collection_override_layout() {
    let tileset = collection(10);
    let mut model = TilesetModel::new(&tileset);
    model.set_column_count_override(3);
    assert_eq!(model.row_count(&tileset), 4);
    assert_eq!(model.column_count(&tileset), 3);
}

#[test]
fn test_atlas_tile_index_round_trip() {
    let tileset = atlas();
    let model = TilesetModel::new(&tileset);
    for tile in tileset.tiles() {
        let cell = model.tile_index(&tileset, tile).unwrap();
        assert_eq!(model.tile_at(&tileset, cell).map(|t| t.id), Some(tile.id));
    }
}

#[test]
fn test_merge_pixel_rect() {
    let tileset = atlas();
    let model = TilesetModel::new(&tileset);
    let batch = merge_span(&model, &tileset, 2, 3, 3, 6).unwrap();
    let expected = PixelRect::new(3 + 3 * (16 + 2), 3 + 2 * (12 + 2), 4 * 16, 2 * 12);
    let target = tileset.generate_tile_id(3, 2);
    assert!(batch
        .commands
        .contains(&TileCommand::ChangeImageRects(vec![(target, expected)])));
}

#[test]
fn test_merge_removes_exactly_the_covered_tiles() {
    let mut doc = TilesetDocument::new(atlas());
    let mut model = TilesetModel::new(doc.tileset());
    let before = doc.tileset().tile_count();

    let batch = merge_span(&model, doc.tileset(), 2, 3, 3, 6).unwrap();
    apply_batch(&mut doc, &mut model, batch);

    let ts = doc.tileset();
    assert_eq!(ts.tile_count(), before - 7);
    for row in 2..=3 {
        for col in 3..=6 {
            let cell = GridCell::new(row, col);
            if row == 2 && col == 3 {
                assert_eq!(model.tile_span_size(ts, cell), SpanSize::new(4, 2));
            } else {
                assert!(model.tile_at(ts, cell).is_none());
                assert!(model.is_cell_covered_by_span(ts, cell));
            }
        }
    }
    // Neighbours are untouched
    assert!(model.tile_at(ts, GridCell::new(2, 7)).is_some());
    assert!(model.tile_at(ts, GridCell::new(4, 3)).is_some());
}

#[test]
fn test_merge_then_split_at_origin_restores_tiles() {
    let original = atlas();
    let original_ids = ids(&original);
    let mut doc = TilesetDocument::new(original.clone());
    let mut model = TilesetModel::new(doc.tileset());

    let batch = merge_span(&model, doc.tileset(), 1, 3, 2, 4).unwrap();
    apply_batch(&mut doc, &mut model, batch);
    let span_tile = doc.tileset().generate_tile_id(2, 1);

    let batch = split_span(&model, doc.tileset(), span_tile, 0, 0).unwrap();
    apply_batch(&mut doc, &mut model, batch);

    assert_eq!(ids(doc.tileset()), original_ids);
    for tile in doc.tileset().tiles() {
        let source = original.find_tile(tile.id).unwrap();
        assert_eq!(tile.image_rect, source.image_rect);
    }
}

#[test]
fn test_split_at_origin_creates_single_tiles() {
    let mut doc = TilesetDocument::new(atlas());
    let mut model = TilesetModel::new(doc.tileset());
    let batch = merge_span(&model, doc.tileset(), 0, 2, 0, 3).unwrap();
    apply_batch(&mut doc, &mut model, batch);
    let count_merged = doc.tileset().tile_count();

    let batch = split_span(&model, doc.tileset(), TileId(0), 0, 0).unwrap();
    let added = batch
        .commands
        .iter()
        .find_map(|c| match c {
            TileCommand::AddTiles(tiles) => Some(tiles.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(added.len(), 4 * 3 - 1);
    for (i, a) in added.iter().enumerate() {
        assert_eq!(a.image_rect.width, 16);
        assert_eq!(a.image_rect.height, 12);
        for b in added.iter().skip(i + 1) {
            assert!(!a.image_rect.intersects(&b.image_rect));
        }
    }

    apply_batch(&mut doc, &mut model, batch);
    assert_eq!(doc.tileset().tile_count(), count_merged + 11);
    assert_eq!(
        model.tile_span_size(doc.tileset(), GridCell::new(0, 0)),
        SpanSize::SINGLE
    );
}

#[test]
fn test_merge_and_split_undo_as_one_step() {
    let mut doc = TilesetDocument::new(atlas());
    let mut model = TilesetModel::new(doc.tileset());
    let before = ids(doc.tileset());

    let batch = merge_span(&model, doc.tileset(), 0, 1, 0, 1).unwrap();
    apply_batch(&mut doc, &mut model, batch);
    assert_eq!(doc.history().undo_description(), Some("Merge Tiles"));

    let changes = doc.undo().unwrap();
    model.document_changed(doc.tileset(), &changes);
    assert_eq!(ids(doc.tileset()), before);
    assert_eq!(
        model.tile_span_size(doc.tileset(), GridCell::new(0, 0)),
        SpanSize::SINGLE
    );
}

#[test]
fn test_drop_moves_tile_to_target_index() {
    let mut doc = TilesetDocument::new(collection(20));
    let mut model = TilesetModel::new(doc.tileset());

    let source = model.tile_index_of(doc.tileset(), TileId(7)).unwrap();
    let target = model.tile_index_of(doc.tileset(), TileId(12)).unwrap();
    let payload = model.mime_data(doc.tileset(), &[source]).unwrap();
    let command = model
        .drop_mime_data(doc.tileset(), &payload, DropAction::Move, Some(target))
        .unwrap();
    apply(&mut doc, &mut model, vec![command]);

    assert_eq!(doc.tileset().tile_position(TileId(7)), Some(12));
    assert_eq!(model.tile_ids()[12], TileId(7));
    assert_eq!(
        model.tile_at(doc.tileset(), GridCell::new(2, 2)).map(|t| t.id),
        Some(TileId(7))
    );
}

#[test]
fn test_merge_removes_free_tiles_by_pixel_origin() {
    let mut doc = TilesetDocument::new(Tileset::new_atlas("Small".to_string(), 16, 16, 4, 4));
    let mut model = TilesetModel::new(doc.tileset());

    // Off-grid tile whose origin lies in cell (0, 1) but nearer to (0, 2)
    let batch = create_tile(doc.tileset(), PixelRect::new(24, 0, 8, 8)).unwrap();
    apply_batch(&mut doc, &mut model, batch);
    let free = TileId(16);
    assert!(doc.tileset().find_tile(free).is_some());

    let batch = merge_span(&model, doc.tileset(), 0, 0, 0, 1).unwrap();
    let mut removed = match &batch.commands[0] {
        TileCommand::RemoveTiles(ids) => ids.clone(),
        other => panic!("expected a removal first, got {:?}", other),
    };
    removed.sort_by_key(|id| id.0);
    assert_eq!(removed, vec![TileId(1), free]);

    apply_batch(&mut doc, &mut model, batch);
    assert!(doc.tileset().find_tile(free).is_none());
    assert!(doc.tileset().find_tile(TileId(2)).is_some());
}

#[test]
fn test_split_removes_free_tiles_inside_span() {
    let mut doc = TilesetDocument::new(Tileset::new_atlas("Small".to_string(), 16, 16, 4, 4));
    let mut model = TilesetModel::new(doc.tileset());

    let batch = merge_span(&model, doc.tileset(), 0, 1, 0, 1).unwrap();
    apply_batch(&mut doc, &mut model, batch);
    let batch = create_tile(doc.tileset(), PixelRect::new(20, 20, 4, 4)).unwrap();
    apply_batch(&mut doc, &mut model, batch);
    let free = TileId(16);

    let batch = split_span(&model, doc.tileset(), TileId(0), 0, 0).unwrap();
    assert!(batch
        .commands
        .contains(&TileCommand::RemoveTiles(vec![free])));
    apply_batch(&mut doc, &mut model, batch);

    assert!(doc.tileset().find_tile(free).is_none());
    assert_eq!(doc.tileset().tile_count(), 16);
}
