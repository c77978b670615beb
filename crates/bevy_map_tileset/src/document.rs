//! Command executor and undo history for a tileset

use crate::command::{CommandBatch, CommandError, DocumentChange, TileCommand};
use crate::tileset::{Tile, TileId, Tileset};
use crate::wang::{WangId, WangSet};
use std::collections::{HashMap, HashSet};

/// Maximum number of undo steps kept
const MAX_HISTORY: usize = 100;

/// One undoable step
#[derive(Debug, Clone)]
pub struct UndoEntry {
    pub description: String,
    /// Commands that (re)do this step
    forward: Vec<TileCommand>,
    /// Commands that undo this step, in application order
    inverse: Vec<TileCommand>,
    /// An unfinished WangId stroke that later paint commands merge into
    open_stroke: bool,
}

/// Undo/redo stacks
#[derive(Debug, Default)]
pub struct CommandHistory {
    undo_stack: Vec<UndoEntry>,
    redo_stack: Vec<UndoEntry>,
}

impl CommandHistory {
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Description of the step `undo` would revert
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.last().map(|e| e.description.as_str())
    }

    /// Description of the step `redo` would reapply
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.last().map(|e| e.description.as_str())
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    fn push_undo(&mut self, entry: UndoEntry) {
        self.undo_stack.push(entry);
        if self.undo_stack.len() > MAX_HISTORY {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    fn open_stroke_mut(&mut self) -> Option<&mut UndoEntry> {
        self.undo_stack.last_mut().filter(|e| e.open_stroke)
    }

    fn close_stroke(&mut self) -> bool {
        match self.open_stroke_mut() {
            Some(entry) => {
                entry.open_stroke = false;
                true
            }
            None => false,
        }
    }
}

/// Owns a tileset, its Wang sets and the undo history.
///
/// All mutations go through [`TilesetDocument::apply_batch`], [`TilesetDocument::undo`]
/// and [`TilesetDocument::redo`]; each returns the changes to forward to the
/// grid model.
#[derive(Debug)]
#[cfg_attr(feature = "bevy", derive(bevy::prelude::Resource))]
pub struct TilesetDocument {
    tileset: Tileset,
    wang_sets: Vec<WangSet>,
    history: CommandHistory,
}

impl TilesetDocument {
    pub fn new(tileset: Tileset) -> Self {
        Self {
            tileset,
            wang_sets: Vec::new(),
            history: CommandHistory::default(),
        }
    }

    pub fn with_wang_set(mut self, wang_set: WangSet) -> Self {
        self.wang_sets.push(wang_set);
        self
    }

    pub fn tileset(&self) -> &Tileset {
        &self.tileset
    }

    pub fn wang_sets(&self) -> &[WangSet] {
        &self.wang_sets
    }

    pub fn wang_set(&self, index: usize) -> Option<&WangSet> {
        self.wang_sets.get(index)
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    /// Apply a batch as one undo step.
    ///
    /// WangId batches merge into the previous step while a stroke is open; a
    /// batch consisting of [`TileCommand::FinishWangIdChange`] closes the
    /// stroke. On error nothing is changed.
    pub fn apply_batch(&mut self, batch: CommandBatch) -> Result<Vec<DocumentChange>, CommandError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        if batch.is_stroke_end() {
            self.history.close_stroke();
            return Ok(Vec::new());
        }

        let (inverse, changes) = self.run(&batch.commands)?;
        let mergeable = batch.is_mergeable();

        if mergeable {
            if let Some(entry) = self.history.open_stroke_mut() {
                entry.forward.extend(batch.commands);
                let mut merged = inverse;
                merged.append(&mut entry.inverse);
                entry.inverse = merged;
                return Ok(changes);
            }
        } else {
            self.history.close_stroke();
        }

        tracing::debug!("Applied '{}'", batch.description);
        self.history.push_undo(UndoEntry {
            description: batch.description,
            forward: batch.commands,
            inverse,
            open_stroke: mergeable,
        });
        Ok(changes)
    }

    /// Apply a single command as its own undo step
    pub fn apply(
        &mut self,
        description: impl Into<String>,
        command: TileCommand,
    ) -> Result<Vec<DocumentChange>, CommandError> {
        self.apply_batch(CommandBatch::single(description, command))
    }

    pub fn undo(&mut self) -> Result<Vec<DocumentChange>, CommandError> {
        let mut entry = self
            .history
            .undo_stack
            .pop()
            .ok_or(CommandError::NothingToUndo)?;
        match self.run(&entry.inverse) {
            Ok((_, changes)) => {
                entry.open_stroke = false;
                self.history.redo_stack.push(entry);
                Ok(changes)
            }
            Err(e) => {
                tracing::error!("Failed to undo '{}': {}", entry.description, e);
                self.history.undo_stack.push(entry);
                Err(e)
            }
        }
    }

    pub fn redo(&mut self) -> Result<Vec<DocumentChange>, CommandError> {
        let mut entry = self
            .history
            .redo_stack
            .pop()
            .ok_or(CommandError::NothingToRedo)?;
        match self.run(&entry.forward) {
            Ok((inverse, changes)) => {
                entry.inverse = inverse;
                self.history.undo_stack.push(entry);
                Ok(changes)
            }
            Err(e) => {
                tracing::error!("Failed to redo '{}': {}", entry.description, e);
                self.history.redo_stack.push(entry);
                Err(e)
            }
        }
    }

    /// Run commands in order. Returns the inverse commands (in application
    /// order) and the changes. Rolls back on error.
    fn run(
        &mut self,
        commands: &[TileCommand],
    ) -> Result<(Vec<TileCommand>, Vec<DocumentChange>), CommandError> {
        let mut inverses: Vec<Vec<TileCommand>> = Vec::with_capacity(commands.len());
        let mut changes = Vec::new();

        for command in commands {
            match self.execute(command) {
                Ok((inverse, change)) => {
                    inverses.push(inverse);
                    changes.extend(change);
                }
                Err(e) => {
                    for inverse in inverses.iter().rev() {
                        for undo in inverse {
                            if let Err(rollback) = self.execute(undo) {
                                tracing::error!("Rollback failed: {}", rollback);
                            }
                        }
                    }
                    return Err(e);
                }
            }
        }

        let inverse = inverses.into_iter().rev().flatten().collect();
        Ok((inverse, changes))
    }

    /// Execute one command, returning its inverse and the resulting change
    fn execute(
        &mut self,
        command: &TileCommand,
    ) -> Result<(Vec<TileCommand>, Option<DocumentChange>), CommandError> {
        match command {
            TileCommand::AddTiles(tiles) => {
                self.check_new_ids(tiles.iter())?;
                let ids: Vec<TileId> = tiles.iter().map(|t| t.id).collect();
                for tile in tiles {
                    self.tileset.push_tile(tile.clone());
                }
                Ok((
                    vec![TileCommand::RemoveTiles(ids.clone())],
                    Some(DocumentChange::TilesAdded(ids)),
                ))
            }
            TileCommand::InsertTiles(entries) => {
                self.check_new_ids(entries.iter().map(|(_, t)| t))?;
                let ids: Vec<TileId> = entries.iter().map(|(_, t)| t.id).collect();
                for (index, tile) in entries {
                    self.tileset.insert_tile(*index, tile.clone());
                }
                Ok((
                    vec![TileCommand::RemoveTiles(ids.clone())],
                    Some(DocumentChange::TilesAdded(ids)),
                ))
            }
            TileCommand::RemoveTiles(ids) => {
                for id in ids {
                    if self.tileset.find_tile(*id).is_none() {
                        return Err(CommandError::UnknownTile(*id));
                    }
                }
                let mut removed = Vec::with_capacity(ids.len());
                let mut wang_restores: Vec<(usize, Vec<(TileId, WangId)>)> = Vec::new();
                for id in ids {
                    if let Some(entry) = self.tileset.remove_tile(*id) {
                        removed.push(entry);
                    }
                    for (set_index, set) in self.wang_sets.iter_mut().enumerate() {
                        if let Some(old) = set.forget_tile(*id) {
                            match wang_restores.iter_mut().find(|(i, _)| *i == set_index) {
                                Some((_, list)) => list.push((*id, old)),
                                None => wang_restores.push((set_index, vec![(*id, old)])),
                            }
                        }
                    }
                }
                removed.reverse();
                let mut inverse = vec![TileCommand::InsertTiles(removed)];
                for (wang_set, changes) in wang_restores {
                    inverse.push(TileCommand::ChangeWangIds { wang_set, changes });
                }
                Ok((inverse, Some(DocumentChange::TilesRemoved(ids.clone()))))
            }
            TileCommand::ChangeImageRects(changes) => {
                for (id, _) in changes {
                    if self.tileset.find_tile(*id).is_none() {
                        return Err(CommandError::UnknownTile(*id));
                    }
                }
                let mut old = Vec::with_capacity(changes.len());
                for (id, rect) in changes {
                    if let Some(tile) = self.tileset.find_tile_mut(*id) {
                        old.push((*id, tile.image_rect));
                        tile.image_rect = *rect;
                    }
                }
                old.reverse();
                let ids = changes.iter().map(|(id, _)| *id).collect();
                Ok((
                    vec![TileCommand::ChangeImageRects(old)],
                    Some(DocumentChange::TileImageRectsChanged(ids)),
                ))
            }
            TileCommand::RelocateTiles { tiles, location } => {
                let len = self.tileset.tile_count();
                if *location >= len {
                    return Err(CommandError::LocationOutOfRange {
                        location: *location,
                        len,
                    });
                }
                for id in tiles {
                    if self.tileset.find_tile(*id).is_none() {
                        return Err(CommandError::UnknownTile(*id));
                    }
                }
                let previous = self.tileset.tile_ids();
                let mut location = *location;
                let list = self.tileset.tiles_mut();
                for id in tiles {
                    let Some(from) = list.iter().position(|t| t.id == *id) else {
                        continue;
                    };
                    let tile = list.remove(from);
                    list.insert(location.min(list.len()), tile);
                    if from > location {
                        location += 1;
                    }
                }
                Ok((
                    vec![TileCommand::ReorderTiles(previous)],
                    Some(DocumentChange::TilesRelocated),
                ))
            }
            TileCommand::ReorderTiles(order) => {
                let previous = self.tileset.tile_ids();
                let current: HashSet<TileId> = previous.iter().copied().collect();
                let requested: HashSet<TileId> = order.iter().copied().collect();
                if order.len() != previous.len() || current != requested {
                    return Err(CommandError::InvalidOrder);
                }
                let rank: HashMap<TileId, usize> =
                    order.iter().enumerate().map(|(i, id)| (*id, i)).collect();
                self.tileset
                    .tiles_mut()
                    .sort_by_key(|t| rank.get(&t.id).copied().unwrap_or(usize::MAX));
                Ok((
                    vec![TileCommand::ReorderTiles(previous)],
                    Some(DocumentChange::TilesRelocated),
                ))
            }
            TileCommand::ChangeWangIds { wang_set, changes } => {
                if *wang_set >= self.wang_sets.len() {
                    return Err(CommandError::UnknownWangSet(*wang_set));
                }
                for (id, _) in changes {
                    if self.tileset.find_tile(*id).is_none() {
                        return Err(CommandError::UnknownTile(*id));
                    }
                }
                let set = &mut self.wang_sets[*wang_set];
                let mut old = Vec::with_capacity(changes.len());
                for (id, wang_id) in changes {
                    old.push((*id, set.wang_id_of_tile(*id)));
                    set.set_wang_id(*id, *wang_id);
                }
                old.reverse();
                let tiles = changes.iter().map(|(id, _)| *id).collect();
                Ok((
                    vec![TileCommand::ChangeWangIds {
                        wang_set: *wang_set,
                        changes: old,
                    }],
                    Some(DocumentChange::WangIdsChanged {
                        wang_set: *wang_set,
                        tiles,
                    }),
                ))
            }
            TileCommand::FinishWangIdChange => Ok((Vec::new(), None)),
        }
    }

    fn check_new_ids<'a>(&self, tiles: impl Iterator<Item = &'a Tile>) -> Result<(), CommandError> {
        let mut seen = HashSet::new();
        for tile in tiles {
            if self.tileset.find_tile(tile.id).is_some() || !seen.insert(tile.id) {
                return Err(CommandError::DuplicateTile(tile.id));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PixelRect;
    use crate::wang::{WangColor, WangSetType};

    fn collection(ids: &[i32]) -> Tileset {
        let mut tileset = Tileset::new_collection("Props".to_string(), 32, 32);
        for id in ids {
            tileset.push_tile(Tile::with_image(TileId(*id), format!("{}.png", id), 32, 32));
        }
        tileset
    }

    fn ids(doc: &TilesetDocument) -> Vec<i32> {
        doc.tileset().tiles().iter().map(|t| t.id.0).collect()
    }

    #[test]
    fn test_remove_and_undo_restores_order() {
        let mut doc = TilesetDocument::new(collection(&[0, 1, 2, 3]));
        doc.apply("Remove", TileCommand::RemoveTiles(vec![TileId(1), TileId(3)]))
            .unwrap();
        assert_eq!(ids(&doc), vec![0, 2]);

        doc.undo().unwrap();
        assert_eq!(ids(&doc), vec![0, 1, 2, 3]);

        doc.redo().unwrap();
        assert_eq!(ids(&doc), vec![0, 2]);
    }

    #[test]
    fn test_relocate_moves_to_location() {
        let mut doc = TilesetDocument::new(collection(&[0, 1, 2, 3, 4]));
        let changes = doc
            .apply(
                "Relocate",
                TileCommand::RelocateTiles {
                    tiles: vec![TileId(4)],
                    location: 1,
                },
            )
            .unwrap();
        assert_eq!(changes, vec![DocumentChange::TilesRelocated]);
        assert_eq!(ids(&doc), vec![0, 4, 1, 2, 3]);

        doc.undo().unwrap();
        assert_eq!(ids(&doc), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_relocate_several_keeps_their_order() {
        let mut doc = TilesetDocument::new(collection(&[0, 1, 2, 3, 4]));
        doc.apply(
            "Relocate",
            TileCommand::RelocateTiles {
                tiles: vec![TileId(3), TileId(4)],
                location: 0,
            },
        )
        .unwrap();
        assert_eq!(ids(&doc), vec![3, 4, 0, 1, 2]);
    }

    #[test]
    fn test_failed_batch_rolls_back() {
        let mut doc = TilesetDocument::new(collection(&[0, 1]));
        let mut batch = CommandBatch::new("Broken");
        batch.push(TileCommand::RemoveTiles(vec![TileId(0)]));
        batch.push(TileCommand::ChangeImageRects(vec![(
            TileId(9),
            PixelRect::new(0, 0, 1, 1),
        )]));

        let err = doc.apply_batch(batch).unwrap_err();
        assert_eq!(err, CommandError::UnknownTile(TileId(9)));
        assert_eq!(ids(&doc), vec![0, 1]);
        assert!(!doc.history().can_undo());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut doc = TilesetDocument::new(collection(&[0]));
        let err = doc
            .apply(
                "Add",
                TileCommand::AddTiles(vec![Tile::new(TileId(0), PixelRect::new(0, 0, 8, 8))]),
            )
            .unwrap_err();
        assert_eq!(err, CommandError::DuplicateTile(TileId(0)));
    }

    #[test]
    fn test_wang_stroke_merges_until_finished() {
        let set = WangSet::new("Ground", WangSetType::Corner)
            .with_color(WangColor::new("Grass", [0, 200, 0]));
        let mut doc = TilesetDocument::new(collection(&[0, 1, 2])).with_wang_set(set);
        let paint = |tile: i32| {
            CommandBatch::single(
                "Change Tile Terrain",
                TileCommand::ChangeWangIds {
                    wang_set: 0,
                    changes: vec![(TileId(tile), WangId::filled(1))],
                },
            )
        };

        doc.apply_batch(paint(0)).unwrap();
        doc.apply_batch(paint(1)).unwrap();
        doc.apply_batch(CommandBatch::single("End", TileCommand::FinishWangIdChange))
            .unwrap();
        doc.apply_batch(paint(2)).unwrap();
        assert_eq!(doc.history().undo_len(), 2);

        doc.undo().unwrap();
        let set = doc.wang_set(0).unwrap();
        assert_eq!(set.wang_id_of_tile(TileId(2)), WangId::EMPTY);
        assert_eq!(set.wang_id_of_tile(TileId(1)), WangId::filled(1));

        doc.undo().unwrap();
        let set = doc.wang_set(0).unwrap();
        assert_eq!(set.wang_id_of_tile(TileId(0)), WangId::EMPTY);
        assert_eq!(set.wang_id_of_tile(TileId(1)), WangId::EMPTY);
    }

    #[test]
    fn test_undo_of_removal_restores_wang_ids() {
        let mut set = WangSet::new("Ground", WangSetType::Edge);
        set.set_wang_id(TileId(1), WangId::filled(2));
        let mut doc = TilesetDocument::new(collection(&[0, 1])).with_wang_set(set);

        doc.apply("Remove", TileCommand::RemoveTiles(vec![TileId(1)]))
            .unwrap();
        assert_eq!(doc.wang_set(0).unwrap().wang_id_of_tile(TileId(1)), WangId::EMPTY);

        doc.undo().unwrap();
        assert_eq!(
            doc.wang_set(0).unwrap().wang_id_of_tile(TileId(1)),
            WangId::filled(2)
        );
    }

    #[test]
    fn test_nothing_to_undo() {
        let mut doc = TilesetDocument::new(collection(&[]));
        assert_eq!(doc.undo().unwrap_err(), CommandError::NothingToUndo);
        assert_eq!(doc.redo().unwrap_err(), CommandError::NothingToRedo);
    }
}
